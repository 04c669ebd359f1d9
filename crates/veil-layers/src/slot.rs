//! Logical layer slots and bed identities

use crate::music::TrackId;
use serde::{Deserialize, Serialize};
use veil_core::{Environment, SoundCategory, TimeOfDay, Weather};

/// The coordination slot a layer occupies. At most one layer is steady
/// per slot; transitions replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSlot {
    Environment,
    Weather,
    TimeOfDay,
    Music,
}

impl LayerSlot {
    pub const COUNT: usize = 4;

    pub const ALL: [LayerSlot; Self::COUNT] = [
        LayerSlot::Environment,
        LayerSlot::Weather,
        LayerSlot::TimeOfDay,
        LayerSlot::Music,
    ];

    /// Mixing category for channels playing in this slot
    pub fn category(self) -> SoundCategory {
        match self {
            LayerSlot::Music => SoundCategory::Bgm,
            _ => SoundCategory::Ambient,
        }
    }
}

/// Identity of one concrete bed, tagged by the state that selects it.
/// Resolved once when a transition is requested, never re-inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedKey {
    Environment(Environment),
    Weather(Weather),
    TimeOfDay(TimeOfDay),
    Music(TrackId),
}

impl BedKey {
    /// The slot this bed belongs to
    pub fn slot(self) -> LayerSlot {
        match self {
            BedKey::Environment(_) => LayerSlot::Environment,
            BedKey::Weather(_) => LayerSlot::Weather,
            BedKey::TimeOfDay(_) => LayerSlot::TimeOfDay,
            BedKey::Music(_) => LayerSlot::Music,
        }
    }

    pub fn category(self) -> SoundCategory {
        self.slot().category()
    }
}

impl std::fmt::Display for BedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BedKey::Environment(e) => write!(f, "environment:{:?}", e),
            BedKey::Weather(w) => write!(f, "weather:{:?}", w),
            BedKey::TimeOfDay(t) => write!(f, "time:{:?}", t),
            BedKey::Music(id) => write!(f, "music:{}", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed_key_slot_mapping() {
        assert_eq!(
            BedKey::Environment(Environment::Cave).slot(),
            LayerSlot::Environment
        );
        assert_eq!(BedKey::Weather(Weather::Storm).slot(), LayerSlot::Weather);
        assert_eq!(
            BedKey::TimeOfDay(TimeOfDay::Night).slot(),
            LayerSlot::TimeOfDay
        );
        assert_eq!(BedKey::Music(TrackId(3)).slot(), LayerSlot::Music);
    }

    #[test]
    fn test_categories() {
        assert_eq!(LayerSlot::Music.category(), SoundCategory::Bgm);
        assert_eq!(LayerSlot::Weather.category(), SoundCategory::Ambient);
    }
}
