//! Opaque clip handles and sound descriptors
//!
//! Veil never touches sample data. A clip is an id the host engine can
//! resolve to a buffer, plus the one piece of metadata the coordinator
//! needs (duration, for one-shot auto-release).

use crate::{Position3D, SoundCategory};
use serde::{Deserialize, Serialize};

/// Identifier of an audio asset owned by the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u32);

/// Handle to a playable clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipHandle {
    pub id: ClipId,
    /// Clip length in seconds; drives one-shot channel auto-release
    pub duration: f32,
}

impl ClipHandle {
    pub fn new(id: u32, duration: f32) -> Self {
        Self {
            id: ClipId(id),
            duration,
        }
    }
}

/// Scheduling priority of an emitted sound. High-priority channels are
/// never stolen when the pool runs dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoundPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Everything the engine needs to know about one emitted sound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundDescriptor {
    pub clip: ClipHandle,
    pub position: Position3D,
    pub category: SoundCategory,
    /// Base volume before category sliders and masking, in [0, 1]
    pub volume: f32,
    pub pitch: f32,
    /// How far the sound carries for AI hearing, in world units
    pub hearing_radius: f32,
    pub priority: SoundPriority,
    /// Sounds that do not affect gameplay (UI feedback) are invisible
    /// to the AI hearing model by contract
    pub affects_gameplay: bool,
    /// Whether the stealth stance may duck this sound further
    pub duckable: bool,
}

impl SoundDescriptor {
    /// A world-positioned gameplay effect
    pub fn effect(clip: ClipHandle, position: Position3D) -> Self {
        Self {
            clip,
            position,
            category: SoundCategory::Effect,
            volume: SoundCategory::Effect.default_volume(),
            pitch: 1.0,
            hearing_radius: 15.0,
            priority: SoundPriority::Normal,
            affects_gameplay: true,
            duckable: true,
        }
    }

    /// A player-generated stealth noise (footstep, knocked object)
    pub fn stealth(clip: ClipHandle, position: Position3D, hearing_radius: f32) -> Self {
        Self {
            clip,
            position,
            category: SoundCategory::Stealth,
            volume: SoundCategory::Stealth.default_volume(),
            pitch: 1.0,
            hearing_radius,
            priority: SoundPriority::High,
            affects_gameplay: true,
            duckable: false,
        }
    }

    /// Interface feedback; never spatial, never heard by AI
    pub fn ui(clip: ClipHandle) -> Self {
        Self {
            clip,
            position: Position3D::origin(),
            category: SoundCategory::Ui,
            volume: SoundCategory::Ui.default_volume(),
            pitch: 1.0,
            hearing_radius: 0.0,
            priority: SoundPriority::Low,
            affects_gameplay: false,
            duckable: false,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_priority(mut self, priority: SoundPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_descriptor_contract() {
        let ui = SoundDescriptor::ui(ClipHandle::new(1, 0.2));
        assert!(!ui.affects_gameplay);
        assert_eq!(ui.category, SoundCategory::Ui);
        assert!(!ui.category.is_spatial());
    }

    #[test]
    fn test_with_volume_clamps() {
        let d = SoundDescriptor::effect(ClipHandle::new(2, 1.0), Position3D::origin())
            .with_volume(1.8);
        assert_eq!(d.volume, 1.0);
    }
}
