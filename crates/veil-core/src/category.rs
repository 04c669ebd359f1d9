//! Sound categories and per-category volume state

use serde::{Deserialize, Serialize};

/// Mixing category a sound is routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    /// Background music
    Bgm,
    /// Looping environment/weather/time beds
    Ambient,
    /// One-shot gameplay effects
    #[default]
    Effect,
    /// Player-generated noise relevant to AI hearing
    Stealth,
    /// Interface feedback, never part of the world
    Ui,
}

impl SoundCategory {
    pub const COUNT: usize = 5;

    pub const ALL: [SoundCategory; Self::COUNT] = [
        SoundCategory::Bgm,
        SoundCategory::Ambient,
        SoundCategory::Effect,
        SoundCategory::Stealth,
        SoundCategory::Ui,
    ];

    /// How strongly background masking conceals a sound of this
    /// category from AI listeners. Stealth sounds are fully maskable,
    /// UI sounds never reach the AI at all.
    pub fn masking_weight(self) -> f32 {
        match self {
            SoundCategory::Stealth => 1.0,
            SoundCategory::Effect => 0.8,
            SoundCategory::Ambient => 0.3,
            SoundCategory::Bgm => 0.1,
            SoundCategory::Ui => 0.0,
        }
    }

    /// Default playback volume for the category
    pub fn default_volume(self) -> f32 {
        match self {
            SoundCategory::Bgm => 0.8,
            SoundCategory::Ambient => 0.7,
            SoundCategory::Effect => 1.0,
            SoundCategory::Stealth => 1.0,
            SoundCategory::Ui => 0.9,
        }
    }

    /// Whether sounds of this category are positioned in the world
    pub fn is_spatial(self) -> bool {
        !matches!(self, SoundCategory::Bgm | SoundCategory::Ui)
    }
}

/// The four user-facing volume sliders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryVolumes {
    pub master: f32,
    pub bgm: f32,
    pub ambient: f32,
    pub effect: f32,
}

impl Default for CategoryVolumes {
    fn default() -> Self {
        Self {
            master: 1.0,
            bgm: 0.8,
            ambient: 0.7,
            effect: 1.0,
        }
    }
}

impl CategoryVolumes {
    /// Effective volume for a category, master already applied.
    /// Stealth and UI sounds ride the effect slider.
    pub fn effective(&self, category: SoundCategory) -> f32 {
        let slider = match category {
            SoundCategory::Bgm => self.bgm,
            SoundCategory::Ambient => self.ambient,
            SoundCategory::Effect | SoundCategory::Stealth | SoundCategory::Ui => self.effect,
        };
        (self.master * slider).clamp(0.0, 1.0)
    }

    /// Clamp every slider into [0, 1]
    pub fn clamped(self) -> Self {
        Self {
            master: self.master.clamp(0.0, 1.0),
            bgm: self.bgm.clamp(0.0, 1.0),
            ambient: self.ambient.clamp(0.0, 1.0),
            effect: self.effect.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking_weights() {
        assert_eq!(SoundCategory::Stealth.masking_weight(), 1.0);
        assert_eq!(SoundCategory::Ui.masking_weight(), 0.0);
        // Weights fall off from stealth to bgm
        assert!(SoundCategory::Effect.masking_weight() > SoundCategory::Ambient.masking_weight());
        assert!(SoundCategory::Ambient.masking_weight() > SoundCategory::Bgm.masking_weight());
    }

    #[test]
    fn test_effective_volume() {
        let volumes = CategoryVolumes {
            master: 0.5,
            bgm: 0.8,
            ambient: 1.0,
            effect: 0.6,
        };
        assert!((volumes.effective(SoundCategory::Bgm) - 0.4).abs() < 0.001);
        assert!((volumes.effective(SoundCategory::Ambient) - 0.5).abs() < 0.001);
        assert!((volumes.effective(SoundCategory::Stealth) - 0.3).abs() < 0.001);
    }

    #[test]
    fn test_clamped() {
        let volumes = CategoryVolumes {
            master: 1.7,
            bgm: -0.2,
            ambient: 0.5,
            effect: 0.0,
        }
        .clamped();
        assert_eq!(volumes.master, 1.0);
        assert_eq!(volumes.bgm, 0.0);
    }
}
