//! Stealth stance and per-category ducking multipliers
//!
//! When the stance is active, non-stealth audio is pulled down so the
//! player can hear the world (and the AI) better; stealth-relevant and
//! UI sounds keep their level. Leaving the stance restores every
//! multiplier exactly.

use serde::{Deserialize, Serialize};
use veil_core::SoundCategory;

/// How far each category is reduced while the stance is active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StanceConfig {
    #[serde(default = "default_bgm_reduction")]
    pub bgm_reduction: f32,
    #[serde(default = "default_ambient_reduction")]
    pub ambient_reduction: f32,
    #[serde(default = "default_effect_reduction")]
    pub effect_reduction: f32,
}

fn default_bgm_reduction() -> f32 {
    0.4
}
fn default_ambient_reduction() -> f32 {
    0.6
}
fn default_effect_reduction() -> f32 {
    0.3
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            bgm_reduction: default_bgm_reduction(),
            ambient_reduction: default_ambient_reduction(),
            effect_reduction: default_effect_reduction(),
        }
    }
}

/// Tracks the stance and answers per-category volume multipliers
#[derive(Debug, Clone, Default)]
pub struct StealthStance {
    config: StanceConfig,
    active: bool,
    /// Manual override wins over the reported state while set
    overridden: Option<bool>,
}

impl StealthStance {
    pub fn new(config: StanceConfig) -> Self {
        Self {
            config,
            active: false,
            overridden: None,
        }
    }

    /// Feed the state reported by the stealth collaborator. Returns
    /// `true` when the effective stance changed this call.
    pub fn update(&mut self, reported: bool) -> bool {
        let effective = self.overridden.unwrap_or(reported);
        if effective != self.active {
            self.active = effective;
            log::info!(
                "stealth stance {}",
                if effective { "activated" } else { "deactivated" }
            );
            true
        } else {
            false
        }
    }

    /// Force the stance regardless of the collaborator
    pub fn set_override(&mut self, forced: bool) -> bool {
        self.overridden = Some(forced);
        self.update(forced)
    }

    /// Drop the override; the next `update` call takes effect again
    pub fn clear_override(&mut self) {
        self.overridden = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Volume multiplier for a category under the current stance.
    /// Always exactly 1.0 outside the stance.
    pub fn multiplier(&self, category: SoundCategory) -> f32 {
        if !self.active {
            return 1.0;
        }
        match category {
            SoundCategory::Bgm => 1.0 - self.config.bgm_reduction,
            SoundCategory::Ambient => 1.0 - self.config.ambient_reduction,
            SoundCategory::Effect => 1.0 - self.config.effect_reduction,
            SoundCategory::Stealth | SoundCategory::Ui => 1.0,
        }
    }
}
