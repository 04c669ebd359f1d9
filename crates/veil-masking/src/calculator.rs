//! The masking calculator

use crate::MaskingResult;
use serde::{Deserialize, Serialize};
use veil_core::{ScalarCurve, SoundCategory, SoundDescriptor, TimeOfDay, Weather};

/// Tunable masking weights and curves. Defaults follow the project's
/// balance data: a 0.2 floor, environment the strongest term, BGM the
/// weakest, storms masking far more than clear skies, nights masking
/// less than days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Masking present even in a dead-quiet world
    #[serde(default = "default_base_masking")]
    pub base_masking: f32,
    /// Weight of the music bed's masking while BGM is playing
    #[serde(default = "default_bgm_weight")]
    pub bgm_weight: f32,
    /// Weight of the ambient/environment masking level
    #[serde(default = "default_environment_weight")]
    pub environment_weight: f32,
    /// Weight of the weather curve term
    #[serde(default = "default_weather_weight")]
    pub weather_weight: f32,
    /// Weight of the time-of-day curve term
    #[serde(default = "default_time_weight")]
    pub time_weight: f32,
    /// Masking response over the weather ordinal (clear → fog)
    #[serde(default = "default_weather_curve")]
    pub weather_curve: ScalarCurve,
    /// Masking response over the time-of-day ordinal (day → dawn)
    #[serde(default = "default_time_curve")]
    pub time_curve: ScalarCurve,
    /// Extra audibility reduction for duckable sounds while the player
    /// holds an active stealth stance
    #[serde(default = "default_stealth_cut")]
    pub stealth_audibility_cut: f32,
}

fn default_base_masking() -> f32 {
    0.2
}
fn default_bgm_weight() -> f32 {
    0.3
}
fn default_environment_weight() -> f32 {
    0.5
}
fn default_weather_weight() -> f32 {
    0.4
}
fn default_time_weight() -> f32 {
    0.2
}
fn default_weather_curve() -> ScalarCurve {
    ScalarCurve::ease(0.0, 0.8)
}
fn default_time_curve() -> ScalarCurve {
    ScalarCurve::ease(0.2, 0.05)
}
fn default_stealth_cut() -> f32 {
    0.3
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            base_masking: default_base_masking(),
            bgm_weight: default_bgm_weight(),
            environment_weight: default_environment_weight(),
            weather_weight: default_weather_weight(),
            time_weight: default_time_weight(),
            weather_curve: default_weather_curve(),
            time_curve: default_time_curve(),
            stealth_audibility_cut: default_stealth_cut(),
        }
    }
}

impl MaskingConfig {
    /// Parse from authored JSON, missing fields falling back to the
    /// defaults above
    pub fn from_json(json: &str) -> MaskingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What the calculator needs from the rest of the engine this tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaskingInputs {
    pub bgm_playing: bool,
    /// Masking strength of the playing music bed
    pub bgm_masking: f32,
    /// Environmental masking level from the ambient subsystem (0 when
    /// no collaborator is available — absence never faults the tick)
    pub environment_masking: f32,
    pub weather: Weather,
    pub time_of_day: TimeOfDay,
    pub stealth_active: bool,
}

/// Masking total plus its component contributions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaskingBreakdown {
    pub base: f32,
    pub bgm: f32,
    pub environment: f32,
    pub weather: f32,
    pub time_of_day: f32,
    /// Clamped sum of the components
    pub total: f32,
    pub stealth_active: bool,
}

/// Fuses world state into masking strength and per-sound audibility
#[derive(Debug, Clone, Default)]
pub struct MaskingCalculator {
    config: MaskingConfig,
}

impl MaskingCalculator {
    pub fn new(config: MaskingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MaskingConfig) {
        self.config = config;
    }

    /// Compute this tick's masking strength and its components
    pub fn breakdown(&self, inputs: &MaskingInputs) -> MaskingBreakdown {
        let cfg = &self.config;

        let base = cfg.base_masking;
        let bgm = if inputs.bgm_playing {
            inputs.bgm_masking.clamp(0.0, 1.0) * cfg.bgm_weight
        } else {
            0.0
        };
        let environment = inputs.environment_masking.clamp(0.0, 1.0) * cfg.environment_weight;
        let weather =
            cfg.weather_curve.evaluate(inputs.weather.normalized()) * cfg.weather_weight;
        let time_of_day =
            cfg.time_curve.evaluate(inputs.time_of_day.normalized()) * cfg.time_weight;

        let total = (base + bgm + environment + weather + time_of_day).clamp(0.0, 1.0);

        MaskingBreakdown {
            base,
            bgm,
            environment,
            weather,
            time_of_day,
            total,
            stealth_active: inputs.stealth_active,
        }
    }

    /// Masking applied to one category: the global total scaled by the
    /// category's masking weight
    pub fn masking_for_category(
        &self,
        breakdown: &MaskingBreakdown,
        category: SoundCategory,
    ) -> f32 {
        (breakdown.total * category.masking_weight()).clamp(0.0, 1.0)
    }

    /// How well the AI hears this specific sound. Sounds that do not
    /// affect gameplay are invisible to the hearing model by contract.
    pub fn audibility(&self, breakdown: &MaskingBreakdown, sound: &SoundDescriptor) -> f32 {
        if !sound.affects_gameplay {
            return 0.0;
        }

        let masked = self.masking_for_category(breakdown, sound.category);
        let mut multiplier = 1.0 - masked;

        if breakdown.stealth_active && sound.duckable {
            multiplier *= 1.0 - self.config.stealth_audibility_cut;
        }

        multiplier.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::{ClipHandle, Position3D};

    fn calc() -> MaskingCalculator {
        MaskingCalculator::default()
    }

    fn loud_world() -> MaskingInputs {
        MaskingInputs {
            bgm_playing: true,
            bgm_masking: 1.0,
            environment_masking: 1.0,
            weather: Weather::Fog,
            time_of_day: TimeOfDay::Day,
            stealth_active: false,
        }
    }

    #[test]
    fn test_total_always_in_unit_range() {
        let calc = calc();
        for weather in [Weather::Clear, Weather::Rain, Weather::Storm, Weather::Fog] {
            for time in [
                TimeOfDay::Day,
                TimeOfDay::Evening,
                TimeOfDay::Night,
                TimeOfDay::Dawn,
            ] {
                for env in [0.0, 0.5, 1.0, 5.0, -1.0] {
                    let inputs = MaskingInputs {
                        bgm_playing: true,
                        bgm_masking: 2.0,
                        environment_masking: env,
                        weather,
                        time_of_day: time,
                        stealth_active: true,
                    };
                    let b = calc.breakdown(&inputs);
                    assert!((0.0..=1.0).contains(&b.total));
                }
            }
        }
    }

    #[test]
    fn test_component_weights() {
        let calc = calc();
        let quiet = MaskingInputs::default();
        let b = calc.breakdown(&quiet);
        // Only the floor plus the clear-weather and daytime curve tails
        assert!((b.base - 0.2).abs() < 1e-6);
        assert_eq!(b.bgm, 0.0);
        assert_eq!(b.environment, 0.0);
        assert!(b.weather.abs() < 1e-6); // clear sky masks nothing
        assert!((b.time_of_day - 0.2 * 0.2).abs() < 1e-3); // day end of the curve

        let loud = calc.breakdown(&loud_world());
        assert!(loud.total > b.total);
        assert_eq!(loud.total, 1.0); // 0.2 + 0.3 + 0.5 + 0.32 + 0.04 clamps
    }

    #[test]
    fn test_storm_masks_more_than_clear() {
        let calc = calc();
        let mut inputs = MaskingInputs::default();
        let clear = calc.breakdown(&inputs);
        inputs.weather = Weather::Storm;
        let storm = calc.breakdown(&inputs);
        assert!(storm.total > clear.total);
    }

    #[test]
    fn test_ui_sounds_always_inaudible() {
        let calc = calc();
        let ui = SoundDescriptor::ui(ClipHandle::new(1, 0.1));
        for inputs in [MaskingInputs::default(), loud_world()] {
            let b = calc.breakdown(&inputs);
            assert_eq!(calc.audibility(&b, &ui), 0.0);
        }
    }

    #[test]
    fn test_category_weighting_orders_audibility() {
        let calc = calc();
        let b = calc.breakdown(&loud_world());
        let at = Position3D::origin();
        let clip = ClipHandle::new(1, 1.0);

        let stealth = SoundDescriptor::stealth(clip, at, 10.0);
        let effect = SoundDescriptor::effect(clip, at);
        // Stealth sounds are masked hardest, so they are the least
        // audible to AI under heavy masking
        assert!(calc.audibility(&b, &stealth) <= calc.audibility(&b, &effect));
    }

    #[test]
    fn test_stealth_stance_cuts_duckable_audibility() {
        let calc = calc();
        let mut inputs = MaskingInputs::default();
        let at = Position3D::origin();
        let clip = ClipHandle::new(1, 1.0);
        let effect = SoundDescriptor::effect(clip, at);

        let normal = calc.audibility(&calc.breakdown(&inputs), &effect);
        inputs.stealth_active = true;
        let in_stance = calc.audibility(&calc.breakdown(&inputs), &effect);
        assert!((in_stance - normal * 0.7).abs() < 1e-5);

        // Non-duckable stealth noise gets no stance discount
        let noise = SoundDescriptor::stealth(clip, at, 10.0);
        let before = calc.audibility(
            &calc.breakdown(&MaskingInputs::default()),
            &noise,
        );
        let after = calc.audibility(&calc.breakdown(&inputs), &noise);
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = MaskingConfig::from_json(r#"{ "base_masking": 0.35 }"#).unwrap();
        assert!((config.base_masking - 0.35).abs() < 1e-6);
        assert!((config.environment_weight - 0.5).abs() < 1e-6);
    }
}
