//! Distance attenuation, occlusion and the audibility test

use serde::{Deserialize, Serialize};
use veil_core::{MIN_AUDIBLE_VOLUME, Position3D};

/// Shape of the distance falloff. Every variant is monotone
/// non-increasing with `1` at distance zero and `0` at the radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttenuationCurve {
    Linear,
    #[default]
    Smoothstep,
    /// Quadratic falloff, steeper near the source
    Quadratic,
}

impl AttenuationCurve {
    /// Volume in [0, 1] for a sound heard at `distance` with audible
    /// range `max_radius`. Zero at and beyond the radius.
    pub fn attenuated_volume(self, distance: f32, max_radius: f32) -> f32 {
        if max_radius <= 0.0 || distance >= max_radius {
            return 0.0;
        }
        if distance <= 0.0 {
            return 1.0;
        }
        let t = distance / max_radius;
        match self {
            AttenuationCurve::Linear => 1.0 - t,
            AttenuationCurve::Smoothstep => 1.0 - t * t * (3.0 - 2.0 * t),
            AttenuationCurve::Quadratic => (1.0 - t) * (1.0 - t),
        }
    }
}

/// Host-provided line-of-sight test. Returns the fraction along the
/// segment from `from` to `to` at which the ray first hits an obstacle,
/// or `None` for a clear line.
pub trait ObstacleMap: Send + Sync {
    fn raycast(&self, from: Position3D, to: Position3D) -> Option<f32>;
}

/// An obstacle map with nothing in it
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl ObstacleMap for OpenField {
    fn raycast(&self, _from: Position3D, _to: Position3D) -> Option<f32> {
        None
    }
}

/// Tunable audibility parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudibilityModel {
    #[serde(default)]
    pub curve: AttenuationCurve,
    /// Volume reduction when the ray hits an obstacle right at the
    /// source; falls off linearly to zero for hits at the listener
    #[serde(default = "default_max_occlusion")]
    pub max_occlusion_reduction: f32,
    /// Global multiplier on all hearing (difficulty tuning hook)
    #[serde(default = "default_hearing_multiplier")]
    pub hearing_multiplier: f32,
}

fn default_max_occlusion() -> f32 {
    0.8
}
fn default_hearing_multiplier() -> f32 {
    1.0
}

impl Default for AudibilityModel {
    fn default() -> Self {
        Self {
            curve: AttenuationCurve::default(),
            max_occlusion_reduction: 0.8,
            hearing_multiplier: 1.0,
        }
    }
}

impl AudibilityModel {
    /// Attenuated volume for a sound at `distance`
    pub fn volume_at_distance(&self, distance: f32, max_radius: f32) -> f32 {
        (self.curve.attenuated_volume(distance, max_radius) * self.hearing_multiplier)
            .clamp(0.0, 1.0)
    }

    /// Occlusion reduction in [0, max_occlusion_reduction] between two
    /// points. A hit near the source blocks most of the sound; a hit
    /// near the listener barely matters.
    pub fn occlusion(
        &self,
        obstacles: &dyn ObstacleMap,
        from: Position3D,
        to: Position3D,
    ) -> f32 {
        match obstacles.raycast(from, to) {
            Some(hit_fraction) => {
                let hit_fraction = hit_fraction.clamp(0.0, 1.0);
                self.max_occlusion_reduction * (1.0 - hit_fraction)
            }
            None => 0.0,
        }
    }

    /// Whether the sound clears the minimum-audible threshold at the
    /// listener, attenuation and occlusion combined
    pub fn is_audible(
        &self,
        obstacles: &dyn ObstacleMap,
        sound_pos: Position3D,
        hearing_radius: f32,
        listener_pos: Position3D,
    ) -> bool {
        let distance = sound_pos.distance_to(&listener_pos);
        let mut volume = self.volume_at_distance(distance, hearing_radius);
        if volume <= MIN_AUDIBLE_VOLUME {
            return false;
        }
        volume *= 1.0 - self.occlusion(obstacles, sound_pos, listener_pos);
        volume > MIN_AUDIBLE_VOLUME
    }
}
