//! Coordinator configuration

use serde::{Deserialize, Serialize};
use veil_channel::ReclaimPolicy;
use veil_core::{
    DEFAULT_DETECTION_RANGE, DEFAULT_GRID_CELL_SIZE, DEFAULT_MAX_CHANNELS,
    DEFAULT_UPDATE_INTERVAL,
};
use veil_masking::{MaskingConfig, StanceConfig};
use veil_spatial::AudibilityModel;

/// Immutable configuration handed to the coordinator at construction.
/// Every field has a recognized effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Coordinated tick cadence in seconds
    #[serde(default = "default_update_interval")]
    pub update_interval: f32,
    /// Radius of the nearby-channel query around the player
    #[serde(default = "default_detection_range")]
    pub max_detection_range: f32,
    /// Spatial grid bucket size in world units
    #[serde(default = "default_grid_cell_size")]
    pub spatial_grid_size: f32,
    /// Channel pool capacity
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,
    /// What happens when the pool runs dry
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
    /// Coordinated ticks between wholesale spatial index rebuilds
    #[serde(default = "default_rebuild_period")]
    pub index_rebuild_period: u32,
    /// Default bed crossfade duration in seconds
    #[serde(default = "default_transition_time")]
    pub transition_time: f32,
    #[serde(default)]
    pub masking: MaskingConfig,
    #[serde(default)]
    pub stance: StanceConfig,
    #[serde(default)]
    pub audibility: AudibilityModel,
}

fn default_update_interval() -> f32 {
    DEFAULT_UPDATE_INTERVAL
}
fn default_detection_range() -> f32 {
    DEFAULT_DETECTION_RANGE
}
fn default_grid_cell_size() -> f32 {
    DEFAULT_GRID_CELL_SIZE
}
fn default_max_channels() -> usize {
    DEFAULT_MAX_CHANNELS
}
fn default_rebuild_period() -> u32 {
    5
}
fn default_transition_time() -> f32 {
    2.0
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: default_update_interval(),
            max_detection_range: default_detection_range(),
            spatial_grid_size: default_grid_cell_size(),
            max_channels: default_max_channels(),
            reclaim_policy: ReclaimPolicy::default(),
            index_rebuild_period: default_rebuild_period(),
            transition_time: default_transition_time(),
            masking: MaskingConfig::default(),
            stance: StanceConfig::default(),
            audibility: AudibilityModel::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Clamp the tunables into their sane ranges
    pub fn sanitized(mut self) -> Self {
        self.update_interval = self.update_interval.clamp(0.05, 1.0);
        self.max_detection_range = self.max_detection_range.max(1.0);
        self.spatial_grid_size = self.spatial_grid_size.max(0.5);
        self.max_channels = self.max_channels.max(1);
        self.index_rebuild_period = self.index_rebuild_period.max(1);
        self.transition_time = self.transition_time.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps() {
        let config = CoordinatorConfig {
            update_interval: 30.0,
            max_channels: 0,
            index_rebuild_period: 0,
            ..CoordinatorConfig::default()
        }
        .sanitized();
        assert_eq!(config.update_interval, 1.0);
        assert_eq!(config.max_channels, 1);
        assert_eq!(config.index_rebuild_period, 1);
    }

    #[test]
    fn test_from_partial_json() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{ "update_interval": 0.25, "max_channels": 8 }"#).unwrap();
        assert_eq!(config.update_interval, 0.25);
        assert_eq!(config.max_channels, 8);
        assert_eq!(config.max_detection_range, DEFAULT_DETECTION_RANGE);
    }
}
