//! Collaborator interfaces
//!
//! Everything the coordinator consumes from the host game is declared
//! here as a constructor-injected trait object. Every provider except
//! the clip catalog is optional; an absent provider degrades to a
//! neutral default and never faults a tick.

use std::sync::Arc;
use veil_core::{CategoryVolumes, WorldState};
use veil_layers::ClipCatalog;
use veil_spatial::ObstacleMap;

/// Current user-facing volume sliders
pub trait VolumeProvider: Send + Sync {
    fn volumes(&self) -> CategoryVolumes;
}

/// Whether gameplay wants non-stealth audio pulled down right now
pub trait StealthStateProvider: Send + Sync {
    fn should_reduce_non_stealth_audio(&self) -> bool;
}

/// Current environment/weather/time-of-day plus the environmental
/// masking level at the listener
pub trait EnvironmentStateProvider: Send + Sync {
    fn current_state(&self) -> WorldState;

    /// Environmental masking in [0, 1]; default defers to the beds
    fn masking_level(&self) -> Option<f32> {
        None
    }
}

/// The set of collaborators handed to the coordinator at construction
pub struct Collaborators {
    pub catalog: Arc<dyn ClipCatalog>,
    pub volumes: Option<Arc<dyn VolumeProvider>>,
    pub stealth: Option<Arc<dyn StealthStateProvider>>,
    pub environment: Option<Arc<dyn EnvironmentStateProvider>>,
    pub obstacles: Option<Arc<dyn ObstacleMap>>,
}

impl Collaborators {
    pub fn new(catalog: Arc<dyn ClipCatalog>) -> Self {
        Self {
            catalog,
            volumes: None,
            stealth: None,
            environment: None,
            obstacles: None,
        }
    }

    pub fn with_volumes(mut self, provider: Arc<dyn VolumeProvider>) -> Self {
        self.volumes = Some(provider);
        self
    }

    pub fn with_stealth(mut self, provider: Arc<dyn StealthStateProvider>) -> Self {
        self.stealth = Some(provider);
        self
    }

    pub fn with_environment(mut self, provider: Arc<dyn EnvironmentStateProvider>) -> Self {
        self.environment = Some(provider);
        self
    }

    pub fn with_obstacles(mut self, obstacles: Arc<dyn ObstacleMap>) -> Self {
        self.obstacles = Some(obstacles);
        self
    }
}
