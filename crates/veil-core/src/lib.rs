//! veil-core: Shared types for the Veil stealth audio engine
//!
//! This crate provides the vocabulary used across all Veil crates:
//! positions, world-state enums, sound categories and their weighting
//! table, fade/scalar curves, clip handles and sound descriptors.

mod category;
mod clip;
mod curve;
mod position;
mod world;

pub use category::*;
pub use clip::*;
pub use curve::*;
pub use position::*;
pub use world::*;

/// Volume below which a sound is treated as inaudible
pub const MIN_AUDIBLE_VOLUME: f32 = 0.01;

/// Default pool capacity for emitting channels
pub const DEFAULT_MAX_CHANNELS: usize = 32;

/// Default coordinated update interval in seconds
pub const DEFAULT_UPDATE_INTERVAL: f32 = 0.1;

/// Default radius for nearby-channel queries in world units
pub const DEFAULT_DETECTION_RANGE: f32 = 25.0;

/// Default spatial grid cell size in world units
pub const DEFAULT_GRID_CELL_SIZE: f32 = 10.0;
