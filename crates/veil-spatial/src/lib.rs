//! veil-spatial: spatial audibility model and channel index
//!
//! Two halves:
//! - Pure audibility math: distance attenuation along a monotone
//!   response curve, ray-based occlusion against a host-provided
//!   obstacle map, and the combined audibility threshold test.
//! - `SpatialIndex`: a uniform grid bucketing active channels by
//!   truncated world position for cheap radius queries. The grid is a
//!   coarse pre-filter; results are always pruned by exact distance.

mod audibility;
mod grid;

pub use audibility::*;
pub use grid::*;

use thiserror::Error;

/// Spatial error types
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("invalid grid cell size: {0}")]
    InvalidCellSize(f32),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
