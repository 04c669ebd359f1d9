//! # Veil Engine
//!
//! The coordinated update core of the Veil stealth audio system.
//!
//! ## Architecture
//!
//! - **AudioCoordinator**: owns the pool, index, beds, music and
//!   masking model; runs the coordinated tick
//! - **WorldSnapshot**: one immutable record per tick, fanned out to
//!   every subsystem and listener in a fixed order
//! - **Commands**: lock-free queue from game threads, drained at the
//!   top of each tick
//! - **Providers**: constructor-injected collaborator traits with
//!   graceful degradation when absent
//!
//! A coordinated tick replaces N independent per-frame polls: weather,
//! time, stealth and volume state are read once, and every consumer
//! acts on the same values.

mod commands;
mod config;
mod coordinator;
mod handle;
mod providers;
mod snapshot;

pub use commands::*;
pub use config::*;
pub use coordinator::*;
pub use handle::*;
pub use providers::*;
pub use snapshot::*;

use thiserror::Error;

/// Engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("channel pool: {0}")]
    Pool(#[from] veil_channel::PoolError),

    #[error("layer: {0}")]
    Layer(#[from] veil_layers::LayerError),

    #[error("command queue full")]
    CommandQueueFull,

    #[error("coordinator is shut down")]
    Disabled,
}

pub type EngineResult<T> = Result<T, EngineError>;
