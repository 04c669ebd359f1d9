//! # Veil Layer Engine
//!
//! World-state-driven sound beds for a stealth game:
//!
//! - **Slots**: one logical bed per concern (environment, weather,
//!   time-of-day, music); a new bed replaces the old via crossfade,
//!   never by mutation
//! - **Crossfades**: explicit per-tick state machines
//!   (Idle → FadingIn → Steady → FadingOut), time-sliced across ticks
//! - **Collections**: authored clip sets with volume/pitch variation
//! - **Music direction**: tension- and condition-aware track selection
//!
//! Channels come from the bounded `veil-channel` pool and are released
//! the moment a fade-out completes.

pub mod beds;
pub mod collection;
pub mod crossfade;
pub mod music;
pub mod slot;

pub use beds::*;
pub use collection::*;
pub use crossfade::*;
pub use music::*;
pub use slot::*;

use thiserror::Error;

/// Layer error types
#[derive(Debug, Error)]
pub enum LayerError {
    /// The catalog had no clip for the requested bed; the slot keeps
    /// its prior state
    #[error("no clip available for {0}")]
    NoClip(String),

    #[error("channel pool: {0}")]
    Pool(#[from] veil_channel::PoolError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LayerResult<T> = Result<T, LayerError>;

/// Default crossfade duration for bed transitions, in seconds
pub const DEFAULT_TRANSITION_TIME: f32 = 2.0;

/// Per-second rate at which a steady layer's live volume approaches its
/// recomputed target
pub const DEFAULT_SMOOTHING_RATE: f32 = 8.0;
