//! veil-masking: how well is the player's noise hidden?
//!
//! Produces two numbers per tick:
//! - `masking_strength` in [0, 1] — how much ambient/background sound
//!   currently conceals the player's noise
//! - `audibility_multiplier` in [0, 1] per sound — how well the AI can
//!   hear one specific emitted sound after masking, category weighting
//!   and the stealth stance cut
//!
//! Every weight is configuration: the combination shape (weighted sum,
//! clamp, category multiply, invert) is structure, the constants are
//! balance data.

mod calculator;
mod stance;

pub use calculator::*;
pub use stance::*;

use thiserror::Error;

/// Masking error types
#[derive(Debug, Error)]
pub enum MaskingError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MaskingResult<T> = Result<T, MaskingError>;
