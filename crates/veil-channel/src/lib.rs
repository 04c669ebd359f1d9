//! veil-channel: bounded pool of reusable audio channels
//!
//! Channels are created once at pool construction and recycled forever;
//! nothing is allocated per sound. The pool never lends more channels
//! than its capacity. When it runs dry the configured policy decides
//! whether the oldest non-priority channel is stolen or the request is
//! refused — refusal is a reported error the caller can recover from,
//! never a panic.

mod pool;

pub use pool::*;

use thiserror::Error;

/// Pool error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// No idle channel and no reclaimable candidate
    #[error("channel pool exhausted ({capacity} channels busy)")]
    Exhausted { capacity: usize },
}

pub type PoolResult<T> = Result<T, PoolError>;
