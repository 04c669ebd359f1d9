//! The per-tick world snapshot
//!
//! Built once at the top of every coordinated tick and handed to every
//! subsystem and listener in turn. Fields are frozen for the duration
//! of the tick: two subsystems can never observe different values for
//! "current weather" within the same tick.

use smallvec::SmallVec;
use veil_channel::ChannelId;
use veil_core::{CategoryVolumes, Position3D, WorldState};
use veil_masking::MaskingBreakdown;

/// Immutable record of the world as seen by one coordinated tick
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    /// Seconds covered by this coordinated tick
    pub delta_time: f32,
    /// Seconds since the coordinator started
    pub elapsed: f64,
    pub tick: u64,
    pub player_position: Position3D,

    pub stealth_active: bool,
    pub stealth_changed: bool,
    pub environment_changed: bool,
    pub weather_changed: bool,
    pub time_changed: bool,

    pub world: WorldState,
    pub volumes: CategoryVolumes,

    /// Channels within detection range of the player this tick
    pub nearby: SmallVec<[ChannelId; 16]>,
    /// Masking strength and its component contributions
    pub masking: MaskingBreakdown,
}

/// Coordinator performance counters
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinatorStats {
    pub ticks: u64,
    /// Wall-clock cost of the last coordinated tick, in milliseconds
    pub last_tick_ms: f32,
    pub active_channels: usize,
    pub pool_capacity: usize,
    pub indexed_channels: usize,
    pub index_cells: usize,
    pub listeners: usize,
}
