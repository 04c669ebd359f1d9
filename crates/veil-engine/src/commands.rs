//! Commands from game threads to the coordinator
//!
//! The coordinator is single-owner; other threads talk to it through a
//! lock-free queue drained at the top of each coordinated tick.

use crate::{EngineError, EngineResult};
use rtrb::{Consumer, Producer, RingBuffer};
use veil_core::{CategoryVolumes, Position3D};
use veil_layers::{BedKey, TrackId};

/// Capacity of the command ring buffer
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Commands accepted between ticks
#[derive(Debug, Clone)]
pub enum CoordinatorCommand {
    SetPlayerPosition(Position3D),
    /// Gameplay tension in [0, 1]; drives music selection
    SetTension(f32),
    /// Crossfade a bed slot to a new key
    RequestBed {
        key: BedKey,
        /// `None` uses the configured transition time
        duration: Option<f32>,
    },
    /// Force a specific music track
    PlayTrack(TrackId),
    StopMusic {
        fade_time: f32,
    },
    /// Force or release the stealth stance override
    SetStealthOverride(Option<bool>),
    /// Replace the fallback volume set used when no provider is wired
    SetVolumes(CategoryVolumes),
    SetUpdateInterval(f32),
    Pause,
    Resume,
    Shutdown,
}

/// Game-thread end of the command queue
pub struct CommandSender {
    tx: Producer<CoordinatorCommand>,
}

impl CommandSender {
    /// Enqueue a command; fails when the queue is full (the coordinator
    /// has not ticked for a long time)
    pub fn send(&mut self, command: CoordinatorCommand) -> EngineResult<()> {
        self.tx
            .push(command)
            .map_err(|_| EngineError::CommandQueueFull)
    }
}

/// Create a connected command queue pair
pub fn command_channel() -> (CommandSender, Consumer<CoordinatorCommand>) {
    let (tx, rx) = RingBuffer::new(COMMAND_QUEUE_CAPACITY);
    (CommandSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_reports_overflow() {
        let (mut sender, _rx) = command_channel();
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            sender.send(CoordinatorCommand::Pause).unwrap();
        }
        assert!(matches!(
            sender.send(CoordinatorCommand::Pause),
            Err(EngineError::CommandQueueFull)
        ));
    }
}
