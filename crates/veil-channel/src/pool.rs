//! Channel pool and channel state

use crate::{PoolError, PoolResult};
use serde::{Deserialize, Serialize};
use veil_core::{ClipHandle, Position3D, SoundCategory, SoundPriority};

/// Stable handle to a pooled channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

/// What happens when every channel is busy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimPolicy {
    /// Report exhaustion; the new sound is skipped
    #[default]
    RefuseNew,
    /// Stop and reuse the oldest non-high-priority channel
    StealOldest,
}

/// One emitting unit. Owned by the pool while idle, lent out while
/// active.
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    in_use: bool,
    /// Monotonic acquisition stamp; lower = older
    acquired_seq: u64,
    pub position: Position3D,
    pub category: SoundCategory,
    pub priority: SoundPriority,
    pub volume: f32,
    pub pitch: f32,
    /// Gain applied on top of `volume` by the masking pass; set each
    /// coordinated tick, never compounded
    pub masking_gain: f32,
    pub clip: Option<ClipHandle>,
    pub playing: bool,
    pub looping: bool,
    /// Seconds of playback since the clip started
    pub elapsed: f32,
}

impl Channel {
    fn new(id: ChannelId) -> Self {
        Self {
            id,
            in_use: false,
            acquired_seq: 0,
            position: Position3D::origin(),
            category: SoundCategory::Effect,
            priority: SoundPriority::Normal,
            volume: 0.0,
            pitch: 1.0,
            masking_gain: 1.0,
            clip: None,
            playing: false,
            looping: false,
            elapsed: 0.0,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.in_use
    }

    /// Assign a clip and start playback
    pub fn play_clip(&mut self, clip: ClipHandle, looping: bool) {
        self.clip = Some(clip);
        self.looping = looping;
        self.playing = true;
        self.elapsed = 0.0;
    }

    /// Stop playback, keeping the channel lent out
    pub fn stop(&mut self) {
        self.playing = false;
        self.elapsed = 0.0;
    }

    /// Volume after the masking pass, what the host should render
    pub fn effective_volume(&self) -> f32 {
        (self.volume * self.masking_gain).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.in_use = false;
        self.position = Position3D::origin();
        self.category = SoundCategory::Effect;
        self.priority = SoundPriority::Normal;
        self.volume = 0.0;
        self.pitch = 1.0;
        self.masking_gain = 1.0;
        self.clip = None;
        self.playing = false;
        self.looping = false;
        self.elapsed = 0.0;
    }
}

/// Fixed-size set of reusable channels
pub struct ChannelPool {
    slots: Vec<Channel>,
    idle: Vec<ChannelId>,
    policy: ReclaimPolicy,
    next_seq: u64,
}

impl ChannelPool {
    /// Create a pool with `capacity` channels, all idle
    pub fn new(capacity: usize, policy: ReclaimPolicy) -> Self {
        let slots: Vec<Channel> = (0..capacity)
            .map(|i| Channel::new(ChannelId(i as u32)))
            .collect();
        // Pop order matches id order for predictable reuse
        let idle: Vec<ChannelId> = slots.iter().map(|c| c.id()).rev().collect();
        Self {
            slots,
            idle,
            policy,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|c| c.in_use).count()
    }

    pub fn policy(&self) -> ReclaimPolicy {
        self.policy
    }

    /// Lend out a channel configured for `category`/`priority`.
    ///
    /// Returns an idle channel when one exists; otherwise the policy
    /// decides between stealing the oldest non-high-priority channel
    /// and reporting exhaustion.
    pub fn acquire(
        &mut self,
        category: SoundCategory,
        priority: SoundPriority,
    ) -> PoolResult<ChannelId> {
        let id = match self.idle.pop() {
            Some(id) => id,
            None => self.reclaim_candidate()?,
        };

        self.next_seq += 1;
        let seq = self.next_seq;
        let channel = &mut self.slots[id.0 as usize];
        channel.in_use = true;
        channel.acquired_seq = seq;
        channel.category = category;
        channel.priority = priority;
        channel.volume = category.default_volume();
        Ok(id)
    }

    /// Stop the channel, clear its state and return it to the idle set.
    /// Releasing an already-idle channel is a no-op.
    pub fn release(&mut self, id: ChannelId) {
        let Some(channel) = self.slots.get_mut(id.0 as usize) else {
            return;
        };
        if !channel.in_use {
            return;
        }
        channel.reset();
        self.idle.push(id);
    }

    /// Advance playback clocks; returns one-shot channels whose clip
    /// has finished so the owner can release them.
    pub fn advance(&mut self, dt: f32) -> Vec<ChannelId> {
        let mut finished = Vec::new();
        for channel in self.slots.iter_mut() {
            if !(channel.in_use && channel.playing) || channel.looping {
                continue;
            }
            channel.elapsed += dt;
            if let Some(clip) = channel.clip {
                if clip.duration > 0.0 && channel.elapsed >= clip.duration {
                    finished.push(channel.id());
                }
            }
        }
        finished
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.slots.get(id.0 as usize).filter(|c| c.in_use)
    }

    pub fn get_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.slots.get_mut(id.0 as usize).filter(|c| c.in_use)
    }

    /// Iterate over all lent-out channels
    pub fn active(&self) -> impl Iterator<Item = &Channel> {
        self.slots.iter().filter(|c| c.in_use)
    }

    /// Stop and reclaim every channel (shutdown path)
    pub fn release_all(&mut self) {
        let ids: Vec<ChannelId> = self.active().map(|c| c.id()).collect();
        for id in ids {
            self.release(id);
        }
    }

    fn reclaim_candidate(&mut self) -> PoolResult<ChannelId> {
        let capacity = self.capacity();
        if self.policy == ReclaimPolicy::RefuseNew {
            return Err(PoolError::Exhausted { capacity });
        }

        let victim = self
            .slots
            .iter()
            .filter(|c| c.in_use && c.priority < SoundPriority::High)
            .min_by_key(|c| c.acquired_seq)
            .map(|c| c.id());

        match victim {
            Some(id) => {
                log::debug!("channel pool full, stealing oldest channel {:?}", id);
                self.release(id);
                self.idle.pop();
                Ok(id)
            }
            None => Err(PoolError::Exhausted { capacity }),
        }
    }
}
