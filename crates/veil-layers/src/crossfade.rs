//! Per-slot crossfade state machine
//!
//! A slot holds at most one incoming/steady layer plus any layers still
//! fading out. Requesting a new bed while one is live redirects the old
//! layer straight into its fade-out while the new one fades in — the
//! two run concurrently, never serialized, so the bed never drops to
//! silence mid-swap.

use crate::{BedKey, DEFAULT_SMOOTHING_RATE, LayerClip, LayerResult, LayerSlot};
use veil_channel::{ChannelId, ChannelPool};
use veil_core::{FadeCurve, SoundPriority};

/// Fade phase of one live layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    FadingIn,
    Steady,
    FadingOut,
}

/// One bed currently owning a channel
#[derive(Debug, Clone)]
pub struct ActiveLayer {
    pub key: BedKey,
    pub channel: ChannelId,
    /// Authored volume before category/stealth multipliers
    pub base_volume: f32,
    /// Masking strength at full volume
    pub masking: f32,
    phase: FadePhase,
    elapsed: f32,
    duration: f32,
    /// Volume at the moment the fade-out began
    fade_from: f32,
    current_volume: f32,
}

impl ActiveLayer {
    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn current_volume(&self) -> f32 {
        self.current_volume
    }

    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Advance one tick. `target` is the recomputed steady target
    /// (base volume with all multipliers applied). Returns `true` when
    /// a fade-out has completed and the channel should be released.
    fn advance(&mut self, dt: f32, curve: FadeCurve, smoothing_rate: f32, target: f32) -> bool {
        match self.phase {
            FadePhase::FadingIn => {
                self.elapsed += dt;
                let progress = self.progress();
                self.current_volume = target * curve.apply(progress);
                if progress >= 1.0 {
                    self.phase = FadePhase::Steady;
                    self.current_volume = target;
                }
                false
            }
            FadePhase::Steady => {
                // Approach the moving target instead of snapping, so a
                // stealth flag flapping every tick cannot click
                let blend = 1.0 - (-smoothing_rate * dt).exp();
                self.current_volume += (target - self.current_volume) * blend;
                false
            }
            FadePhase::FadingOut => {
                self.elapsed += dt;
                let progress = self.progress();
                self.current_volume = self.fade_from * (1.0 - curve.apply(progress));
                progress >= 1.0
            }
        }
    }

    fn redirect_to_fade_out(&mut self, duration: f32) {
        self.fade_from = self.current_volume;
        self.elapsed = 0.0;
        self.duration = duration.max(0.0);
        self.phase = FadePhase::FadingOut;
    }
}

/// Crossfade state machine for one logical slot
pub struct CrossfadeSlot {
    slot: LayerSlot,
    curve: FadeCurve,
    smoothing_rate: f32,
    current: Option<ActiveLayer>,
    outgoing: Vec<ActiveLayer>,
}

impl CrossfadeSlot {
    pub fn new(slot: LayerSlot) -> Self {
        Self {
            slot,
            curve: FadeCurve::default(),
            smoothing_rate: DEFAULT_SMOOTHING_RATE,
            current: None,
            outgoing: Vec::new(),
        }
    }

    pub fn with_curve(mut self, curve: FadeCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn slot(&self) -> LayerSlot {
        self.slot
    }

    /// Bed currently fading in or steady, if any
    pub fn active_key(&self) -> Option<BedKey> {
        self.current.as_ref().map(|l| l.key)
    }

    pub fn current(&self) -> Option<&ActiveLayer> {
        self.current.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        !self.outgoing.is_empty()
            || self
                .current
                .as_ref()
                .is_some_and(|l| l.phase == FadePhase::FadingIn)
    }

    /// Channels this slot currently owns
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.current
            .iter()
            .chain(self.outgoing.iter())
            .map(|l| l.channel)
    }

    /// Start crossfading to a new bed over `duration` seconds.
    ///
    /// The old layer (if any) is redirected into a fade-out of the same
    /// duration. A non-positive duration completes on the same tick it
    /// starts. On pool exhaustion the request fails and the slot is
    /// left exactly as it was.
    pub fn begin_transition(
        &mut self,
        pool: &mut ChannelPool,
        key: BedKey,
        clip: LayerClip,
        duration: f32,
    ) -> LayerResult<()> {
        let priority = if self.slot == LayerSlot::Music {
            SoundPriority::High
        } else {
            SoundPriority::Normal
        };
        let channel = pool.acquire(self.slot.category(), priority)?;

        let instant = duration <= 0.0;
        {
            let ch = pool
                .get_mut(channel)
                .expect("freshly acquired channel is active");
            ch.play_clip(clip.clip, true);
            ch.pitch = clip.pitch;
            ch.volume = if instant { clip.volume } else { 0.0 };
        }

        if let Some(mut old) = self.current.take() {
            if instant {
                pool.release(old.channel);
            } else {
                old.redirect_to_fade_out(duration);
                self.outgoing.push(old);
            }
        }

        log::debug!("slot {:?} transitioning to {} over {duration}s", self.slot, key);

        self.current = Some(ActiveLayer {
            key,
            channel,
            base_volume: clip.volume,
            masking: clip.masking,
            phase: if instant {
                FadePhase::Steady
            } else {
                FadePhase::FadingIn
            },
            elapsed: 0.0,
            duration: duration.max(0.0),
            fade_from: 0.0,
            current_volume: if instant { clip.volume } else { 0.0 },
        });
        Ok(())
    }

    /// Redirect the current layer into a fade-out with no replacement;
    /// the slot returns to idle when the fade completes
    pub fn fade_out_current(&mut self, pool: &mut ChannelPool, duration: f32) {
        if let Some(mut old) = self.current.take() {
            if duration <= 0.0 {
                pool.release(old.channel);
            } else {
                old.redirect_to_fade_out(duration);
                self.outgoing.push(old);
            }
        }
    }

    /// Advance all fades by `dt` and write live volumes back to the
    /// pool. `multiplier` is the product of master/category/stealth/
    /// environment factors applied on top of each layer's base volume.
    pub fn advance(&mut self, pool: &mut ChannelPool, dt: f32, multiplier: f32) {
        let curve = self.curve;
        let rate = self.smoothing_rate;
        let multiplier = multiplier.clamp(0.0, 1.0);

        if let Some(layer) = self.current.as_mut() {
            let target = (layer.base_volume * multiplier).clamp(0.0, 1.0);
            layer.advance(dt, curve, rate, target);
            if let Some(ch) = pool.get_mut(layer.channel) {
                ch.volume = layer.current_volume;
            }
        }

        let mut index = 0;
        while index < self.outgoing.len() {
            let layer = &mut self.outgoing[index];
            let done = layer.advance(dt, curve, rate, 0.0);
            if done {
                let finished = self.outgoing.swap_remove(index);
                pool.release(finished.channel);
            } else {
                if let Some(ch) = pool.get_mut(layer.channel) {
                    ch.volume = layer.current_volume;
                }
                index += 1;
            }
        }
    }

    /// Masking this slot currently contributes, scaled by how far each
    /// layer is faded in
    pub fn masking_level(&self) -> f32 {
        self.current
            .iter()
            .chain(self.outgoing.iter())
            .map(|l| {
                let extent = (l.current_volume / l.base_volume.max(1e-6)).clamp(0.0, 1.0);
                l.masking * extent
            })
            .fold(0.0, f32::max)
    }

    /// Snap every owned channel to idle (shutdown path); no fades
    pub fn stop(&mut self, pool: &mut ChannelPool) {
        if let Some(layer) = self.current.take() {
            pool.release(layer.channel);
        }
        for layer in self.outgoing.drain(..) {
            pool.release(layer.channel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_channel::ReclaimPolicy;
    use veil_core::ClipHandle;
    use veil_core::Environment;

    fn test_pool() -> ChannelPool {
        ChannelPool::new(4, ReclaimPolicy::RefuseNew)
    }

    fn clip(id: u32, volume: f32) -> LayerClip {
        LayerClip {
            clip: ClipHandle::new(id, 30.0),
            volume,
            pitch: 1.0,
            masking: 0.4,
        }
    }

    fn outdoor() -> BedKey {
        BedKey::Environment(Environment::Outdoor)
    }

    fn cave() -> BedKey {
        BedKey::Environment(Environment::Cave)
    }

    #[test]
    fn test_fade_in_reaches_target() {
        let mut pool = test_pool();
        let mut slot =
            CrossfadeSlot::new(LayerSlot::Environment).with_curve(FadeCurve::Linear);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 0.8), 1.0)
            .unwrap();

        for _ in 0..10 {
            slot.advance(&mut pool, 0.1, 1.0);
        }
        let layer = slot.current().unwrap();
        assert_eq!(layer.phase(), FadePhase::Steady);
        assert!((layer.current_volume() - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_supersede_fades_old_out_and_releases() {
        let mut pool = test_pool();
        let mut slot =
            CrossfadeSlot::new(LayerSlot::Environment).with_curve(FadeCurve::Linear);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 0.8), 0.5)
            .unwrap();
        for _ in 0..10 {
            slot.advance(&mut pool, 0.1, 1.0);
        }
        assert_eq!(pool.active_count(), 1);

        slot.begin_transition(&mut pool, cave(), clip(2, 0.6), 2.0)
            .unwrap();
        assert_eq!(slot.active_key(), Some(cave()));
        assert_eq!(pool.active_count(), 2);

        // Both fades progress concurrently and monotonically
        let mut last_in = 0.0f32;
        let mut last_out = 0.8f32;
        for _ in 0..19 {
            slot.advance(&mut pool, 0.1, 1.0);
            let incoming = slot.current().unwrap().current_volume();
            assert!(incoming >= last_in - 1e-5);
            last_in = incoming;
            if slot.is_transitioning() {
                if let Some(out) = slot.outgoing.first() {
                    assert!(out.current_volume() <= last_out + 1e-5);
                    last_out = out.current_volume();
                }
            }
        }
        slot.advance(&mut pool, 0.1, 1.0);

        // Old channel released, new one steady at target
        assert_eq!(pool.active_count(), 1);
        assert!(!slot.is_transitioning());
        assert!((slot.current().unwrap().current_volume() - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_instant_transition_completes_same_tick() {
        let mut pool = test_pool();
        let mut slot = CrossfadeSlot::new(LayerSlot::Weather);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 0.7), 0.0)
            .unwrap();
        let layer = slot.current().unwrap();
        assert_eq!(layer.phase(), FadePhase::Steady);
        assert!((layer.current_volume() - 0.7).abs() < 1e-6);
        assert!(!slot.is_transitioning());
    }

    #[test]
    fn test_pool_exhaustion_leaves_slot_unchanged() {
        let mut pool = ChannelPool::new(1, ReclaimPolicy::RefuseNew);
        let mut slot = CrossfadeSlot::new(LayerSlot::Environment);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 0.8), 1.0)
            .unwrap();

        let result = slot.begin_transition(&mut pool, cave(), clip(2, 0.6), 1.0);
        assert!(result.is_err());
        assert_eq!(slot.active_key(), Some(outdoor()));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_steady_volume_smooths_toward_multiplier() {
        let mut pool = test_pool();
        let mut slot = CrossfadeSlot::new(LayerSlot::Environment);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 1.0), 0.0)
            .unwrap();

        // Multiplier halves; volume approaches 0.5 without snapping
        slot.advance(&mut pool, 0.05, 0.5);
        let after_one = slot.current().unwrap().current_volume();
        assert!(after_one < 1.0 && after_one > 0.5);

        for _ in 0..60 {
            slot.advance(&mut pool, 0.05, 0.5);
        }
        assert!((slot.current().unwrap().current_volume() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_masking_scales_with_fade_extent() {
        let mut pool = test_pool();
        let mut slot =
            CrossfadeSlot::new(LayerSlot::Weather).with_curve(FadeCurve::Linear);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 0.8), 1.0)
            .unwrap();
        assert!(slot.masking_level() < 1e-6);

        for _ in 0..5 {
            slot.advance(&mut pool, 0.1, 1.0);
        }
        let half_way = slot.masking_level();
        assert!(half_way > 0.1 && half_way < 0.4);

        for _ in 0..5 {
            slot.advance(&mut pool, 0.1, 1.0);
        }
        assert!((slot.masking_level() - 0.4).abs() < 1e-3);
    }

    #[test]
    fn test_stop_releases_everything() {
        let mut pool = test_pool();
        let mut slot = CrossfadeSlot::new(LayerSlot::Environment);
        slot.begin_transition(&mut pool, outdoor(), clip(1, 0.8), 1.0)
            .unwrap();
        slot.begin_transition(&mut pool, cave(), clip(2, 0.6), 1.0)
            .unwrap();
        assert_eq!(pool.active_count(), 2);

        slot.stop(&mut pool);
        assert_eq!(pool.active_count(), 0);
        assert!(slot.active_key().is_none());
    }
}
