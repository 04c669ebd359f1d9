//! Ambient bed controller: environment, weather and time-of-day slots

use crate::{
    BedKey, ClipCatalog, CrossfadeSlot, DEFAULT_TRANSITION_TIME, LayerError, LayerResult,
    LayerSlot,
};
use veil_channel::ChannelPool;
use veil_core::{Environment, TimeOfDay, Weather};

/// The three continuously-running ambient beds. Each occupies one
/// crossfade slot; world-state changes swap the bed behind a fade.
pub struct AmbientBeds {
    environment: CrossfadeSlot,
    weather: CrossfadeSlot,
    time_of_day: CrossfadeSlot,
    transition_time: f32,
}

impl AmbientBeds {
    pub fn new(transition_time: f32) -> Self {
        Self {
            environment: CrossfadeSlot::new(LayerSlot::Environment),
            weather: CrossfadeSlot::new(LayerSlot::Weather),
            time_of_day: CrossfadeSlot::new(LayerSlot::TimeOfDay),
            transition_time: if transition_time > 0.0 {
                transition_time
            } else {
                DEFAULT_TRANSITION_TIME
            },
        }
    }

    /// Swap one ambient bed. Requesting the bed that is already active
    /// is a no-op. A catalog miss rejects the request and the slot
    /// keeps its prior state.
    pub fn request(
        &mut self,
        pool: &mut ChannelPool,
        catalog: &dyn ClipCatalog,
        key: BedKey,
        duration: Option<f32>,
    ) -> LayerResult<()> {
        let slot = match key.slot() {
            LayerSlot::Environment => &mut self.environment,
            LayerSlot::Weather => &mut self.weather,
            LayerSlot::TimeOfDay => &mut self.time_of_day,
            LayerSlot::Music => {
                debug_assert!(false, "music transitions go through MusicDirector");
                return Ok(());
            }
        };

        if slot.active_key() == Some(key) {
            return Ok(());
        }

        let clip = catalog
            .random_clip(key)
            .ok_or_else(|| LayerError::NoClip(key.to_string()))?;
        let duration = duration.unwrap_or(self.transition_time);
        slot.begin_transition(pool, key, clip, duration)
    }

    pub fn change_environment(
        &mut self,
        pool: &mut ChannelPool,
        catalog: &dyn ClipCatalog,
        environment: Environment,
    ) -> LayerResult<()> {
        self.request(pool, catalog, BedKey::Environment(environment), None)
    }

    pub fn change_weather(
        &mut self,
        pool: &mut ChannelPool,
        catalog: &dyn ClipCatalog,
        weather: Weather,
    ) -> LayerResult<()> {
        self.request(pool, catalog, BedKey::Weather(weather), None)
    }

    pub fn change_time_of_day(
        &mut self,
        pool: &mut ChannelPool,
        catalog: &dyn ClipCatalog,
        time_of_day: TimeOfDay,
    ) -> LayerResult<()> {
        self.request(pool, catalog, BedKey::TimeOfDay(time_of_day), None)
    }

    /// Advance every bed's fades and re-apply the ambient multiplier
    pub fn advance(&mut self, pool: &mut ChannelPool, dt: f32, ambient_multiplier: f32) {
        self.environment.advance(pool, dt, ambient_multiplier);
        self.weather.advance(pool, dt, ambient_multiplier);
        self.time_of_day.advance(pool, dt, ambient_multiplier);
    }

    /// Strongest masking contribution across the three beds
    pub fn masking_level(&self) -> f32 {
        self.environment
            .masking_level()
            .max(self.weather.masking_level())
            .max(self.time_of_day.masking_level())
    }

    pub fn active_environment(&self) -> Option<BedKey> {
        self.environment.active_key()
    }

    pub fn active_weather(&self) -> Option<BedKey> {
        self.weather.active_key()
    }

    pub fn active_time_of_day(&self) -> Option<BedKey> {
        self.time_of_day.active_key()
    }

    pub fn is_transitioning(&self) -> bool {
        self.environment.is_transitioning()
            || self.weather.is_transitioning()
            || self.time_of_day.is_transitioning()
    }

    /// Snap all beds silent and give their channels back (shutdown)
    pub fn stop(&mut self, pool: &mut ChannelPool) {
        self.environment.stop(pool);
        self.weather.stop(pool);
        self.time_of_day.stop(pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionCatalog, SoundCollection};
    use veil_channel::ReclaimPolicy;
    use veil_core::ClipHandle;

    fn catalog() -> CollectionCatalog {
        CollectionCatalog::with_seed(
            vec![
                SoundCollection::new(
                    BedKey::Environment(Environment::Outdoor),
                    vec![ClipHandle::new(1, 60.0)],
                )
                .with_masking(0.2),
                SoundCollection::new(
                    BedKey::Environment(Environment::Cave),
                    vec![ClipHandle::new(2, 60.0)],
                )
                .with_masking(0.3),
                SoundCollection::new(
                    BedKey::Weather(Weather::Rain),
                    vec![ClipHandle::new(3, 45.0)],
                )
                .with_masking(0.5),
            ],
            11,
        )
    }

    #[test]
    fn test_environment_swap_releases_old_channel() {
        let mut pool = ChannelPool::new(8, ReclaimPolicy::RefuseNew);
        let catalog = catalog();
        let mut beds = AmbientBeds::new(2.0);

        beds.change_environment(&mut pool, &catalog, Environment::Outdoor)
            .unwrap();
        for _ in 0..25 {
            beds.advance(&mut pool, 0.1, 1.0);
        }
        assert_eq!(pool.active_count(), 1);

        beds.change_environment(&mut pool, &catalog, Environment::Cave)
            .unwrap();
        assert_eq!(pool.active_count(), 2);
        for _ in 0..25 {
            beds.advance(&mut pool, 0.1, 1.0);
        }
        assert_eq!(pool.active_count(), 1);
        assert_eq!(
            beds.active_environment(),
            Some(BedKey::Environment(Environment::Cave))
        );
    }

    #[test]
    fn test_same_bed_request_is_noop() {
        let mut pool = ChannelPool::new(8, ReclaimPolicy::RefuseNew);
        let catalog = catalog();
        let mut beds = AmbientBeds::new(1.0);

        beds.change_weather(&mut pool, &catalog, Weather::Rain)
            .unwrap();
        beds.change_weather(&mut pool, &catalog, Weather::Rain)
            .unwrap();
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_missing_collection_keeps_prior_state() {
        let mut pool = ChannelPool::new(8, ReclaimPolicy::RefuseNew);
        let catalog = catalog();
        let mut beds = AmbientBeds::new(1.0);

        beds.change_weather(&mut pool, &catalog, Weather::Rain)
            .unwrap();
        let err = beds.change_weather(&mut pool, &catalog, Weather::Storm);
        assert!(err.is_err());
        assert_eq!(beds.active_weather(), Some(BedKey::Weather(Weather::Rain)));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_beds_masking_tracks_strongest() {
        let mut pool = ChannelPool::new(8, ReclaimPolicy::RefuseNew);
        let catalog = catalog();
        let mut beds = AmbientBeds::new(1.0);

        beds.change_environment(&mut pool, &catalog, Environment::Outdoor)
            .unwrap();
        beds.change_weather(&mut pool, &catalog, Weather::Rain)
            .unwrap();
        for _ in 0..15 {
            beds.advance(&mut pool, 0.1, 1.0);
        }
        // Rain (0.5) dominates the outdoor bed (0.2)
        assert!((beds.masking_level() - 0.5).abs() < 1e-3);
    }
}
