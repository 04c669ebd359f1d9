//! Tension-aware music direction
//!
//! Tracks carry the tension level they suit plus the world conditions
//! they are written for; the director picks the best fit each time the
//! coordinator reports a change and crossfades the music slot to it.

use crate::{BedKey, CrossfadeSlot, LayerClip, LayerResult, LayerSlot};
use serde::{Deserialize, Serialize};
use veil_channel::ChannelPool;
use veil_core::{ClipHandle, Environment, TimeOfDay, Weather, WorldState};

/// Identifier of an authored music track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u32);

/// One authored music track and the conditions it suits.
/// Empty suitability lists mean "any".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicTrack {
    pub id: TrackId,
    pub name: String,
    pub clip: ClipHandle,
    #[serde(default = "default_track_volume")]
    pub volume: f32,
    /// Tension level this track is written for, in [0, 1]
    #[serde(default)]
    pub tension: f32,
    #[serde(default = "default_true")]
    pub allow_in_stealth: bool,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub weathers: Vec<Weather>,
    #[serde(default)]
    pub times: Vec<TimeOfDay>,
    /// Masking strength the track contributes while playing
    #[serde(default = "default_track_masking")]
    pub masking: f32,
    /// Crossfade duration into this track, in seconds
    #[serde(default = "default_fade_time")]
    pub fade_time: f32,
}

fn default_track_volume() -> f32 {
    0.8
}
fn default_true() -> bool {
    true
}
fn default_track_masking() -> f32 {
    0.3
}
fn default_fade_time() -> f32 {
    2.0
}

impl MusicTrack {
    pub fn new(id: u32, name: &str, clip: ClipHandle, tension: f32) -> Self {
        Self {
            id: TrackId(id),
            name: name.to_string(),
            clip,
            volume: 0.8,
            tension,
            allow_in_stealth: true,
            environments: Vec::new(),
            weathers: Vec::new(),
            times: Vec::new(),
            masking: 0.3,
            fade_time: 2.0,
        }
    }

    /// Whether the track may play under the given conditions
    pub fn suits(&self, world: &WorldState, stealth_active: bool) -> bool {
        if stealth_active && !self.allow_in_stealth {
            return false;
        }
        let env_ok =
            self.environments.is_empty() || self.environments.contains(&world.environment);
        let weather_ok = self.weathers.is_empty() || self.weathers.contains(&world.weather);
        let time_ok = self.times.is_empty() || self.times.contains(&world.time_of_day);
        env_ok && weather_ok && time_ok
    }
}

/// Owns the music slot and the track table
pub struct MusicDirector {
    tracks: Vec<MusicTrack>,
    slot: CrossfadeSlot,
}

impl MusicDirector {
    pub fn new(tracks: Vec<MusicTrack>) -> Self {
        Self {
            tracks,
            slot: CrossfadeSlot::new(LayerSlot::Music),
        }
    }

    /// Parse a track table from authored JSON
    pub fn from_json(json: &str) -> LayerResult<Self> {
        let tracks: Vec<MusicTrack> = serde_json::from_str(json)?;
        Ok(Self::new(tracks))
    }

    pub fn current_track(&self) -> Option<TrackId> {
        match self.slot.active_key() {
            Some(BedKey::Music(id)) => Some(id),
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.slot.current().is_some()
    }

    /// Pick the best track for `tension` under the current conditions:
    /// the highest track tension at or below the target among suitable
    /// tracks, or the gentlest suitable track when everything is above.
    pub fn select(&self, tension: f32, world: &WorldState, stealth_active: bool) -> Option<TrackId> {
        let suitable: Vec<&MusicTrack> = self
            .tracks
            .iter()
            .filter(|t| t.suits(world, stealth_active))
            .collect();

        let at_or_below = suitable
            .iter()
            .filter(|t| t.tension <= tension + 1e-6)
            .max_by(|a, b| a.tension.total_cmp(&b.tension));
        at_or_below
            .or_else(|| {
                suitable
                    .iter()
                    .min_by(|a, b| a.tension.total_cmp(&b.tension))
            })
            .map(|t| t.id)
    }

    /// Re-evaluate the selection and crossfade when it changed.
    /// Returns whether a new transition started.
    pub fn update_selection(
        &mut self,
        pool: &mut ChannelPool,
        tension: f32,
        world: &WorldState,
        stealth_active: bool,
    ) -> LayerResult<bool> {
        let Some(selected) = self.select(tension, world, stealth_active) else {
            return Ok(false);
        };
        if self.current_track() == Some(selected) {
            return Ok(false);
        }
        self.start_track(pool, selected)?;
        Ok(true)
    }

    /// Force a specific track regardless of tension
    pub fn start_track(&mut self, pool: &mut ChannelPool, id: TrackId) -> LayerResult<()> {
        let Some(track) = self.tracks.iter().find(|t| t.id == id) else {
            return Err(crate::LayerError::NoClip(format!("music track {}", id.0)));
        };
        let clip = LayerClip {
            clip: track.clip,
            volume: track.volume,
            pitch: 1.0,
            masking: track.masking,
        };
        let fade = track.fade_time;
        log::info!("music: switching to '{}' (tension {:.2})", track.name, track.tension);
        self.slot
            .begin_transition(pool, BedKey::Music(id), clip, fade)
    }

    /// Fade the music out over `fade_time` without starting a new track
    pub fn stop_music(&mut self, pool: &mut ChannelPool, fade_time: f32) {
        if fade_time <= 0.0 {
            self.slot.stop(pool);
        } else {
            self.slot.fade_out_current(pool, fade_time);
        }
    }

    pub fn advance(&mut self, pool: &mut ChannelPool, dt: f32, music_multiplier: f32) {
        self.slot.advance(pool, dt, music_multiplier);
    }

    pub fn masking_level(&self) -> f32 {
        self.slot.masking_level()
    }

    pub fn stop(&mut self, pool: &mut ChannelPool) {
        self.slot.stop(pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_channel::ReclaimPolicy;

    fn tracks() -> Vec<MusicTrack> {
        vec![
            MusicTrack::new(1, "calm", ClipHandle::new(101, 120.0), 0.0),
            MusicTrack::new(2, "uneasy", ClipHandle::new(102, 110.0), 0.5),
            {
                let mut t = MusicTrack::new(3, "combat", ClipHandle::new(103, 90.0), 0.9);
                t.allow_in_stealth = false;
                t
            },
            {
                let mut t = MusicTrack::new(4, "cave", ClipHandle::new(104, 100.0), 0.2);
                t.environments = vec![Environment::Cave];
                t
            },
        ]
    }

    #[test]
    fn test_select_highest_at_or_below() {
        let director = MusicDirector::new(tracks());
        let world = WorldState::default();
        assert_eq!(director.select(0.55, &world, false), Some(TrackId(2)));
        assert_eq!(director.select(0.95, &world, false), Some(TrackId(3)));
        assert_eq!(director.select(0.0, &world, false), Some(TrackId(1)));
    }

    #[test]
    fn test_stealth_excludes_forbidden_tracks() {
        let director = MusicDirector::new(tracks());
        let world = WorldState::default();
        // At high tension the combat track would win, but not in stealth
        assert_eq!(director.select(0.95, &world, true), Some(TrackId(2)));
    }

    #[test]
    fn test_environment_suitability() {
        let director = MusicDirector::new(tracks());
        let cave = WorldState::new(Environment::Cave, Weather::Clear, TimeOfDay::Night);
        assert_eq!(director.select(0.3, &cave, false), Some(TrackId(4)));
    }

    #[test]
    fn test_update_selection_transitions_once() {
        let mut pool = ChannelPool::new(4, ReclaimPolicy::RefuseNew);
        let mut director = MusicDirector::new(tracks());
        let world = WorldState::default();

        assert!(
            director
                .update_selection(&mut pool, 0.55, &world, false)
                .unwrap()
        );
        assert_eq!(director.current_track(), Some(TrackId(2)));

        // Same tension: no new transition
        assert!(
            !director
                .update_selection(&mut pool, 0.55, &world, false)
                .unwrap()
        );
        assert_eq!(pool.active_count(), 1);
    }
}
