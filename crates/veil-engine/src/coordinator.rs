//! The coordinated update loop
//!
//! One coordinator owns the channel pool, the spatial index, the
//! ambient beds, the music director and the masking model, and drives
//! them all from a single tick. Subsystems never poll world state on
//! their own: each tick builds one immutable snapshot and fans it out
//! in a fixed order, so everything acts on the same view of the world.

use crate::{
    Collaborators, CoordinatorCommand, CoordinatorConfig, CoordinatorStats, EngineError,
    EngineResult, EnvironmentStateProvider, StealthStateProvider, VolumeProvider, WorldSnapshot,
};
use rtrb::Consumer;
use smallvec::SmallVec;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;
use veil_channel::{ChannelId, ChannelPool};
use veil_core::{CategoryVolumes, Position3D, SoundCategory, SoundDescriptor, WorldState};
use veil_layers::{AmbientBeds, BedKey, ClipCatalog, MusicDirector, MusicTrack};
use veil_masking::{MaskingBreakdown, MaskingCalculator, MaskingInputs, StealthStance};
use veil_spatial::{AudibilityModel, ObstacleMap, SpatialIndex};

/// Handle to a registered snapshot listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

type ListenerFn = Box<dyn FnMut(&WorldSnapshot) + Send>;

/// The stealth-aware dynamic audio coordination engine
pub struct AudioCoordinator {
    config: CoordinatorConfig,
    enabled: bool,
    paused: bool,

    // Owned subsystems
    pool: ChannelPool,
    index: SpatialIndex<ChannelId>,
    beds: AmbientBeds,
    music: MusicDirector,
    masking: MaskingCalculator,
    stance: StealthStance,
    audibility: AudibilityModel,

    // Collaborators
    catalog: Arc<dyn ClipCatalog>,
    volume_provider: Option<Arc<dyn VolumeProvider>>,
    stealth_provider: Option<Arc<dyn StealthStateProvider>>,
    environment_provider: Option<Arc<dyn EnvironmentStateProvider>>,
    obstacles: Arc<dyn ObstacleMap>,

    listeners: Vec<(ListenerId, ListenerFn)>,
    next_listener: u32,
    commands: Option<Consumer<CoordinatorCommand>>,

    // Tick state
    accumulator: f32,
    elapsed: f64,
    tick_count: u64,
    player_position: Position3D,
    tension: f32,
    last_world: WorldState,
    last_stealth: bool,
    fallback_volumes: CategoryVolumes,
    last_breakdown: MaskingBreakdown,
    last_snapshot: Option<WorldSnapshot>,
    stats: CoordinatorStats,

    // Missing collaborators are warned about once, not every tick
    warned_no_volumes: bool,
    warned_no_environment: bool,
}

impl AudioCoordinator {
    pub fn new(config: CoordinatorConfig, collaborators: Collaborators) -> Self {
        let config = config.sanitized();
        let pool = ChannelPool::new(config.max_channels, config.reclaim_policy);
        let index = SpatialIndex::new(config.spatial_grid_size)
            .expect("sanitized grid size is positive");
        let beds = AmbientBeds::new(config.transition_time);
        let masking = MaskingCalculator::new(config.masking.clone());
        let stance = StealthStance::new(config.stance);
        let audibility = config.audibility;

        log::info!(
            "audio coordinator up: {} channels, {:.0}ms tick",
            config.max_channels,
            config.update_interval * 1000.0
        );

        Self {
            config,
            enabled: true,
            paused: false,
            pool,
            index,
            beds,
            music: MusicDirector::new(Vec::new()),
            masking,
            stance,
            audibility,
            catalog: collaborators.catalog,
            volume_provider: collaborators.volumes,
            stealth_provider: collaborators.stealth,
            environment_provider: collaborators.environment,
            obstacles: collaborators
                .obstacles
                .unwrap_or_else(|| Arc::new(veil_spatial::OpenField)),
            listeners: Vec::new(),
            next_listener: 0,
            commands: None,
            accumulator: 0.0,
            elapsed: 0.0,
            tick_count: 0,
            player_position: Position3D::origin(),
            tension: 0.0,
            last_world: WorldState::default(),
            last_stealth: false,
            fallback_volumes: CategoryVolumes::default(),
            last_breakdown: MaskingBreakdown::default(),
            last_snapshot: None,
            stats: CoordinatorStats::default(),
            warned_no_volumes: false,
            warned_no_environment: false,
        }
    }

    /// Install the authored music track table
    pub fn set_music_tracks(&mut self, tracks: Vec<MusicTrack>) {
        self.music = MusicDirector::new(tracks);
    }

    /// Attach the receiving end of a [`crate::command_channel`]
    pub fn set_command_queue(&mut self, rx: Consumer<CoordinatorCommand>) {
        self.commands = Some(rx);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    pub fn last_snapshot(&self) -> Option<&WorldSnapshot> {
        self.last_snapshot.as_ref()
    }

    // ------------------------------------------------------------------
    // Game-facing state feeds
    // ------------------------------------------------------------------

    pub fn set_player_position(&mut self, position: Position3D) {
        self.player_position = position;
    }

    /// Gameplay tension in [0, 1]; drives music selection
    pub fn set_tension(&mut self, tension: f32) {
        self.tension = tension.clamp(0.0, 1.0);
    }

    pub fn set_update_interval(&mut self, interval: f32) {
        self.config.update_interval = interval.clamp(0.05, 1.0);
    }

    /// Register a callback receiving every coordinated snapshot
    pub fn register_listener(
        &mut self,
        listener: impl FnMut(&WorldSnapshot) + Send + 'static,
    ) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // ------------------------------------------------------------------
    // Queries (the stealth-AI-facing surface)
    // ------------------------------------------------------------------

    /// Masking strength at a world position with the current world
    /// state. The environmental term is global in this model, so the
    /// position only matters to callers compensating for distance
    /// themselves.
    pub fn masking_strength_at(&self, _position: Position3D) -> f32 {
        self.last_breakdown.total
    }

    /// How well the AI hears one specific sound, masking and stance
    /// applied. Non-gameplay sounds are always 0.
    pub fn audibility_multiplier(&self, sound: &SoundDescriptor) -> f32 {
        self.masking.audibility(&self.last_breakdown, sound)
    }

    /// Stance volume multiplier for a category; exactly 1.0 outside
    /// the stance
    pub fn category_multiplier(&self, category: SoundCategory) -> f32 {
        self.stance.multiplier(category)
    }

    /// Whether a sound clears the audibility threshold at a listener,
    /// distance attenuation and occlusion included
    pub fn is_audible(
        &self,
        sound_pos: Position3D,
        hearing_radius: f32,
        listener_pos: Position3D,
    ) -> bool {
        self.audibility
            .is_audible(self.obstacles.as_ref(), sound_pos, hearing_radius, listener_pos)
    }

    // ------------------------------------------------------------------
    // Playback entry points
    // ------------------------------------------------------------------

    /// Start the beds and music for the current world state. Called
    /// once after construction; afterwards the changed-flags in each
    /// snapshot keep them in sync. Missing collections degrade to a
    /// silent bed, they do not fail the call.
    pub fn start_ambience(&mut self) -> EngineResult<()> {
        if !self.enabled {
            return Err(EngineError::Disabled);
        }
        let world = self
            .environment_provider
            .as_ref()
            .map(|p| p.current_state())
            .unwrap_or(self.last_world);
        self.last_world = world;

        for key in [
            BedKey::Environment(world.environment),
            BedKey::Weather(world.weather),
            BedKey::TimeOfDay(world.time_of_day),
        ] {
            if let Err(e) =
                self.beds
                    .request(&mut self.pool, self.catalog.as_ref(), key, None)
            {
                log::warn!("initial bed {key} unavailable: {e}");
            }
        }
        if let Err(e) = self.music.update_selection(
            &mut self.pool,
            self.tension,
            &world,
            self.stance.is_active(),
        ) {
            log::warn!("initial music selection failed: {e}");
        }
        Ok(())
    }

    /// Crossfade a layer slot to a new bed or track
    pub fn request_layer_transition(
        &mut self,
        key: BedKey,
        duration: Option<f32>,
    ) -> EngineResult<()> {
        if !self.enabled {
            return Err(EngineError::Disabled);
        }
        match key {
            BedKey::Music(id) => self.music.start_track(&mut self.pool, id)?,
            _ => self
                .beds
                .request(&mut self.pool, self.catalog.as_ref(), key, duration)?,
        }
        Ok(())
    }

    /// Play a one-shot sound through the pool. The channel is released
    /// automatically when the clip ends. Pool exhaustion is reported,
    /// not thrown; callers skip the sound.
    pub fn play_effect(&mut self, sound: &SoundDescriptor) -> EngineResult<ChannelId> {
        if !self.enabled {
            return Err(EngineError::Disabled);
        }
        let id = self.pool.acquire(sound.category, sound.priority)?;
        let volumes = self.current_volumes();
        let stance_mult = self.stance.multiplier(sound.category);
        let masking_gain = if sound.affects_gameplay {
            1.0 - self
                .masking
                .masking_for_category(&self.last_breakdown, sound.category)
        } else {
            1.0
        };

        let channel = self
            .pool
            .get_mut(id)
            .expect("freshly acquired channel is active");
        channel.position = sound.position;
        channel.volume =
            (sound.volume * volumes.effective(sound.category) * stance_mult).clamp(0.0, 1.0);
        channel.pitch = sound.pitch;
        channel.masking_gain = masking_gain;
        channel.play_clip(sound.clip, false);
        Ok(id)
    }

    /// Stop a playing one-shot early and return its channel
    pub fn stop_effect(&mut self, id: ChannelId) {
        self.pool.release(id);
    }

    // ------------------------------------------------------------------
    // The tick
    // ------------------------------------------------------------------

    /// Frame hook. Accumulates `dt` and runs one coordinated tick each
    /// time the configured interval elapses. Returns the snapshot when
    /// a coordinated tick ran.
    pub fn tick(&mut self, dt: f32) -> Option<&WorldSnapshot> {
        if !self.enabled || dt <= 0.0 {
            return None;
        }
        self.accumulator += dt;
        if self.accumulator < self.config.update_interval {
            return None;
        }
        let step = self.accumulator;
        self.accumulator = 0.0;
        if self.coordinated_tick(step) {
            self.last_snapshot.as_ref()
        } else {
            None
        }
    }

    /// Run one full coordinated update covering `dt` seconds; returns
    /// whether the update actually ran
    fn coordinated_tick(&mut self, dt: f32) -> bool {
        let started = Instant::now();
        self.drain_commands();
        if !self.enabled || self.paused {
            return false;
        }

        self.elapsed += dt as f64;

        // 1. Periodic wholesale index rebuild
        if self.tick_count % self.config.index_rebuild_period as u64 == 0 {
            self.rebuild_index();
        }
        self.tick_count += 1;

        // 2. Build the snapshot
        let snapshot = self.build_snapshot(dt);

        // 3. Fixed-order dispatch
        self.dispatch(&snapshot);

        // 4. Auto-release finished one-shots
        for id in self.pool.advance(dt) {
            log::debug!("one-shot finished, releasing {:?}", id);
            self.pool.release(id);
        }

        self.stats = CoordinatorStats {
            ticks: self.tick_count,
            last_tick_ms: started.elapsed().as_secs_f32() * 1000.0,
            active_channels: self.pool.active_count(),
            pool_capacity: self.pool.capacity(),
            indexed_channels: self.index.len(),
            index_cells: self.index.cell_count(),
            listeners: self.listeners.len(),
        };
        self.last_snapshot = Some(snapshot);
        true
    }

    fn drain_commands(&mut self) {
        let Some(rx) = self.commands.as_mut() else {
            return;
        };
        let mut drained: SmallVec<[CoordinatorCommand; 8]> = SmallVec::new();
        while let Ok(command) = rx.pop() {
            drained.push(command);
        }
        for command in drained {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: CoordinatorCommand) {
        match command {
            CoordinatorCommand::SetPlayerPosition(position) => {
                self.player_position = position;
            }
            CoordinatorCommand::SetTension(tension) => self.set_tension(tension),
            CoordinatorCommand::RequestBed { key, duration } => {
                if let Err(e) = self.request_layer_transition(key, duration) {
                    log::warn!("bed request {key} rejected: {e}");
                }
            }
            CoordinatorCommand::PlayTrack(id) => {
                if let Err(e) = self.music.start_track(&mut self.pool, id) {
                    log::warn!("track request rejected: {e}");
                }
            }
            CoordinatorCommand::StopMusic { fade_time } => {
                self.music.stop_music(&mut self.pool, fade_time);
            }
            CoordinatorCommand::SetStealthOverride(forced) => match forced {
                Some(forced) => {
                    self.stance.set_override(forced);
                }
                None => self.stance.clear_override(),
            },
            CoordinatorCommand::SetVolumes(volumes) => {
                self.fallback_volumes = volumes.clamped();
            }
            CoordinatorCommand::SetUpdateInterval(interval) => {
                self.set_update_interval(interval);
            }
            CoordinatorCommand::Pause => self.pause(),
            CoordinatorCommand::Resume => self.resume(),
            CoordinatorCommand::Shutdown => self.shutdown(),
        }
    }

    fn rebuild_index(&mut self) {
        let center = self.player_position;
        let range = self.config.max_detection_range;
        let entries: Vec<(ChannelId, Position3D)> = self
            .pool
            .active()
            .filter(|c| c.playing && c.category.is_spatial())
            .map(|c| (c.id(), c.position))
            .collect();
        self.index.rebuild(entries, center, range);
    }

    fn current_volumes(&self) -> CategoryVolumes {
        match &self.volume_provider {
            Some(provider) => provider.volumes().clamped(),
            None => self.fallback_volumes,
        }
    }

    fn build_snapshot(&mut self, dt: f32) -> WorldSnapshot {
        // Stealth stance, with changed-comparison
        let reported = self
            .stealth_provider
            .as_ref()
            .map(|p| p.should_reduce_non_stealth_audio())
            .unwrap_or(false);
        self.stance.update(reported);
        let stealth_active = self.stance.is_active();
        let stealth_changed = stealth_active != self.last_stealth;
        self.last_stealth = stealth_active;

        // World state from the environment collaborator
        let world = match &self.environment_provider {
            Some(provider) => provider.current_state(),
            None => {
                if !self.warned_no_environment {
                    log::warn!("no environment provider; world state frozen at defaults");
                    self.warned_no_environment = true;
                }
                self.last_world
            }
        };
        let environment_changed = world.environment != self.last_world.environment;
        let weather_changed = world.weather != self.last_world.weather;
        let time_changed = world.time_of_day != self.last_world.time_of_day;
        self.last_world = world;

        // Volumes, with graceful fallback
        if self.volume_provider.is_none() && !self.warned_no_volumes {
            log::warn!("no volume provider; using last explicitly set volumes");
            self.warned_no_volumes = true;
        }
        let volumes = self.current_volumes();
        self.fallback_volumes = volumes;

        let nearby: SmallVec<[ChannelId; 16]> = self
            .index
            .query(self.player_position, self.config.max_detection_range)
            .into_iter()
            .collect();

        // Environmental masking: the loudest of what the collaborator
        // reports, what our own beds contribute, and what nearby
        // emitters add around the player
        let ambient_masking = self
            .environment_provider
            .as_ref()
            .and_then(|p| p.masking_level())
            .unwrap_or_else(|| self.beds.masking_level());
        let environment_masking = ambient_masking.max(self.nearby_masking(&nearby));

        let inputs = MaskingInputs {
            bgm_playing: self.music.is_playing(),
            bgm_masking: self.music.masking_level(),
            environment_masking,
            weather: world.weather,
            time_of_day: world.time_of_day,
            stealth_active,
        };
        let masking = self.masking.breakdown(&inputs);
        self.last_breakdown = masking;

        WorldSnapshot {
            delta_time: dt,
            elapsed: self.elapsed,
            tick: self.tick_count,
            player_position: self.player_position,
            stealth_active,
            stealth_changed,
            environment_changed,
            weather_changed,
            time_changed,
            world,
            volumes,
            nearby,
            masking,
        }
    }

    /// Masking produced by emitters around the player: the single
    /// loudest contribution, volume scaled by linear distance falloff.
    /// A sum would saturate with channel count, so the max is taken.
    fn nearby_masking(&self, nearby: &[ChannelId]) -> f32 {
        let range = self.config.max_detection_range;
        nearby
            .iter()
            .filter_map(|id| self.pool.get(*id))
            .filter(|c| c.playing)
            .map(|c| {
                let distance = c.position.distance_to(&self.player_position);
                c.effective_volume() * (1.0 - distance / range).max(0.0)
            })
            .fold(0.0f32, f32::max)
            .clamp(0.0, 1.0)
    }

    /// Fan the snapshot out in the fixed order: beds on change, time
    /// re-application always, music selection, masking batch-apply,
    /// then external listeners.
    fn dispatch(&mut self, snapshot: &WorldSnapshot) {
        // Environment and weather beds react only to actual changes
        if snapshot.environment_changed {
            if let Err(e) = self.beds.change_environment(
                &mut self.pool,
                self.catalog.as_ref(),
                snapshot.world.environment,
            ) {
                log::warn!("environment bed change failed: {e}");
            }
        }
        if snapshot.weather_changed {
            if let Err(e) = self.beds.change_weather(
                &mut self.pool,
                self.catalog.as_ref(),
                snapshot.world.weather,
            ) {
                log::warn!("weather bed change failed: {e}");
            }
        }
        if snapshot.time_changed {
            if let Err(e) = self.beds.change_time_of_day(
                &mut self.pool,
                self.catalog.as_ref(),
                snapshot.world.time_of_day,
            ) {
                log::warn!("time-of-day bed change failed: {e}");
            }
        }

        // Music follows tension and conditions
        if let Err(e) = self.music.update_selection(
            &mut self.pool,
            self.tension,
            &snapshot.world,
            snapshot.stealth_active,
        ) {
            log::warn!("music selection failed: {e}");
        }

        // Advance every fade with this tick's multipliers; the time bed
        // re-applies volume every tick even without a state change
        let ambient_mult = snapshot.volumes.effective(SoundCategory::Ambient)
            * self.stance.multiplier(SoundCategory::Ambient);
        let music_mult = snapshot.volumes.effective(SoundCategory::Bgm)
            * self.stance.multiplier(SoundCategory::Bgm);
        self.beds
            .advance(&mut self.pool, snapshot.delta_time, ambient_mult);
        self.music
            .advance(&mut self.pool, snapshot.delta_time, music_mult);

        // Masking batch-apply to every nearby playing channel
        for id in &snapshot.nearby {
            if let Some(channel) = self.pool.get_mut(*id) {
                if channel.playing {
                    channel.masking_gain = 1.0
                        - self
                            .masking
                            .masking_for_category(&snapshot.masking, channel.category);
                }
            }
        }

        // External listeners, each isolated from the others
        for (id, listener) in self.listeners.iter_mut() {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(snapshot)));
            if outcome.is_err() {
                log::error!("snapshot listener {:?} panicked; continuing", id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Freeze all fades and playback clocks without losing state
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("audio coordinator paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            log::info!("audio coordinator resumed");
        }
    }

    /// Halt the coordinator. In-flight transitions are snapped to a
    /// safe stopped state and every channel is returned to the pool.
    pub fn shutdown(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.beds.stop(&mut self.pool);
        self.music.stop(&mut self.pool);
        self.pool.release_all();
        self.last_snapshot = None;
        log::info!("audio coordinator shut down");
    }
}
