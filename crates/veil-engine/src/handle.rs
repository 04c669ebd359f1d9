//! Shared handle to the coordinator
//!
//! The coordinator itself is single-owner; game code that lives on the
//! same thread as the tick loop can hold this cheap clone-able handle
//! instead of threading `&mut` everywhere. Cross-thread callers should
//! prefer the command queue and keep the lock for queries only.

use crate::{AudioCoordinator, EngineResult, ListenerId, WorldSnapshot};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use veil_channel::ChannelId;
use veil_core::{Position3D, SoundDescriptor};
use veil_layers::BedKey;

/// Clone-able reference to one owned coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    inner: Arc<Mutex<AudioCoordinator>>,
}

impl CoordinatorHandle {
    pub fn new(coordinator: AudioCoordinator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(coordinator)),
        }
    }

    /// Lock for direct access to the full API
    pub fn lock(&self) -> MutexGuard<'_, AudioCoordinator> {
        self.inner.lock()
    }

    /// Frame hook; returns a clone of the snapshot when a coordinated
    /// tick ran
    pub fn tick(&self, dt: f32) -> Option<WorldSnapshot> {
        self.inner.lock().tick(dt).cloned()
    }

    pub fn masking_strength_at(&self, position: Position3D) -> f32 {
        self.inner.lock().masking_strength_at(position)
    }

    pub fn audibility_multiplier(&self, sound: &SoundDescriptor) -> f32 {
        self.inner.lock().audibility_multiplier(sound)
    }

    pub fn play_effect(&self, sound: &SoundDescriptor) -> EngineResult<ChannelId> {
        self.inner.lock().play_effect(sound)
    }

    pub fn request_layer_transition(
        &self,
        key: BedKey,
        duration: Option<f32>,
    ) -> EngineResult<()> {
        self.inner.lock().request_layer_transition(key, duration)
    }

    pub fn register_listener(
        &self,
        listener: impl FnMut(&WorldSnapshot) + Send + 'static,
    ) -> ListenerId {
        self.inner.lock().register_listener(listener)
    }

    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        self.inner.lock().unregister_listener(id)
    }

    pub fn shutdown(&self) {
        self.inner.lock().shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Collaborators, CoordinatorConfig};
    use std::sync::Arc;
    use veil_layers::CollectionCatalog;

    #[test]
    fn test_handle_clones_share_state() {
        let catalog = Arc::new(CollectionCatalog::with_seed(Vec::new(), 1));
        let handle = CoordinatorHandle::new(AudioCoordinator::new(
            CoordinatorConfig::default(),
            Collaborators::new(catalog),
        ));
        let other = handle.clone();

        handle.lock().set_tension(0.9);
        other.shutdown();
        assert!(!handle.lock().is_enabled());
    }
}
