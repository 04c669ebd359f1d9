//! Authored clip collections and the catalog trait
//!
//! A collection is balance data: a set of interchangeable clips for one
//! bed with small volume/pitch variation so loops don't sound stamped
//! out. The catalog resolves a bed key to a randomized pick.

use crate::{BedKey, LayerResult};
use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use veil_core::ClipHandle;

/// One randomized pick from a collection, ready to play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerClip {
    pub clip: ClipHandle,
    /// Base volume after variation, in [0, 1]
    pub volume: f32,
    pub pitch: f32,
    /// How strongly this bed masks player noise, in [0, 1]
    pub masking: f32,
}

/// Resolves a bed key to a playable clip. May return `None`; the
/// requesting slot then keeps its prior state.
pub trait ClipCatalog: Send + Sync {
    fn random_clip(&self, key: BedKey) -> Option<LayerClip>;
}

/// Authored clip set for one bed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundCollection {
    pub key: BedKey,
    pub clips: Vec<ClipHandle>,
    #[serde(default = "default_base_volume")]
    pub base_volume: f32,
    /// Half-width of the random volume spread
    #[serde(default)]
    pub volume_variation: f32,
    /// Half-width of the random pitch spread around 1.0
    #[serde(default)]
    pub pitch_variation: f32,
    /// Masking strength this bed contributes while audible
    #[serde(default)]
    pub masking: f32,
}

fn default_base_volume() -> f32 {
    0.7
}

impl SoundCollection {
    pub fn new(key: BedKey, clips: Vec<ClipHandle>) -> Self {
        Self {
            key,
            clips,
            base_volume: 0.7,
            volume_variation: 0.0,
            pitch_variation: 0.0,
            masking: 0.0,
        }
    }

    pub fn with_volume(mut self, base_volume: f32, variation: f32) -> Self {
        self.base_volume = base_volume;
        self.volume_variation = variation;
        self
    }

    pub fn with_masking(mut self, masking: f32) -> Self {
        self.masking = masking.clamp(0.0, 1.0);
        self
    }

    fn pick(&self, rng: &mut ChaCha8Rng) -> Option<LayerClip> {
        let clip = *self.clips.choose(rng)?;
        let volume = if self.volume_variation > 0.0 {
            let spread = self.volume_variation;
            self.base_volume + rng.random_range(-spread..spread)
        } else {
            self.base_volume
        };
        let pitch = if self.pitch_variation > 0.0 {
            let spread = self.pitch_variation;
            1.0 + rng.random_range(-spread..spread)
        } else {
            1.0
        };
        Some(LayerClip {
            clip,
            volume: volume.clamp(0.0, 1.0),
            pitch,
            masking: self.masking,
        })
    }
}

/// In-memory catalog over authored collections
pub struct CollectionCatalog {
    collections: Vec<SoundCollection>,
    rng: Mutex<ChaCha8Rng>,
}

impl CollectionCatalog {
    pub fn new(collections: Vec<SoundCollection>) -> Self {
        Self {
            collections,
            rng: Mutex::new(ChaCha8Rng::from_os_rng()),
        }
    }

    /// Deterministic variant for tests and replays
    pub fn with_seed(collections: Vec<SoundCollection>, seed: u64) -> Self {
        Self {
            collections,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Parse a collection table from authored JSON
    pub fn from_json(json: &str) -> LayerResult<Self> {
        let collections: Vec<SoundCollection> = serde_json::from_str(json)?;
        Ok(Self::new(collections))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl ClipCatalog for CollectionCatalog {
    fn random_clip(&self, key: BedKey) -> Option<LayerClip> {
        let collection = self.collections.iter().find(|c| c.key == key)?;
        collection.pick(&mut self.rng.lock())
    }
}
