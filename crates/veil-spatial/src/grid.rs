//! Uniform grid over active channels
//!
//! The index is rebuilt wholesale on a slower cadence than the
//! coordinated tick and is never patched incrementally — either the
//! whole index is current or it is the previous complete snapshot.
//! Stale-entry bugs from externally destroyed channels cannot occur
//! because entries only ever enter through a full rebuild.

use crate::{SpatialError, SpatialResult};
use std::collections::HashMap;
use veil_core::Position3D;

/// Integer grid cell coordinate (floored world position / cell size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Grid index over items tagged with a world position
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    cells: HashMap<GridKey, Vec<(T, Position3D)>>,
    cell_size: f32,
    indexed: usize,
}

impl<T: Copy> SpatialIndex<T> {
    pub fn new(cell_size: f32) -> SpatialResult<Self> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Err(SpatialError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cells: HashMap::new(),
            cell_size,
            indexed: 0,
        })
    }

    fn key_for(&self, pos: Position3D) -> GridKey {
        GridKey {
            x: (pos.x / self.cell_size).floor() as i32,
            y: (pos.y / self.cell_size).floor() as i32,
            z: (pos.z / self.cell_size).floor() as i32,
        }
    }

    /// Clear and refill the whole grid from `entries`, keeping only
    /// items within `max_radius` of `center`. Category or layer
    /// filtering is the caller's job — pass a pre-filtered iterator.
    pub fn rebuild(
        &mut self,
        entries: impl IntoIterator<Item = (T, Position3D)>,
        center: Position3D,
        max_radius: f32,
    ) {
        self.cells.clear();
        self.indexed = 0;
        let max_sq = max_radius * max_radius;

        for (item, pos) in entries {
            if pos.distance_squared(&center) > max_sq {
                continue;
            }
            let key = self.key_for(pos);
            self.cells.entry(key).or_default().push((item, pos));
            self.indexed += 1;
        }

        log::debug!(
            "spatial index rebuilt: {} items in {} cells",
            self.indexed,
            self.cells.len()
        );
    }

    /// Items within `radius` of `center`. Grid cells are the coarse
    /// pre-filter; every result is verified by exact distance.
    pub fn query(&self, center: Position3D, radius: f32) -> Vec<T> {
        let mut result = Vec::new();
        if radius < 0.0 {
            return result;
        }
        let center_key = self.key_for(center);
        let reach = (radius / self.cell_size).ceil() as i32;
        let radius_sq = radius * radius;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let key = GridKey {
                        x: center_key.x + dx,
                        y: center_key.y + dy,
                        z: center_key.z + dz,
                    };
                    let Some(cell) = self.cells.get(&key) else {
                        continue;
                    };
                    for (item, pos) in cell {
                        if pos.distance_squared(&center) <= radius_sq {
                            result.push(*item);
                        }
                    }
                }
            }
        }
        result
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.indexed
    }

    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    /// Number of occupied grid cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(SpatialIndex::<u32>::new(0.0).is_err());
        assert!(SpatialIndex::<u32>::new(-3.0).is_err());
        assert!(SpatialIndex::<u32>::new(10.0).is_ok());
    }

    #[test]
    fn test_query_exact_set_randomized() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let center = Position3D::origin();
        let radius = 12.0;

        let placements: Vec<(u32, Position3D)> = (0..200)
            .map(|i| {
                let pos = Position3D::new(
                    rng.random_range(-30.0..30.0),
                    rng.random_range(-30.0..30.0),
                    rng.random_range(-30.0..30.0),
                );
                (i, pos)
            })
            .collect();

        let mut index = SpatialIndex::new(5.0).unwrap();
        index.rebuild(placements.iter().copied(), center, 100.0);

        let mut got = index.query(center, radius);
        got.sort_unstable();

        let mut expected: Vec<u32> = placements
            .iter()
            .filter(|(_, pos)| pos.distance_to(&center) <= radius)
            .map(|(id, _)| *id)
            .collect();
        expected.sort_unstable();

        assert_eq!(got, expected);
        assert!(!expected.is_empty(), "degenerate test placement");
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut index = SpatialIndex::new(4.0).unwrap();
        let center = Position3D::origin();

        index.rebuild([(1u32, Position3D::new(1.0, 0.0, 0.0))], center, 50.0);
        assert_eq!(index.query(center, 10.0), vec![1]);

        index.rebuild([(2u32, Position3D::new(2.0, 0.0, 0.0))], center, 50.0);
        let got = index.query(center, 10.0);
        assert_eq!(got, vec![2], "old entries must not survive a rebuild");
    }

    #[test]
    fn test_rebuild_radius_filter() {
        let mut index = SpatialIndex::new(4.0).unwrap();
        let center = Position3D::origin();
        index.rebuild(
            [
                (1u32, Position3D::new(3.0, 0.0, 0.0)),
                (2u32, Position3D::new(90.0, 0.0, 0.0)),
            ],
            center,
            25.0,
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.query(Position3D::new(90.0, 0.0, 0.0), 5.0), vec![]);
    }
}
