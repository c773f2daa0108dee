//! Uniform-bucket spatial index over organism positions.
//!
//! Grounded on the teacher's `SpatialHash`, but reshaped from a bulk-rebuilt
//! CSR layout into an incrementally maintained bucket map: organisms move
//! every tick, and `update_position` needs a cheap no-op path when a move
//! stays within the same bucket.

use primordium_data::Position;
use std::collections::HashMap;
use uuid::Uuid;

type BucketKey = (i64, i64);

/// A uniform grid of square buckets, `cell_size` on a side, holding the
/// organism ids currently occupying each bucket.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    buckets: HashMap<BucketKey, Vec<Uuid>>,
    locations: HashMap<Uuid, BucketKey>,
}

impl SpatialGrid {
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            buckets: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    fn bucket_key(&self, position: Position) -> BucketKey {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Inserts `id` at `position`. A no-op if `id` is already tracked; use
    /// [`SpatialGrid::update_position`] to move an existing entry.
    pub fn add(&mut self, id: Uuid, position: Position) {
        if self.locations.contains_key(&id) {
            return;
        }
        let key = self.bucket_key(position);
        self.buckets.entry(key).or_default().push(id);
        self.locations.insert(id, key);
    }

    /// Removes `id` from the grid entirely. A no-op if `id` is untracked.
    pub fn remove(&mut self, id: Uuid) {
        if let Some(key) = self.locations.remove(&id) {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                bucket.retain(|existing| *existing != id);
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
    }

    /// Moves `id` to `new_position`. A no-op if the bucket is unchanged;
    /// inserts `id` fresh if it was not already tracked.
    pub fn update_position(&mut self, id: Uuid, new_position: Position) {
        let new_key = self.bucket_key(new_position);
        match self.locations.get(&id).copied() {
            Some(old_key) if old_key == new_key => {}
            Some(old_key) => {
                if let Some(bucket) = self.buckets.get_mut(&old_key) {
                    bucket.retain(|existing| *existing != id);
                    if bucket.is_empty() {
                        self.buckets.remove(&old_key);
                    }
                }
                self.buckets.entry(new_key).or_default().push(id);
                self.locations.insert(id, new_key);
            }
            None => self.add(id, new_position),
        }
    }

    /// Every organism in a bucket within `radius` of `center`'s bucket,
    /// including organisms sharing `center`'s own bucket. Bucket-grained:
    /// callers needing an exact circular cutoff re-check true positions
    /// against the returned candidate set.
    #[must_use]
    pub fn query_radius(&self, center: Position, radius: f64) -> Vec<Uuid> {
        let (cx, cy) = self.bucket_key(center);
        let bucket_radius = (radius / self.cell_size).ceil() as i64;

        let mut found = Vec::new();
        for dx in -bucket_radius..=bucket_radius {
            for dy in -bucket_radius..=bucket_radius {
                if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy)) {
                    found.extend(bucket.iter().copied());
                }
            }
        }
        found
    }

    /// Full rebuild from authoritative positions, correcting any drift
    /// accumulated through incremental updates.
    pub fn rebuild(&mut self, organisms: impl Iterator<Item = (Uuid, Position)>) {
        self.buckets.clear();
        self.locations.clear();
        for (id, position) in organisms {
            self.add(id, position);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f64, y: f64) -> Position {
        Position { x, y }
    }

    #[test]
    fn add_and_query_same_bucket() {
        let mut grid = SpatialGrid::new(50.0);
        let id = Uuid::new_v4();
        grid.add(id, pos(10.0, 10.0));
        let found = grid.query_radius(pos(10.0, 10.0), 0.0);
        assert!(found.contains(&id));
    }

    #[test]
    fn query_finds_nearby_bucket() {
        let mut grid = SpatialGrid::new(50.0);
        let id = Uuid::new_v4();
        grid.add(id, pos(60.0, 10.0));
        let found = grid.query_radius(pos(10.0, 10.0), 80.0);
        assert!(found.contains(&id));
    }

    #[test]
    fn remove_drops_the_organism() {
        let mut grid = SpatialGrid::new(50.0);
        let id = Uuid::new_v4();
        grid.add(id, pos(10.0, 10.0));
        grid.remove(id);
        assert!(grid.is_empty());
        assert!(!grid.query_radius(pos(10.0, 10.0), 100.0).contains(&id));
    }

    #[test]
    fn update_position_is_noop_within_same_bucket() {
        let mut grid = SpatialGrid::new(50.0);
        let id = Uuid::new_v4();
        grid.add(id, pos(5.0, 5.0));
        grid.update_position(id, pos(6.0, 7.0));
        assert_eq!(grid.len(), 1);
        assert!(grid.query_radius(pos(0.0, 0.0), 20.0).contains(&id));
    }

    #[test]
    fn update_position_moves_across_buckets() {
        let mut grid = SpatialGrid::new(50.0);
        let id = Uuid::new_v4();
        grid.add(id, pos(5.0, 5.0));
        grid.update_position(id, pos(500.0, 500.0));
        assert!(!grid.query_radius(pos(5.0, 5.0), 10.0).contains(&id));
        assert!(grid.query_radius(pos(500.0, 500.0), 10.0).contains(&id));
    }

    #[test]
    fn rebuild_corrects_drift() {
        let mut grid = SpatialGrid::new(50.0);
        let id = Uuid::new_v4();
        grid.add(id, pos(5.0, 5.0));
        grid.rebuild(std::iter::once((id, pos(500.0, 500.0))));
        assert!(grid.query_radius(pos(500.0, 500.0), 10.0).contains(&id));
        assert!(!grid.query_radius(pos(5.0, 5.0), 10.0).contains(&id));
    }
}
