//! Broadphase pair finding over world-space bounding boxes.
//!
//! Both strategies return the same set: every index pair `(i, j)` with
//! `i < j` whose boxes overlap, in ascending order.

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use super::collider::Aabb;

type CellKey = (i32, i32);

/// Which broadphase strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadphaseKind {
    /// Test every pair. Fine for small scenes.
    #[default]
    BruteForce,
    /// Uniform grid sized from the largest box.
    SpatialHash,
}

/// Broadphase state. The spatial hash keeps its cell storage between frames.
#[derive(Debug)]
pub enum Broadphase {
    BruteForce,
    SpatialHash(SpatialHashGrid),
}

impl Broadphase {
    pub fn new(kind: BroadphaseKind) -> Self {
        match kind {
            BroadphaseKind::BruteForce => Self::BruteForce,
            BroadphaseKind::SpatialHash => Self::SpatialHash(SpatialHashGrid::new()),
        }
    }

    pub fn kind(&self) -> BroadphaseKind {
        match self {
            Self::BruteForce => BroadphaseKind::BruteForce,
            Self::SpatialHash(_) => BroadphaseKind::SpatialHash,
        }
    }

    /// Find all index pairs whose boxes overlap.
    pub fn find_pairs(&mut self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        match self {
            Self::BruteForce => brute_force_pairs(bounds),
            Self::SpatialHash(grid) => grid.find_pairs(bounds),
        }
    }
}

/// O(n^2) pairwise test.
pub fn brute_force_pairs(bounds: &[Aabb]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..bounds.len() {
        for j in (i + 1)..bounds.len() {
            if bounds[i].overlaps(&bounds[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Spatial hash grid broadphase for O(n) average-case pair detection.
#[derive(Debug)]
pub struct SpatialHashGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl Default for SpatialHashGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialHashGrid {
    pub fn new() -> Self {
        Self {
            cell_size: 2.0,
            cells: HashMap::new(),
        }
    }

    /// Cell size chosen by the last call to [`find_pairs`](Self::find_pairs).
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    fn cell_coords(&self, point: Vec2) -> CellKey {
        let inv = 1.0 / self.cell_size;
        ((point.x * inv).floor() as i32, (point.y * inv).floor() as i32)
    }

    pub fn find_pairs(&mut self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        self.cells.clear();

        let max_extent = bounds
            .iter()
            .map(|b| b.size.max_element())
            .filter(|e| e.is_finite())
            .fold(0.0_f32, f32::max);

        // Set cell size to 2x the max box extent (minimum 1.0)
        self.cell_size = (max_extent * 2.0).max(1.0);

        // Boxes without finite bounds cannot be binned; they are tested against everything.
        let mut unbounded = Vec::new();
        for (index, aabb) in bounds.iter().enumerate() {
            if !(aabb.min().is_finite() && aabb.max().is_finite()) {
                unbounded.push(index);
                continue;
            }
            let min_cell = self.cell_coords(aabb.min());
            let max_cell = self.cell_coords(aabb.max());
            for cx in min_cell.0..=max_cell.0 {
                for cy in min_cell.1..=max_cell.1 {
                    self.cells.entry((cx, cy)).or_default().push(index);
                }
            }
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(bounds.len() * 4);

        for cell in self.cells.values() {
            for i in 0..cell.len() {
                for j in (i + 1)..cell.len() {
                    let (a, b) = (cell[i], cell[j]);
                    // Canonical ordering to avoid duplicates
                    let pair = if a < b { (a, b) } else { (b, a) };
                    if seen.contains(&pair) {
                        continue;
                    }
                    if bounds[a].overlaps(&bounds[b]) {
                        seen.insert(pair);
                        pairs.push(pair);
                    }
                }
            }
        }

        for &a in &unbounded {
            for b in 0..bounds.len() {
                let pair = if a < b { (a, b) } else { (b, a) };
                if a == b || seen.contains(&pair) {
                    continue;
                }
                if bounds[a].overlaps(&bounds[b]) {
                    seen.insert(pair);
                    pairs.push(pair);
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::ONE)
    }

    #[test]
    fn test_broadphase_overlapping() {
        let bounds = [unit_at(0.0, 0.0), unit_at(0.5, 0.5)];
        for kind in [BroadphaseKind::BruteForce, BroadphaseKind::SpatialHash] {
            let pairs = Broadphase::new(kind).find_pairs(&bounds);
            assert_eq!(pairs, vec![(0, 1)]);
        }
    }

    #[test]
    fn test_broadphase_no_overlap() {
        let bounds = [unit_at(0.0, 0.0), unit_at(10.0, 0.0)];
        let mut grid = SpatialHashGrid::new();
        assert!(grid.find_pairs(&bounds).is_empty());
        assert!(brute_force_pairs(&bounds).is_empty());
    }

    #[test]
    fn test_spatial_hash_matches_brute_force() {
        let mut bounds = Vec::new();
        for i in 0..12 {
            for j in 0..6 {
                let x = i as f32 * 0.8 + (j % 2) as f32 * 0.3;
                let y = j as f32 * 0.9;
                bounds.push(Aabb::new(Vec2::new(x, y), Vec2::new(1.0, 0.5 + 0.1 * j as f32)));
            }
        }
        // One large box spanning many cells.
        bounds.push(Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(12.0, 1.2)));

        let expected = brute_force_pairs(&bounds);
        let mut grid = SpatialHashGrid::new();
        assert_eq!(grid.find_pairs(&bounds), expected);
        assert!(grid.cell_size() >= 24.0);
    }

    #[test]
    fn test_unbounded_boxes_skip_the_grid() {
        let bounds = [
            Aabb::new(Vec2::ZERO, Vec2::new(f32::INFINITY, 1.0)),
            unit_at(5.0, 0.0),
            unit_at(-3.0, 0.0),
            unit_at(2.0, 5.0),
            Aabb::new(Vec2::new(f32::NAN, 0.0), Vec2::ONE),
        ];
        let mut grid = SpatialHashGrid::new();
        let pairs = grid.find_pairs(&bounds);
        assert_eq!(pairs, vec![(0, 1)]);
        assert_eq!(pairs, brute_force_pairs(&bounds));
        assert_eq!(grid.cell_size(), 2.0);
    }

    #[test]
    fn test_negative_coordinates() {
        let bounds = [unit_at(-3.2, -7.5), unit_at(-2.9, -7.1), unit_at(4.0, 4.0)];
        let mut grid = SpatialHashGrid::new();
        assert_eq!(grid.find_pairs(&bounds), vec![(0, 1)]);
    }
}
