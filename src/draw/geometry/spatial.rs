//! Spatial indexing for hit-testing map features
//!
//! This module provides an R-tree over world polygon bounding boxes. The tree
//! only narrows the search: callers confirm every candidate with an exact
//! point-in-polygon test.

use rstar::{Envelope, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use super::types::{BBoxItem, Ring};

impl RTreeObject for BBoxItem {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

impl rstar::PointDistance for BBoxItem {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }
}

/// Bulk-loaded R-tree keyed by world polygon bounds
///
/// Rebuilt from scratch on every geometry rebuild; there is no incremental
/// insert or delete.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<BBoxItem>,
}

impl SpatialIndex {
    pub fn bulk_load(items: Vec<BBoxItem>) -> Self {
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    /// Indices of every bbox whose extent contains `point`, ascending
    pub fn search(&self, point: [f64; 2]) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_all_at_point(&point)
            .map(|item| item.index)
            .collect();
        hits.sort_unstable();
        hits
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// How rings of a world polygon combine during hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTestMode {
    /// Inside any single ring counts as a hit; holes are treated as solid
    #[default]
    AnyRing,
    /// Crossing parity over all rings together, so holes are excluded
    EvenOdd,
}

/// Count edge crossings of a horizontal ray cast east from `point`
fn crossings(point: [f64; 2], ring: &[[f64; 2]]) -> usize {
    let n = ring.len();
    if n < 3 {
        return 0;
    }
    let [px, py] = point;
    let mut count = 0;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            count += 1;
        }
        j = i;
    }
    count
}

/// Crossing-number point-in-ring test (even-odd rule)
pub fn point_in_ring(point: [f64; 2], ring: &[[f64; 2]]) -> bool {
    crossings(point, ring) % 2 == 1
}

/// Exact containment test of `point` against a world polygon's rings
pub fn polygon_contains(mode: HitTestMode, point: [f64; 2], rings: &[Ring]) -> bool {
    match mode {
        HitTestMode::AnyRing => rings.iter().any(|ring| point_in_ring(point, ring)),
        HitTestMode::EvenOdd => {
            let total: usize = rings.iter().map(|ring| crossings(point, ring)).sum();
            total % 2 == 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        vec![[min, min], [min, max], [max, max], [max, min], [min, min]]
    }

    fn item(rings: &[Ring], index: usize) -> BBoxItem {
        BBoxItem::from_rings(rings, index).unwrap()
    }

    #[test]
    fn test_search_returns_containing_boxes() {
        let a = vec![square(0.0, 0.4)];
        let b = vec![square(0.3, 0.8)];
        let index = SpatialIndex::bulk_load(vec![item(&a, 0), item(&b, 1)]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.search([0.1, 0.1]), vec![0]);
        assert_eq!(index.search([0.35, 0.35]), vec![0, 1]);
        assert_eq!(index.search([0.9, 0.9]), Vec::<usize>::new());
    }

    #[test]
    fn test_search_includes_box_boundary() {
        let a = vec![square(0.2, 0.4)];
        let index = SpatialIndex::bulk_load(vec![item(&a, 0)]);
        assert_eq!(index.search([0.2, 0.3]), vec![0]);
        assert_eq!(index.search([0.4, 0.4]), vec![0]);
    }

    #[test]
    fn test_point_in_ring_even_odd() {
        let ring = square(0.0, 1.0);
        assert!(point_in_ring([0.5, 0.5], &ring));
        assert!(!point_in_ring([1.5, 0.5], &ring));
        assert!(!point_in_ring([0.5, 0.5], &ring[..2]));

        // Concave "U": the notch is outside
        let u = vec![
            [0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [2.0, 3.0],
            [2.0, 1.0], [1.0, 1.0], [1.0, 3.0], [0.0, 3.0], [0.0, 0.0],
        ];
        assert!(point_in_ring([0.5, 2.0], &u));
        assert!(!point_in_ring([1.5, 2.0], &u));
    }

    #[test]
    fn test_hole_handling_per_mode() {
        let rings = vec![square(0.0, 1.0), square(0.4, 0.6)];
        let in_hole = [0.5, 0.5];
        let in_body = [0.1, 0.1];

        assert!(polygon_contains(HitTestMode::AnyRing, in_hole, &rings));
        assert!(!polygon_contains(HitTestMode::EvenOdd, in_hole, &rings));
        assert!(polygon_contains(HitTestMode::EvenOdd, in_body, &rings));
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::default();
        assert!(index.is_empty());
        assert!(index.search([0.5, 0.5]).is_empty());
    }
}
