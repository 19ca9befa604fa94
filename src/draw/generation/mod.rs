//! Geometry generation module for the travel map
//!
//! This module converts source features into GPU-ready buffers plus the world
//! polygons and bounding boxes used for hit-testing. The whole set is rebuilt
//! on every feature change; there is no incremental update.
//!
//! # Submodules
//! - `polygons` - Per-feature projection, triangulation and border lines
//! - `colors` - Progress to fill color mapping

mod polygons;
mod colors;

use crate::draw::geometry::*;
use rayon::prelude::*;

pub use polygons::{generate_feature_mesh, FeatureMesh};
pub use colors::{progress_to_color, DEFAULT_BORDER_COLOR, DEFAULT_CLEAR_COLOR, NEUTRAL_FILL};

/// Everything derived from one feature set
///
/// `world_polygons[i]`, `bboxes[i]` and `buffers.fill_ranges[i]` all describe
/// the same feature, `features[world_polygons[i].feature_index]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapGeometry {
    pub buffers: MapBuffers,
    pub world_polygons: Vec<WorldPolygon>,
    pub bboxes: Vec<BBoxItem>,
}

impl MapGeometry {
    /// Bulk-load a spatial index over the bounding boxes
    pub fn index(&self) -> SpatialIndex {
        SpatialIndex::bulk_load(self.bboxes.clone())
    }

    /// World polygon indices that exactly contain `point` (world units), ascending
    pub fn hits(&self, index: &SpatialIndex, mode: HitTestMode, point: [f64; 2]) -> Vec<usize> {
        index
            .search(point)
            .into_iter()
            .filter(|&i| {
                self.world_polygons
                    .get(i)
                    .is_some_and(|wp| polygon_contains(mode, point, &wp.rings))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.world_polygons.is_empty()
    }
}

/// Build fill and line buffers, world polygons and bounding boxes for `features`
///
/// Features are meshed in parallel and combined sequentially in input order, so
/// the output is deterministic. Features with no usable ring are skipped and
/// the remaining entries keep their `feature_index`.
pub fn build_geometry(features: &[Feature], border_color: [f32; 4]) -> MapGeometry {
    let start = std::time::Instant::now();

    let meshes: Vec<Option<FeatureMesh>> = features
        .par_iter()
        .map(generate_feature_mesh)
        .collect();

    let mut geometry = MapGeometry::default();
    let mut skipped = 0usize;

    // Combine results sequentially
    for (feature_index, mesh) in meshes.into_iter().enumerate() {
        let Some(mesh) = mesh else {
            skipped += 1;
            continue;
        };
        let feature = &features[feature_index];
        let index = geometry.world_polygons.len();

        let Some(bbox) = BBoxItem::from_rings(&mesh.rings, index) else {
            skipped += 1;
            continue;
        };

        let buffers = &mut geometry.buffers;
        let first_vertex = buffers.fill_vertex_count() as u32;
        let fill_count = mesh.fill_vertex_count();
        let fill_color = progress_to_color(feature.progress);

        buffers.fill_positions.extend_from_slice(&mesh.fill_positions);
        for _ in 0..fill_count {
            buffers.fill_colors.extend_from_slice(&fill_color);
        }
        buffers.fill_ranges.push((first_vertex, fill_count as u32));

        buffers.line_positions.extend_from_slice(&mesh.line_positions);
        for _ in 0..mesh.line_vertex_count() {
            buffers.line_colors.extend_from_slice(&border_color);
        }

        geometry.world_polygons.push(WorldPolygon {
            id: feature.id,
            feature_index,
            rings: mesh.rings,
        });
        geometry.bboxes.push(bbox);
    }

    if skipped > 0 {
        log::debug!("Skipped {} features without usable rings", skipped);
    }
    log::debug!(
        "Built geometry for {} features: {} fill vertices, {} line vertices in {:.2}ms",
        geometry.world_polygons.len(),
        geometry.buffers.fill_vertex_count(),
        geometry.buffers.line_vertex_count(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::projection::to_world;

    fn square(min: f64, max: f64) -> Ring {
        vec![[min, min], [min, max], [max, max], [max, min], [min, min]]
    }

    #[test]
    fn test_index_parity_with_skipped_feature() {
        let features = vec![
            Feature::polygon(10, Some(0.0), vec![square(0.0, 1.0)]),
            Feature::polygon(11, Some(0.5), vec![vec![[3.0, 3.0]]]),
            Feature::polygon(12, Some(1.0), vec![square(5.0, 6.0)]),
        ];
        let geometry = build_geometry(&features, DEFAULT_BORDER_COLOR);

        assert_eq!(geometry.world_polygons.len(), 2);
        assert_eq!(geometry.bboxes.len(), 2);
        assert_eq!(geometry.buffers.fill_ranges, vec![(0, 6), (6, 6)]);

        let second = &geometry.world_polygons[1];
        assert_eq!(second.id, 12);
        assert_eq!(second.feature_index, 2);
        assert_eq!(geometry.bboxes[1].index, 1);

        // Colors of the second range come from feature 12
        let green = progress_to_color(Some(1.0));
        let (first, count) = geometry.buffers.fill_ranges[1];
        for v in first..first + count {
            let c = &geometry.buffers.fill_colors[v as usize * 4..v as usize * 4 + 4];
            assert_eq!(c, green);
        }
    }

    #[test]
    fn test_line_colors_ignore_progress() {
        let features = vec![Feature::polygon(1, Some(0.7), vec![square(0.0, 1.0)])];
        let geometry = build_geometry(&features, DEFAULT_BORDER_COLOR);
        assert_eq!(geometry.buffers.line_vertex_count(), 8);
        assert!(geometry
            .buffers
            .line_colors
            .chunks_exact(4)
            .all(|c| c == DEFAULT_BORDER_COLOR));
    }

    #[test]
    fn test_hits_are_exact() {
        // Triangle whose bbox covers more than the triangle itself
        let triangle = vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [0.0, 0.0]];
        let features = vec![Feature::polygon(7, None, vec![triangle])];
        let geometry = build_geometry(&features, DEFAULT_BORDER_COLOR);
        let index = geometry.index();

        let inside = to_world(2.0, 2.0);
        let outside_but_in_bbox = to_world(8.0, 8.0);
        assert_eq!(geometry.hits(&index, HitTestMode::AnyRing, inside), vec![0]);
        assert!(geometry
            .hits(&index, HitTestMode::AnyRing, outside_but_in_bbox)
            .is_empty());
        assert_eq!(index.search(outside_but_in_bbox), vec![0]);
    }

    #[test]
    fn test_empty_input() {
        let geometry = build_geometry(&[], DEFAULT_BORDER_COLOR);
        assert!(geometry.is_empty());
        assert!(geometry.buffers.is_empty());
        assert!(geometry.index().is_empty());
    }
}
