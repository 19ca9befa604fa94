//! Per-feature mesh generation
//!
//! Projects a feature's rings into world units, triangulates each polygon with
//! earcut and emits border segments. Every raw coordinate is projected exactly
//! once; triangulation, bounds and lines all read the projected copy.

use crate::draw::geometry::{Feature, Ring};
use crate::draw::projection::to_world;
use crate::draw::tessellation::triangulate_polygon;

/// World-space output for one feature, before colors are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMesh {
    /// Projected rings of every polygon of the feature, in source order
    pub rings: Vec<Ring>,
    /// Triangle list, x/y per vertex
    pub fill_positions: Vec<f32>,
    /// Line list, x/y per vertex
    pub line_positions: Vec<f32>,
}

impl FeatureMesh {
    pub fn fill_vertex_count(&self) -> usize {
        self.fill_positions.len() / 2
    }

    pub fn line_vertex_count(&self) -> usize {
        self.line_positions.len() / 2
    }
}

fn project_ring(ring: &[[f64; 2]]) -> Ring {
    ring.iter().map(|p| to_world(p[0], p[1])).collect()
}

/// Build the mesh of one feature
///
/// Rings with fewer than two points are dropped. Returns None when nothing
/// usable is left, in which case the feature contributes no output at all.
pub fn generate_feature_mesh(feature: &Feature) -> Option<FeatureMesh> {
    let mut mesh = FeatureMesh::default();

    for polygon in feature.geometry.polygons() {
        let world_rings: Vec<Ring> = polygon
            .iter()
            .filter(|ring| ring.len() >= 2)
            .map(|ring| project_ring(ring))
            .collect();
        if world_rings.is_empty() {
            continue;
        }

        // Fill: one vertex per triangle corner
        let tri = triangulate_polygon(&world_rings);
        mesh.fill_positions.reserve(tri.indices.len() * 2);
        for &i in &tri.indices {
            let p = tri.point(i);
            mesh.fill_positions.push(p[0] as f32);
            mesh.fill_positions.push(p[1] as f32);
        }

        // Borders: consecutive pairs, the closing duplicate ends the last segment
        for ring in &world_rings {
            for pair in ring.windows(2) {
                mesh.line_positions.push(pair[0][0] as f32);
                mesh.line_positions.push(pair[0][1] as f32);
                mesh.line_positions.push(pair[1][0] as f32);
                mesh.line_positions.push(pair[1][1] as f32);
            }
        }

        mesh.rings.extend(world_rings);
    }

    if mesh.rings.is_empty() {
        None
    } else {
        Some(mesh)
    }
}
