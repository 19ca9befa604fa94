//! Polygon tessellation using earcut algorithm
//!
//! This module provides triangulation of filled polygons with optional holes,
//! suitable for GPU rendering. Input rings are already in world units.

use crate::draw::geometry::Ring;

/// Result of triangulating one polygon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    /// Interleaved x, y of every ring point fed to earcut
    pub coords: Vec<f64>,
    /// Three indices into `coords` (point index, not float index) per triangle
    pub indices: Vec<usize>,
}

impl Triangulation {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position of the i-th point
    pub fn point(&self, i: usize) -> [f64; 2] {
        [self.coords[i * 2], self.coords[i * 2 + 1]]
    }
}

/// Ring without its closing duplicate
fn open_ring(ring: &[[f64; 2]]) -> &[[f64; 2]] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Tessellate a filled polygon using earcut triangulation
/// Exterior ring first, then holes. Degenerate holes are skipped; a degenerate
/// exterior ring yields an empty triangulation.
pub fn triangulate_polygon(rings: &[Ring]) -> Triangulation {
    let Some(exterior) = rings.first().map(|r| open_ring(r)) else {
        return Triangulation::default();
    };
    if exterior.len() < 3 {
        return Triangulation::default();
    }

    // Build flat coordinate array for earcut
    let mut flat_coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    // Add outer ring
    for p in exterior {
        flat_coords.push(p[0]);
        flat_coords.push(p[1]);
    }

    // Add holes
    for hole in &rings[1..] {
        let hole = open_ring(hole);
        if hole.len() < 3 {
            continue; // Skip degenerate holes
        }
        hole_indices.push(flat_coords.len() / 2);
        for p in hole {
            flat_coords.push(p[0]);
            flat_coords.push(p[1]);
        }
    }

    let indices = match earcutr::earcut(&flat_coords, &hole_indices, 2) {
        Ok(indices) => indices,
        Err(e) => {
            log::warn!("earcut failed on polygon with {} points: {:?}", flat_coords.len() / 2, e);
            Vec::new()
        }
    };

    Triangulation {
        coords: flat_coords,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(points: &[[f64; 2]]) -> Ring {
        let mut ring = points.to_vec();
        ring.push(points[0]);
        ring
    }

    #[test]
    fn test_square_makes_two_triangles() {
        let ring = closed(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        let tri = triangulate_polygon(&[ring]);
        assert_eq!(tri.triangle_count(), 2);
        assert_eq!(tri.coords.len(), 8); // closing duplicate stripped
        assert!(tri.indices.iter().all(|&i| i < 4));
    }

    #[test]
    fn test_square_with_hole() {
        let outer = closed(&[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
        let hole = closed(&[[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]]);
        let tri = triangulate_polygon(&[outer, hole]);
        assert_eq!(tri.triangle_count(), 8);

        // Total triangle area equals outer minus hole
        let area: f64 = tri
            .indices
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (tri.point(t[0]), tri.point(t[1]), tri.point(t[2]));
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
            })
            .sum();
        assert!((area - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_rings() {
        assert_eq!(triangulate_polygon(&[]).triangle_count(), 0);
        let line = vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        assert_eq!(triangulate_polygon(&[line]).triangle_count(), 0);

        let outer = closed(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let tiny_hole = vec![[0.5, 0.5], [0.5, 0.5]];
        let tri = triangulate_polygon(&[outer, tiny_hole]);
        assert_eq!(tri.triangle_count(), 2);
    }
}
