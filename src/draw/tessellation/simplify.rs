//! Ring simplification
//!
//! This module provides the Douglas-Peucker algorithm used to thin source
//! geometry before it is shipped to the client. Tolerance is in the units of
//! the input coordinates (degrees for geographic rings); 0.005°-0.01° (about
//! 500 m to 1 km) keeps prefecture outlines recognizable.

use crate::draw::geometry::{PolygonRings, Ring};

/// Douglas-Peucker polyline simplification
/// Reduces number of points while keeping every dropped point within `tolerance`
pub fn douglas_peucker(points: &[[f64; 2]], tolerance: f64) -> Vec<[f64; 2]> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];
    let mut dmax = 0.0;
    let mut index = 0;

    // Find the point with maximum distance from the chord
    for (i, &p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = point_segment_distance(p, first, last);
        if d > dmax {
            dmax = d;
            index = i;
        }
    }

    if dmax > tolerance {
        let mut left = douglas_peucker(&points[0..=index], tolerance);
        let right = douglas_peucker(&points[index..], tolerance);
        left.pop(); // Remove duplicate point
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Distance from `p` to the segment a-b (projection clamped to the segment)
pub fn point_segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return (p[0] - a[0]).hypot(p[1] - a[1]);
    }

    let t = (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len_sq).clamp(0.0, 1.0);

    let proj_x = a[0] + t * dx;
    let proj_y = a[1] + t * dy;

    (p[0] - proj_x).hypot(p[1] - proj_y)
}

/// Simplify one polygon ring and keep it closed
pub fn simplify_ring(points: &[[f64; 2]], tolerance: f64) -> Ring {
    let mut simplified = douglas_peucker(points, tolerance);

    if let (Some(&first), Some(&last)) = (simplified.first(), simplified.last()) {
        if first != last {
            simplified.push(first);
        }
    }

    simplified
}

/// Simplify every ring (exterior and holes) of a polygon
pub fn simplify_polygon(rings: &[Ring], tolerance: f64) -> PolygonRings {
    rings
        .iter()
        .map(|ring| simplify_ring(ring, tolerance))
        .collect()
}
