//! Tessellation module for map geometry
//!
//! This module provides the geometric preprocessing that turns polygon rings
//! into GPU-ready triangles.
//!
//! # Submodules
//! - `simplify` - Douglas-Peucker ring simplification
//! - `polygon` - Polygon triangulation using earcut

mod simplify;
mod polygon;

pub use simplify::{
    douglas_peucker,
    point_segment_distance,
    simplify_ring,
    simplify_polygon,
};

pub use polygon::{
    Triangulation,
    triangulate_polygon,
};
