//! Map drawing pipeline
//!
//! Pure geometry: nothing in here touches the camera, the render backend or
//! any I/O.
//!
//! # Submodules
//! - `projection` - Web Mercator geographic <-> world unit conversion
//! - `geometry` - Data model, spatial index, GPU buffer payloads
//! - `tessellation` - Simplification and triangulation
//! - `generation` - Feature set to buffers, world polygons and bounds

pub mod projection;
pub mod geometry;
pub mod tessellation;
pub mod generation;
