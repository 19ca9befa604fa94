//! Geometry module for the travel map
//!
//! This module provides the data model shared by the builder, the spatial
//! index and the render backend.
//!
//! # Submodules
//! - `types` - Features, world polygons and bounding boxes
//! - `spatial` - R-tree index and exact point-in-polygon tests
//! - `buffers` - Flat vertex buffers and the camera uniform block

mod types;
mod spatial;
mod buffers;

pub use types::{
    Ring,
    PolygonRings,
    FeatureGeometry,
    Feature,
    WorldPolygon,
    BBoxItem,
};

pub use spatial::{
    SpatialIndex,
    HitTestMode,
    point_in_ring,
    polygon_contains,
};

pub use buffers::{
    serialize_f32_vec_base64,
    MapBuffers,
    CameraUniform,
    BUFFER_FRAME_MAGIC,
    UNIFORM_BLOCK_SIZE,
};
