//! Travel progress map
//!
//! Draws prefecture polygons colored by visit progress on a Web Mercator
//! map with pan, cursor-anchored zoom and exact point-in-polygon picking.
//!
//! - `draw` - Projection, simplification, triangulation and buffer building
//! - `data` - GeoJSON preparation and progress joins
//! - `engine` - Camera, input handling and the render backend lifecycle
//! - `server` - JSON-RPC host used by the `map_server` binary

pub mod draw;
pub mod data;
pub mod engine;
pub mod server;

pub use draw::geometry::{Feature, FeatureGeometry, MapBuffers};
pub use engine::{MapConfig, MapEngine, MapEvent, RenderBackend, ViewState, Viewport};
