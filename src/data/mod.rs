//! Source data preparation
//!
//! Everything that happens to prefecture GeoJSON before it reaches the
//! engine: simplification, property trimming, progress joins and the compact
//! transfer encoding.
//!
//! # Submodules
//! - `geojson` - Reading, simplifying, minifying and ingesting GeoJSON
//! - `progress` - Visit progress records and the merge into features
//! - `compression` - Flattened exterior-ring wire format

pub mod geojson;
pub mod progress;
pub mod compression;

pub use self::geojson::{
    read_collection,
    collection_from_geojson,
    geometry_from_value,
    feature_id,
    feature_from_geojson,
    features_from_collection,
    simplify_value,
    simplify_collection,
    minify_properties,
    DEFAULT_SIMPLIFY_TOLERANCE,
    OPTIMIZE_TOLERANCE,
    MINIFIED_PROPERTIES,
};

pub use progress::{
    PrefectureProgress,
    ProgressTable,
    merge_progress,
};

pub use compression::{
    CompressionError,
    CompressedKind,
    CompressedGeometry,
    CompressedFeature,
    compress_features,
    decompress_features,
};
