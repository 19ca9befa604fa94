//! Core geometry types for the travel map
//!
//! Source features carry geographic rings ([longitude, latitude] in degrees).
//! Everything derived from them (world polygons, bounding boxes) is in world
//! units, see `draw::projection`. The two never mix.

use serde::{Deserialize, Serialize};

/// A ring of [x, y] pairs; geographic or world depending on context
pub type Ring = Vec<[f64; 2]>;

/// Exterior ring first, then holes
pub type PolygonRings = Vec<Ring>;

/// Polygonal geometry of a feature
///
/// Only the two polygonal GeoJSON types are representable. Anything else is
/// filtered out when features are ingested, so downstream code matches on
/// these two variants and never re-checks a type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum FeatureGeometry {
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
}

impl FeatureGeometry {
    /// Iterate the polygons of this geometry (one for `Polygon`)
    pub fn polygons(&self) -> impl Iterator<Item = &PolygonRings> {
        let slice: &[PolygonRings] = match self {
            FeatureGeometry::Polygon(rings) => std::slice::from_ref(rings),
            FeatureGeometry::MultiPolygon(polygons) => polygons,
        };
        slice.iter()
    }

    /// Total number of coordinates across all rings
    pub fn coordinate_count(&self) -> usize {
        self.polygons()
            .flat_map(|polygon| polygon.iter())
            .map(|ring| ring.len())
            .sum()
    }
}

/// A prefecture (or any region) to draw and hit-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    /// visited / total in [0, 1]; only used to pick the fill color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    pub geometry: FeatureGeometry,
}

impl Feature {
    pub fn polygon(id: i64, progress: Option<f64>, rings: PolygonRings) -> Self {
        Self {
            id,
            progress,
            geometry: FeatureGeometry::Polygon(rings),
        }
    }

    pub fn multi_polygon(id: i64, progress: Option<f64>, polygons: Vec<PolygonRings>) -> Self {
        Self {
            id,
            progress,
            geometry: FeatureGeometry::MultiPolygon(polygons),
        }
    }
}

/// Hit-testable world-space outline of one source feature
///
/// Rings of every sub-polygon of a MultiPolygon are accumulated here, so a
/// feature is always exactly one hit-test entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldPolygon {
    pub id: i64,
    /// Position of the source feature in the input slice
    pub feature_index: usize,
    pub rings: Vec<Ring>,
}

/// Axis-aligned bounds of a world polygon, keyed by its position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBoxItem {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// Position in the world polygon list
    pub index: usize,
}

impl BBoxItem {
    /// Bounds of all ring points, or None when there are no points
    pub fn from_rings(rings: &[Ring], index: usize) -> Option<Self> {
        let mut points = rings.iter().flat_map(|ring| ring.iter());
        let first = points.next()?;
        let mut bbox = BBoxItem {
            min_x: first[0],
            min_y: first[1],
            max_x: first[0],
            max_y: first[1],
            index,
        };
        for p in points {
            bbox.min_x = bbox.min_x.min(p[0]);
            bbox.min_y = bbox.min_y.min(p[1]);
            bbox.max_x = bbox.max_x.max(p[0]);
            bbox.max_y = bbox.max_y.max(p[1]);
        }
        Some(bbox)
    }

    pub fn contains(&self, point: [f64; 2]) -> bool {
        point[0] >= self.min_x
            && point[0] <= self.max_x
            && point[1] >= self.min_y
            && point[1] <= self.max_y
    }
}
