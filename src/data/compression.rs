//! Compact wire form for prefecture features
//!
//! Coordinates are flattened into one `[x0, y0, x1, y1, ...]` array with ring
//! boundary indices (in points) alongside. Only exterior rings are kept, which
//! is all the overview map needs.

use geojson::{Geometry, JsonObject, JsonValue, Value};
use serde::{Deserialize, Serialize};

use super::geojson::{property_f64, property_i64, property_str};

/// Errors that can occur while packing or unpacking features.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CompressionError {
    #[error("feature {index} has no geometry")]
    MissingGeometry { index: usize },

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("odd number of coordinates ({0})")]
    OddCoordinates(usize),

    #[error("ring boundaries {indices:?} do not fit {points} points")]
    InvalidIndices { indices: Vec<usize>, points: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressedKind {
    Polygon,
    MultiPolygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedGeometry {
    #[serde(rename = "type")]
    pub kind: CompressedKind,
    /// Flattened x/y pairs of every exterior ring
    pub coordinates: Vec<f64>,
    /// Point offsets where each ring starts, plus the final end offset
    pub indices: Vec<usize>,
}

impl CompressedGeometry {
    pub fn point_count(&self) -> usize {
        self.coordinates.len() / 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedFeature {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub visited: u32,
    pub total: u32,
    pub progress: f64,
    pub geometry: CompressedGeometry,
}

fn flatten_ring(ring: Option<&Vec<Vec<f64>>>, out: &mut Vec<f64>) {
    for p in ring.into_iter().flatten().filter(|p| p.len() >= 2) {
        out.push(p[0]);
        out.push(p[1]);
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn compress_geometry(value: &Value) -> Result<CompressedGeometry, CompressionError> {
    match value {
        Value::Polygon(rings) => {
            let mut coordinates = Vec::new();
            flatten_ring(rings.first(), &mut coordinates);
            let end = coordinates.len() / 2;
            Ok(CompressedGeometry {
                kind: CompressedKind::Polygon,
                coordinates,
                indices: vec![0, end],
            })
        }
        Value::MultiPolygon(polygons) => {
            let mut coordinates = Vec::new();
            let mut indices = vec![0];
            for polygon in polygons {
                flatten_ring(polygon.first(), &mut coordinates);
                indices.push(coordinates.len() / 2);
            }
            Ok(CompressedGeometry {
                kind: CompressedKind::MultiPolygon,
                coordinates,
                indices,
            })
        }
        other => Err(CompressionError::UnsupportedGeometry(type_name(other).to_string())),
    }
}

fn count(properties: Option<&JsonObject>, key: &str) -> u32 {
    property_i64(properties, key)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Pack GeoJSON features; fails on the first non-polygonal feature
pub fn compress_features(
    features: &[geojson::Feature],
) -> Result<Vec<CompressedFeature>, CompressionError> {
    features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or(CompressionError::MissingGeometry { index })?;
            let properties = feature.properties.as_ref();
            Ok(CompressedFeature {
                id: property_i64(properties, "id").unwrap_or(0),
                name: property_str(properties, "nam_ja").map(str::to_string),
                visited: count(properties, "visited"),
                total: count(properties, "total"),
                progress: property_f64(properties, "progress").unwrap_or(0.0),
                geometry: compress_geometry(&geometry.value)?,
            })
        })
        .collect()
}

fn points(coordinates: &[f64]) -> Vec<Vec<f64>> {
    coordinates.chunks_exact(2).map(|c| vec![c[0], c[1]]).collect()
}

fn decompress_geometry(compressed: &CompressedGeometry) -> Result<Value, CompressionError> {
    if compressed.coordinates.len() % 2 != 0 {
        return Err(CompressionError::OddCoordinates(compressed.coordinates.len()));
    }

    match compressed.kind {
        CompressedKind::Polygon => Ok(Value::Polygon(vec![points(&compressed.coordinates)])),
        CompressedKind::MultiPolygon => {
            let n = compressed.point_count();
            let invalid = || CompressionError::InvalidIndices {
                indices: compressed.indices.clone(),
                points: n,
            };

            let mut polygons = Vec::with_capacity(compressed.indices.len().saturating_sub(1));
            for bounds in compressed.indices.windows(2) {
                let (start, end) = (bounds[0], bounds[1]);
                if start > end || end > n {
                    return Err(invalid());
                }
                polygons.push(vec![points(&compressed.coordinates[start * 2..end * 2])]);
            }
            Ok(Value::MultiPolygon(polygons))
        }
    }
}

/// Restore GeoJSON features from their packed form
pub fn decompress_features(
    compressed: &[CompressedFeature],
) -> Result<Vec<geojson::Feature>, CompressionError> {
    compressed
        .iter()
        .map(|feature| {
            let mut properties = JsonObject::new();
            properties.insert("id".to_string(), JsonValue::from(feature.id));
            if let Some(name) = &feature.name {
                properties.insert("nam_ja".to_string(), JsonValue::from(name.clone()));
            }
            properties.insert("visited".to_string(), JsonValue::from(feature.visited));
            properties.insert("total".to_string(), JsonValue::from(feature.total));
            properties.insert("progress".to_string(), JsonValue::from(feature.progress));

            Ok(geojson::Feature {
                bbox: None,
                geometry: Some(Geometry::new(decompress_geometry(&feature.geometry)?)),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(value: Value, properties: serde_json::Value) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    fn ring(offset: f64) -> Vec<Vec<f64>> {
        vec![
            vec![offset, offset],
            vec![offset + 1.0, offset],
            vec![offset + 1.0, offset + 1.0],
            vec![offset, offset],
        ]
    }

    #[test]
    fn test_polygon_keeps_exterior_only() {
        let hole = vec![vec![0.2, 0.2], vec![0.4, 0.2], vec![0.4, 0.4], vec![0.2, 0.2]];
        let features = vec![feature(
            Value::Polygon(vec![ring(0.0), hole]),
            serde_json::json!({"id": 13, "nam_ja": "東京都", "visited": 2, "total": 8, "progress": 0.25}),
        )];
        let packed = compress_features(&features).unwrap();

        assert_eq!(packed[0].id, 13);
        assert_eq!(packed[0].name.as_deref(), Some("東京都"));
        assert_eq!((packed[0].visited, packed[0].total), (2, 8));
        assert_eq!(packed[0].geometry.kind, CompressedKind::Polygon);
        assert_eq!(packed[0].geometry.indices, vec![0, 4]);
        assert_eq!(packed[0].geometry.coordinates.len(), 8);

        let restored = decompress_features(&packed).unwrap();
        let geometry = restored[0].geometry.as_ref().unwrap();
        assert_eq!(geometry.value, Value::Polygon(vec![ring(0.0)]));
        let props = restored[0].properties.as_ref().unwrap();
        assert_eq!(props["nam_ja"], "東京都");
        assert_eq!(props["progress"], 0.25);
    }

    #[test]
    fn test_multipolygon_boundaries() {
        let features = vec![feature(
            Value::MultiPolygon(vec![vec![ring(0.0)], vec![ring(5.0)]]),
            serde_json::json!({"id": 47}),
        )];
        let packed = compress_features(&features).unwrap();
        assert_eq!(packed[0].geometry.indices, vec![0, 4, 8]);
        assert_eq!(packed[0].progress, 0.0);

        let restored = decompress_features(&packed).unwrap();
        assert_eq!(
            restored[0].geometry.as_ref().unwrap().value,
            Value::MultiPolygon(vec![vec![ring(0.0)], vec![ring(5.0)]])
        );
    }

    #[test]
    fn test_unsupported_geometry_is_an_error() {
        let features = vec![feature(Value::Point(vec![1.0, 2.0]), serde_json::json!({}))];
        assert_eq!(
            compress_features(&features),
            Err(CompressionError::UnsupportedGeometry("Point".to_string()))
        );

        let mut missing = features[0].clone();
        missing.geometry = None;
        assert_eq!(
            compress_features(&[missing]),
            Err(CompressionError::MissingGeometry { index: 0 })
        );
    }

    #[test]
    fn test_bad_indices_are_rejected() {
        let packed = CompressedFeature {
            id: 1,
            name: None,
            visited: 0,
            total: 0,
            progress: 0.0,
            geometry: CompressedGeometry {
                kind: CompressedKind::MultiPolygon,
                coordinates: vec![0.0, 0.0, 1.0, 1.0],
                indices: vec![0, 3],
            },
        };
        assert!(matches!(
            decompress_features(&[packed]),
            Err(CompressionError::InvalidIndices { points: 2, .. })
        ));
    }
}
