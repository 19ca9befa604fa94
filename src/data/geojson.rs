//! GeoJSON preparation and ingestion
//!
//! Offline helpers that shrink a prefecture FeatureCollection (ring
//! simplification, property minification) and the ingestion step that turns
//! GeoJSON features into engine [`Feature`]s. Non-polygonal geometry is
//! dropped here so nothing downstream has to look at a type tag again.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue, Value};
use rayon::prelude::*;

use crate::draw::geometry::{Feature, FeatureGeometry, PolygonRings, Ring};
use crate::draw::tessellation::simplify_ring;

/// Tolerance in degrees when the caller has no preference (about 1 km)
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.01;

/// Tolerance used when preparing the shipped prefecture file (about 500 m)
pub const OPTIMIZE_TOLERANCE: f64 = 0.005;

/// Properties the client actually reads
pub const MINIFIED_PROPERTIES: &[&str] = &["id", "nam_ja", "nam"];

pub(crate) fn property_i64(properties: Option<&JsonObject>, key: &str) -> Option<i64> {
    let value = properties?.get(key)?;
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

pub(crate) fn property_f64(properties: Option<&JsonObject>, key: &str) -> Option<f64> {
    properties?.get(key)?.as_f64()
}

pub(crate) fn property_str<'a>(properties: Option<&'a JsonObject>, key: &str) -> Option<&'a str> {
    properties?.get(key)?.as_str()
}

/// Read a GeoJSON file and return its features as a collection
///
/// A lone Feature is wrapped into a one-element collection; a bare Geometry is
/// rejected.
pub fn read_collection<P: AsRef<Path>>(path: P) -> anyhow::Result<FeatureCollection> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not valid GeoJSON", path.display()))?;
    collection_from_geojson(geojson)
        .with_context(|| format!("{} holds no features", path.display()))
}

/// Wrap any feature-bearing GeoJSON into a FeatureCollection
pub fn collection_from_geojson(geojson: GeoJson) -> anyhow::Result<FeatureCollection> {
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => anyhow::bail!("expected a Feature or FeatureCollection, got a bare Geometry"),
    }
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

fn rings_from_polygon(polygon: &[Vec<Vec<f64>>]) -> PolygonRings {
    polygon.iter().map(|ring| ring_from_positions(ring)).collect()
}

/// Simplify one ring of positions, keeping altitude and any extra members of
/// the positions that survive
fn simplify_positions(ring: &[Vec<f64>], tolerance: f64) -> Vec<Vec<f64>> {
    let positions: Vec<&Vec<f64>> = ring.iter().filter(|p| p.len() >= 2).collect();
    let planar: Ring = positions.iter().map(|p| [p[0], p[1]]).collect();
    let kept = simplify_ring(&planar, tolerance);

    // Kept points are an ordered subset of the input, plus maybe a closing copy
    let mut cursor = 0;
    kept.iter()
        .map(|point| {
            let found = planar[cursor..]
                .iter()
                .position(|q| q == point)
                .map(|offset| cursor + offset)
                .or_else(|| planar.iter().position(|q| q == point));
            match found {
                Some(i) => {
                    cursor = cursor.max(i + 1).min(planar.len());
                    positions[i].clone()
                }
                None => vec![point[0], point[1]],
            }
        })
        .collect()
}

/// Engine geometry for a GeoJSON geometry value, None for non-polygonal types
pub fn geometry_from_value(value: &Value) -> Option<FeatureGeometry> {
    match value {
        Value::Polygon(polygon) => Some(FeatureGeometry::Polygon(rings_from_polygon(polygon))),
        Value::MultiPolygon(polygons) => Some(FeatureGeometry::MultiPolygon(
            polygons.iter().map(|p| rings_from_polygon(p)).collect(),
        )),
        _ => None,
    }
}

/// Feature id: `properties.id`, then the GeoJSON feature id, else 0
pub fn feature_id(feature: &geojson::Feature) -> i64 {
    if let Some(id) = property_i64(feature.properties.as_ref(), "id") {
        return id;
    }
    match &feature.id {
        Some(geojson::feature::Id::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(geojson::feature::Id::String(s)) => s.parse().unwrap_or(0),
        None => 0,
    }
}

/// Convert one GeoJSON feature; None when its geometry is missing or not polygonal
pub fn feature_from_geojson(feature: &geojson::Feature) -> Option<Feature> {
    let geometry = geometry_from_value(&feature.geometry.as_ref()?.value)?;
    Some(Feature {
        id: feature_id(feature),
        progress: property_f64(feature.properties.as_ref(), "progress"),
        geometry,
    })
}

/// Convert every polygonal feature of a collection, in order
pub fn features_from_collection(collection: &FeatureCollection) -> Vec<Feature> {
    let features: Vec<Feature> = collection
        .features
        .iter()
        .filter_map(feature_from_geojson)
        .collect();

    let skipped = collection.features.len() - features.len();
    if skipped > 0 {
        log::debug!("Skipped {} non-polygonal features", skipped);
    }
    features
}

/// Simplify every ring of a polygonal geometry value; other types are returned as is
pub fn simplify_value(value: &Value, tolerance: f64) -> Value {
    let simplify_polygon = |polygon: &[Vec<Vec<f64>>]| -> Vec<Vec<Vec<f64>>> {
        polygon
            .iter()
            .map(|ring| simplify_positions(ring, tolerance))
            .collect()
    };

    match value {
        Value::Polygon(polygon) => Value::Polygon(simplify_polygon(polygon)),
        Value::MultiPolygon(polygons) => {
            Value::MultiPolygon(polygons.iter().map(|p| simplify_polygon(p)).collect())
        }
        other => other.clone(),
    }
}

/// Simplify all features of a collection (Douglas-Peucker, `tolerance` in degrees)
///
/// Properties, ids and foreign members are carried over untouched.
pub fn simplify_collection(collection: &FeatureCollection, tolerance: f64) -> FeatureCollection {
    let features = collection
        .features
        .par_iter()
        .map(|feature| {
            let mut feature = feature.clone();
            if let Some(geometry) = feature.geometry.as_mut() {
                geometry.value = simplify_value(&geometry.value, tolerance);
            }
            feature
        })
        .collect();

    FeatureCollection {
        bbox: collection.bbox.clone(),
        features,
        foreign_members: collection.foreign_members.clone(),
    }
}

/// Keep only the listed properties on every feature
///
/// Keys missing from a feature stay missing. A feature without `nam_ja` is
/// kept but logged, since the client labels prefectures with it.
pub fn minify_properties(collection: &FeatureCollection, keep: &[&str]) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .map(|feature| {
            let properties = feature.properties.as_ref();
            if property_str(properties, "nam_ja").is_none() {
                log::warn!(
                    "Missing nam_ja for feature: {}",
                    properties
                        .map(|p| JsonValue::Object(p.clone()).to_string())
                        .unwrap_or_else(|| "null".to_string())
                );
            }

            let minified: JsonObject = keep
                .iter()
                .filter_map(|&key| Some((key.to_string(), properties?.get(key)?.clone())))
                .collect();

            geojson::Feature {
                properties: Some(minified),
                ..feature.clone()
            }
        })
        .collect();

    FeatureCollection {
        features,
        ..collection.clone()
    }
}
