//! Feature loading: SetFeatures, LoadGeoJson

use std::time::Instant;

use anyhow::Context;
use serde::Deserialize;

use crate::data::{
    features_from_collection, merge_progress, read_collection, simplify_collection,
    PrefectureProgress, ProgressTable, DEFAULT_SIMPLIFY_TOLERANCE,
};
use crate::draw::geometry::Feature;
use crate::engine::MapEngine;
use crate::server::backend::StreamingBackend;
use crate::server::protocol::{error_codes, Response};
use crate::server::state::ServerState;
use crate::server::util::{engine_error, not_initialized, parse_params};

fn load_summary(engine: &MapEngine<StreamingBackend>) -> serde_json::Value {
    let geometry = engine.geometry();
    serde_json::json!({
        "feature_count": engine.features().len(),
        "drawable_count": geometry.world_polygons.len(),
        "fill_vertices": geometry.buffers.fill_vertex_count(),
        "line_vertices": geometry.buffers.line_vertex_count(),
    })
}

/// Handle SetFeatures request - replaces the feature set with engine-ready features
pub fn handle_set_features(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct SetFeaturesParams {
        features: Vec<Feature>,
    }

    let params: SetFeaturesParams = match parse_params(
        &id,
        params,
        "{features: [{id, progress?, geometry: {type, coordinates}}]}",
    ) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };

    match engine.set_features(params.features) {
        Ok(()) => Response::success(id, load_summary(engine)),
        Err(e) => engine_error(id, &e),
    }
}

/// Read, simplify and progress-annotate a GeoJSON file
fn load_features(
    file_path: &str,
    tolerance: f64,
    progress: &ProgressTable,
) -> anyhow::Result<Vec<Feature>> {
    let start = Instant::now();
    let mut collection = read_collection(file_path)?;
    log::info!(
        "Read {} features from {} in {:.2?}",
        collection.features.len(),
        file_path,
        start.elapsed()
    );

    if tolerance > 0.0 {
        let start = Instant::now();
        collection = simplify_collection(&collection, tolerance);
        log::info!("Simplified with tolerance {} in {:.2?}", tolerance, start.elapsed());
    }
    if !progress.is_empty() {
        merge_progress(&mut collection, progress);
    }

    let features = features_from_collection(&collection);
    if features.is_empty() && !collection.features.is_empty() {
        anyhow::bail!("{} has no Polygon or MultiPolygon features", file_path);
    }
    Ok(features)
}

/// Handle LoadGeoJson request - loads a prefecture file from disk
///
/// `tolerance` defaults to 0.01 degrees; 0 disables simplification.
/// `progress` records are joined onto features by `properties.id`.
pub fn handle_load_geojson(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct LoadParams {
        file_path: String,
        #[serde(default)]
        tolerance: Option<f64>,
        #[serde(default)]
        progress: Vec<PrefectureProgress>,
    }

    let params: LoadParams = match parse_params(
        &id,
        params,
        "{file_path: string, tolerance?: number, progress?: [{id, name, visited, total}]}",
    ) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };

    let tolerance = params.tolerance.unwrap_or(DEFAULT_SIMPLIFY_TOLERANCE);
    let progress: ProgressTable = params.progress.into_iter().collect();

    let features = match load_features(&params.file_path, tolerance, &progress)
        .with_context(|| format!("Failed to load {}", params.file_path))
    {
        Ok(features) => features,
        Err(e) => {
            log::error!("{:#}", e);
            return Response::error(id, error_codes::LOAD_FAILED, format!("{:#}", e));
        }
    };

    if let Err(e) = engine.set_features(features) {
        return engine_error(id, &e);
    }
    let summary = load_summary(engine);
    state.source_path = Some(params.file_path);
    Response::success(id, summary)
}
