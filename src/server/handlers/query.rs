//! Queries: Project, QueryAt, GetZoom, GetCamera

use serde::{Deserialize, Serialize};

use crate::server::protocol::{error_codes, Response, TypedResponse};
use crate::server::state::ServerState;
use crate::server::util::{not_initialized, parse_params, PointParams};

/// One feature under the cursor
#[derive(Debug, Serialize)]
pub struct FeatureHit {
    pub id: i64,
    pub progress: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct QueryResult {
    #[serde(rename = "lngLat")]
    pub lng_lat: [f64; 2],
    /// All hits in draw order; the first one is what a click selects
    pub features: Vec<FeatureHit>,
}

/// Handle Project request - geographic position to canvas pixels
pub fn handle_project(
    state: &ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct ProjectParams {
        longitude: f64,
        latitude: f64,
    }

    let params: ProjectParams = match parse_params(&id, params, "{longitude: number, latitude: number}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_ref() else {
        return not_initialized(id);
    };

    let [x, y] = engine.project([params.longitude, params.latitude]);
    Response::success(id, serde_json::json!({ "x": x, "y": y }))
}

/// Handle QueryAt request - features under a canvas point
///
/// Works in degraded mode too; hit testing needs no backend.
pub fn handle_query_at(
    state: &ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> String {
    let params: PointParams = match parse_params(&id, params, "{x: number, y: number}") {
        Ok(p) => p,
        Err(response) => return response.to_json(),
    };
    let Some(engine) = state.engine.as_ref() else {
        return not_initialized(id).to_json();
    };

    let point = params.point();
    let features = engine
        .query_at(point)
        .into_iter()
        .map(|f| FeatureHit {
            id: f.id,
            progress: f.progress,
        })
        .collect();

    let response = TypedResponse {
        id,
        result: Some(QueryResult {
            lng_lat: engine.screen_to_lng_lat(point),
            features,
        }),
        error: None,
    };
    match serde_json::to_string(&response) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize QueryAt result: {}", e);
            Response::error(response.id, error_codes::INTERNAL_ERROR, e.to_string()).to_json()
        }
    }
}

/// Handle GetZoom request
pub fn handle_get_zoom(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    match state.engine.as_ref() {
        Some(engine) => Response::success(id, serde_json::json!(engine.current_zoom())),
        None => not_initialized(id),
    }
}

/// Handle GetCamera request - camera, safe state, viewport and backend status
pub fn handle_get_camera(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    let Some(engine) = state.engine.as_ref() else {
        return not_initialized(id);
    };

    let camera = engine.camera();
    let (min_zoom, max_zoom) = camera.zoom_bounds();
    Response::success(
        id,
        serde_json::json!({
            "camera": camera.state(),
            "safe": camera.safe_state(),
            "zoom_bounds": [min_zoom, max_zoom],
            "viewport": engine.viewport(),
            "status": engine.status(),
        }),
    )
}
