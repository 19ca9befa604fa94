//! Session lifecycle: Init, Resize, AnimationFrame, DeviceLost, Teardown

use serde::Deserialize;

use crate::engine::{MapConfig, MapEngine, ViewState, Viewport, SurfaceHandle};
use crate::server::backend::StreamingBackend;
use crate::server::protocol::Response;
use crate::server::state::ServerState;
use crate::server::util::{engine_error, not_initialized, parse_params};

fn default_pixel_ratio() -> f64 {
    1.0
}

/// Handle Init request - creates the engine and brings up the backend
///
/// A second Init replaces the engine but keeps the loaded features. A
/// backend failure is not an error response: the engine stays usable in
/// degraded mode and the client hears about it through an `unavailable`
/// event.
pub fn handle_init(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct InitParams {
        #[serde(default)]
        view: Option<ViewState>,
        #[serde(default)]
        config: MapConfig,
        width: f64,
        height: f64,
        #[serde(default = "default_pixel_ratio")]
        pixel_ratio: f64,
        #[serde(default)]
        surface: u64,
    }

    let params: InitParams = match parse_params(
        &id,
        params,
        "{width, height, pixel_ratio?, view?: {longitude, latitude, zoom}, config?, surface?}",
    ) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let features = match state.engine.take() {
        Some(mut previous) => {
            log::info!("Re-initializing map engine");
            let features = previous.features().to_vec();
            previous.teardown();
            features
        }
        None => Vec::new(),
    };

    let view = params.view.unwrap_or_default();
    let mut engine = MapEngine::new(
        StreamingBackend::new(SurfaceHandle(params.surface)),
        view,
        params.config,
        Some(Box::new(state.events.clone())),
    )
    .with_viewport(Viewport::new(params.width, params.height, params.pixel_ratio));

    if !features.is_empty() {
        if let Err(e) = engine.set_features(features) {
            log::warn!("Could not restore features on re-init: {}", e);
        }
    }
    if let Err(e) = engine.initialize() {
        log::warn!("Continuing without rendering: {}", e);
    }

    let result = serde_json::json!({
        "status": engine.status(),
        "zoom": engine.current_zoom(),
        "center": engine.center(),
        "surface": engine.canvas_handle().0,
    });
    state.engine = Some(engine);
    Response::success(id, result)
}

/// Handle Resize request - applies now, or on the next AnimationFrame when `deferred`
pub fn handle_resize(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct ResizeParams {
        width: f64,
        height: f64,
        #[serde(default = "default_pixel_ratio")]
        pixel_ratio: f64,
        #[serde(default)]
        deferred: bool,
    }

    let params: ResizeParams = match parse_params(&id, params, "{width, height, pixel_ratio?, deferred?}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };

    let viewport = Viewport::new(params.width, params.height, params.pixel_ratio);
    if params.deferred {
        engine.request_resize(viewport);
        return Response::success(id, serde_json::json!({ "scheduled": true }));
    }

    match engine.on_resize(viewport) {
        Ok(()) => {
            let (width, height) = engine.viewport().physical_size();
            Response::success(
                id,
                serde_json::json!({ "scheduled": false, "physical_size": [width, height] }),
            )
        }
        Err(e) => engine_error(id, &e),
    }
}

/// Handle AnimationFrame request - the host's frame callback
pub fn handle_animation_frame(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct FrameParams {
        now_ms: u64,
    }

    let params: FrameParams = match parse_params(&id, params, "{now_ms: u64}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };

    let keep_running = engine.on_animation_frame(params.now_ms);
    Response::success(
        id,
        serde_json::json!({ "keep_running": keep_running, "status": engine.status() }),
    )
}

/// Handle DeviceLost request - the webview's GPU device went away
pub fn handle_device_lost(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct DeviceLostParams {
        now_ms: u64,
        #[serde(default)]
        reason: Option<String>,
    }

    let params: DeviceLostParams = match parse_params(&id, params, "{now_ms: u64, reason?: string}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };

    let reason = params.reason.as_deref().unwrap_or("unknown");
    engine.notify_device_lost(params.now_ms, reason);
    Response::success(id, serde_json::json!({ "status": engine.status() }))
}

/// Handle Teardown request - releases the backend; the engine answers TORN_DOWN afterwards
pub fn handle_teardown(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };
    engine.teardown();
    Response::success(id, serde_json::json!({ "status": engine.status() }))
}
