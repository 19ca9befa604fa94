//! Input forwarding: pointer, touch, wheel, click and leave events
//!
//! Every handler answers with the camera after the event; camera changes
//! also produce `move` notifications.

use serde::Deserialize;

use crate::engine::MapEngine;
use crate::server::backend::StreamingBackend;
use crate::server::protocol::Response;
use crate::server::state::ServerState;
use crate::server::util::{not_initialized, parse_params, PointParams};

fn camera_result(engine: &MapEngine<StreamingBackend>) -> serde_json::Value {
    serde_json::json!({
        "zoom": engine.current_zoom(),
        "center": engine.center(),
        "dragging": engine.is_dragging(),
    })
}

#[derive(Deserialize)]
struct TouchParams {
    touch_count: usize,
    x: f64,
    y: f64,
}

/// Run `f` against the engine with point params
fn with_point(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    f: impl FnOnce(&mut MapEngine<StreamingBackend>, [f64; 2]),
) -> Response {
    let params: PointParams = match parse_params(&id, params, "{x: number, y: number}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };
    f(engine, params.point());
    Response::success(id, camera_result(engine))
}

fn with_touch(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    f: impl FnOnce(&mut MapEngine<StreamingBackend>, usize, [f64; 2]),
) -> Response {
    let params: TouchParams = match parse_params(&id, params, "{touch_count: number, x: number, y: number}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };
    f(engine, params.touch_count, [params.x, params.y]);
    Response::success(id, camera_result(engine))
}

fn without_params(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    f: impl FnOnce(&mut MapEngine<StreamingBackend>),
) -> Response {
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };
    f(engine);
    Response::success(id, camera_result(engine))
}

pub fn handle_pointer_down(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    with_point(state, id, params, |engine, point| engine.on_pointer_down(point))
}

pub fn handle_pointer_move(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    with_point(state, id, params, |engine, point| engine.on_pointer_move(point))
}

pub fn handle_pointer_up(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    without_params(state, id, |engine| engine.on_pointer_up())
}

pub fn handle_touch_start(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    with_touch(state, id, params, |engine, count, point| engine.on_touch_start(count, point))
}

pub fn handle_touch_move(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    with_touch(state, id, params, |engine, count, point| engine.on_touch_move(count, point))
}

/// Touch end and touch cancel
pub fn handle_touch_end(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    without_params(state, id, |engine| engine.on_touch_end())
}

/// Handle Wheel request - `delta_y` in wheel units, negative zooms in
pub fn handle_wheel(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct WheelParams {
        delta_y: f64,
        x: f64,
        y: f64,
    }

    let params: WheelParams = match parse_params(&id, params, "{delta_y: number, x: number, y: number}") {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(engine) = state.engine.as_mut() else {
        return not_initialized(id);
    };
    engine.on_wheel(params.delta_y, [params.x, params.y]);
    Response::success(id, camera_result(engine))
}

pub fn handle_click(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    with_point(state, id, params, |engine, point| engine.on_click(point))
}

pub fn handle_pointer_leave(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    without_params(state, id, |engine| engine.on_pointer_leave())
}
