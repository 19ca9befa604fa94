//! Map server - JSON-RPC host for a webview running the map
//!
//! One request per line on stdin, one response per line on stdout. Map
//! events raised while handling a request follow its response as
//! `{"id": null, "method": "mapEvent", "result": <event>}` lines.
//!
//! # Module Structure
//! - `protocol` - JSON-RPC request/response types
//! - `state` - Server state management
//! - `backend` - Render backend that streams buffers to the webview
//! - `util` - Param parsing and response helpers
//! - `handlers` - Request handlers organized by functionality

pub mod backend;
pub mod handlers;
pub mod protocol;
pub mod state;
pub mod util;

pub use backend::StreamingBackend;
pub use protocol::{error_codes, ErrorResponse, Notification, Request, Response, TypedResponse};
pub use state::ServerState;

use std::io::{self, BufRead, Write};

use handlers::*;

/// Method name of event notifications
pub const EVENT_METHOD: &str = "mapEvent";

/// Route one request to its handler and return the response line
pub fn dispatch(state: &mut ServerState, request: Request) -> String {
    let Request { id, method, params } = request;

    let response = match method.as_str() {
        "Init" => handle_init(state, id, params),
        "Resize" => handle_resize(state, id, params),
        "AnimationFrame" => handle_animation_frame(state, id, params),
        "DeviceLost" => handle_device_lost(state, id, params),
        "Teardown" => handle_teardown(state, id),
        "SetFeatures" => handle_set_features(state, id, params),
        "LoadGeoJson" => handle_load_geojson(state, id, params),
        "PointerDown" => handle_pointer_down(state, id, params),
        "PointerMove" => handle_pointer_move(state, id, params),
        "PointerUp" => handle_pointer_up(state, id),
        "TouchStart" => handle_touch_start(state, id, params),
        "TouchMove" => handle_touch_move(state, id, params),
        "TouchEnd" | "TouchCancel" => handle_touch_end(state, id),
        "Wheel" => handle_wheel(state, id, params),
        "Click" => handle_click(state, id, params),
        "PointerLeave" => handle_pointer_leave(state, id),
        "Project" => handle_project(state, id, params),
        "QueryAt" => return handle_query_at(state, id, params),
        "GetZoom" => handle_get_zoom(state, id),
        "GetCamera" => handle_get_camera(state, id),
        "GetBuffers" => return handle_get_buffers(state, id),
        "GetBuffersBinary" => return handle_get_buffers_binary(state, id),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        ),
    };
    response.to_json()
}

/// Parse and dispatch one input line
///
/// Returns None for blank lines. Unparseable input gets a PARSE_ERROR
/// response with a null id.
pub fn handle_line(state: &mut ServerState, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            log::debug!("-> {}", request.method);
            Some(dispatch(state, request))
        }
        // Well-formed JSON that is not a request object
        Err(e) if e.is_data() => {
            log::warn!("Malformed request: {}", e);
            Some(Response::error(None, error_codes::INVALID_REQUEST, format!("Invalid request: {}", e)).to_json())
        }
        Err(e) => {
            log::warn!("Failed to parse request: {}", e);
            Some(Response::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", e)).to_json())
        }
    }
}

/// Notification lines for every event queued since the last call
pub fn drain_notifications(state: &ServerState) -> Vec<String> {
    state
        .take_events()
        .into_iter()
        .filter_map(|event| {
            serde_json::to_string(&Notification::new(EVENT_METHOD, &event))
                .map_err(|e| log::error!("Failed to serialize event {:?}: {}", event, e))
                .ok()
        })
        .collect()
}

/// Serve requests from `input` until end of input or a read error
///
/// Each response is followed by the notifications it produced, then flushed.
/// The engine is torn down on the way out.
pub fn serve<R: BufRead, W: Write>(state: &mut ServerState, input: R, output: &mut W) -> io::Result<()> {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("Error reading input, stopping: {}", e);
                break;
            }
        };

        let Some(response) = handle_line(state, &line) else {
            continue;
        };

        writeln!(output, "{}", response)?;
        for notification in drain_notifications(state) {
            writeln!(output, "{}", notification)?;
        }
        output.flush()?;
    }

    if let Some(engine) = state.engine.as_mut() {
        engine.teardown();
    }
    Ok(())
}
