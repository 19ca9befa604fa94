//! Buffer transfer: GetBuffers (JSON), GetBuffersBinary (BINARY: line)

use serde::Serialize;

use crate::draw::geometry::{CameraUniform, MapBuffers};
use crate::server::protocol::{error_codes, Response, TypedResponse};
use crate::server::state::ServerState;
use crate::server::util::{binary_response, not_initialized};

/// Everything the webview needs to draw one frame
#[derive(Debug, Serialize)]
pub struct FramePayload<'a> {
    #[serde(rename = "geometryVersion")]
    pub geometry_version: u64,
    pub buffers: &'a MapBuffers,
    pub uniform: CameraUniform,
    #[serde(rename = "clearColor")]
    pub clear_color: [f32; 4],
    /// Physical surface size in pixels
    pub size: (u32, u32),
}

/// Handle GetBuffers request - vertex arrays as base64 float32 inside JSON
///
/// Buffers come from the engine's current geometry, so they are available
/// in degraded mode as well.
pub fn handle_get_buffers(state: &ServerState, id: Option<serde_json::Value>) -> String {
    let Some(engine) = state.engine.as_ref() else {
        return not_initialized(id).to_json();
    };

    let viewport = engine.viewport();
    let payload = FramePayload {
        geometry_version: engine.backend().geometry_version(),
        buffers: &engine.geometry().buffers,
        uniform: engine.camera().uniform(&viewport).unwrap_or_default(),
        clear_color: engine.config().clear_color,
        size: viewport.physical_size(),
    };

    let response = TypedResponse {
        id,
        result: Some(payload),
        error: None,
    };
    match serde_json::to_string(&response) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize buffers: {}", e);
            Response::error(response.id, error_codes::INTERNAL_ERROR, e.to_string()).to_json()
        }
    }
}

/// Handle GetBuffersBinary request - `BINARY:{id}:{base64}` of the geometry frame
/// followed by the 32-byte camera uniform
pub fn handle_get_buffers_binary(state: &ServerState, id: Option<serde_json::Value>) -> String {
    let Some(engine) = state.engine.as_ref() else {
        return not_initialized(id).to_json();
    };

    let mut bytes = engine.geometry().buffers.to_bytes();
    let uniform = engine.camera().uniform(&engine.viewport()).unwrap_or_default();
    bytes.extend_from_slice(&uniform.to_bytes());

    log::debug!("Sending {} byte binary frame", bytes.len());
    binary_response(&id, &bytes)
}
