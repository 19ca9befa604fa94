//! Helpers shared by the request handlers

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::engine::EngineError;
use crate::server::protocol::{error_codes, Response};

/// Screen point in canvas-relative CSS pixels
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointParams {
    pub x: f64,
    pub y: f64,
}

impl PointParams {
    pub fn point(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Deserialize request params, or an INVALID_PARAMS response naming `expected`
pub fn parse_params<T: DeserializeOwned>(
    id: &Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    expected: &str,
) -> Result<T, Response> {
    params
        .and_then(|p| serde_json::from_value(p).ok())
        .ok_or_else(|| {
            Response::error(
                id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Invalid params: expected {}", expected),
            )
        })
}

pub fn not_initialized(id: Option<serde_json::Value>) -> Response {
    Response::error(
        id,
        error_codes::NOT_INITIALIZED,
        "Map not initialized. Call Init first.".to_string(),
    )
}

/// Map an engine error onto a protocol error code
pub fn engine_error(id: Option<serde_json::Value>, error: &EngineError) -> Response {
    let code = match error {
        EngineError::TornDown => error_codes::TORN_DOWN,
        EngineError::InvalidViewport { .. } => error_codes::INVALID_VIEWPORT,
        EngineError::BackendUnavailable(_)
        | EngineError::Upload(_)
        | EngineError::Render(_)
        | EngineError::DeviceLost => error_codes::BACKEND_ERROR,
    };
    let message = match std::error::Error::source(error) {
        Some(source) => format!("{}: {}", error, source),
        None => error.to_string(),
    };
    Response::error(id, code, message)
}

/// `BINARY:{id}:{base64}` line for payloads too large for JSON arrays
pub fn binary_response(id: &Option<serde_json::Value>, bytes: &[u8]) -> String {
    let id_str = match id {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => "null".to_string(),
    };
    format!("BINARY:{}:{}", id_str, BASE64.encode(bytes))
}
