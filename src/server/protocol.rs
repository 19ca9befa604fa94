//! Wire types of the map host
//!
//! One JSON object per line in each direction. The webview sends
//! [`Request`]s, the host answers each with a [`Response`] carrying the same
//! `id` and pushes engine events as [`Notification`]s in between.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A call from the webview: `{"id": 7, "method": "Wheel", "params": {...}}`
#[derive(Debug, Deserialize)]
pub struct Request {
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// Answer to one request; exactly one of `result` and `error` is set
#[derive(Debug, Serialize)]
pub struct Response {
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
}

/// Response whose result is serialized straight from a borrowed payload,
/// used for buffer frames and query hits to skip the `Value` detour
#[derive(Debug, Serialize)]
pub struct TypedResponse<T: Serialize> {
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Host-initiated line such as a `mapEvent`; `id` serializes as null
#[derive(Debug, Serialize)]
pub struct Notification<T: Serialize> {
    pub id: Option<Value>,
    pub method: &'static str,
    pub result: T,
}

impl<T: Serialize> Notification<T> {
    pub fn new(method: &'static str, result: T) -> Self {
        Notification {
            id: None,
            method,
            result,
        }
    }
}

impl Response {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Response {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Response {
            id,
            result: None,
            error: Some(ErrorResponse { code, message }),
        }
    }

    /// Serialize for the wire; falls back to a bare internal error
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("Failed to serialize response: {}", e);
            format!(
                r#"{{"id":null,"error":{{"code":{},"message":"serialization failed"}}}}"#,
                error_codes::INTERNAL_ERROR
            )
        })
    }
}

/// Error codes sent to the webview
///
/// Negative codes follow JSON-RPC 2.0; positive ones are map host states.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// No `Init` yet
    pub const NOT_INITIALIZED: i32 = 2;
    /// GeoJSON file missing or unreadable
    pub const LOAD_FAILED: i32 = 3;
    /// Render backend refused an upload, lost its device or is unavailable
    pub const BACKEND_ERROR: i32 = 4;
    pub const TORN_DOWN: i32 = 5;
    pub const INVALID_VIEWPORT: i32 = 6;
}
