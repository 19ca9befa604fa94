//! Engine and backend error types

/// Failures reported by a render backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The rendering surface or device could not be acquired or configured.
    #[error("rendering surface unavailable: {0}")]
    Unavailable(String),

    /// A GPU buffer could not be allocated or written.
    #[error("buffer allocation failed: {0}")]
    Allocation(String),

    /// The device went away mid-session.
    #[error("device lost: {0}")]
    DeviceLost(String),

    /// Command submission failed.
    #[error("submission failed: {0}")]
    Submit(String),
}

/// Errors returned by [`MapEngine`](super::MapEngine) operations.
///
/// Bad numeric input never shows up here; it is clamped or replaced and
/// logged instead.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("geometry upload failed")]
    Upload(#[source] BackendError),

    #[error("render failed")]
    Render(#[source] BackendError),

    #[error("render device lost, re-initialization pending")]
    DeviceLost,

    #[error("invalid viewport {width}x{height} at pixel ratio {pixel_ratio}")]
    InvalidViewport {
        width: f64,
        height: f64,
        pixel_ratio: f64,
    },

    #[error("map engine has been torn down")]
    TornDown,
}

pub type EngineResult<T> = Result<T, EngineError>;
