//! Interactive map engine
//!
//! Owns the camera, turns input into camera changes and drives a render
//! backend with the buffers built by `draw`.
//!
//! # Submodules
//! - `config` - Map tunables and the initial view
//! - `camera` - Camera state, viewport and coordinate transforms
//! - `interaction` - Drag, touch and wheel handling
//! - `backend` - Render backend trait and the drawing-free backend
//! - `scheduler` - Animation-frame coalescing
//! - `events` - Events and listeners
//! - `error` - Error types
//! - `map` - `MapEngine`, tying all of the above together

pub mod config;
pub mod camera;
pub mod interaction;
pub mod backend;
pub mod scheduler;
pub mod events;
pub mod error;
pub mod map;

pub use config::{MapConfig, ViewState};
pub use camera::{Camera, CameraState, Viewport};
pub use interaction::{Gesture, GesturePhase, InteractionController};
pub use backend::{NullBackend, RenderBackend, SurfaceHandle};
pub use scheduler::{FrameHandle, FrameScheduler};
pub use events::{EventQueue, MapEvent, MapListener};
pub use error::{BackendError, EngineError, EngineResult};
pub use map::{BackendStatus, MapEngine};
