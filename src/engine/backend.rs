//! Render backend abstraction
//!
//! The engine hands a backend flat vertex buffers and a 32-byte camera
//! uniform and asks it to draw. Device, pipelines and GPU buffers live behind
//! this trait, so swapping the graphics API leaves the rest of the crate alone.

use serde::Serialize;

use super::error::BackendError;
use crate::draw::geometry::{CameraUniform, MapBuffers};

/// Opaque reference to the drawing surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceHandle(pub u64);

/// GPU side of the map
///
/// Calls arrive in this order: `initialize`, `configure`, then any mix of
/// `upload_geometry`, `write_uniform` and `render`, and finally `release`.
/// After `release` the engine may call `initialize` again (device loss).
pub trait RenderBackend {
    /// Acquire device, context and pipelines
    fn initialize(&mut self) -> Result<(), BackendError>;

    /// Resize the surface backing store (physical pixels)
    fn configure(&mut self, width: u32, height: u32) -> Result<(), BackendError>;

    /// Replace all vertex buffers; the previous ones are destroyed
    fn upload_geometry(&mut self, buffers: &MapBuffers) -> Result<(), BackendError>;

    fn write_uniform(&mut self, uniform: &CameraUniform) -> Result<(), BackendError>;

    /// Clear, draw fills, draw borders, submit
    fn render(&mut self, clear_color: [f32; 4]) -> Result<(), BackendError>;

    /// Destroy buffers, then pipelines, then device and context. Must be
    /// safe to call on a partially initialized backend.
    fn release(&mut self);

    fn surface(&self) -> SurfaceHandle;
}

/// Backend that draws nothing
///
/// Used where no GPU exists (headless hosts, tests). Every call succeeds, so
/// geometry, hit-testing and camera logic run exactly as with a real device.
#[derive(Debug, Default)]
pub struct NullBackend {
    surface: SurfaceHandle,
    frames: u64,
}

impl NullBackend {
    pub fn new(surface: SurfaceHandle) -> Self {
        Self { surface, frames: 0 }
    }

    /// Number of `render` calls so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderBackend for NullBackend {
    fn initialize(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn configure(&mut self, _width: u32, _height: u32) -> Result<(), BackendError> {
        Ok(())
    }

    fn upload_geometry(&mut self, _buffers: &MapBuffers) -> Result<(), BackendError> {
        Ok(())
    }

    fn write_uniform(&mut self, _uniform: &CameraUniform) -> Result<(), BackendError> {
        Ok(())
    }

    fn render(&mut self, _clear_color: [f32; 4]) -> Result<(), BackendError> {
        self.frames += 1;
        Ok(())
    }

    fn release(&mut self) {}

    fn surface(&self) -> SurfaceHandle {
        self.surface
    }
}
