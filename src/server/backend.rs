//! Render backend for a remote webview
//!
//! The webview owns the actual GPU. This backend keeps the latest buffers,
//! uniform and surface size so the webview can fetch them (`GetBuffers`,
//! `GetBuffersBinary`) and replay them on its device.

use crate::draw::geometry::{CameraUniform, MapBuffers};
use crate::engine::{BackendError, RenderBackend, SurfaceHandle};

#[derive(Debug, Default)]
pub struct StreamingBackend {
    surface: SurfaceHandle,
    initialized: bool,
    size: (u32, u32),
    buffers: Option<MapBuffers>,
    uniform: CameraUniform,
    clear_color: [f32; 4],
    frames: u64,
    /// Bumped on every geometry upload
    geometry_version: u64,
}

impl StreamingBackend {
    pub fn new(surface: SurfaceHandle) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn buffers(&self) -> Option<&MapBuffers> {
        self.buffers.as_ref()
    }

    pub fn uniform(&self) -> &CameraUniform {
        &self.uniform
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn geometry_version(&self) -> u64 {
        self.geometry_version
    }

    fn ensure_initialized(&self) -> Result<(), BackendError> {
        if self.initialized {
            Ok(())
        } else {
            Err(BackendError::Unavailable("backend not initialized".to_string()))
        }
    }
}

impl RenderBackend for StreamingBackend {
    fn initialize(&mut self) -> Result<(), BackendError> {
        self.initialized = true;
        Ok(())
    }

    fn configure(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.size = (width, height);
        Ok(())
    }

    fn upload_geometry(&mut self, buffers: &MapBuffers) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.buffers = Some(buffers.clone());
        self.geometry_version += 1;
        Ok(())
    }

    fn write_uniform(&mut self, uniform: &CameraUniform) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.uniform = *uniform;
        Ok(())
    }

    fn render(&mut self, clear_color: [f32; 4]) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.clear_color = clear_color;
        self.frames += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.buffers = None;
        self.initialized = false;
    }

    fn surface(&self) -> SurfaceHandle {
        self.surface
    }
}
