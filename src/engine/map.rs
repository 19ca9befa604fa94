//! The map engine
//!
//! One [`MapEngine`] owns the feature set, the derived geometry and spatial
//! index, the camera and the render backend. All mutation goes through its
//! methods and runs synchronously on the caller's thread.

use serde::Serialize;

use super::backend::{RenderBackend, SurfaceHandle};
use super::camera::{Camera, CameraState, Viewport};
use super::config::{MapConfig, ViewState};
use super::error::{BackendError, EngineError, EngineResult};
use super::events::{MapEvent, MapListener};
use super::interaction::{Gesture, InteractionController};
use super::scheduler::FrameScheduler;
use crate::draw::generation::{build_geometry, MapGeometry};
use crate::draw::geometry::{Feature, SpatialIndex};

/// Where the render backend stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    /// `initialize` not called yet
    Uninitialized,
    Ready,
    /// Device lost; re-initialization is scheduled
    Lost,
    /// Degraded mode: geometry and queries work, nothing is drawn
    Unavailable,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Recovery {
    due_at_ms: u64,
    attempts: u32,
}

pub struct MapEngine<B: RenderBackend> {
    backend: B,
    backend_live: bool,
    status: BackendStatus,
    config: MapConfig,
    camera: Camera,
    controller: InteractionController,
    viewport: Viewport,
    features: Vec<Feature>,
    geometry: MapGeometry,
    index: SpatialIndex,
    scheduler: FrameScheduler,
    pending_resize: Option<Viewport>,
    recovery: Option<Recovery>,
    failed_updates: u32,
    unavailable_reported: bool,
    listener: Option<Box<dyn MapListener>>,
}

impl<B: RenderBackend> MapEngine<B> {
    pub fn new(
        backend: B,
        view: ViewState,
        config: MapConfig,
        listener: Option<Box<dyn MapListener>>,
    ) -> Self {
        Self {
            backend,
            backend_live: false,
            status: BackendStatus::Uninitialized,
            camera: Camera::new(&view, &config),
            controller: InteractionController::new(&config),
            config,
            viewport: Viewport::default(),
            features: Vec::new(),
            geometry: MapGeometry::default(),
            index: SpatialIndex::default(),
            scheduler: FrameScheduler::new(),
            pending_resize: None,
            recovery: None,
            failed_updates: 0,
            unavailable_reported: false,
            listener,
        }
    }

    /// Set the initial canvas size before `initialize`
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        if viewport.is_valid() {
            self.viewport = viewport;
        } else {
            log::warn!("Ignoring invalid initial viewport {:?}", viewport);
        }
        self
    }

    // ---- lifecycle ----

    /// Bring up the backend and draw the first frame
    ///
    /// On failure whatever the backend acquired is released, the engine drops
    /// to degraded mode and `Unavailable` is emitted once.
    pub fn initialize(&mut self) -> EngineResult<()> {
        match self.status {
            BackendStatus::TornDown => return Err(EngineError::TornDown),
            BackendStatus::Ready => return Ok(()),
            _ => {}
        }

        if let Err(e) = self.bring_up() {
            let reason = e.to_string();
            log::error!("Render backend initialization failed: {}", reason);
            self.backend.release();
            self.backend_live = false;
            self.mark_unavailable(reason.clone());
            return Err(EngineError::BackendUnavailable(reason));
        }

        self.recovery = None;
        log::info!(
            "Map engine initialized ({} features, zoom {:.2})",
            self.features.len(),
            self.camera.zoom()
        );
        self.emit(MapEvent::Load);
        Ok(())
    }

    /// initialize + configure + upload current geometry + first frame
    fn bring_up(&mut self) -> Result<(), BackendError> {
        self.backend.initialize()?;
        self.backend_live = true;
        if self.viewport.is_valid() {
            let (w, h) = self.viewport.physical_size();
            self.backend.configure(w, h)?;
        }
        if !self.geometry.is_empty() {
            self.backend.upload_geometry(&self.geometry.buffers)?;
        }
        if let Some(uniform) = self.camera.uniform(&self.viewport) {
            self.backend.write_uniform(&uniform)?;
            self.backend.render(self.config.clear_color)?;
        }

        self.status = BackendStatus::Ready;
        self.failed_updates = 0;
        Ok(())
    }

    /// Release everything; later calls are no-ops. Also run on drop.
    pub fn teardown(&mut self) {
        if self.status == BackendStatus::TornDown {
            return;
        }
        if let Some(handle) = self.scheduler.cancel() {
            log::debug!("Cancelled pending frame {:?}", handle);
        }
        self.pending_resize = None;
        self.recovery = None;
        self.controller.pointer_up();
        self.release_backend();
        self.status = BackendStatus::TornDown;
        log::info!("Map engine torn down");
    }

    fn release_backend(&mut self) {
        if self.backend_live {
            self.backend.release();
            self.backend_live = false;
        }
    }

    fn mark_unavailable(&mut self, reason: String) {
        self.release_backend();
        self.status = BackendStatus::Unavailable;
        self.recovery = None;
        if !self.unavailable_reported {
            self.unavailable_reported = true;
            self.emit(MapEvent::Unavailable { reason });
        }
    }

    /// Backend reported a lost device at host time `now_ms`
    ///
    /// Resources are released and re-initialization is attempted from
    /// `on_animation_frame` after `reinit_delay_ms`.
    pub fn notify_device_lost(&mut self, now_ms: u64, reason: &str) {
        if self.status != BackendStatus::Ready {
            return;
        }
        log::warn!("Render device lost: {}", reason);
        self.release_backend();
        self.status = BackendStatus::Lost;
        self.recovery = Some(Recovery {
            due_at_ms: now_ms.saturating_add(self.config.reinit_delay_ms),
            attempts: 0,
        });
        self.scheduler.request();
    }

    /// Animation-frame callback from the host at time `now_ms`
    ///
    /// Applies a coalesced resize and drives device-loss recovery. Returns
    /// true when the host should keep delivering frames.
    pub fn on_animation_frame(&mut self, now_ms: u64) -> bool {
        if self.scheduler.fire().is_none() {
            return false;
        }

        if let Some(viewport) = self.pending_resize.take() {
            if let Err(e) = self.on_resize(viewport) {
                log::warn!("Deferred resize failed: {}", e);
            }
        }

        if let Some(mut recovery) = self.recovery {
            if now_ms < recovery.due_at_ms {
                self.scheduler.request();
                return true;
            }

            recovery.attempts += 1;
            log::info!("Re-initializing render backend (attempt {})", recovery.attempts);
            match self.bring_up() {
                Ok(()) => {
                    self.recovery = None;
                    self.emit(MapEvent::Load);
                }
                Err(e) => {
                    log::error!("Re-initialization failed: {}", e);
                    self.backend.release();
                    self.backend_live = false;
                    if recovery.attempts >= self.config.max_reinit_attempts {
                        self.mark_unavailable(format!(
                            "device lost and {} re-initialization attempts failed: {}",
                            recovery.attempts, e
                        ));
                    } else {
                        recovery.due_at_ms = now_ms.saturating_add(self.config.reinit_delay_ms);
                        self.recovery = Some(recovery);
                        self.scheduler.request();
                    }
                }
            }
        }

        self.scheduler.pending().is_some()
    }

    // ---- geometry ----

    /// Replace the feature set and rebuild everything derived from it
    ///
    /// The new buffers are uploaded before anything is committed: if the
    /// backend rejects them, the previous features, geometry and index stay.
    pub fn set_features(&mut self, features: Vec<Feature>) -> EngineResult<()> {
        if self.status == BackendStatus::TornDown {
            return Err(EngineError::TornDown);
        }

        let geometry = build_geometry(&features, self.config.border_color);

        if self.status == BackendStatus::Ready {
            if let Err(e) = self.backend.upload_geometry(&geometry.buffers) {
                log::error!("Geometry upload failed, keeping previous geometry: {}", e);
                return Err(EngineError::Upload(e));
            }
        }

        self.index = geometry.index();
        self.geometry = geometry;
        self.features = features;
        log::info!(
            "Loaded {} features ({} drawable)",
            self.features.len(),
            self.geometry.world_polygons.len()
        );

        if let Err(e) = self.redraw() {
            log::error!("Render after geometry update failed: {}", e);
            self.reset_to_safe_state();
        }
        Ok(())
    }

    // ---- queries ----

    pub fn project(&self, lng_lat: [f64; 2]) -> [f64; 2] {
        self.camera.project(lng_lat, &self.viewport)
    }

    pub fn screen_to_lng_lat(&self, point: [f64; 2]) -> [f64; 2] {
        self.camera.screen_to_lng_lat(point, &self.viewport)
    }

    /// Features under a screen point, in world polygon order
    pub fn query_at(&self, point: [f64; 2]) -> Vec<&Feature> {
        let world = self.camera.screen_to_world(point, &self.viewport);
        self.geometry
            .hits(&self.index, self.config.hit_test, world)
            .into_iter()
            .filter_map(|i| self.features.get(self.geometry.world_polygons[i].feature_index))
            .collect()
    }

    /// First feature under a screen point
    pub fn feature_at(&self, point: [f64; 2]) -> Option<&Feature> {
        self.query_at(point).into_iter().next()
    }

    pub fn current_zoom(&self) -> f64 {
        self.camera.zoom()
    }

    pub fn center(&self) -> [f64; 2] {
        self.camera.center()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn canvas_handle(&self) -> SurfaceHandle {
        self.backend.surface()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn status(&self) -> BackendStatus {
        self.status
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    // ---- interaction ----

    pub fn on_pointer_down(&mut self, point: [f64; 2]) {
        self.controller.pointer_down(point);
    }

    pub fn on_pointer_move(&mut self, point: [f64; 2]) {
        let gesture = self.controller.pointer_move(point, &self.camera, &self.viewport);
        self.apply(gesture);
    }

    pub fn on_pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn on_touch_start(&mut self, touch_count: usize, point: [f64; 2]) {
        self.controller.touch_start(touch_count, point);
    }

    pub fn on_touch_move(&mut self, touch_count: usize, point: [f64; 2]) {
        let gesture = self
            .controller
            .touch_move(touch_count, point, &self.camera, &self.viewport);
        self.apply(gesture);
    }

    pub fn on_touch_end(&mut self) {
        self.controller.touch_end();
    }

    pub fn on_wheel(&mut self, delta_y: f64, point: [f64; 2]) {
        let gesture = self.controller.wheel(delta_y, point, &self.camera, &self.viewport);
        self.apply(gesture);
    }

    pub fn on_click(&mut self, point: [f64; 2]) {
        let lng_lat = self.screen_to_lng_lat(point);
        self.emit(MapEvent::Click { lng_lat, point });
    }

    pub fn on_pointer_leave(&mut self) {
        self.emit(MapEvent::MouseLeave);
    }

    /// Apply a new canvas size now
    pub fn on_resize(&mut self, viewport: Viewport) -> EngineResult<()> {
        if self.status == BackendStatus::TornDown {
            return Err(EngineError::TornDown);
        }
        if !viewport.is_valid() {
            log::warn!("Ignoring invalid viewport {:?}", viewport);
            return Err(EngineError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
                pixel_ratio: viewport.pixel_ratio,
            });
        }
        if viewport == self.viewport {
            return Ok(());
        }

        self.viewport = viewport;
        if self.status == BackendStatus::Ready {
            let (w, h) = viewport.physical_size();
            if let Err(e) = self.backend.configure(w, h) {
                log::error!("Surface configure failed: {}", e);
                self.mark_unavailable(e.to_string());
                return Err(EngineError::BackendUnavailable(e.to_string()));
            }
        }
        self.commit();
        Ok(())
    }

    /// Queue a resize for the next animation frame; repeated calls coalesce
    pub fn request_resize(&mut self, viewport: Viewport) {
        self.pending_resize = Some(viewport);
        self.scheduler.request();
    }

    /// Redraw without changing the camera
    pub fn render(&mut self) -> EngineResult<()> {
        match self.status {
            BackendStatus::Lost => Err(EngineError::DeviceLost),
            BackendStatus::Unavailable => Err(EngineError::BackendUnavailable(
                "running in degraded mode".to_string(),
            )),
            BackendStatus::TornDown => Err(EngineError::TornDown),
            BackendStatus::Ready | BackendStatus::Uninitialized => self.redraw(),
        }
    }

    fn apply(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::None => {}
            Gesture::Hover { lng_lat, point } => self.emit(MapEvent::MouseMove { lng_lat, point }),
            Gesture::Pan { center } => {
                if self.camera.set_center(center) {
                    self.commit();
                } else {
                    self.note_rejection();
                }
            }
            Gesture::Zoom { zoom, center } => {
                let previous = self.camera.state();
                if self.camera.set_zoom(zoom) && self.camera.set_center(center) {
                    self.commit();
                } else {
                    // Leave no half-applied update behind
                    self.camera.restore(previous);
                    self.note_rejection();
                }
            }
            Gesture::Discarded => {}
            Gesture::Rejected => self.note_rejection(),
        }
    }

    /// Only non-finite camera results count toward the safe-state fallback
    fn note_rejection(&mut self) {
        self.failed_updates += 1;
        if self.failed_updates >= self.config.max_failed_updates {
            log::warn!("{} consecutive rejected camera updates", self.failed_updates);
            self.reset_to_safe_state();
        }
    }

    /// Uniform, render, then `Move`
    fn commit(&mut self) {
        self.failed_updates = 0;
        match self.redraw() {
            Ok(()) => self.emit(MapEvent::Move),
            Err(e) => {
                log::error!("Render failed after camera update: {}", e);
                self.reset_to_safe_state();
            }
        }
    }

    fn redraw(&mut self) -> EngineResult<()> {
        if self.status != BackendStatus::Ready {
            return Ok(());
        }
        let Some(uniform) = self.camera.uniform(&self.viewport) else {
            return Ok(());
        };
        self.backend.write_uniform(&uniform).map_err(EngineError::Render)?;
        self.backend
            .render(self.config.clear_color)
            .map_err(EngineError::Render)
    }

    /// Return to the initial view; if even that cannot be drawn, stop drawing
    fn reset_to_safe_state(&mut self) {
        log::warn!("Resetting camera to safe state");
        self.camera.reset_to_safe();
        self.failed_updates = 0;
        match self.redraw() {
            Ok(()) => self.emit(MapEvent::Move),
            Err(e) => {
                log::error!("Render failed even in safe state: {}", e);
                self.mark_unavailable(e.to_string());
            }
        }
    }

    fn emit(&mut self, event: MapEvent) {
        log::trace!("map event {:?}", event);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_event(&event);
        }
    }
}

impl<B: RenderBackend> Drop for MapEngine<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
