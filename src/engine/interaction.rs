//! Pointer, touch and wheel handling
//!
//! The controller tracks the gesture phase and turns raw input into a
//! [`Gesture`]: the camera change the input asks for. It never mutates the
//! camera itself; [`MapEngine`](super::MapEngine) commits accepted gestures.
//! All points are canvas-relative CSS pixels.

use super::camera::{Camera, Viewport};
use super::config::MapConfig;
use crate::draw::projection::to_geographic;

/// Maximum |latitude| a drag may move the center to
const DRAG_MAX_LATITUDE: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    /// Button or single finger held; `last` is the last accepted position
    Dragging { last: [f64; 2] },
}

/// Outcome of one input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Nothing to do
    None,
    /// Pointer moved without dragging
    Hover { lng_lat: [f64; 2], point: [f64; 2] },
    /// Move the center, zoom unchanged
    Pan { center: [f64; 2] },
    /// Zoom around the cursor
    Zoom { zoom: f64, center: [f64; 2] },
    /// Result fell outside the allowed band or the canvas has no size;
    /// keep the previous camera
    Discarded,
    /// Input produced a non-finite camera; keep the previous one
    Rejected,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    phase: GesturePhase,
    drag_threshold: f64,
    wheel_zoom_rate: f64,
}

impl InteractionController {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            phase: GesturePhase::Idle,
            drag_threshold: config.drag_threshold_px.max(0.0),
            wheel_zoom_rate: config.wheel_zoom_rate,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, GesturePhase::Dragging { .. })
    }

    pub fn pointer_down(&mut self, point: [f64; 2]) {
        self.phase = GesturePhase::Dragging { last: point };
    }

    pub fn pointer_up(&mut self) {
        self.phase = GesturePhase::Idle;
    }

    pub fn pointer_move(&mut self, point: [f64; 2], camera: &Camera, viewport: &Viewport) -> Gesture {
        let GesturePhase::Dragging { last } = self.phase else {
            return Gesture::Hover {
                lng_lat: camera.screen_to_lng_lat(point, viewport),
                point,
            };
        };

        let dx = point[0] - last[0];
        let dy = point[1] - last[1];
        if dx.abs() < self.drag_threshold && dy.abs() < self.drag_threshold {
            return Gesture::None;
        }
        self.phase = GesturePhase::Dragging { last: point };

        self.drag(dx, dy, camera, viewport)
    }

    /// Single-finger touch starts a drag; multi-touch is ignored
    pub fn touch_start(&mut self, touch_count: usize, point: [f64; 2]) {
        if touch_count == 1 {
            self.pointer_down(point);
        }
    }

    pub fn touch_move(
        &mut self,
        touch_count: usize,
        point: [f64; 2],
        camera: &Camera,
        viewport: &Viewport,
    ) -> Gesture {
        if touch_count != 1 {
            return Gesture::None;
        }
        self.pointer_move(point, camera, viewport)
    }

    /// Touch end and touch cancel
    pub fn touch_end(&mut self) {
        self.pointer_up();
    }

    /// Zoom by `-delta_y / 100 * rate`, keeping the point under the cursor fixed
    pub fn wheel(&self, delta_y: f64, point: [f64; 2], camera: &Camera, viewport: &Viewport) -> Gesture {
        if !viewport.is_valid() {
            log::warn!("Invalid canvas size during wheel: {:?}", viewport);
            return Gesture::Discarded;
        }

        let zoom = camera.clamp_zoom(camera.zoom() + -delta_y / 100.0 * self.wheel_zoom_rate);
        if !zoom.is_finite() {
            log::warn!("Invalid zoom from wheel delta {}", delta_y);
            return Gesture::Rejected;
        }
        if zoom == camera.zoom() {
            return Gesture::None;
        }

        let before = camera.screen_to_lng_lat(point, viewport);
        let mut zoomed = camera.clone();
        zoomed.set_zoom(zoom);
        let after = zoomed.screen_to_lng_lat(point, viewport);

        let center = camera.center();
        let center = [center[0] + (before[0] - after[0]), center[1] + (before[1] - after[1])];
        if !(center[0].is_finite() && center[1].is_finite()) {
            log::warn!("Invalid center after wheel zoom: {:?}", center);
            return Gesture::Rejected;
        }

        Gesture::Zoom { zoom, center }
    }

    fn drag(&self, dx: f64, dy: f64, camera: &Camera, viewport: &Viewport) -> Gesture {
        let zoom = camera.zoom();
        let (min_zoom, max_zoom) = camera.zoom_bounds();
        if !zoom.is_finite() {
            log::warn!("Invalid zoom value during drag: {}", zoom);
            return Gesture::Rejected;
        }
        if zoom < min_zoom || zoom > max_zoom {
            log::warn!("Zoom {} outside [{}, {}] during drag", zoom, min_zoom, max_zoom);
            return Gesture::Discarded;
        }
        if !viewport.is_valid() {
            log::warn!("Invalid canvas size during drag: {:?}", viewport);
            return Gesture::Discarded;
        }

        let center_world = camera.center_world();
        let ws = camera.world_size();
        let new_world = [center_world[0] - dx / ws, center_world[1] - dy / ws];
        if !(new_world[0].is_finite() && new_world[1].is_finite()) {
            log::warn!("Invalid new world coordinates: {:?}", new_world);
            return Gesture::Rejected;
        }

        let center = to_geographic(new_world[0], new_world[1]);
        if !(center[0].is_finite() && center[1].is_finite()) {
            log::warn!("Invalid new center coordinates: {:?}", center);
            return Gesture::Rejected;
        }
        if center[0].abs() > 180.0 || center[1].abs() > DRAG_MAX_LATITUDE {
            log::warn!("Drag center {:?} out of bounds, keeping previous center", center);
            return Gesture::Discarded;
        }

        Gesture::Pan { center }
    }
}
