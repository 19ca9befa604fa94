//! Camera state and screen <-> world transforms
//!
//! Screen points are CSS pixels relative to the canvas' top-left corner.
//! World units are the normalized Mercator square of `draw::projection`; at
//! zoom `z` the whole world spans `tile_size * 2^z` pixels.

use serde::{Deserialize, Serialize};

use super::config::{MapConfig, ViewState};
use crate::draw::geometry::CameraUniform;
use crate::draw::projection::{clamp_lng_lat, to_geographic, to_world};

/// Size of the drawing surface in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl Viewport {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.pixel_ratio.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.pixel_ratio > 0.0
    }

    /// Backing store size: floor(css * pixel ratio), at least 1x1
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |css: f64| (css * self.pixel_ratio).floor().clamp(1.0, u32::MAX as f64) as u32;
        (scale(self.width), scale(self.height))
    }

    pub fn center(&self) -> [f64; 2] {
        [self.width / 2.0, self.height / 2.0]
    }
}

impl Default for Viewport {
    /// Zero-sized, i.e. not yet laid out
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Zoom level and geographic center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub zoom: f64,
    /// [longitude, latitude]
    pub center: [f64; 2],
}

impl CameraState {
    pub fn is_finite(&self) -> bool {
        self.zoom.is_finite() && self.center[0].is_finite() && self.center[1].is_finite()
    }
}

/// Camera with clamped zoom and center plus the recorded safe state
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    state: CameraState,
    safe: CameraState,
    min_zoom: f64,
    max_zoom: f64,
    tile_size: f64,
}

impl Camera {
    /// Build from the caller's initial view; the clamped view becomes the safe state
    pub fn new(view: &ViewState, config: &MapConfig) -> Self {
        let (min_zoom, max_zoom) = config.zoom_range();
        let tile_size = if config.tile_size.is_finite() && config.tile_size > 0.0 {
            config.tile_size
        } else {
            log::warn!("Invalid tile size {}, using 512", config.tile_size);
            512.0
        };

        let zoom = if view.zoom.is_finite() {
            view.zoom.clamp(min_zoom, max_zoom)
        } else {
            log::warn!("Invalid initial zoom {}, using {}", view.zoom, min_zoom);
            min_zoom
        };
        let center = if view.longitude.is_finite() && view.latitude.is_finite() {
            clamp_lng_lat([view.longitude, view.latitude])
        } else {
            log::warn!(
                "Invalid initial center [{}, {}], using [0, 0]",
                view.longitude,
                view.latitude
            );
            [0.0, 0.0]
        };

        let state = CameraState { zoom, center };
        Self {
            state,
            safe: state,
            min_zoom,
            max_zoom,
            tile_size,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn safe_state(&self) -> CameraState {
        self.safe
    }

    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn center(&self) -> [f64; 2] {
        self.state.center
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Set the zoom, clamped to the configured range. Rejects non-finite values.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if !zoom.is_finite() {
            log::warn!("Rejected non-finite zoom {}", zoom);
            return false;
        }
        self.state.zoom = self.clamp_zoom(zoom);
        true
    }

    /// Set the center, clamped to the Mercator band. Rejects non-finite values.
    pub fn set_center(&mut self, center: [f64; 2]) -> bool {
        if !(center[0].is_finite() && center[1].is_finite()) {
            log::warn!("Rejected non-finite center {:?}", center);
            return false;
        }
        self.state.center = clamp_lng_lat(center);
        true
    }

    pub fn reset_to_safe(&mut self) {
        self.state = self.safe;
    }

    /// Put back a state previously read from [`Camera::state`]
    pub fn restore(&mut self, state: CameraState) {
        self.state = state;
    }

    /// Pixels per world unit at the current zoom
    pub fn world_size(&self) -> f64 {
        self.tile_size * 2f64.powf(self.state.zoom)
    }

    pub fn center_world(&self) -> [f64; 2] {
        to_world(self.state.center[0], self.state.center[1])
    }

    pub fn screen_to_world(&self, point: [f64; 2], viewport: &Viewport) -> [f64; 2] {
        let ws = self.world_size();
        let [cx, cy] = self.center_world();
        [
            (point[0] - viewport.width / 2.0) / ws + cx,
            (point[1] - viewport.height / 2.0) / ws + cy,
        ]
    }

    pub fn world_to_screen(&self, world: [f64; 2], viewport: &Viewport) -> [f64; 2] {
        let ws = self.world_size();
        let [cx, cy] = self.center_world();
        [
            (world[0] - cx) * ws + viewport.width / 2.0,
            (world[1] - cy) * ws + viewport.height / 2.0,
        ]
    }

    pub fn screen_to_lng_lat(&self, point: [f64; 2], viewport: &Viewport) -> [f64; 2] {
        let [wx, wy] = self.screen_to_world(point, viewport);
        to_geographic(wx, wy)
    }

    /// Screen position of a [longitude, latitude]
    pub fn project(&self, lng_lat: [f64; 2], viewport: &Viewport) -> [f64; 2] {
        self.world_to_screen(to_world(lng_lat[0], lng_lat[1]), viewport)
    }

    /// Uniform for the current camera, None (with a warning) on degenerate input
    pub fn uniform(&self, viewport: &Viewport) -> Option<CameraUniform> {
        if !viewport.is_valid() {
            log::warn!("Invalid viewport for uniform update: {:?}", viewport);
            return None;
        }
        if !self.state.is_finite() {
            log::warn!("Invalid camera state for uniform update: {:?}", self.state);
            return None;
        }

        let ws = self.world_size();
        let scale = [ws * 2.0 / viewport.width, -(ws * 2.0) / viewport.height];
        let center = self.center_world();
        if !(scale[0].is_finite() && scale[1].is_finite()) || ws <= 0.0 {
            log::warn!("Invalid uniform scale {:?} at world size {}", scale, ws);
            return None;
        }

        Some(CameraUniform::new(scale, center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera(zoom: f64) -> Camera {
        Camera::new(
            &ViewState {
                longitude: 138.0,
                latitude: 36.0,
                zoom,
            },
            &MapConfig::default(),
        )
    }

    #[test]
    fn test_initial_view_is_clamped() {
        let cam = Camera::new(
            &ViewState {
                longitude: 200.0,
                latitude: 89.0,
                zoom: 20.0,
            },
            &MapConfig::default(),
        );
        assert_eq!(cam.zoom(), 10.0);
        assert_eq!(cam.center()[0], 180.0);
        assert_abs_diff_eq!(cam.center()[1], 85.05112877980659, epsilon = 1e-12);
        assert_eq!(cam.safe_state(), cam.state());

        let cam = Camera::new(
            &ViewState {
                longitude: f64::NAN,
                latitude: 10.0,
                zoom: f64::INFINITY,
            },
            &MapConfig::default(),
        );
        assert_eq!(cam.state(), CameraState { zoom: 4.0, center: [0.0, 0.0] });
    }

    #[test]
    fn test_center_of_viewport_is_camera_center() {
        let cam = camera(6.0);
        let viewport = Viewport::new(800.0, 600.0, 2.0);
        let ll = cam.screen_to_lng_lat(viewport.center(), &viewport);
        assert_abs_diff_eq!(ll[0], 138.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ll[1], 36.0, epsilon = 1e-9);

        let p = cam.project([138.0, 36.0], &viewport);
        assert_abs_diff_eq!(p[0], 400.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p[1], 300.0, epsilon = 1e-6);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let cam = camera(7.5);
        let viewport = Viewport::new(1024.0, 768.0, 1.0);
        let point = [100.0, 700.0];
        let back = cam.world_to_screen(cam.screen_to_world(point, &viewport), &viewport);
        assert_abs_diff_eq!(back[0], point[0], epsilon = 1e-6);
        assert_abs_diff_eq!(back[1], point[1], epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_matches_projection() {
        let cam = camera(5.0);
        let viewport = Viewport::new(800.0, 400.0, 1.0);
        let uniform = cam.uniform(&viewport).unwrap();
        let ws = 512.0 * 32.0;
        assert_abs_diff_eq!(uniform.scale()[0] as f64, 2.0 * ws / 800.0, epsilon = 1e-3);
        assert_abs_diff_eq!(uniform.scale()[1] as f64, -2.0 * ws / 400.0, epsilon = 1e-3);
        let cw = cam.center_world();
        assert_abs_diff_eq!(uniform.center()[0] as f64, cw[0], epsilon = 1e-6);

        assert!(cam.uniform(&Viewport::new(0.0, 400.0, 1.0)).is_none());
    }

    #[test]
    fn test_setters_reject_non_finite() {
        let mut cam = camera(5.0);
        assert!(!cam.set_zoom(f64::NAN));
        assert!(!cam.set_center([f64::INFINITY, 0.0]));
        assert_eq!(cam.zoom(), 5.0);

        assert!(cam.set_zoom(0.5));
        assert_eq!(cam.zoom(), 4.0);
        assert!(cam.set_center([-190.0, -89.0]));
        assert_eq!(cam.center()[0], -180.0);

        cam.reset_to_safe();
        assert_eq!(cam.state(), cam.safe_state());
    }

    #[test]
    fn test_restore_puts_back_saved_state() {
        let mut cam = camera(6.0);
        let saved = cam.state();
        assert!(cam.set_zoom(9.0));
        assert!(cam.set_center([140.0, 40.0]));
        cam.restore(saved);
        assert_eq!(cam.state(), saved);
        assert_eq!(cam.safe_state(), saved);
    }

    #[test]
    fn test_physical_size_floors() {
        assert_eq!(Viewport::new(333.3, 100.0, 1.5).physical_size(), (499, 150));
        assert_eq!(Viewport::new(0.2, 0.2, 1.0).physical_size(), (1, 1));
        assert!(!Viewport::default().is_valid());
    }
}
