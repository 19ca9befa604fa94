//! Map configuration and the initial view

use serde::{Deserialize, Serialize};

use crate::draw::generation::{DEFAULT_BORDER_COLOR, DEFAULT_CLEAR_COLOR};
use crate::draw::geometry::HitTestMode;

/// Tunables for one map instance
///
/// Every field has a default, so a partial JSON object (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Pixels spanned by the whole world at zoom 0
    pub tile_size: f64,
    /// Zoom change per 100 wheel units
    pub wheel_zoom_rate: f64,
    /// Drag moves smaller than this on both axes are ignored
    pub drag_threshold_px: f64,
    pub border_color: [f32; 4],
    pub clear_color: [f32; 4],
    pub hit_test: HitTestMode,
    pub reinit_delay_ms: u64,
    pub max_reinit_attempts: u32,
    /// Consecutive rejected camera updates before falling back to the safe state
    pub max_failed_updates: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_zoom: 4.0,
            max_zoom: 10.0,
            tile_size: 512.0,
            wheel_zoom_rate: 0.1,
            drag_threshold_px: 0.5,
            border_color: DEFAULT_BORDER_COLOR,
            clear_color: DEFAULT_CLEAR_COLOR,
            hit_test: HitTestMode::AnyRing,
            reinit_delay_ms: 1000,
            max_reinit_attempts: 3,
            max_failed_updates: 3,
        }
    }
}

impl MapConfig {
    /// Zoom bounds in ascending order; a non-finite bound falls back to its default
    pub fn zoom_range(&self) -> (f64, f64) {
        let defaults = MapConfig::default();
        let min = if self.min_zoom.is_finite() { self.min_zoom } else { defaults.min_zoom };
        let max = if self.max_zoom.is_finite() { self.max_zoom } else { defaults.max_zoom };
        if min <= max {
            (min, max)
        } else {
            log::warn!("min_zoom {} > max_zoom {}, swapping", min, max);
            (max, min)
        }
    }
}

/// Caller-supplied initial camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl Default for ViewState {
    /// Centered on Japan
    fn default() -> Self {
        Self {
            longitude: 138.0,
            latitude: 37.5,
            zoom: 5.0,
        }
    }
}
