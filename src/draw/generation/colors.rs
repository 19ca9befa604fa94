//! Fill color assignment
//!
//! Maps a feature's visit progress onto the legend bands shown by the app.

/// Fill for features without a usable progress value
pub const NEUTRAL_FILL: [f32; 4] = [0.9, 0.9, 0.9, 1.0];

/// Default border color (dark navy)
pub const DEFAULT_BORDER_COLOR: [f32; 4] = [0.1, 0.15, 0.3, 1.0];

/// Default clear color (sea blue)
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.7, 0.85, 0.95, 1.0];

/// Get the fill color for a progress ratio
pub fn progress_to_color(progress: Option<f64>) -> [f32; 4] {
    let Some(p) = progress.filter(|p| p.is_finite()) else {
        return NEUTRAL_FILL;
    };
    if !(0.0..=1.0).contains(&p) {
        log::warn!("Progress {} outside [0, 1], clamping", p);
    }
    let p = p.clamp(0.0, 1.0);

    if p == 0.0 {
        [0.92, 0.95, 0.98, 0.95] // Light gray, distinct from the sea
    } else if p < 0.3 {
        [1.0, 0.87, 0.42, 0.95] // Light yellow
    } else if p < 0.6 {
        [1.0, 0.65, 0.35, 0.95] // Orange
    } else if p < 0.9 {
        [0.98, 0.45, 0.45, 0.95] // Light red
    } else {
        [0.2, 0.7, 0.5, 0.95] // Green
    }
}
