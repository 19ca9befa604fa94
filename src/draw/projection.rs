//! Web Mercator projection between geographic and world coordinates
//!
//! World coordinates are a normalized square: x grows east from 0 at -180°,
//! y grows south from 0 at the northern Mercator limit. Both functions are
//! total: non-finite input produces a fixed fallback instead of NaN, because a
//! single NaN vertex silently corrupts a whole triangulation.

use std::f64::consts::PI;

/// Latitude at which Web Mercator maps to the edge of the unit square
pub const MERCATOR_MAX_LATITUDE: f64 = 85.05112877980659;

/// Fallback for `to_world` when the input is not finite (world center)
pub const WORLD_FALLBACK: [f64; 2] = [0.5, 0.5];

/// Fallback for `to_geographic` when the input is not finite (null island)
pub const GEOGRAPHIC_FALLBACK: [f64; 2] = [0.0, 0.0];

/// Wrap a longitude into [-180, 180)
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Clamp a latitude into the Mercator-safe band
pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE)
}

/// Clamp a [lon, lat] pair to [-180, 180] x Mercator band (no wrapping)
pub fn clamp_lng_lat(lng_lat: [f64; 2]) -> [f64; 2] {
    [lng_lat[0].clamp(-180.0, 180.0), clamp_latitude(lng_lat[1])]
}

/// Project longitude/latitude (degrees) into world units in [0, 1]
pub fn to_world(lon: f64, lat: f64) -> [f64; 2] {
    if !lon.is_finite() || !lat.is_finite() {
        log::warn!("to_world: non-finite input lon={lon} lat={lat}, using world center");
        return WORLD_FALLBACK;
    }

    let lon = normalize_longitude(lon);
    let lat = clamp_latitude(lat);

    let x = (lon + 180.0) / 360.0;
    let sin_lat = (lat * PI / 180.0).sin();
    let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);

    if !x.is_finite() || !y.is_finite() {
        log::warn!("to_world: projection diverged for lon={lon} lat={lat}");
        return WORLD_FALLBACK;
    }

    [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]
}

/// Inverse projection: world units back to longitude/latitude (degrees)
pub fn to_geographic(x: f64, y: f64) -> [f64; 2] {
    if !x.is_finite() || !y.is_finite() {
        log::warn!("to_geographic: non-finite input x={x} y={y}, using origin");
        return GEOGRAPHIC_FALLBACK;
    }

    let x = x.clamp(0.0, 1.0);
    let y = y.clamp(0.0, 1.0);

    let lon = x * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y;
    let lat = n.sinh().atan().to_degrees();

    let lon = lon.clamp(-180.0, 180.0);
    let lat = clamp_latitude(lat);

    if !lon.is_finite() || !lat.is_finite() {
        log::warn!("to_geographic: inverse diverged for x={x} y={y}");
        return GEOGRAPHIC_FALLBACK;
    }

    [lon, lat]
}
