//! Azimuths and quadrant bearings
//!
//! Azimuths are measured clockwise from grid north, so the arguments to
//! `atan2` are `(dx, dy)` rather than the usual `(dy, dx)`.

use geo::Coord;
use std::f64::consts::TAU;

/// Azimuth from `from` to `to` in radians, in `[0, 2π)`.
///
/// Coincident points give 0.
pub fn azimuth(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let az = dx.atan2(dy);
    if az < 0.0 {
        az + TAU
    } else {
        az
    }
}

/// Quadrant bearing for an azimuth in radians, e.g. `"S 30.0000° E"`.
pub fn bearing(azimuth_rad: f64, precision: usize) -> String {
    bearing_from_degrees(azimuth_rad.to_degrees(), precision)
}

/// Quadrant bearing for an azimuth in degrees.
///
/// Quadrants are half-open: 90° reads `S 90° E`, 180° reads `S 0° W`,
/// 270° reads `N 90° W`.
pub fn bearing_from_degrees(azimuth_deg: f64, precision: usize) -> String {
    let az = azimuth_deg.rem_euclid(360.0);
    let (ns, angle, ew) = if az < 90.0 {
        ('N', az, 'E')
    } else if az < 180.0 {
        ('S', 180.0 - az, 'E')
    } else if az < 270.0 {
        ('S', az - 180.0, 'W')
    } else {
        ('N', 360.0 - az, 'W')
    };
    format!("{} {:.*}° {}", ns, precision, angle, ew)
}
