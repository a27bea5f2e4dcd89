//! Angle wrapping and rounding helpers

use std::f64::consts::PI;

/// Wrap an angle to [0, 2*pi)
pub fn wrap_to_2pi(angle: f64) -> f64 {
    let wrapped = angle % (2.0 * PI);
    if wrapped < 0.0 {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Wrap an angle to [-pi, pi]
pub fn wrap_to_pi(angle: f64) -> f64 {
    angle - (2.0 * PI) * (angle / (2.0 * PI)).round()
}

/// Absolute angular difference, wrapped to [0, pi]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = wrap_to_2pi(a - b);
    d.min(2.0 * PI - d)
}

/// Round a value to the nearest multiple of `resolution`
pub fn round_to_resolution(value: f64, resolution: f64) -> i32 {
    ((value / resolution).round() * resolution) as i32
}
