use std::f64::consts::PI;

#[inline(always)]
pub fn pi(v: f64) -> f64 {
    PI * v
}

/// Floored remainder: the result carries the sign of `m`.
pub fn modulo(n: f64, m: f64) -> f64 {
    ((n % m) + m) % m
}

/// Normalizes an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    modulo(degrees, 360.0)
}

/// Size of the axis-aligned box that holds a `width` x `height` rectangle rotated by `theta`
/// radians about its center. Both sides are at least 1, so the result is always a valid canvas
/// size.
pub fn rotated_extent(width: i32, height: i32, theta: f64) -> (i32, i32) {
    let (sin, cos) = theta.sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let (w, h) = (f64::from(width), f64::from(height));
    let new_w = (w * cos + h * sin).round() as i32;
    let new_h = (w * sin + h * cos).round() as i32;
    (new_w.max(1), new_h.max(1))
}
