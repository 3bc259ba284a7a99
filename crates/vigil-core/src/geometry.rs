//! Geometric helpers over normalized image-space landmarks.

use nalgebra::{Point2, Vector2};

use crate::types::Landmark;

/// 2D midpoint of two landmarks (image plane only)
pub fn midpoint(a: &Landmark, b: &Landmark) -> Point2<f64> {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn average_y(a: &Landmark, b: &Landmark) -> f64 {
    (a.y + b.y) / 2.0
}

/// Horizontal distance between two landmarks
pub fn horizontal_span(a: &Landmark, b: &Landmark) -> f64 {
    (a.x - b.x).abs()
}

/// Angle of the segment `from -> to` relative to the image x-axis, in degrees.
///
/// Uses `atan2(dy, dx)`, so the result lies in `(-180, 180]`. A vertical
/// segment pointing down the frame reads `90`, a horizontal one `0` or `180`.
pub fn segment_angle_degrees(from: &Point2<f64>, to: &Point2<f64>) -> f64 {
    let delta: Vector2<f64> = to - from;
    delta.y.atan2(delta.x).to_degrees()
}
