pub mod consts;

pub mod tuple;
pub mod ray;
pub mod light;

pub mod geometry;
pub mod shape;
pub mod intersect;

pub mod tracer;
pub mod sampling;
pub mod camera;
pub mod parallel;

pub mod color;
pub mod canvas;
pub mod scene;

use consts::{ FEQ_EPSILON, ZERO_EPSILON };

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}

/// Checks whether a value is close enough to zero to be treated as zero.
pub fn is_zero(value: f64) -> bool {
    value.abs() < ZERO_EPSILON
}

/// Snaps values that are numerically zero to exactly `0.0`.
///
/// Geometric tests compare signs (`t > 0`, `nl * nv > 0`); without snapping,
/// rounding noise around zero would flip those comparisons.
pub fn align_zero(value: f64) -> f64 {
    if is_zero(value) { 0.0 } else { value }
}

#[test]
fn align_zero_snaps_noise() {
    assert_eq!(align_zero(1e-12), 0.0);
    assert_eq!(align_zero(-1e-12), 0.0);
    assert_eq!(align_zero(0.5), 0.5);
    assert!(is_zero(-3e-11));
    assert!(!is_zero(1e-6));
}
