//! Small 2D helpers on top of glam.

use glam::Vec2;

/// Cross product of a scalar (angular velocity) with a vector: `s × v`.
#[inline]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// Cross product of a vector with a scalar: `v × s`.
#[inline]
pub fn cross_vs(v: Vec2, s: f32) -> Vec2 {
    Vec2::new(s * v.y, -s * v.x)
}

/// Per-component sign where zero stays zero.
#[inline]
pub fn sign_or_zero(v: Vec2) -> Vec2 {
    Vec2::new(scalar_sign_or_zero(v.x), scalar_sign_or_zero(v.y))
}

#[inline]
fn scalar_sign_or_zero(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sign of `x`, treating zero as positive.
#[inline]
pub fn sign_non_zero(x: f32) -> f32 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}
