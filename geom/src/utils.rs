//! Various math tools shared by the primitives and the extrusion crates.

use crate::math::{vector, Angle, Point, Vector};

use num_traits::Float;
use std::f32;

#[inline]
pub fn min_max(a: f32, b: f32) -> (f32, f32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Rotates `v` by 90 degrees counter-clockwise.
#[inline]
pub fn tangent(v: Vector) -> Vector {
    vector(-v.y, v.x)
}

#[inline]
pub fn lerp<S: Float>(a: S, b: S, t: S) -> S {
    a + (b - a) * t
}

#[inline]
pub fn point_lerp(a: Point, b: Point, t: f32) -> Point {
    a + (b - a) * t
}

/// Returns the ratio of two angles.
#[inline]
pub fn angle_ratio(numerator: Angle, denominator: Angle) -> f32 {
    numerator.radians / denominator.radians
}

/// Returns the unit vector pointing in the direction of `v`.
///
/// The edge cases are pinned down precisely because downstream tangent
/// computations rely on them:
///
/// - any NaN component makes both components of the result NaN;
/// - infinite components produce the unit vector in the direction
///   `atan2` assigns to those infinities;
/// - the zero vector maps to the unit x-axis, preserving the zero signs;
/// - finite nonzero vectors are pre-scaled before dividing by the
///   magnitude so that neither overflow to infinity nor subnormal
///   underflow to zero can occur.
pub fn unit_vector(v: Vector) -> Vector {
    if v.x.is_nan() || v.y.is_nan() {
        return vector(f32::NAN, f32::NAN);
    }

    if v.x.is_infinite() {
        if v.y.is_infinite() {
            let half_sqrt2 = 0.5 * f32::consts::SQRT_2;
            return vector(half_sqrt2.copysign(v.x), half_sqrt2.copysign(v.y));
        }
        return vector(1f32.copysign(v.x), 0f32.copysign(v.y));
    }
    if v.y.is_infinite() {
        return vector(0f32.copysign(v.x), 1f32.copysign(v.y));
    }

    if v.x == 0.0 && v.y == 0.0 {
        return vector(1f32.copysign(v.x), 0f32.copysign(v.y));
    }

    // Halving prevents the magnitude from overflowing when both components
    // are large, while the large factor keeps subnormal components from
    // underflowing the magnitude to zero.
    let factor = if v.x.is_normal() || v.y.is_normal() {
        0.5
    } else {
        (1u32 << 20) as f32
    };
    let scaled = v * factor;
    scaled / scaled.length()
}

/// Returns the absolute angle between `a` and `b`, in `[0, π]`.
pub fn absolute_angle_between(a: Vector, b: Vector) -> Angle {
    let dot = unit_vector(a).dot(unit_vector(b));
    Angle::radians(dot.clamp(-1.0, 1.0).acos())
}

/// Returns the signed angle that rotates `a` onto `b`, in `(-π, π]`.
///
/// The determinant decides the sign, except that an absolute angle of
/// exactly π is always returned positive: rounding can make the
/// determinant slightly negative while the arc-cosine already saturated,
/// and the result must stay strictly greater than -π.
pub fn signed_angle_between(a: Vector, b: Vector) -> Angle {
    let a_unit = unit_vector(a);
    let b_unit = unit_vector(b);
    let angle = Angle::radians(a_unit.dot(b_unit).clamp(-1.0, 1.0).acos());
    if angle.radians == f32::consts::PI || a_unit.cross(b_unit) >= 0.0 {
        angle
    } else {
        -angle
    }
}
