//! f32 specializations of the euclid types used across the workspace.

pub use euclid::Point2D;
pub use euclid::Vector2D;

/// An angle in radians.
///
/// Normalization helpers come from euclid: `positive()` maps to `[0, 2π)`
/// and `signed()` maps to `(-π, π]`. Equality is exact on the stored
/// radians, and a NaN input propagates through arithmetic.
pub type Angle = euclid::Angle<f32>;

/// Alias for `euclid::default::Point2D<f32>`, interpreted as a position.
pub type Point = euclid::default::Point2D<f32>;

/// Alias for `euclid::default::Vector2D<f32>`.
pub type Vector = euclid::default::Vector2D<f32>;

/// Alias for `euclid::default::Box2D<f32>`: an axis-aligned rectangle
/// described by its minimum and maximum corners.
pub type Box2D = euclid::default::Box2D<f32>;

/// Alias for `euclid::default::Transform2D<f32>`.
pub type Transform = euclid::default::Transform2D<f32>;

/// Shorthand for `Point::new`.
#[inline]
pub fn point(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

/// Shorthand for `Vector::new`.
#[inline]
pub fn vector(x: f32, y: f32) -> Vector {
    Vector::new(x, y)
}

/// Shorthand for `Angle::radians`.
#[inline]
pub fn rad(radians: f32) -> Angle {
    Angle::radians(radians)
}
