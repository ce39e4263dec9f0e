use crate::math::{point, vector, Angle, Box2D, Point};

/// Returns the four corners of an axis-aligned box in counter-clockwise
/// order starting from the maximum corner.
pub fn box_corners(b: &Box2D) -> [Point; 4] {
    [
        b.max,
        point(b.min.x, b.max.y),
        b.min,
        point(b.max.x, b.min.y),
    ]
}

#[inline]
pub fn box_from_center_and_dimensions(center: Point, width: f32, height: f32) -> Box2D {
    let half = vector(0.5 * width, 0.5 * height);
    Box2D::new(center - half, center + half)
}

/// A parallelogram defined by a center, dimensions, a rotation and a
/// horizontal shear factor.
///
/// The shear is applied before the rotation: a corner at offset `(x, y)`
/// from the center maps to `(x + shear_factor * y, y)` and is then rotated
/// by `rotation`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Quad {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    pub rotation: Angle,
    pub shear_factor: f32,
}

impl Quad {
    pub fn from_center_and_dimensions(center: Point, width: f32, height: f32) -> Self {
        Quad {
            center,
            width,
            height,
            rotation: Angle::radians(0.0),
            shear_factor: 0.0,
        }
    }

    /// Returns the corners in counter-clockwise order (for non-negative
    /// dimensions), starting from the pre-rotation (+x, +y) corner.
    pub fn corners(&self) -> [Point; 4] {
        let half_width = 0.5 * self.width;
        let half_height = 0.5 * self.height;
        let (sin, cos) = self.rotation.radians.sin_cos();
        let corner = |x: f32, y: f32| {
            let sheared_x = x + self.shear_factor * y;
            self.center + vector(sheared_x * cos - y * sin, sheared_x * sin + y * cos)
        };
        [
            corner(half_width, half_height),
            corner(-half_width, half_height),
            corner(-half_width, -half_height),
            corner(half_width, -half_height),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_point(a: Point, b: Point) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn axis_aligned_quad_corners() {
        let q = Quad::from_center_and_dimensions(point(1.0, 2.0), 4.0, 2.0);
        let corners = q.corners();
        assert!(approx_point(corners[0], point(3.0, 3.0)));
        assert!(approx_point(corners[1], point(-1.0, 3.0)));
        assert!(approx_point(corners[2], point(-1.0, 1.0)));
        assert!(approx_point(corners[3], point(3.0, 1.0)));
    }

    #[test]
    fn sheared_quad_corners() {
        let q = Quad {
            center: point(0.0, 0.0),
            width: 2.0,
            height: 2.0,
            rotation: Angle::radians(0.0),
            shear_factor: 1.0,
        };
        let corners = q.corners();
        assert!(approx_point(corners[0], point(2.0, 1.0)));
        assert!(approx_point(corners[2], point(-2.0, -1.0)));
    }

    #[test]
    fn rotated_quad_corners() {
        let q = Quad {
            center: point(0.0, 0.0),
            width: 2.0,
            height: 2.0,
            rotation: Angle::radians(std::f32::consts::FRAC_PI_2),
            shear_factor: 0.0,
        };
        let corners = q.corners();
        assert!(approx_point(corners[0], point(-1.0, 1.0)));
        assert!(approx_point(corners[3], point(1.0, 1.0)));
    }
}
