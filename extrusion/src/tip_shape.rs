use crate::rounded_polygon::RoundedPolygon;
use crate::tip_state::TipState;

use arrayvec::ArrayVec;
use tracery_geom::math::{vector, Angle, Box2D, Point};
use tracery_geom::{Circle, Envelope};

/// The analytic footprint of the brush tip for one `TipState`: the convex
/// hull of 1 to 4 "perimeter" circles stored counter-clockwise around the
/// center.
///
/// All perimeter circles share the corner radius, so no perimeter circle
/// can contain a neighbor; pairs closer than the construction threshold
/// are merged instead.
#[derive(Clone, Debug)]
pub struct TipShape {
    center: Point,
    circles: ArrayVec<[Circle; 4]>,
}

/// For two shapes connected by external tangents: the perimeter-circle
/// index on each shape touched by the left and right tangent of the joined
/// hull.
///
/// `left.0` indexes the first shape's circles and `left.1` the second
/// shape's; the joined hull is traversed counter-clockwise from `left.0`
/// to `right.0` on the first shape, jumping to `right.1` and continuing to
/// `left.1` on the second.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TangentCircleIndices {
    pub left: (usize, usize),
    pub right: (usize, usize),
}

/// One side's tangent between two shapes: the touched circle on each
/// shape and the shared tangent angle.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SideTangent {
    pub first: usize,
    pub second: usize,
    pub angle: Angle,
}

impl TipShape {
    /// Builds the shape for `state`, centered at `state.position`.
    ///
    /// `min_nonzero_radius_and_separation` is the smallest meaningful
    /// non-zero radius or center separation: smaller radii clamp to zero
    /// and closer circles merge into one (midpoint, larger radius).
    ///
    /// A negative or non-finite width or height collapses that dimension
    /// to zero: interpolating shape attributes while constraining can
    /// force a size negative, and interpolating an infinite size produces
    /// NaN. `corner_rounding` and `pinch` must be within [0, 1].
    pub fn new(state: &TipState, min_nonzero_radius_and_separation: f32) -> TipShape {
        assert!(
            (0.0..=1.0).contains(&state.corner_rounding),
            "corner_rounding outside [0, 1]"
        );
        assert!((0.0..=1.0).contains(&state.pinch), "pinch outside [0, 1]");

        let eps = min_nonzero_radius_and_separation;
        let center = state.position;
        let mut circles = ArrayVec::new();

        if !(center.x.is_finite() && center.y.is_finite()) {
            // Degenerate input; the shape collapses to a point at the
            // (possibly NaN) center and extrusion proceeds.
            circles.push(Circle::new(center, 0.0));
            return TipShape { center, circles };
        }

        let width = if state.width.is_finite() && state.width > 0.0 {
            state.width
        } else {
            0.0
        };
        let height = if state.height.is_finite() && state.height > 0.0 {
            state.height
        } else {
            0.0
        };

        let mut radius = 0.5 * width.min(height) * state.corner_rounding;
        if radius < eps {
            radius = 0.0;
        }

        let mut x = 0.5 * width - radius;
        let mut y = 0.5 * height - radius;
        // Corner pairs whose separation cannot reach the threshold
        // collapse onto the relevant axis up front.
        if 2.0 * x < eps {
            x = 0.0;
        }
        if 2.0 * y < eps {
            y = 0.0;
        }
        let pinched_x = x * (1.0 - state.pinch);

        let (slant_sin, slant_cos) = state.slant.radians.sin_cos();
        let (rot_sin, rot_cos) = state.rotation.radians.sin_cos();
        let corner = |corner_x: f32, corner_y: f32| -> Point {
            let sheared_x = corner_x - corner_y * slant_sin;
            let sheared_y = corner_y * slant_cos;
            center
                + vector(
                    sheared_x * rot_cos - sheared_y * rot_sin,
                    sheared_x * rot_sin + sheared_y * rot_cos,
                )
        };

        circles.push(Circle::new(corner(x, y), radius));
        circles.push(Circle::new(corner(-x, y), radius));
        circles.push(Circle::new(corner(-pinched_x, -y), radius));
        circles.push(Circle::new(corner(pinched_x, -y), radius));

        merge_close_circles(&mut circles, eps);
        TipShape { center, circles }
    }

    /// The center position, equal to the position of the `TipState` used
    /// to construct the shape.
    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    /// The 1 to 4 circles making up the shape's perimeter, in
    /// counter-clockwise order.
    #[inline]
    pub fn perimeter_circles(&self) -> &[Circle] {
        &self.circles
    }

    #[inline]
    pub(crate) fn circle(&self, index: usize) -> &Circle {
        &self.circles[index]
    }

    /// The index of the next perimeter circle counter-clockwise from
    /// `index`.
    #[inline]
    pub fn next_ccw(&self, index: usize) -> usize {
        (index + 1) % self.circles.len()
    }

    /// The index of the next perimeter circle clockwise from `index`.
    #[inline]
    pub fn next_cw(&self, index: usize) -> usize {
        (index + self.circles.len() - 1) % self.circles.len()
    }

    /// The minimum bounding rectangle of the shape.
    pub fn bounds(&self) -> Box2D {
        let mut envelope = Envelope::new();
        for circle in &self.circles {
            let r = vector(circle.radius(), circle.radius());
            envelope.add_point(circle.center() - r);
            envelope.add_point(circle.center() + r);
        }
        *envelope.as_box().expect("shape has at least one circle")
    }

    /// Returns true if this shape completely contains `other`, touching
    /// boundaries included. A shape always contains itself.
    pub fn contains(&self, other: &TipShape) -> bool {
        if self.circles.len() == 1 {
            let boundary = &self.circles[0];
            return other.circles.iter().all(|c| boundary.contains(c));
        }
        let hull = RoundedPolygon::new(&self.circles);
        other.circles.iter().all(|c| hull.contains_circle(c))
    }

    /// Calculates the perimeter circles of `first` and `second` that the
    /// external tangents of the joined hull touch.
    ///
    /// Neither shape may contain the other.
    pub fn tangent_circle_indices(first: &TipShape, second: &TipShape) -> TangentCircleIndices {
        let (left, right) = tangent_sides(first, second);
        TangentCircleIndices {
            left: (left.first, left.second),
            right: (right.first, right.second),
        }
    }
}

fn merge_close_circles(circles: &mut ArrayVec<[Circle; 4]>, eps: f32) {
    let mut i = 0;
    while circles.len() > 1 && i < circles.len() {
        let j = (i + 1) % circles.len();
        let a = circles[i];
        let b = circles[j];
        let separation = (b.center() - a.center()).length();
        if separation < eps || separation == 0.0 {
            let merged = Circle::new(
                a.center() + (b.center() - a.center()) * 0.5,
                a.radius().max(b.radius()),
            );
            let keep = i.min(j);
            let remove = i.max(j);
            circles[keep] = merged;
            circles.remove(remove);
            i = 0;
        } else {
            i += 1;
        }
    }
}

/// Finds the left and right tangents between two shapes.
///
/// Each candidate circle pair's external tangent is tested as a support
/// line of both shapes; among supporting pairs, the tie goes on each shape
/// to the circle whose center projects furthest opposite the travel
/// direction along the tangent, which keeps the joined walk deterministic
/// when corners are collinear or coincident.
pub(crate) fn tangent_sides(first: &TipShape, second: &TipShape) -> (SideTangent, SideTangent) {
    debug_assert!(
        !first.contains(second) && !second.contains(first),
        "tangent indices require mutually non-containing shapes"
    );

    let scale = max_absolute_coordinate(first).max(max_absolute_coordinate(second));
    let tolerance = (scale * 1e-5).max(f32::MIN_POSITIVE);

    let left = best_tangent_pair(first, second, /* left_side = */ true, tolerance);
    let right = best_tangent_pair(first, second, /* left_side = */ false, tolerance);
    (left, right)
}

fn max_absolute_coordinate(shape: &TipShape) -> f32 {
    let bounds = shape.bounds();
    bounds
        .min
        .x
        .abs()
        .max(bounds.min.y.abs())
        .max(bounds.max.x.abs())
        .max(bounds.max.y.abs())
}

fn best_tangent_pair(
    first: &TipShape,
    second: &TipShape,
    left_side: bool,
    tolerance: f32,
) -> SideTangent {
    struct Candidate {
        tangent: SideTangent,
        first_projection: f32,
        second_projection: f32,
    }

    let mut best: Option<Candidate> = None;
    // Kept as a fallback in case floating-point noise rejects every pair.
    let mut least_violating: Option<(f32, SideTangent)> = None;

    let shape_travel = second.center() - first.center();
    let side_sign = if left_side { 1.0 } else { -1.0 };

    for (i, ci) in first.perimeter_circles().iter().enumerate() {
        for (j, cj) in second.perimeter_circles().iter().enumerate() {
            let angles = match ci.tangent_angles(cj) {
                Some(angles) => angles,
                None => continue,
            };
            let angle = if left_side { angles.left } else { angles.right };
            let (sin, cos) = angle.radians.sin_cos();
            let normal = vector(cos, sin);

            // The outward normal of a side tangent points to that side of
            // the travel between the shape centers; support lines facing
            // forward or backward belong to the caps, not to a side. With
            // coincident centers every orientation passes and the
            // projection tie-break below decides alone.
            if shape_travel.cross(normal) * side_sign < 0.0
                || (shape_travel.cross(normal) == 0.0
                    && shape_travel.square_length() > 0.0)
            {
                continue;
            }

            let support = normal.dot(ci.center().to_vector()) + ci.radius();

            let mut violation = 0.0f32;
            for c in first
                .perimeter_circles()
                .iter()
                .chain(second.perimeter_circles())
            {
                let overhang = normal.dot(c.center().to_vector()) + c.radius() - support;
                violation = violation.max(overhang);
            }

            let tangent = SideTangent {
                first: i,
                second: j,
                angle,
            };
            if violation > tolerance {
                if least_violating
                    .as_ref()
                    .map_or(true, |(v, _)| violation < *v)
                {
                    least_violating = Some((violation, tangent));
                }
                continue;
            }

            // Travel direction along the tangent line.
            let travel = if left_side {
                vector(normal.y, -normal.x)
            } else {
                vector(-normal.y, normal.x)
            };
            let first_projection = travel.dot(ci.center().to_vector());
            let second_projection = travel.dot(cj.center().to_vector());
            let better = match &best {
                None => true,
                Some(current) => {
                    if first_projection < current.first_projection - tolerance {
                        true
                    } else if first_projection > current.first_projection + tolerance {
                        false
                    } else {
                        second_projection < current.second_projection - tolerance
                    }
                }
            };
            if better {
                best = Some(Candidate {
                    tangent,
                    first_projection,
                    second_projection,
                });
            }
        }
    }

    if let Some(candidate) = best {
        return candidate.tangent;
    }
    // Every pair overhangs somewhere; return the least bad one rather
    // than none, since callers have already ruled out containment.
    least_violating
        .map(|(_, tangent)| tangent)
        .unwrap_or(SideTangent {
            first: 0,
            second: 0,
            angle: Angle::radians(0.0),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use tracery_geom::math::point;

    fn shape(state: TipState) -> TipShape {
        TipShape::new(&state, 0.0)
    }

    fn circle_near(c: &Circle, center: Point, radius: f32, tolerance: f32) -> bool {
        (c.center() - center).length() <= tolerance && (c.radius() - radius).abs() <= tolerance
    }

    #[test]
    fn constructed_forming_circle() {
        let s = shape(TipState {
            position: point(5.0, 3.0),
            width: 14.0,
            height: 14.0,
            corner_rounding: 1.0,
            ..TipState::default()
        });
        assert_eq!(s.center(), point(5.0, 3.0));
        assert_eq!(s.perimeter_circles().len(), 1);
        assert!(circle_near(&s.perimeter_circles()[0], point(5.0, 3.0), 7.0, 1e-5));
        assert_eq!(s.next_ccw(0), 0);
        assert_eq!(s.next_cw(0), 0);
    }

    #[test]
    fn constructed_forming_stadium() {
        let s = shape(TipState {
            position: point(1.0, 1.0),
            width: 4.0,
            height: 2.0,
            corner_rounding: 1.0,
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 2);
        assert!(circle_near(&circles[0], point(2.0, 1.0), 1.0, 1e-5));
        assert!(circle_near(&circles[1], point(0.0, 1.0), 1.0, 1e-5));
    }

    #[test]
    fn constructed_forming_rectangle() {
        let s = shape(TipState {
            position: point(2.0, 3.0),
            width: 8.0,
            height: 8.0 / 3.0,
            corner_rounding: 0.0,
            rotation: Angle::radians(2.0 * PI / 6.0),
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 4);
        assert!(circle_near(&circles[0], point(2.85, 7.13), 0.0, 0.01));
        assert!(circle_near(&circles[1], point(-1.15, 0.20), 0.0, 0.01));
        assert!(circle_near(&circles[2], point(1.15, -1.13), 0.0, 0.01));
        assert!(circle_near(&circles[3], point(5.15, 5.80), 0.0, 0.01));
    }

    #[test]
    fn constructed_forming_pinched_quad() {
        let s = shape(TipState {
            position: point(0.0, 0.0),
            width: 9.0,
            height: 3.0,
            corner_rounding: 0.2,
            pinch: 0.3,
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 4);
        assert!(circle_near(&circles[0], point(4.2, 1.2), 0.3, 0.01));
        assert!(circle_near(&circles[1], point(-4.2, 1.2), 0.3, 0.01));
        assert!(circle_near(&circles[2], point(-2.94, -1.2), 0.3, 0.01));
        assert!(circle_near(&circles[3], point(2.94, -1.2), 0.3, 0.01));
    }

    #[test]
    fn pinch_collapses_back_corners_into_triangle() {
        let s = TipShape::new(
            &TipState {
                position: point(0.0, 0.0),
                width: 9.0,
                height: 3.0,
                corner_rounding: 0.0,
                pinch: 0.8,
                ..TipState::default()
            },
            2.0,
        );
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 3);
        assert!(circle_near(&circles[0], point(4.5, 1.5), 0.0, 0.01));
        assert!(circle_near(&circles[1], point(-4.5, 1.5), 0.0, 0.01));
        assert!(circle_near(&circles[2], point(0.0, -1.5), 0.0, 0.01));
    }

    #[test]
    fn min_separation_collapses_to_stadium() {
        let s = TipShape::new(
            &TipState {
                position: point(0.0, 0.0),
                width: 9.0,
                height: 3.0,
                corner_rounding: 0.99,
                pinch: 0.8,
                ..TipState::default()
            },
            1.2,
        );
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 2);
        assert!(circle_near(&circles[0], point(3.02, 0.0), 1.49, 0.01));
        assert!(circle_near(&circles[1], point(-3.02, 0.0), 1.49, 0.01));
    }

    #[test]
    fn constructed_forming_slanted_rectangle() {
        let s = shape(TipState {
            position: point(0.0, 0.0),
            width: 9.0,
            height: 3.0,
            corner_rounding: 0.2,
            slant: Angle::radians(2.0 * PI / 6.0),
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 4);
        assert!(circle_near(&circles[0], point(3.16, 0.6), 0.3, 0.01));
        assert!(circle_near(&circles[1], point(-5.24, 0.6), 0.3, 0.01));
        assert!(circle_near(&circles[2], point(-3.16, -0.6), 0.3, 0.01));
        assert!(circle_near(&circles[3], point(5.24, -0.6), 0.3, 0.01));
    }

    #[test]
    fn constructed_with_zero_width() {
        let s = shape(TipState {
            position: point(0.0, 0.0),
            width: 0.0,
            height: 4.0,
            corner_rounding: 0.5,
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 2);
        assert!(circle_near(&circles[0], point(0.0, 2.0), 0.0, 1e-5));
        assert!(circle_near(&circles[1], point(0.0, -2.0), 0.0, 1e-5));
    }

    #[test]
    fn constructed_with_zero_height() {
        let s = shape(TipState {
            position: point(0.0, 0.0),
            width: 4.0,
            height: 0.0,
            corner_rounding: 0.5,
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 2);
        assert!(circle_near(&circles[0], point(2.0, 0.0), 0.0, 1e-5));
        assert!(circle_near(&circles[1], point(-2.0, 0.0), 0.0, 1e-5));
    }

    #[test]
    fn constructed_with_zero_width_and_height() {
        let s = shape(TipState {
            position: point(5.0, 3.0),
            width: 0.0,
            height: 0.0,
            ..TipState::default()
        });
        assert_eq!(s.perimeter_circles().len(), 1);
        assert!(circle_near(&s.perimeter_circles()[0], point(5.0, 3.0), 0.0, 0.0));
    }

    #[test]
    fn constructed_with_infinite_size_collapses_to_a_point() {
        let s = shape(TipState {
            position: point(5.0, 3.0),
            width: f32::INFINITY,
            height: f32::INFINITY,
            corner_rounding: 0.0,
            ..TipState::default()
        });
        assert_eq!(s.center(), point(5.0, 3.0));
        assert_eq!(s.perimeter_circles().len(), 1);
        assert!(circle_near(&s.perimeter_circles()[0], point(5.0, 3.0), 0.0, 0.0));
    }

    #[test]
    fn constructed_with_negative_width_collapses_the_dimension() {
        // Extrapolating shape attributes between states can force a size
        // negative; the dimension degenerates instead of rejecting the
        // state.
        let s = shape(TipState {
            position: point(1.0, 2.0),
            width: -3.0,
            height: 4.0,
            corner_rounding: 0.5,
            ..TipState::default()
        });
        let circles = s.perimeter_circles();
        assert_eq!(circles.len(), 2);
        assert!(circle_near(&circles[0], point(1.0, 4.0), 0.0, 1e-5));
        assert!(circle_near(&circles[1], point(1.0, 0.0), 0.0, 1e-5));
    }

    #[test]
    fn constructed_with_nan_size_collapses_to_a_point() {
        // Interpolating an infinite size toward a finite one produces a
        // NaN width and height.
        let s = shape(TipState {
            position: point(2.0, 1.0),
            width: f32::NAN,
            height: f32::NAN,
            corner_rounding: 0.5,
            ..TipState::default()
        });
        assert_eq!(s.perimeter_circles().len(), 1);
        assert!(circle_near(&s.perimeter_circles()[0], point(2.0, 1.0), 0.0, 0.0));
    }

    #[test]
    fn constructed_with_nan_position() {
        let s = shape(TipState {
            position: point(f32::NAN, 0.0),
            width: 2.0,
            height: 2.0,
            ..TipState::default()
        });
        assert_eq!(s.perimeter_circles().len(), 1);
        assert_eq!(s.perimeter_circles()[0].radius(), 0.0);
    }

    fn circle_state(position: Point, size: f32) -> TipState {
        TipState {
            position,
            width: size,
            height: size,
            corner_rounding: 1.0,
            ..TipState::default()
        }
    }

    #[test]
    fn tangent_indices_of_two_circles() {
        let a = shape(circle_state(point(0.0, 0.0), 4.0));
        let b = shape(circle_state(point(1.0, 0.0), 4.0));
        let indices = TipShape::tangent_circle_indices(&a, &b);
        assert_eq!(indices.left, (0, 0));
        assert_eq!(indices.right, (0, 0));
    }

    #[test]
    fn tangent_indices_circle_and_stadium() {
        let circle = shape(circle_state(point(0.0, 0.0), 4.0));
        let stadium = shape(TipState {
            position: point(0.0, 1.0),
            width: 4.0,
            height: 2.0,
            corner_rounding: 1.0,
            ..TipState::default()
        });
        let indices = TipShape::tangent_circle_indices(&circle, &stadium);
        assert_eq!(indices.left, (0, 1));
        assert_eq!(indices.right, (0, 0));
    }

    #[test]
    fn tangent_indices_of_stadia() {
        let a = shape(TipState {
            position: point(0.0, 0.0),
            width: 2.0,
            height: 4.0,
            corner_rounding: 1.0,
            ..TipState::default()
        });
        let b = shape(TipState {
            position: point(1.0, 0.0),
            width: 2.0,
            height: 4.0,
            corner_rounding: 1.0,
            ..TipState::default()
        });
        let indices = TipShape::tangent_circle_indices(&a, &b);
        assert_eq!(indices.left, (0, 0));
        assert_eq!(indices.right, (1, 1));
    }

    #[test]
    fn tangent_indices_of_rectangles_with_collinear_corners() {
        let make = |x: f32| {
            shape(TipState {
                position: point(x, 0.0),
                width: 6.0,
                height: 8.0,
                corner_rounding: 0.25,
                ..TipState::default()
            })
        };
        let indices = TipShape::tangent_circle_indices(&make(0.0), &make(1.0));
        assert_eq!(indices.left, (1, 1));
        assert_eq!(indices.right, (2, 2));
    }

    #[test]
    fn tangent_indices_of_offset_sharp_rectangles() {
        let make = |p: Point| {
            shape(TipState {
                position: p,
                width: 6.0,
                height: 8.0,
                corner_rounding: 0.0,
                ..TipState::default()
            })
        };
        let indices = TipShape::tangent_circle_indices(&make(point(0.0, 0.0)), &make(point(1.0, 1.0)));
        assert_eq!(indices.left, (1, 1));
        assert_eq!(indices.right, (3, 3));
    }

    #[test]
    fn tangent_indices_with_corner_inside_other_shape() {
        let large_circle = TipShape::new(&circle_state(point(0.0, 0.0), 2.0), 1e-5);
        let small_square = TipShape::new(
            &TipState {
                position: point(0.8, -0.8),
                width: 0.25,
                height: 0.25,
                ..TipState::default()
            },
            1e-5,
        );
        let indices = TipShape::tangent_circle_indices(&large_circle, &small_square);
        assert_eq!(indices.left, (0, 3));
        assert_eq!(indices.right, (0, 3));
    }

    #[test]
    fn contains_self_and_smaller_shapes() {
        let big = shape(TipState {
            position: point(0.0, 0.0),
            width: 8.0,
            height: 6.0,
            corner_rounding: 0.25,
            ..TipState::default()
        });
        let small = shape(TipState {
            position: point(0.0, 0.0),
            width: 2.0,
            height: 4.0,
            corner_rounding: 0.25,
            ..TipState::default()
        });
        assert!(big.contains(&big));
        assert!(big.contains(&small));
        assert!(!small.contains(&big));
    }

    #[test]
    fn contains_is_false_for_distant_shapes() {
        let a = shape(circle_state(point(0.0, 0.0), 2.0));
        let b = shape(circle_state(point(10.0, 0.0), 2.0));
        assert!(!a.contains(&b));
        assert!(!b.contains(&a));
    }

    #[test]
    fn contains_circle_and_rounded_rectangle() {
        let rectangle = shape(TipState {
            position: point(0.0, 0.0),
            width: 6.0,
            height: 4.0,
            corner_rounding: 0.5,
            ..TipState::default()
        });
        assert!(rectangle.contains(&shape(circle_state(point(1.0, 0.0), 2.0))));
        assert!(!rectangle.contains(&shape(circle_state(point(2.5, 0.0), 2.0))));
    }
}
