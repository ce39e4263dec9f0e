use crate::math::{vector, Angle, Point};

/// A circle, permitting the degenerate case where the radius equals zero.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Circle {
    center: Point,
    radius: f32,
}

/// The pair of angles at which the exterior tangents between two circles
/// meet the first circle.
///
/// The angles are labeled by splitting the plane into a "left" and "right"
/// side relative to the travel direction from the first circle's center
/// toward the second.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TangentAngles {
    pub left: Angle,
    pub right: Angle,
}

impl Circle {
    /// Constructs a circle with the given `center` and `radius`.
    ///
    /// The radius must be non-negative and not NaN; it may be infinite.
    pub fn new(center: Point, radius: f32) -> Self {
        debug_assert!(radius >= 0.0, "negative or NaN circle radius");
        Circle { center, radius }
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Returns the point on the circle at the given `angle`.
    #[inline]
    pub fn point_on(&self, angle: Angle) -> Point {
        let (sin, cos) = angle.radians.sin_cos();
        self.center + vector(cos * self.radius, sin * self.radius)
    }

    /// Returns true if this circle contains `other`, including the case
    /// where the two circles coincide.
    #[inline]
    pub fn contains(&self, other: &Circle) -> bool {
        (other.center - self.center).length() + other.radius <= self.radius
    }

    /// Computes the pair of angles at which the exterior tangents meet this
    /// circle and the `other` circle.
    ///
    /// Returns `None` when two distinct exterior tangents do not exist:
    /// coincident centers, one circle inside the other, or circles touching
    /// at a single point.
    pub fn tangent_angles(&self, other: &Circle) -> Option<TangentAngles> {
        let center_offset = other.center - self.center;
        let distance = center_offset.length();
        let delta_radius = self.radius - other.radius;

        if self.center == other.center || delta_radius.abs() >= distance {
            return None;
        }

        let offset_angle = Angle::radians((delta_radius / distance).acos());
        let reference_angle = center_offset.angle_from_x_axis();
        Some(TangentAngles {
            left: (reference_angle + offset_angle).signed(),
            right: (reference_angle - offset_angle).signed(),
        })
    }

    /// Returns the angle of the exterior tangent meeting this circle and
    /// `other` on their right sides relative to the direction of travel.
    ///
    /// Must only be called when the circles are known not to contain one
    /// another; this is the cheap half of `tangent_angles`.
    pub fn guaranteed_right_tangent_angle(&self, other: &Circle) -> Angle {
        debug_assert!(!self.contains(other));
        debug_assert!(!other.contains(self));
        let center_offset = other.center - self.center;
        let offset_angle =
            Angle::radians(((self.radius - other.radius) / center_offset.length()).acos());
        (center_offset.angle_from_x_axis() - offset_angle).signed()
    }

    /// Calculates the central angle of the arc whose chord has the given
    /// sagitta.
    ///
    /// The result is in [0, 2π); a chord height greater than the radius
    /// produces an angle greater than π, and a non-positive chord height
    /// produces zero.
    pub fn arc_angle_for_chord_height(&self, chord_height: f32) -> Angle {
        if self.radius == 0.0 {
            return Angle::radians(0.0);
        }
        Angle::radians(2.0 * (1.0 - chord_height / self.radius).clamp(-1.0, 1.0).acos())
    }

    /// Appends evenly spaced points on the circle to `polyline`, starting
    /// at `start` and ending at `start + arc_angle`. The sign of
    /// `arc_angle` selects the traversal direction.
    ///
    /// At least two points are generated (start and end), and the smallest
    /// number of interior points is used such that no segment's chord
    /// height exceeds `max_chord_height`, capped at 2^15 points. A
    /// zero-radius circle emits the center twice, and a NaN arc angle emits
    /// exactly the start and end points.
    ///
    /// `max_chord_height` must be greater than 0.
    pub fn append_arc_to_polyline(
        &self,
        start: Angle,
        arc_angle: Angle,
        max_chord_height: f32,
        polyline: &mut Vec<Point>,
    ) {
        assert!(max_chord_height > 0.0, "non-positive max chord height");

        if self.radius == 0.0 {
            polyline.push(self.center);
            polyline.push(self.center);
            return;
        }

        let max_step_angle = self.arc_angle_for_chord_height(max_chord_height);

        let unclamped_steps = (arc_angle.radians / max_step_angle.radians).abs().ceil();
        let steps = if unclamped_steps.is_nan() {
            1
        } else {
            unclamped_steps.clamp(1.0, i16::MAX as f32) as i32
        };
        let step_angle = arc_angle / steps as f32;

        polyline.push(self.point_on(start));
        for i in 1..steps {
            polyline.push(self.point_on(start + step_angle * i as f32));
        }
        polyline.push(self.point_on(start + arc_angle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{point, rad};
    use std::f32::consts::PI;

    fn approx_angle(a: Angle, b: Angle) -> bool {
        (a.radians - b.radians).abs() < 1e-5
    }

    #[test]
    fn tangent_angles_equal_radii() {
        let a = Circle::new(point(0.0, 0.0), 1.0);
        let b = Circle::new(point(3.0, 0.0), 1.0);
        let angles = a.tangent_angles(&b).unwrap();
        assert!(approx_angle(angles.left, rad(0.5 * PI)));
        assert!(approx_angle(angles.right, rad(-0.5 * PI)));
    }

    #[test]
    fn tangent_angles_different_radii() {
        let a = Circle::new(point(0.0, 0.0), 2.0);
        let b = Circle::new(point(4.0, 0.0), 1.0);
        let angles = a.tangent_angles(&b).unwrap();
        let expected = (1.0f32 / 4.0).acos();
        assert!(approx_angle(angles.left, rad(expected)));
        assert!(approx_angle(angles.right, rad(-expected)));
    }

    #[test]
    fn tangent_angles_degenerate_cases() {
        let a = Circle::new(point(0.0, 0.0), 2.0);
        // Coincident centers.
        assert!(a.tangent_angles(&Circle::new(point(0.0, 0.0), 1.0)).is_none());
        // One inside the other.
        assert!(a.tangent_angles(&Circle::new(point(0.5, 0.0), 1.0)).is_none());
        // Internal tangency.
        assert!(a.tangent_angles(&Circle::new(point(1.0, 0.0), 1.0)).is_none());
    }

    #[test]
    fn guaranteed_right_matches_tangent_angles() {
        let a = Circle::new(point(1.0, -2.0), 1.5);
        let b = Circle::new(point(5.0, 1.0), 0.5);
        let angles = a.tangent_angles(&b).unwrap();
        assert!(approx_angle(a.guaranteed_right_tangent_angle(&b), angles.right));
    }

    #[test]
    fn contains_cases() {
        let a = Circle::new(point(0.0, 0.0), 2.0);
        assert!(a.contains(&a));
        assert!(a.contains(&Circle::new(point(1.0, 0.0), 1.0)));
        assert!(!a.contains(&Circle::new(point(1.5, 0.0), 1.0)));
        assert!(Circle::new(point(0.0, 0.0), f32::INFINITY).contains(&a));
    }

    #[test]
    fn arc_points_stay_on_circle_and_respect_chord_height() {
        let circle = Circle::new(point(2.0, -1.0), 3.0);
        for &(arc, chord_height) in
            &[(2.0 * PI, 0.1f32), (-1.5 * PI, 0.01), (0.7, 0.5), (-0.2, 2.0)]
        {
            let mut points = Vec::new();
            circle.append_arc_to_polyline(rad(0.3), rad(arc), chord_height, &mut points);
            assert!(points.len() >= 2);
            for p in &points {
                assert!(((*p - circle.center()).length() - circle.radius()).abs() < 1e-4);
            }
            for pair in points.windows(2) {
                let midpoint = pair[0] + (pair[1] - pair[0]) * 0.5;
                let sagitta = circle.radius() - (midpoint - circle.center()).length();
                assert!(sagitta <= chord_height + 1e-4);
            }
            // The polyline spans the full requested arc.
            assert!((points[0] - circle.point_on(rad(0.3))).length() < 1e-5);
            assert!((*points.last().unwrap() - circle.point_on(rad(0.3 + arc))).length() < 1e-4);
        }
    }

    #[test]
    fn zero_radius_arc_repeats_center() {
        let circle = Circle::new(point(4.0, 4.0), 0.0);
        let mut points = Vec::new();
        circle.append_arc_to_polyline(rad(1.0), rad(2.0), 0.5, &mut points);
        assert_eq!(points, vec![point(4.0, 4.0), point(4.0, 4.0)]);
    }

    #[test]
    fn nan_arc_emits_start_and_end_only() {
        let circle = Circle::new(point(0.0, 0.0), 1.0);
        let mut points = Vec::new();
        circle.append_arc_to_polyline(rad(0.0), rad(f32::NAN), 0.5, &mut points);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], point(1.0, 0.0));
        assert!(points[1].x.is_nan() && points[1].y.is_nan());
    }

    #[test]
    fn step_count_is_capped() {
        let circle = Circle::new(point(0.0, 0.0), 1.0e6);
        let mut points = Vec::new();
        circle.append_arc_to_polyline(rad(0.0), rad(2.0 * PI), 1.0e-6, &mut points);
        assert!(points.len() <= i16::MAX as usize + 1);
    }
}
