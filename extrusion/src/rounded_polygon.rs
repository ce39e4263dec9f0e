use arrayvec::ArrayVec;
use tracery_geom::math::{Point, Vector};
use tracery_geom::{Circle, LineSegment};

/// An arc component of a `RoundedPolygon` boundary: the portion of
/// `circle` between `start_unit_vector` and `end_unit_vector`, traversed
/// counter-clockwise.
///
/// The endpoints are unit vectors rather than angles to avoid repeated
/// trigonometry during containment queries.
#[derive(Copy, Clone, Debug)]
pub struct Arc {
    pub circle: Circle,
    pub start_unit_vector: Vector,
    pub end_unit_vector: Vector,
}

/// A polygon-like shape with rounded corners of possibly different radii.
///
/// Defined by two or more circles connected, in order, by their
/// right-side exterior tangents; the boundary alternates circular arcs
/// (possibly degenerate) with straight segments. Built for constraining
/// tip shapes, which never produces a self-intersecting boundary, so
/// self-intersections are neither detected nor handled here.
#[derive(Clone, Debug)]
pub struct RoundedPolygon {
    // Segment components are implicit: each spans the end of one arc to
    // the start of the next. Capacity fits the join of two tip shapes,
    // four circles each.
    arcs: ArrayVec<[Arc; 8]>,
}

impl RoundedPolygon {
    /// Builds the polygon from `circles`, which must number at least two;
    /// no circle may contain its cyclic neighbor.
    pub fn new(circles: &[Circle]) -> RoundedPolygon {
        assert!(circles.len() > 1, "rounded polygon needs at least 2 circles");

        let first = &circles[0];
        let last = &circles[circles.len() - 1];
        let last_to_first_angle = last.guaranteed_right_tangent_angle(first);

        let mut arcs = ArrayVec::new();
        let mut incoming_angle = last_to_first_angle;
        for pair in circles.windows(2) {
            let outgoing_angle = pair[0].guaranteed_right_tangent_angle(&pair[1]);
            arcs.push(Arc {
                circle: pair[0],
                start_unit_vector: unit_from_angle(incoming_angle),
                end_unit_vector: unit_from_angle(outgoing_angle),
            });
            incoming_angle = outgoing_angle;
        }
        arcs.push(Arc {
            circle: *last,
            start_unit_vector: unit_from_angle(incoming_angle),
            end_unit_vector: unit_from_angle(last_to_first_angle),
        });

        RoundedPolygon { arcs }
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// The boundary segment connecting the arc at `index` to the next.
    pub fn segment(&self, index: usize) -> LineSegment {
        let first = &self.arcs[index];
        let second = &self.arcs[(index + 1) % self.arcs.len()];
        LineSegment::new(
            first.circle.center() + first.end_unit_vector * first.circle.radius(),
            second.circle.center() + second.start_unit_vector * second.circle.radius(),
        )
    }

    /// Returns true if `circle` is inside the polygon, touching the
    /// boundary included.
    ///
    /// The circle is contained iff its radius plus the signed distance
    /// from its center to the boundary is at most zero.
    pub fn contains_circle(&self, circle: &Circle) -> bool {
        for i in 0..self.arcs.len() {
            if let Some(d) = signed_distance_to_arc(&self.arcs[i], circle.center()) {
                if d > -circle.radius() {
                    return false;
                }
            }
            if let Some(d) = signed_distance_to_segment(&self.segment(i), circle.center()) {
                if d > -circle.radius() {
                    return false;
                }
            }
        }
        true
    }
}

fn unit_from_angle(angle: tracery_geom::math::Angle) -> Vector {
    let (sin, cos) = angle.radians.sin_cos();
    Vector::new(cos, sin)
}

// Signed distance from `point` to `arc` when `point` lies between the
// rays from the arc's center through its start and end vectors; `None`
// otherwise, since the arc then does not contribute to the distance to
// the boundary. A near-zero start/end determinant means the vectors are
// either nearly parallel — no arc, which also covers the nominal full
// loop produced by floating-point precision loss — or nearly
// antiparallel: a half-turn cap, whose sector is the half-plane left of
// the start vector. Equal-radius circle pairs produce exact half-turn
// caps, so the antiparallel case cannot be folded into "no arc" without
// leaving the caps unbounded.
fn signed_distance_to_arc(arc: &Arc, point: Point) -> Option<f32> {
    let center_to_point = point - arc.circle.center();
    let arc_vector_det = arc.start_unit_vector.cross(arc.end_unit_vector);
    if arc_vector_det.abs() < 5e-6 {
        if arc.start_unit_vector.dot(arc.end_unit_vector) > 0.0 {
            return None;
        }
        // A half-turn arc (stadium cap): its sector is the half-plane to
        // the left of the start vector.
        if arc.start_unit_vector.cross(center_to_point) < 0.0 {
            return None;
        }
        return Some(center_to_point.length() - arc.circle.radius());
    }
    if arc_vector_det < 0.0 {
        // Major arc: the point is inside the span unless it is both left
        // of the start vector and right of the end vector.
        if arc.start_unit_vector.cross(center_to_point) < 0.0
            && arc.end_unit_vector.cross(center_to_point) > 0.0
        {
            return None;
        }
    } else {
        // Minor arc: the point must be left of the start vector and
        // right of the end vector.
        if arc.start_unit_vector.cross(center_to_point) < 0.0
            || arc.end_unit_vector.cross(center_to_point) > 0.0
        {
            return None;
        }
    }
    Some(center_to_point.length() - arc.circle.radius())
}

// Signed distance from `point` to `segment` when the projection of the
// point lies within the segment; `None` otherwise.
fn signed_distance_to_segment(segment: &LineSegment, point: Point) -> Option<f32> {
    let projection = segment.project(point)?;
    if !(0.0..=1.0).contains(&projection) {
        return None;
    }
    Some(-segment.to_vector().cross(point - segment.from) / segment.length())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracery_geom::math::point;

    fn stadium() -> RoundedPolygon {
        RoundedPolygon::new(&[
            Circle::new(point(-2.0, 0.0), 1.0),
            Circle::new(point(2.0, 0.0), 1.0),
        ])
    }

    #[test]
    fn arc_count_matches_circles() {
        let polygon = stadium();
        assert_eq!(polygon.arcs().len(), 2);
    }

    #[test]
    fn contains_circles_inside() {
        let polygon = stadium();
        assert!(polygon.contains_circle(&Circle::new(point(0.0, 0.0), 1.0)));
        assert!(polygon.contains_circle(&Circle::new(point(2.0, 0.0), 1.0)));
        assert!(polygon.contains_circle(&Circle::new(point(1.0, 0.5), 0.5)));
    }

    #[test]
    fn rejects_circles_outside_or_overlapping() {
        let polygon = stadium();
        assert!(!polygon.contains_circle(&Circle::new(point(0.0, 3.0), 1.0)));
        assert!(!polygon.contains_circle(&Circle::new(point(0.0, 0.5), 1.0)));
        assert!(!polygon.contains_circle(&Circle::new(point(3.5, 0.0), 0.25)));
    }

    #[test]
    fn half_turn_caps_bound_the_shape() {
        // The caps of a stadium are exact half-turn arcs (antiparallel
        // start and end vectors); circles beyond them project outside
        // both connecting segments, so only the caps can reject them.
        let polygon = stadium();
        assert!(!polygon.contains_circle(&Circle::new(point(4.0, 0.0), 0.5)));
        assert!(!polygon.contains_circle(&Circle::new(point(-3.75, 0.0), 0.25)));
        assert!(polygon.contains_circle(&Circle::new(point(2.5, 0.0), 0.25)));
    }

    #[test]
    fn quad_of_points_contains_boundary_touching_circle() {
        let polygon = RoundedPolygon::new(&[
            Circle::new(point(0.0, 0.0), 0.0),
            Circle::new(point(4.0, 0.0), 0.0),
            Circle::new(point(4.0, 4.0), 0.0),
            Circle::new(point(0.0, 4.0), 0.0),
        ]);
        assert!(polygon.contains_circle(&Circle::new(point(2.0, 2.0), 2.0)));
        assert!(!polygon.contains_circle(&Circle::new(point(2.0, 2.0), 2.5)));
    }
}
