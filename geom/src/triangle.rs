use crate::math::{Box2D, Point};
use crate::segment::LineSegment;

/// A 2D triangle defined by three points `a`, `b` and `c`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl Triangle {
    #[inline]
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Triangle { a, b, c }
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point {
        match index {
            0 => self.a,
            1 => self.b,
            _ => self.c,
        }
    }

    /// Returns the edge from `point(index)` to the next point.
    #[inline]
    pub fn edge(&self, index: usize) -> LineSegment {
        LineSegment {
            from: self.point(index),
            to: self.point((index + 1) % 3),
        }
    }

    /// Positive when the points wind counter-clockwise, negative when they
    /// wind clockwise, zero when degenerate.
    #[inline]
    pub fn signed_area(&self) -> f32 {
        0.5 * (self.b - self.a).cross(self.c - self.a)
    }

    fn barycentric_coords_for_point(&self, point: Point) -> (f32, f32, f32) {
        let v0 = self.b - self.a;
        let v1 = self.c - self.a;
        let v2 = point - self.a;
        let inv = 1.0 / v0.cross(v1);
        let a = v0.cross(v2) * inv;
        let b = v2.cross(v1) * inv;
        let c = 1.0 - a - b;
        (a, b, c)
    }

    /// Strict interior containment; points on an edge are not contained.
    pub fn contains_point(&self, point: Point) -> bool {
        let coords = self.barycentric_coords_for_point(point);
        coords.0 > 0.0 && coords.1 > 0.0 && coords.2 > 0.0
    }

    /// Containment with the boundary included. Degenerate triangles
    /// contain nothing.
    pub fn contains_point_inclusive(&self, point: Point) -> bool {
        if self.signed_area() == 0.0 {
            return false;
        }
        let coords = self.barycentric_coords_for_point(point);
        coords.0 >= 0.0 && coords.1 >= 0.0 && coords.2 >= 0.0
    }

    /// Return the minimum bounding rectangle.
    #[inline]
    pub fn bounding_rect(&self) -> Box2D {
        let max_x = self.a.x.max(self.b.x).max(self.c.x);
        let min_x = self.a.x.min(self.b.x).min(self.c.x);
        let max_y = self.a.y.max(self.b.y).max(self.c.y);
        let min_y = self.a.y.min(self.b.y).min(self.c.y);

        Box2D::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Test for triangle-segment intersection, boundaries included.
    pub fn intersects_segment(&self, segment: &LineSegment) -> bool {
        self.edge(0).intersects(segment)
            || self.edge(1).intersects(segment)
            || self.edge(2).intersects(segment)
            || self.contains_point(segment.from)
    }

    /// True when `segment` lies entirely inside or on this triangle.
    pub fn contains_segment(&self, segment: &LineSegment) -> bool {
        let on_or_in = |p: Point| {
            let coords = self.barycentric_coords_for_point(p);
            coords.0 >= 0.0 && coords.1 >= 0.0 && coords.2 >= 0.0
        };
        self.signed_area() != 0.0 && on_or_in(segment.from) && on_or_in(segment.to)
    }
}

#[cfg(test)]
use crate::math::point;

#[test]
fn signed_area_orientation() {
    let ccw = Triangle::new(point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0));
    assert!(ccw.signed_area() > 0.0);
    let cw = Triangle::new(point(0.0, 0.0), point(0.0, 1.0), point(1.0, 0.0));
    assert!(cw.signed_area() < 0.0);
    let degenerate = Triangle::new(point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0));
    assert_eq!(degenerate.signed_area(), 0.0);
}

#[test]
fn contains() {
    let t = Triangle::new(point(0.0, 0.0), point(4.0, 0.0), point(0.0, 4.0));
    assert!(t.contains_point(point(1.0, 1.0)));
    assert!(!t.contains_point(point(3.0, 3.0)));
    // Boundary points are not strictly contained.
    assert!(!t.contains_point(point(2.0, 0.0)));
}

#[test]
fn contains_segment() {
    let t = Triangle::new(point(0.0, 0.0), point(4.0, 0.0), point(0.0, 4.0));
    assert!(t.contains_segment(&LineSegment::new(point(0.5, 0.5), point(1.0, 2.0))));
    assert!(!t.contains_segment(&LineSegment::new(point(0.5, 0.5), point(5.0, 5.0))));
}
