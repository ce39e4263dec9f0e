use crate::math::{Point, Vector};
use crate::utils::{min_max, point_lerp};

/// A directed line segment between two points.
///
/// Equality is field-wise: a segment is not equal to its reverse.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    #[inline]
    pub fn new(from: Point, to: Point) -> Self {
        LineSegment { from, to }
    }

    /// Sample the segment at t (expecting t between 0 and 1).
    #[inline]
    pub fn sample(&self, t: f32) -> Point {
        point_lerp(self.from, self.to, t)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        self.sample(0.5)
    }

    /// Returns an inverted version of this segment where the beginning and
    /// the end points are swapped.
    #[inline]
    pub fn flip(&self) -> Self {
        LineSegment {
            from: self.to,
            to: self.from,
        }
    }

    /// Returns the vector between this segment's `from` and `to` points.
    #[inline]
    pub fn to_vector(&self) -> Vector {
        self.to - self.from
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.to_vector().length()
    }

    #[inline]
    pub fn square_length(&self) -> f32 {
        self.to_vector().square_length()
    }

    /// Returns the ratio along the infinite line coinciding with this
    /// segment at which the line is closest to `p`. This is the inverse of
    /// `sample`.
    ///
    /// Returns `None` when the squared length of the segment underflows to
    /// zero, in which case the projection cannot be computed reliably.
    pub fn project(&self, p: Point) -> Option<f32> {
        let v = self.to_vector();
        let square_length = v.square_length();
        if square_length <= 0.0 {
            return None;
        }
        Some((p - self.from).dot(v) / square_length)
    }

    /// Returns the point on the segment (not the infinite line) closest to
    /// `p`.
    pub fn closest_point(&self, p: Point) -> Point {
        match self.project(p) {
            Some(t) => self.sample(t.clamp(0.0, 1.0)),
            None => self.from,
        }
    }

    #[inline]
    pub fn distance_to_point(&self, p: Point) -> f32 {
        (p - self.closest_point(p)).length()
    }

    /// Computes the ratios along both infinite lines at which the lines
    /// cross, or `None` when the lines are parallel.
    pub fn line_intersection_ratios(&self, other: &LineSegment) -> Option<(f32, f32)> {
        let d1 = self.to_vector();
        let d2 = other.to_vector();
        let denominator = d1.cross(d2);
        if denominator == 0.0 || !denominator.is_finite() {
            return None;
        }
        let w = other.from - self.from;
        Some((w.cross(d2) / denominator, w.cross(d1) / denominator))
    }

    /// Computes the intersection of two segments, endpoints included.
    ///
    /// Collinear overlapping segments report the overlap point on `self`
    /// closest to `self.from`.
    pub fn intersection(&self, other: &LineSegment) -> Option<Point> {
        if let Some((t, u)) = self.line_intersection_ratios(other) {
            if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
                return Some(self.sample(t));
            }
            return None;
        }

        // Parallel or degenerate. Only a shared-line overlap can intersect.
        let d = self.to_vector();
        if d.cross(other.from - self.from) != 0.0 {
            return self.degenerate_intersection(other);
        }
        match (self.project(other.from), self.project(other.to)) {
            (Some(a), Some(b)) => {
                let (lo, hi) = min_max(a, b);
                if hi < 0.0 || lo > 1.0 {
                    None
                } else {
                    Some(self.sample(lo.clamp(0.0, 1.0)))
                }
            }
            _ => self.degenerate_intersection(other),
        }
    }

    // Fallback for segments whose direction underflowed: compare as points.
    fn degenerate_intersection(&self, other: &LineSegment) -> Option<Point> {
        if other.square_length() <= 0.0 {
            if self.distance_to_point(other.from) == 0.0 {
                return Some(other.from);
            }
            return None;
        }
        if self.square_length() <= 0.0 && other.distance_to_point(self.from) == 0.0 {
            return Some(self.from);
        }
        None
    }

    #[inline]
    pub fn intersects(&self, other: &LineSegment) -> bool {
        self.intersection(other).is_some()
    }
}
