use crate::rounded_polygon::RoundedPolygon;
use crate::tip_shape::{TangentCircleIndices, TipShape};
use crate::tip_state::TipState;

use arrayvec::ArrayVec;
use tracery_geom::Circle;

/// One element of the extrusion sequence: either a break-point marking a
/// discontinuity of the stroke outline, or a tip state together with its
/// modeled shape.
#[derive(Clone, Debug)]
pub enum BrushTipExtrusion {
    BreakPoint,
    Regular { state: TipState, shape: TipShape },
}

/// Whether two consecutive tip shapes can be connected by well-behaved
/// external tangents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TangentQuality {
    /// No tangents exist: the first shape contains the second.
    NoTangentsFirstContainsSecond,
    /// No tangents exist: the second shape contains the first.
    NoTangentsSecondContainsFirst,
    /// Tangents exist, but the joined shape does not cover every
    /// perimeter circle of the two inputs, so extruding would lose area.
    BadTangentsJoinedShapeDoesNotCoverInputShapes,
    GoodTangents,
}

impl BrushTipExtrusion {
    /// Models `state` into a shape using the given minimum radius and
    /// separation (the brush epsilon).
    pub fn new(state: TipState, min_nonzero_radius_and_separation: f32) -> Self {
        let shape = TipShape::new(&state, min_nonzero_radius_and_separation);
        BrushTipExtrusion::Regular { state, shape }
    }

    #[inline]
    pub fn is_break_point(&self) -> bool {
        matches!(self, BrushTipExtrusion::BreakPoint)
    }

    /// The state and shape of a non-break extrusion.
    #[inline]
    pub fn parts(&self) -> Option<(&TipState, &TipShape)> {
        match self {
            BrushTipExtrusion::BreakPoint => None,
            BrushTipExtrusion::Regular { state, shape } => Some((state, shape)),
        }
    }

    /// Evaluates the tangent quality between two non-break extrusions.
    ///
    /// A pair of states with identical shape attributes whose centers are
    /// farther apart than `travel_threshold` is a rigid translation of a
    /// convex shape, which always has good tangents.
    pub fn evaluate_tangent_quality(
        first: &BrushTipExtrusion,
        second: &BrushTipExtrusion,
        travel_threshold: f32,
    ) -> TangentQuality {
        let (first_state, first_shape) = first.parts().expect("break-point has no tangents");
        let (second_state, second_shape) = second.parts().expect("break-point has no tangents");

        if (second_state.position - first_state.position).length() > travel_threshold
            && first_state.has_equal_shape_attributes(second_state)
        {
            return TangentQuality::GoodTangents;
        }

        evaluate_shape_tangent_quality(first_shape, second_shape)
    }
}

fn evaluate_shape_tangent_quality(first: &TipShape, second: &TipShape) -> TangentQuality {
    if first.contains(second) {
        return TangentQuality::NoTangentsFirstContainsSecond;
    }
    if second.contains(first) {
        return TangentQuality::NoTangentsSecondContainsFirst;
    }

    // Two circles that do not contain one another always have good
    // tangents.
    if first.perimeter_circles().len() == 1 && second.perimeter_circles().len() == 1 {
        return TangentQuality::GoodTangents;
    }

    let indices = TipShape::tangent_circle_indices(first, second);

    // If the first tangent circle is immediately clockwise of the last on
    // both shapes, every circle contributes to the joined boundary and
    // nothing can be left uncovered.
    if first.next_cw(indices.left.0) == indices.right.0
        && second.next_cw(indices.right.1) == indices.left.1
    {
        return TangentQuality::GoodTangents;
    }

    // Inflate the joined shape slightly so that floating-point precision
    // loss cannot produce false negatives from the containment test.
    let first_bounds = first.bounds();
    let second_bounds = second.bounds();
    let max_absolute_coordinate = first_bounds
        .min
        .x
        .abs()
        .max(first_bounds.min.y.abs())
        .max(first_bounds.max.x.abs())
        .max(first_bounds.max.y.abs())
        .max(second_bounds.min.x.abs())
        .max(second_bounds.min.y.abs())
        .max(second_bounds.max.x.abs())
        .max(second_bounds.max.y.abs());
    let offset = 1e-6 * max_absolute_coordinate;

    let joined_shape = construct_joined_shape(first, second, &indices, offset);

    // Check whether the circles left out of the joined boundary are
    // nonetheless inside it.
    let mut index = first.next_ccw(indices.right.0);
    while index != indices.left.0 {
        if !joined_shape.contains_circle(&first.perimeter_circles()[index]) {
            return TangentQuality::BadTangentsJoinedShapeDoesNotCoverInputShapes;
        }
        index = first.next_ccw(index);
    }
    let mut index = second.next_ccw(indices.left.1);
    while index != indices.right.1 {
        if !joined_shape.contains_circle(&second.perimeter_circles()[index]) {
            return TangentQuality::BadTangentsJoinedShapeDoesNotCoverInputShapes;
        }
        index = second.next_ccw(index);
    }

    TangentQuality::GoodTangents
}

// Builds the rounded polygon that results from connecting `first` and
// `second` along the tangents chosen by `indices`: counter-clockwise from
// `indices.left.0` to `indices.right.0` on the first shape, jumping to
// `indices.right.1` and continuing to `indices.left.1` on the second.
// Each circle is inflated by `offset`.
fn construct_joined_shape(
    first: &TipShape,
    second: &TipShape,
    indices: &TangentCircleIndices,
    offset: f32,
) -> RoundedPolygon {
    debug_assert!(offset >= 0.0);

    let mut circles: ArrayVec<[Circle; 8]> = ArrayVec::new();
    let mut add_circles = |shape: &TipShape, first_index: usize, last_index: usize| {
        let mut index = first_index;
        loop {
            let circle = &shape.perimeter_circles()[index];
            circles.push(Circle::new(circle.center(), circle.radius() + offset));
            if index == last_index {
                break;
            }
            index = shape.next_ccw(index);
        }
    };

    add_circles(first, indices.left.0, indices.right.0);
    add_circles(second, indices.right.1, indices.left.1);

    RoundedPolygon::new(&circles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracery_geom::math::{point, Point};

    fn extrusion(state: TipState) -> BrushTipExtrusion {
        BrushTipExtrusion::new(state, 1e-5)
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
    fn translated_circles_have_good_tangents() {
        let a = extrusion(circle_state(point(0.0, 0.0), 2.0));
        let b = extrusion(circle_state(point(1.0, 1.0), 2.0));
        assert_eq!(
            BrushTipExtrusion::evaluate_tangent_quality(&a, &b, 1e-6),
            TangentQuality::GoodTangents
        );
    }

    #[test]
    fn containment_is_reported_per_direction() {
        let small = extrusion(circle_state(point(0.0, 0.0), 1.0));
        let large = extrusion(circle_state(point(0.0, 0.0), 4.0));
        assert_eq!(
            BrushTipExtrusion::evaluate_tangent_quality(&large, &small, 1e-6),
            TangentQuality::NoTangentsFirstContainsSecond
        );
        assert_eq!(
            BrushTipExtrusion::evaluate_tangent_quality(&small, &large, 1e-6),
            TangentQuality::NoTangentsSecondContainsFirst
        );
    }

    #[test]
    fn rigid_translation_short_circuit() {
        let state = TipState {
            position: point(0.0, 0.0),
            width: 4.0,
            height: 1.0,
            corner_rounding: 0.2,
            pinch: 0.5,
            ..TipState::default()
        };
        let moved = TipState {
            position: point(0.5, 0.0),
            ..state
        };
        assert_eq!(
            BrushTipExtrusion::evaluate_tangent_quality(
                &extrusion(state),
                &extrusion(moved),
                1e-6
            ),
            TangentQuality::GoodTangents
        );
    }

    #[test]
    fn crossing_rectangles_have_bad_tangents() {
        // Two long thin rectangles forming a cross: the joined shape
        // leaves the first shape's far corners uncovered.
        let horizontal = extrusion(TipState {
            position: point(0.0, 0.0),
            width: 10.0,
            height: 1.0,
            corner_rounding: 0.0,
            ..TipState::default()
        });
        let vertical = extrusion(TipState {
            position: point(0.5, 0.0),
            width: 1.0,
            height: 10.0,
            corner_rounding: 0.0,
            ..TipState::default()
        });
        assert_eq!(
            BrushTipExtrusion::evaluate_tangent_quality(&horizontal, &vertical, 1e-6),
            TangentQuality::BadTangentsJoinedShapeDoesNotCoverInputShapes
        );
    }

    #[test]
    fn nearby_similar_rectangles_have_good_tangents() {
        let a = extrusion(TipState {
            position: point(0.0, 0.0),
            width: 6.0,
            height: 8.0,
            corner_rounding: 0.25,
            ..TipState::default()
        });
        let b = extrusion(TipState {
            position: point(1.0, 0.0),
            width: 6.0,
            height: 8.0,
            corner_rounding: 0.3,
            ..TipState::default()
        });
        assert_eq!(
            BrushTipExtrusion::evaluate_tangent_quality(&a, &b, 1e-6),
            TangentQuality::GoodTangents
        );
    }
}
