use crate::extrusion::{BrushTipExtrusion, TangentQuality};
use crate::tip_state::TipState;

/// Outcome of searching for an extrusion with good tangents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstrainResultType {
    /// The proposed extrusion already has good tangents; use it as-is.
    ProposedIsValid,
    /// An intermediate extrusion with good tangents was found.
    ConstrainedFound,
    /// The proposed extrusion contains the last one.
    ProposedContainsLast,
    /// The last extrusion contains the proposed one.
    LastContainsProposed,
    /// No intermediate extrusion with good tangents could be found.
    CannotFindIntermediate,
}

#[derive(Clone, Debug)]
pub struct ConstrainedExtrusion {
    pub result_type: ConstrainResultType,
    /// Interpolation amount of the returned extrusion between the last
    /// (0) and proposed (1) states; -1 when no extrusion is returned.
    pub lerp_amount: f32,
    pub extrusion: Option<BrushTipExtrusion>,
}

impl ConstrainedExtrusion {
    fn without_extrusion(result_type: ConstrainResultType) -> Self {
        ConstrainedExtrusion {
            result_type,
            lerp_amount: -1.0,
            extrusion: None,
        }
    }
}

/// Searches for an extrusion between `last` and `proposed` that has good
/// tangents to `last`.
///
/// When `proposed` itself does not qualify and the tip has moved, the
/// interval [0, 1] is bisected `max_iterations` times; the interpolation
/// at 0 is a pure translation (good tangents) and 1 was just found bad,
/// so the boundary lies in between. The lower bound is returned to
/// guarantee the result has good tangents.
pub fn constrain_extrusion(
    last: &BrushTipExtrusion,
    proposed: &BrushTipExtrusion,
    min_nonzero_radius_and_separation: f32,
    max_iterations: u32,
) -> ConstrainedExtrusion {
    // Tolerance below which the extrusion centers count as stationary.
    let stationary_tolerance = 0.1 * min_nonzero_radius_and_separation;

    match BrushTipExtrusion::evaluate_tangent_quality(last, proposed, stationary_tolerance) {
        TangentQuality::NoTangentsFirstContainsSecond => {
            return ConstrainedExtrusion::without_extrusion(
                ConstrainResultType::LastContainsProposed,
            );
        }
        TangentQuality::NoTangentsSecondContainsFirst => {
            return ConstrainedExtrusion::without_extrusion(
                ConstrainResultType::ProposedContainsLast,
            );
        }
        TangentQuality::GoodTangents => {
            return ConstrainedExtrusion::without_extrusion(ConstrainResultType::ProposedIsValid);
        }
        TangentQuality::BadTangentsJoinedShapeDoesNotCoverInputShapes => {}
    }

    let (last_state, _) = last.parts().expect("break-point cannot be constrained");
    let (proposed_state, _) = proposed.parts().expect("break-point cannot be constrained");

    // Without movement, the symmetric shape attributes make it unlikely
    // that any intermediate has good tangents; a change that pushes one
    // corner out of the last shape pushes out the opposite corner too.
    if (proposed_state.position - last_state.position).length() < stationary_tolerance {
        return ConstrainedExtrusion::without_extrusion(
            ConstrainResultType::CannotFindIntermediate,
        );
    }

    let lerp_extrusion = |lerp_amount: f32| {
        BrushTipExtrusion::new(
            TipState::lerp_shape_attributes(last_state, proposed_state, lerp_amount),
            min_nonzero_radius_and_separation,
        )
    };

    let mut lower_bound = 0.0f32;
    let mut upper_bound = 1.0f32;
    let mut current_best_guess = lerp_extrusion(0.0);
    if BrushTipExtrusion::evaluate_tangent_quality(last, &current_best_guess, stationary_tolerance)
        != TangentQuality::GoodTangents
    {
        // Guards against the threshold effects of the epsilon-driven
        // shape canonicalization; t = 0 is not always a pure translation
        // of `last`.
        return ConstrainedExtrusion::without_extrusion(
            ConstrainResultType::CannotFindIntermediate,
        );
    }

    for _ in 0..max_iterations {
        debug_assert!(lower_bound <= upper_bound);
        let next_lerp_amount = 0.5 * (lower_bound + upper_bound);
        let next_guess = lerp_extrusion(next_lerp_amount);
        if BrushTipExtrusion::evaluate_tangent_quality(last, &next_guess, stationary_tolerance)
            == TangentQuality::GoodTangents
        {
            lower_bound = next_lerp_amount;
            current_best_guess = next_guess;
        } else {
            upper_bound = next_lerp_amount;
        }
    }

    ConstrainedExtrusion {
        result_type: ConstrainResultType::ConstrainedFound,
        lerp_amount: lower_bound,
        extrusion: Some(current_best_guess),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracery_geom::math::{point, rad, Point};

    const EPSILON: f32 = 1e-3;

    fn extrusion(state: TipState) -> BrushTipExtrusion {
        BrushTipExtrusion::new(state, EPSILON)
    }

    fn rectangle(position: Point, rotation: f32) -> TipState {
        TipState {
            position,
            width: 6.0,
            height: 1.0,
            corner_rounding: 0.0,
            rotation: rad(rotation),
            ..TipState::default()
        }
    }

    #[test]
    fn translation_is_valid() {
        let result = constrain_extrusion(
            &extrusion(rectangle(point(0.0, 0.0), 0.0)),
            &extrusion(rectangle(point(2.0, 0.0), 0.0)),
            EPSILON,
            7,
        );
        assert_eq!(result.result_type, ConstrainResultType::ProposedIsValid);
        assert_eq!(result.lerp_amount, -1.0);
        assert!(result.extrusion.is_none());
    }

    #[test]
    fn containment_results() {
        let small = TipState {
            position: point(0.0, 0.0),
            width: 1.0,
            height: 1.0,
            corner_rounding: 1.0,
            ..TipState::default()
        };
        let large = TipState {
            width: 4.0,
            height: 4.0,
            ..small
        };
        let result = constrain_extrusion(&extrusion(small), &extrusion(large), EPSILON, 7);
        assert_eq!(result.result_type, ConstrainResultType::ProposedContainsLast);
        let result = constrain_extrusion(&extrusion(large), &extrusion(small), EPSILON, 7);
        assert_eq!(result.result_type, ConstrainResultType::LastContainsProposed);
    }

    #[test]
    fn stationary_rotation_cannot_find_intermediate() {
        // A thin rectangle rotating in place: every intermediate rotation
        // pushes corners out on both sides.
        let result = constrain_extrusion(
            &extrusion(rectangle(point(0.0, 0.0), 0.0)),
            &extrusion(rectangle(point(0.0, 0.0), 1.2)),
            EPSILON,
            7,
        );
        assert_eq!(
            result.result_type,
            ConstrainResultType::CannotFindIntermediate
        );
    }

    #[test]
    fn infinite_size_state_is_constrained_without_panicking() {
        // Interpolating away from an infinite size produces NaN widths;
        // the modeled shapes collapse the dimension instead of rejecting
        // the interpolated state.
        let last = extrusion(TipState {
            position: point(0.0, 0.0),
            width: f32::INFINITY,
            height: 10.0,
            corner_rounding: 0.0,
            ..TipState::default()
        });
        let proposed = extrusion(TipState {
            position: point(0.5, 0.0),
            width: 10.0,
            height: 1.0,
            corner_rounding: 0.0,
            ..TipState::default()
        });
        let result = constrain_extrusion(&last, &proposed, EPSILON, 7);
        assert_eq!(result.result_type, ConstrainResultType::ConstrainedFound);
        assert!(result.extrusion.is_some());
    }

    #[test]
    fn moving_rotation_finds_constrained_intermediate() {
        let last = rectangle(point(0.0, 0.0), 0.0);
        let proposed = rectangle(point(0.6, 0.0), 1.3);
        let result = constrain_extrusion(&extrusion(last), &extrusion(proposed), EPSILON, 7);
        assert_eq!(result.result_type, ConstrainResultType::ConstrainedFound);
        assert!(result.lerp_amount >= 0.0 && result.lerp_amount < 1.0);
        let constrained = result.extrusion.expect("constrained extrusion");

        // Monotonicity: re-proposing the constrained state must be valid.
        let again = constrain_extrusion(&extrusion(last), &constrained, EPSILON, 7);
        assert_eq!(again.result_type, ConstrainResultType::ProposedIsValid);
    }
}
