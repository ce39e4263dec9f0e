use tracery_geom::math::{point, Angle, Point};
use tracery_geom::utils::lerp;

/// The modeled state of the brush tip at one point along a stroke.
///
/// Positions and sizes are in stroke units. The color and texture fields
/// do not influence the extruded silhouette; they are copied onto the
/// vertices the shape produces.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TipState {
    /// Absolute position of the brush-tip center.
    pub position: Point,
    /// Width of the tip shape, >= 0.
    pub width: f32,
    /// Height of the tip shape, >= 0.
    pub height: f32,
    /// Corner rounding from 0 (sharp corners) to 1 (fully circular).
    pub corner_rounding: f32,
    /// Rotation of the tip shape, in (-π, π].
    pub rotation: Angle,
    /// Horizontal shear of the tip shape, in [-π/2, π/2].
    pub slant: Angle,
    /// Separation of the tip shape's back corners prior to rotation, in
    /// [0, 1].
    pub pinch: f32,
    /// Distance traveled along the stroke up to this state; consumed by
    /// continuous surface-UV extrusion.
    pub traveled_distance: f32,
    /// Offset to the starting texture animation progress, in [0, 1).
    pub texture_animation_progress_offset: f32,
    /// Hue offset in full turns, in [0, 1).
    pub hue_offset_in_full_turns: f32,
    /// Saturation multiplier, in [0, 2].
    pub saturation_multiplier: f32,
    /// Additive luminosity shift, in [-1, 1].
    pub luminosity_shift: f32,
    /// Opacity multiplier, in [0, 2].
    pub opacity_multiplier: f32,
}

impl Default for TipState {
    fn default() -> Self {
        TipState {
            position: point(0.0, 0.0),
            width: 0.0,
            height: 0.0,
            corner_rounding: 0.0,
            rotation: Angle::radians(0.0),
            slant: Angle::radians(0.0),
            pinch: 0.0,
            traveled_distance: 0.0,
            texture_animation_progress_offset: 0.0,
            hue_offset_in_full_turns: 0.0,
            saturation_multiplier: 1.0,
            luminosity_shift: 0.0,
            opacity_multiplier: 1.0,
        }
    }
}

impl TipState {
    /// Returns a state whose shape attributes (width, height, corner
    /// rounding, rotation, slant and pinch) are interpolated between `a`
    /// and `b`; every other field is copied from `b`.
    ///
    /// Rotation interpolates along the shortest path around the circle.
    /// Values of `t` outside [0, 1] extrapolate, which may produce
    /// attribute values outside their documented ranges (e.g. a negative
    /// width).
    pub fn lerp_shape_attributes(a: &TipState, b: &TipState, t: f32) -> TipState {
        let rotation_delta = (b.rotation - a.rotation).signed();
        TipState {
            width: lerp(a.width, b.width, t),
            height: lerp(a.height, b.height, t),
            corner_rounding: lerp(a.corner_rounding, b.corner_rounding, t),
            rotation: (a.rotation + rotation_delta * t).signed(),
            slant: Angle::radians(lerp(a.slant.radians, b.slant.radians, t)),
            pinch: lerp(a.pinch, b.pinch, t),
            ..*b
        }
    }

    /// True when the attributes that determine the silhouette are equal,
    /// ignoring position and all color/texture fields.
    pub fn has_equal_shape_attributes(&self, other: &TipState) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.corner_rounding == other.corner_rounding
            && self.rotation == other.rotation
            && self.slant == other.slant
            && self.pinch == other.pinch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn lerp_interpolates_shape_attributes() {
        let a = TipState {
            position: point(0.0, 0.0),
            width: 2.0,
            height: 4.0,
            corner_rounding: 0.0,
            pinch: 0.2,
            ..TipState::default()
        };
        let b = TipState {
            position: point(2.0, 2.0),
            width: 4.0,
            height: 2.0,
            corner_rounding: 1.0,
            pinch: 0.6,
            opacity_multiplier: 0.5,
            ..TipState::default()
        };
        let mid = TipState::lerp_shape_attributes(&a, &b, 0.5);
        assert!(approx_eq(mid.width, 3.0));
        assert!(approx_eq(mid.height, 3.0));
        assert!(approx_eq(mid.corner_rounding, 0.5));
        assert!(approx_eq(mid.pinch, 0.4));
        // Non-shape attributes, position included, come from `b`.
        assert_eq!(mid.position, point(2.0, 2.0));
        assert_eq!(mid.opacity_multiplier, 0.5);
    }

    #[test]
    fn rotation_takes_shortest_path() {
        let a = TipState {
            rotation: Angle::radians(0.9 * PI),
            ..TipState::default()
        };
        let b = TipState {
            rotation: Angle::radians(-0.9 * PI),
            ..TipState::default()
        };
        let mid = TipState::lerp_shape_attributes(&a, &b, 0.5);
        // Halfway across the π boundary, not through zero.
        assert!(approx_eq(mid.rotation.radians.abs(), PI));
    }

    #[test]
    fn extrapolation_is_permitted() {
        let a = TipState {
            width: 2.0,
            ..TipState::default()
        };
        let b = TipState {
            width: 1.0,
            ..TipState::default()
        };
        let extrapolated = TipState::lerp_shape_attributes(&a, &b, 3.0);
        assert!(extrapolated.width < 0.0);
    }
}
