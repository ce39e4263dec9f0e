//! Generation of stroke outline points from sequences of tip shapes.
//!
//! The labels "left" and "right" are assigned by looking at the stroke
//! from the positive z-axis with "forward" oriented along the travel
//! direction of each portion of the stroke.

use crate::tip_shape::{tangent_sides, TipShape};

use std::f32::consts::PI;
use tracery_geom::math::{Angle, Point, Vector};
use tracery_geom::utils::signed_angle_between;
use tracery_geom::LineSegment;

/// Storage for the positions at which stroke geometry should be extruded.
#[derive(Clone, Debug, Default)]
pub struct ExtrusionPoints {
    pub left: Vec<Point>,
    pub right: Vec<Point>,
}

impl ExtrusionPoints {
    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

// Tolerance under which two tangent angles are considered collinear. Just
// over four times machine precision at ±π radians.
const COLLINEAR_TOLERANCE: f32 = 1e-5;

// Tolerance for snapping a perimeter-walk arc that wrapped all the way
// around due to rounding back to an empty arc.
const WALK_SNAP_TOLERANCE: f32 = 1e-4;

const FULL_TURN: f32 = 2.0 * PI;

#[derive(Copy, Clone, PartialEq)]
enum WalkDirection {
    Cw,
    Ccw,
}

/// Appends the outline points contributed by `middle` when extruding the
/// shape sequence `start`, `middle`, `end`.
///
/// Each side receives either an arc walk across `middle`'s perimeter or
/// the intersection of the incoming and outgoing tangents, depending on
/// the cyclic order of the four tangent angles; see
/// `tangent_angle_order_case`.
pub fn append_turn_extrusion_points(
    start: &TipShape,
    middle: &TipShape,
    end: &TipShape,
    max_chord_height: f32,
    out: &mut ExtrusionPoints,
) {
    let (in_left, in_right) = tangent_sides(start, middle);
    let (out_left, out_right) = tangent_sides(middle, end);

    // Snap nearly-collinear tangents together to avoid adding an
    // unnecessary loop of points.
    let mut in_left_angle = in_left.angle;
    let mut in_right_angle = in_right.angle;
    snap_collinear(&mut in_left_angle, out_left.angle);
    snap_collinear(&mut in_right_angle, out_right.angle);

    // Designate the left incoming angle as the start of the cyclic order
    // and normalize the rest above it.
    let base = in_left_angle;
    let out_left_n = normalize_at_or_above(out_left.angle, base);
    let in_right_n = normalize_at_or_above(in_right_angle, base);
    let out_right_n = normalize_at_or_above(out_right.angle, base);

    // A side's walk normally traverses the middle shape clockwise on the
    // left and counter-clockwise on the right; past half a turn the walk
    // flips to the shorter way around, folding the outline back over
    // itself for the downstream intersection repair to resolve.
    macro_rules! left_arc {
        () => {{
            let cw_span = (out_left.angle - in_left_angle).positive().radians - FULL_TURN;
            let direction = if cw_span >= -PI {
                WalkDirection::Cw
            } else {
                WalkDirection::Ccw
            };
            append_perimeter_walk(
                middle,
                in_left.second,
                out_left.first,
                in_left_angle,
                out_left.angle,
                direction,
                max_chord_height,
                &mut out.left,
            )
        }};
    }
    macro_rules! right_arc {
        () => {{
            let ccw_span = (out_right.angle - in_right_angle).positive().radians;
            let direction = if ccw_span <= PI {
                WalkDirection::Ccw
            } else {
                WalkDirection::Cw
            };
            append_perimeter_walk(
                middle,
                in_right.second,
                out_right.first,
                in_right_angle,
                out_right.angle,
                direction,
                max_chord_height,
                &mut out.right,
            )
        }};
    }
    macro_rules! left_intersection {
        () => {
            append_tangent_intersection(
                LineSegment::new(
                    start.circle(in_left.first).point_on(in_left_angle),
                    middle.circle(in_left.second).point_on(in_left_angle),
                ),
                LineSegment::new(
                    middle.circle(out_left.first).point_on(out_left.angle),
                    end.circle(out_left.second).point_on(out_left.angle),
                ),
                &mut out.left,
            )
        };
    }
    macro_rules! right_intersection {
        () => {
            append_tangent_intersection(
                LineSegment::new(
                    start.circle(in_right.first).point_on(in_right_angle),
                    middle.circle(in_right.second).point_on(in_right_angle),
                ),
                LineSegment::new(
                    middle.circle(out_right.first).point_on(out_right.angle),
                    end.circle(out_right.second).point_on(out_right.angle),
                ),
                &mut out.right,
            )
        };
    }

    match tangent_angle_order_case(base, in_right_n, out_left_n, out_right_n) {
        1 => {
            left_arc!();
            right_intersection!();
        }
        2 => {
            left_intersection!();
            right_arc!();
        }
        3 => {
            left_intersection!();
            right_intersection!();
        }
        4 => {
            left_arc!();
            right_arc!();
        }
        _ => {
            // Cases 5 and 6 come up when the shapes mostly overlap while
            // their sizes change rapidly; they can occur even though the
            // centers travel roughly straight. Only treat the turn as
            // deep when the turn angle says so.
            let turn_angle = signed_angle_between(
                middle.center() - start.center(),
                end.center() - middle.center(),
            );
            if turn_angle.radians.abs() >= FULL_TURN / 3.0 {
                left_arc!();
                right_arc!();
            } else if turn_angle.radians < 0.0 {
                left_arc!();
                right_intersection!();
            } else {
                left_intersection!();
                right_arc!();
            }
        }
    }
}

/// Appends the outline points contributed by `first` at the start of a
/// stroke: the walk around the free (back) side of `first` between its
/// two tangents toward `second`, split between the left and right sides.
pub fn append_startcap_extrusion_points(
    first: &TipShape,
    second: &TipShape,
    max_chord_height: f32,
    out: &mut ExtrusionPoints,
) {
    let (left, right) = tangent_sides(first, second);

    let mut cap = Vec::new();
    append_perimeter_walk(
        first,
        left.first,
        right.first,
        left.angle,
        right.angle,
        WalkDirection::Ccw,
        max_chord_height,
        &mut cap,
    );

    // The first half belongs to the left side, ordered from the back of
    // the stroke toward the left tangent.
    let left_count = (cap.len() + 1) / 2;
    out.left.extend(cap[..left_count].iter().rev());
    out.right.extend_from_slice(&cap[left_count..]);
}

/// Appends the outline points contributed by `last` at the end of a
/// stroke; symmetric to `append_startcap_extrusion_points`, walking the
/// front side of `last`.
pub fn append_endcap_extrusion_points(
    second_to_last: &TipShape,
    last: &TipShape,
    max_chord_height: f32,
    out: &mut ExtrusionPoints,
) {
    let (left, right) = tangent_sides(second_to_last, last);

    let mut cap = Vec::new();
    append_perimeter_walk(
        last,
        left.second,
        right.second,
        left.angle,
        right.angle,
        WalkDirection::Cw,
        max_chord_height,
        &mut cap,
    );

    let left_count = (cap.len() + 1) / 2;
    out.left.extend_from_slice(&cap[..left_count]);
    out.right.extend(cap[left_count..].iter().rev());
}

/// Appends the complete outline of a single shape, split into left and
/// right sides about `forward_direction`. Used when a stroke (or a
/// partition between break-points) consists of a single sample.
pub fn append_whole_shape_extrusion_points(
    shape: &TipShape,
    max_chord_height: f32,
    forward_direction: Vector,
    out: &mut ExtrusionPoints,
) {
    let front = forward_direction.angle_from_x_axis();
    let back = front + Angle::radians(PI);

    if shape.perimeter_circles().len() == 1 {
        // Leave half of a maximum sampling step unsampled on both sides
        // of each split so the connecting chords also respect the chord
        // height bound.
        let circle = shape.circle(0);
        let margin = circle.arc_angle_for_chord_height(max_chord_height) * 0.5;
        let span = Angle::radians((PI - 2.0 * margin.radians).max(0.0));
        let start = out.right.len();
        circle.append_arc_to_polyline(back + margin, span, max_chord_height, &mut out.right);
        dedup_points_from(&mut out.right, start);
        let start = out.left.len();
        circle.append_arc_to_polyline(back - margin, -span, max_chord_height, &mut out.left);
        dedup_points_from(&mut out.left, start);
        return;
    }

    // Split the boundary at the arc/segment junctions nearest the back
    // and front directions; the tangent segments at the splits connect
    // the two sides without any arc approximation error.
    let (front_index, front_angle) = nearest_junction(shape, front, None);
    let (back_index, back_angle) = nearest_junction(shape, back, Some(front_index));

    append_perimeter_walk(
        shape,
        back_index,
        shape.next_ccw(front_index),
        back_angle,
        front_angle,
        WalkDirection::Cw,
        max_chord_height,
        &mut out.left,
    );
    append_perimeter_walk(
        shape,
        shape.next_ccw(back_index),
        front_index,
        back_angle,
        front_angle,
        WalkDirection::Ccw,
        max_chord_height,
        &mut out.right,
    );
}

/// Finds the arc/segment junction of a multi-circle shape whose outward
/// angle is nearest `direction`: the junction where the boundary walk
/// leaves `circle(index)` for its counter-clockwise neighbor.
///
/// `exclude` skips one junction; the front and back splits must land on
/// distinct junctions or the two side walks would each cover the whole
/// boundary (a two-circle shape has only two junctions to tie over).
fn nearest_junction(shape: &TipShape, direction: Angle, exclude: Option<usize>) -> (usize, Angle) {
    let mut best = (0, Angle::radians(0.0));
    let mut best_distance = f32::INFINITY;
    for index in 0..shape.perimeter_circles().len() {
        if exclude == Some(index) {
            continue;
        }
        let next = shape.next_ccw(index);
        let angle = shape
            .circle(index)
            .guaranteed_right_tangent_angle(shape.circle(next));
        let distance = (angle - direction).signed().radians.abs();
        if distance < best_distance {
            best_distance = distance;
            best = (index, angle);
        }
    }
    best
}

fn snap_collinear(angle: &mut Angle, other: Angle) {
    let delta = (angle.radians - other.radians).abs();
    if delta < COLLINEAR_TOLERANCE || delta + COLLINEAR_TOLERANCE > FULL_TURN {
        *angle = other;
    }
}

#[inline]
fn normalize_at_or_above(angle: Angle, base: Angle) -> Angle {
    base + (angle - base).positive()
}

/// Returns the case number for the cyclic order of the four tangent
/// angles, with `in_left` designated as the smallest:
///
/// 1. L-in, R-out, R-in, L-out
/// 2. L-in, L-out, R-in, R-out
/// 3. L-in, L-out, R-out, R-in
/// 4. L-in, R-in, R-out, L-out
/// 5. L-in, R-out, L-out, R-in
/// 6. L-in, R-in, L-out, R-out
fn tangent_angle_order_case(in_left: Angle, in_right: Angle, out_left: Angle, out_right: Angle) -> u8 {
    debug_assert!(in_right >= in_left && out_left >= in_left && out_right >= in_left);
    let second = in_right.radians.min(out_left.radians).min(out_right.radians);
    if second == out_left.radians {
        if out_right <= in_right {
            3
        } else {
            2
        }
    } else if second == out_right.radians {
        if out_left <= in_right {
            5
        } else {
            1
        }
    } else if out_left <= out_right {
        6
    } else {
        4
    }
}

fn append_tangent_intersection(
    incoming: LineSegment,
    outgoing: LineSegment,
    points: &mut Vec<Point>,
) {
    if let Some(intersection) = incoming.intersection(&outgoing) {
        points.push(intersection);
    } else {
        // No intersection can happen when the perimeter radii are large;
        // fall back to connecting the tangent endpoints directly.
        points.push(incoming.to);
        points.push(outgoing.from);
    }
}

/// Appends the points of the boundary walk across `shape`'s perimeter
/// circles from (`from_index`, `entry`) to (`to_index`, `exit`) in the
/// given direction. Arcs on consecutive circles connect at the hull
/// tangent angle between them; consecutive duplicate points are removed.
fn append_perimeter_walk(
    shape: &TipShape,
    from_index: usize,
    to_index: usize,
    entry: Angle,
    exit: Angle,
    direction: WalkDirection,
    max_chord_height: f32,
    points: &mut Vec<Point>,
) {
    let start_len = points.len();
    let mut index = from_index;
    let mut angle = entry;
    while index != to_index {
        let next = match direction {
            WalkDirection::Ccw => shape.next_ccw(index),
            WalkDirection::Cw => shape.next_cw(index),
        };
        let junction = match direction {
            WalkDirection::Ccw => shape
                .circle(index)
                .guaranteed_right_tangent_angle(shape.circle(next)),
            WalkDirection::Cw => shape
                .circle(next)
                .guaranteed_right_tangent_angle(shape.circle(index)),
        };
        let arc = directed_arc(angle, junction, direction);
        shape
            .circle(index)
            .append_arc_to_polyline(angle, arc, max_chord_height, points);
        angle = junction;
        index = next;
    }
    let arc = directed_arc(angle, exit, direction);
    shape
        .circle(index)
        .append_arc_to_polyline(angle, arc, max_chord_height, points);

    dedup_points_from(points, start_len);
}

/// Normalizes the sweep from `entry` to `exit` for the walk direction:
/// counter-clockwise arcs are in [0, 2π) and clockwise arcs in (-2π, 0].
/// Sweeps within rounding distance of a full turn collapse to zero.
fn directed_arc(entry: Angle, exit: Angle, direction: WalkDirection) -> Angle {
    let span = (exit - entry).positive();
    match direction {
        WalkDirection::Ccw => {
            if span.radians > FULL_TURN - WALK_SNAP_TOLERANCE {
                Angle::radians(0.0)
            } else {
                span
            }
        }
        WalkDirection::Cw => {
            if span.radians < WALK_SNAP_TOLERANCE {
                Angle::radians(0.0)
            } else {
                span - Angle::radians(FULL_TURN)
            }
        }
    }
}

fn dedup_points_from(points: &mut Vec<Point>, start: usize) {
    let mut write = start;
    for read in start..points.len() {
        if write > start && points[write - 1] == points[read] {
            continue;
        }
        points[write] = points[read];
        write += 1;
    }
    points.truncate(write);
}
