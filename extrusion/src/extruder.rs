//! The public facade of the extrusion core.
//!
//! A [`BrushTipExtruder`] incrementally turns a sequence of tip states
//! into stroke geometry:
//!
//! - each state whose width or height reaches the brush epsilon is
//!   modeled into a [`TipShape`](crate::TipShape) and connected to its
//!   predecessor, inserting constrained intermediates or break-points
//!   where the raw sequence would produce degenerate tangents;
//! - states below the epsilon in both dimensions become break-points, so
//!   a stroke can contain gaps for dashes and dots;
//! - the resulting outline points are fed to the geometry engine and the
//!   per-vertex derivatives are refreshed for the mutated suffix.
//!
//! "Fixed" states become a permanent part of the stroke; "volatile"
//! states are extruded provisionally and reverted at the start of the
//! next [`BrushTipExtruder::extend_stroke`] call.

use crate::constrain::{constrain_extrusion, ConstrainResultType};
use crate::derivative::DerivativeCalculator;
use crate::extrusion::BrushTipExtrusion;
use crate::geometry::Geometry;
use crate::mesh::{ExtrudedVertex, ForwardCategory, SideCategory, StrokeMesh};
use crate::outline::{
    append_endcap_extrusion_points, append_startcap_extrusion_points,
    append_turn_extrusion_points, append_whole_shape_extrusion_points, ExtrusionPoints,
};
use crate::side::SideId;
use crate::tip_state::TipState;

use tracery_geom::math::{point, vector, Point, Transform};
use tracery_geom::Envelope;

/// How surface UV coordinates are assigned to extruded vertices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SurfaceUv {
    /// Every vertex gets (0, 0).
    None,
    /// `u` is 0 on the left outline and 1 on the right; `v` is the
    /// distance traveled along the stroke up to the extruded state.
    ContinuousStroke,
    /// The tip rectangle of each state is mapped onto the unit square,
    /// ignoring slant, pinch and corner rounding. Used for brushes that
    /// stamp a (possibly animated) winding texture per particle.
    Particles,
}

/// What changed in the stroke mesh during one `extend_stroke` call.
///
/// A renderer holding a previously consumed copy of the mesh may keep
/// everything before the two offsets and re-upload the rest; an offset of
/// `None` means that buffer is unchanged. `region` is the union of the
/// painted and unpainted area affected.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StrokeShapeUpdate {
    pub region: Envelope,
    pub first_index_offset: Option<u32>,
    pub first_vertex_offset: Option<u32>,
}

/// The boundary of one stroke partition: the left and right outline
/// indices into the stroke mesh, in stroke order.
#[derive(Clone, Debug, Default)]
pub struct StrokeOutline {
    left_indices: Vec<u32>,
    right_indices: Vec<u32>,
}

impl StrokeOutline {
    #[inline]
    pub fn left_indices(&self) -> &[u32] {
        &self.left_indices
    }

    #[inline]
    pub fn right_indices(&self) -> &[u32] {
        &self.right_indices
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.left_indices.len() + self.right_indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left_indices.is_empty() && self.right_indices.is_empty()
    }

    /// The outline as a single counter-clockwise loop: the right side in
    /// stroke order followed by the left side reversed.
    pub fn combined_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.right_indices
            .iter()
            .copied()
            .chain(self.left_indices.iter().rev().copied())
    }

    fn append_new_indices(&mut self, left: &[u32], right: &[u32]) {
        self.left_indices.extend_from_slice(left);
        self.right_indices.extend_from_slice(right);
    }

    fn truncate_indices(&mut self, left_count: usize, right_count: usize) {
        self.left_indices.truncate(left_count);
        self.right_indices.truncate(right_count);
    }

    fn index_counts(&self) -> (usize, usize) {
        (self.left_indices.len(), self.right_indices.len())
    }
}

// Incrementally maintained bounding data for the current stroke.
#[derive(Clone, Debug, Default)]
struct Bounds {
    // Bounds of the mesh prefix that is unlikely to change again; kept so
    // `update_current_bounds` does not re-traverse the whole stroke. Must
    // be cleared whenever a contributing vertex is mutated or deleted.
    cached_partial: Envelope,
    // How many leading indices of each side contributed to the cache.
    cached_partial_left_index_count: usize,
    cached_partial_right_index_count: usize,
    // The complete current bounding region.
    current: Envelope,
}

// Within ~0.8% of the optimal intermediate state after seven bisections.
const MAX_CONSTRAIN_ITERATIONS: u32 = 7;

// Constrained states interpolated less than this far toward the proposal
// are rejected (unless last in the batch): accepting them would keep the
// tip from catching up with fast-changing input.
const MINIMUM_LERP_AMOUNT: f32 = 0.1;

/// Generates extruded stroke geometry; see the module documentation.
///
/// All buffers are owned by the extruder and reused across strokes;
/// `start_stroke` clears them but preserves capacity.
#[derive(Debug)]
pub struct BrushTipExtruder {
    // Tip data and break-points for the stroke, never holding two
    // break-points in a row.
    extrusions: Vec<BrushTipExtrusion>,
    // The size of `extrusions` at the last `save()` or `start_stroke()`.
    saved_extrusion_count: usize,
    // Extrusions present at the last save point that a volatile
    // containment-clear deleted; replayed verbatim by `restore()`.
    deleted_save_point_extrusions: Vec<BrushTipExtrusion>,

    brush_epsilon: f32,
    // Bounds the error when approximating arcs with polylines.
    max_chord_height: f32,
    // Threshold under which outline points are simplified away.
    simplification_threshold: f32,
    surface_uv: SurfaceUv,

    current_extrusion_points: ExtrusionPoints,
    geometry: Geometry,
    derivative_calculator: DerivativeCalculator,
    bounds: Bounds,

    // Used outlines; `outlines` keeps discarded storage for reuse.
    outline_count: usize,
    outlines: Vec<StrokeOutline>,
}

impl Default for BrushTipExtruder {
    fn default() -> Self {
        BrushTipExtruder::new()
    }
}

impl BrushTipExtruder {
    pub fn new() -> Self {
        BrushTipExtruder {
            extrusions: Vec::new(),
            saved_extrusion_count: 0,
            deleted_save_point_extrusions: Vec::new(),
            brush_epsilon: 0.0,
            max_chord_height: 0.0,
            simplification_threshold: 0.0,
            surface_uv: SurfaceUv::None,
            current_extrusion_points: ExtrusionPoints::default(),
            geometry: Geometry::new(),
            derivative_calculator: DerivativeCalculator::new(),
            bounds: Bounds::default(),
            outline_count: 1,
            outlines: vec![StrokeOutline::default()],
        }
    }

    /// Starts a new stroke, clearing any previously extruded data.
    ///
    /// `brush_epsilon` must be greater than zero; it is the minimum
    /// distance at which two points are considered distinct, and controls
    /// both the fidelity of arc approximation and the width/height
    /// threshold below which a tip state becomes a break-point.
    pub fn start_stroke(&mut self, brush_epsilon: f32, surface_uv: SurfaceUv) {
        assert!(brush_epsilon > 0.0, "brush_epsilon must be positive");
        self.brush_epsilon = brush_epsilon;
        self.max_chord_height = brush_epsilon;
        self.simplification_threshold = brush_epsilon;
        self.surface_uv = surface_uv;
        self.extrusions.clear();
        self.saved_extrusion_count = 0;
        self.deleted_save_point_extrusions.clear();
        self.geometry.reset();
        self.bounds = Bounds::default();
        // Greedily allocate the first outline slot.
        self.outline_count = 1;
        if self.outlines.is_empty() {
            self.outlines.push(StrokeOutline::default());
        }
        for outline in &mut self.outlines {
            outline.truncate_indices(0, 0);
        }
    }

    /// Extends the stroke with new `fixed` and `volatile` tip states.
    ///
    /// Any volatile extrusions from the previous call are reverted first;
    /// the returned update covers both the reverted geometry and the
    /// changes from the new states.
    pub fn extend_stroke(&mut self, fixed: &[TipState], volatile: &[TipState]) -> StrokeShapeUpdate {
        assert!(self.brush_epsilon > 0.0, "start_stroke has not been called");

        self.geometry.reset_mutation_tracking();
        let triangle_count_before = self.geometry.mesh().triangle_count();
        let vertex_count_before = self.geometry.mesh().vertex_count();

        self.restore();

        for (i, state) in fixed.iter().enumerate() {
            let is_last = volatile.is_empty() && i + 1 == fixed.len();
            self.extrude(state, false, is_last);
        }

        self.update_cached_partial_bounds();
        self.save();

        for (i, state) in volatile.iter().enumerate() {
            self.extrude(state, true, i + 1 == volatile.len());
        }

        self.extrude_break_point();

        {
            let Self {
                geometry,
                derivative_calculator,
                ..
            } = self;
            geometry.update_mutated_mesh_region(|left, right, mesh| {
                derivative_calculator.update_mesh(left, right, mesh);
            });
        }

        self.update_current_bounds();
        self.construct_update(triangle_count_before, vertex_count_before)
    }

    /// The bounding region of all positions extruded into the mesh.
    #[inline]
    pub fn bounds(&self) -> &Envelope {
        &self.bounds.current
    }

    /// The outlines of the stroke so far, ordered by the break-point they
    /// follow. The first outline is allocated greedily, so a stroke
    /// without geometry reports one empty outline.
    #[inline]
    pub fn outlines(&self) -> &[StrokeOutline] {
        &self.outlines[..self.outline_count]
    }

    /// The stroke mesh extruded so far.
    #[inline]
    pub fn mesh(&self) -> &StrokeMesh {
        self.geometry.mesh()
    }

    fn construct_update(
        &self,
        triangle_count_before: u32,
        vertex_count_before: u32,
    ) -> StrokeShapeUpdate {
        let mesh = self.geometry.mesh();
        let mut update = StrokeShapeUpdate {
            region: self.geometry.calculate_visually_updated_region(),
            first_index_offset: None,
            first_vertex_offset: None,
        };
        if mesh.first_mutated_triangle() != mesh.triangle_count()
            || mesh.triangle_count() != triangle_count_before
        {
            update.first_index_offset = Some(3 * mesh.first_mutated_triangle());
        }
        if mesh.first_mutated_vertex() != mesh.vertex_count()
            || mesh.vertex_count() != vertex_count_before
        {
            update.first_vertex_offset = Some(mesh.first_mutated_vertex());
        }
        update
    }

    fn save(&mut self) {
        self.saved_extrusion_count = self.extrusions.len();
        self.deleted_save_point_extrusions.clear();
        self.geometry.set_save_point();
    }

    fn restore(&mut self) {
        // Reinstate the extrusion list as of the last save: drop the
        // volatile tail and replay any pre-save extrusions that a
        // containment clear deleted during volatile extrusion.
        let replay_start = self.saved_extrusion_count - self.deleted_save_point_extrusions.len();
        self.extrusions.truncate(replay_start);
        self.extrusions
            .extend(self.deleted_save_point_extrusions.iter().cloned());
        self.geometry.revert_to_save_point();
        self.truncate_outlines();
    }

    // Truncates the outline list and the outline after the last break to
    // match the current geometry.
    fn truncate_outlines(&mut self) {
        let max_outline_count = self.geometry.extrusion_break_count() + 1;
        if self.outline_count >= max_outline_count {
            self.outline_count = max_outline_count;
            let counts_at_break = self.geometry.index_counts_at_last_break();
            let left = self
                .geometry
                .first_mutated_left_index_offset_in_current_partition()
                - counts_at_break.left;
            let right = self
                .geometry
                .first_mutated_right_index_offset_in_current_partition()
                - counts_at_break.right;
            self.outlines[self.outline_count - 1].truncate_indices(left, right);
        }
        let first_unused = max_outline_count.min(self.outlines.len());
        for outline in &mut self.outlines[first_unused..] {
            outline.truncate_indices(0, 0);
        }
    }

    fn clear_cached_partial_bounds(&mut self) {
        self.bounds.cached_partial = Envelope::new();
        self.bounds.cached_partial_left_index_count = 0;
        self.bounds.cached_partial_right_index_count = 0;
    }

    // Expects to run right after the fixed states of an `extend_stroke`
    // call have been extruded, before any volatile state.
    fn update_cached_partial_bounds(&mut self) {
        let mesh = self.geometry.mesh();
        update_cached_partial_bounds_for_side(
            mesh,
            &self.geometry.left_side().indices,
            &mut self.bounds.cached_partial,
            &mut self.bounds.cached_partial_left_index_count,
        );
        update_cached_partial_bounds_for_side(
            mesh,
            &self.geometry.right_side().indices,
            &mut self.bounds.cached_partial,
            &mut self.bounds.cached_partial_right_index_count,
        );
    }

    fn update_current_bounds(&mut self) {
        self.bounds.current = self.bounds.cached_partial.clone();
        let mesh = self.geometry.mesh();
        for &index in
            &self.geometry.left_side().indices[self.bounds.cached_partial_left_index_count..]
        {
            self.bounds.current.add_point(mesh.position(index));
        }
        for &index in
            &self.geometry.right_side().indices[self.bounds.cached_partial_right_index_count..]
        {
            self.bounds.current.add_point(mesh.position(index));
        }
    }

    // Clears geometry, extrusions and outline indices since the last
    // break in extrusion (or since the start of the stroke).
    fn clear_since_last_break(&mut self, first_extrusion_to_drop: usize, is_volatile: bool) {
        debug_assert!(first_extrusion_to_drop < self.extrusions.len());

        // Extrusions that contributed to the save point must be
        // replayable if `restore()` is called. Nothing is recorded while
        // extruding fixed states (there is no save point to return to),
        // nor when a previous clear already recorded the partition, nor
        // when only post-save extrusions are dropped.
        if is_volatile
            && self.deleted_save_point_extrusions.is_empty()
            && first_extrusion_to_drop < self.saved_extrusion_count
        {
            self.deleted_save_point_extrusions.extend(
                self.extrusions[first_extrusion_to_drop..self.saved_extrusion_count]
                    .iter()
                    .cloned(),
            );
        }

        self.extrusions.truncate(first_extrusion_to_drop);
        self.geometry.clear_since_last_break();
        self.truncate_outlines();
        self.clear_cached_partial_bounds();
    }

    fn extrude(&mut self, state: &TipState, is_volatile: bool, is_last: bool) {
        if state.width < self.brush_epsilon && state.height < self.brush_epsilon {
            self.extrude_break_point();
            return;
        }

        if !self.try_append_non_break(state, is_volatile, is_last) {
            return;
        }

        let max_chord_height = self.max_chord_height;
        let simplification_threshold = self.simplification_threshold;
        let surface_uv = self.surface_uv;
        let Self {
            extrusions,
            current_extrusion_points,
            geometry,
            ..
        } = self;

        let count = extrusions.len();
        let last = match extrusions[count - 1].parts() {
            Some((_, shape)) => shape,
            None => return,
        };
        // With fewer than two non-break extrusions at the tail there is
        // nothing to connect yet.
        let (extruded_state, middle) =
            match extrusions.get(count.wrapping_sub(2)).and_then(BrushTipExtrusion::parts) {
                Some(parts) => parts,
                None => return,
            };

        current_extrusion_points.clear();
        let forward_category = match extrusions
            .get(count.wrapping_sub(3))
            .and_then(BrushTipExtrusion::parts)
        {
            Some((_, start)) => {
                append_turn_extrusion_points(
                    start,
                    middle,
                    last,
                    max_chord_height,
                    current_extrusion_points,
                );
                ForwardCategory::Interior
            }
            // The second-to-last extrusion begins a partition: either the
            // stroke starts here or a break-point precedes it.
            None => {
                append_startcap_extrusion_points(
                    middle,
                    last,
                    max_chord_height,
                    current_extrusion_points,
                );
                ForwardCategory::ExteriorBack
            }
        };

        extrude_geometry(
            current_extrusion_points,
            extruded_state,
            forward_category,
            simplification_threshold,
            surface_uv,
            geometry,
        );
    }

    // Appends a new non-break extrusion for `state`, constrained against
    // the current tail; returns false if the state was rejected.
    fn try_append_non_break(&mut self, state: &TipState, is_volatile: bool, is_last: bool) -> bool {
        let proposed = BrushTipExtrusion::new(*state, self.brush_epsilon);

        let result = match self.extrusions.last() {
            // The first extrusion of a partition interacts with nothing
            // before it.
            None | Some(BrushTipExtrusion::BreakPoint) => {
                self.extrusions.push(proposed);
                return true;
            }
            Some(last) => {
                constrain_extrusion(last, &proposed, self.brush_epsilon, MAX_CONSTRAIN_ITERATIONS)
            }
        };

        match result.result_type {
            ConstrainResultType::ProposedIsValid => {
                self.extrusions.push(proposed);
            }
            ConstrainResultType::ConstrainedFound => {
                if !is_last && result.lerp_amount < MINIMUM_LERP_AMOUNT {
                    return false;
                }
                match result.extrusion {
                    Some(extrusion) => self.extrusions.push(extrusion),
                    None => return false,
                }
            }
            ConstrainResultType::ProposedContainsLast => {
                self.absorb_contained_tail(&proposed, is_volatile);
                self.extrusions.push(proposed);
            }
            // A proposal contained in the last shape adds nothing, and a
            // proposal without a valid intermediate cannot be connected;
            // reject both and leave room for the next sample.
            ConstrainResultType::LastContainsProposed
            | ConstrainResultType::CannotFindIntermediate => return false,
        }
        true
    }

    // Called when `proposed` contains the last extrusion: walks backward
    // through the partition to find how much of it the new shape
    // swallows. A fully contained partition is cleared and restarted; a
    // partially contained one is disconnected with a break-point, keeping
    // its geometry as separate overlapping area.
    fn absorb_contained_tail(&mut self, proposed: &BrushTipExtrusion, is_volatile: bool) {
        let proposed_shape = match proposed.parts() {
            Some((_, shape)) => shape,
            None => return,
        };

        let mut first_contained = self.extrusions.len();
        let mut all_contained = true;
        while first_contained > 0 {
            match self.extrusions[first_contained - 1].parts() {
                // Reached the break-point starting this partition.
                None => break,
                Some((_, shape)) => {
                    if !proposed_shape.contains(shape) {
                        all_contained = false;
                        break;
                    }
                }
            }
            first_contained -= 1;
        }

        if all_contained {
            self.clear_since_last_break(first_contained, is_volatile);
        } else {
            self.extrude_break_point();
        }
    }

    /// Closes the current partition: extrudes an endcap (or the whole
    /// shape, for a single-sample partition), snapshots the outline, and
    /// appends a break-point. A no-op when the stroke is empty or already
    /// ends in a break-point.
    fn extrude_break_point(&mut self) {
        let max_chord_height = self.max_chord_height;
        let simplification_threshold = self.simplification_threshold;
        let surface_uv = self.surface_uv;
        {
            let Self {
                extrusions,
                current_extrusion_points,
                geometry,
                ..
            } = self;

            let count = extrusions.len();
            let (last_state, last_shape) =
                match extrusions.last().and_then(BrushTipExtrusion::parts) {
                    Some(parts) => parts,
                    None => return,
                };

            current_extrusion_points.clear();
            match extrusions
                .get(count.wrapping_sub(2))
                .and_then(BrushTipExtrusion::parts)
            {
                Some((_, second_to_last_shape)) => {
                    append_endcap_extrusion_points(
                        second_to_last_shape,
                        last_shape,
                        max_chord_height,
                        current_extrusion_points,
                    );
                    extrude_geometry(
                        current_extrusion_points,
                        last_state,
                        ForwardCategory::ExteriorFront,
                        simplification_threshold,
                        surface_uv,
                        geometry,
                    );
                }
                // The last extrusion begins its partition; it is rendered
                // as a stand-alone dot.
                None => {
                    append_whole_shape_extrusion_points(
                        last_shape,
                        max_chord_height,
                        vector(1.0, 0.0),
                        current_extrusion_points,
                    );
                    extrude_geometry(
                        current_extrusion_points,
                        last_state,
                        ForwardCategory::ExteriorBack,
                        simplification_threshold,
                        surface_uv,
                        geometry,
                    );
                }
            }
        }

        let counts_at_last_break = self.geometry.index_counts_at_last_break();
        let index_counts = self.geometry.index_counts();
        let new_vertex_count = index_counts.left - counts_at_last_break.left + index_counts.right
            - counts_at_last_break.right;
        if new_vertex_count == 0 {
            return;
        }
        if new_vertex_count < 3 {
            // Not enough geometry since the last break to draw anything.
            self.geometry.clear_since_last_break();
            return;
        }

        if self.outlines.len() == self.geometry.extrusion_break_count() {
            self.outlines.push(StrokeOutline::default());
        }
        // Completing a new outline rather than refinishing one that a
        // restore truncated.
        if self.outline_count == self.geometry.extrusion_break_count() {
            self.outline_count += 1;
        }

        self.geometry.add_extrusion_break();
        self.extrusions.push(BrushTipExtrusion::BreakPoint);

        let outline = &mut self.outlines[self.outline_count - 1];
        let (outline_left_count, outline_right_count) = outline.index_counts();
        outline.append_new_indices(
            &self.geometry.left_side().indices[counts_at_last_break.left + outline_left_count..],
            &self.geometry.right_side().indices
                [counts_at_last_break.right + outline_right_count..],
        );
        debug_assert!(outline.index_count() >= 3);
    }
}

fn update_cached_partial_bounds_for_side(
    mesh: &StrokeMesh,
    indices: &[u32],
    cached_partial: &mut Envelope,
    cached_index_count: &mut usize,
) {
    debug_assert!(*cached_index_count <= indices.len());
    let mut new_indices = &indices[*cached_index_count..];
    // The last index of a side may still be simplified away by the next
    // extrusion, which would leave the cache too large by up to the
    // simplification threshold on each side; it is picked up by the
    // complete-bounds pass instead.
    if !new_indices.is_empty() {
        new_indices = &new_indices[..new_indices.len() - 1];
    }
    for &index in new_indices {
        cached_partial.add_point(mesh.position(index));
    }
    *cached_index_count += new_indices.len();
}

// Maps vertex positions of the particle generated from `state` to
// texture surface UV coordinates, from tip size, position and rotation;
// slant, pinch and corner rounding deliberately do not affect UVs.
fn particle_surface_uv_transform(state: &TipState) -> Transform {
    Transform::translation(-state.position.x, -state.position.y)
        .then(&Transform::rotation(-state.rotation))
        .then(&Transform::scale(1.0 / state.width, 1.0 / state.height))
        .then(&Transform::translation(0.5, 0.5))
}

// Appends and processes the new left and right outline points of one
// extruded state.
fn extrude_geometry(
    points: &ExtrusionPoints,
    state: &TipState,
    forward_category: ForwardCategory,
    simplification_threshold: f32,
    surface_uv: SurfaceUv,
    geometry: &mut Geometry,
) {
    // Color shifts are packed into [-1, 1]; the attributes that represent
    // [0, 2] multipliers are shifted down here and decoded by the
    // renderer.
    let opacity_shift = state.opacity_multiplier - 1.0;
    let hsl_shift = [
        state.hue_offset_in_full_turns,
        state.saturation_multiplier - 1.0,
        state.luminosity_shift,
    ];
    let particle_uv_transform = particle_surface_uv_transform(state);

    let to_vertex = |position: Point, side: SideId| -> ExtrudedVertex {
        let surface_uv_point = match surface_uv {
            SurfaceUv::None => point(0.0, 0.0),
            SurfaceUv::ContinuousStroke => point(
                if side == SideId::Left { 0.0 } else { 1.0 },
                state.traveled_distance,
            ),
            SurfaceUv::Particles => {
                let transformed = particle_uv_transform.transform_point(position);
                // Floating-point precision loss can land transformed
                // positions slightly outside the unit square.
                point(
                    transformed.x.clamp(0.0, 1.0),
                    transformed.y.clamp(0.0, 1.0),
                )
            }
        };
        ExtrudedVertex {
            position,
            opacity_shift,
            hsl_shift,
            surface_uv: surface_uv_point,
            animation_offset: state.texture_animation_progress_offset,
            // The side category is assigned by the geometry engine when
            // the vertex is appended.
            side_category: SideCategory::Interior,
            forward_category,
            side_derivative: vector(0.0, 0.0),
            forward_derivative: vector(0.0, 0.0),
            side_margin: 0.0,
        }
    };

    for &position in &points.left {
        geometry.append_left_vertex(to_vertex(position, SideId::Left));
    }
    for &position in &points.right {
        geometry.append_right_vertex(to_vertex(position, SideId::Right));
    }
    geometry.process_new_vertices(simplification_threshold, state);
}
