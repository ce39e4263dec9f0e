//! The incremental triangulation and self-intersection engine.
//!
//! Outline vertices arrive through `append_left_vertex` /
//! `append_right_vertex` and are committed to the mesh by
//! `process_new_vertices`, which simplifies nearly-straight runs,
//! zig-zags triangles between the two sides, and watches each side's
//! outline for self-intersections. A detected intersection is repaired by
//! fanning triangles around the pivot vertex within a bounded reposition
//! budget; running out of budget ends the repair as a visible
//! discontinuity instead.

use crate::mesh::{ExtrudedVertex, SideCategory, StrokeMesh};
use crate::side::{PartitionStart, SelfIntersection, Side, SideId};
use crate::simplify::simplify_polyline_indices;
use crate::tip_state::TipState;

use tracery_geom::math::Point;
use tracery_geom::{Envelope, LineSegment, Triangle};

#[cfg(debug_assertions)]
macro_rules! ext_log {
    ($obj:ident, $fmt:expr) => (
        if $obj.log {
            println!($fmt);
        }
    );
    ($obj:ident, $fmt:expr, $($arg:tt)*) => (
        if $obj.log {
            println!($fmt, $($arg)*);
        }
    );
}

#[cfg(not(debug_assertions))]
macro_rules! ext_log {
    ($obj:ident, $fmt:expr) => {};
    ($obj:ident, $fmt:expr, $($arg:tt)*) => {};
}

/// Committed outline index counts for the two sides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexCounts {
    pub left: usize,
    pub right: usize,
}

// How many recent outline segments of each side are scanned when testing
// a new segment for self-intersection. Loops form in recently extruded
// geometry, so a bounded window keeps the per-vertex cost constant.
const CROSSING_SCAN_WINDOW: usize = 64;

#[derive(Clone, Debug)]
struct SideSave {
    index_count: usize,
    vertex_buffer: Vec<ExtrudedVertex>,
    next_buffered_vertex_offset: usize,
    partition_start: PartitionStart,
    discontinuity_count: usize,
    last_simplified_vertex_positions: Vec<Point>,
    intersection: Option<SelfIntersection>,
}

#[derive(Clone, Debug)]
struct SavePoint {
    vertex_count: u32,
    triangle_count: u32,
    extrusion_break_count: usize,
    index_counts_at_last_break: IndexCounts,
    triangle_count_at_last_break: u32,
    vertex_count_at_last_break: u32,
    left: SideSave,
    right: SideSave,
    // Journals of pre-save data mutated after the save; replayed in
    // reverse so the oldest recorded value wins.
    vertex_journal: Vec<(u32, ExtrudedVertex)>,
    triangle_journal: Vec<(u32, [u32; 3])>,
    left_index_journal: Vec<(usize, u32)>,
    right_index_journal: Vec<(usize, u32)>,
}

/// The mesh-growing state machine shared by every stroke of one extruder.
#[derive(Debug)]
pub struct Geometry {
    mesh: StrokeMesh,
    left: Side,
    right: Side,
    extrusion_break_count: usize,
    index_counts_at_last_break: IndexCounts,
    triangle_count_at_last_break: u32,
    vertex_count_at_last_break: u32,
    save_point: Option<SavePoint>,
    simplification_scratch: Vec<usize>,
    log: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::new()
    }
}

impl Geometry {
    pub fn new() -> Self {
        Geometry {
            mesh: StrokeMesh::new(),
            left: Side::new(SideId::Left),
            right: Side::new(SideId::Right),
            extrusion_break_count: 0,
            index_counts_at_last_break: IndexCounts::default(),
            triangle_count_at_last_break: 0,
            vertex_count_at_last_break: 0,
            save_point: None,
            simplification_scratch: Vec::new(),
            log: false,
        }
    }

    /// Enables printing of the engine's internal events in debug builds.
    pub fn set_logging(&mut self, enabled: bool) {
        self.log = enabled;
    }

    /// Clears all stroke state, preserving allocations.
    pub fn reset(&mut self) {
        self.mesh.clear();
        self.left.reset();
        self.right.reset();
        self.extrusion_break_count = 0;
        self.index_counts_at_last_break = IndexCounts::default();
        self.triangle_count_at_last_break = 0;
        self.vertex_count_at_last_break = 0;
        self.save_point = None;
    }

    #[inline]
    pub fn mesh(&self) -> &StrokeMesh {
        &self.mesh
    }

    #[inline]
    pub fn left_side(&self) -> &Side {
        &self.left
    }

    #[inline]
    pub fn right_side(&self) -> &Side {
        &self.right
    }

    #[inline]
    pub fn extrusion_break_count(&self) -> usize {
        self.extrusion_break_count
    }

    #[inline]
    pub fn index_counts(&self) -> IndexCounts {
        IndexCounts {
            left: self.left.indices.len(),
            right: self.right.indices.len(),
        }
    }

    #[inline]
    pub fn index_counts_at_last_break(&self) -> IndexCounts {
        self.index_counts_at_last_break
    }

    /// Appends a pending vertex on the left outline. The first vertex of
    /// a partition is committed to the mesh immediately; the rest wait in
    /// the side's buffer for `process_new_vertices`.
    pub fn append_left_vertex(&mut self, mut vertex: ExtrudedVertex) {
        vertex.side_category = SideCategory::ExteriorLeft;
        append_side_vertex(&mut self.mesh, &mut self.left, vertex);
    }

    /// Appends a pending vertex on the right outline.
    pub fn append_right_vertex(&mut self, mut vertex: ExtrudedVertex) {
        vertex.side_category = SideCategory::ExteriorRight;
        append_side_vertex(&mut self.mesh, &mut self.right, vertex);
    }

    /// Commits the buffered vertices of both sides: simplification, then
    /// zig-zag triangulation with self-intersection handling.
    pub fn process_new_vertices(&mut self, simplification_threshold: f32, tip_state: &TipState) {
        self.simplify_side(SideId::Left, simplification_threshold);
        self.simplify_side(SideId::Right, simplification_threshold);

        // Triangles need at least one committed vertex on each side;
        // otherwise the pending vertices stay buffered for a later call.
        if self.left.partition_index_count() == 0 || self.right.partition_index_count() == 0 {
            return;
        }

        {
            let Geometry {
                mesh, left, right, ..
            } = self;

            loop {
                let left_pending = left.pending_count() > 0;
                let right_pending = right.pending_count() > 0;
                if !left_pending && !right_pending {
                    break;
                }
                let choose_right = if left_pending && right_pending {
                    right.next_buffered_vertex_offset <= left.next_buffered_vertex_offset
                } else {
                    right_pending
                };
                if choose_right {
                    let vertex = right.vertex_buffer[right.next_buffered_vertex_offset];
                    right.next_buffered_vertex_offset += 1;
                    process_proposed_vertex(
                        mesh,
                        right,
                        left,
                        simplification_threshold,
                        tip_state,
                        vertex,
                    );
                } else {
                    let vertex = left.vertex_buffer[left.next_buffered_vertex_offset];
                    left.next_buffered_vertex_offset += 1;
                    process_proposed_vertex(
                        mesh,
                        left,
                        right,
                        simplification_threshold,
                        tip_state,
                        vertex,
                    );
                }
            }
        }

        // A proposal deferred while the other side owned mesh mutation is
        // retried once that side's intersection resolves.
        for _ in 0..2 {
            let mut retried = false;
            if let Some(vertex) = deferred_proposal_ready(&self.left, &self.right) {
                process_proposed_vertex(
                    &mut self.mesh,
                    &mut self.left,
                    &mut self.right,
                    simplification_threshold,
                    tip_state,
                    vertex,
                );
                retried = true;
            }
            if let Some(vertex) = deferred_proposal_ready(&self.right, &self.left) {
                process_proposed_vertex(
                    &mut self.mesh,
                    &mut self.right,
                    &mut self.left,
                    simplification_threshold,
                    tip_state,
                    vertex,
                );
                retried = true;
            }
            if !retried {
                break;
            }
        }

        retain_buffer_context(&self.mesh, &mut self.left);
        retain_buffer_context(&self.mesh, &mut self.right);

        ext_log!(
            self,
            "processed vertices: {} left / {} right committed, {} triangles",
            self.left.indices.len(),
            self.right.indices.len(),
            self.mesh.triangle_count()
        );
    }

    fn simplify_side(&mut self, id: SideId, threshold: f32) {
        if threshold <= 0.0 {
            return;
        }
        let Geometry {
            mesh,
            left,
            right,
            save_point,
            simplification_scratch,
            ..
        } = self;
        let (side, opposite) = match id {
            SideId::Left => (left, right),
            SideId::Right => (right, left),
        };
        if side.pending_count() == 0 {
            return;
        }

        simplify_polyline_indices(&side.vertex_buffer, threshold, simplification_scratch);
        if simplification_scratch.len() == side.vertex_buffer.len() {
            return;
        }

        let committed = side.next_buffered_vertex_offset;
        let kept = &*simplification_scratch;

        // Replacing the last committed vertex is only allowed when no
        // existing triangle flips to clockwise winding, the replacement
        // does not land on a position simplification removed earlier, and
        // the enlarged triangles do not swallow the opposite side's
        // pre-intersection outline.
        let mut replacement: Option<(u32, usize)> = None;
        if committed == 2 && !kept.contains(&1) {
            if let (Some(kept_after), Some(&last_index)) = (
                kept.iter().copied().find(|&k| k > 1),
                side.indices.last(),
            ) {
                let candidate_position = side.vertex_buffer[kept_after].position;
                if replacement_is_safe(mesh, side, opposite, last_index, candidate_position, threshold)
                {
                    replacement = Some((last_index, kept_after));
                }
            }
        }

        // Record the removed pending positions so a later pass cannot
        // restore them.
        for i in committed..side.vertex_buffer.len() {
            let consumed_by_replacement = replacement.map_or(false, |(_, r)| r == i);
            if !kept.contains(&i) && !consumed_by_replacement {
                side.last_simplified_vertex_positions
                    .push(side.vertex_buffer[i].position);
            }
        }

        let mut new_buffer: Vec<ExtrudedVertex> = Vec::with_capacity(kept.len());
        if let Some((last_index, kept_after)) = replacement {
            let mut candidate = side.vertex_buffer[kept_after];
            candidate.side_category = mesh.vertex(last_index).side_category;
            side.last_simplified_vertex_positions
                .push(mesh.position(last_index));
            set_vertex_with_journal(mesh, save_point, last_index, candidate);
            side.first_mutated_index_offset = side
                .first_mutated_index_offset
                .min(side.indices.len().saturating_sub(1));
            new_buffer.extend_from_slice(&side.vertex_buffer[..committed - 1]);
            new_buffer.push(candidate);
            new_buffer.extend(
                kept.iter()
                    .copied()
                    .filter(|&k| k > kept_after)
                    .map(|k| side.vertex_buffer[k]),
            );
        } else {
            new_buffer.extend_from_slice(&side.vertex_buffer[..committed]);
            new_buffer.extend(
                kept.iter()
                    .copied()
                    .filter(|&k| k >= committed)
                    .map(|k| side.vertex_buffer[k]),
            );
        }
        side.vertex_buffer = new_buffer;
        side.next_buffered_vertex_offset = committed;
    }

    /// Records the state needed to revert everything extruded afterwards.
    pub fn set_save_point(&mut self) {
        self.save_point = Some(SavePoint {
            vertex_count: self.mesh.vertex_count(),
            triangle_count: self.mesh.triangle_count(),
            extrusion_break_count: self.extrusion_break_count,
            index_counts_at_last_break: self.index_counts_at_last_break,
            triangle_count_at_last_break: self.triangle_count_at_last_break,
            vertex_count_at_last_break: self.vertex_count_at_last_break,
            left: save_side(&self.left),
            right: save_side(&self.right),
            vertex_journal: Vec::new(),
            triangle_journal: Vec::new(),
            left_index_journal: Vec::new(),
            right_index_journal: Vec::new(),
        });
    }

    /// Returns the engine to the state recorded by `set_save_point`; a
    /// no-op when no save point is armed. The save point stays armed.
    pub fn revert_to_save_point(&mut self) {
        let save = match &mut self.save_point {
            Some(save) => save,
            None => return,
        };

        // Truncate growth, regrow anything the volatile tail deleted, and
        // replay the journals backwards so the oldest value wins.
        if self.mesh.vertex_count() > save.vertex_count {
            self.mesh.truncate_vertices(save.vertex_count);
        }
        while self.mesh.vertex_count() < save.vertex_count {
            self.mesh
                .append_vertex(ExtrudedVertex::at_position(Point::new(0.0, 0.0)));
        }
        if self.mesh.triangle_count() > save.triangle_count {
            self.mesh.truncate_triangles(save.triangle_count);
        }
        while self.mesh.triangle_count() < save.triangle_count {
            self.mesh.append_triangle(0, 0, 0);
        }
        for &(index, vertex) in save.vertex_journal.iter().rev() {
            self.mesh.set_vertex(index, vertex);
        }
        for &(triangle, indices) in save.triangle_journal.iter().rev() {
            self.mesh.set_triangle_indices(triangle, indices);
        }

        restore_side(&mut self.left, &save.left, &save.left_index_journal);
        restore_side(&mut self.right, &save.right, &save.right_index_journal);

        self.extrusion_break_count = save.extrusion_break_count;
        self.index_counts_at_last_break = save.index_counts_at_last_break;
        self.triangle_count_at_last_break = save.triangle_count_at_last_break;
        self.vertex_count_at_last_break = save.vertex_count_at_last_break;

        save.vertex_journal.clear();
        save.triangle_journal.clear();
        save.left_index_journal.clear();
        save.right_index_journal.clear();
    }

    /// Drops everything extruded since the last break-point (or since the
    /// start of the stroke).
    pub fn clear_since_last_break(&mut self) {
        let vertex_count = self.vertex_count_at_last_break;
        let triangle_count = self.triangle_count_at_last_break;
        let index_counts = self.index_counts_at_last_break;

        let Geometry {
            mesh,
            left,
            right,
            save_point,
            ..
        } = self;

        truncate_vertices_with_journal(mesh, save_point, vertex_count);
        truncate_triangles_with_journal(mesh, save_point, triangle_count);
        truncate_side_indices_with_journal(left, save_point, index_counts.left);
        truncate_side_indices_with_journal(right, save_point, index_counts.right);

        let left_count = left.indices.len();
        let right_count = right.indices.len();
        for side in [&mut *left, &mut *right].iter_mut() {
            side.vertex_buffer.clear();
            side.next_buffered_vertex_offset = 0;
            side.intersection = None;
            side.last_simplified_vertex_positions.clear();
            side.first_mutated_index_offset =
                side.first_mutated_index_offset.min(side.indices.len());
            side.partition_start.first_index_offset = side.indices.len();
            side.partition_start.first_triangle = mesh.triangle_count();
            side.partition_start.outline_connects_sides = true;
            side.partition_start.is_forward_exterior = true;
        }
        left.partition_start.opposite_first_index_offset = right_count;
        right.partition_start.opposite_first_index_offset = left_count;
    }

    /// Starts a new partition at the current end of both outlines.
    pub fn add_extrusion_break(&mut self) {
        self.extrusion_break_count += 1;
        self.index_counts_at_last_break = self.index_counts();
        self.triangle_count_at_last_break = self.mesh.triangle_count();
        self.vertex_count_at_last_break = self.mesh.vertex_count();

        let left_count = self.left.indices.len();
        let right_count = self.right.indices.len();
        let triangle_count = self.mesh.triangle_count();
        for (side, opposite_count) in
            [(&mut self.left, right_count), (&mut self.right, left_count)]
                .iter_mut()
        {
            side.partition_start = PartitionStart {
                first_index_offset: side.indices.len(),
                opposite_first_index_offset: *opposite_count,
                first_triangle: triangle_count,
                outline_connects_sides: true,
                is_forward_exterior: true,
            };
            side.vertex_buffer.clear();
            side.next_buffered_vertex_offset = 0;
            side.intersection = None;
            side.last_simplified_vertex_positions.clear();
        }
    }

    /// Forgets the mutations accumulated since the last call.
    pub fn reset_mutation_tracking(&mut self) {
        self.mesh.reset_mutation_tracking();
        self.left.first_mutated_index_offset = self.left.indices.len();
        self.right.first_mutated_index_offset = self.right.indices.len();
    }

    /// First left-outline offset, relative to the whole outline, that a
    /// renderer needs to repaint; never before the last break.
    pub fn first_mutated_left_index_offset_in_current_partition(&self) -> usize {
        self.left
            .first_mutated_index_offset
            .max(self.index_counts_at_last_break.left)
    }

    pub fn first_mutated_right_index_offset_in_current_partition(&self) -> usize {
        self.right
            .first_mutated_index_offset
            .max(self.index_counts_at_last_break.right)
    }

    /// The union of everything whose appearance may have changed since
    /// mutation tracking was last reset: mutated and appended vertices,
    /// mutated and appended triangles, and every triangle an open
    /// intersection may still rewrite.
    pub fn calculate_visually_updated_region(&self) -> Envelope {
        let mut region = Envelope::new();
        for index in self.mesh.first_mutated_vertex()..self.mesh.vertex_count() {
            region.add_point(self.mesh.position(index));
        }
        let mut first_triangle = self.mesh.first_mutated_triangle();
        for side in [&self.left, &self.right].iter() {
            if let Some(intersection) = &side.intersection {
                if intersection.retriangulation_started {
                    first_triangle =
                        first_triangle.min(intersection.oldest_retriangulation_triangle);
                }
            }
        }
        for triangle in first_triangle..self.mesh.triangle_count() {
            let [a, b, c] = self.mesh.triangle_indices(triangle);
            region.add_point(self.mesh.position(a));
            region.add_point(self.mesh.position(b));
            region.add_point(self.mesh.position(c));
        }
        region
    }

    /// Runs `update` with the mesh and the outline index ranges mutated
    /// since tracking was last reset. Used to recompute vertex
    /// derivatives in one pass at the end of an extrusion.
    pub fn update_mutated_mesh_region<F>(&mut self, mut update: F)
    where
        F: FnMut(&[u32], &[u32], &mut StrokeMesh),
    {
        let first_vertex = self.mesh.first_mutated_vertex();
        let left_start = first_index_at_or_above(&self.left.indices, first_vertex)
            .min(self.left.first_mutated_index_offset)
            .min(self.left.indices.len());
        let right_start = first_index_at_or_above(&self.right.indices, first_vertex)
            .min(self.right.first_mutated_index_offset)
            .min(self.right.indices.len());
        update(
            &self.left.indices[left_start..],
            &self.right.indices[right_start..],
            &mut self.mesh,
        );
    }
}

fn first_index_at_or_above(indices: &[u32], minimum: u32) -> usize {
    let mut start = indices.len();
    while start > 0 && indices[start - 1] >= minimum {
        start -= 1;
    }
    start
}

fn save_side(side: &Side) -> SideSave {
    SideSave {
        index_count: side.indices.len(),
        vertex_buffer: side.vertex_buffer.clone(),
        next_buffered_vertex_offset: side.next_buffered_vertex_offset,
        partition_start: side.partition_start,
        discontinuity_count: side.intersection_discontinuities.len(),
        last_simplified_vertex_positions: side.last_simplified_vertex_positions.clone(),
        intersection: side.intersection.clone(),
    }
}

fn restore_side(side: &mut Side, save: &SideSave, index_journal: &[(usize, u32)]) {
    side.indices.truncate(save.index_count);
    side.indices.resize(save.index_count, 0);
    for &(offset, index) in index_journal.iter().rev() {
        side.indices[offset] = index;
    }
    side.first_mutated_index_offset = side.first_mutated_index_offset.min(save.index_count);
    side.vertex_buffer.clear();
    side.vertex_buffer.extend_from_slice(&save.vertex_buffer);
    side.next_buffered_vertex_offset = save.next_buffered_vertex_offset;
    side.partition_start = save.partition_start;
    side.intersection_discontinuities
        .truncate(save.discontinuity_count);
    side.last_simplified_vertex_positions.clear();
    side.last_simplified_vertex_positions
        .extend_from_slice(&save.last_simplified_vertex_positions);
    side.intersection = save.intersection.clone();
}

fn set_vertex_with_journal(
    mesh: &mut StrokeMesh,
    save_point: &mut Option<SavePoint>,
    index: u32,
    vertex: ExtrudedVertex,
) {
    if let Some(save) = save_point {
        if index < save.vertex_count {
            save.vertex_journal.push((index, *mesh.vertex(index)));
        }
    }
    mesh.set_vertex(index, vertex);
}

fn truncate_vertices_with_journal(
    mesh: &mut StrokeMesh,
    save_point: &mut Option<SavePoint>,
    count: u32,
) {
    if let Some(save) = save_point {
        let journal_until = save.vertex_count.min(mesh.vertex_count());
        for index in count..journal_until {
            save.vertex_journal.push((index, *mesh.vertex(index)));
        }
    }
    if count < mesh.vertex_count() {
        mesh.truncate_vertices(count);
    }
}

fn truncate_triangles_with_journal(
    mesh: &mut StrokeMesh,
    save_point: &mut Option<SavePoint>,
    count: u32,
) {
    if let Some(save) = save_point {
        let journal_until = save.triangle_count.min(mesh.triangle_count());
        for triangle in count..journal_until {
            save.triangle_journal
                .push((triangle, mesh.triangle_indices(triangle)));
        }
    }
    if count < mesh.triangle_count() {
        mesh.truncate_triangles(count);
    }
}

fn truncate_side_indices_with_journal(
    side: &mut Side,
    save_point: &mut Option<SavePoint>,
    count: usize,
) {
    if let Some(save) = save_point {
        let (saved_count, journal) = match side.id {
            SideId::Left => (save.left.index_count, &mut save.left_index_journal),
            SideId::Right => (save.right.index_count, &mut save.right_index_journal),
        };
        let journal_until = saved_count.min(side.indices.len());
        for offset in count..journal_until {
            journal.push((offset, side.indices[offset]));
        }
    }
    if count < side.indices.len() {
        side.indices.truncate(count);
        side.first_mutated_index_offset = side.first_mutated_index_offset.min(count);
    }
}

fn append_side_vertex(mesh: &mut StrokeMesh, side: &mut Side, vertex: ExtrudedVertex) {
    side.last_simplified_vertex_positions.clear();
    let first_of_partition = side.partition_index_count() == 0 && side.pending_count() == 0;
    side.vertex_buffer.push(vertex);
    if first_of_partition {
        let index = mesh.append_vertex(vertex);
        side.first_mutated_index_offset = side.first_mutated_index_offset.min(side.indices.len());
        side.indices.push(index);
        side.next_buffered_vertex_offset = side.vertex_buffer.len();
    }
}

fn retain_buffer_context(mesh: &StrokeMesh, side: &mut Side) {
    if side.pending_count() > 0 {
        // Triangulation did not run (the opposite side has nothing
        // committed yet); keep the buffer for the next round.
        return;
    }
    side.vertex_buffer.clear();
    let context = side.partition_index_count().min(2);
    for &index in &side.indices[side.indices.len() - context..] {
        side.vertex_buffer.push(*mesh.vertex(index));
    }
    side.next_buffered_vertex_offset = side.vertex_buffer.len();
}

fn deferred_proposal_ready(side: &Side, opposite: &Side) -> Option<ExtrudedVertex> {
    let opposite_retriangulating = opposite
        .intersection
        .as_ref()
        .map_or(false, |i| i.retriangulation_started);
    if opposite_retriangulating {
        return None;
    }
    match &side.intersection {
        Some(intersection) if intersection.retry_last_proposal => {
            Some(intersection.last_proposed_vertex)
        }
        _ => None,
    }
}

struct Crossing {
    on_own_side: bool,
    // Offset of the crossed segment's start within the crossed side's
    // outline; meaningful for own-side crossings.
    segment_offset: usize,
}

// Whether the probe crosses `segment` anywhere past its own start. The
// start itself is excluded: during intersection repair the outline tip
// sits exactly on the old outline, and a probe leaving outward from
// there is not a crossing.
fn probe_crosses(probe: &LineSegment, segment: &LineSegment) -> bool {
    const PROBE_START_EXCLUSION: f32 = 1e-4;
    match probe.line_intersection_ratios(segment) {
        Some((t, u)) => t > PROBE_START_EXCLUSION && t <= 1.0 && (0.0..=1.0).contains(&u),
        None => {
            // Parallel; only a collinear overlap past the probe start
            // counts.
            if probe.to_vector().cross(segment.from - probe.from) != 0.0 {
                return false;
            }
            let overlaps = |p: tracery_geom::math::Point| match probe.project(p) {
                Some(ratio) => ratio > PROBE_START_EXCLUSION && ratio <= 1.0,
                None => false,
            };
            overlaps(segment.from) || overlaps(segment.to)
        }
    }
}

fn detect_crossing(
    mesh: &StrokeMesh,
    side: &Side,
    opposite: &Side,
    proposal: Point,
) -> Option<Crossing> {
    let &tip_index = side.indices.last()?;
    let tip = mesh.position(tip_index);
    if tip == proposal {
        return None;
    }
    let probe = LineSegment::new(tip, proposal);

    // Own outline, excluding the segment adjacent to the tip.
    if side.partition_index_count() >= 3 {
        let end = side.indices.len() - 2;
        let start = side
            .partition_start
            .first_index_offset
            .max(end.saturating_sub(CROSSING_SCAN_WINDOW));
        for k in start..end {
            let segment = LineSegment::new(
                mesh.position(side.indices[k]),
                mesh.position(side.indices[k + 1]),
            );
            if probe_crosses(&probe, &segment) {
                return Some(Crossing {
                    on_own_side: true,
                    segment_offset: k,
                });
            }
        }
    }

    // The opposite outline, excluding its most recent segment, which
    // legitimately shares the strip front with the probe.
    if opposite.partition_index_count() >= 3 {
        let end = opposite.indices.len() - 2;
        let start = opposite
            .partition_start
            .first_index_offset
            .max(end.saturating_sub(CROSSING_SCAN_WINDOW));
        for k in start..end {
            let segment = LineSegment::new(
                mesh.position(opposite.indices[k]),
                mesh.position(opposite.indices[k + 1]),
            );
            if probe_crosses(&probe, &segment) {
                return Some(Crossing {
                    on_own_side: false,
                    segment_offset: k,
                });
            }
        }
    }

    // A proposal landing within recently committed triangles folds the
    // outline back over the mesh even when no outline segment is
    // crossed (the fold can enter through the strip front).
    let triangle_count = mesh.triangle_count();
    let first_triangle = side
        .partition_start
        .first_triangle
        .max(triangle_count.saturating_sub(CROSSING_SCAN_WINDOW as u32));
    for t in first_triangle..triangle_count {
        if mesh.triangle(t).contains_point_inclusive(proposal) {
            return Some(Crossing {
                on_own_side: false,
                segment_offset: side.indices.len() - 1,
            });
        }
    }
    None
}

fn triangle_area(a: Point, b: Point, c: Point) -> f32 {
    Triangle::new(a, b, c).signed_area()
}

// Appends the strip triangle for a newly committed vertex, flipping the
// winding if the canonical `[left, right, new]` order would be clockwise,
// so that the mesh never holds a clockwise triangle at rest.
fn append_strip_triangle(mesh: &mut StrokeMesh, side: &Side, opposite: &Side, new_index: u32) {
    if side.partition_index_count() < 2 || opposite.partition_index_count() < 1 {
        return;
    }
    let own_previous = side.indices[side.indices.len() - 2];
    let opposite_anchor = *opposite.indices.last().unwrap();
    let (l, r) = match side.id {
        SideId::Left => (own_previous, opposite_anchor),
        SideId::Right => (opposite_anchor, own_previous),
    };
    if triangle_area(mesh.position(l), mesh.position(r), mesh.position(new_index)) >= 0.0 {
        mesh.append_triangle(l, r, new_index);
    } else {
        mesh.append_triangle(l, new_index, r);
    }
}

fn commit_vertex(mesh: &mut StrokeMesh, side: &mut Side, opposite: &Side, vertex: ExtrudedVertex) {
    let index = mesh.append_vertex(vertex);
    side.first_mutated_index_offset = side.first_mutated_index_offset.min(side.indices.len());
    side.indices.push(index);
    append_strip_triangle(mesh, side, opposite, index);
}

// Nearest point to `target` on the side's outline before the
// intersection started.
fn clamp_to_pre_intersection_outline(
    mesh: &StrokeMesh,
    side: &Side,
    starting_offset: usize,
    target: Point,
) -> Point {
    let end = starting_offset.min(side.indices.len()).max(1);
    let start = side
        .partition_start
        .first_index_offset
        .max(end.saturating_sub(CROSSING_SCAN_WINDOW));
    let mut best = mesh.position(side.indices[end - 1]);
    let mut best_distance = (target - best).length();
    for k in start..end - 1 {
        let segment = LineSegment::new(
            mesh.position(side.indices[k]),
            mesh.position(side.indices[k + 1]),
        );
        let candidate = segment.closest_point(target);
        let distance = (target - candidate).length();
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }
    best
}

fn closing_triangle_is_ccw(
    mesh: &StrokeMesh,
    side: &Side,
    opposite: &Side,
    proposal: Point,
) -> bool {
    if side.partition_index_count() < 1 || opposite.partition_index_count() < 1 {
        return true;
    }
    let own_previous = *side.indices.last().unwrap();
    let opposite_anchor = *opposite.indices.last().unwrap();
    let (l, r) = match side.id {
        SideId::Left => (mesh.position(own_previous), mesh.position(opposite_anchor)),
        SideId::Right => (mesh.position(opposite_anchor), mesh.position(own_previous)),
    };
    triangle_area(l, r, proposal) >= 0.0
}

fn process_proposed_vertex(
    mesh: &mut StrokeMesh,
    side: &mut Side,
    opposite: &mut Side,
    simplification_threshold: f32,
    tip_state: &TipState,
    vertex: ExtrudedVertex,
) {
    let opposite_retriangulating = opposite
        .intersection
        .as_ref()
        .map_or(false, |i| i.retriangulation_started);
    let crossing = detect_crossing(mesh, side, opposite, vertex.position);

    if side.intersection.is_none() {
        match crossing {
            Some(crossing) => {
                // Open a new self-intersection; the proposal itself is
                // only recorded until retriangulation can start. The
                // pivot is the outline vertex where the loop begins: the
                // vertex after the crossed segment for an own-outline
                // crossing, or the current tip for a fold into the mesh.
                let (starting_offset, pivot_vertex) = if crossing.on_own_side {
                    let offset = (crossing.segment_offset + 1).min(side.indices.len() - 1);
                    (offset, side.indices[offset])
                } else {
                    (side.indices.len(), *side.indices.last().unwrap())
                };
                let budget = tip_state.width.max(tip_state.height);
                side.intersection = Some(SelfIntersection {
                    starting_offset,
                    pivot_vertex,
                    pivot_position: mesh.position(pivot_vertex),
                    retriangulation_started: false,
                    initial_outline_reposition_budget: budget,
                    outline_reposition_budget: budget,
                    oldest_retriangulation_triangle: mesh.triangle_count(),
                    last_proposed_vertex: vertex,
                    retry_last_proposal: opposite_retriangulating,
                });
            }
            None => commit_vertex(mesh, side, opposite, vertex),
        }
        return;
    }

    // There is an open intersection on this side; update its proposal
    // bookkeeping first.
    let (was_started, starting_offset, pivot_position, pivot_vertex, step_travel) = {
        let intersection = side.intersection.as_mut().unwrap();
        let step_travel =
            (vertex.position - intersection.last_proposed_vertex.position).length();
        intersection.last_proposed_vertex = vertex;
        intersection.retry_last_proposal = false;
        (
            intersection.retriangulation_started,
            intersection.starting_offset,
            intersection.pivot_position,
            intersection.pivot_vertex,
            step_travel,
        )
    };

    if opposite_retriangulating {
        // The opposite side owns mesh mutation for now; record the
        // proposal and retry once it finishes or gives up.
        side.intersection.as_mut().unwrap().retry_last_proposal = true;
        return;
    }

    // A proposal that exits the loop cleanly ends the intersection: the
    // probe no longer crosses the outline and the closing triangle winds
    // counter-clockwise.
    if crossing.is_none() && closing_triangle_is_ccw(mesh, side, opposite, vertex.position) {
        side.intersection = None;
        side.intersection_discontinuities.push(pivot_position);
        commit_vertex(mesh, side, opposite, vertex);
        return;
    }

    if !was_started {
        // Require some straight-line travel past the start of the
        // intersection before mutating the mesh.
        let travel = (vertex.position - pivot_position).length();
        if travel <= simplification_threshold {
            return;
        }
        let intersection = side.intersection.as_mut().unwrap();
        intersection.retriangulation_started = true;
        intersection.oldest_retriangulation_triangle = intersection
            .oldest_retriangulation_triangle
            .min(mesh.triangle_count());
    }

    // Repair step: the committed position is clamped onto the
    // pre-intersection outline, and the displacement draws down the
    // reposition budget. Well-behaved steps accrue allowance.
    let clamped = clamp_to_pre_intersection_outline(mesh, side, starting_offset, vertex.position);
    let used = (vertex.position - clamped).length();
    let exhausted = {
        let intersection = side.intersection.as_mut().unwrap();
        intersection.outline_reposition_budget += 0.5 * step_travel;
        if used > intersection.outline_reposition_budget {
            true
        } else {
            intersection.outline_reposition_budget -= used;
            false
        }
    };
    if exhausted {
        give_up_intersection(mesh, side, opposite);
        commit_vertex(mesh, side, opposite, vertex);
        return;
    }

    let previous_tip = *side.indices.last().unwrap();
    let previous_tip_position = mesh.position(previous_tip);
    let mut committed = vertex;
    committed.position = clamped;
    let index = mesh.append_vertex(committed);
    side.first_mutated_index_offset = side.first_mutated_index_offset.min(side.indices.len());
    side.indices.push(index);

    // Fan around the pivot, never emitting a clockwise triangle.
    if triangle_area(pivot_position, previous_tip_position, clamped) >= 0.0 {
        mesh.append_triangle(pivot_vertex, previous_tip, index);
    } else {
        mesh.append_triangle(pivot_vertex, index, previous_tip);
    }
}

fn give_up_intersection(mesh: &mut StrokeMesh, side: &mut Side, opposite: &mut Side) {
    let intersection = side.intersection.take().unwrap();
    side.intersection_discontinuities
        .push(intersection.pivot_position);

    // Duplicate the opposite side's tip so both sides restart from a
    // matching partition boundary.
    if let Some(&opposite_tip) = opposite.indices.last() {
        let duplicate = *mesh.vertex(opposite_tip);
        let index = mesh.append_vertex(duplicate);
        opposite.first_mutated_index_offset = opposite
            .first_mutated_index_offset
            .min(opposite.indices.len());
        opposite.indices.push(index);
    }

    let triangle_count = mesh.triangle_count();
    side.partition_start = PartitionStart {
        first_index_offset: side.indices.len().saturating_sub(1),
        opposite_first_index_offset: opposite.indices.len().saturating_sub(1),
        first_triangle: triangle_count,
        outline_connects_sides: false,
        is_forward_exterior: false,
    };
    opposite.partition_start = PartitionStart {
        first_index_offset: opposite.indices.len().saturating_sub(1),
        opposite_first_index_offset: side.indices.len().saturating_sub(1),
        first_triangle: triangle_count,
        outline_connects_sides: false,
        is_forward_exterior: false,
    };
}

fn replacement_is_safe(
    mesh: &StrokeMesh,
    side: &Side,
    opposite: &Side,
    last_index: u32,
    new_position: Point,
    threshold: f32,
) -> bool {
    // A position simplification removed earlier may not come back.
    for previous in &side.last_simplified_vertex_positions {
        if (*previous - new_position).length() <= threshold {
            return false;
        }
    }

    // Moving the last committed vertex must not flip any triangle from
    // counter-clockwise to clockwise.
    let first_triangle = side
        .partition_start
        .first_triangle
        .max(mesh.triangle_count().saturating_sub(CROSSING_SCAN_WINDOW as u32));
    for t in first_triangle..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle_indices(t);
        if a != last_index && b != last_index && c != last_index {
            continue;
        }
        let old_position = |i: u32| mesh.position(i);
        let adjusted = |i: u32| {
            if i == last_index {
                new_position
            } else {
                mesh.position(i)
            }
        };
        let before = triangle_area(old_position(a), old_position(b), old_position(c));
        let after = triangle_area(adjusted(a), adjusted(b), adjusted(c));
        if before >= 0.0 && after < 0.0 {
            return false;
        }

        // The enlarged triangle must not contain whole segments of the
        // opposite side's pre-intersection outline; that would confuse
        // the crossing search of an ongoing intersection.
        if let Some(intersection) = &opposite.intersection {
            let triangle = Triangle::new(adjusted(a), adjusted(b), adjusted(c));
            let end = intersection.starting_offset.min(opposite.indices.len());
            let start = opposite
                .partition_start
                .first_index_offset
                .max(end.saturating_sub(CROSSING_SCAN_WINDOW));
            for k in start..end.saturating_sub(1) {
                let segment = LineSegment::new(
                    mesh.position(opposite.indices[k]),
                    mesh.position(opposite.indices[k + 1]),
                );
                if triangle.contains_segment(&segment) {
                    return false;
                }
            }
        }
    }
    true
}
