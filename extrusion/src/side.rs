use crate::mesh::ExtrudedVertex;

use tracery_geom::math::Point;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SideId {
    Left,
    Right,
}

/// State of an in-progress self-intersection on one side of the stroke.
#[derive(Clone, Debug)]
pub struct SelfIntersection {
    /// Offset into `Side::indices` of the first outline vertex inside the
    /// loop.
    pub starting_offset: usize,
    /// Mesh index of the vertex the repaired triangles fan around.
    pub pivot_vertex: u32,
    /// Position of the pivot when the intersection opened; becomes the
    /// tagged discontinuity when the intersection ends.
    pub pivot_position: Point,
    /// False while proposals are only being recorded; true once the mesh
    /// is being rebuilt around the pivot.
    pub retriangulation_started: bool,
    /// Budget for shifting the pre-intersection outline, in stroke units.
    pub initial_outline_reposition_budget: f32,
    pub outline_reposition_budget: f32,
    /// First triangle that retriangulation may rewrite; everything from
    /// here on counts as visually updated while the intersection is open.
    pub oldest_retriangulation_triangle: u32,
    /// The most recent vertex proposed for this side.
    pub last_proposed_vertex: ExtrudedVertex,
    /// True when `last_proposed_vertex` was deferred and should be
    /// retried once the opposite side releases mesh mutation.
    pub retry_last_proposal: bool,
}

/// Where the current partition of a side begins, and how it relates to
/// the opposite side and the triangle list.
#[derive(Copy, Clone, Debug, Default)]
pub struct PartitionStart {
    /// Number of committed outline indices on this side when the
    /// partition began.
    pub first_index_offset: usize,
    /// Same count for the opposite side.
    pub opposite_first_index_offset: usize,
    /// Triangle count when the partition began.
    pub first_triangle: u32,
    /// Whether the partition boundary joins the left and right outlines
    /// (false after an intersection give-up, which leaves a visible
    /// discontinuity instead).
    pub outline_connects_sides: bool,
    /// Whether the boundary vertices face forward out of the stroke.
    pub is_forward_exterior: bool,
}

/// Per-side outline state: committed mesh indices, buffered pending
/// vertices, and intersection bookkeeping.
#[derive(Clone, Debug)]
pub struct Side {
    pub id: SideId,
    /// Slot of this side's vertex within emitted triangles (0 for left,
    /// 1 for right).
    pub first_triangle_vertex: u32,
    /// Committed outline: indices into the mesh, for the whole stroke.
    pub indices: Vec<u32>,
    /// Buffered vertices for the current extrusion: a committed prefix
    /// retained as simplification context, then the pending vertices.
    pub vertex_buffer: Vec<ExtrudedVertex>,
    /// Offset into `vertex_buffer` of the first uncommitted vertex.
    pub next_buffered_vertex_offset: usize,
    pub partition_start: PartitionStart,
    /// Positions where an intersection ended or gave up, in stroke order.
    pub intersection_discontinuities: Vec<Point>,
    /// Positions removed by simplification since the last append; kept
    /// vertices may not be reintroduced at these positions.
    pub last_simplified_vertex_positions: Vec<Point>,
    pub intersection: Option<SelfIntersection>,
    /// Smallest committed-outline offset mutated since tracking reset.
    pub first_mutated_index_offset: usize,
}

impl Side {
    pub fn new(id: SideId) -> Self {
        Side {
            id,
            first_triangle_vertex: match id {
                SideId::Left => 0,
                SideId::Right => 1,
            },
            indices: Vec::new(),
            vertex_buffer: Vec::new(),
            next_buffered_vertex_offset: 0,
            partition_start: PartitionStart {
                outline_connects_sides: true,
                is_forward_exterior: true,
                ..PartitionStart::default()
            },
            intersection_discontinuities: Vec::new(),
            last_simplified_vertex_positions: Vec::new(),
            intersection: None,
            first_mutated_index_offset: 0,
        }
    }

    /// Number of committed outline vertices in the current partition.
    #[inline]
    pub fn partition_index_count(&self) -> usize {
        self.indices.len() - self.partition_start.first_index_offset
    }

    /// Number of buffered vertices not yet committed.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.vertex_buffer.len() - self.next_buffered_vertex_offset
    }

    pub fn reset(&mut self) {
        self.indices.clear();
        self.vertex_buffer.clear();
        self.next_buffered_vertex_offset = 0;
        self.partition_start = PartitionStart {
            outline_connects_sides: true,
            is_forward_exterior: true,
            ..PartitionStart::default()
        };
        self.intersection_discontinuities.clear();
        self.last_simplified_vertex_positions.clear();
        self.intersection = None;
        self.first_mutated_index_offset = 0;
    }
}
