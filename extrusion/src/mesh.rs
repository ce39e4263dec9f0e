use tracery_geom::math::{point, vector, Point, Vector};
use tracery_geom::utils::point_lerp;
use tracery_geom::Triangle;

/// Which exterior of the stroke a vertex lies on, perpendicular to the
/// travel direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SideCategory {
    ExteriorLeft,
    ExteriorRight,
    Interior,
}

impl SideCategory {
    /// Sign applied to the (left-to-right) side derivative to move the
    /// vertex outward; zero for interior vertices, which must not move.
    #[inline]
    pub fn derivative_outset_sign(self) -> f32 {
        match self {
            SideCategory::ExteriorLeft => -1.0,
            SideCategory::ExteriorRight => 1.0,
            SideCategory::Interior => 0.0,
        }
    }
}

/// Which exterior of the stroke a vertex lies on, along the travel
/// direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ForwardCategory {
    ExteriorFront,
    ExteriorBack,
    Interior,
}

/// Margin value meaning "unconstrained" for a vertex that no triangle
/// restricts.
pub const MAXIMUM_SIDE_MARGIN: f32 = f32::MAX;

/// One extruded mesh vertex: a position plus the non-positional
/// attributes carried from the tip state that produced it, the side /
/// forward labels, and the derivative attributes filled in at the end of
/// each update.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ExtrudedVertex {
    pub position: Point,
    /// Opacity multiplier shifted into [-1, 1] for vertex packing.
    pub opacity_shift: f32,
    /// Hue offset, saturation shift and luminosity shift.
    pub hsl_shift: [f32; 3],
    pub surface_uv: Point,
    pub animation_offset: f32,
    pub side_category: SideCategory,
    pub forward_category: ForwardCategory,
    pub side_derivative: Vector,
    pub forward_derivative: Vector,
    pub side_margin: f32,
}

impl ExtrudedVertex {
    pub fn at_position(position: Point) -> Self {
        ExtrudedVertex {
            position,
            opacity_shift: 0.0,
            hsl_shift: [0.0; 3],
            surface_uv: point(0.0, 0.0),
            animation_offset: 0.0,
            side_category: SideCategory::Interior,
            forward_category: ForwardCategory::Interior,
            side_derivative: vector(0.0, 0.0),
            forward_derivative: vector(0.0, 0.0),
            side_margin: 0.0,
        }
    }

    /// Linear interpolation of position and shift attributes; the labels
    /// come from `b`. Used when intersection repair synthesizes a vertex
    /// between two existing ones.
    pub fn lerp(a: &ExtrudedVertex, b: &ExtrudedVertex, t: f32) -> ExtrudedVertex {
        let lerp = tracery_geom::utils::lerp;
        ExtrudedVertex {
            position: point_lerp(a.position, b.position, t),
            opacity_shift: lerp(a.opacity_shift, b.opacity_shift, t),
            hsl_shift: [
                lerp(a.hsl_shift[0], b.hsl_shift[0], t),
                lerp(a.hsl_shift[1], b.hsl_shift[1], t),
                lerp(a.hsl_shift[2], b.hsl_shift[2], t),
            ],
            surface_uv: point_lerp(a.surface_uv, b.surface_uv, t),
            animation_offset: lerp(a.animation_offset, b.animation_offset, t),
            ..*b
        }
    }
}

/// The growing stroke mesh: vertex storage, triangle indices, and
/// first-mutated offsets that tell a renderer how much of a previously
/// consumed mesh to discard.
///
/// The mesh owns its storage; the extruder mutates it during
/// `extend_stroke` and the renderer reads it between calls through the
/// accessors.
#[derive(Clone, Debug, Default)]
pub struct StrokeMesh {
    vertices: Vec<ExtrudedVertex>,
    indices: Vec<u32>,
    first_mutated_vertex: u32,
    first_mutated_triangle: u32,
}

impl StrokeMesh {
    pub fn new() -> Self {
        StrokeMesh::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    #[inline]
    pub fn vertices(&self) -> &[ExtrudedVertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn vertex(&self, index: u32) -> &ExtrudedVertex {
        &self.vertices[index as usize]
    }

    #[inline]
    pub fn position(&self, index: u32) -> Point {
        self.vertices[index as usize].position
    }

    /// Overwrites a vertex, recording the mutation.
    pub fn set_vertex(&mut self, index: u32, vertex: ExtrudedVertex) {
        self.vertices[index as usize] = vertex;
        self.first_mutated_vertex = self.first_mutated_vertex.min(index);
    }

    /// Appends a vertex and returns its index. Appending alone does not
    /// lower the first-mutated offset; the growth is visible through the
    /// vertex count.
    pub fn append_vertex(&mut self, vertex: ExtrudedVertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    pub fn truncate_vertices(&mut self, count: u32) {
        debug_assert!(count <= self.vertex_count());
        self.vertices.truncate(count as usize);
        self.first_mutated_vertex = self.first_mutated_vertex.min(count);
    }

    pub fn append_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    #[inline]
    pub fn triangle_indices(&self, triangle: u32) -> [u32; 3] {
        let i = 3 * triangle as usize;
        [self.indices[i], self.indices[i + 1], self.indices[i + 2]]
    }

    pub fn set_triangle_indices(&mut self, triangle: u32, indices: [u32; 3]) {
        let i = 3 * triangle as usize;
        self.indices[i..i + 3].copy_from_slice(&indices);
        self.first_mutated_triangle = self.first_mutated_triangle.min(triangle);
    }

    pub fn truncate_triangles(&mut self, count: u32) {
        debug_assert!(count <= self.triangle_count());
        self.indices.truncate(3 * count as usize);
        self.first_mutated_triangle = self.first_mutated_triangle.min(count);
    }

    #[inline]
    pub fn triangle(&self, triangle: u32) -> Triangle {
        let [a, b, c] = self.triangle_indices(triangle);
        Triangle::new(self.position(a), self.position(b), self.position(c))
    }

    #[inline]
    pub fn first_mutated_vertex(&self) -> u32 {
        self.first_mutated_vertex
    }

    #[inline]
    pub fn first_mutated_triangle(&self) -> u32 {
        self.first_mutated_triangle
    }

    /// Forgets accumulated mutations; the offsets never decrease between
    /// calls to this function.
    pub fn reset_mutation_tracking(&mut self) {
        self.first_mutated_vertex = self.vertex_count();
        self.first_mutated_triangle = self.triangle_count();
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.first_mutated_vertex = 0;
        self.first_mutated_triangle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_tracking() {
        let mut mesh = StrokeMesh::new();
        for i in 0..4 {
            mesh.append_vertex(ExtrudedVertex::at_position(point(i as f32, 0.0)));
        }
        mesh.append_triangle(0, 1, 2);
        mesh.append_triangle(0, 2, 3);
        mesh.reset_mutation_tracking();
        assert_eq!(mesh.first_mutated_vertex(), 4);
        assert_eq!(mesh.first_mutated_triangle(), 2);

        mesh.set_vertex(1, ExtrudedVertex::at_position(point(9.0, 9.0)));
        assert_eq!(mesh.first_mutated_vertex(), 1);
        mesh.set_triangle_indices(1, [1, 2, 3]);
        assert_eq!(mesh.first_mutated_triangle(), 1);

        // Appends do not move the offsets backward.
        mesh.append_vertex(ExtrudedVertex::at_position(point(5.0, 5.0)));
        assert_eq!(mesh.first_mutated_vertex(), 1);
    }

    #[test]
    fn truncation_counts_as_mutation() {
        let mut mesh = StrokeMesh::new();
        for i in 0..4 {
            mesh.append_vertex(ExtrudedVertex::at_position(point(i as f32, 0.0)));
        }
        mesh.append_triangle(0, 1, 2);
        mesh.append_triangle(1, 2, 3);
        mesh.reset_mutation_tracking();
        mesh.truncate_vertices(3);
        mesh.truncate_triangles(1);
        assert_eq!(mesh.first_mutated_vertex(), 3);
        assert_eq!(mesh.first_mutated_triangle(), 1);
    }

    #[test]
    fn vertex_lerp_interpolates_attributes() {
        let mut a = ExtrudedVertex::at_position(point(0.0, 0.0));
        a.opacity_shift = -1.0;
        let mut b = ExtrudedVertex::at_position(point(2.0, 2.0));
        b.opacity_shift = 1.0;
        b.side_category = SideCategory::ExteriorLeft;
        let mid = ExtrudedVertex::lerp(&a, &b, 0.5);
        assert_eq!(mid.position, point(1.0, 1.0));
        assert_eq!(mid.opacity_shift, 0.0);
        assert_eq!(mid.side_category, SideCategory::ExteriorLeft);
    }
}
