//! Per-vertex derivative and side-margin computation.
//!
//! After all mesh mutation for an extrusion pass, the calculator walks the
//! mutated suffix of the mesh and fills in each vertex's side and forward
//! derivatives together with an upper bound on how far the vertex may be
//! displaced along its side derivative ("side margin"). Renderers use
//! these to outset vertices for anti-aliasing without folding triangles.

use crate::mesh::{ForwardCategory, SideCategory, StrokeMesh, MAXIMUM_SIDE_MARGIN};

use tracery_geom::math::{vector, Point, Vector};
use tracery_geom::utils::unit_vector;
use tracery_geom::{LineSegment, Triangle};

/// Accumulator for an average derivative vector.
///
/// Magnitudes and unit vectors are averaged independently: anti-aliasing
/// requires the final vertex gradients to be non-zero, so contributors
/// with zero magnitude are ignored and opposing directions cannot cancel
/// the magnitude of the result.
#[derive(Copy, Clone, Debug, Default)]
struct AverageDerivative {
    magnitude_sum: f32,
    unit_vector_sum: Vector,
    count: u32,
}

impl AverageDerivative {
    fn add_vector(&mut self, v: Vector) {
        let magnitude = v.length();
        if magnitude == 0.0 {
            return;
        }
        self.magnitude_sum += magnitude;
        self.unit_vector_sum += v / magnitude;
        self.count += 1;
    }

    fn add(&mut self, other: &AverageDerivative) {
        self.magnitude_sum += other.magnitude_sum;
        self.unit_vector_sum += other.unit_vector_sum;
        self.count += other.count;
    }

    fn value(&self) -> Vector {
        if self.count == 0 {
            return vector(0.0, 0.0);
        }
        unit_vector(self.unit_vector_sum) * (self.magnitude_sum / self.count as f32)
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct AverageVertexDerivatives {
    side: AverageDerivative,
    forward: AverageDerivative,
}

/// Fills in vertex derivative and margin attributes for the mutated
/// suffix of a stroke mesh.
///
/// The tracked per-vertex buffers are kept across updates so their
/// allocations are reused; the calculator itself is stateless between
/// calls to [`DerivativeCalculator::update_mesh`].
#[derive(Debug, Default)]
pub struct DerivativeCalculator {
    /// The lowest mesh index whose values are recalculated this pass.
    minimum_tracked_index: u32,
    tracked_average_derivatives: Vec<AverageVertexDerivatives>,
    tracked_side_margin_upper_bounds: Vec<f32>,
}

impl DerivativeCalculator {
    pub fn new() -> Self {
        DerivativeCalculator::default()
    }

    /// Recomputes derivative attributes for the vertices listed in
    /// `left_indices` and `right_indices`, which must be subranges of the
    /// left and right outline index lists ordered by mesh index.
    pub fn update_mesh(
        &mut self,
        left_indices: &[u32],
        right_indices: &[u32],
        mesh: &mut StrokeMesh,
    ) {
        if left_indices.is_empty() && right_indices.is_empty() {
            return;
        }

        self.reset_tracked_values(left_indices, right_indices, mesh);

        self.accumulate_derivatives(mesh);
        self.update_mesh_derivatives(left_indices, mesh);
        self.update_mesh_derivatives(right_indices, mesh);

        // Margins are computed from the just-written derivatives.
        self.accumulate_margins(mesh);
        self.update_mesh_margins(left_indices, mesh);
        self.update_mesh_margins(right_indices, mesh);
    }

    fn reset_tracked_values(
        &mut self,
        left_indices: &[u32],
        right_indices: &[u32],
        mesh: &StrokeMesh,
    ) {
        self.minimum_tracked_index = match (left_indices.first(), right_indices.first()) {
            (Some(&left), Some(&right)) => left.min(right),
            (Some(&left), None) => left,
            (None, Some(&right)) => right,
            (None, None) => return,
        };
        debug_assert!(self.minimum_tracked_index < mesh.vertex_count());
        let tracked_vertex_count = (mesh.vertex_count() - self.minimum_tracked_index) as usize;

        self.tracked_average_derivatives.clear();
        self.tracked_average_derivatives
            .resize(tracked_vertex_count, AverageVertexDerivatives::default());

        self.tracked_side_margin_upper_bounds.clear();
        self.tracked_side_margin_upper_bounds
            .resize(tracked_vertex_count, MAXIMUM_SIDE_MARGIN);
    }

    fn accumulate_derivatives(&mut self, mesh: &StrokeMesh) {
        for triangle in (0..mesh.triangle_count()).rev() {
            let indices = mesh.triangle_indices(triangle);
            // Triangle indices are emitted in increasing order, so the
            // walk back can stop at the first fully untracked triangle.
            if indices.iter().all(|&i| i < self.minimum_tracked_index) {
                break;
            }
            self.add_derivatives_for_triangle(mesh, indices);
        }
    }

    // For each triangle, the derivative of position with respect to a
    // barycentric coordinate is the altitude vector from the coordinate's
    // vertex to the line of the opposite edge.
    //
    // The side derivative uses the coordinate that increases across the
    // stroke, picked from whichever edge has both vertices on the same
    // exterior side; the sign is normalized so the result points
    // left-to-right. The forward derivative averages every coordinate
    // whose edge endpoints share a forward category.
    fn add_derivatives_for_triangle(&mut self, mesh: &StrokeMesh, indices: [u32; 3]) {
        let triangle = triangle_from_indices(mesh, &indices);

        let projections = match point_to_edge_projections(&triangle) {
            Some(projections) => projections,
            // Degenerate with coincident points; such triangles do not
            // contribute, and the coincident vertices share averages via
            // the grouping in `update_mesh_derivatives`.
            None => return,
        };

        let side = [
            mesh.vertex(indices[0]).side_category,
            mesh.vertex(indices[1]).side_category,
            mesh.vertex(indices[2]).side_category,
        ];
        if side[2] == SideCategory::ExteriorLeft && side[0] == side[2] {
            self.save_side_derivative(&indices, -projections[2]);
        } else if side[2] == SideCategory::ExteriorRight && side[1] == side[2] {
            self.save_side_derivative(&indices, projections[1]);
        }

        let forward = [
            mesh.vertex(indices[0]).forward_category,
            mesh.vertex(indices[1]).forward_category,
            mesh.vertex(indices[2]).forward_category,
        ];
        if forward[0] == forward[1] {
            self.save_forward_derivative(&indices, -projections[0]);
        }
        if forward[1] == forward[2] {
            self.save_forward_derivative(&indices, projections[1]);
        }
        if forward[0] == forward[2] {
            self.save_forward_derivative(&indices, projections[2]);
        }
    }

    fn save_side_derivative(&mut self, indices: &[u32; 3], derivative: Vector) {
        for &index in indices {
            if index < self.minimum_tracked_index {
                continue;
            }
            self.tracked_average_derivatives[(index - self.minimum_tracked_index) as usize]
                .side
                .add_vector(derivative);
        }
    }

    fn save_forward_derivative(&mut self, indices: &[u32; 3], derivative: Vector) {
        for &index in indices {
            if index < self.minimum_tracked_index {
                continue;
            }
            self.tracked_average_derivatives[(index - self.minimum_tracked_index) as usize]
                .forward
                .add_vector(derivative);
        }
    }

    fn update_mesh_derivatives(&self, indices_to_update: &[u32], mesh: &mut StrokeMesh) {
        let mut remaining = indices_to_update;
        while !remaining.is_empty() {
            // Coincident vertices with matching labels are averaged
            // together so that they move in lockstep when outset.
            let count = starting_same_category_coincident_count(remaining, mesh);
            let (group, tail) = remaining.split_at(count);

            let mut averages = AverageVertexDerivatives::default();
            for &index in group {
                let tracked = &self.tracked_average_derivatives
                    [(index - self.minimum_tracked_index) as usize];
                averages.side.add(&tracked.side);
                averages.forward.add(&tracked.forward);
            }
            let side = averages.side.value();
            let forward = averages.forward.value();

            for &index in group {
                let mut vertex = *mesh.vertex(index);
                vertex.side_derivative = side;
                vertex.forward_derivative = forward;
                mesh.set_vertex(index, vertex);
            }
            remaining = tail;
        }
    }

    fn accumulate_margins(&mut self, mesh: &StrokeMesh) {
        for triangle in (0..mesh.triangle_count()).rev() {
            let indices = mesh.triangle_indices(triangle);
            if indices.iter().all(|&i| i < self.minimum_tracked_index) {
                break;
            }
            self.add_margin_upper_bounds_for_triangle(mesh, indices);
        }
    }

    // Each triangle splits its exterior into three regions, one per
    // vertex, bounded by segments from the other two vertices through
    // their opposite edges. Constraining every vertex to its own region
    // keeps outset vertices from crossing each other, without the
    // backward-propagating effects a globally optimal bound would have.
    fn add_margin_upper_bounds_for_triangle(&mut self, mesh: &StrokeMesh, indices: [u32; 3]) {
        let triangle = triangle_from_indices(mesh, &indices);

        if triangle.signed_area() == 0.0 {
            // Three distinct collinear vertices must stay collinear, so
            // none of them may move. A degenerate triangle with
            // coincident vertices constrains nothing: the coincident
            // vertices share derivatives and reposition identically.
            if triangle.a != triangle.b && triangle.a != triangle.c && triangle.b != triangle.c {
                for &index in &indices {
                    self.save_side_margin_upper_bound(index, 0.0);
                }
            }
            return;
        }

        let bounding_segments = [
            make_bounding_segment(triangle.a, &triangle.edge(1)),
            make_bounding_segment(triangle.b, &triangle.edge(2)),
            make_bounding_segment(triangle.c, &triangle.edge(0)),
        ];

        for i in 0..3 {
            let vertex = mesh.vertex(indices[i]);
            let outset_sign = vertex.side_category.derivative_outset_sign();
            if outset_sign == 0.0 {
                // Interior vertices are never repositioned.
                self.save_side_margin_upper_bound(indices[i], 0.0);
                continue;
            }
            let position = triangle.point(i);
            let outset_segment = LineSegment::new(
                position,
                position + vertex.side_derivative * outset_sign,
            );
            let margin = margin_upper_bound(&outset_segment, &bounding_segments[(i + 1) % 3])
                .min(margin_upper_bound(&outset_segment, &bounding_segments[(i + 2) % 3]));
            self.save_side_margin_upper_bound(indices[i], margin);
        }
    }

    fn save_side_margin_upper_bound(&mut self, index: u32, margin: f32) {
        if index < self.minimum_tracked_index {
            return;
        }
        let current =
            &mut self.tracked_side_margin_upper_bounds[(index - self.minimum_tracked_index) as usize];
        *current = current.min(margin);
    }

    fn update_mesh_margins(&self, indices_to_update: &[u32], mesh: &mut StrokeMesh) {
        let mut remaining = indices_to_update;
        while !remaining.is_empty() {
            let count = starting_coincident_connected_count(remaining, mesh);
            let (group, tail) = remaining.split_at(count);

            // Margins of differently labeled vertices are only comparable
            // through zero, which an interior label in the group forces;
            // taking the minimum is therefore safe across the group.
            let mut margin = MAXIMUM_SIDE_MARGIN;
            for &index in group {
                margin = margin.min(
                    self.tracked_side_margin_upper_bounds
                        [(index - self.minimum_tracked_index) as usize],
                );
            }

            for &index in group {
                let mut vertex = *mesh.vertex(index);
                vertex.side_margin = margin;
                mesh.set_vertex(index, vertex);
            }
            remaining = tail;
        }
    }
}

fn triangle_from_indices(mesh: &StrokeMesh, indices: &[u32; 3]) -> Triangle {
    Triangle::new(
        mesh.position(indices[0]),
        mesh.position(indices[1]),
        mesh.position(indices[2]),
    )
}

fn vector_to_edge_projection(point: Point, edge: &LineSegment) -> Option<Vector> {
    let ratio = edge.project(point)?;
    Some(edge.sample(ratio) - point)
}

// The altitude vectors of a triangle: element `i` runs from the vertex
// opposite `edge(i)` to that edge's line. `None` if any edge is
// degenerate.
fn point_to_edge_projections(triangle: &Triangle) -> Option<[Vector; 3]> {
    let opposite = [triangle.c, triangle.a, triangle.b];
    let mut projections = [vector(0.0, 0.0); 3];
    for i in 0..3 {
        projections[i] = vector_to_edge_projection(opposite[i], &triangle.edge(i))?;
    }
    Some(projections)
}

// The segment from a triangle vertex to a point on its opposite edge,
// weighted toward the vertex's projection but kept away from the edge
// endpoints so that both endpoints retain room to be repositioned.
fn make_bounding_segment(vertex: Point, opposite_edge: &LineSegment) -> LineSegment {
    let ratio = opposite_edge
        .project(vertex)
        .unwrap_or(0.5)
        .clamp(0.1, 0.9);
    LineSegment::new(vertex, opposite_edge.sample(ratio))
}

// The outset multiple at which the outset path crosses the line of
// `bounding_segment`; the margin is in multiples of the derivative
// magnitude, so only the ratio along `outset_segment` matters. Vertices
// are only outset, never inset, so negative ratios do not bound.
fn margin_upper_bound(outset_segment: &LineSegment, bounding_segment: &LineSegment) -> f32 {
    match outset_segment.line_intersection_ratios(bounding_segment) {
        Some((ratio, _)) if ratio >= 0.0 => ratio,
        _ => MAXIMUM_SIDE_MARGIN,
    }
}

// The number of leading indices referring to vertices at the same
// position with the same side and forward categories.
fn starting_same_category_coincident_count(indices: &[u32], mesh: &StrokeMesh) -> usize {
    let first = mesh.vertex(indices[0]);
    let mut count = 1;
    for &index in &indices[1..] {
        let vertex = mesh.vertex(index);
        if vertex.position != first.position
            || vertex.side_category != first.side_category
            || vertex.forward_category != first.forward_category
        {
            break;
        }
        count += 1;
    }
    count
}

// The number of leading indices referring to coincident vertices in the
// same geometrically connected section of the mesh. A back-exterior
// vertex followed by a differently labeled one marks the boundary between
// disconnected partitions that happen to touch.
fn starting_coincident_connected_count(indices: &[u32], mesh: &StrokeMesh) -> usize {
    let first = mesh.vertex(indices[0]);
    let mut previous_category = first.forward_category;
    let mut count = 1;
    for &index in &indices[1..] {
        let vertex = mesh.vertex(index);
        if vertex.position != first.position {
            break;
        }
        if previous_category == ForwardCategory::ExteriorBack
            && vertex.forward_category != previous_category
        {
            break;
        }
        previous_category = vertex.forward_category;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ExtrudedVertex;
    use tracery_geom::math::point;

    fn labeled_vertex(
        x: f32,
        y: f32,
        side: SideCategory,
        forward: ForwardCategory,
    ) -> ExtrudedVertex {
        let mut vertex = ExtrudedVertex::at_position(point(x, y));
        vertex.side_category = side;
        vertex.forward_category = forward;
        vertex
    }

    fn vector_near(a: Vector, b: Vector, tolerance: f32) -> bool {
        (a - b).length() <= tolerance
    }

    use ForwardCategory::{ExteriorBack, ExteriorFront, Interior as ForwardInterior};
    use SideCategory::{ExteriorLeft, ExteriorRight, Interior};

    // A rectangular strip of 6 vertices and 4 triangles:
    //
    //  left side  ->  0-2-4
    //                 |/|/|   travel direction -->
    //  right side ->  1-3-5
    fn append_rectangular_mesh(
        mesh: &mut StrokeMesh,
        width: f32,
        length: f32,
    ) -> (Vec<u32>, Vec<u32>) {
        mesh.append_vertex(labeled_vertex(0.0, width, ExteriorLeft, ExteriorFront));
        mesh.append_vertex(labeled_vertex(0.0, 0.0, ExteriorRight, ExteriorFront));
        mesh.append_vertex(labeled_vertex(0.5 * length, width, ExteriorLeft, ForwardInterior));
        mesh.append_vertex(labeled_vertex(0.5 * length, 0.0, ExteriorRight, ForwardInterior));
        mesh.append_vertex(labeled_vertex(length, width, ExteriorLeft, ExteriorBack));
        mesh.append_vertex(labeled_vertex(length, 0.0, ExteriorRight, ExteriorBack));

        mesh.append_triangle(0, 1, 2);
        mesh.append_triangle(2, 1, 3);
        mesh.append_triangle(2, 3, 4);
        mesh.append_triangle(4, 3, 5);

        (vec![0, 2, 4], vec![1, 3, 5])
    }

    #[test]
    fn complete_update_for_rectangular_mesh() {
        let mut mesh = StrokeMesh::new();
        let (left, right) = append_rectangular_mesh(&mut mesh, 3.0, 2.0);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&left, &right, &mut mesh);

        for i in 0..mesh.vertex_count() {
            let vertex = mesh.vertex(i);
            assert!(vector_near(vertex.side_derivative, vector(0.0, -3.0), 1e-4));
            assert!(vector_near(vertex.forward_derivative, vector(1.0, 0.0), 1e-4));
            assert_eq!(vertex.side_margin, MAXIMUM_SIDE_MARGIN);
        }
    }

    #[test]
    fn partial_update_touches_only_listed_vertices() {
        let mut mesh = StrokeMesh::new();
        append_rectangular_mesh(&mut mesh, 2.0, 5.0);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&[4], &[5], &mut mesh);

        for i in 0..4 {
            let vertex = mesh.vertex(i);
            assert_eq!(vertex.side_derivative, vector(0.0, 0.0));
            assert_eq!(vertex.forward_derivative, vector(0.0, 0.0));
        }
        for i in 4..6 {
            let vertex = mesh.vertex(i);
            assert!(vector_near(vertex.side_derivative, vector(0.0, -2.0), 1e-4));
            assert!(vector_near(vertex.forward_derivative, vector(2.5, 0.0), 1e-4));
        }
    }

    #[test]
    fn update_with_empty_indices_is_a_noop() {
        let mut mesh = StrokeMesh::new();
        append_rectangular_mesh(&mut mesh, 2.0, 5.0);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&[], &[], &mut mesh);

        for i in 0..mesh.vertex_count() {
            assert_eq!(mesh.vertex(i).side_derivative, vector(0.0, 0.0));
            assert_eq!(mesh.vertex(i).forward_derivative, vector(0.0, 0.0));
        }
    }

    #[test]
    fn varying_width_mesh_averages_magnitudes_and_directions() {
        // Non-uniform vertex separation:
        //
        //                     4
        //                    /|
        //  left side  ->  0-2 |    travel direction -->
        //                 |\|\|
        //                 | 3-5
        //                 |/
        //  right side ->  1
        let mut mesh = StrokeMesh::new();
        mesh.append_vertex(labeled_vertex(0.0, 3.0, ExteriorLeft, ExteriorFront));
        mesh.append_vertex(labeled_vertex(0.0, 0.0, ExteriorRight, ExteriorFront));
        mesh.append_vertex(labeled_vertex(2.0, 3.0, ExteriorLeft, ForwardInterior));
        mesh.append_vertex(labeled_vertex(6.0, 1.0, ExteriorRight, ForwardInterior));
        mesh.append_vertex(labeled_vertex(8.0, 4.0, ExteriorLeft, ExteriorBack));
        mesh.append_vertex(labeled_vertex(8.0, 1.0, ExteriorRight, ExteriorBack));

        mesh.append_triangle(0, 1, 3);
        mesh.append_triangle(0, 3, 2);
        mesh.append_triangle(2, 3, 5);
        mesh.append_triangle(2, 5, 4);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&[0, 2, 4], &[1, 3, 5], &mut mesh);

        let side: Vec<Vector> = (0..6).map(|i| mesh.vertex(i).side_derivative).collect();
        assert!(vector_near(side[0], vector(0.205, -2.47), 0.005));
        assert!(vector_near(side[1], vector(0.49, -2.92), 0.005));
        assert!(vector_near(side[2], vector(0.13, -2.32), 0.005));
        assert!(vector_near(side[3], vector(0.13, -2.32), 0.005));
        assert!(vector_near(side[4], vector(0.49, -2.92), 0.005));
        assert!(vector_near(side[5], vector(0.205, -2.47), 0.005));

        let forward: Vec<Vector> = (0..6).map(|i| mesh.vertex(i).forward_derivative).collect();
        assert!(vector_near(forward[0], vector(2.93, 1.81), 0.005));
        assert!(vector_near(forward[1], vector(6.0, 0.0), 0.005));
        assert!(vector_near(forward[2], vector(1.89, 1.78), 0.005));
        assert!(vector_near(forward[3], vector(1.89, 1.78), 0.005));
        assert!(vector_near(forward[4], vector(6.0, 0.0), 0.005));
        assert!(vector_near(forward[5], vector(2.93, 1.81), 0.005));

        // The front and back corners are boxed in by the rays of the
        // neighboring vertices; the straighter middle vertices are not.
        let margins: Vec<f32> = (0..6).map(|i| mesh.vertex(i).side_margin).collect();
        assert!(margins[0] > 0.3 && margins[0] < 0.45);
        assert!(margins[5] > 0.3 && margins[5] < 0.45);
        assert_eq!(margins[1], MAXIMUM_SIDE_MARGIN);
        assert_eq!(margins[4], MAXIMUM_SIDE_MARGIN);
        assert!(margins[2] > 1.0);
        assert!(margins[3] > 1.0);
    }

    #[test]
    fn interior_vertex_gets_zero_margin() {
        // left side  ->  0---3
        //                |\ /|
        //                | 2 |    travel direction -->
        //                |/ \|
        // right side ->  1---4
        let mut mesh = StrokeMesh::new();
        mesh.append_vertex(labeled_vertex(0.0, 2.0, ExteriorLeft, ExteriorFront));
        mesh.append_vertex(labeled_vertex(0.0, 0.0, ExteriorRight, ExteriorFront));
        mesh.append_vertex(labeled_vertex(1.0, 1.0, Interior, ForwardInterior));
        mesh.append_vertex(labeled_vertex(2.0, 2.0, ExteriorLeft, ExteriorBack));
        mesh.append_vertex(labeled_vertex(2.0, 0.0, ExteriorRight, ExteriorBack));

        mesh.append_triangle(0, 1, 2);
        mesh.append_triangle(0, 2, 3);
        mesh.append_triangle(2, 1, 4);
        mesh.append_triangle(3, 2, 4);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&[0, 2, 3], &[1, 4], &mut mesh);

        for i in 0..5 {
            let vertex = mesh.vertex(i);
            assert!(vector_near(vertex.side_derivative, vector(0.0, -1.0), 0.005));
            assert!(vector_near(vertex.forward_derivative, vector(1.0, 0.0), 0.005));
        }

        let margins: Vec<f32> = (0..5).map(|i| mesh.vertex(i).side_margin).collect();
        assert_eq!(
            margins,
            vec![
                MAXIMUM_SIDE_MARGIN,
                MAXIMUM_SIDE_MARGIN,
                0.0,
                MAXIMUM_SIDE_MARGIN,
                MAXIMUM_SIDE_MARGIN,
            ]
        );
    }

    #[test]
    fn collinear_degenerate_triangle_zeroes_margins() {
        let mut mesh = StrokeMesh::new();
        mesh.append_vertex(labeled_vertex(0.0, 0.0, ExteriorLeft, ExteriorFront));
        mesh.append_vertex(labeled_vertex(1.0, 0.0, ExteriorRight, ForwardInterior));
        mesh.append_vertex(labeled_vertex(2.0, 0.0, ExteriorLeft, ExteriorBack));
        mesh.append_triangle(0, 1, 2);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&[0, 2], &[1], &mut mesh);

        for i in 0..3 {
            assert_eq!(mesh.vertex(i).side_margin, 0.0);
        }
    }

    #[test]
    fn coincident_same_label_vertices_share_averages() {
        // Vertices 2 and 3 are coincident with identical labels; the
        // degenerate triangle between them contributes nothing, and the
        // two share the average of their combined contributions.
        let mut mesh = StrokeMesh::new();
        mesh.append_vertex(labeled_vertex(0.0, 1.0, ExteriorLeft, ExteriorFront));
        mesh.append_vertex(labeled_vertex(0.0, 0.0, ExteriorRight, ExteriorFront));
        mesh.append_vertex(labeled_vertex(1.0, 1.0, ExteriorLeft, ForwardInterior));
        mesh.append_vertex(labeled_vertex(1.0, 1.0, ExteriorLeft, ForwardInterior));
        mesh.append_vertex(labeled_vertex(1.0, 0.0, ExteriorRight, ExteriorBack));

        mesh.append_triangle(0, 1, 2);
        mesh.append_triangle(2, 1, 3);
        mesh.append_triangle(3, 1, 4);

        let mut calculator = DerivativeCalculator::new();
        calculator.update_mesh(&[0, 2, 3], &[1, 4], &mut mesh);

        let a = mesh.vertex(2);
        let b = mesh.vertex(3);
        assert_eq!(a.side_derivative, b.side_derivative);
        assert_eq!(a.forward_derivative, b.forward_derivative);
        assert!(a.side_derivative.length() > 0.0);
        assert_eq!(a.side_margin, b.side_margin);
    }
}
