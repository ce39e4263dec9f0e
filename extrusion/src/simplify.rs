use crate::mesh::ExtrudedVertex;

use tracery_geom::LineSegment;

/// Simplifies `vertices` into `out`, keeping the endpoints and every
/// vertex lying farther than `threshold` from the chord between its kept
/// neighbors (Ramer-Douglas-Peucker).
///
/// `out` is cleared first. With fewer than three input vertices the input
/// is copied unchanged.
pub fn simplify_polyline(
    vertices: &[ExtrudedVertex],
    threshold: f32,
    out: &mut Vec<ExtrudedVertex>,
) {
    let mut kept = Vec::new();
    simplify_polyline_indices(vertices, threshold, &mut kept);
    out.clear();
    out.extend(kept.into_iter().map(|i| vertices[i]));
}

/// Index-returning flavor of `simplify_polyline`: appends to `out` the
/// sorted indices of the kept vertices.
pub(crate) fn simplify_polyline_indices(
    vertices: &[ExtrudedVertex],
    threshold: f32,
    out: &mut Vec<usize>,
) {
    out.clear();
    if vertices.len() < 3 {
        out.extend(0..vertices.len());
        return;
    }
    out.push(0);
    simplify_range(vertices, 0, vertices.len() - 1, threshold, out);
    out.push(vertices.len() - 1);
}

// Appends the kept interior indices of `vertices[first..=last]`; the
// caller handles both endpoints.
fn simplify_range(
    vertices: &[ExtrudedVertex],
    first: usize,
    last: usize,
    threshold: f32,
    out: &mut Vec<usize>,
) {
    if last - first < 2 {
        return;
    }

    let chord = LineSegment::new(vertices[first].position, vertices[last].position);
    let mut max_distance = threshold;
    let mut split = None;
    for i in first + 1..last {
        let distance = chord.distance_to_point(vertices[i].position);
        if distance > max_distance {
            max_distance = distance;
            split = Some(i);
        }
    }

    if let Some(split) = split {
        simplify_range(vertices, first, split, threshold, out);
        out.push(split);
        simplify_range(vertices, split, last, threshold, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracery_geom::math::point;

    fn vertices(positions: &[(f32, f32)]) -> Vec<ExtrudedVertex> {
        positions
            .iter()
            .map(|&(x, y)| ExtrudedVertex::at_position(point(x, y)))
            .collect()
    }

    fn positions(vertices: &[ExtrudedVertex]) -> Vec<(f32, f32)> {
        vertices
            .iter()
            .map(|v| (v.position.x, v.position.y))
            .collect()
    }

    #[test]
    fn collinear_run_collapses_to_endpoints() {
        let input = vertices(&[(0.0, 0.0), (1.0, 0.01), (2.0, -0.01), (3.0, 0.0)]);
        let mut out = Vec::new();
        simplify_polyline(&input, 0.1, &mut out);
        assert_eq!(positions(&out), vec![(0.0, 0.0), (3.0, 0.0)]);
    }

    #[test]
    fn corner_is_kept() {
        let input = vertices(&[(0.0, 0.0), (1.0, 0.0), (2.0, 1.0)]);
        let mut out = Vec::new();
        simplify_polyline(&input, 0.1, &mut out);
        assert_eq!(positions(&out), vec![(0.0, 0.0), (1.0, 0.0), (2.0, 1.0)]);
    }

    #[test]
    fn cluster_folds_to_endpoints() {
        // A u-turn cluster small relative to the threshold: the middle
        // vertex is removed even though the travel direction reverses.
        let input = vertices(&[(1.0, 1.0), (1.05, 1.05), (1.1, 0.95)]);
        let mut out = Vec::new();
        simplify_polyline(&input, 0.1, &mut out);
        assert_eq!(positions(&out), vec![(1.0, 1.0), (1.1, 0.95)]);
    }

    #[test]
    fn short_input_is_unchanged() {
        let input = vertices(&[(0.0, 0.0), (5.0, 5.0)]);
        let mut out = Vec::new();
        simplify_polyline(&input, 10.0, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn kept_indices_are_sorted() {
        let input = vertices(&[
            (0.0, 0.0),
            (1.0, 2.0),
            (2.0, 0.0),
            (3.0, -2.0),
            (4.0, 0.0),
        ]);
        let mut kept = Vec::new();
        simplify_polyline_indices(&input, 0.5, &mut kept);
        let mut sorted = kept.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(kept, sorted);
        assert_eq!(*kept.first().unwrap(), 0);
        assert_eq!(*kept.last().unwrap(), 4);
    }
}
