use crate::math::intersect_2d::segment_segment_intersect;
use crate::math::polygon_2d::point_in_polygon;
use crate::math::{Point2, DISTANCE_EPS, GEOMETRIC_EPS};

/// A directed boundary edge of a subdivided polygon.
#[derive(Debug, Clone, Copy)]
pub(super) struct ClipEdge {
    pub start: Point2,
    pub end: Point2,
    /// Whether the edge midpoint lies inside the other polygon.
    pub inside_other: bool,
}

/// Splits every edge of `poly` at its intersections with `other` and
/// classifies each resulting sub-edge against `other`.
pub(super) fn subdivide_and_classify(poly: &[Point2], other: &[Point2]) -> Vec<ClipEdge> {
    let n = poly.len();
    let mut edges = Vec::with_capacity(n * 2);

    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];

        // Intersection parameters along this edge.
        let mut cuts = vec![0.0, 1.0];
        let m = other.len();
        for j in 0..m {
            if let Some((_, t, _)) =
                segment_segment_intersect(&a, &b, &other[j], &other[(j + 1) % m])
            {
                cuts.push(t);
            }
        }
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|x, y| (*x - *y).abs() < GEOMETRIC_EPS);

        let dir = b - a;
        for pair in cuts.windows(2) {
            let p0 = a + dir * pair[0];
            let p1 = a + dir * pair[1];
            if (p1 - p0).norm() < DISTANCE_EPS {
                continue;
            }
            let mid = nalgebra::center(&p0, &p1);
            edges.push(ClipEdge {
                start: p0,
                end: p1,
                inside_other: point_in_polygon(&mid, other),
            });
        }
    }

    edges
}

/// Chains selected edges into closed loops by endpoint matching.
///
/// Unclosable fragments (from numerically grazing contacts) are dropped.
pub(super) fn stitch_loops(edges: &[ClipEdge]) -> Vec<Vec<Point2>> {
    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut chain = vec![edges[start].start, edges[start].end];
        let mut closed = false;

        loop {
            let head = chain[0];
            let tail = chain[chain.len() - 1];
            if chain.len() > 2 && (tail - head).norm() < DISTANCE_EPS {
                chain.pop();
                closed = true;
                break;
            }
            let next = (0..edges.len())
                .find(|&j| !used[j] && (edges[j].start - tail).norm() < DISTANCE_EPS);
            let Some(next) = next else { break };
            used[next] = true;
            chain.push(edges[next].end);
        }

        if closed && chain.len() >= 3 {
            loops.push(chain);
        }
    }

    loops
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(origin: Point2, side: f64) -> Vec<Point2> {
        vec![
            origin,
            Point2::new(origin.x + side, origin.y),
            Point2::new(origin.x + side, origin.y + side),
            Point2::new(origin.x, origin.y + side),
        ]
    }

    #[test]
    fn overlapping_squares_subdivide_edges() {
        let a = square(Point2::new(0.0, 0.0), 10.0);
        let b = square(Point2::new(5.0, 5.0), 10.0);
        let edges = subdivide_and_classify(&a, &b);
        // Two of A's edges are cut once each: 4 + 2 = 6 sub-edges.
        assert_eq!(edges.len(), 6);
        assert_eq!(edges.iter().filter(|e| e.inside_other).count(), 2);
    }

    #[test]
    fn disjoint_squares_stay_whole() {
        let a = square(Point2::new(0.0, 0.0), 2.0);
        let b = square(Point2::new(10.0, 0.0), 2.0);
        let edges = subdivide_and_classify(&a, &b);
        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|e| !e.inside_other));
    }

    #[test]
    fn stitching_recovers_a_loop() {
        let a = square(Point2::new(0.0, 0.0), 2.0);
        let edges = subdivide_and_classify(&a, &square(Point2::new(10.0, 0.0), 2.0));
        let loops = stitch_loops(&edges);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
    }
}
