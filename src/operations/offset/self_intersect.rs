use crate::math::intersect_2d::segment_segment_intersect;
use crate::math::{Point2, GEOMETRIC_EPS};

/// A self-intersection of the raw offset chain.
#[derive(Debug, Clone, Copy)]
pub(super) struct Intersection {
    /// First segment index.
    pub seg_a: usize,
    /// Parameter on the first segment.
    pub t_a: f64,
    /// Second segment index (`> seg_a`).
    pub seg_b: usize,
    /// Parameter on the second segment.
    pub t_b: f64,
    /// The intersection point.
    pub point: Point2,
}

/// Finds all self-intersections between non-adjacent segments.
///
/// Adjacent segments share an endpoint by construction and are skipped;
/// endpoint-grazing contacts between non-adjacent segments count, since
/// they still pinch the chain into separate lobes.
pub(super) fn find_all(points: &[Point2], closed: bool) -> Vec<Intersection> {
    let n = points.len();
    let seg_count = if closed { n } else { n.saturating_sub(1) };
    let mut result = Vec::new();

    for a in 0..seg_count {
        for b in a + 1..seg_count {
            if adjacent(a, b, seg_count, closed) {
                continue;
            }
            let (a0, a1) = (points[a], points[(a + 1) % n]);
            let (b0, b1) = (points[b], points[(b + 1) % n]);
            if let Some((point, t_a, t_b)) = segment_segment_intersect(&a0, &a1, &b0, &b1) {
                result.push(Intersection {
                    seg_a: a,
                    t_a,
                    seg_b: b,
                    t_b,
                    point,
                });
            }
        }
    }
    result
}

fn adjacent(a: usize, b: usize, seg_count: usize, closed: bool) -> bool {
    if b == a + 1 {
        return true;
    }
    closed && a == 0 && b == seg_count - 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn convex_polygon_has_none() {
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(find_all(&square, true).is_empty());
    }

    #[test]
    fn bowtie_has_one_crossing() {
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ];
        let ints = find_all(&bowtie, true);
        assert_eq!(ints.len(), 1);
        assert!((ints[0].point - Point2::new(1.0, 1.0)).norm() < GEOMETRIC_EPS);
        assert_eq!(ints[0].seg_a, 0);
        assert_eq!(ints[0].seg_b, 2);
    }

    #[test]
    fn open_chain_crossing() {
        let zigzag = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 2.0),
            Point2::new(2.0, -1.0),
        ];
        let ints = find_all(&zigzag, false);
        assert_eq!(ints.len(), 1);
    }
}
