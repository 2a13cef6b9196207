use crate::math::distance::point_to_segment_2d;
use crate::math::{Point2, DISTANCE_EPS};

/// Relative slack on the full-distance test; raw joints land a hair
/// inside the exact offset radius.
const COLLAPSE_SLACK: f64 = 1e-3;

/// Keeps the slices that reach a full offset distance from the original
/// polyline.
///
/// A collapsed lobe of the raw offset lies *entirely* closer than
/// `|distance|` to the original, so a slice is kept when any of its
/// segment midpoints sits at the full distance. Joint geometry (bevel
/// chamfers cut inside the corner radius) may dip closer without
/// invalidating the slice, which is why the test is an any, not an all.
pub(super) fn apply(
    slices: Vec<Vec<Point2>>,
    original: &[Point2],
    original_closed: bool,
    distance: f64,
) -> Vec<Vec<Point2>> {
    let threshold = distance.abs() - distance.abs().max(1.0) * COLLAPSE_SLACK - DISTANCE_EPS;

    slices
        .into_iter()
        .filter(|slice| {
            slice.windows(2).any(|pair| {
                let mid = nalgebra::center(&pair[0], &pair[1]);
                distance_to_chain(&mid, original, original_closed) >= threshold
            })
        })
        .collect()
}

/// Minimum distance from a point to the original chain.
fn distance_to_chain(p: &Point2, chain: &[Point2], closed: bool) -> f64 {
    let n = chain.len();
    let seg_count = if closed { n } else { n - 1 };
    let mut best = f64::INFINITY;
    for i in 0..seg_count {
        best = best.min(point_to_segment_2d(p, &chain[i], &chain[(i + 1) % n]));
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn slice_at_full_distance_is_kept() {
        let inner = vec![
            Point2::new(1.0, 1.0),
            Point2::new(9.0, 1.0),
            Point2::new(9.0, 9.0),
        ];
        let kept = apply(vec![inner.clone()], &square(), true, 1.0);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn crowding_slice_is_dropped() {
        let too_close = vec![Point2::new(0.5, 0.5), Point2::new(9.5, 0.5)];
        let kept = apply(vec![too_close], &square(), true, 1.0);
        assert!(kept.is_empty());
    }

    #[test]
    fn fully_inverted_offset_is_dropped() {
        // Over-offsetting a 10-square by 6 inverts into a 2-square whose
        // every point is only 4 away from the original.
        let inverted = vec![
            Point2::new(6.0, 6.0),
            Point2::new(4.0, 6.0),
            Point2::new(4.0, 4.0),
            Point2::new(6.0, 4.0),
            Point2::new(6.0, 6.0),
        ];
        let kept = apply(vec![inverted], &square(), true, 6.0);
        assert!(kept.is_empty());
    }

    #[test]
    fn mixed_slices_filtered_individually() {
        let good = vec![Point2::new(1.0, 1.0), Point2::new(9.0, 1.0)];
        let bad = vec![Point2::new(0.2, 0.2), Point2::new(2.0, 0.2)];
        let kept = apply(vec![good.clone(), bad], &square(), true, 1.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0], good);
    }
}
