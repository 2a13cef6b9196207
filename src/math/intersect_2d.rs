use super::{Point2, Vector2, GEOMETRIC_EPS, NUMERIC_EPS};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < NUMERIC_EPS {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
#[must_use]
pub fn segment_segment_intersect(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let (t, u) = line_line_intersect(a0, &da, b0, &db)?;

    // Use a small epsilon to include endpoints.
    let eps = GEOMETRIC_EPS;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_lines_intersect() {
        let (t, u) = line_line_intersect(
            &Point2::new(0.0, 0.0),
            &Vector2::new(1.0, 0.0),
            &Point2::new(2.0, -1.0),
            &Vector2::new(0.0, 1.0),
        )
        .unwrap();
        assert!((t - 2.0).abs() < 1e-12);
        assert!((u - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_lines_return_none() {
        let result = line_line_intersect(
            &Point2::new(0.0, 0.0),
            &Vector2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Vector2::new(1.0, 0.0),
        );
        assert!(result.is_none());
    }

    #[test]
    fn crossing_segments_intersect() {
        let (p, t, u) = segment_segment_intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 2.0),
            &Point2::new(0.0, 2.0),
            &Point2::new(2.0, 0.0),
        )
        .unwrap();
        assert!((p - Point2::new(1.0, 1.0)).norm() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
        assert!((u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn disjoint_segments_return_none() {
        let result = segment_segment_intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
        );
        assert!(result.is_none());
    }

    #[test]
    fn touching_endpoints_intersect() {
        let result = segment_segment_intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(1.0, 1.0),
        );
        assert!(result.is_some());
    }
}
