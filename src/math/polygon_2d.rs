use super::{Point2, Vector2, GEOMETRIC_EPS, NUMERIC_EPS};

/// Signed area of a 2D polygon (positive for counter-clockwise winding).
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd point-in-polygon test.
///
/// Points on the boundary (within [`GEOMETRIC_EPS`]) are treated as inside.
#[must_use]
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];

        // Boundary check against the segment.
        if super::distance::point_to_segment_2d(p, a, b) < GEOMETRIC_EPS {
            return true;
        }

        // Ray cast along +X.
        if (a.y > p.y) != (b.y > p.y) {
            let dy = b.y - a.y;
            if dy.abs() > NUMERIC_EPS {
                let x_cross = a.x + (p.y - a.y) / dy * (b.x - a.x);
                if x_cross > p.x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

/// Unit direction of the segment `a`–`b`, or `None` for a degenerate segment.
#[must_use]
pub fn segment_direction(a: &Point2, b: &Point2) -> Option<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < GEOMETRIC_EPS {
        None
    } else {
        Some(d / len)
    }
}

/// Left-hand normal of a direction vector (rotation by +90°).
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ccw_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn ccw_square_positive_area() {
        assert!((signed_area(&ccw_square()) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn cw_square_negative_area() {
        let mut pts = ccw_square();
        pts.reverse();
        assert!((signed_area(&pts) + 100.0).abs() < 1e-12);
    }

    #[test]
    fn point_inside_square() {
        assert!(point_in_polygon(&Point2::new(5.0, 5.0), &ccw_square()));
    }

    #[test]
    fn point_outside_square() {
        assert!(!point_in_polygon(&Point2::new(15.0, 5.0), &ccw_square()));
    }

    #[test]
    fn point_on_boundary_is_inside() {
        assert!(point_in_polygon(&Point2::new(10.0, 5.0), &ccw_square()));
    }

    #[test]
    fn left_normal_rotates_ccw() {
        let n = left_normal(&Vector2::new(1.0, 0.0));
        assert!((n - Vector2::new(0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn segment_direction_degenerate_is_none() {
        let d = segment_direction(&Point2::new(1.0, 1.0), &Point2::new(1.0, 1.0));
        assert!(d.is_none());
    }
}
