use super::{Point3, Vector3, NUMERIC_EPS};

/// Result of a ray-triangle intersection.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Ray parameter at the hit (`t >= 0`).
    pub t: f64,
    /// Barycentric coordinate along the first edge.
    pub u: f64,
    /// Barycentric coordinate along the second edge.
    pub v: f64,
    /// The hit point in world space.
    pub point: Point3,
}

/// Möller–Trumbore ray-triangle intersection.
///
/// The ray is `origin + t * dir` with `t >= 0`; the triangle is `(a, b, c)`.
/// Both front- and back-facing hits are reported.
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3,
    dir: &Vector3,
    a: &Point3,
    b: &Point3,
    c: &Point3,
) -> Option<TriangleHit> {
    let e1 = b - a;
    let e2 = c - a;

    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < NUMERIC_EPS {
        // Ray is parallel to the triangle plane.
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    if t < 0.0 {
        return None;
    }

    Some(TriangleHit {
        t,
        u,
        v,
        point: origin + dir * t,
    })
}

/// Intersection of a ray with the plane through `plane_point` with normal
/// `plane_normal`.
///
/// Returns the ray parameter `t >= 0`, or `None` when the ray is parallel
/// to the plane or the hit lies behind the origin.
#[must_use]
pub fn ray_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane_point: &Point3,
    plane_normal: &Vector3,
) -> Option<f64> {
    let denom = plane_normal.dot(dir);
    if denom.abs() < NUMERIC_EPS {
        return None;
    }
    let t = plane_normal.dot(&(plane_point - origin)) / denom;
    if t < 0.0 {
        None
    } else {
        Some(t)
    }
}
