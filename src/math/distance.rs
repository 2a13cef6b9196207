use super::{Point2, Point3, Vector3, NUMERIC_EPS};

/// Returns the minimum distance from `p` to the 2D segment `a`–`b`.
#[must_use]
pub fn point_to_segment_2d(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < NUMERIC_EPS {
        // Degenerate segment (zero length).
        return (p - a).norm();
    }

    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    let closest = a + d * t;
    (p - closest).norm()
}

/// Returns the closest point on the 3D segment `a`–`b` to `p`, together
/// with the segment parameter in `[0, 1]`.
#[must_use]
pub fn closest_point_on_segment(p: &Point3, a: &Point3, b: &Point3) -> (Point3, f64) {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < NUMERIC_EPS {
        return (*a, 0.0);
    }

    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (a + d * t, t)
}

/// Returns the minimum distance from `p` to the 3D segment `a`–`b`.
#[must_use]
pub fn point_to_segment_3d(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let (closest, _) = closest_point_on_segment(p, a, b);
    (p - closest).norm()
}

/// Closest approach between a ray `origin + t * dir` (`t >= 0`, `dir` unit)
/// and the segment `a`–`b`.
///
/// Returns `(t_ray, t_seg, distance)` where `t_seg` is in `[0, 1]`.
#[must_use]
pub fn ray_segment_closest(
    origin: &Point3,
    dir: &Vector3,
    a: &Point3,
    b: &Point3,
) -> (f64, f64, f64) {
    let seg = b - a;
    let w = origin - a;

    let aa = dir.norm_squared();
    let bb = dir.dot(&seg);
    let cc = seg.norm_squared();
    let dd = dir.dot(&w);
    let ee = seg.dot(&w);

    let denom = aa * cc - bb * bb;

    let (mut t_ray, mut t_seg) = if denom.abs() < NUMERIC_EPS {
        // Ray and segment are parallel: fix t_seg = 0, project onto the ray.
        (-dd / aa.max(NUMERIC_EPS), 0.0)
    } else {
        ((bb * ee - cc * dd) / denom, (aa * ee - bb * dd) / denom)
    };

    t_seg = t_seg.clamp(0.0, 1.0);
    // Re-project onto the ray after clamping the segment parameter.
    t_ray = (seg * t_seg + (a - origin)).dot(dir) / aa.max(NUMERIC_EPS);
    t_ray = t_ray.max(0.0);

    let p_ray = origin + dir * t_ray;
    let p_seg = a + seg * t_seg;
    (t_ray, t_seg, (p_ray - p_seg).norm())
}

/// Closest approach between a ray and a single point.
///
/// Returns `(t_ray, distance)` with `t_ray >= 0`.
#[must_use]
pub fn ray_point_closest(origin: &Point3, dir: &Vector3, p: &Point3) -> (f64, f64) {
    let t = (p - origin).dot(dir).max(0.0);
    let closest = origin + dir * t;
    (t, (p - closest).norm())
}
