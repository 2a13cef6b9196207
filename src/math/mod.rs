pub mod aabb;
pub mod distance;
pub mod intersect_2d;
pub mod intersect_3d;
pub mod plane;
pub mod polygon_2d;

pub use aabb::Aabb;
pub use plane::PlaneFrame;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Homogeneous 4D vector, used for rational control points.
pub type Vector4 = nalgebra::Vector4<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Tolerance for point coincidence and other geometric predicates.
pub const GEOMETRIC_EPS: f64 = 1e-10;

/// Guard against division by a vanishing denominator.
pub const NUMERIC_EPS: f64 = 1e-14;

/// Tolerance for near-parallel direction tests (applied to values derived
/// from unit vectors, e.g. cross products and cosines).
pub const ANGULAR_EPS: f64 = 1e-8;

/// User-facing tolerance for deduplicating nearby points.
pub const DISTANCE_EPS: f64 = 1e-6;

/// Normalizes `v`, returning the zero vector for inputs shorter than
/// [`GEOMETRIC_EPS`] instead of producing NaN components.
#[must_use]
pub fn normalize_or_zero(v: Vector3) -> Vector3 {
    let len = v.norm();
    if len < GEOMETRIC_EPS {
        Vector3::zeros()
    } else {
        v / len
    }
}

/// Divides `v` by `w`, falling back to `v` unscaled when `w` vanishes.
///
/// Used for homogeneous-to-Euclidean projection of rational curve and
/// surface points: the result is degenerate but finite, never NaN/Inf.
#[must_use]
pub fn project_homogeneous(v: Vector3, w: f64) -> Vector3 {
    if w.abs() < NUMERIC_EPS {
        v
    } else {
        v / w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unit_length() {
        let v = normalize_or_zero(Vector3::new(3.0, 4.0, 0.0));
        assert!((v.norm() - 1.0).abs() < GEOMETRIC_EPS);
    }

    #[test]
    fn normalize_zero_returns_zero() {
        let v = normalize_or_zero(Vector3::zeros());
        assert_eq!(v, Vector3::zeros());
        assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
    }

    #[test]
    fn normalize_tiny_returns_zero() {
        let v = normalize_or_zero(Vector3::new(1e-12, 0.0, 0.0));
        assert_eq!(v, Vector3::zeros());
    }

    #[test]
    fn project_homogeneous_guards_zero_weight() {
        let v = project_homogeneous(Vector3::new(1.0, 2.0, 3.0), 0.0);
        assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
    }

    #[test]
    fn project_homogeneous_divides() {
        let v = project_homogeneous(Vector3::new(2.0, 4.0, 6.0), 2.0);
        assert!((v - Vector3::new(1.0, 2.0, 3.0)).norm() < GEOMETRIC_EPS);
    }
}
