use crate::error::{GeometryError, Result, TopologyError};

use super::{normalize_or_zero, Point2, Point3, Vector3, GEOMETRIC_EPS};

/// An orthonormal coordinate frame on a plane in 3D space.
///
/// Used to carry planar polylines into 2D for offsetting and boolean
/// operations, and to lift the results back.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFrame {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl PlaneFrame {
    /// Builds a frame from an origin and a unit normal. The in-plane axes
    /// are chosen deterministically from the normal.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if the normal is zero-length.
    pub fn from_origin_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let normal = normalize_or_zero(normal);
        if normal == Vector3::zeros() {
            return Err(GeometryError::ZeroVector.into());
        }

        // Pick the world axis least aligned with the normal as a seed.
        let seed = if normal.x.abs() < normal.y.abs() && normal.x.abs() < normal.z.abs() {
            Vector3::x()
        } else if normal.y.abs() < normal.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };

        let u_dir = normalize_or_zero(seed.cross(&normal));
        let v_dir = normal.cross(&u_dir);
        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Fits a plane through a polygon using Newell's method.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] when the points are collinear
    /// or too few to span a plane.
    pub fn fit(points: &[Point3]) -> Result<Self> {
        if points.len() < 3 {
            return Err(
                GeometryError::Degenerate("plane fit requires at least 3 points".to_owned()).into(),
            );
        }

        let n = points.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let curr = &points[i];
            let next = &points[(i + 1) % n];
            normal.x += (curr.y - next.y) * (curr.z + next.z);
            normal.y += (curr.z - next.z) * (curr.x + next.x);
            normal.z += (curr.x - next.x) * (curr.y + next.y);
        }

        if normal.norm() < GEOMETRIC_EPS {
            return Err(
                GeometryError::Degenerate("polygon normal vanishes (collinear points)".to_owned())
                    .into(),
            );
        }

        Self::from_origin_normal(points[0], normal)
    }

    /// Returns the frame origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit plane normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Projects a 3D point into plane coordinates.
    #[must_use]
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    /// Lifts plane coordinates back into 3D.
    #[must_use]
    pub fn lift(&self, p: &Point2) -> Point3 {
        self.origin + self.u_dir * p.x + self.v_dir * p.y
    }

    /// Signed distance of a point from the plane.
    #[must_use]
    pub fn distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    /// Verifies that every point lies on the plane within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotCoplanar`] with the index of the first
    /// offending point.
    pub fn check_coplanar(&self, points: &[Point3], tolerance: f64) -> Result<()> {
        for (i, p) in points.iter().enumerate() {
            if self.distance(p).abs() > tolerance {
                return Err(TopologyError::NotCoplanar { vertex: i }.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ModelisError;

    #[test]
    fn fit_xy_square() {
        let frame = PlaneFrame::fit(&[
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
        ])
        .unwrap();
        assert!((frame.normal().z.abs() - 1.0).abs() < GEOMETRIC_EPS);
    }

    #[test]
    fn project_lift_roundtrip() {
        let frame = PlaneFrame::fit(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ])
        .unwrap();
        let p = Point3::new(0.5, 0.25, 0.75);
        let lifted = frame.lift(&frame.project(&p));
        // p lies on the fitted plane, so the roundtrip reproduces it.
        assert!((lifted - p).norm() < 1e-9);
    }

    #[test]
    fn fit_collinear_fails() {
        let result = PlaneFrame::fit(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn check_coplanar_reports_offender() {
        let frame = PlaneFrame::from_origin_normal(Point3::origin(), Vector3::z()).unwrap();
        let result = frame.check_coplanar(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.5),
            ],
            1e-6,
        );
        match result {
            Err(ModelisError::Topology(TopologyError::NotCoplanar { vertex })) => {
                assert_eq!(vertex, 2);
            }
            other => panic!("expected NotCoplanar, got {other:?}"),
        }
    }

    #[test]
    fn frame_axes_are_orthonormal() {
        let frame =
            PlaneFrame::from_origin_normal(Point3::origin(), Vector3::new(1.0, 2.0, 3.0)).unwrap();
        assert!(frame.u_dir.dot(&frame.v_dir).abs() < GEOMETRIC_EPS);
        assert!(frame.u_dir.dot(&frame.normal).abs() < GEOMETRIC_EPS);
        assert!((frame.u_dir.norm() - 1.0).abs() < GEOMETRIC_EPS);
        assert!((frame.v_dir.norm() - 1.0).abs() < GEOMETRIC_EPS);
    }
}
