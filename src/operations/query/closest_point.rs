use crate::error::{OperationError, Result};
use crate::geometry::NurbsCurve;
use crate::math::distance::closest_point_on_segment;
use crate::math::Point3;
use crate::store::{Geometry, GeometryId, GeometryStore};

/// Result of a closest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPointResult {
    /// The closest point on the record.
    pub point: Point3,
    /// Distance from the query point.
    pub distance: f64,
}

/// Finds the closest point on a curve, polyline, or vertex record.
pub struct ClosestPoint {
    id: GeometryId,
    query: Point3,
}

impl ClosestPoint {
    /// Creates a new `ClosestPoint` query.
    #[must_use]
    pub fn new(id: GeometryId, query: Point3) -> Self {
        Self { id, query }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for record kinds without
    /// a closest-point implementation.
    pub fn execute(&self, store: &GeometryStore) -> Result<ClosestPointResult> {
        let record = store.record(self.id)?;
        match &record.geometry {
            Geometry::Vertex(p) => Ok(ClosestPointResult {
                point: *p,
                distance: (self.query - p).norm(),
            }),
            Geometry::Polyline(polyline) => {
                let mut best = ClosestPointResult {
                    point: polyline.points()[0],
                    distance: f64::INFINITY,
                };
                for i in 0..polyline.segment_count() {
                    let Some((a, b)) = polyline.edge(i) else {
                        continue;
                    };
                    let (p, _) = closest_point_on_segment(&self.query, &a, &b);
                    let d = (self.query - p).norm();
                    if d < best.distance {
                        best = ClosestPointResult {
                            point: p,
                            distance: d,
                        };
                    }
                }
                Ok(best)
            }
            Geometry::Curve(curve) => Ok(closest_point_on_curve(curve, &self.query)),
            other => Err(OperationError::InvalidInput(format!(
                "closest-point is not defined for a {}",
                other.kind()
            ))
            .into()),
        }
    }
}

/// Coarse sampling followed by local parameter refinement.
#[must_use]
pub fn closest_point_on_curve(curve: &NurbsCurve, query: &Point3) -> ClosestPointResult {
    const COARSE_SAMPLES: usize = 64;
    const REFINE_STEPS: usize = 32;

    let (u0, u1) = curve.domain();
    let mut best_u = u0;
    let mut best_dist = f64::INFINITY;

    for i in 0..=COARSE_SAMPLES {
        #[allow(clippy::cast_precision_loss)]
        let u = u0 + (u1 - u0) * i as f64 / COARSE_SAMPLES as f64;
        let d = (query - curve.point_at(u)).norm();
        if d < best_dist {
            best_dist = d;
            best_u = u;
        }
    }

    // Shrinking bracket around the best coarse sample.
    #[allow(clippy::cast_precision_loss)]
    let mut half = (u1 - u0) / COARSE_SAMPLES as f64;
    for _ in 0..REFINE_STEPS {
        for candidate in [best_u - half, best_u + half] {
            let u = candidate.clamp(u0, u1);
            let d = (query - curve.point_at(u)).norm();
            if d < best_dist {
                best_dist = d;
                best_u = u;
            }
        }
        half *= 0.5;
    }

    ClosestPointResult {
        point: curve.point_at(best_u),
        distance: best_dist,
    }
}
