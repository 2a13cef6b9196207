use crate::error::{OperationError, Result};
use crate::geometry::NurbsCurve;
use crate::math::polygon_2d::signed_area;
use crate::math::Point2;
use crate::store::{Geometry, GeometryId, GeometryStore};

/// Arc length of a curve or polyline record.
pub struct Length {
    id: GeometryId,
}

impl Length {
    /// Creates a new `Length` query.
    #[must_use]
    pub fn new(id: GeometryId) -> Self {
        Self { id }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for records without a
    /// length (surfaces, meshes, ...).
    pub fn execute(&self, store: &GeometryStore) -> Result<f64> {
        let record = store.record(self.id)?;
        match &record.geometry {
            Geometry::Polyline(p) => Ok(p.length()),
            Geometry::Curve(c) => Ok(curve_length(c)),
            other => Err(OperationError::InvalidInput(format!(
                "cannot measure the length of a {}",
                other.kind()
            ))
            .into()),
        }
    }
}

/// Chord-length of a curve under adaptive refinement: chords are
/// subdivided until doubling the sample density changes the total by
/// less than a relative epsilon.
#[must_use]
pub fn curve_length(curve: &NurbsCurve) -> f64 {
    /// Relative convergence tolerance for the doubling refinement.
    const REL_TOL: f64 = 1e-9;

    let (u0, u1) = curve.domain();
    let mut segments = 16;
    let mut previous = chord_length(curve, u0, u1, segments);
    loop {
        segments *= 2;
        let current = chord_length(curve, u0, u1, segments);
        // Chord length converges monotonically from below.
        if current - previous < current.max(1.0) * REL_TOL || segments >= 4096 {
            return current;
        }
        previous = current;
    }
}

#[allow(clippy::cast_precision_loss)]
fn chord_length(curve: &NurbsCurve, u0: f64, u1: f64, segments: usize) -> f64 {
    let mut total = 0.0;
    let mut prev = curve.point_at(u0);
    for i in 1..=segments {
        let u = u0 + (u1 - u0) * i as f64 / segments as f64;
        let p = curve.point_at(u);
        total += (p - prev).norm();
        prev = p;
    }
    total
}

/// Enclosed area of a closed planar polyline record.
pub struct PlanarArea {
    id: GeometryId,
}

impl PlanarArea {
    /// Creates a new `PlanarArea` query.
    #[must_use]
    pub fn new(id: GeometryId) -> Self {
        Self { id }
    }

    /// Executes the query, returning the unsigned enclosed area.
    ///
    /// # Errors
    ///
    /// Returns an error for non-polyline records, open polylines, or
    /// non-planar input.
    pub fn execute(&self, store: &GeometryStore) -> Result<f64> {
        let record = store.record(self.id)?;
        let Geometry::Polyline(polyline) = &record.geometry else {
            return Err(OperationError::InvalidInput(format!(
                "cannot measure the area of a {}",
                record.geometry.kind()
            ))
            .into());
        };
        if !polyline.is_closed() {
            return Err(crate::error::TopologyError::NotClosed.into());
        }
        let frame = polyline.fitted_plane()?;
        let projected: Vec<Point2> = polyline.points().iter().map(|p| frame.project(p)).collect();
        Ok(signed_area(&projected).abs())
    }
}
