mod clip;

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::geometry::Polyline;
use crate::math::polygon_2d::signed_area;
use crate::math::{PlaneFrame, Point2, Point3, DISTANCE_EPS};

use clip::ClipEdge;

/// The three regularized 2D boolean operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    /// Region covered by either polygon.
    Union,
    /// Region covered by both polygons.
    Intersection,
    /// Region covered by the first polygon but not the second.
    Difference,
}

/// Boolean operation on two closed, coplanar polylines.
///
/// Both operands must be closed and lie on one common plane; non-planar
/// input is a validation error, never a silent approximation. Results
/// are closed polylines on that plane. There may be several (disjoint
/// unions, a difference cutting a part in two) or none (empty
/// intersection).
#[derive(Debug)]
pub struct Boolean2D {
    kind: BooleanKind,
    a: Polyline,
    b: Polyline,
}

impl Boolean2D {
    /// Creates a new `Boolean2D` operation.
    #[must_use]
    pub fn new(kind: BooleanKind, a: Polyline, b: Polyline) -> Self {
        Self { kind, a, b }
    }

    /// Executes the boolean, returning the boundary loops of the result
    /// region.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotClosed`] for open operands, or
    /// [`TopologyError::NotCoplanar`] when the operands do not share a
    /// plane.
    pub fn execute(&self) -> Result<Vec<Polyline>> {
        if !self.a.is_closed() || !self.b.is_closed() {
            return Err(TopologyError::NotClosed.into());
        }

        // One common plane for both operands.
        let frame = self.a.fitted_plane()?;
        frame.check_coplanar(self.b.points(), DISTANCE_EPS)?;

        let a_2d = project_ccw(&frame, self.a.points());
        let b_2d = project_ccw(&frame, self.b.points());

        debug!(kind = ?self.kind, "2d boolean");

        let a_edges = clip::subdivide_and_classify(&a_2d, &b_2d);
        let b_edges = clip::subdivide_and_classify(&b_2d, &a_2d);

        let mut selected: Vec<ClipEdge> = Vec::new();
        match self.kind {
            BooleanKind::Union => {
                selected.extend(a_edges.iter().filter(|e| !e.inside_other).copied());
                selected.extend(b_edges.iter().filter(|e| !e.inside_other).copied());
            }
            BooleanKind::Intersection => {
                selected.extend(a_edges.iter().filter(|e| e.inside_other).copied());
                selected.extend(b_edges.iter().filter(|e| e.inside_other).copied());
            }
            BooleanKind::Difference => {
                selected.extend(a_edges.iter().filter(|e| !e.inside_other).copied());
                // Kept B edges bound the removed region: reverse them so
                // the result boundary stays consistently oriented.
                selected.extend(b_edges.iter().filter(|e| e.inside_other).map(|e| ClipEdge {
                    start: e.end,
                    end: e.start,
                    inside_other: e.inside_other,
                }));
            }
        }

        let loops = clip::stitch_loops(&selected);
        loops
            .into_iter()
            .map(|chain| {
                let lifted: Vec<Point3> = chain.iter().map(|p| frame.lift(p)).collect();
                Polyline::new(lifted, true)
            })
            .collect()
    }
}

/// Store-level boolean: reads two polyline records, runs the boolean,
/// and adds each result loop as a new record.
pub struct BooleanRecords {
    kind: BooleanKind,
    a: crate::store::GeometryId,
    b: crate::store::GeometryId,
}

impl BooleanRecords {
    /// Creates a new `BooleanRecords` operation.
    #[must_use]
    pub fn new(kind: BooleanKind, a: crate::store::GeometryId, b: crate::store::GeometryId) -> Self {
        Self { kind, a, b }
    }

    /// Executes the boolean, returning the identifiers of the new records.
    ///
    /// # Errors
    ///
    /// Returns an error when either record is not a polyline, plus any
    /// validation error of [`Boolean2D`]. On error the store is unchanged.
    pub fn execute(
        &self,
        store: &mut crate::store::GeometryStore,
    ) -> Result<Vec<crate::store::GeometryId>> {
        let a = polyline_record(store, self.a)?;
        let b = polyline_record(store, self.b)?;
        let results = Boolean2D::new(self.kind, a, b).execute()?;
        Ok(results
            .into_iter()
            .map(|p| store.add(crate::store::Geometry::Polyline(p)))
            .collect())
    }
}

fn polyline_record(
    store: &crate::store::GeometryStore,
    id: crate::store::GeometryId,
) -> Result<Polyline> {
    let record = store.record(id)?;
    let crate::store::Geometry::Polyline(polyline) = &record.geometry else {
        return Err(crate::error::OperationError::InvalidInput(format!(
            "boolean operand is a {}, expected a polyline",
            record.geometry.kind()
        ))
        .into());
    };
    Ok(polyline.clone())
}

/// Projects polygon points into the frame, normalized to counter-
/// clockwise winding.
fn project_ccw(frame: &PlaneFrame, points: &[Point3]) -> Vec<Point2> {
    let mut projected: Vec<Point2> = points.iter().map(|p| frame.project(p)).collect();
    if signed_area(&projected) < 0.0 {
        projected.reverse();
    }
    projected
}
