mod filter;
mod raw_offset;
mod self_intersect;
mod slice;
mod stitch;

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::Polyline;
use crate::math::{PlaneFrame, Point2, Point3, Vector3, GEOMETRIC_EPS};

/// Joint applied at offset corners that open a gap.
///
/// Corners turning less than
/// [`miter_angle_threshold`](OffsetOptions::miter_angle_threshold) are
/// always mitered; this style decides what happens above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointStyle {
    /// Extend both segments to their intersection, capped by the miter
    /// limit (falls back to a bevel beyond it).
    Miter,
    /// Connect with a circular arc around the original corner.
    Round,
    /// Connect with a straight chamfer.
    Bevel,
}

/// Default corner angle above which miters give way to the configured
/// joint style. The reference threshold is not pinned down anywhere, so
/// it stays a caller-facing knob rather than a hardcoded guess.
pub const DEFAULT_MITER_ANGLE_THRESHOLD: f64 = 3.0 * std::f64::consts::FRAC_PI_4;

/// Maximum miter distance as a multiple of the offset distance.
pub const DEFAULT_MITER_LIMIT: f64 = 4.0;

/// Caller-configurable offset parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetOptions {
    /// Joint used at gap corners turning more than the angle threshold.
    pub joint_style: JointStyle,
    /// Turn angle (radians) below which gap corners are mitered.
    pub miter_angle_threshold: f64,
    /// Miter length cap, as a multiple of `|distance|`.
    pub miter_limit: f64,
    /// Maximum sagitta deviation when flattening round joints.
    pub arc_tolerance: f64,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        Self {
            joint_style: JointStyle::Miter,
            miter_angle_threshold: DEFAULT_MITER_ANGLE_THRESHOLD,
            miter_limit: DEFAULT_MITER_LIMIT,
            arc_tolerance: 0.01,
        }
    }
}

/// Offsets a planar polyline using the slice-and-filter pipeline.
///
/// For closed polylines wound counter-clockwise, positive distance
/// offsets inward and negative outward; for open polylines, positive
/// offsets to the left of the travel direction. The polyline must be
/// planar; collinear (and therefore plane-ambiguous) open polylines are
/// offset in the world XY plane.
#[derive(Debug)]
pub struct PolylineOffset {
    polyline: Polyline,
    distance: f64,
    options: OffsetOptions,
}

impl PolylineOffset {
    /// Creates a new polyline offset operation with default options.
    #[must_use]
    pub fn new(polyline: Polyline, distance: f64) -> Self {
        Self {
            polyline,
            distance,
            options: OffsetOptions::default(),
        }
    }

    /// Replaces the offset options.
    #[must_use]
    pub fn with_options(mut self, options: OffsetOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the offset, returning one or more result polylines.
    ///
    /// # Errors
    ///
    /// Returns a coplanarity validation error for non-planar input, or
    /// [`OperationError::Failed`] when the offset collapses entirely.
    pub fn execute(&self) -> Result<Vec<Polyline>> {
        if self.distance.abs() < GEOMETRIC_EPS {
            return Ok(vec![self.polyline.clone()]);
        }

        let frame = self.plane_frame()?;
        let points_2d: Vec<Point2> = self
            .polyline
            .points()
            .iter()
            .map(|p| frame.project(p))
            .collect();
        let closed = self.polyline.is_closed();

        debug!(
            vertices = points_2d.len(),
            distance = self.distance,
            closed,
            "offsetting polyline"
        );

        // Step 1: raw offset with per-corner joints.
        let raw = raw_offset::build(&points_2d, closed, self.distance, &self.options)?;

        // Step 2: find self-intersections of the raw offset.
        let intersections = self_intersect::find_all(&raw, closed);

        let chains = if intersections.is_empty() {
            // Even without self-intersections the raw offset can be fully
            // inverted (over-offset past the medial axis); the distance
            // filter catches that case too.
            filter::apply(vec![raw], &points_2d, closed, self.distance)
        } else {
            // Steps 3-5: slice at intersection points, filter slices that
            // crowd the original, stitch survivors back together.
            let slices = slice::build(&raw, closed, &intersections);
            let valid = filter::apply(slices, &points_2d, closed, self.distance);
            stitch::connect(valid, closed)
        };

        if chains.is_empty() {
            return Err(OperationError::Failed("offset collapsed completely".to_owned()).into());
        }

        chains
            .into_iter()
            .map(|chain| {
                let lifted: Vec<Point3> = chain.iter().map(|p| frame.lift(p)).collect();
                Polyline::new(lifted, closed)
            })
            .collect()
    }

    /// Fits the operating plane, falling back to world XY for collinear
    /// open polylines.
    fn plane_frame(&self) -> Result<PlaneFrame> {
        match self.polyline.fitted_plane() {
            Ok(frame) => Ok(frame),
            Err(err) => {
                if self.polyline.is_closed() {
                    return Err(err);
                }
                let frame =
                    PlaneFrame::from_origin_normal(self.polyline.points()[0], Vector3::z())?;
                frame.check_coplanar(self.polyline.points(), crate::math::DISTANCE_EPS)?;
                Ok(frame)
            }
        }
    }
}

/// Store-level offset: reads a polyline record, offsets it, and adds
/// each result polyline as a new record.
pub struct OffsetPolylineRecord {
    id: crate::store::GeometryId,
    distance: f64,
    options: OffsetOptions,
}

impl OffsetPolylineRecord {
    /// Creates a new `OffsetPolylineRecord` operation.
    #[must_use]
    pub fn new(id: crate::store::GeometryId, distance: f64, options: OffsetOptions) -> Self {
        Self {
            id,
            distance,
            options,
        }
    }

    /// Executes the offset, returning the identifiers of the new records.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] when the record is not a
    /// polyline, plus any error of [`PolylineOffset`]. On error the store
    /// is unchanged.
    pub fn execute(
        &self,
        store: &mut crate::store::GeometryStore,
    ) -> Result<Vec<crate::store::GeometryId>> {
        let record = store.record(self.id)?;
        let crate::store::Geometry::Polyline(polyline) = &record.geometry else {
            return Err(OperationError::InvalidInput(format!(
                "cannot offset a {}",
                record.geometry.kind()
            ))
            .into());
        };
        let results = PolylineOffset::new(polyline.clone(), self.distance)
            .with_options(self.options)
            .execute()?;
        Ok(results
            .into_iter()
            .map(|p| store.add(crate::store::Geometry::Polyline(p)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Polyline {
        Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(side, 0.0, 0.0),
                Point3::new(side, side, 0.0),
                Point3::new(0.0, side, 0.0),
            ],
            true,
        )
        .unwrap()
    }

    fn extent(polyline: &Polyline) -> (f64, f64) {
        let aabb = polyline.aabb();
        let e = aabb.extents();
        (e.x, e.y)
    }

    #[test]
    fn square_inward_miter_yields_smaller_square() {
        let result = PolylineOffset::new(square(10.0), 1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        let inner = &result[0];
        assert!(inner.is_closed());
        assert_eq!(inner.vertex_count(), 4);
        let (w, h) = extent(inner);
        assert_relative_eq!(w, 8.0, epsilon = 1e-9);
        assert_relative_eq!(h, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn square_outward_miter_yields_larger_square() {
        let result = PolylineOffset::new(square(10.0), -1.0).execute().unwrap();
        let outer = &result[0];
        assert_eq!(outer.vertex_count(), 4);
        let (w, h) = extent(outer);
        assert_relative_eq!(w, 12.0, epsilon = 1e-9);
        assert_relative_eq!(h, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn square_outward_bevel_chamfers_corners() {
        let options = OffsetOptions {
            joint_style: JointStyle::Bevel,
            miter_angle_threshold: 0.1,
            ..OffsetOptions::default()
        };
        let result = PolylineOffset::new(square(10.0), -1.0)
            .with_options(options)
            .execute()
            .unwrap();
        assert_eq!(result[0].vertex_count(), 8);
    }

    #[test]
    fn square_outward_round_adds_arc_points() {
        let options = OffsetOptions {
            joint_style: JointStyle::Round,
            miter_angle_threshold: 0.1,
            arc_tolerance: 0.001,
            ..OffsetOptions::default()
        };
        let result = PolylineOffset::new(square(10.0), -1.0)
            .with_options(options)
            .execute()
            .unwrap();
        let outer = &result[0];
        assert!(outer.vertex_count() > 8, "round joints should add points");
        // Every result vertex stays exactly one offset distance away from
        // the original square boundary.
        let original = square(10.0);
        for p in outer.points() {
            let mut best = f64::INFINITY;
            for i in 0..original.segment_count() {
                let (a, b) = original.edge(i).unwrap();
                best = best.min(crate::math::distance::point_to_segment_3d(p, &a, &b));
            }
            assert_relative_eq!(best, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn over_offset_collapses_with_error() {
        let result = PolylineOffset::new(square(10.0), 6.0).execute();
        assert!(result.is_err());
    }

    #[test]
    fn concave_l_shape_inward_offset() {
        let l_shape = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 4.0, 0.0),
                Point3::new(4.0, 4.0, 0.0),
                Point3::new(4.0, 10.0, 0.0),
                Point3::new(0.0, 10.0, 0.0),
            ],
            true,
        )
        .unwrap();
        let result = PolylineOffset::new(l_shape, 1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].vertex_count(), 6);
    }

    #[test]
    fn open_straight_line_offsets_left() {
        let line = Polyline::new(
            vec![Point3::origin(), Point3::new(10.0, 0.0, 0.0)],
            false,
        )
        .unwrap();
        let result = PolylineOffset::new(line, 1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result[0].is_closed());
        for p in result[0].points() {
            assert_relative_eq!(p.y, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn offset_on_elevated_plane_stays_on_plane() {
        let elevated = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(10.0, 0.0, 5.0),
                Point3::new(10.0, 10.0, 5.0),
                Point3::new(0.0, 10.0, 5.0),
            ],
            true,
        )
        .unwrap();
        let result = PolylineOffset::new(elevated, 1.0).execute().unwrap();
        for p in result[0].points() {
            assert_relative_eq!(p.z, 5.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn non_planar_polyline_rejected() {
        let skewed = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 10.0, 4.0),
                Point3::new(0.0, 10.0, 0.0),
            ],
            true,
        )
        .unwrap();
        assert!(PolylineOffset::new(skewed, 1.0).execute().is_err());
    }

    #[test]
    fn zero_distance_is_identity() {
        let result = PolylineOffset::new(square(10.0), 0.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].points(), square(10.0).points());
    }

    #[test]
    fn record_offset_adds_result_records() {
        let mut store = crate::store::GeometryStore::new();
        let id = store.add(crate::store::Geometry::Polyline(square(10.0)));
        let results = OffsetPolylineRecord::new(id, 1.0, OffsetOptions::default())
            .execute(&mut store)
            .unwrap();
        assert_eq!(results.len(), 1);
        // The source record is untouched; the result is a new record.
        assert_ne!(results[0], id);
        assert_eq!(store.get(id).unwrap().version, 0);
    }

    #[test]
    fn record_offset_of_wrong_kind_fails() {
        let mut store = crate::store::GeometryStore::new();
        let id = store.add(crate::store::Geometry::Vertex(Point3::origin()));
        let result = OffsetPolylineRecord::new(id, 1.0, OffsetOptions::default())
            .execute(&mut store);
        assert!(result.is_err());
        assert_eq!(store.len(), 1);
    }
}
