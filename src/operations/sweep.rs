use nalgebra::Rotation3;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{OperationError, Result};
use crate::geometry::{Extrusion, Mesh};
use crate::math::{normalize_or_zero, PlaneFrame, Point3, Vector3, DISTANCE_EPS, GEOMETRIC_EPS};
use crate::store::{Geometry, GeometryId, GeometryStore};
use crate::tessellation::{tessellate_curve, tessellate_polyline, TessellationParams};

/// Evaluates an extrusion into a swept mesh.
///
/// The profile section is carried along the path on parallel-transported
/// frames (rotation-minimizing in the discrete limit), with the record's
/// twist and end-scale interpolated linearly over the path. Nothing is
/// stored: the extrusion stays lazy, so edits to the referenced profile
/// or path propagate on the next evaluation.
///
/// # Errors
///
/// Returns a store error when a referenced record was deleted, or
/// [`OperationError::InvalidInput`] when a reference resolves to a record
/// kind that cannot act as profile or path.
pub fn sweep_mesh(
    store: &GeometryStore,
    extrusion: &Extrusion,
    params: &TessellationParams,
    cancel: Option<&CancelToken>,
) -> Result<Mesh> {
    let profile_points = sampled_points(store, extrusion.profile, "profile", params)?;
    let path_points = sampled_points(store, extrusion.path, "path", params)?;

    if path_points.len() < 2 {
        return Err(OperationError::InvalidInput("sweep path is a single point".into()).into());
    }
    if profile_points.len() < 2 {
        return Err(
            OperationError::InvalidInput("sweep profile is a single point".into()).into(),
        );
    }

    debug!(
        profile = profile_points.len(),
        path = path_points.len(),
        "evaluating sweep"
    );

    let profile_closed = (profile_points[0] - profile_points[profile_points.len() - 1]).norm()
        < DISTANCE_EPS;
    let ring: &[Point3] = if profile_closed {
        &profile_points[..profile_points.len() - 1]
    } else {
        &profile_points
    };

    // Express the profile in its own plane, centered on its centroid.
    let tangent0 = normalize_or_zero(path_points[1] - path_points[0]);
    let frame = profile_frame(ring, tangent0)?;
    let section_2d: Vec<_> = ring.iter().map(|p| frame.project(p)).collect();

    // Parallel-transport an orthonormal frame along the path.
    let mut x_axis = normalize_or_zero(frame.normal().cross(&tangent0));
    if x_axis == Vector3::zeros() {
        // Profile plane is perpendicular to the path: seed from anywhere.
        x_axis = orthogonal_unit(tangent0);
    }
    let mut y_axis = tangent0.cross(&x_axis);
    let mut prev_tangent = tangent0;

    let mut positions: Vec<Point3> = Vec::with_capacity(path_points.len() * ring.len());
    let section_count = path_points.len();

    for (i, origin) in path_points.iter().enumerate() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(OperationError::Cancelled.into());
            }
        }

        let tangent = segment_tangent(&path_points, i);
        if let Some(rotation) = Rotation3::rotation_between(&prev_tangent, &tangent) {
            x_axis = rotation * x_axis;
            y_axis = rotation * y_axis;
        }
        prev_tangent = tangent;

        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / (section_count - 1) as f64;
        let angle = extrusion.twist * t;
        let scale = 1.0 + (extrusion.scale_end - 1.0) * t;
        let (sin_a, cos_a) = angle.sin_cos();

        for uv in &section_2d {
            let u = (uv.x * cos_a - uv.y * sin_a) * scale;
            let v = (uv.x * sin_a + uv.y * cos_a) * scale;
            positions.push(origin + x_axis * u + y_axis * v);
        }
    }

    let mut indices = Vec::new();
    let ring_len = ring.len();
    let seg_per_ring = if profile_closed { ring_len } else { ring_len - 1 };
    #[allow(clippy::cast_possible_truncation)]
    for i in 0..section_count - 1 {
        for j in 0..seg_per_ring {
            let jn = (j + 1) % ring_len;
            let a = (i * ring_len + j) as u32;
            let b = (i * ring_len + jn) as u32;
            let c = ((i + 1) * ring_len + jn) as u32;
            let d = ((i + 1) * ring_len + j) as u32;
            indices.push([a, b, c]);
            indices.push([a, c, d]);
        }
    }

    let mut mesh = Mesh::new(positions, indices)?;
    mesh.recompute_normals();
    Ok(mesh)
}

/// Materializes an extrusion record into a new mesh record.
///
/// This is the explicit opt-out of laziness: the produced mesh no longer
/// follows edits to the profile or path.
pub struct MaterializeExtrusion {
    id: GeometryId,
    params: TessellationParams,
}

impl MaterializeExtrusion {
    /// Creates a new `MaterializeExtrusion` operation.
    #[must_use]
    pub fn new(id: GeometryId, params: TessellationParams) -> Self {
        Self { id, params }
    }

    /// Executes the materialization, adding a mesh record to the store.
    ///
    /// # Errors
    ///
    /// Returns an error when `id` is not an extrusion record or a
    /// reference is dangling.
    pub fn execute(&self, store: &mut GeometryStore) -> Result<GeometryId> {
        let record = store.record(self.id)?;
        let Geometry::Extrusion(extrusion) = &record.geometry else {
            return Err(OperationError::InvalidInput(format!(
                "record is a {}, expected an extrusion",
                record.geometry.kind()
            ))
            .into());
        };
        let extrusion = *extrusion;
        let mesh = sweep_mesh(store, &extrusion, &self.params, None)?;
        Ok(store.add(Geometry::Mesh(mesh)))
    }
}

/// Samples a profile/path record into points.
fn sampled_points(
    store: &GeometryStore,
    id: GeometryId,
    role: &str,
    params: &TessellationParams,
) -> Result<Vec<Point3>> {
    let record = store.record(id)?;
    match &record.geometry {
        Geometry::Curve(c) => Ok(tessellate_curve(c, params).points),
        Geometry::Polyline(p) => Ok(tessellate_polyline(p).points),
        other => Err(OperationError::InvalidInput(format!(
            "sweep {role} is a {}, expected a curve or polyline",
            other.kind()
        ))
        .into()),
    }
}

/// Plane frame of the profile ring, centered on its centroid. Collinear
/// profiles (ribbons) fall back to a plane perpendicular to the path.
fn profile_frame(ring: &[Point3], path_tangent: Vector3) -> Result<PlaneFrame> {
    #[allow(clippy::cast_precision_loss)]
    let centroid = Point3::from(
        ring.iter().map(|p| p.coords).sum::<Vector3>() / ring.len() as f64,
    );
    if let Ok(fitted) = PlaneFrame::fit(ring) {
        return PlaneFrame::from_origin_normal(centroid, *fitted.normal());
    }
    if path_tangent.norm() < GEOMETRIC_EPS {
        return Err(OperationError::InvalidInput(
            "cannot orient a collinear profile along a degenerate path".into(),
        )
        .into());
    }
    PlaneFrame::from_origin_normal(centroid, path_tangent)
}

/// Central-difference tangent at path sample `i`.
fn segment_tangent(points: &[Point3], i: usize) -> Vector3 {
    let n = points.len();
    let dir = if i == 0 {
        points[1] - points[0]
    } else if i == n - 1 {
        points[n - 1] - points[n - 2]
    } else {
        points[i + 1] - points[i - 1]
    };
    normalize_or_zero(dir)
}

/// Any unit vector orthogonal to `v`.
fn orthogonal_unit(v: Vector3) -> Vector3 {
    let seed = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    normalize_or_zero(v.cross(&seed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{NurbsCurve, Polyline};
    use approx::assert_relative_eq;

    fn straight_path(store: &mut GeometryStore, length: f64) -> GeometryId {
        store.add(Geometry::Curve(
            NurbsCurve::line(Point3::origin(), Point3::new(0.0, 0.0, length)).unwrap(),
        ))
    }

    fn circle_profile(store: &mut GeometryStore, radius: f64) -> GeometryId {
        store.add(Geometry::Curve(
            NurbsCurve::circle(Point3::origin(), radius).unwrap(),
        ))
    }

    #[test]
    fn straight_sweep_of_circle_is_a_tube() {
        let mut store = GeometryStore::new();
        let profile = circle_profile(&mut store, 1.0);
        let path = straight_path(&mut store, 5.0);
        let extrusion = Extrusion::new(profile, path);

        let mesh = sweep_mesh(&store, &extrusion, &TessellationParams::default(), None).unwrap();
        assert!(!mesh.indices.is_empty());
        for p in &mesh.positions {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert_relative_eq!(r, 1.0, epsilon = 1e-6);
            assert!(p.z >= -1e-9 && p.z <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn end_scale_shrinks_final_section() {
        let mut store = GeometryStore::new();
        let profile = circle_profile(&mut store, 2.0);
        let path = straight_path(&mut store, 4.0);
        let extrusion = Extrusion::new(profile, path).with_scale_end(0.5).unwrap();

        let mesh = sweep_mesh(&store, &extrusion, &TessellationParams::default(), None).unwrap();
        let top_radius = mesh
            .positions
            .iter()
            .filter(|p| (p.z - 4.0).abs() < 1e-6)
            .map(|p| (p.x * p.x + p.y * p.y).sqrt())
            .fold(0.0_f64, f64::max);
        assert_relative_eq!(top_radius, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn edits_to_path_propagate() {
        // The extrusion is lazy: updating the path record changes the
        // next evaluation without touching the extrusion itself.
        let mut store = GeometryStore::new();
        let profile = circle_profile(&mut store, 1.0);
        let path = straight_path(&mut store, 2.0);
        let extrusion = Extrusion::new(profile, path);
        let params = TessellationParams::default();

        let short = sweep_mesh(&store, &extrusion, &params, None).unwrap();
        store
            .update(
                path,
                Geometry::Curve(
                    NurbsCurve::line(Point3::origin(), Point3::new(0.0, 0.0, 9.0)).unwrap(),
                ),
            )
            .unwrap();
        let long = sweep_mesh(&store, &extrusion, &params, None).unwrap();

        let max_z = |mesh: &Mesh| mesh.positions.iter().map(|p| p.z).fold(0.0_f64, f64::max);
        assert_relative_eq!(max_z(&short), 2.0, epsilon = 1e-6);
        assert_relative_eq!(max_z(&long), 9.0, epsilon = 1e-6);
    }

    #[test]
    fn dangling_profile_is_an_error_not_a_crash() {
        let mut store = GeometryStore::new();
        let profile = circle_profile(&mut store, 1.0);
        let path = straight_path(&mut store, 2.0);
        let extrusion = Extrusion::new(profile, path);

        // Simulate a caller deleting the profile out from under the
        // extrusion record (no extrusion record exists to block it here).
        store.remove(profile).unwrap();
        let result = sweep_mesh(&store, &extrusion, &TessellationParams::default(), None);
        assert!(result.is_err());
    }

    #[test]
    fn open_profile_produces_open_strip() {
        let mut store = GeometryStore::new();
        let profile = store.add(Geometry::Polyline(
            Polyline::new(
                vec![
                    Point3::new(-1.0, 0.0, 0.0),
                    Point3::new(0.0, 0.5, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                ],
                false,
            )
            .unwrap(),
        ));
        let path = straight_path(&mut store, 3.0);
        let extrusion = Extrusion::new(profile, path);

        let mesh = sweep_mesh(&store, &extrusion, &TessellationParams::default(), None).unwrap();
        assert!(!mesh.is_watertight());
        assert!(!mesh.indices.is_empty());
    }

    #[test]
    fn materialize_adds_mesh_record() {
        let mut store = GeometryStore::new();
        let profile = circle_profile(&mut store, 1.0);
        let path = straight_path(&mut store, 2.0);
        let extrusion_id = store.add(Geometry::Extrusion(Extrusion::new(profile, path)));

        let mesh_id = MaterializeExtrusion::new(extrusion_id, TessellationParams::default())
            .execute(&mut store)
            .unwrap();
        assert!(matches!(
            store.get(mesh_id).unwrap().geometry,
            Geometry::Mesh(_)
        ));
    }
}
