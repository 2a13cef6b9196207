use crate::error::{OperationError, Result};
use crate::geometry::{Mesh, NurbsCurve, NurbsSurface, Polyline};
use crate::math::{Matrix4, Point3, Vector3};
use crate::store::{Geometry, GeometryId, GeometryStore};

/// Applies an affine transform to a geometry value, producing a new
/// value.
///
/// NURBS geometry transforms by its control points (affine maps commute
/// with the convex-combination evaluation); meshes recompute their
/// normals afterwards. Extrusions carry no intrinsic points: transform
/// the records they reference, or use [`TransformRecord`] which walks
/// references for you. Voxel grids are resample-only and rejected.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] for extrusion and voxel
/// records.
pub fn transform_geometry(geometry: &Geometry, matrix: &Matrix4) -> Result<Geometry> {
    let map = |p: &Point3| matrix.transform_point(p);
    match geometry {
        Geometry::Vertex(p) => Ok(Geometry::Vertex(map(p))),
        Geometry::Polyline(polyline) => {
            let points = polyline.points().iter().map(map).collect();
            Ok(Geometry::Polyline(Polyline::new(
                points,
                polyline.is_closed(),
            )?))
        }
        Geometry::Curve(curve) => {
            let control_points = curve.control_points().iter().map(map).collect();
            Ok(Geometry::Curve(NurbsCurve::new(
                control_points,
                curve.knots().to_vec(),
                curve.degree(),
                curve.weights().map(<[f64]>::to_vec),
            )?))
        }
        Geometry::Surface(surface) => {
            let control_points = surface
                .control_points()
                .iter()
                .map(|row| row.iter().map(map).collect())
                .collect();
            Ok(Geometry::Surface(NurbsSurface::new(
                control_points,
                surface.knots_u().to_vec(),
                surface.knots_v().to_vec(),
                surface.degree_u(),
                surface.degree_v(),
                surface.weights().map(<[Vec<f64>]>::to_vec),
            )?))
        }
        Geometry::Mesh(mesh) => {
            let positions = mesh.positions.iter().map(map).collect();
            let mut transformed = Mesh::new(positions, mesh.indices.clone())?;
            if mesh.normals.is_some() {
                transformed.recompute_normals();
            }
            transformed.uvs.clone_from(&mesh.uvs);
            transformed.colors.clone_from(&mesh.colors);
            Ok(Geometry::Mesh(transformed))
        }
        Geometry::BRep(brep) => {
            let mut transformed = brep.clone();
            transformed.transform_vertices(|p| matrix.transform_point(p));
            Ok(Geometry::BRep(transformed))
        }
        Geometry::Extrusion(_) => Err(OperationError::InvalidInput(
            "an extrusion has no intrinsic points; transform its profile and path records"
                .to_owned(),
        )
        .into()),
        Geometry::Voxels(_) => Err(OperationError::InvalidInput(
            "voxel grids cannot be transformed without resampling".to_owned(),
        )
        .into()),
    }
}

/// Transforms a record in the store, following weak references.
///
/// For extrusions this transforms the referenced profile and path
/// records; for B-Reps the topological vertices plus every referenced
/// curve and surface record. Each referenced record is transformed once,
/// even when shared.
pub struct TransformRecord {
    id: GeometryId,
    matrix: Matrix4,
}

impl TransformRecord {
    /// Creates a new `TransformRecord` operation.
    #[must_use]
    pub fn new(id: GeometryId, matrix: Matrix4) -> Self {
        Self { id, matrix }
    }

    /// Convenience constructor for a translation.
    #[must_use]
    pub fn translation(id: GeometryId, offset: Vector3) -> Self {
        Self::new(id, Matrix4::new_translation(&offset))
    }

    /// Convenience constructor for a uniform scale about the origin.
    #[must_use]
    pub fn scaling(id: GeometryId, factor: f64) -> Self {
        Self::new(id, Matrix4::new_scaling(factor))
    }

    /// Convenience constructor for a rotation about an axis through the
    /// origin. A degenerate axis yields the identity.
    #[must_use]
    pub fn rotation(id: GeometryId, axis: Vector3, angle: f64) -> Self {
        let matrix = nalgebra::Unit::try_new(axis, crate::math::GEOMETRIC_EPS).map_or_else(
            Matrix4::identity,
            |unit| nalgebra::Rotation3::from_axis_angle(&unit, angle).to_homogeneous(),
        );
        Self::new(id, matrix)
    }

    /// Executes the transform, replacing the record (and its referenced
    /// records) in the store.
    ///
    /// # Errors
    ///
    /// Returns an error for absent records; on error no record has been
    /// replaced.
    pub fn execute(&self, store: &mut GeometryStore) -> Result<()> {
        let mut targets = vec![self.id];
        for referenced in store.references_of(self.id) {
            if !targets.contains(&referenced) {
                targets.push(referenced);
            }
        }

        // Transform everything first so a failure leaves the store
        // untouched.
        let mut replacements = Vec::with_capacity(targets.len());
        for &id in &targets {
            let record = store.record(id)?;
            match &record.geometry {
                // The extrusion value itself is pure references.
                Geometry::Extrusion(_) => {}
                geometry => {
                    replacements.push((id, transform_geometry(geometry, &self.matrix)?));
                }
            }
        }
        for (id, geometry) in replacements {
            store.update(id, geometry)?;
        }
        Ok(())
    }
}
