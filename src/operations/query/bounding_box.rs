use crate::error::Result;
use crate::math::Aabb;
use crate::operations::sweep;
use crate::store::{Geometry, GeometryId, GeometryStore};
use crate::tessellation::TessellationParams;

/// Computes the bounding box of a geometry record.
///
/// Curves and surfaces use their control-point hull (the convex-hull
/// property makes this a conservative, exact-enough bound without
/// tessellation); extrusions are evaluated coarsely.
pub struct BoundingBox {
    id: GeometryId,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(id: GeometryId) -> Self {
        Self { id }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error for an absent record or a dangling extrusion
    /// reference.
    pub fn execute(&self, store: &GeometryStore) -> Result<Aabb> {
        let record = store.record(self.id)?;
        match &record.geometry {
            Geometry::Vertex(p) => Ok(Aabb::new(*p, *p)),
            Geometry::Polyline(p) => Ok(p.aabb()),
            Geometry::Curve(c) => Ok(c.aabb()),
            Geometry::Surface(s) => Ok(s.aabb()),
            Geometry::Mesh(m) => Ok(m.aabb().unwrap_or(Aabb::new(
                crate::math::Point3::origin(),
                crate::math::Point3::origin(),
            ))),
            Geometry::Voxels(v) => Ok(v.bounds()),
            Geometry::Extrusion(e) => {
                // Coarse sweep evaluation; the budget only affects how
                // tight the bound is.
                let params = TessellationParams {
                    max_segments: 32,
                    ..TessellationParams::default()
                };
                let mesh = sweep::sweep_mesh(store, e, &params, None)?;
                Ok(mesh.aabb().unwrap_or(Aabb::new(
                    crate::math::Point3::origin(),
                    crate::math::Point3::origin(),
                )))
            }
            Geometry::BRep(brep) => {
                let mut aabb: Option<Aabb> = None;
                for (_, vertex) in brep.vertices() {
                    match &mut aabb {
                        Some(acc) => acc.extend(&vertex.point),
                        None => aabb = Some(Aabb::new(vertex.point, vertex.point)),
                    }
                }
                // Vertices under-report curved solids; widen with the
                // referenced surface hulls.
                for (_, face) in brep.faces() {
                    if let Ok(surface_record) = store.record(face.surface) {
                        if let Geometry::Surface(s) = &surface_record.geometry {
                            let hull = s.aabb();
                            aabb = Some(aabb.map_or(hull, |acc| acc.union(&hull)));
                        }
                    }
                }
                Ok(aabb.unwrap_or(Aabb::new(
                    crate::math::Point3::origin(),
                    crate::math::Point3::origin(),
                )))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::NurbsCurve;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::MakeCylinder;

    #[test]
    fn curve_box_contains_control_points() {
        let mut store = GeometryStore::new();
        let id = store.add(Geometry::Curve(
            NurbsCurve::circle(Point3::origin(), 2.0).unwrap(),
        ));
        let aabb = BoundingBox::new(id).execute(&store).unwrap();
        assert!(aabb.contains(&Point3::new(2.0, 0.0, 0.0)));
        assert!(aabb.contains(&Point3::new(-2.0, -2.0, 0.0)));
    }

    #[test]
    fn cylinder_brep_box_spans_height_and_radius() {
        let mut store = GeometryStore::new();
        let id = MakeCylinder::new(Point3::origin(), Vector3::z(), 1.0, 3.0)
            .execute(&mut store)
            .unwrap();
        let aabb = BoundingBox::new(id).execute(&store).unwrap();
        assert!(aabb.contains(&Point3::new(1.0, 0.0, 1.5)));
        assert!(aabb.contains(&Point3::new(0.0, -1.0, 3.0)));
    }

    #[test]
    fn absent_record_errors() {
        let mut store = GeometryStore::new();
        let id = store.add(Geometry::Vertex(Point3::origin()));
        store.remove(id).unwrap();
        assert!(BoundingBox::new(id).execute(&store).is_err());
    }
}
