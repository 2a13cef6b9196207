use nalgebra::Rotation3;

use crate::error::{OperationError, Result};
use crate::geometry::{NurbsCurve, NurbsSurface};
use crate::math::{Point3, Vector3, GEOMETRIC_EPS};
use crate::store::{Geometry, GeometryId, GeometryStore};
use crate::topology::{BRep, EdgeData, FaceData, LoopData, OrientedEdge, VertexData};

/// Creates a cylinder solid from a base center, axis, radius, and height.
///
/// Topology: two circular edges (each a closed rational quadratic curve
/// record), a swept side face, and two planar caps whose trim loops are
/// the circles. Loop orientation makes the caps face away from the body.
pub struct MakeCylinder {
    base: Point3,
    axis: Vector3,
    radius: f64,
    height: f64,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation.
    #[must_use]
    pub fn new(base: Point3, axis: Vector3, radius: f64, height: f64) -> Self {
        Self {
            base,
            axis,
            radius,
            height,
        }
    }

    /// Executes the operation, adding curve, surface, and B-Rep records to
    /// the store and returning the B-Rep identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for a zero axis or
    /// non-positive radius/height.
    pub fn execute(&self, store: &mut GeometryStore) -> Result<GeometryId> {
        if self.axis.norm() < GEOMETRIC_EPS {
            return Err(OperationError::InvalidInput("cylinder axis is zero".into()).into());
        }
        if self.radius <= GEOMETRIC_EPS {
            return Err(
                OperationError::InvalidInput("cylinder radius must be positive".into()).into(),
            );
        }
        if self.height <= GEOMETRIC_EPS {
            return Err(
                OperationError::InvalidInput("cylinder height must be positive".into()).into(),
            );
        }

        let axis_dir = self.axis / self.axis.norm();
        let sweep = axis_dir * self.height;

        // Circles are built in the XY plane, then rotated onto the axis.
        let rotation = Rotation3::rotation_between(&Vector3::z(), &axis_dir)
            .unwrap_or_else(|| {
                // Anti-parallel axis: half turn about X.
                Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
            });

        let bottom_circle = oriented_circle(self.base, self.radius, &rotation)?;
        let top_circle = oriented_circle(self.base + sweep, self.radius, &rotation)?;

        let side_surface = NurbsSurface::extruded(&bottom_circle, sweep)?;

        let seam_bottom = bottom_circle.point_at(0.0);
        let seam_top = top_circle.point_at(0.0);

        let bottom_curve_id = store.add(Geometry::Curve(bottom_circle));
        let top_curve_id = store.add(Geometry::Curve(top_circle));
        let side_surface_id = store.add(Geometry::Surface(side_surface));

        // Caps are planar patches spanning the circle extents.
        let r = self.radius;
        let corner = |x: f64, y: f64, z: f64| {
            self.base + rotation * Vector3::new(x * r, y * r, 0.0) + axis_dir * z
        };
        // Bottom cap normal faces -axis, top cap +axis.
        let bottom_cap = NurbsSurface::bilinear(
            corner(-1.0, -1.0, 0.0),
            corner(-1.0, 1.0, 0.0),
            corner(1.0, -1.0, 0.0),
            corner(1.0, 1.0, 0.0),
        )?;
        let top_cap = NurbsSurface::bilinear(
            corner(-1.0, -1.0, self.height),
            corner(1.0, -1.0, self.height),
            corner(-1.0, 1.0, self.height),
            corner(1.0, 1.0, self.height),
        )?;
        let bottom_cap_id = store.add(Geometry::Surface(bottom_cap));
        let top_cap_id = store.add(Geometry::Surface(top_cap));

        let mut brep = BRep::new();
        let v_bottom = brep.add_vertex(VertexData { point: seam_bottom });
        let v_top = brep.add_vertex(VertexData { point: seam_top });

        let e_bottom = brep.add_edge(EdgeData {
            start: v_bottom,
            end: v_bottom,
            curve: bottom_curve_id,
            t_start: 0.0,
            t_end: 1.0,
        });
        let e_top = brep.add_edge(EdgeData {
            start: v_top,
            end: v_top,
            curve: top_curve_id,
            t_start: 0.0,
            t_end: 1.0,
        });

        // Side: bounded below by the bottom circle (forward) and above by
        // the top circle (reversed).
        let side_outer = brep.add_loop(LoopData {
            edges: vec![OrientedEdge {
                edge: e_bottom,
                forward: true,
            }],
        });
        let side_inner = brep.add_loop(LoopData {
            edges: vec![OrientedEdge {
                edge: e_top,
                forward: false,
            }],
        });
        brep.add_face(FaceData {
            surface: side_surface_id,
            outer_loop: side_outer,
            inner_loops: vec![side_inner],
            same_sense: true,
        });

        let bottom_loop = brep.add_loop(LoopData {
            edges: vec![OrientedEdge {
                edge: e_bottom,
                forward: false,
            }],
        });
        brep.add_face(FaceData {
            surface: bottom_cap_id,
            outer_loop: bottom_loop,
            inner_loops: Vec::new(),
            same_sense: true,
        });

        let top_loop = brep.add_loop(LoopData {
            edges: vec![OrientedEdge {
                edge: e_top,
                forward: true,
            }],
        });
        brep.add_face(FaceData {
            surface: top_cap_id,
            outer_loop: top_loop,
            inner_loops: Vec::new(),
            same_sense: true,
        });

        brep.validate_solid()?;
        Ok(store.add(Geometry::BRep(brep)))
    }
}

/// Builds a circle in the plane through `center` perpendicular to the
/// rotated Z axis.
fn oriented_circle(
    center: Point3,
    radius: f64,
    rotation: &Rotation3<f64>,
) -> Result<NurbsCurve> {
    let flat = NurbsCurve::circle(Point3::origin(), radius)?;
    let control_points = flat
        .control_points()
        .iter()
        .map(|p| center + rotation * p.coords)
        .collect();
    NurbsCurve::new(
        control_points,
        flat.knots().to_vec(),
        flat.degree(),
        flat.weights().map(<[f64]>::to_vec),
    )
}
