pub mod extrusion;
pub mod mesh;
pub mod nurbs;
pub mod polyline;

pub use extrusion::Extrusion;
pub use mesh::Mesh;
pub use nurbs::{CurvePoint, NurbsCurve, NurbsSurface, SurfacePoint};
pub use polyline::Polyline;
