pub mod basis;
mod curve;
mod knots;
mod surface;

pub use curve::{CurvePoint, NurbsCurve};
pub use surface::{NurbsSurface, SurfacePoint};
