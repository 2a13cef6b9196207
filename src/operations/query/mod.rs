mod bounding_box;
mod closest_point;
mod measure;
mod pick;

pub use bounding_box::BoundingBox;
pub use closest_point::{closest_point_on_curve, ClosestPoint, ClosestPointResult};
pub use hit_test::{Component, Hit, HitTest, Ray, SelectionMode, SelectionTolerance};
pub use measure::{curve_length, Length, PlanarArea};
pub use pick::PickStack;
