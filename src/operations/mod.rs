pub mod boolean_2d;
pub mod creation;
pub mod offset;
pub mod query;
pub mod sweep;
pub mod transform;
pub mod voxelize;

pub use boolean_2d::{Boolean2D, BooleanKind, BooleanRecords};
pub use creation::{MakeBox, MakeCylinder};
pub use offset::{JointStyle, OffsetOptions, OffsetPolylineRecord, PolylineOffset};
pub use query::{HitTest, PickStack, Ray, SelectionMode, SelectionTolerance};
pub use sweep::MaterializeExtrusion;
pub use transform::TransformRecord;
pub use voxelize::{VoxelizeRecord, VoxelizeRecordResult};
