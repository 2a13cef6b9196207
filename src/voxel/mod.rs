mod grid;
mod voxelize;

pub use grid::VoxelGrid;
pub use voxelize::{Voxelize, VoxelizeResult, VoxelStats};
