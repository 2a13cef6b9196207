use crate::cancel::CancelToken;
use crate::error::{OperationError, Result};
use crate::geometry::Mesh;
use crate::store::{Geometry, GeometryId, GeometryStore};
use crate::tessellation::{tessellate_brep, tessellate_surface, TessellationParams};
use crate::voxel::{VoxelStats, Voxelize};

/// Result of voxelizing a record: the new grid and reconstruction-mesh
/// records plus the occupancy statistics.
#[derive(Debug, Clone, Copy)]
pub struct VoxelizeRecordResult {
    /// Identifier of the new voxel-grid record.
    pub grid: GeometryId,
    /// Identifier of the new reconstruction-mesh record.
    pub mesh: GeometryId,
    /// Occupancy statistics.
    pub stats: VoxelStats,
}

/// Store-level voxelization: resolves a record to a triangle mesh
/// (tessellating solids and surfaces as needed), voxelizes it, and adds
/// the grid and reconstruction mesh as new records.
pub struct VoxelizeRecord {
    id: GeometryId,
    resolution: usize,
    params: TessellationParams,
}

impl VoxelizeRecord {
    /// Creates a new `VoxelizeRecord` operation.
    #[must_use]
    pub fn new(id: GeometryId, resolution: usize, params: TessellationParams) -> Self {
        Self {
            id,
            resolution,
            params,
        }
    }

    /// Executes the voxelization. Cancellation (or any other failure)
    /// leaves the store untouched: records are only added after both
    /// phases complete.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for record kinds without
    /// a surface to rasterize, or the underlying voxelizer errors.
    pub fn execute(
        &self,
        store: &mut GeometryStore,
        cancel: Option<&CancelToken>,
    ) -> Result<VoxelizeRecordResult> {
        let record = store.record(self.id)?;
        let mesh: Mesh = match &record.geometry {
            Geometry::Mesh(m) => m.clone(),
            Geometry::BRep(b) => tessellate_brep(store, b, &self.params, cancel)?.mesh,
            Geometry::Surface(s) => tessellate_surface(s, &self.params, cancel)?,
            Geometry::Extrusion(e) => {
                crate::operations::sweep::sweep_mesh(store, e, &self.params, cancel)?
            }
            other => {
                return Err(OperationError::InvalidInput(format!(
                    "cannot voxelize a {}",
                    other.kind()
                ))
                .into())
            }
        };

        let result = Voxelize::new(&mesh, self.resolution).execute(cancel)?;
        let grid = store.add(Geometry::Voxels(result.grid));
        let mesh = store.add(Geometry::Mesh(result.mesh));
        Ok(VoxelizeRecordResult {
            grid,
            mesh,
            stats: result.stats,
        })
    }
}
