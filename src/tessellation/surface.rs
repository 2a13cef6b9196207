use std::collections::HashMap;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{OperationError, Result};
use crate::geometry::{Mesh, NurbsSurface};
use crate::math::Point3;

use super::TessellationParams;

/// Tessellates a surface by adaptive parametric quadtree subdivision.
///
/// Each cell's midpoint deviation from the bilinear interpolation of its
/// corners is compared against the world-space error budget; cells over
/// budget split into four children until the budget or `max_depth` is
/// reached. Vertices are deduplicated by exact UV bits so adjacent cells
/// at the same level share them.
///
/// # Errors
///
/// Returns [`OperationError::Cancelled`] when the token fires between
/// subdivision levels, or an invalid-parameter error.
pub fn tessellate_surface(
    surface: &NurbsSurface,
    params: &TessellationParams,
    cancel: Option<&CancelToken>,
) -> Result<Mesh> {
    params.validate()?;
    let ((u0, u1), (v0, v1)) = surface.domain();
    let tolerance = params.world_tolerance();

    debug!(
        tolerance,
        max_depth = params.max_depth,
        "tessellating surface"
    );

    let mut builder = MeshBuilder::default();
    subdivide_cell(
        surface,
        (u0, u1),
        (v0, v1),
        tolerance,
        0,
        params.max_depth,
        &mut builder,
        cancel,
    )?;

    let mut mesh = Mesh::new(builder.positions, builder.indices)?;
    mesh.recompute_normals();
    Ok(mesh)
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<Point3>,
    indices: Vec<[u32; 3]>,
    vertex_cache: HashMap<(u64, u64), u32>,
}

impl MeshBuilder {
    #[allow(clippy::cast_possible_truncation)]
    fn vertex(&mut self, surface: &NurbsSurface, u: f64, v: f64) -> u32 {
        let key = (u.to_bits(), v.to_bits());
        if let Some(&idx) = self.vertex_cache.get(&key) {
            return idx;
        }
        let idx = self.positions.len() as u32;
        self.positions.push(surface.point_at(u, v));
        self.vertex_cache.insert(key, idx);
        idx
    }
}

/// Recursively subdivides one UV cell; emits two triangles when the
/// deviation test passes or the depth limit is hit.
#[allow(clippy::too_many_arguments)]
fn subdivide_cell(
    surface: &NurbsSurface,
    (u0, u1): (f64, f64),
    (v0, v1): (f64, f64),
    tolerance: f64,
    depth: usize,
    max_depth: usize,
    builder: &mut MeshBuilder,
    cancel: Option<&CancelToken>,
) -> Result<()> {
    if let Some(token) = cancel {
        if token.is_cancelled() {
            return Err(OperationError::Cancelled.into());
        }
    }

    let mid_u = f64::midpoint(u0, u1);
    let mid_v = f64::midpoint(v0, v1);

    let p00 = surface.point_at(u0, v0);
    let p10 = surface.point_at(u1, v0);
    let p01 = surface.point_at(u0, v1);
    let p11 = surface.point_at(u1, v1);
    let actual_mid = surface.point_at(mid_u, mid_v);

    let bilinear_mid = Point3::new(
        (p00.x + p10.x + p01.x + p11.x) / 4.0,
        (p00.y + p10.y + p01.y + p11.y) / 4.0,
        (p00.z + p10.z + p01.z + p11.z) / 4.0,
    );
    let deviation = (actual_mid - bilinear_mid).norm();

    if deviation > tolerance && depth < max_depth {
        subdivide_cell(surface, (u0, mid_u), (v0, mid_v), tolerance, depth + 1, max_depth, builder, cancel)?;
        subdivide_cell(surface, (mid_u, u1), (v0, mid_v), tolerance, depth + 1, max_depth, builder, cancel)?;
        subdivide_cell(surface, (u0, mid_u), (mid_v, v1), tolerance, depth + 1, max_depth, builder, cancel)?;
        subdivide_cell(surface, (mid_u, u1), (mid_v, v1), tolerance, depth + 1, max_depth, builder, cancel)?;
    } else {
        let i00 = builder.vertex(surface, u0, v0);
        let i10 = builder.vertex(surface, u1, v0);
        let i01 = builder.vertex(surface, u0, v1);
        let i11 = builder.vertex(surface, u1, v1);
        builder.indices.push([i00, i10, i11]);
        builder.indices.push([i00, i11, i01]);
    }

    Ok(())
}
