use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::geometry::Mesh;
use crate::math::{Aabb, Point3, Vector3};

/// A regular voxel grid: integer resolution per axis, world bounds, and a
/// flat density array (0 = empty, nonzero = filled).
///
/// Cells are indexed `(i, j, k)` along X/Y/Z with the flat index
/// `i + rx * (j + ry * k)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    resolution: [usize; 3],
    min: [f64; 3],
    max: [f64; 3],
    density: Vec<u8>,
}

impl VoxelGrid {
    /// Creates an empty grid over `bounds` with the given resolution.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidResolution`] for a zero dimension,
    /// or [`GeometryError::Degenerate`] for inverted bounds.
    pub fn new(resolution: [usize; 3], bounds: Aabb) -> Result<Self> {
        for (axis, &r) in resolution.iter().enumerate() {
            if r == 0 {
                return Err(GeometryError::InvalidResolution { axis }.into());
            }
        }
        for axis in 0..3 {
            if bounds.max[axis] < bounds.min[axis] {
                return Err(GeometryError::Degenerate(format!(
                    "inverted bounds along axis {axis}"
                ))
                .into());
            }
        }
        let count = resolution[0] * resolution[1] * resolution[2];
        Ok(Self {
            resolution,
            min: [bounds.min.x, bounds.min.y, bounds.min.z],
            max: [bounds.max.x, bounds.max.y, bounds.max.z],
            density: vec![0; count],
        })
    }

    /// Returns the per-axis resolution.
    #[must_use]
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Returns the world bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Point3::new(self.min[0], self.min[1], self.min[2]),
            Point3::new(self.max[0], self.max[1], self.max[2]),
        )
    }

    /// Returns the world size of one cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_size(&self) -> Vector3 {
        Vector3::new(
            (self.max[0] - self.min[0]) / self.resolution[0] as f64,
            (self.max[1] - self.min[1]) / self.resolution[1] as f64,
            (self.max[2] - self.min[2]) / self.resolution[2] as f64,
        )
    }

    /// Returns the total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.resolution[0] * self.resolution[1] * self.resolution[2]
    }

    /// Returns the number of filled cells.
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.density.iter().filter(|&&d| d != 0).count()
    }

    /// Returns the raw density array.
    #[must_use]
    pub fn density(&self) -> &[u8] {
        &self.density
    }

    /// Flat index of cell `(i, j, k)`.
    #[must_use]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.resolution[0] * (j + self.resolution[1] * k)
    }

    /// Returns the density of cell `(i, j, k)`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> u8 {
        self.density[self.index(i, j, k)]
    }

    /// Sets the density of cell `(i, j, k)`.
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: u8) {
        let idx = self.index(i, j, k);
        self.density[idx] = value;
    }

    /// World-space center of cell `(i, j, k)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> Point3 {
        let size = self.cell_size();
        Point3::new(
            self.min[0] + (i as f64 + 0.5) * size.x,
            self.min[1] + (j as f64 + 0.5) * size.y,
            self.min[2] + (k as f64 + 0.5) * size.z,
        )
    }

    /// Cell index range `(lo, hi)` (inclusive) overlapped by a world-space
    /// box, clamped to the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn cell_range(&self, aabb: &Aabb) -> ([usize; 3], [usize; 3]) {
        let size = self.cell_size();
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for axis in 0..3 {
            let extent = size[axis].max(f64::MIN_POSITIVE);
            let rel_lo = (aabb.min[axis] - self.min[axis]) / extent;
            let rel_hi = (aabb.max[axis] - self.min[axis]) / extent;
            let last = self.resolution[axis] - 1;
            lo[axis] = (rel_lo.floor().max(0.0) as usize).min(last);
            hi[axis] = (rel_hi.floor().max(0.0) as usize).min(last);
        }
        (lo, hi)
    }

    /// Reconstructs a quad-face mesh over the filled cells: a face is
    /// emitted wherever a filled cell borders an empty cell or the grid
    /// boundary, wound so normals point out of the filled region.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn surface_mesh(&self) -> Mesh {
        let size = self.cell_size();
        let mut positions: Vec<Point3> = Vec::new();
        let mut indices: Vec<[u32; 3]> = Vec::new();
        let mut vertex_map: HashMap<[usize; 3], u32> = HashMap::new();

        let mut corner = |positions: &mut Vec<Point3>, c: [usize; 3]| -> u32 {
            if let Some(&idx) = vertex_map.get(&c) {
                return idx;
            }
            let idx = positions.len() as u32;
            positions.push(Point3::new(
                self.min[0] + c[0] as f64 * size.x,
                self.min[1] + c[1] as f64 * size.y,
                self.min[2] + c[2] as f64 * size.z,
            ));
            vertex_map.insert(c, idx);
            idx
        };

        // Neighbor direction, then the face corners in outward-CCW order
        // relative to that direction, as corner offsets on the unit cell.
        const FACES: [([isize; 3], [[usize; 3]; 4]); 6] = [
            ([-1, 0, 0], [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]]),
            ([1, 0, 0], [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]]),
            ([0, -1, 0], [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]]),
            ([0, 1, 0], [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]]),
            ([0, 0, -1], [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]]),
            ([0, 0, 1], [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]]),
        ];

        let [rx, ry, rz] = self.resolution;
        for k in 0..rz {
            for j in 0..ry {
                for i in 0..rx {
                    if self.get(i, j, k) == 0 {
                        continue;
                    }
                    for (dir, corners) in &FACES {
                        let ni = i as isize + dir[0];
                        let nj = j as isize + dir[1];
                        let nk = k as isize + dir[2];
                        let neighbor_filled = ni >= 0
                            && nj >= 0
                            && nk >= 0
                            && (ni as usize) < rx
                            && (nj as usize) < ry
                            && (nk as usize) < rz
                            && self.get(ni as usize, nj as usize, nk as usize) != 0;
                        if neighbor_filled {
                            continue;
                        }
                        let quad: Vec<u32> = corners
                            .iter()
                            .map(|c| corner(&mut positions, [i + c[0], j + c[1], k + c[2]]))
                            .collect();
                        indices.push([quad[0], quad[1], quad[2]]);
                        indices.push([quad[0], quad[2], quad[3]]);
                    }
                }
            }
        }

        // Positions and indices are constructed consistently.
        let mut mesh = Mesh::new(positions, indices).unwrap_or_default();
        mesh.recompute_normals();
        mesh
    }
}
