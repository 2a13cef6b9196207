use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::math::{normalize_or_zero, Aabb, Point2, Point3, Vector3};

/// A triangle mesh: flat position array plus triangle indices, with
/// optional per-vertex attributes.
///
/// A mesh is a piecewise-linear approximation; it carries no implicit
/// inside/outside unless [`is_watertight`](Mesh::is_watertight) holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
    /// Per-vertex normals, when present.
    pub normals: Option<Vec<Vector3>>,
    /// Per-vertex texture coordinates, when present.
    pub uvs: Option<Vec<Point2>>,
    /// Per-vertex RGBA colors, when present.
    pub colors: Option<Vec<[f32; 4]>>,
}

impl Mesh {
    /// Creates a mesh from positions and triangle indices.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexOutOfBounds`] for indices past the
    /// position array, or [`GeometryError::NonFiniteCoordinate`] for NaN
    /// or infinite positions.
    pub fn new(positions: Vec<Point3>, indices: Vec<[u32; 3]>) -> Result<Self> {
        for (index, p) in positions.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(GeometryError::NonFiniteCoordinate { index }.into());
            }
        }
        let vertex_count = positions.len();
        for tri in &indices {
            for &i in tri {
                if i as usize >= vertex_count {
                    return Err(GeometryError::IndexOutOfBounds {
                        index: i,
                        vertex_count,
                    }
                    .into());
                }
            }
        }
        Ok(Self {
            positions,
            indices,
            normals: None,
            uvs: None,
            colors: None,
        })
    }

    /// Attaches per-vertex normals.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AttributeLength`] when the count does not
    /// match the position count.
    pub fn with_normals(mut self, normals: Vec<Vector3>) -> Result<Self> {
        if normals.len() != self.positions.len() {
            return Err(GeometryError::AttributeLength {
                attribute: "normals",
                expected: self.positions.len(),
                actual: normals.len(),
            }
            .into());
        }
        self.normals = Some(normals);
        Ok(self)
    }

    /// Returns the number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns the corner positions of triangle `i`, or `None` out of range.
    #[must_use]
    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        let [a, b, c] = *self.indices.get(i)?;
        Some([
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ])
    }

    /// Returns the bounding box, or `None` for an empty mesh.
    #[must_use]
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Recomputes per-vertex normals by area-weighted face-normal
    /// accumulation. Degenerate triangles contribute nothing.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for tri in &self.indices {
            let a = self.positions[tri[0] as usize];
            let b = self.positions[tri[1] as usize];
            let c = self.positions[tri[2] as usize];
            // Cross product length is twice the triangle area, which gives
            // the area weighting for free.
            let face = (b - a).cross(&(c - a));
            for &i in tri {
                normals[i as usize] += face;
            }
        }
        for n in &mut normals {
            *n = normalize_or_zero(*n);
        }
        self.normals = Some(normals);
    }

    /// Returns whether every edge is shared by exactly two triangles with
    /// opposite orientation, the invariant that makes inside/outside
    /// queries meaningful.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        if self.indices.is_empty() {
            return false;
        }
        // Count directed edges; watertight orientable meshes pair each
        // directed edge with exactly one reverse edge.
        let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
        for tri in &self.indices {
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                *directed.entry((a, b)).or_insert(0) += 1;
            }
        }
        directed
            .iter()
            .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)) == Some(&1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Two triangles forming a unit quad in the XY plane.
    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    /// A closed tetrahedron with outward-facing windings.
    fn tetrahedron() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
        .unwrap()
    }

    #[test]
    fn out_of_bounds_index_rejected() {
        let result = Mesh::new(vec![Point3::origin()], vec![[0, 0, 1]]);
        assert!(result.is_err());
    }

    #[test]
    fn normals_length_checked() {
        let result = quad().with_normals(vec![Vector3::z()]);
        assert!(result.is_err());
    }

    #[test]
    fn triangle_accessor() {
        let mesh = quad();
        let [a, _, c] = mesh.triangle(1).unwrap();
        assert_eq!(a, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(c, Point3::new(0.0, 1.0, 0.0));
        assert!(mesh.triangle(2).is_none());
    }

    #[test]
    fn recomputed_normals_are_unit_z() {
        let mut mesh = quad();
        mesh.recompute_normals();
        for n in mesh.normals.as_ref().unwrap() {
            assert!((n - Vector3::z()).norm() < 1e-12);
        }
    }

    #[test]
    fn open_quad_is_not_watertight() {
        assert!(!quad().is_watertight());
    }

    #[test]
    fn tetrahedron_is_watertight() {
        assert!(tetrahedron().is_watertight());
    }

    #[test]
    fn empty_mesh_is_not_watertight() {
        let mesh = Mesh::new(vec![], vec![]).unwrap();
        assert!(!mesh.is_watertight());
    }
}
