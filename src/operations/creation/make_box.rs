use crate::error::{OperationError, Result};
use crate::geometry::{NurbsCurve, NurbsSurface};
use crate::math::{Point3, GEOMETRIC_EPS};
use crate::store::{Geometry, GeometryId, GeometryStore};
use crate::topology::{BRep, EdgeData, FaceData, LoopData, OrientedEdge, VertexData};

/// Creates an axis-aligned box solid from two corner points.
///
/// The box is a full B-Rep: eight vertices, twelve edges referencing
/// degree-1 curve records, six faces referencing bilinear surface records,
/// with loops wound so that all face normals point outward.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, adding curve, surface, and B-Rep records to
    /// the store and returning the B-Rep identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] when the box is degenerate
    /// along any axis.
    pub fn execute(&self, store: &mut GeometryStore) -> Result<GeometryId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        for axis in 0..3 {
            if hi[axis] - lo[axis] < GEOMETRIC_EPS {
                return Err(OperationError::InvalidInput(format!(
                    "box is degenerate along axis {axis}"
                ))
                .into());
            }
        }

        let corners = [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ];

        let mut brep = BRep::new();
        let vertices: Vec<_> = corners
            .iter()
            .map(|&point| brep.add_vertex(VertexData { point }))
            .collect();

        // Directed edges: bottom ring, top ring, verticals.
        const EDGE_VERTS: [(usize, usize); 12] = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];

        let mut edges = Vec::with_capacity(12);
        for &(a, b) in &EDGE_VERTS {
            let curve = NurbsCurve::line(corners[a], corners[b])?;
            let curve_id = store.add(Geometry::Curve(curve));
            edges.push(brep.add_edge(EdgeData {
                start: vertices[a],
                end: vertices[b],
                curve: curve_id,
                t_start: 0.0,
                t_end: 1.0,
            }));
        }

        // Faces as outward-CCW corner cycles, each edge index paired with
        // its traversal direction along the cycle.
        const FACES: [([usize; 4], [(usize, bool); 4]); 6] = [
            // bottom (-z): 0→3→2→1
            ([0, 3, 2, 1], [(3, false), (2, false), (1, false), (0, false)]),
            // top (+z): 4→5→6→7
            ([4, 5, 6, 7], [(4, true), (5, true), (6, true), (7, true)]),
            // front (-y): 0→1→5→4
            ([0, 1, 5, 4], [(0, true), (9, true), (4, false), (8, false)]),
            // right (+x): 1→2→6→5
            ([1, 2, 6, 5], [(1, true), (10, true), (5, false), (9, false)]),
            // back (+y): 2→3→7→6
            ([2, 3, 7, 6], [(2, true), (11, true), (6, false), (10, false)]),
            // left (-x): 3→0→4→7
            ([3, 0, 4, 7], [(3, true), (8, true), (7, false), (11, false)]),
        ];

        for (cycle, oriented) in &FACES {
            let [a, b, c, d] = *cycle;
            // Bilinear corners chosen so du × dv matches the outward normal
            // of the CCW cycle a→b→c→d.
            let surface =
                NurbsSurface::bilinear(corners[a], corners[b], corners[d], corners[c])?;
            let surface_id = store.add(Geometry::Surface(surface));

            let loop_id = brep.add_loop(LoopData {
                edges: oriented
                    .iter()
                    .map(|&(edge, forward)| OrientedEdge {
                        edge: edges[edge],
                        forward,
                    })
                    .collect(),
            });

            brep.add_face(FaceData {
                surface: surface_id,
                outer_loop: loop_id,
                inner_loops: Vec::new(),
                same_sense: true,
            });
        }

        brep.validate_solid()?;
        Ok(store.add(Geometry::BRep(brep)))
    }
}
