use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{Result, TessellationError};
use crate::geometry::Mesh;
use crate::math::{PlaneFrame, Point3, DISTANCE_EPS};
use crate::store::{Geometry, GeometryStore};
use crate::topology::{BRep, FaceId, LoopData};

use super::{curve, surface, TessellationParams};

/// A tessellated B-Rep: the merged triangle mesh plus, for every
/// triangle, the face it originated from. A single face usually
/// tessellates into many triangles; the map is what lets face selection
/// walk a hit triangle back to its parametric face.
#[derive(Debug, Clone, Default)]
pub struct BRepTessellation {
    /// The merged mesh over all faces.
    pub mesh: Mesh,
    /// Originating face per triangle, parallel to `mesh.indices`.
    pub triangle_faces: Vec<FaceId>,
}

impl BRepTessellation {
    /// Returns the face that produced triangle `i`, or `None` out of range.
    #[must_use]
    pub fn face_of(&self, triangle: usize) -> Option<FaceId> {
        self.triangle_faces.get(triangle).copied()
    }
}

/// Tessellates every face of a B-Rep into one merged mesh.
///
/// Planar faces are triangulated with a constrained Delaunay
/// triangulation of their trim loops (holes included); curved faces run
/// the adaptive quadtree over their surface patch, whose parameter domain
/// the bounding loops already delimit for swept surfaces.
///
/// # Errors
///
/// Returns an error when a referenced curve or surface record is missing
/// from the store, when a loop is degenerate, or on cancellation.
pub fn tessellate_brep(
    store: &GeometryStore,
    brep: &BRep,
    params: &TessellationParams,
    cancel: Option<&CancelToken>,
) -> Result<BRepTessellation> {
    params.validate()?;
    debug!(faces = brep.face_count(), "tessellating b-rep");

    let mut out = BRepTessellation::default();

    for (face_id, face) in brep.faces() {
        let record = store.record(face.surface)?;
        let Geometry::Surface(nurbs) = &record.geometry else {
            return Err(TessellationError::Failed(format!(
                "face surface record is a {}, expected a surface",
                record.geometry.kind()
            ))
            .into());
        };

        let planar_frame = planar_surface_frame(nurbs);
        let face_mesh = if let Some(frame) = planar_frame {
            let outer = loop_points(store, brep, brep.brep_loop(face.outer_loop)?, params)?;
            let mut inners = Vec::with_capacity(face.inner_loops.len());
            for &inner in &face.inner_loops {
                inners.push(loop_points(store, brep, brep.brep_loop(inner)?, params)?);
            }
            tessellate_planar_face(&frame, &outer, &inners)?
        } else {
            surface::tessellate_surface(nurbs, params, cancel)?
        };

        merge_face_mesh(&mut out, face_id, &face_mesh, face.same_sense);
    }

    out.mesh.recompute_normals();
    Ok(out)
}

/// Returns the plane frame of a surface whose control net is flat, or
/// `None` for genuinely curved surfaces.
fn planar_surface_frame(nurbs: &crate::geometry::NurbsSurface) -> Option<PlaneFrame> {
    let flat: Vec<Point3> = nurbs.control_points().iter().flatten().copied().collect();
    let frame = PlaneFrame::fit(&flat).ok()?;
    frame.check_coplanar(&flat, DISTANCE_EPS).ok()?;
    Some(frame)
}

/// Collects the 3D boundary points of a loop by tessellating each
/// oriented edge's curve over its parameter range.
fn loop_points(
    store: &GeometryStore,
    brep: &BRep,
    loop_data: &LoopData,
    params: &TessellationParams,
) -> Result<Vec<Point3>> {
    let mut points: Vec<Point3> = Vec::new();

    for oe in &loop_data.edges {
        let edge = brep.edge(oe.edge)?;
        let record = store.record(edge.curve)?;
        let mut segment = match &record.geometry {
            Geometry::Curve(c) => {
                curve::sample_segment(c, edge.t_start, edge.t_end, params).points
            }
            Geometry::Polyline(p) => curve::tessellate_polyline(p).points,
            other => {
                return Err(TessellationError::Failed(format!(
                    "edge curve record is a {}, expected a curve",
                    other.kind()
                ))
                .into())
            }
        };
        if !oe.forward {
            segment.reverse();
        }
        // The next edge starts where this one ends.
        segment.pop();
        points.extend(segment);
    }

    // Drop near-coincident consecutive points; CDT constraints dislike them.
    points.dedup_by(|a, b| (*a - *b).norm() < DISTANCE_EPS);
    if points.len() >= 2
        && (points[0] - points[points.len() - 1]).norm() < DISTANCE_EPS
    {
        points.pop();
    }

    if points.len() < 3 {
        return Err(TessellationError::Failed(
            "loop tessellation produced fewer than 3 points".to_owned(),
        )
        .into());
    }
    Ok(points)
}

/// Triangulates a planar region bounded by an outer loop and hole loops
/// using a constrained Delaunay triangulation in the plane.
fn tessellate_planar_face(
    frame: &PlaneFrame,
    outer: &[Point3],
    inners: &[Vec<Point3>],
) -> Result<Mesh> {
    let project = |pts: &[Point3]| -> Vec<SpadePoint2<f64>> {
        pts.iter()
            .map(|p| {
                let q = frame.project(p);
                SpadePoint2::new(q.x, q.y)
            })
            .collect()
    };

    let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
    insert_constraint_loop(&mut cdt, &project(outer))?;
    for inner in inners {
        insert_constraint_loop(&mut cdt, &project(inner))?;
    }

    let interior = classify_interior_faces(&cdt);

    let mut positions: Vec<Point3> = Vec::new();
    let mut indices: Vec<[u32; 3]> = Vec::new();
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();

    #[allow(clippy::cast_possible_truncation)]
    for face_handle in cdt.inner_faces() {
        if !interior.contains(&face_handle.fix().index()) {
            continue;
        }
        let mut tri = [0u32; 3];
        for (i, vh) in face_handle.vertices().iter().enumerate() {
            let idx = vh.fix().index();
            let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                existing
            } else {
                let pos = vh.position();
                let new_idx = positions.len() as u32;
                positions.push(frame.lift(&crate::math::Point2::new(pos.x, pos.y)));
                vertex_map.insert(idx, new_idx);
                new_idx
            };
            tri[i] = mesh_idx;
        }
        indices.push(tri);
    }

    Mesh::new(positions, indices)
}

/// Appends one face's mesh into the merged output, flipping winding for
/// reversed-sense faces.
#[allow(clippy::cast_possible_truncation)]
fn merge_face_mesh(out: &mut BRepTessellation, face_id: FaceId, mesh: &Mesh, same_sense: bool) {
    let offset = out.mesh.positions.len() as u32;
    out.mesh.positions.extend_from_slice(&mesh.positions);
    for tri in &mesh.indices {
        let mapped = if same_sense {
            [tri[0] + offset, tri[1] + offset, tri[2] + offset]
        } else {
            [tri[0] + offset, tri[2] + offset, tri[1] + offset]
        };
        out.mesh.indices.push(mapped);
        out.triangle_faces.push(face_id);
    }
}

/// Inserts a closed polygon as constraint edges into the CDT.
fn insert_constraint_loop(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    points: &[SpadePoint2<f64>],
) -> Result<()> {
    if points.len() < 3 {
        return Err(
            TessellationError::Failed("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles = Vec::with_capacity(points.len());
    for &pt in points {
        let h = cdt
            .insert(pt)
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to {
            cdt.add_constraint(from, to);
        }
    }

    Ok(())
}

/// Classifies which inner CDT faces are inside the constraint polygon.
///
/// BFS from faces adjacent to the outer face at depth 0; crossing a
/// constraint edge increments depth. Odd depth means interior, which
/// handles holes for free.
fn classify_interior_faces(
    cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() == outer_fix {
            let rev_face = edge.rev().face();
            if let Some(inner) = rev_face.as_inner() {
                let idx = inner.fix().index();
                if depth_map.contains_key(&idx) {
                    continue;
                }
                let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
                depth_map.insert(idx, depth);
                if depth % 2 == 1 {
                    interior.insert(idx);
                }
                queue.push_back((inner.fix(), depth));
            }
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let neighbor = edge.rev().face();
            if let Some(inner_neighbor) = neighbor.as_inner() {
                let n_idx = inner_neighbor.fix().index();
                if depth_map.contains_key(&n_idx) {
                    continue;
                }
                let new_depth = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                    depth + 1
                } else {
                    depth
                };
                depth_map.insert(n_idx, new_depth);
                if new_depth % 2 == 1 {
                    interior.insert(n_idx);
                }
                queue.push_back((inner_neighbor.fix(), new_depth));
            }
        }
    }

    interior
}
