pub mod brep_loop;
pub mod edge;
pub mod face;
mod validate;
pub mod vertex;

pub use brep_loop::{LoopData, LoopId, OrientedEdge};
pub use edge::{EdgeData, EdgeId};
pub use face::{FaceData, FaceId};
pub use vertex::{VertexData, VertexId};

use slotmap::SlotMap;

use crate::error::{Result, TopologyError};
use crate::store::GeometryId;

/// A boundary-representation solid: topology binding surface and curve
/// records into faces, edges, loops, and vertices.
///
/// Entities reference each other via typed generational IDs, avoiding
/// self-referential structures. Geometry (curves, surfaces) is referenced
/// weakly by [`GeometryId`] and resolved through the geometry store.
///
/// Topology *is* the solid: the orientation of loops determines
/// inside/outside, and a B-Rep with inconsistent orientation fails
/// [`validate`](BRep::validate) rather than being silently accepted.
#[derive(Debug, Clone, Default)]
pub struct BRep {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    loops: SlotMap<LoopId, LoopData>,
    faces: SlotMap<FaceId, FaceData>,
}

impl BRep {
    /// Creates a new, empty B-Rep.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()).into())
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        self.edges.insert(data)
    }

    /// Returns the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()).into())
    }

    // --- Loop operations ---

    /// Inserts a loop and returns its ID.
    pub fn add_loop(&mut self, data: LoopData) -> LoopId {
        self.loops.insert(data)
    }

    /// Returns the loop data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn brep_loop(&self, id: LoopId) -> Result<&LoopData> {
        self.loops
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("loop".into()).into())
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    /// Returns the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found.
    pub fn face(&self, id: FaceId) -> Result<&FaceData> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()).into())
    }

    // --- Iteration ---

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Iterates over all loops.
    pub fn loop_entries(&self) -> impl Iterator<Item = (LoopId, &LoopData)> {
        self.loops.iter()
    }

    /// Iterates over all faces.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> {
        self.faces.iter()
    }

    /// Returns the number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Applies `map` to every topological vertex position.
    ///
    /// Referenced curve and surface records are not touched; store-level
    /// transforms handle those.
    pub fn transform_vertices(&mut self, mut map: impl FnMut(&crate::math::Point3) -> crate::math::Point3) {
        for vertex in self.vertices.values_mut() {
            vertex.point = map(&vertex.point);
        }
    }

    /// Geometry-store identifiers referenced by this B-Rep (face surfaces
    /// and edge curves), deduplicated.
    #[must_use]
    pub fn referenced_geometry(&self) -> Vec<GeometryId> {
        let mut ids: Vec<GeometryId> = self
            .faces
            .values()
            .map(|f| f.surface)
            .chain(self.edges.values().map(|e| e.curve))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Start and end vertices of an oriented edge, in traversal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn oriented_vertices(&self, oe: OrientedEdge) -> Result<(VertexId, VertexId)> {
        let edge = self.edge(oe.edge)?;
        if oe.forward {
            Ok((edge.start, edge.end))
        } else {
            Ok((edge.end, edge.start))
        }
    }

    /// Validates structural integrity and orientation consistency.
    ///
    /// Checks, in order: every edge's vertices exist; every loop is
    /// non-empty, connected end-to-start under its orientations, and
    /// closed; every face's loops exist. Violations carry the offending
    /// entity ID.
    ///
    /// # Errors
    ///
    /// Returns the first [`TopologyError`] found.
    pub fn validate(&self) -> Result<()> {
        validate::structure(self)
    }

    /// Validates that the B-Rep bounds a solid: in addition to
    /// [`validate`](BRep::validate), every edge must be used by exactly
    /// two face loops with opposite orientation.
    ///
    /// # Errors
    ///
    /// Returns the first [`TopologyError`] found.
    pub fn validate_solid(&self) -> Result<()> {
        validate::structure(self)?;
        validate::solid_orientation(self)
    }

    /// Returns whether [`validate_solid`](BRep::validate_solid) passes.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.validate_solid().is_ok()
    }
}
