use crate::store::GeometryId;

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a topological edge within a B-Rep.
    pub struct EdgeId;
}

/// Data associated with a topological edge.
///
/// An edge connects two vertices and references the curve record that
/// defines its shape between them. The curve reference is weak: it is an
/// identifier resolved through the geometry store, never an owning
/// pointer, which keeps B-Rep and geometry free of ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// The curve record in the geometry store defining this edge's shape.
    pub curve: GeometryId,
    /// Parameter on the curve corresponding to the start vertex.
    pub t_start: f64,
    /// Parameter on the curve corresponding to the end vertex.
    pub t_end: f64,
}
