use super::edge::EdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a loop within a B-Rep.
    pub struct LoopId;
}

/// An edge reference with traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    /// The referenced edge.
    pub edge: EdgeId,
    /// `true` to traverse start→end, `false` for end→start.
    pub forward: bool,
}

/// An ordered, oriented sequence of edges bounding a face region.
///
/// Loop winding determines the outward-normal direction of the face it
/// bounds; orientation is load-bearing, not cosmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopData {
    /// The oriented edges, in traversal order.
    pub edges: Vec<OrientedEdge>,
}
