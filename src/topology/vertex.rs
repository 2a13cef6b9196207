use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a topological vertex within a B-Rep.
    pub struct VertexId;
}

/// Data associated with a topological vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexData {
    /// Position in world space.
    pub point: Point3,
}
