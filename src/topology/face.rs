use crate::store::GeometryId;

use super::brep_loop::LoopId;

slotmap::new_key_type! {
    /// Unique identifier for a face within a B-Rep.
    pub struct FaceId;
}

/// Data associated with a topological face.
///
/// A face is a bounded region on a surface, defined by an outer loop and
/// optionally inner loops (holes). The surface reference is a weak
/// identifier into the geometry store.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    /// The surface record in the geometry store on which this face lies.
    pub surface: GeometryId,
    /// The outer boundary loop.
    pub outer_loop: LoopId,
    /// Inner boundary loops (holes).
    pub inner_loops: Vec<LoopId>,
    /// If `true`, the face normal agrees with the surface normal.
    pub same_sense: bool,
}
