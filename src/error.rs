use thiserror::Error;

use crate::store::GeometryId;
use crate::topology::{EdgeId, LoopId};

/// Top-level error type for the Modelis geometry kernel.
#[derive(Debug, Error)]
pub enum ModelisError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Errors raised when a geometry record fails its construction invariants.
///
/// These are rejected before any evaluation is attempted; a value of a
/// geometry type that exists always satisfies its invariants.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("knot vector has {actual} knots, expected {expected} (control points + degree + 1)")]
    KnotVectorLength { expected: usize, actual: usize },

    #[error("knot vector decreases at index {index}")]
    KnotVectorDecreasing { index: usize },

    #[error("degree must be at least 1, got {degree}")]
    InvalidDegree { degree: usize },

    #[error("at least {required} control points required for degree {degree}, got {actual}")]
    TooFewControlPoints {
        required: usize,
        degree: usize,
        actual: usize,
    },

    #[error("{actual} weights supplied for {expected} control points")]
    WeightCount { expected: usize, actual: usize },

    #[error("weight at index {index} is not positive")]
    NonPositiveWeight { index: usize },

    #[error("at least {required} vertices required, got {actual}")]
    TooFewVertices { required: usize, actual: usize },

    #[error("coordinate at index {index} is not finite")]
    NonFiniteCoordinate { index: usize },

    #[error("voxel resolution along axis {axis} must be at least 1")]
    InvalidResolution { axis: usize },

    #[error("mesh index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    #[error("{attribute} has length {actual}, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised by the geometry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no geometry record with id {id:?}")]
    NotFound { id: GeometryId },

    #[error("geometry {id:?} is still referenced by {count} other record(s)")]
    StillReferenced { id: GeometryId, count: usize },
}

/// Errors raised by B-Rep validation and topological queries.
///
/// Validation errors carry the offending entity so the caller can decide
/// whether to abort or repair.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("loop {id:?} has no edges")]
    EmptyLoop { id: LoopId },

    #[error("loop {id:?} is disconnected at position {position}")]
    DisconnectedLoop { id: LoopId, position: usize },

    #[error("loop {id:?} does not close back to its start vertex")]
    OpenLoop { id: LoopId },

    #[error("edge {id:?} is used {count} times by face loops, expected 2 for a solid")]
    EdgeUseCount { id: EdgeId, count: usize },

    #[error("edge {id:?} is traversed in the same direction by both adjacent loops")]
    InconsistentOrientation { id: EdgeId },

    #[error("polyline vertex {vertex} lies off the common plane")]
    NotCoplanar { vertex: usize },

    #[error("polyline must be closed for this operation")]
    NotClosed,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised by modeling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Errors raised by tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`ModelisError`].
pub type Result<T> = std::result::Result<T, ModelisError>;
