use crate::error::{GeometryError, Result};
use crate::store::GeometryId;

/// A swept solid description: a profile section moved along a path.
///
/// Both `profile` and `path` are weak references into the geometry store;
/// deleting a referenced record invalidates the extrusion but does not
/// cascade-delete it. The sweep is evaluated lazily (see
/// [`Sweep`](crate::operations::sweep::Sweep)), so edits to the referenced
/// records propagate automatically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrusion {
    /// The profile section record (curve or polyline).
    pub profile: GeometryId,
    /// The sweep path record (curve or polyline).
    pub path: GeometryId,
    /// Total rotation of the profile about the path tangent, in radians,
    /// distributed linearly along the path.
    pub twist: f64,
    /// Profile scale factor at the end of the path; 1.0 sweeps uniformly.
    pub scale_end: f64,
}

impl Extrusion {
    /// Creates an extrusion with no twist and uniform scale.
    #[must_use]
    pub fn new(profile: GeometryId, path: GeometryId) -> Self {
        Self {
            profile,
            path,
            twist: 0.0,
            scale_end: 1.0,
        }
    }

    /// Sets the total twist in radians.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFiniteCoordinate`] for a non-finite twist.
    pub fn with_twist(mut self, twist: f64) -> Result<Self> {
        if !twist.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { index: 0 }.into());
        }
        self.twist = twist;
        Ok(self)
    }

    /// Sets the end-of-path scale factor.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for a non-positive or
    /// non-finite scale.
    pub fn with_scale_end(mut self, scale_end: f64) -> Result<Self> {
        if !scale_end.is_finite() || scale_end <= 0.0 {
            return Err(GeometryError::Degenerate(format!(
                "end scale {scale_end} must be positive"
            ))
            .into());
        }
        self.scale_end = scale_end;
        Ok(self)
    }
}
