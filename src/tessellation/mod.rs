mod cache;
mod curve;
mod face;
mod surface;

pub use cache::{tessellate_record, CachedTessellation, TessellationCache};
pub use curve::{tessellate_curve, tessellate_polyline};
pub use face::{tessellate_brep, BRepTessellation};
pub use surface::tessellate_surface;

use crate::error::{Result, TessellationError};
use crate::math::Point3;

/// Parameters controlling tessellation quality.
///
/// The driving quantity is a *screen-space error budget*: a pixel
/// tolerance scaled by the caller's current world-units-per-pixel, so the
/// same geometry tessellates coarser when zoomed out and finer when
/// zoomed in, at visually constant quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationParams {
    /// Maximum allowed screen-space deviation, in pixels.
    pub pixel_tolerance: f64,
    /// World units per pixel at the current viewport scale.
    pub world_per_pixel: f64,
    /// Minimum number of segments for curves.
    pub min_segments: usize,
    /// Maximum number of segments for curves.
    pub max_segments: usize,
    /// Maximum quadtree subdivision depth for surfaces.
    pub max_depth: usize,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            pixel_tolerance: 0.5,
            world_per_pixel: 0.01,
            min_segments: 4,
            max_segments: 256,
            max_depth: 8,
        }
    }
}

impl TessellationParams {
    /// The error budget in world units.
    #[must_use]
    pub fn world_tolerance(&self) -> f64 {
        self.pixel_tolerance * self.world_per_pixel
    }

    /// Discretizes the error budget into a zoom bucket for cache keying.
    ///
    /// Buckets are powers of two of the world tolerance: zooming within a
    /// factor of two reuses the cached tessellation, crossing a density
    /// threshold invalidates it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn zoom_bucket(&self) -> i32 {
        self.world_tolerance().log2().floor() as i32
    }

    /// Validates that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::InvalidParameters`] for non-positive
    /// tolerances or an empty segment range.
    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_tolerance > 0.0 && self.pixel_tolerance.is_finite()) {
            return Err(TessellationError::InvalidParameters(
                "pixel tolerance must be positive".to_owned(),
            )
            .into());
        }
        if !(self.world_per_pixel > 0.0 && self.world_per_pixel.is_finite()) {
            return Err(TessellationError::InvalidParameters(
                "world-per-pixel scale must be positive".to_owned(),
            )
            .into());
        }
        if self.min_segments == 0 || self.max_segments < self.min_segments {
            return Err(TessellationError::InvalidParameters(
                "segment bounds must satisfy 0 < min <= max".to_owned(),
            )
            .into());
        }
        Ok(())
    }
}

/// A polyline approximation of a curve, with the parameter value that
/// produced each point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveTessellation {
    /// The ordered points of the approximation.
    pub points: Vec<Point3>,
    /// Curve parameter for each point, in ascending order.
    pub parameters: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_tolerance_scales_with_zoom() {
        let near = TessellationParams {
            world_per_pixel: 0.001,
            ..TessellationParams::default()
        };
        let far = TessellationParams {
            world_per_pixel: 0.1,
            ..TessellationParams::default()
        };
        assert!(near.world_tolerance() < far.world_tolerance());
    }

    #[test]
    fn zoom_bucket_steps_on_powers_of_two() {
        let a = TessellationParams {
            pixel_tolerance: 1.0,
            world_per_pixel: 0.010,
            ..TessellationParams::default()
        };
        let b = TessellationParams {
            pixel_tolerance: 1.0,
            world_per_pixel: 0.015,
            ..TessellationParams::default()
        };
        let c = TessellationParams {
            pixel_tolerance: 1.0,
            world_per_pixel: 0.025,
            ..TessellationParams::default()
        };
        assert_eq!(a.zoom_bucket(), b.zoom_bucket());
        assert_ne!(a.zoom_bucket(), c.zoom_bucket());
    }

    #[test]
    fn invalid_params_rejected() {
        let params = TessellationParams {
            pixel_tolerance: 0.0,
            ..TessellationParams::default()
        };
        assert!(params.validate().is_err());

        let params = TessellationParams {
            min_segments: 8,
            max_segments: 4,
            ..TessellationParams::default()
        };
        assert!(params.validate().is_err());
    }
}
