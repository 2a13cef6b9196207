use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::cancel::CancelToken;
use crate::error::{Result, TessellationError};
use crate::geometry::Mesh;
use crate::operations::sweep;
use crate::store::{Geometry, GeometryId, GeometryStore};

use super::{curve, face, face::BRepTessellation, surface, CurveTessellation, TessellationParams};

/// A tessellation result, shared cheaply between cache and callers.
#[derive(Debug, Clone)]
pub enum CachedTessellation {
    /// Polyline approximation of a curve or polyline record.
    Curve(Arc<CurveTessellation>),
    /// Triangle mesh for surface, mesh, extrusion, or voxel records.
    Mesh(Arc<Mesh>),
    /// Merged mesh plus triangle-to-face map for a B-Rep record.
    BRep(Arc<BRepTessellation>),
}

/// Cache of tessellation results keyed by `(identifier, record version,
/// zoom bucket)`.
///
/// Invalidation is exact, not best-effort: any store update bumps the
/// record version and thereby misses every stale key, and zoom changes
/// only miss when they cross a tessellation-density threshold (see
/// [`TessellationParams::zoom_bucket`]). Repeated queries at a stable
/// zoom return the identical cached result.
#[derive(Debug, Default)]
pub struct TessellationCache {
    entries: HashMap<(GeometryId, u64, i32), CachedTessellation>,
}

impl TessellationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for a key, if any.
    #[must_use]
    pub fn get(&self, id: GeometryId, version: u64, bucket: i32) -> Option<&CachedTessellation> {
        self.entries.get(&(id, version, bucket))
    }

    /// Drops every entry for `id`, across all versions and zoom buckets.
    pub fn invalidate(&mut self, id: GeometryId) {
        self.entries.retain(|&(entry_id, _, _), _| entry_id != id);
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tessellates the record under `id`, consulting and filling `cache`.
///
/// Idempotent: identical `(id, version, zoom bucket)` inputs return the
/// identical cached result without re-tessellating.
///
/// # Errors
///
/// Returns an error for an absent record, a vertex record (which has no
/// tessellation), a dangling extrusion reference, or cancellation.
pub fn tessellate_record(
    store: &GeometryStore,
    cache: &mut TessellationCache,
    id: GeometryId,
    params: &TessellationParams,
    cancel: Option<&CancelToken>,
) -> Result<CachedTessellation> {
    params.validate()?;
    let record = store.record(id)?;
    let key = (id, record.version, params.zoom_bucket());

    if let Some(hit) = cache.entries.get(&key) {
        trace!(?id, version = record.version, "tessellation cache hit");
        return Ok(hit.clone());
    }

    let result = match &record.geometry {
        Geometry::Vertex(_) => {
            return Err(TessellationError::InvalidParameters(
                "vertex records have no tessellation".to_owned(),
            )
            .into())
        }
        Geometry::Polyline(p) => CachedTessellation::Curve(Arc::new(curve::tessellate_polyline(p))),
        Geometry::Curve(c) => {
            CachedTessellation::Curve(Arc::new(curve::tessellate_curve(c, params)))
        }
        Geometry::Surface(s) => {
            CachedTessellation::Mesh(Arc::new(surface::tessellate_surface(s, params, cancel)?))
        }
        Geometry::Extrusion(e) => {
            CachedTessellation::Mesh(Arc::new(sweep::sweep_mesh(store, e, params, cancel)?))
        }
        Geometry::BRep(b) => {
            CachedTessellation::BRep(Arc::new(face::tessellate_brep(store, b, params, cancel)?))
        }
        Geometry::Mesh(m) => CachedTessellation::Mesh(Arc::new(m.clone())),
        Geometry::Voxels(v) => CachedTessellation::Mesh(Arc::new(v.surface_mesh())),
    };

    cache.entries.insert(key, result.clone());
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{NurbsCurve, Polyline};
    use crate::math::Point3;

    fn curve_record(store: &mut GeometryStore) -> GeometryId {
        store.add(Geometry::Curve(
            NurbsCurve::new(
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(1.0, 2.0, 0.0),
                    Point3::new(2.0, 0.0, 0.0),
                ],
                vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                2,
                None,
            )
            .unwrap(),
        ))
    }

    #[test]
    fn second_query_hits_cache() {
        let mut store = GeometryStore::new();
        let mut cache = TessellationCache::new();
        let id = curve_record(&mut store);
        let params = TessellationParams::default();

        let first = tessellate_record(&store, &mut cache, id, &params, None).unwrap();
        assert_eq!(cache.len(), 1);
        let second = tessellate_record(&store, &mut cache, id, &params, None).unwrap();
        assert_eq!(cache.len(), 1);

        // Identical inputs return the identical cached allocation.
        let (CachedTessellation::Curve(a), CachedTessellation::Curve(b)) = (&first, &second)
        else {
            panic!("expected curve tessellations");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn update_invalidates_by_version() {
        let mut store = GeometryStore::new();
        let mut cache = TessellationCache::new();
        let id = curve_record(&mut store);
        let params = TessellationParams::default();

        tessellate_record(&store, &mut cache, id, &params, None).unwrap();
        store
            .update(
                id,
                Geometry::Polyline(
                    Polyline::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)], false)
                        .unwrap(),
                ),
            )
            .unwrap();
        tessellate_record(&store, &mut cache, id, &params, None).unwrap();
        // Old version entry remains until invalidated, new version added.
        assert_eq!(cache.len(), 2);

        cache.invalidate(id);
        assert!(cache.is_empty());
    }

    #[test]
    fn zoom_within_bucket_reuses_entry() {
        let mut store = GeometryStore::new();
        let mut cache = TessellationCache::new();
        let id = curve_record(&mut store);

        let a = TessellationParams {
            world_per_pixel: 0.010,
            ..TessellationParams::default()
        };
        let b = TessellationParams {
            world_per_pixel: 0.011,
            ..TessellationParams::default()
        };
        assert_eq!(a.zoom_bucket(), b.zoom_bucket());

        tessellate_record(&store, &mut cache, id, &a, None).unwrap();
        tessellate_record(&store, &mut cache, id, &b, None).unwrap();
        assert_eq!(cache.len(), 1);

        let far = TessellationParams {
            world_per_pixel: 0.1,
            ..TessellationParams::default()
        };
        tessellate_record(&store, &mut cache, id, &far, None).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn vertex_record_is_not_tessellated() {
        let mut store = GeometryStore::new();
        let mut cache = TessellationCache::new();
        let id = store.add(Geometry::Vertex(Point3::origin()));
        let result =
            tessellate_record(&store, &mut cache, id, &TessellationParams::default(), None);
        assert!(result.is_err());
    }
}
