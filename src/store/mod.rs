use slotmap::SlotMap;

use crate::error::{Result, StoreError};
use crate::geometry::{Extrusion, Mesh, NurbsCurve, NurbsSurface, Polyline};
use crate::math::Point3;
use crate::topology::BRep;
use crate::voxel::VoxelGrid;

slotmap::new_key_type! {
    /// Unique identifier for a geometry record, stable for the record's
    /// lifetime (generational index, never reused while live).
    pub struct GeometryId;
}

/// The closed set of geometry variants held by the store.
///
/// Every consumer matches exhaustively; the variant set is fixed, so a
/// new variant is a deliberate, compiler-enforced change at every site.
#[derive(Debug, Clone)]
pub enum Geometry {
    /// A single 3D position.
    Vertex(Point3),
    /// An ordered point sequence with straight segments.
    Polyline(Polyline),
    /// A NURBS curve.
    Curve(NurbsCurve),
    /// A NURBS surface.
    Surface(NurbsSurface),
    /// A lazily evaluated sweep referencing profile and path records.
    Extrusion(Extrusion),
    /// A boundary-representation solid.
    BRep(BRep),
    /// A triangle mesh.
    Mesh(Mesh),
    /// A voxel grid.
    Voxels(VoxelGrid),
}

impl Geometry {
    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Vertex(_) => "vertex",
            Self::Polyline(_) => "polyline",
            Self::Curve(_) => "curve",
            Self::Surface(_) => "surface",
            Self::Extrusion(_) => "extrusion",
            Self::BRep(_) => "b-rep",
            Self::Mesh(_) => "mesh",
            Self::Voxels(_) => "voxels",
        }
    }

    /// Identifiers of other records this geometry references.
    #[must_use]
    pub fn references(&self) -> Vec<GeometryId> {
        match self {
            Self::Extrusion(e) => vec![e.profile, e.path],
            Self::BRep(brep) => brep.referenced_geometry(),
            _ => Vec::new(),
        }
    }
}

/// Display metadata carried alongside a record; opaque to the kernel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayMeta {
    /// Layer name, when assigned.
    pub layer: Option<String>,
    /// RGBA display color, when assigned.
    pub color: Option<[f32; 4]>,
}

/// A stored geometry record: the value, its version counter, and
/// optional display metadata.
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    /// The geometry value. Immutable; updating a record replaces it.
    pub geometry: Geometry,
    /// Bumped on every replacement; feeds tessellation cache keys.
    pub version: u64,
    /// Optional display metadata.
    pub display: Option<DisplayMeta>,
}

/// Identifier-keyed map of geometry records; the single source of truth.
///
/// Records are immutable values: "updating" replaces the whole record
/// under the same identifier and bumps its version counter, so external
/// history systems keep free access to prior snapshots and cached
/// tessellations invalidate exactly. Single-writer by contract; reads
/// take immutable snapshots.
#[derive(Debug, Default)]
pub struct GeometryStore {
    records: SlotMap<GeometryId, GeometryRecord>,
}

impl GeometryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a geometry value and returns its freshly minted identifier.
    pub fn add(&mut self, geometry: Geometry) -> GeometryId {
        self.records.insert(GeometryRecord {
            geometry,
            version: 0,
            display: None,
        })
    }

    /// Replaces the geometry under `id`, bumping the version counter.
    /// Display metadata is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the identifier is absent;
    /// the store is unchanged.
    pub fn update(&mut self, id: GeometryId, geometry: Geometry) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(StoreError::NotFound { id })?;
        record.geometry = geometry;
        record.version += 1;
        Ok(())
    }

    /// Removes the record under `id`, returning its geometry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an absent identifier, or
    /// [`StoreError::StillReferenced`] when another record (extrusion or
    /// B-Rep) still refers to `id`. On error the store is unchanged.
    pub fn remove(&mut self, id: GeometryId) -> Result<Geometry> {
        if !self.records.contains_key(id) {
            return Err(StoreError::NotFound { id }.into());
        }
        let count = self.referenced_by(id).len();
        if count > 0 {
            return Err(StoreError::StillReferenced { id, count }.into());
        }
        // contains_key checked above.
        self.records
            .remove(id)
            .map(|r| r.geometry)
            .ok_or_else(|| StoreError::NotFound { id }.into())
    }

    /// Returns the record under `id`, or `None` when absent.
    #[must_use]
    pub fn get(&self, id: GeometryId) -> Option<&GeometryRecord> {
        self.records.get(id)
    }

    /// Returns the record under `id`, or an error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the identifier is absent.
    pub fn record(&self, id: GeometryId) -> Result<&GeometryRecord> {
        self.records
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id }.into())
    }

    /// Sets display metadata without bumping the geometry version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the identifier is absent.
    pub fn set_display(&mut self, id: GeometryId, display: Option<DisplayMeta>) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(StoreError::NotFound { id })?;
        record.display = display;
        Ok(())
    }

    /// Returns whether a record exists under `id`.
    #[must_use]
    pub fn contains(&self, id: GeometryId) -> bool {
        self.records.contains_key(id)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over all records.
    pub fn iter(&self) -> impl Iterator<Item = (GeometryId, &GeometryRecord)> {
        self.records.iter()
    }

    /// Identifiers referenced by the record under `id`.
    #[must_use]
    pub fn references_of(&self, id: GeometryId) -> Vec<GeometryId> {
        self.records
            .get(id)
            .map(|r| r.geometry.references())
            .unwrap_or_default()
    }

    /// Identifiers of records that reference `id`.
    #[must_use]
    pub fn referenced_by(&self, id: GeometryId) -> Vec<GeometryId> {
        self.records
            .iter()
            .filter(|(other, record)| *other != id && record.geometry.references().contains(&id))
            .map(|(other, _)| other)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn segment() -> Geometry {
        Geometry::Polyline(
            Polyline::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)], false).unwrap(),
        )
    }

    #[test]
    fn add_then_get() {
        let mut store = GeometryStore::new();
        let id = store.add(Geometry::Vertex(Point3::new(1.0, 2.0, 3.0)));
        let record = store.get(id).unwrap();
        assert_eq!(record.version, 0);
        assert!(matches!(record.geometry, Geometry::Vertex(p) if p == Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn update_bumps_version_and_keeps_id() {
        let mut store = GeometryStore::new();
        let id = store.add(Geometry::Vertex(Point3::origin()));
        store
            .update(id, Geometry::Vertex(Point3::new(5.0, 0.0, 0.0)))
            .unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.version, 1);
        assert!(matches!(record.geometry, Geometry::Vertex(p) if p.x == 5.0));
    }

    #[test]
    fn update_absent_id_fails() {
        let mut store = GeometryStore::new();
        let id = store.add(segment());
        store.remove(id).unwrap();
        assert!(store.update(id, segment()).is_err());
    }

    #[test]
    fn remove_returns_geometry() {
        let mut store = GeometryStore::new();
        let id = store.add(segment());
        let geometry = store.remove(id).unwrap();
        assert_eq!(geometry.kind(), "polyline");
        assert!(!store.contains(id));
    }

    #[test]
    fn remove_referenced_profile_fails() {
        let mut store = GeometryStore::new();
        let profile = store.add(segment());
        let path = store.add(segment());
        let extrusion = store.add(Geometry::Extrusion(Extrusion::new(profile, path)));

        let err = store.remove(profile);
        assert!(err.is_err());
        // The store must be unchanged after a rejected removal.
        assert!(store.contains(profile));

        // Removing the extrusion first unblocks the profile.
        store.remove(extrusion).unwrap();
        store.remove(profile).unwrap();
    }

    #[test]
    fn referenced_by_lists_dependents() {
        let mut store = GeometryStore::new();
        let profile = store.add(segment());
        let path = store.add(segment());
        let extrusion = store.add(Geometry::Extrusion(Extrusion::new(profile, path)));

        assert_eq!(store.referenced_by(profile), vec![extrusion]);
        assert_eq!(store.references_of(extrusion), vec![profile, path]);
        assert!(store.referenced_by(extrusion).is_empty());
    }

    #[test]
    fn removed_id_stays_dead() {
        let mut store = GeometryStore::new();
        let id = store.add(segment());
        store.remove(id).unwrap();
        // A new insert must not resurrect the old identifier.
        let id2 = store.add(segment());
        assert_ne!(id, id2);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn display_meta_survives_update() {
        let mut store = GeometryStore::new();
        let id = store.add(segment());
        store
            .set_display(
                id,
                Some(DisplayMeta {
                    layer: Some("walls".to_owned()),
                    color: None,
                }),
            )
            .unwrap();
        store.update(id, segment()).unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.display.as_ref().unwrap().layer.as_deref(), Some("walls"));
        assert_eq!(record.version, 1);
    }
}
