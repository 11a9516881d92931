//! Explicit shadow caches keyed by registry handles.
//!
//! One [`EdgeSet`] per occluder, rebuilt when the occluder's geometry
//! generation moves on. Each edge set in turn caches one [`Volume`] per light.
//! Nothing is evicted implicitly: the owner of the scene calls the
//! `invalidate_*` functions when meshes, lights or transforms change.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::edge_set::EdgeSet;
use crate::error::Result;
use crate::light::Light;
use crate::registry::{LightId, StructureId};
use crate::structure::ShadowOccluder;
use crate::volume::Volume;

/// Counters describing cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Edge sets built from occluder geometry.
    pub edge_set_builds: usize,
    /// Volumes requested through the cache.
    pub volume_requests: usize,
    /// Volumes that had to be (re)computed.
    pub volume_builds: usize,
}

#[derive(Debug)]
struct CachedEdgeSet {
    generation: u64,
    edge_set: EdgeSet,
}

/// Per-occluder edge sets and their per-light volumes.
#[derive(Debug, Default)]
pub struct ShadowCache {
    edge_sets: HashMap<StructureId, CachedEdgeSet>,
    stats: CacheStats,
}

impl ShadowCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the edge set of `occluder`, building it if missing or built
    /// from older geometry.
    pub fn edge_set(
        &mut self,
        id: StructureId,
        occluder: &dyn ShadowOccluder,
    ) -> Result<&mut EdgeSet> {
        let generation = occluder.geometry_generation();
        match self.edge_sets.entry(id) {
            Entry::Occupied(entry) if entry.get().generation == generation => {
                Ok(&mut entry.into_mut().edge_set)
            }
            entry => {
                let cached = CachedEdgeSet {
                    generation,
                    edge_set: EdgeSet::from_occluder(occluder)?,
                };
                self.stats.edge_set_builds += 1;
                log::debug!("built edge set for {id} (generation {generation})");
                let slot = match entry {
                    Entry::Occupied(mut entry) => {
                        entry.insert(cached);
                        entry.into_mut()
                    }
                    Entry::Vacant(entry) => entry.insert(cached),
                };
                Ok(&mut slot.edge_set)
            }
        }
    }

    /// Returns the volume `light` casts from `occluder`, placed in the world
    /// by `mesh_to_world`.
    pub fn volume(
        &mut self,
        id: StructureId,
        occluder: &dyn ShadowOccluder,
        light_id: LightId,
        light: &Light,
        mesh_to_world: Mat4,
    ) -> Result<Arc<Volume>> {
        let edge_set = self.edge_set(id, occluder)?;
        let builds = edge_set.volume_builds();
        let volume = edge_set.volume_for_light(light_id, light, mesh_to_world);
        let rebuilt = edge_set.volume_builds() != builds;

        self.stats.volume_requests += 1;
        if rebuilt {
            self.stats.volume_builds += 1;
        }
        Ok(volume)
    }

    /// Drops the edge set (and all volumes) of one occluder.
    pub fn invalidate_occluder(&mut self, id: StructureId) -> bool {
        self.edge_sets.remove(&id).is_some()
    }

    /// Drops the volumes one light casts from every occluder.
    pub fn invalidate_light(&mut self, light: LightId) {
        for cached in self.edge_sets.values_mut() {
            cached.edge_set.forget_light(light);
        }
    }

    /// Drops the volumes of one occluder after its transform changed, keeping
    /// its edge set.
    pub fn invalidate_transform(&mut self, id: StructureId) {
        if let Some(cached) = self.edge_sets.get_mut(&id) {
            cached.edge_set.forget_volumes();
        }
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.edge_sets.clear();
    }

    /// Whether an edge set is cached for `id`.
    pub fn contains(&self, id: StructureId) -> bool {
        self.edge_sets.contains_key(&id)
    }

    /// Number of cached edge sets.
    pub fn len(&self) -> usize {
        self.edge_sets.len()
    }

    /// Whether no edge set is cached.
    pub fn is_empty(&self) -> bool {
        self.edge_sets.is_empty()
    }

    /// Activity counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::mesh::{cube, TriangleMesh};
    use crate::registry::Registry;
    use crate::structure::Structure;

    fn setup() -> (Registry, StructureId, LightId) {
        let (vertices, faces) = cube(Vec3::splat(-0.5), Vec3::splat(0.5));
        let mesh = TriangleMesh::from_indexed("box", &vertices, &faces).unwrap();
        let mut registry = Registry::new();
        let id = registry.register(Box::new(mesh)).unwrap();
        let light = registry.register_light("sun", Light::point(Vec3::new(0.0, 5.0, 0.0)));
        (registry, id, light)
    }

    fn volume(
        cache: &mut ShadowCache,
        registry: &Registry,
        id: StructureId,
        light: LightId,
    ) -> Arc<Volume> {
        let structure = registry.get(id).unwrap();
        let occluder = structure.as_occluder().unwrap();
        let light_ref = &registry.light(light).unwrap().light;
        cache
            .volume(id, occluder, light, light_ref, structure.transform())
            .unwrap()
    }

    #[test]
    fn test_volume_reused_across_frames() {
        let (registry, id, light) = setup();
        let mut cache = ShadowCache::new();
        let a = volume(&mut cache, &registry, id, light);
        let b = volume(&mut cache, &registry, id, light);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            cache.stats(),
            CacheStats {
                edge_set_builds: 1,
                volume_requests: 2,
                volume_builds: 1,
            }
        );
    }

    #[test]
    fn test_geometry_change_rebuilds_edge_set() {
        let (mut registry, id, light) = setup();
        let mut cache = ShadowCache::new();
        volume(&mut cache, &registry, id, light);

        let mesh = registry
            .get_mut(id)
            .unwrap()
            .as_any_mut()
            .downcast_mut::<TriangleMesh>()
            .unwrap();
        mesh.set_triangles(vec![Vec3::ZERO, Vec3::X, Vec3::Z]).unwrap();

        let rebuilt = volume(&mut cache, &registry, id, light);
        assert_eq!(cache.stats().edge_set_builds, 2);
        assert_eq!(rebuilt.num_cap_triangles(), 0);
    }

    #[test]
    fn test_transform_change_moves_light_into_mesh_frame() {
        let (mut registry, id, light) = setup();
        let mut cache = ShadowCache::new();
        let before = volume(&mut cache, &registry, id, light);

        registry
            .get_mut(id)
            .unwrap()
            .set_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        cache.invalidate_transform(id);

        let after = volume(&mut cache, &registry, id, light);
        assert!(!Arc::ptr_eq(&before, &after));
        assert!((after.source_vector().x + 1.0).abs() < 1e-6);
        assert_eq!(cache.stats().edge_set_builds, 1);
    }

    #[test]
    fn test_invalidate_light_and_occluder() {
        let (registry, id, light) = setup();
        let mut cache = ShadowCache::new();
        volume(&mut cache, &registry, id, light);

        cache.invalidate_light(light);
        volume(&mut cache, &registry, id, light);
        assert_eq!(cache.stats().volume_builds, 2);

        assert!(cache.invalidate_occluder(id));
        assert!(!cache.contains(id));
        assert!(cache.is_empty());
    }
}
