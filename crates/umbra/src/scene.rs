//! Registration and mutation of scene structures and lights.
//!
//! Every mutation that can change a shadow volume also drops the matching
//! cache entries, so the next frame rebuilds exactly what went stale.

use crate::{
    with_context, with_context_mut, Light, LightId, Mat4, Result, StructureId, TriangleMesh,
    UmbraError, Vec3,
};

/// Registers a mesh. Its name must be unique.
pub fn register_mesh(mesh: TriangleMesh) -> Result<StructureId> {
    with_context_mut(|ctx| {
        let id = ctx.registry.register(Box::new(mesh))?;
        log::debug!("registered mesh {id}");
        Ok(id)
    })?
}

/// Registers a light under `name`.
pub fn register_light(name: impl Into<String>, light: Light) -> Result<LightId> {
    with_context_mut(|ctx| ctx.registry.register_light(name, light))
}

/// Looks up a structure by name.
pub fn structure_id(name: &str) -> Result<Option<StructureId>> {
    with_context(|ctx| ctx.registry.find(name))
}

/// Returns a copy of a registered light.
pub fn get_light(id: LightId) -> Result<Option<Light>> {
    with_context(|ctx| ctx.registry.light(id).map(|named| named.light))
}

/// Number of registered structures.
pub fn num_structures() -> Result<usize> {
    with_context(|ctx| ctx.registry.len())
}

/// Number of registered lights.
pub fn num_lights() -> Result<usize> {
    with_context(|ctx| ctx.registry.num_lights())
}

/// Removes a structure and its cached edge set and volumes.
pub fn remove_structure(id: StructureId) -> Result<()> {
    with_context_mut(|ctx| {
        ctx.registry
            .remove(id)
            .ok_or_else(|| UmbraError::StructureNotFound(id.to_string()))?;
        ctx.cache.invalidate_occluder(id);
        Ok(())
    })?
}

/// Removes a light and every volume it cast.
pub fn remove_light(id: LightId) -> Result<()> {
    with_context_mut(|ctx| {
        ctx.registry
            .remove_light(id)
            .ok_or_else(|| UmbraError::LightNotFound(id.to_string()))?;
        ctx.cache.invalidate_light(id);
        Ok(())
    })?
}

/// Removes every structure and light.
pub fn remove_all() -> Result<()> {
    with_context_mut(|ctx| {
        ctx.registry.clear();
        ctx.cache.clear();
    })
}

/// Moves a structure. Its edge set survives, its volumes do not.
pub fn set_structure_transform(id: StructureId, transform: Mat4) -> Result<()> {
    with_context_mut(|ctx| {
        let structure = ctx
            .registry
            .get_mut(id)
            .ok_or_else(|| UmbraError::StructureNotFound(id.to_string()))?;
        structure.set_transform(transform);
        ctx.cache.invalidate_transform(id);
        Ok(())
    })?
}

/// Replaces the triangle soup of a mesh.
pub fn set_structure_triangles(id: StructureId, points: Vec<Vec3>) -> Result<()> {
    with_mesh(id, |mesh| mesh.set_triangles(points))?
}

/// Shows or hides a structure. Hidden structures neither draw nor cast.
pub fn set_structure_enabled(id: StructureId, enabled: bool) -> Result<()> {
    with_context_mut(|ctx| {
        let structure = ctx
            .registry
            .get_mut(id)
            .ok_or_else(|| UmbraError::StructureNotFound(id.to_string()))?;
        structure.set_enabled(enabled);
        Ok(())
    })?
}

/// Switches shadow casting of a mesh on or off.
pub fn set_casts_shadows(id: StructureId, casts_shadows: bool) -> Result<()> {
    with_mesh(id, |mesh| mesh.set_casts_shadows(casts_shadows))
}

/// Moves a light. Every volume it cast is dropped.
pub fn set_light_transform(id: LightId, transform: Mat4) -> Result<()> {
    update_light(id, |light| light.transform = transform)
}

/// Edits a light in place. Every volume it cast is dropped.
pub fn update_light(id: LightId, f: impl FnOnce(&mut Light)) -> Result<()> {
    with_context_mut(|ctx| {
        let named = ctx
            .registry
            .light_mut(id)
            .ok_or_else(|| UmbraError::LightNotFound(id.to_string()))?;
        f(&mut named.light);
        ctx.cache.invalidate_light(id);
        Ok(())
    })?
}

/// Runs `f` on a registered [`TriangleMesh`], then refreshes its occluder
/// status and drops its cached edge set.
fn with_mesh<R>(id: StructureId, f: impl FnOnce(&mut TriangleMesh) -> R) -> Result<R> {
    with_context_mut(|ctx| {
        let structure = ctx
            .registry
            .get_mut(id)
            .ok_or_else(|| UmbraError::StructureNotFound(id.to_string()))?;
        let mesh = structure
            .as_any_mut()
            .downcast_mut::<TriangleMesh>()
            .ok_or_else(|| UmbraError::Other(format!("structure {id} is not a TriangleMesh")))?;
        let result = f(mesh);
        ctx.registry.refresh_occluder(id);
        ctx.cache.invalidate_occluder(id);
        Ok(result)
    })?
}
