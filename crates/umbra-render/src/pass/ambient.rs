//! Ambient sub-passes.
//!
//! The only steps that write depth. They also discover which lights take
//! part in the frame.

use glam::Vec3;
use umbra_core::Registry;

use super::{draw_structure, guard_node, visible, visible_back_to_front, ActiveLight, NodeFailure, PassContext};
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::state::BlendMode;

/// Lights that are switched on, in registry order.
#[must_use]
pub fn active_lights(registry: &Registry) -> Vec<ActiveLight<'_>> {
    registry
        .lights()
        .filter(|(_, named)| named.light.on)
        .map(|(id, named)| ActiveLight {
            id,
            name: &named.name,
            light: &named.light,
        })
        .collect()
}

/// Summed ambient contribution of the active lights.
#[must_use]
pub fn ambient_color(lights: &[ActiveLight<'_>]) -> Vec3 {
    lights
        .iter()
        .map(|active| active.light.color * active.light.ambient_intensity)
        .sum()
}

/// Draws opaque structures with ambient lighting, writing depth.
pub fn ambient_opaque<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    registry: &Registry,
    failures: &mut Vec<NodeFailure>,
) -> RenderResult<()> {
    ctx.trace_start();
    device.set_lighting(ctx.lighting)?;
    for (_, structure) in visible(ctx, registry, false) {
        guard_node(ctx, structure, failures, || draw_structure(device, structure));
    }
    Ok(())
}

/// Draws transparent structures back to front with ambient lighting.
pub fn ambient_transparent<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    registry: &Registry,
    failures: &mut Vec<NodeFailure>,
) -> RenderResult<()> {
    ctx.trace_start();
    device.set_lighting(ctx.lighting)?;
    device.set_blend(Some(BlendMode::Alpha))?;
    device.set_depth_mask(false)?;
    for (_, structure) in visible_back_to_front(ctx, registry) {
        guard_node(ctx, structure, failures, || draw_structure(device, structure));
    }
    device.set_depth_mask(true)?;
    device.set_blend(None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use umbra_core::Light;

    use super::*;

    #[test]
    fn test_active_lights_skip_switched_off() {
        let mut registry = Registry::new();
        let mut off = Light::point(Vec3::Y);
        off.on = false;
        registry.register_light("off", off);
        let mut dim = Light::directional(Vec3::NEG_Y);
        dim.ambient_intensity = 0.25;
        registry.register_light("sun", dim);

        let lights = active_lights(&registry);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].name, "sun");
        assert_eq!(ambient_color(&lights), Vec3::splat(0.25));
    }
}
