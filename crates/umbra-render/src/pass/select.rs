//! Selection pass.

use umbra_core::Registry;

use super::{guard_node, NodeFailure, PassContext};
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::pick::PickTable;
use crate::state::{CompareFunction, Lighting};

/// Draws every enabled structure in its pick color and returns the table to
/// decode read-back pixels with.
///
/// Runs after the shadow steps, from the clean state they leave behind.
pub fn select_pass<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    registry: &Registry,
    failures: &mut Vec<NodeFailure>,
) -> RenderResult<PickTable> {
    ctx.trace_start();
    device.set_depth_func(CompareFunction::LessEqual)?;
    device.set_lighting(Lighting::Unlit)?;

    let mut table = PickTable::new();
    for (id, structure) in registry.iter().filter(|(_, s)| s.is_enabled()) {
        let Some(color) = table.assign(id) else {
            log::warn!("out of pick colors, {id} and later structures are not pickable");
            break;
        };
        guard_node(ctx, structure, failures, || {
            device.set_model_transform(structure.transform())?;
            device.draw_pick(&structure.surface(), color)
        });
    }

    device.set_depth_func(CompareFunction::Less)?;
    Ok(table)
}
