//! Per-light transparent step.

use umbra_core::Registry;

use super::light_opaque::apply_lit_state;
use super::{draw_structure, guard_node, visible_back_to_front, NodeFailure, PassContext};
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::state::CompareFunction;

/// Adds the context's light to transparent surfaces wherever the stencil is
/// zero, back to front.
pub fn light_transparent<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    registry: &Registry,
    failures: &mut Vec<NodeFailure>,
) -> RenderResult<()> {
    ctx.trace_start();
    device.set_depth_func(CompareFunction::LessEqual)?;
    apply_lit_state(device, ctx)?;
    for (_, structure) in visible_back_to_front(ctx, registry) {
        guard_node(ctx, structure, failures, || draw_structure(device, structure));
    }
    Ok(())
}
