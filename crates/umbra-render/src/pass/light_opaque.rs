//! Per-light opaque step.

use umbra_core::Registry;

use super::{draw_structure, guard_node, visible, NodeFailure, PassContext};
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::state::{BlendMode, CompareFunction, StencilOperation};

/// Adds the context's light to opaque surfaces wherever the stencil is zero.
///
/// Depth is tested for equality against the ambient pass and never written.
pub fn light_opaque<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    registry: &Registry,
    failures: &mut Vec<NodeFailure>,
) -> RenderResult<()> {
    ctx.trace_start();
    device.set_color_mask(true)?;
    device.set_depth_mask(false)?;
    device.set_depth_func(CompareFunction::Equal)?;
    apply_lit_state(device, ctx)?;
    for (_, structure) in visible(ctx, registry, false) {
        guard_node(ctx, structure, failures, || draw_structure(device, structure));
    }
    Ok(())
}

/// Stencil masking, additive blending and the light's shading shared by the
/// lit steps.
pub(crate) fn apply_lit_state<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
) -> RenderResult<()> {
    if ctx.stencil {
        device.set_stencil_test(true)?;
        device.set_stencil_func(CompareFunction::Equal, 0, !0)?;
        device.set_stencil_op(
            StencilOperation::Keep,
            StencilOperation::Keep,
            StencilOperation::Keep,
        )?;
    } else {
        device.set_stencil_test(false)?;
    }
    device.set_blend(Some(BlendMode::Additive))?;
    device.set_lighting(ctx.lighting)
}
