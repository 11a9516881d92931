//! Per-light stencil step.
//!
//! Draws every occluder's shadow volume twice, incrementing the stencil on
//! front faces and decrementing on back faces. Afterwards a pixel is in
//! shadow exactly when its stencil value is nonzero.

use glam::Vec3;
use umbra_core::{ShadowOccluder, Volume, Winding};

use super::{guard_node, NodeFailure, PassContext, Scene};
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::state::{BlendMode, CompareFunction, Face, Lighting, StencilOperation};
use crate::volume_render::{render_silhouette, submit_part, volume_parts, VolumePart};

/// Renders the shadow volumes of the context's light into the stencil
/// buffer. Returns the number of non-empty volumes drawn.
///
/// Occluders are never frustum culled: a shadow can fall into view from
/// geometry outside of it.
pub fn light_stencil<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    scene: &mut Scene<'_>,
    failures: &mut Vec<NodeFailure>,
) -> RenderResult<usize> {
    let Some(active) = ctx.light else {
        return Ok(0);
    };
    ctx.trace_start();

    device.set_depth_mask(false)?;
    device.set_depth_test(true)?;
    device.set_depth_func(CompareFunction::Less)?;
    device.set_color_mask(ctx.debug.show_volume)?;
    if ctx.debug.show_volume {
        device.set_blend(Some(BlendMode::Additive))?;
        device.set_lighting(Lighting::Unlit)?;
    }
    device.clear_stencil(0)?;
    device.set_stencil_test(true)?;
    device.set_stencil_func(CompareFunction::Always, 0, !0)?;
    device.set_stencil_write_mask(if ctx.debug.no_stencil { 0 } else { !0 })?;

    let registry = scene.registry;
    let mut drawn = 0;
    for &id in registry.occluders() {
        let Some(structure) = registry.get(id) else {
            continue;
        };
        if !structure.is_enabled() {
            continue;
        }
        let Some(occluder) = structure.as_occluder() else {
            continue;
        };
        let cache = &mut *scene.cache;
        guard_node(ctx, structure, failures, || {
            let model = structure.transform();
            let volume = cache.volume(id, occluder, active.id, active.light, model)?;
            if volume.is_empty() {
                return Ok(());
            }
            drawn += 1;
            device.set_model_transform(model)?;
            draw_two_sided(device, ctx, &volume, occluder)
        });
    }

    device.set_stencil_write_mask(!0)?;
    device.set_cull_face(None)?;
    if ctx.debug.show_volume {
        device.set_blend(None)?;
    }
    Ok(drawn)
}

fn draw_two_sided<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    volume: &Volume,
    occluder: &dyn ShadowOccluder,
) -> RenderResult<()> {
    let flipped = volume.winding() == Winding::Clockwise;
    if flipped {
        device.set_front_face(Winding::Clockwise)?;
    }
    let result = submit_counting_passes(device, ctx, volume, occluder);
    if flipped {
        device.set_front_face(Winding::CounterClockwise)?;
    }
    result
}

/// One counting pass: the faces it keeps and the stencil op applied where
/// they pass the depth test.
#[derive(Debug, Clone, Copy)]
struct CountingPass {
    cull: Face,
    op: StencilOperation,
}

fn counting_passes(ctx: &PassContext<'_>) -> Vec<CountingPass> {
    let (increment, decrement) = if ctx.stencil_wrap {
        (StencilOperation::IncrementWrap, StencilOperation::DecrementWrap)
    } else {
        (StencilOperation::IncrementClamp, StencilOperation::DecrementClamp)
    };
    let mut passes = Vec::with_capacity(2);
    if !ctx.debug.no_front_faces {
        passes.push(CountingPass {
            cull: Face::Back,
            op: increment,
        });
    }
    if !ctx.debug.no_back_faces {
        passes.push(CountingPass {
            cull: Face::Front,
            op: decrement,
        });
    }
    passes
}

fn opposite(op: StencilOperation) -> StencilOperation {
    match op {
        StencilOperation::IncrementClamp => StencilOperation::DecrementClamp,
        StencilOperation::DecrementClamp => StencilOperation::IncrementClamp,
        StencilOperation::IncrementWrap => StencilOperation::DecrementWrap,
        StencilOperation::DecrementWrap => StencilOperation::IncrementWrap,
        other => other,
    }
}

fn submit_counting_passes<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    ctx: &PassContext<'_>,
    volume: &Volume,
    occluder: &dyn ShadowOccluder,
) -> RenderResult<()> {
    let points = occluder.triangles();
    let parts = volume_parts(volume, &ctx.debug);
    let passes = counting_passes(ctx);

    // A node that fails partway must leave no count behind, so the draws
    // that did land are replayed with the opposite op.
    let mut submitted = 0;
    if let Err(err) = count(device, points, &parts, &passes, &mut submitted) {
        undo_counts(device, points, &parts, &passes, submitted);
        return Err(err);
    }

    if ctx.debug.show_silhouette {
        device.set_stencil_op(StencilOperation::Keep, StencilOperation::Keep, StencilOperation::Keep)?;
        device.set_cull_face(None)?;
        render_silhouette(device, volume)?;
    }
    Ok(())
}

fn set_counting_state<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    cull: Face,
    op: StencilOperation,
) -> RenderResult<()> {
    device.set_stencil_op(StencilOperation::Keep, StencilOperation::Keep, op)?;
    device.set_cull_face(Some(cull))
}

/// Runs every pass over every part, counting the draws that succeed.
fn count<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    points: &[Vec3],
    parts: &[VolumePart<'_>],
    passes: &[CountingPass],
    submitted: &mut usize,
) -> RenderResult<()> {
    for pass in passes {
        set_counting_state(device, pass.cull, pass.op)?;
        for &part in parts {
            submit_part(device, points, part)?;
            *submitted += 1;
        }
    }
    Ok(())
}

/// Replays the first `submitted` draws of [`count`] with opposite ops.
///
/// Clamped counts come back exactly unless a pixel saturated.
fn undo_counts<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    points: &[Vec3],
    parts: &[VolumePart<'_>],
    passes: &[CountingPass],
    mut submitted: usize,
) {
    for pass in passes {
        if submitted == 0 {
            break;
        }
        let replay = submitted.min(parts.len());
        submitted -= replay;
        let result = set_counting_state(device, pass.cull, opposite(pass.op)).and_then(|()| {
            parts[..replay]
                .iter()
                .try_for_each(|&part| submit_part(device, points, part))
        });
        if let Err(err) = result {
            log::warn!("could not undo stencil counts: {err}");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_reverses_counting_ops() {
        for op in [
            StencilOperation::IncrementClamp,
            StencilOperation::DecrementClamp,
            StencilOperation::IncrementWrap,
            StencilOperation::DecrementWrap,
        ] {
            assert_ne!(opposite(op), op);
            assert_eq!(opposite(opposite(op)), op);
        }
        assert_eq!(opposite(StencilOperation::Keep), StencilOperation::Keep);
    }
}
