//! The shadow pass state machine and its sub-passes.
//!
//! [`OverallShadowPass`] drives one frame: an ambient pass that fills the
//! depth buffer, then for every active light a stencil step followed by the
//! lit opaque and lit transparent steps, then an optional selection pass.

pub mod ambient;
pub mod context;
pub mod light_opaque;
pub mod light_stencil;
pub mod light_transparent;
pub mod overall;
pub mod select;

pub use context::{ActiveLight, PassContext, Step};
pub use overall::{FrameReport, NodeFailure, OverallShadowPass};
pub use select::select_pass;

use umbra_core::{Registry, ShadowCache, Structure, StructureId};

use crate::device::GraphicsDevice;
use crate::error::{RenderError, RenderResult};

/// Scene data a frame reads from, plus the caches it may fill.
pub struct Scene<'a> {
    /// Structures and lights.
    pub registry: &'a Registry,
    /// Edge sets and volumes.
    pub cache: &'a mut ShadowCache,
}

/// Runs `draw` for one node, turning a failure into a logged, reported skip.
pub(crate) fn guard_node(
    ctx: &PassContext<'_>,
    structure: &dyn Structure,
    failures: &mut Vec<NodeFailure>,
    draw: impl FnOnce() -> RenderResult<()>,
) {
    if let Err(source) = draw() {
        let err = RenderError::NodeFailed {
            node: structure.name().to_string(),
            step: ctx.step.name(),
            source: Box::new(source),
        };
        log::error!("{err}");
        failures.push(NodeFailure {
            node: structure.name().to_string(),
            step: ctx.step,
        });
    }
}

/// Draws one structure as a shaded surface.
pub(crate) fn draw_structure<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    structure: &dyn Structure,
) -> RenderResult<()> {
    device.set_model_transform(structure.transform())?;
    device.draw_surface(&structure.surface())
}

/// Enabled structures of one opacity that survive frustum culling, in
/// registry order.
pub(crate) fn visible<'r>(
    ctx: &PassContext<'_>,
    registry: &'r Registry,
    transparent: bool,
) -> Vec<(StructureId, &'r dyn Structure)> {
    registry
        .iter()
        .filter(|(_, s)| s.is_enabled() && s.is_transparent() == transparent)
        .filter(|(_, s)| ctx.is_visible(*s))
        .collect()
}

/// Like [`visible`] for transparent structures, sorted back to front.
pub(crate) fn visible_back_to_front<'r>(
    ctx: &PassContext<'_>,
    registry: &'r Registry,
) -> Vec<(StructureId, &'r dyn Structure)> {
    let mut nodes: Vec<_> = visible(ctx, registry, true)
        .into_iter()
        .map(|(id, s)| (ctx.view_depth(s), id, s))
        .collect();
    nodes.sort_by(|a, b| b.0.total_cmp(&a.0));
    nodes.into_iter().map(|(_, id, s)| (id, s)).collect()
}
