//! Frame rendering over the global scene.

use umbra_render::Scene;

use crate::{
    render_error, with_context, with_context_mut, Camera, FrameReport, GraphicsDevice,
    OverallShadowPass, Result,
};

/// Renders the registered scene with stencil shadows.
///
/// The renderer is tied to one device: whether that device can count shadow
/// volumes is decided once, when the renderer is created.
#[derive(Debug, Clone)]
pub struct ShadowRenderer {
    pass: OverallShadowPass,
}

impl ShadowRenderer {
    /// Creates a renderer for `device` with the current global options.
    pub fn new<D: GraphicsDevice + ?Sized>(device: &D) -> Result<Self> {
        let options = with_context(|ctx| ctx.options.clone())?;
        Ok(Self {
            pass: OverallShadowPass::new(device, options),
        })
    }

    /// Whether shadows are rendered, or lights are applied unshadowed.
    #[must_use]
    pub fn shadows_enabled(&self) -> bool {
        self.pass.stencil_available()
    }

    /// Renders one frame of the scene as seen by `camera`.
    ///
    /// The selection pass runs last when `select` is set, and its pick table
    /// is returned in the report.
    pub fn render_frame<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        camera: &Camera,
        select: bool,
    ) -> Result<FrameReport> {
        with_context_mut(|ctx| {
            if &ctx.options != self.pass.options() {
                self.pass.set_options(ctx.options.clone());
            }
            let scene = Scene {
                registry: &ctx.registry,
                cache: &mut ctx.cache,
            };
            self.pass
                .render(device, scene, camera, select)
                .map_err(render_error)
        })?
    }
}
