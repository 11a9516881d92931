//! The frame-level shadow pass.

use umbra_core::{ShadowOptions, Winding};

use super::ambient::{active_lights, ambient_color, ambient_opaque, ambient_transparent};
use super::light_opaque::light_opaque;
use super::light_stencil::light_stencil;
use super::light_transparent::light_transparent;
use super::{select_pass, PassContext, Scene, Step};
use crate::camera::Camera;
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::pick::PickTable;
use crate::state::{CompareFunction, DirectLight, Lighting, StencilOperation};

/// A node skipped during one step of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    /// Name of the structure.
    pub node: String,
    /// Step it failed in.
    pub step: Step,
}

/// What happened during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Number of lights that contributed.
    pub active_lights: usize,
    /// Whether lights were applied without shadows.
    pub stencil_fallback: bool,
    /// Non-empty shadow volumes drawn, summed over lights.
    pub volumes_drawn: usize,
    /// Nodes skipped because a step failed for them.
    pub failures: Vec<NodeFailure>,
    /// Pick colors of the selection pass, if it ran.
    pub pick_table: Option<PickTable>,
}

impl FrameReport {
    /// Number of nodes skipped during `step`.
    #[must_use]
    pub fn skipped(&self, step: Step) -> usize {
        self.failures.iter().filter(|f| f.step == step).count()
    }
}

/// Drives the ambient, per-light and selection steps of a frame.
#[derive(Debug, Clone)]
pub struct OverallShadowPass {
    options: ShadowOptions,
    stencil_available: bool,
}

impl OverallShadowPass {
    /// Creates the pass for `device`.
    ///
    /// Whether the device has enough stencil bits is decided here, once. A
    /// device without them gets lights applied unshadowed for the lifetime
    /// of the pass.
    pub fn new<D: GraphicsDevice + ?Sized>(device: &D, options: ShadowOptions) -> Self {
        let available = device.stencil_bits();
        let stencil_available = available >= options.required_stencil_bits;
        if !stencil_available {
            log::warn!(
                "stencil buffer has {available} bits, {} required; rendering without shadows",
                options.required_stencil_bits
            );
        }
        Self {
            options,
            stencil_available,
        }
    }

    /// Whether shadows are rendered.
    #[must_use]
    pub fn stencil_available(&self) -> bool {
        self.stencil_available
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &ShadowOptions {
        &self.options
    }

    /// Replaces the options. The stencil decision made at construction is
    /// kept.
    pub fn set_options(&mut self, options: ShadowOptions) {
        self.options = options;
    }

    /// Renders one frame. Runs the selection pass last when `select` is set.
    ///
    /// A node that fails in some step is logged and skipped for that step.
    /// Errors from state changes outside of any node abort the frame.
    pub fn render<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        mut scene: Scene<'_>,
        camera: &Camera,
        select: bool,
    ) -> RenderResult<FrameReport> {
        let registry = scene.registry;
        let mut report = FrameReport {
            stencil_fallback: !self.stencil_available,
            ..FrameReport::default()
        };

        let view = camera.view_matrix();
        device.set_view_projection(view, camera.projection_matrix())?;
        reset(device)?;

        let base = PassContext {
            step: Step::AmbientOpaque,
            lighting: Lighting::Unlit,
            light: None,
            stencil: false,
            stencil_wrap: self.options.stencil_wrap,
            frustum: self.options.frustum_culling.then(|| camera.frustum()),
            view,
            debug: self.options.debug,
            trace: self.options.pass_debug,
        };

        let lights = active_lights(registry);
        report.active_lights = lights.len();

        let ambient = PassContext {
            lighting: Lighting::Ambient(ambient_color(&lights)),
            ..base
        };
        ambient_opaque(device, &ambient, registry, &mut report.failures)?;
        ambient_transparent(
            device,
            &PassContext {
                step: Step::AmbientTransparent,
                ..ambient
            },
            registry,
            &mut report.failures,
        )?;

        for active in &lights {
            let lit = PassContext {
                light: Some(*active),
                lighting: Lighting::Direct(DirectLight::from_light(active.light)),
                stencil: self.stencil_available,
                ..base
            };
            if self.stencil_available {
                let stencil = PassContext {
                    step: Step::LightStencil,
                    frustum: None,
                    ..lit
                };
                report.volumes_drawn +=
                    light_stencil(device, &stencil, &mut scene, &mut report.failures)?;
            }
            let opaque = PassContext {
                step: Step::LightOpaque,
                ..lit
            };
            light_opaque(device, &opaque, registry, &mut report.failures)?;
            let transparent = PassContext {
                step: Step::LightTransparent,
                ..lit
            };
            light_transparent(device, &transparent, registry, &mut report.failures)?;
        }

        finish(device)?;

        if select {
            let ctx = PassContext {
                step: Step::Select,
                frustum: None,
                ..base
            };
            report.pick_table = Some(select_pass(device, &ctx, registry, &mut report.failures)?);
        }

        if self.options.pass_debug {
            log::debug!(
                "frame done: {} lights, {} volumes, {} skipped nodes",
                report.active_lights,
                report.volumes_drawn,
                report.failures.len()
            );
        }
        Ok(report)
    }
}

/// Puts the device into the state the ambient steps expect.
fn reset<D: GraphicsDevice + ?Sized>(device: &mut D) -> RenderResult<()> {
    device.set_stencil_func(CompareFunction::Always, 0, !0)?;
    device.set_stencil_op(
        StencilOperation::Keep,
        StencilOperation::Keep,
        StencilOperation::Keep,
    )?;
    device.set_stencil_write_mask(!0)?;
    device.set_stencil_test(false)?;
    device.set_blend(None)?;
    device.set_color_mask(true)?;
    device.set_depth_test(true)?;
    device.set_depth_func(CompareFunction::Less)?;
    device.set_depth_mask(true)?;
    device.set_cull_face(None)?;
    device.set_front_face(Winding::CounterClockwise)
}

/// Leaves the device fully writable after the per-light steps.
fn finish<D: GraphicsDevice + ?Sized>(device: &mut D) -> RenderResult<()> {
    device.set_stencil_test(false)?;
    device.set_blend(None)?;
    device.set_depth_mask(true)?;
    device.set_depth_func(CompareFunction::Less)?;
    device.set_color_mask(true)?;
    device.set_cull_face(None)
}
