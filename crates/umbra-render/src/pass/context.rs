//! Immutable per-step pass configuration.

use std::fmt;

use glam::Mat4;
use umbra_core::{Light, LightId, ShadowDebugOptions, Structure};

use crate::camera::Frustum;
use crate::state::Lighting;

/// One step of a shadow frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Opaque geometry with ambient lighting. Fills the depth buffer.
    AmbientOpaque,
    /// Transparent geometry with ambient lighting.
    AmbientTransparent,
    /// Shadow volumes of one light into the stencil buffer.
    LightStencil,
    /// Opaque geometry lit by one light where the stencil is zero.
    LightOpaque,
    /// Transparent geometry lit by one light where the stencil is zero.
    LightTransparent,
    /// Pick colors.
    Select,
}

impl Step {
    /// Name used in logs and errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Step::AmbientOpaque => "ambient-opaque",
            Step::AmbientTransparent => "ambient-transparent",
            Step::LightStencil => "light-stencil",
            Step::LightOpaque => "light-opaque",
            Step::LightTransparent => "light-transparent",
            Step::Select => "select",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The light a per-light step runs for.
#[derive(Debug, Clone, Copy)]
pub struct ActiveLight<'a> {
    /// Handle of the light.
    pub id: LightId,
    /// Name of the light.
    pub name: &'a str,
    /// The light.
    pub light: &'a Light,
}

/// Configuration of one step, built fresh for every step.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// The step being run.
    pub step: Step,
    /// Shading of surface draws.
    pub lighting: Lighting,
    /// Light of a per-light step.
    pub light: Option<ActiveLight<'a>>,
    /// Whether lit draws are masked to stencil == 0.
    pub stencil: bool,
    /// Use wrapping stencil arithmetic.
    pub stencil_wrap: bool,
    /// Frustum used to skip invisible structures, if culling.
    pub frustum: Option<Frustum>,
    /// Camera view matrix.
    pub view: Mat4,
    /// Debug sub-renders.
    pub debug: ShadowDebugOptions,
    /// Whether to trace the step in the log.
    pub trace: bool,
}

impl PassContext<'_> {
    /// Whether `structure` may be visible.
    #[must_use]
    pub fn is_visible(&self, structure: &dyn Structure) -> bool {
        match (self.frustum, structure.bounding_box()) {
            (Some(frustum), Some((min, max))) => frustum.intersects_box(min, max),
            _ => true,
        }
    }

    /// View-space depth of a structure's origin.
    #[must_use]
    pub fn view_depth(&self, structure: &dyn Structure) -> f32 {
        let origin = structure.transform().w_axis.truncate();
        -self.view.transform_point3(origin).z
    }

    /// Logs the start of the step when tracing.
    pub fn trace_start(&self) {
        if self.trace {
            match self.light {
                Some(light) => log::debug!("{} for light '{}' ({})", self.step, light.name, light.id),
                None => log::debug!("{}", self.step),
            }
        }
    }
}
