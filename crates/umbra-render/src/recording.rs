//! A graphics device that records every operation instead of drawing.
//!
//! Used to drive the shadow passes without a GPU and to check the exact
//! state sequence they issue.

use glam::{Mat4, Vec3, Vec4};
use umbra_core::{SurfaceData, Winding};

use crate::device::GraphicsDevice;
use crate::error::{RenderError, RenderResult};
use crate::state::{
    BlendMode, CompareFunction, Face, Lighting, PipelineState, Primitive, StencilOperation,
};

/// Kind of a recorded draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// A shaded surface.
    Surface,
    /// Homogeneous shadow-volume geometry.
    Homogeneous(Primitive),
    /// Indexed triangles, the cap of a volume.
    Indexed,
    /// A surface in a pick color.
    Pick([u8; 3]),
}

/// A recorded draw with the state it ran under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    /// What was drawn.
    pub kind: DrawKind,
    /// Number of vertices (or indices) submitted.
    pub vertices: usize,
    /// Fixed-function state at the time of the draw.
    pub state: PipelineState,
    /// Shading at the time of the draw.
    pub lighting: Lighting,
    /// Model transform at the time of the draw.
    pub model: Mat4,
    /// Flat color, if the draw has one.
    pub color: Option<Vec4>,
}

/// One recorded device operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `set_stencil_test`.
    StencilTest(bool),
    /// `set_stencil_func`.
    StencilFunc(CompareFunction, u32, u32),
    /// `set_stencil_op`.
    StencilOp(StencilOperation, StencilOperation, StencilOperation),
    /// `set_stencil_write_mask`.
    StencilWriteMask(u32),
    /// `clear_stencil`.
    ClearStencil(u32),
    /// `set_depth_test`.
    DepthTest(bool),
    /// `set_depth_func`.
    DepthFunc(CompareFunction),
    /// `set_depth_mask`.
    DepthMask(bool),
    /// `set_cull_face`.
    CullFace(Option<Face>),
    /// `set_front_face`.
    FrontFace(Winding),
    /// `set_color_mask`.
    ColorMask(bool),
    /// `set_blend`.
    Blend(Option<BlendMode>),
    /// `set_lighting`.
    Lighting(Lighting),
    /// `set_model_transform`.
    Model(Mat4),
    /// `set_view_projection`.
    ViewProjection(Mat4, Mat4),
    /// Any draw call.
    Draw(Draw),
}

/// Device that records commands and tracks pipeline state.
#[derive(Debug)]
pub struct RecordingDevice {
    stencil_bits: u8,
    state: PipelineState,
    lighting: Lighting,
    model: Mat4,
    commands: Vec<Command>,
    failure: Option<DrawFailure>,
}

/// Injected draw failure under one model transform.
#[derive(Debug, Clone, Copy)]
struct DrawFailure {
    model: Mat4,
    /// Only the draw with this index under `model` fails; `None` fails all.
    nth: Option<usize>,
    seen: usize,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new(8)
    }
}

impl RecordingDevice {
    /// Creates a device with `stencil_bits` bits of stencil.
    #[must_use]
    pub fn new(stencil_bits: u8) -> Self {
        Self {
            stencil_bits,
            state: PipelineState::default(),
            lighting: Lighting::Unlit,
            model: Mat4::IDENTITY,
            commands: Vec::new(),
            failure: None,
        }
    }

    /// Makes every draw issued under `model` fail.
    pub fn fail_draws_with_model(&mut self, model: Mat4) {
        self.failure = Some(DrawFailure {
            model,
            nth: None,
            seen: 0,
        });
    }

    /// Makes only the `nth` draw (counting from zero) issued under `model`
    /// fail.
    pub fn fail_nth_draw_with_model(&mut self, model: Mat4, nth: usize) {
        self.failure = Some(DrawFailure {
            model,
            nth: Some(nth),
            seen: 0,
        });
    }

    /// Current pipeline state.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Every command recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The draw commands recorded so far.
    pub fn draws(&self) -> impl Iterator<Item = &Draw> {
        self.commands.iter().filter_map(|command| match command {
            Command::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    /// Forgets the recorded commands, keeping the current state.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn record(&mut self, command: Command) -> RenderResult<()> {
        self.commands.push(command);
        Ok(())
    }

    fn draw(&mut self, kind: DrawKind, vertices: usize, color: Option<Vec4>) -> RenderResult<()> {
        if let Some(failure) = self.failure.as_mut().filter(|f| f.model == self.model) {
            let index = failure.seen;
            failure.seen += 1;
            if failure.nth.map_or(true, |nth| nth == index) {
                return Err(RenderError::DrawFailed(format!("{kind:?} rejected")));
            }
        }
        let draw = Draw {
            kind,
            vertices,
            state: self.state,
            lighting: self.lighting,
            model: self.model,
            color,
        };
        self.record(Command::Draw(draw))
    }
}

impl GraphicsDevice for RecordingDevice {
    fn stencil_bits(&self) -> u8 {
        self.stencil_bits
    }

    fn set_stencil_test(&mut self, enabled: bool) -> RenderResult<()> {
        self.state.stencil.enabled = enabled;
        self.record(Command::StencilTest(enabled))
    }

    fn set_stencil_func(
        &mut self,
        compare: CompareFunction,
        reference: u32,
        read_mask: u32,
    ) -> RenderResult<()> {
        self.state.stencil.compare = compare;
        self.state.stencil.reference = reference;
        self.state.stencil.read_mask = read_mask;
        self.record(Command::StencilFunc(compare, reference, read_mask))
    }

    fn set_stencil_op(
        &mut self,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) -> RenderResult<()> {
        self.state.stencil.fail_op = fail;
        self.state.stencil.depth_fail_op = depth_fail;
        self.state.stencil.pass_op = pass;
        self.record(Command::StencilOp(fail, depth_fail, pass))
    }

    fn set_stencil_write_mask(&mut self, mask: u32) -> RenderResult<()> {
        self.state.stencil.write_mask = mask;
        self.record(Command::StencilWriteMask(mask))
    }

    fn clear_stencil(&mut self, value: u32) -> RenderResult<()> {
        self.record(Command::ClearStencil(value))
    }

    fn set_depth_test(&mut self, enabled: bool) -> RenderResult<()> {
        self.state.depth_test = enabled;
        self.record(Command::DepthTest(enabled))
    }

    fn set_depth_func(&mut self, compare: CompareFunction) -> RenderResult<()> {
        self.state.depth_compare = compare;
        self.record(Command::DepthFunc(compare))
    }

    fn set_depth_mask(&mut self, write: bool) -> RenderResult<()> {
        self.state.depth_write = write;
        self.record(Command::DepthMask(write))
    }

    fn set_cull_face(&mut self, face: Option<Face>) -> RenderResult<()> {
        self.state.cull = face;
        self.record(Command::CullFace(face))
    }

    fn set_front_face(&mut self, winding: Winding) -> RenderResult<()> {
        self.state.front_face = winding;
        self.record(Command::FrontFace(winding))
    }

    fn set_color_mask(&mut self, write: bool) -> RenderResult<()> {
        self.state.color_write = write;
        self.record(Command::ColorMask(write))
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) -> RenderResult<()> {
        self.state.blend = blend;
        self.record(Command::Blend(blend))
    }

    fn set_lighting(&mut self, lighting: Lighting) -> RenderResult<()> {
        self.lighting = lighting;
        self.record(Command::Lighting(lighting))
    }

    fn set_model_transform(&mut self, model: Mat4) -> RenderResult<()> {
        self.model = model;
        self.record(Command::Model(model))
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) -> RenderResult<()> {
        self.record(Command::ViewProjection(view, projection))
    }

    fn draw_surface(&mut self, surface: &SurfaceData<'_>) -> RenderResult<()> {
        self.draw(DrawKind::Surface, surface.positions.len(), Some(surface.color))
    }

    fn draw_homogeneous(
        &mut self,
        points: &[Vec4],
        primitive: Primitive,
        color: Vec4,
    ) -> RenderResult<()> {
        self.draw(DrawKind::Homogeneous(primitive), points.len(), Some(color))
    }

    fn draw_indexed(
        &mut self,
        _points: &[Vec3],
        indices: &[u32],
        color: Vec4,
    ) -> RenderResult<()> {
        self.draw(DrawKind::Indexed, indices.len(), Some(color))
    }

    fn draw_pick(&mut self, surface: &SurfaceData<'_>, color: [u8; 3]) -> RenderResult<()> {
        self.draw(DrawKind::Pick(color), surface.positions.len(), None)
    }
}
