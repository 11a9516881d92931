//! The graphics device boundary of the shadow passes.
//!
//! Passes only ever talk to a [`GraphicsDevice`]: they change fixed-function
//! state and submit primitive lists, and rely on the device to apply them in
//! the order issued.

use glam::{Mat4, Vec3, Vec4};
use umbra_core::{SurfaceData, Winding};

use crate::error::RenderResult;
use crate::state::{BlendMode, CompareFunction, Face, Lighting, Primitive, StencilOperation};

/// Ordered, immediate-mode graphics operations.
pub trait GraphicsDevice {
    /// Number of bits in the stencil buffer.
    fn stencil_bits(&self) -> u8;

    /// Enables or disables the stencil test.
    fn set_stencil_test(&mut self, enabled: bool) -> RenderResult<()>;

    /// Sets the stencil comparison, reference and read mask.
    fn set_stencil_func(
        &mut self,
        compare: CompareFunction,
        reference: u32,
        read_mask: u32,
    ) -> RenderResult<()>;

    /// Sets the stencil operations for test fail, depth fail and pass.
    fn set_stencil_op(
        &mut self,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) -> RenderResult<()>;

    /// Sets which stencil bits may be written.
    fn set_stencil_write_mask(&mut self, mask: u32) -> RenderResult<()>;

    /// Clears the whole stencil buffer to `value`.
    fn clear_stencil(&mut self, value: u32) -> RenderResult<()>;

    /// Enables or disables the depth test.
    fn set_depth_test(&mut self, enabled: bool) -> RenderResult<()>;

    /// Sets the depth comparison.
    fn set_depth_func(&mut self, compare: CompareFunction) -> RenderResult<()>;

    /// Enables or disables depth writes.
    fn set_depth_mask(&mut self, write: bool) -> RenderResult<()>;

    /// Selects the culled face, `None` to disable culling.
    fn set_cull_face(&mut self, face: Option<Face>) -> RenderResult<()>;

    /// Sets the winding of front faces.
    fn set_front_face(&mut self, winding: Winding) -> RenderResult<()>;

    /// Enables or disables color writes.
    fn set_color_mask(&mut self, write: bool) -> RenderResult<()>;

    /// Sets the blend equation, `None` to disable blending.
    fn set_blend(&mut self, blend: Option<BlendMode>) -> RenderResult<()>;

    /// Sets the shading of subsequent surface draws.
    fn set_lighting(&mut self, lighting: Lighting) -> RenderResult<()>;

    /// Sets the model transform of subsequent draws.
    fn set_model_transform(&mut self, model: Mat4) -> RenderResult<()>;

    /// Sets the camera matrices.
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) -> RenderResult<()>;

    /// Draws a shaded triangle soup.
    fn draw_surface(&mut self, surface: &SurfaceData<'_>) -> RenderResult<()>;

    /// Draws homogeneous vertices (points at infinity have `w = 0`) as a flat
    /// colored primitive list.
    fn draw_homogeneous(
        &mut self,
        points: &[Vec4],
        primitive: Primitive,
        color: Vec4,
    ) -> RenderResult<()>;

    /// Draws the triangles selected by `indices` from `points`.
    fn draw_indexed(&mut self, points: &[Vec3], indices: &[u32], color: Vec4)
        -> RenderResult<()>;

    /// Draws a surface in a flat pick color.
    fn draw_pick(&mut self, surface: &SurfaceData<'_>, color: [u8; 3]) -> RenderResult<()>;
}
