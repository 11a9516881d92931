//! umbra: stencil shadow volumes for triangle-soup scenes.
//!
//! Register meshes and lights, then render frames through any
//! [`GraphicsDevice`]. Every mesh that casts shadows is turned into an
//! [`EdgeSet`] once, and into one shadow [`Volume`] per light, which is
//! counted into the stencil buffer with the two-sided z-pass technique before
//! the light is added to the lit pixels.
//!
//! # Quick Start
//!
//! ```no_run
//! use umbra::*;
//!
//! fn main() -> Result<()> {
//!     init()?;
//!
//!     let (vertices, faces) = cube(Vec3::splat(-0.5), Vec3::splat(0.5));
//!     register_mesh(TriangleMesh::from_indexed("box", &vertices, &faces)?)?;
//!     register_light("sun", Light::point(Vec3::new(2.0, 3.0, 1.0)))?;
//!
//!     let pixels = render_to_image(640, 480, &Camera::default())?;
//!     assert_eq!(pixels.len(), 640 * 480 * 4);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `umbra-core` holds the device-independent geometry: [`EdgeSet`],
//!   [`Volume`], the [`Registry`] and the explicit [`ShadowCache`].
//! - `umbra-render` holds the pass state machine ([`OverallShadowPass`]) and
//!   the [`GraphicsDevice`] backends.
//! - This crate keeps the scene in a global context and wires the two
//!   together.

mod headless;
mod init;
mod renderer;
mod scene;

pub use headless::{render_to_file, render_to_image, render_with_device};
pub use init::{init, is_initialized, options, set_options, shutdown};
pub use renderer::ShadowRenderer;
pub use scene::{
    get_light, num_lights, num_structures, register_light, register_mesh, remove_all,
    remove_light, remove_structure, set_casts_shadows, set_light_transform,
    set_structure_enabled, set_structure_transform, set_structure_triangles, structure_id,
    update_light,
};

pub use umbra_core::{
    cube, infinite_perspective, tweaked_infinite_perspective, with_context, with_context_mut,
    CacheStats, DepthRange, EdgeSet, Light, LightId, LightKind, Mat4, Result, ShadowDebugOptions,
    ShadowOptions, Structure, StructureId, TriangleMesh, UVec3, UmbraError, Vec2, Vec3, Vec4,
    Volume, Winding,
};

pub use umbra_render::{
    color_to_index, index_to_color, Camera, DrawKind, FrameReport, GraphicsDevice, NodeFailure,
    OverallShadowPass, PickTable, RecordingDevice, RenderError, Step, WgpuDevice,
};

/// The wgpu version [`WgpuDevice::from_device`] expects.
pub use wgpu;

/// Converts a render error into the facade's error type.
pub(crate) fn render_error(err: RenderError) -> UmbraError {
    UmbraError::RenderError(err.to_string())
}
