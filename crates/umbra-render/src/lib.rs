//! Rendering backend for umbra.
//!
//! This crate drives stencil shadow volumes through a graphics device:
//! - [`OverallShadowPass`]: the per-frame pass state machine
//! - [`GraphicsDevice`], with a [`WgpuDevice`] and a [`RecordingDevice`]
//! - [`Camera`] with an infinite far plane
//! - pick color encoding for the select pass

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// GPU sizes and counts are u32 by API
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_excessive_bools)]

pub mod camera;
pub mod device;
pub mod error;
pub mod pass;
pub mod pick;
pub mod recording;
pub mod state;
pub mod volume_render;
pub mod wgpu_device;

pub use camera::{Camera, Frustum};
pub use device::GraphicsDevice;
pub use error::{RenderError, RenderResult};
pub use pass::overall::{FrameReport, NodeFailure, OverallShadowPass};
pub use pass::{Scene, Step};
pub use pick::{color_to_index, index_to_color, PickTable, MAX_PICK_INDEX};
pub use recording::{Command, Draw, DrawKind, RecordingDevice};
pub use state::{
    BlendMode, CompareFunction, DirectLight, Face, Lighting, PipelineState, Primitive,
    StencilOperation, StencilState,
};
pub use volume_render::{render_silhouette, render_volume};
pub use wgpu_device::WgpuDevice;
