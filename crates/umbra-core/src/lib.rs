//! Core abstractions for umbra.
//!
//! This crate holds everything about stencil shadow volumes that does not
//! touch a graphics device:
//! - [`EdgeSet`]: silhouette-edge structure of a triangle soup
//! - [`Volume`]: per-light extrusion of an edge set into a shadow volume
//! - [`ShadowCache`]: explicit edge-set and volume caches keyed by handle
//! - [`Registry`] of structures and lights, plus the global [`Context`]
//! - infinite-perspective projection helpers

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Accessors return Copy data which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Exact comparisons of light vectors are the cache key
#![allow(clippy::float_cmp)]

pub mod cache;
pub mod edge_set;
pub mod error;
pub mod light;
pub mod mesh;
pub mod options;
pub mod perspective;
pub mod registry;
pub mod state;
pub mod structure;
pub mod volume;

pub use cache::{CacheStats, ShadowCache};
pub use edge_set::{BoundaryEdge, EdgeSet, InteriorEdge};
pub use error::{Result, UmbraError};
pub use light::{Light, LightKind};
pub use mesh::{cube, TriangleMesh};
pub use options::{ShadowDebugOptions, ShadowOptions};
pub use perspective::{
    infinite_perspective, perspective_divide, tweaked_infinite_perspective, DepthRange,
};
pub use registry::{LightId, NamedLight, Registry, StructureId};
pub use state::{init_context, is_initialized, shutdown_context, with_context, with_context_mut, Context};
pub use structure::{ShadowOccluder, Structure, SurfaceData, Winding};
pub use volume::{extrude, SideKind, Volume};

// Re-export glam types for convenience
pub use glam::{Mat4, UVec3, Vec2, Vec3, Vec4};
