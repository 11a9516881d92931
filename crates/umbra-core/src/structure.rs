//! Structure and occluder traits.
//!
//! A [`Structure`] is anything the passes can draw. Structures that can cast
//! shadows additionally expose the [`ShadowOccluder`] capability; the registry
//! asks for it once, at registration time.

use std::any::Any;

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Triangle vertex order that counts as front facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Winding {
    /// Counter-clockwise, the OpenGL default.
    #[default]
    CounterClockwise,
    /// Clockwise.
    Clockwise,
}

impl Winding {
    /// Returns the unnormalized face normal of triangle `(a, b, c)`.
    #[must_use]
    pub fn face_normal(self, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        match self {
            Winding::CounterClockwise => (b - a).cross(c - a),
            Winding::Clockwise => (c - a).cross(b - a),
        }
    }
}

/// Capability of geometry that can cast shadows.
///
/// Implementors hand out a flat triangle soup: every consecutive triple of
/// points is one triangle in [`ShadowOccluder::winding`] order.
pub trait ShadowOccluder {
    /// The triangle soup, `len() % 3 == 0`.
    fn triangles(&self) -> &[Vec3];

    /// Front-face winding of the triangle soup.
    fn winding(&self) -> Winding;

    /// Counter bumped on every change to the triangles or winding.
    ///
    /// Cached edge sets built from an older generation are stale.
    fn geometry_generation(&self) -> u64;
}

/// Borrowed surface data handed to the graphics device.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceData<'a> {
    /// Triangle soup positions in object space.
    pub positions: &'a [Vec3],
    /// One normal per position.
    pub normals: &'a [Vec3],
    /// Base color, alpha below one marks the surface as transparent.
    pub color: Vec4,
    /// Winding of `positions`.
    pub winding: Winding,
}

/// A drawable object in the scene.
pub trait Structure: Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the unique name of this structure.
    fn name(&self) -> &str;

    /// Returns the type name of this structure (e.g., "`TriangleMesh`").
    fn type_name(&self) -> &'static str;

    /// Returns the axis-aligned bounding box in world coordinates.
    ///
    /// Returns `None` if the structure has no spatial extent.
    fn bounding_box(&self) -> Option<(Vec3, Vec3)>;

    /// Returns the current model transform matrix.
    fn transform(&self) -> Mat4;

    /// Sets the model transform matrix.
    fn set_transform(&mut self, transform: Mat4);

    /// Returns whether this structure is currently visible.
    fn is_enabled(&self) -> bool;

    /// Sets the visibility of this structure.
    fn set_enabled(&mut self, enabled: bool);

    /// Whether this structure belongs in the transparent passes.
    fn is_transparent(&self) -> bool;

    /// The geometry to draw.
    fn surface(&self) -> SurfaceData<'_>;

    /// The shadow-casting capability, if this structure has one.
    fn as_occluder(&self) -> Option<&dyn ShadowOccluder> {
        None
    }
}
