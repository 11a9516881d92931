//! Light sources and homogeneous light vectors.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Geometric kind of a light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Omnidirectional light at a position.
    Point {
        /// Position in light-local coordinates.
        location: Vec3,
    },
    /// Light arriving from infinitely far away along `direction`.
    Directional {
        /// Direction the light travels in light-local coordinates.
        direction: Vec3,
    },
    /// Cone-limited point light. Casts shadows exactly like a point light.
    Spot {
        /// Position in light-local coordinates.
        location: Vec3,
        /// Cone axis in light-local coordinates.
        direction: Vec3,
        /// Half-angle of the cone in radians.
        cut_off_angle: f32,
    },
}

/// A light source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Geometry of the light.
    pub kind: LightKind,
    /// Light color.
    pub color: Vec3,
    /// Diffuse intensity.
    pub intensity: f32,
    /// Contribution to the ambient pass.
    pub ambient_intensity: f32,
    /// Whether the light is switched on.
    pub on: bool,
    /// Light-local to world transform.
    pub transform: Mat4,
}

impl Light {
    /// Creates a white point light.
    #[must_use]
    pub fn point(location: Vec3) -> Self {
        Self::with_kind(LightKind::Point { location })
    }

    /// Creates a white directional light travelling along `direction`.
    #[must_use]
    pub fn directional(direction: Vec3) -> Self {
        Self::with_kind(LightKind::Directional { direction })
    }

    /// Creates a white spot light.
    #[must_use]
    pub fn spot(location: Vec3, direction: Vec3, cut_off_angle: f32) -> Self {
        Self::with_kind(LightKind::Spot {
            location,
            direction,
            cut_off_angle,
        })
    }

    fn with_kind(kind: LightKind) -> Self {
        Self {
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
            ambient_intensity: 0.0,
            on: true,
            transform: Mat4::IDENTITY,
        }
    }

    /// Whether the light has a finite position.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        !matches!(self.kind, LightKind::Directional { .. })
    }

    /// The light in light-local homogeneous coordinates.
    ///
    /// Positional lights have `w = 1`. Directional lights have `w = 0` and
    /// `xyz` pointing back towards the light.
    #[must_use]
    pub fn local_vector(&self) -> Vec4 {
        match self.kind {
            LightKind::Point { location } | LightKind::Spot { location, .. } => {
                location.extend(1.0)
            }
            LightKind::Directional { direction } => (-direction).extend(0.0),
        }
    }

    /// The light in world coordinates.
    #[must_use]
    pub fn world_vector(&self) -> Vec4 {
        self.source_vector(Mat4::IDENTITY)
    }

    /// Projects the light into a mesh's local frame.
    ///
    /// `world_to_mesh` is the inverse of the mesh's model transform. The
    /// result has `w = 1` for positional lights and `w = 0` for directional
    /// ones regardless of the transforms.
    #[must_use]
    pub fn source_vector(&self, world_to_mesh: Mat4) -> Vec4 {
        let v = world_to_mesh * self.transform * self.local_vector();
        if self.is_positional() {
            let xyz = if v.w != 0.0 && v.w != 1.0 {
                v.truncate() / v.w
            } else {
                v.truncate()
            };
            xyz.extend(1.0)
        } else {
            v.truncate().extend(0.0)
        }
    }
}
