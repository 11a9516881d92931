//! Fixed-function pipeline state tracked by the graphics devices.

use glam::{Vec3, Vec4};
use umbra_core::{Light, LightKind, Winding};

/// Comparison used by the depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the stored one.
    #[default]
    Less,
    /// Passes on equality.
    Equal,
    /// Passes if less than or equal.
    LessEqual,
    /// Passes if greater.
    Greater,
    /// Passes on inequality.
    NotEqual,
    /// Passes if greater than or equal.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// What to do with the stored stencil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the stored value.
    #[default]
    Keep,
    /// Write zero.
    Zero,
    /// Write the reference value.
    Replace,
    /// Bitwise invert.
    Invert,
    /// Increment, saturating at the maximum.
    IncrementClamp,
    /// Decrement, saturating at zero.
    DecrementClamp,
    /// Increment, wrapping to zero.
    IncrementWrap,
    /// Decrement, wrapping to the maximum.
    DecrementWrap,
}

/// Face selector for culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Front faces.
    Front,
    /// Back faces.
    Back,
}

/// Blend equation applied to color writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src + dst`, used to accumulate one light at a time.
    Additive,
    /// Standard `src * a + dst * (1 - a)`.
    Alpha,
}

/// Primitive assembled from a flat vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Three vertices per triangle.
    Triangles,
    /// Four vertices per quad.
    Quads,
    /// Two vertices per line segment.
    Lines,
}

impl Primitive {
    /// Vertices consumed per primitive.
    #[must_use]
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Primitive::Triangles => 3,
            Primitive::Quads => 4,
            Primitive::Lines => 2,
        }
    }
}

impl From<umbra_core::SideKind> for Primitive {
    fn from(kind: umbra_core::SideKind) -> Self {
        match kind {
            umbra_core::SideKind::Quads => Primitive::Quads,
            umbra_core::SideKind::Triangles => Primitive::Triangles,
        }
    }
}

/// Stencil test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// Whether the stencil test runs.
    pub enabled: bool,
    /// Comparison against `reference`.
    pub compare: CompareFunction,
    /// Reference value.
    pub reference: u32,
    /// Mask applied to both sides of the comparison.
    pub read_mask: u32,
    /// Bits that may be written.
    pub write_mask: u32,
    /// Operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Operation when the stencil test passes and the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Operation when both tests pass.
    pub pass_op: StencilOperation,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            enabled: false,
            compare: CompareFunction::Always,
            reference: 0,
            read_mask: !0,
            write_mask: !0,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
        }
    }
}

/// Complete fixed-function state that applies to a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Whether the depth test runs.
    pub depth_test: bool,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Whether depth is written.
    pub depth_write: bool,
    /// Culled face, if any.
    pub cull: Option<Face>,
    /// Winding of front faces.
    pub front_face: Winding,
    /// Whether color is written.
    pub color_write: bool,
    /// Blend equation, `None` to overwrite.
    pub blend: Option<BlendMode>,
    /// Stencil test.
    pub stencil: StencilState,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_compare: CompareFunction::Less,
            depth_write: true,
            cull: None,
            front_face: Winding::CounterClockwise,
            color_write: true,
            blend: None,
            stencil: StencilState::default(),
        }
    }
}

/// A light prepared for the shading of one lit pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLight {
    /// World-space homogeneous light vector.
    pub vector: Vec4,
    /// Light color scaled by intensity.
    pub color: Vec3,
    /// Cone axis for spot lights.
    pub spot_direction: Vec3,
    /// Cosine of the cone half-angle, `-1` for no cone.
    pub cos_cut_off: f32,
}

impl DirectLight {
    /// Prepares `light` for shading.
    #[must_use]
    pub fn from_light(light: &Light) -> Self {
        let (spot_direction, cos_cut_off) = match light.kind {
            LightKind::Spot {
                direction,
                cut_off_angle,
                ..
            } => (
                light.transform.transform_vector3(direction).normalize_or_zero(),
                cut_off_angle.cos(),
            ),
            _ => (Vec3::ZERO, -1.0),
        };
        Self {
            vector: light.world_vector(),
            color: light.color * light.intensity,
            spot_direction,
            cos_cut_off,
        }
    }
}

/// Shading applied to surface draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lighting {
    /// Flat surface color. Used for debug geometry and picking.
    Unlit,
    /// Ambient and emissive terms only, with the summed ambient color.
    Ambient(Vec3),
    /// Diffuse contribution of exactly one light.
    Direct(DirectLight),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_clean() {
        let state = PipelineState::default();
        assert!(state.depth_test && state.depth_write && state.color_write);
        assert_eq!(state.depth_compare, CompareFunction::Less);
        assert!(!state.stencil.enabled);
        assert!(state.blend.is_none());
        assert!(state.cull.is_none());
    }

    #[test]
    fn test_direct_light_from_spot() {
        let mut light = Light::spot(Vec3::ZERO, Vec3::NEG_Y, 0.5);
        light.intensity = 2.0;
        let direct = DirectLight::from_light(&light);
        assert_eq!(direct.color, Vec3::splat(2.0));
        assert_eq!(direct.spot_direction, Vec3::NEG_Y);
        assert!((direct.cos_cut_off - 0.5f32.cos()).abs() < 1e-6);

        let point = DirectLight::from_light(&Light::point(Vec3::ONE));
        assert_eq!(point.cos_cut_off, -1.0);
        assert_eq!(point.vector, Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_primitive_from_side_kind() {
        assert_eq!(Primitive::from(umbra_core::SideKind::Quads), Primitive::Quads);
        assert_eq!(Primitive::from(umbra_core::SideKind::Triangles).vertices_per_primitive(), 3);
    }
}
