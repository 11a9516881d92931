//! Perspective projection with the far plane at infinity.
//!
//! Shadow volumes extend to infinity, so the camera projection must never
//! clip them against a far plane. Vertices with `w = 0` project onto the
//! far plane itself instead of being discarded.

use glam::{Mat4, Vec3, Vec4};

/// Clip-space depth convention of the target API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthRange {
    /// OpenGL convention, NDC depth in `[-1, 1]`.
    NegOneToOne,
    /// wgpu / Vulkan / D3D convention, NDC depth in `[0, 1]`.
    #[default]
    ZeroToOne,
}

/// Creates a right-handed perspective matrix with the far plane at infinity.
///
/// `fov_y` is the full vertical field of view in radians.
#[must_use]
pub fn infinite_perspective(fov_y: f32, aspect: f32, near: f32, range: DepthRange) -> Mat4 {
    tweaked_infinite_perspective(fov_y, aspect, near, range, 0.0)
}

/// Infinite perspective that maps points at infinity to `1 - epsilon` in NDC
/// depth.
///
/// A small `epsilon` (around `2.4e-7` for 24-bit depth) keeps vertices with
/// `w = 0` from landing exactly on the far plane, where rounding may clip them.
#[must_use]
pub fn tweaked_infinite_perspective(
    fov_y: f32,
    aspect: f32,
    near: f32,
    range: DepthRange,
    epsilon: f32,
) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y).tan();
    let (zz, zw) = match range {
        DepthRange::NegOneToOne => (epsilon - 1.0, (epsilon - 2.0) * near),
        DepthRange::ZeroToOne => (epsilon - 1.0, (epsilon - 1.0) * near),
    };
    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, zz, -1.0),
        Vec4::new(0.0, 0.0, zw, 0.0),
    )
}

/// Divides a homogeneous point by its `w`.
///
/// Returns `None` for points at infinity.
#[must_use]
pub fn perspective_divide(point: Vec4) -> Option<Vec3> {
    if point.w == 0.0 {
        None
    } else {
        Some(point.truncate() / point.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn ndc_depth(proj: Mat4, point: Vec4) -> f32 {
        let clip = proj * point;
        clip.z / clip.w
    }

    #[test]
    fn test_near_plane_depth() {
        let gl = infinite_perspective(FRAC_PI_2, 1.0, 0.5, DepthRange::NegOneToOne);
        assert!((ndc_depth(gl, Vec4::new(0.0, 0.0, -0.5, 1.0)) + 1.0).abs() < 1e-5);

        let wgpu = infinite_perspective(FRAC_PI_2, 1.0, 0.5, DepthRange::ZeroToOne);
        assert!(ndc_depth(wgpu, Vec4::new(0.0, 0.0, -0.5, 1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_point_at_infinity_on_far_plane() {
        for range in [DepthRange::NegOneToOne, DepthRange::ZeroToOne] {
            let proj = infinite_perspective(1.0, 1.5, 0.1, range);
            let depth = ndc_depth(proj, Vec4::new(0.3, -0.2, -1.0, 0.0));
            assert!((depth - 1.0).abs() < 1e-6, "{range:?}: {depth}");
        }
    }

    #[test]
    fn test_tweaked_stays_inside() {
        let proj =
            tweaked_infinite_perspective(1.0, 1.0, 0.1, DepthRange::NegOneToOne, 1.0e-3);
        let depth = ndc_depth(proj, Vec4::new(0.0, 0.0, -1.0, 0.0));
        assert!(depth < 1.0);
        assert!((depth - (1.0 - 1.0e-3)).abs() < 1e-6);
    }

    #[test]
    fn test_matches_glam_zero_to_one() {
        let ours = infinite_perspective(0.8, 1.25, 0.05, DepthRange::ZeroToOne);
        let glam = Mat4::perspective_infinite_rh(0.8, 1.25, 0.05);
        assert!(ours.abs_diff_eq(glam, 1e-6));
    }

    #[test]
    fn test_distant_points_approach_far_plane() {
        let proj = infinite_perspective(1.0, 1.0, 0.1, DepthRange::NegOneToOne);
        let near = ndc_depth(proj, Vec4::new(0.0, 0.0, -10.0, 1.0));
        let far = ndc_depth(proj, Vec4::new(0.0, 0.0, -1.0e5, 1.0));
        assert!(near < far);
        assert!(far < 1.0);
    }

    #[test]
    fn test_perspective_divide() {
        assert_eq!(
            perspective_divide(Vec4::new(2.0, 4.0, 6.0, 2.0)),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(perspective_divide(Vec4::new(1.0, 0.0, 0.0, 0.0)), None);
    }
}
