//! Camera and view management.
//!
//! Shadow volumes reach infinity, so the camera always projects with the far
//! plane at infinity.

use glam::{Mat4, Vec3, Vec4};
use umbra_core::{tweaked_infinite_perspective, DepthRange};

/// A 3D camera for viewing the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Clip-space depth convention of the device.
    pub depth_range: DepthRange,
    /// Depth slack that keeps points at infinity inside the clip volume.
    pub depth_epsilon: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio,
            near: 0.01,
            depth_range: DepthRange::ZeroToOne,
            depth_epsilon: 2.4e-7,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the infinite projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        tweaked_infinite_perspective(
            self.fov,
            self.aspect_ratio,
            self.near,
            self.depth_range,
            self.depth_epsilon,
        )
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Distance from the eye along the view direction.
    #[must_use]
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.view_matrix().transform_point3(point).z
    }

    /// Resets the camera to look at the given bounding box.
    pub fn look_at_box(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let size = (max - min).length().max(f32::EPSILON);

        self.target = center;
        self.position = center + Vec3::new(0.0, 0.0, size * 1.5);
        self.near = size * 0.001;
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }

    /// Sets the near clipping plane.
    pub fn set_near(&mut self, near: f32) {
        self.near = near.max(0.001);
    }

    /// The view frustum, without a far plane.
    #[must_use]
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(self.view_projection_matrix(), self.depth_range)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

/// Side planes and near plane of a view frustum. Points with a non-negative
/// distance to every plane are inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 5],
}

impl Frustum {
    /// Extracts the planes from a view-projection matrix.
    #[must_use]
    pub fn from_view_projection(m: Mat4, depth_range: DepthRange) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];
        let near = match depth_range {
            DepthRange::ZeroToOne => rows[2],
            DepthRange::NegOneToOne => rows[3] + rows[2],
        };
        Self {
            planes: [
                rows[3] + rows[0],
                rows[3] - rows[0],
                rows[3] + rows[1],
                rows[3] - rows[1],
                near,
            ],
        }
    }

    /// Whether the axis-aligned box may be visible.
    #[must_use]
    pub fn intersects_box(&self, min: Vec3, max: Vec3) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let farthest = Vec3::select(normal.cmpge(Vec3::ZERO), max, min);
            plane.dot(farthest.extend(1.0)) >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.depth_range, DepthRange::ZeroToOne);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_has_no_far_plane() {
        let camera = Camera::new(1.0);
        let clip = camera.view_projection_matrix() * Vec4::new(0.0, 0.0, -1.0, 0.0);
        // A direction straight ahead projects inside the depth range.
        assert!(clip.w > 0.0);
        assert!(clip.z / clip.w <= 1.0);
    }

    #[test]
    fn test_set_fov_clamping() {
        let mut camera = Camera::new(1.0);
        camera.set_fov(0.0);
        assert!(camera.fov >= 0.1);

        camera.set_fov(std::f32::consts::PI);
        assert!(camera.fov < std::f32::consts::PI);
    }

    #[test]
    fn test_view_depth() {
        let camera = Camera::new(1.0);
        assert!((camera.view_depth(Vec3::ZERO) - 3.0).abs() < 1e-5);
        assert!(camera.view_depth(Vec3::new(0.0, 0.0, -5.0)) > camera.view_depth(Vec3::ZERO));
    }

    #[test]
    fn test_frustum_culls_boxes() {
        let camera = Camera::new(1.0);
        let frustum = camera.frustum();
        assert!(frustum.intersects_box(Vec3::splat(-0.5), Vec3::splat(0.5)));
        // Far away but straight ahead: still visible with no far plane.
        assert!(frustum.intersects_box(Vec3::new(-1.0, -1.0, -1.0e5), Vec3::new(1.0, 1.0, -1.0e5 + 1.0)));
        // Behind the camera.
        assert!(!frustum.intersects_box(Vec3::new(-0.5, -0.5, 10.0), Vec3::new(0.5, 0.5, 11.0)));
        // Far off to the side.
        assert!(!frustum.intersects_box(Vec3::new(50.0, -0.5, -0.5), Vec3::new(51.0, 0.5, 0.5)));
    }

    #[test]
    fn test_look_at_box() {
        let mut camera = Camera::new(1.0);
        camera.look_at_box(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(camera.target, Vec3::splat(2.0));
        assert!(camera.frustum().intersects_box(Vec3::ONE, Vec3::splat(3.0)));
    }

    proptest! {
        #[test]
        fn prop_points_at_infinity_stay_in_depth_range(
            dx in -0.35f32..0.35,
            dy in -0.35f32..0.35,
        ) {
            let camera = Camera::new(1.0);
            let clip = camera.view_projection_matrix() * Vec4::new(dx, dy, -1.0, 0.0);
            prop_assert!(clip.w > 0.0);
            let depth = clip.z / clip.w;
            prop_assert!((0.0..=1.0).contains(&depth));
        }

        #[test]
        fn prop_depth_grows_with_distance(distance in 0.5f32..1.0e4) {
            let camera = Camera::new(1.0);
            let m = camera.view_projection_matrix();
            let depth = |d: f32| {
                let clip = m * Vec4::new(0.0, 0.0, 3.0 - d, 1.0);
                clip.z / clip.w
            };
            prop_assert!(depth(distance) <= depth(distance * 2.0));
            prop_assert!(depth(distance * 2.0) <= 1.0);
        }
    }
}
