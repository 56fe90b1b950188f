//! Perspective camera with a cached reverse-Z projection.

use glam::{Mat4, Vec3};

/// Vertical field of view in degrees.
pub const DEFAULT_FOV_DEG: f32 = 15.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;
/// Camera rest position before any scroll.
pub const INITIAL_POSITION: Vec3 = Vec3::new(0.0, 2.15, 4.5);

/// A perspective camera with identity orientation, looking down -Z.
///
/// The projection matrix is cached and only refreshed by
/// [`update_projection_matrix`](Self::update_projection_matrix), so changing
/// `fov_deg`, `near`, `far`, or the aspect ratio has no effect on rendering
/// until that call.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            fov_deg,
            near,
            far,
            aspect,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Recompute the cached projection from the current parameters.
    pub fn update_projection_matrix(&mut self) {
        // Reverse-Z: near maps to depth 1, far to depth 0.
        self.projection =
            Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.far, self.near);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(-self.position)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        let mut camera = Self::new(DEFAULT_FOV_DEG, 16.0 / 9.0, DEFAULT_NEAR, DEFAULT_FAR);
        camera.position = INITIAL_POSITION;
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_default_camera_placement() {
        let camera = PerspectiveCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 2.15, 4.5));
        assert_eq!(camera.fov_deg, 15.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_projection_is_cached_until_update() {
        let mut camera = PerspectiveCamera::default();
        let before = camera.projection_matrix();
        camera.set_aspect(1.0);
        assert_eq!(camera.projection_matrix(), before);
        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let camera = PerspectiveCamera::new(15.0, 1.0, 0.1, 1000.0);
        let proj = camera.projection_matrix();

        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-4);
        assert!((far.z / far.w).abs() < 1e-4);
    }

    #[test]
    fn test_view_matrix_moves_world_opposite_camera() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vec3::new(0.0, 6.0, 18.0);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(eye.length() < 1e-6);
    }

    #[test]
    fn test_origin_is_in_front_of_camera() {
        let camera = PerspectiveCamera::default();
        let eye = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(eye.z < 0.0);
    }
}
