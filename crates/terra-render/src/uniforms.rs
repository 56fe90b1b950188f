//! GPU uniform blocks. Layouts match the structs declared in the WGSL programs.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use terra_scene::{LightingParams, PerspectiveCamera};

/// Camera block shared by every program (group 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = world position, w unused.
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            position: camera.position.extend(1.0).to_array(),
        }
    }
}

/// Per-mesh block (group 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// x = opacity.
    pub params: [f32; 4],
}

impl ModelUniform {
    pub fn new(model: Mat4, opacity: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            params: [opacity, 0.0, 0.0, 0.0],
        }
    }
}

/// Sun and atmosphere tints (group 2, binding 0). One buffer feeds both
/// materials so the sun direction can never diverge between them.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    pub sun_direction: [f32; 4],
    pub atmosphere_day_color: [f32; 4],
    pub atmosphere_twilight_color: [f32; 4],
}

impl LightingUniform {
    pub fn from_params(params: &LightingParams) -> Self {
        let rgb = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];
        Self {
            sun_direction: params.sun_direction.extend(0.0).to_array(),
            atmosphere_day_color: rgb(params.atmosphere_day_color.to_array()),
            atmosphere_twilight_color: rgb(params.atmosphere_twilight_color.to_array()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use terra_scene::{MeshKind, Scene, Viewport};

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 48);
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }

    #[test]
    fn test_camera_uniform_carries_position() {
        let scene = Scene::build(Viewport::new(1280, 720, 1.0));
        let uniform = CameraUniform::from_camera(&scene.camera);
        assert_eq!(uniform.position[..3], scene.camera.position.to_array());
        assert_eq!(
            uniform.view_proj,
            scene.camera.view_projection_matrix().to_cols_array_2d()
        );
    }

    #[test]
    fn test_model_uniform_uses_world_matrix() {
        let mut scene = Scene::build(Viewport::default());
        scene.body.planet.transform.rotation_y = 1.0;
        let world = scene.body.world_matrix(MeshKind::Planet);
        let uniform = ModelUniform::new(world, 0.5);
        assert_eq!(uniform.model, world.to_cols_array_2d());
        assert_eq!(uniform.params[0], 0.5);
    }

    #[test]
    fn test_lighting_uniform_direction_has_zero_w() {
        let params = LightingParams::default();
        let uniform = LightingUniform::from_params(&params);
        let dir = Vec3::from_slice(&uniform.sun_direction[..3]);
        assert!((dir - params.sun_direction).length() < 1e-6);
        assert_eq!(uniform.sun_direction[3], 0.0);
        assert_eq!(
            uniform.atmosphere_day_color[..3],
            params.atmosphere_day_color.to_array()
        );
    }
}
