//! Scene graph: camera plus a group holding the planet and its atmosphere.

use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};

use crate::camera::{DEFAULT_FAR, DEFAULT_FOV_DEG, DEFAULT_NEAR, INITIAL_POSITION, PerspectiveCamera};
use crate::geometry::SphereGeometry;
use crate::viewport::Viewport;

/// Atmosphere shell size relative to the planet.
pub const ATMOSPHERE_SCALE: f32 = 1.13;

/// Position, rotation about Y, and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation about the local Y axis, in radians.
    pub rotation_y: f32,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation_y: 0.0,
        scale: Vec3::ONE,
    };

    pub fn from_scale(scale: f32) -> Self {
        Self {
            scale: Vec3::splat(scale),
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_rotation_y(self.rotation_y),
            self.position,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Planet,
    Atmosphere,
}

#[derive(Debug, Clone)]
pub struct MeshNode {
    pub kind: MeshKind,
    pub transform: Transform,
    pub geometry: Rc<SphereGeometry>,
}

/// The globe group. Timeline transforms go on `group`; the planet spins on
/// its own transform so the atmosphere shell stays put.
#[derive(Debug, Clone)]
pub struct CelestialBody {
    pub group: Transform,
    pub planet: MeshNode,
    pub atmosphere: MeshNode,
}

impl CelestialBody {
    pub fn new(geometry: Rc<SphereGeometry>) -> Self {
        Self {
            group: Transform::IDENTITY,
            planet: MeshNode {
                kind: MeshKind::Planet,
                transform: Transform::IDENTITY,
                geometry: Rc::clone(&geometry),
            },
            atmosphere: MeshNode {
                kind: MeshKind::Atmosphere,
                transform: Transform::from_scale(ATMOSPHERE_SCALE),
                geometry,
            },
        }
    }

    pub fn mesh(&self, kind: MeshKind) -> &MeshNode {
        match kind {
            MeshKind::Planet => &self.planet,
            MeshKind::Atmosphere => &self.atmosphere,
        }
    }

    /// Model matrix of a mesh: group transform applied after the mesh's own.
    pub fn world_matrix(&self, kind: MeshKind) -> Mat4 {
        self.group.matrix() * self.mesh(kind).transform.matrix()
    }

    /// Effective per-axis scale of a mesh in world space.
    pub fn world_scale(&self, kind: MeshKind) -> Vec3 {
        self.group.scale * self.mesh(kind).transform.scale
    }
}

/// Everything the render loop draws.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub body: CelestialBody,
    viewport: Viewport,
}

impl Scene {
    /// Build the initial scene for a viewport.
    pub fn build(viewport: Viewport) -> Self {
        let mut camera =
            PerspectiveCamera::new(DEFAULT_FOV_DEG, viewport.aspect(), DEFAULT_NEAR, DEFAULT_FAR);
        camera.position = INITIAL_POSITION;

        let geometry = Rc::new(SphereGeometry::globe());
        tracing::debug!(
            vertices = geometry.vertices.len(),
            triangles = geometry.triangle_count(),
            "globe geometry built"
        );

        Self {
            camera,
            body: CelestialBody::new(geometry),
            viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Apply a new viewport to the scene and refresh the camera projection.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
        self.camera.update_projection_matrix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_scene_layout() {
        let scene = Scene::build(Viewport::new(1920, 1080, 1.0));
        assert_eq!(scene.camera.position, Vec3::new(0.0, 2.15, 4.5));
        assert_eq!(scene.camera.aspect(), 1920.0 / 1080.0);
        assert_eq!(scene.body.group, Transform::IDENTITY);
        assert_eq!(scene.body.planet.transform, Transform::IDENTITY);
        assert_eq!(
            scene.body.atmosphere.transform.scale,
            Vec3::splat(ATMOSPHERE_SCALE)
        );
    }

    #[test]
    fn test_meshes_share_geometry() {
        let scene = Scene::build(Viewport::default());
        assert!(Rc::ptr_eq(
            &scene.body.planet.geometry,
            &scene.body.atmosphere.geometry
        ));
        assert_eq!(scene.body.planet.geometry.radius, 2.0);
    }

    #[test]
    fn test_group_scale_preserves_atmosphere_ratio() {
        let mut scene = Scene::build(Viewport::default());
        for s in [1.0, 0.85, 0.913, 0.5] {
            scene.body.group.scale = Vec3::splat(s);
            let planet = scene.body.world_scale(MeshKind::Planet);
            let atmosphere = scene.body.world_scale(MeshKind::Atmosphere);
            assert_eq!(atmosphere, planet * ATMOSPHERE_SCALE);
        }
    }

    #[test]
    fn test_planet_rotation_does_not_spin_atmosphere() {
        let mut scene = Scene::build(Viewport::default());
        let before = scene.body.world_matrix(MeshKind::Atmosphere);
        scene.body.planet.transform.rotation_y = 1.3;
        assert_eq!(scene.body.world_matrix(MeshKind::Atmosphere), before);
        assert_ne!(
            scene.body.world_matrix(MeshKind::Planet),
            Transform::IDENTITY.matrix()
        );
    }

    #[test]
    fn test_world_matrix_applies_group_translation() {
        let mut scene = Scene::build(Viewport::default());
        scene.body.group.position = Vec3::new(0.0, 6.0, 0.0);
        let center = scene
            .body
            .world_matrix(MeshKind::Planet)
            .transform_point3(Vec3::ZERO);
        assert!((center - Vec3::new(0.0, 6.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_set_viewport_updates_projection() {
        let mut scene = Scene::build(Viewport::new(800, 600, 1.0));
        let before = scene.camera.projection_matrix();
        scene.set_viewport(Viewport::new(600, 800, 2.0));
        assert_eq!(scene.camera.aspect(), 600.0 / 800.0);
        assert_ne!(scene.camera.projection_matrix(), before);
        assert_eq!(scene.viewport().pixel_ratio(), 2.0);
    }
}
