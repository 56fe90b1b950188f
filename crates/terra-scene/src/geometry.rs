//! UV sphere generation.
//!
//! Vertices are laid out in `height_segments + 1` latitude rings of
//! `width_segments + 1` vertices each, from the north pole down. The seam column
//! is duplicated so UVs wrap cleanly. Pole rings keep one vertex per column with
//! their U shifted half a segment so every pole triangle samples the middle of
//! its wedge, and the degenerate triangle of each pole quad is dropped.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Sphere radius shared by the planet and atmosphere meshes.
pub const GLOBE_RADIUS: f32 = 2.0;
/// Longitude and latitude subdivisions.
pub const GLOBE_SEGMENTS: u32 = 64;

/// Interleaved vertex uploaded as-is to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Texture coordinate with V running bottom-up (1 at the north pole).
    pub uv: [f32; 2],
}

/// Indexed triangle list for a sphere.
#[derive(Debug, Clone)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub vertices: Vec<GlobeVertex>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    /// Build a sphere. Segment counts are clamped to the minimum closed shape
    /// (3 around, 2 from pole to pole).
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let ring = (width_segments + 1) as usize;
        let mut vertices = Vec::with_capacity(ring * (height_segments + 1) as usize);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let u_offset = if iy == 0 {
                0.5 / width_segments as f32
            } else if iy == height_segments {
                -0.5 / width_segments as f32
            } else {
                0.0
            };

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let position = Vec3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                let normal = position.normalize_or_zero();
                vertices.push(GlobeVertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    uv: [u + u_offset, 1.0 - v],
                });
            }
        }

        let index = |ix: u32, iy: u32| iy * (width_segments + 1) + ix;
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = index(ix + 1, iy);
                let b = index(ix, iy);
                let c = index(ix, iy + 1);
                let d = index(ix + 1, iy + 1);

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            radius,
            width_segments,
            height_segments,
            vertices,
            indices,
        }
    }

    /// The 64x64 radius-2 sphere used by both globe shells.
    pub fn globe() -> Self {
        Self::new(GLOBE_RADIUS, GLOBE_SEGMENTS, GLOBE_SEGMENTS)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_index_counts() {
        let sphere = SphereGeometry::globe();
        assert_eq!(sphere.vertices.len(), 65 * 65);
        // Two triangles per quad, minus one per quad on each pole ring.
        assert_eq!(sphere.triangle_count(), 64 * 64 * 2 - 2 * 64);
    }

    #[test]
    fn test_vertices_lie_on_radius() {
        let sphere = SphereGeometry::new(2.0, 16, 8);
        for v in &sphere.vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 2.0).abs() < 1e-5, "vertex off sphere: {len}");
        }
    }

    #[test]
    fn test_normals_are_unit_and_outward() {
        let sphere = SphereGeometry::new(2.0, 16, 8);
        for v in &sphere.vertices {
            let n = Vec3::from_array(v.normal);
            let p = Vec3::from_array(v.position);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.dot(p) > 0.0);
        }
    }

    #[test]
    fn test_poles_and_uv_orientation() {
        let sphere = SphereGeometry::new(1.0, 8, 4);
        let north = sphere.vertices[0];
        let south = *sphere.vertices.last().unwrap();
        assert!((north.position[1] - 1.0).abs() < 1e-6);
        assert!((south.position[1] + 1.0).abs() < 1e-6);
        assert_eq!(north.uv[1], 1.0);
        assert_eq!(south.uv[1], 0.0);
    }

    #[test]
    fn test_indices_in_range() {
        let sphere = SphereGeometry::new(2.0, 12, 6);
        let count = sphere.vertices.len() as u32;
        assert!(sphere.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn test_triangles_wind_counter_clockwise_from_outside() {
        let sphere = SphereGeometry::new(2.0, 16, 8);
        for tri in sphere.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(sphere.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_segment_minimums() {
        let sphere = SphereGeometry::new(1.0, 0, 0);
        assert_eq!(sphere.width_segments, 3);
        assert_eq!(sphere.height_segments, 2);
    }
}
