//! Render pipelines for the planet surface and the atmosphere shell.
//!
//! Bind group layout shared by both programs:
//!
//! | group | binding | contents                                      |
//! |-------|---------|-----------------------------------------------|
//! | 0     | 0       | [`CameraUniform`]                             |
//! | 1     | 0       | [`ModelUniform`] (one bind group per mesh)    |
//! | 2     | 0       | [`LightingUniform`]                           |
//! | 2     | 1..=3   | day, night, specular/clouds textures          |
//! | 2     | 4       | filtering sampler                             |

use std::num::NonZeroU64;

use terra_scene::{GlobeVertex, MaterialDesc, ShadingPipeline, Side};

use crate::depth::DepthBuffer;
use crate::shader::{Program, ShaderLibrary, ShaderError};
use crate::uniforms::{CameraUniform, LightingUniform, ModelUniform};

const GLOBE_VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 24,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x2,
    },
];

/// Vertex buffer layout for [`GlobeVertex`]: position, normal, uv.
pub fn globe_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GlobeVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &GLOBE_VERTEX_ATTRIBUTES,
    }
}

/// Back-face culling for front-side materials, front-face culling for
/// back-side ones.
pub fn cull_mode(side: Side) -> wgpu::Face {
    match side {
        Side::Front => wgpu::Face::Back,
        Side::Back => wgpu::Face::Front,
    }
}

fn blend_state(material: &MaterialDesc) -> Option<wgpu::BlendState> {
    material.transparent.then_some(wgpu::BlendState::ALPHA_BLENDING)
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind group layouts for the three groups.
pub struct GlobeLayouts {
    pub camera: wgpu::BindGroupLayout,
    pub model: wgpu::BindGroupLayout,
    pub shared: wgpu::BindGroupLayout,
}

impl GlobeLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-camera-layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<CameraUniform>(),
            )],
        });

        let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-model-layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<ModelUniform>(),
            )],
        });

        let shared = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-shared-layout"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<LightingUniform>(),
                ),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            camera,
            model,
            shared,
        }
    }
}

/// Planet and atmosphere pipelines built from their material descriptions.
pub struct GlobePipelines {
    pub layouts: GlobeLayouts,
    pub planet: wgpu::RenderPipeline,
    pub atmosphere: wgpu::RenderPipeline,
}

impl GlobePipelines {
    pub fn new(
        device: &wgpu::Device,
        shaders: &ShaderLibrary,
        shading: &ShadingPipeline,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self, ShaderError> {
        let layouts = GlobeLayouts::new(device);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-pipeline-layout"),
            bind_group_layouts: &[&layouts.camera, &layouts.model, &layouts.shared],
            immediate_size: 0,
        });

        let target = PipelineTarget {
            layout: &layout,
            format: surface_format,
            sample_count,
        };
        let planet = build_pipeline(
            device,
            shaders,
            &target,
            shading.planet(),
            (Program::PlanetVertex, Program::PlanetFragment),
        )?;
        let atmosphere = build_pipeline(
            device,
            shaders,
            &target,
            shading.atmosphere(),
            (Program::AtmosphereVertex, Program::AtmosphereFragment),
        )?;

        log::debug!("Globe pipelines built ({sample_count}x MSAA, {surface_format:?})");
        Ok(Self {
            layouts,
            planet,
            atmosphere,
        })
    }
}

struct PipelineTarget<'a> {
    layout: &'a wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    sample_count: u32,
}

fn build_pipeline(
    device: &wgpu::Device,
    shaders: &ShaderLibrary,
    target: &PipelineTarget<'_>,
    material: &MaterialDesc,
    (vertex, fragment): (Program, Program),
) -> Result<wgpu::RenderPipeline, ShaderError> {
    let not_loaded = |program: Program| ShaderError::CompilationFailed {
        name: program.file_name().to_string(),
        message: "module was not compiled".to_string(),
    };
    let vs = shaders.get(vertex).ok_or_else(|| not_loaded(vertex))?;
    let fs = shaders.get(fragment).ok_or_else(|| not_loaded(fragment))?;

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(material.name),
        layout: Some(target.layout),
        vertex: wgpu::VertexState {
            module: &vs,
            entry_point: Some(vertex.entry_point()),
            buffers: &[globe_vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(cull_mode(material.side)),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: material.depth_write,
            depth_compare: DepthBuffer::COMPARE_FUNCTION,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: target.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: &fs,
            entry_point: Some(fragment.entry_point()),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.format,
                blend: blend_state(material),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderSources;
    use crate::texture::create_test_device_queue;
    use terra_config::AssetConfig;
    use terra_scene::{LightingParams, TextureSet};

    fn shading() -> ShadingPipeline {
        ShadingPipeline::new(
            TextureSet::from_assets(&AssetConfig::default(), 1),
            LightingParams::default(),
        )
    }

    #[test]
    fn test_vertex_layout_matches_globe_vertex() {
        let layout = globe_vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 24);
        assert_eq!(layout.attributes[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn test_cull_mode_follows_side() {
        let shading = shading();
        assert_eq!(cull_mode(shading.planet().side), wgpu::Face::Back);
        assert_eq!(cull_mode(shading.atmosphere().side), wgpu::Face::Front);
    }

    #[test]
    fn test_both_materials_blend() {
        let shading = shading();
        assert_eq!(
            blend_state(shading.planet()),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
        assert_eq!(
            blend_state(shading.atmosphere()),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
    }

    #[test]
    fn test_pipelines_build_on_device() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let shaders = ShaderLibrary::compile_all(&device, &ShaderSources::embedded()).unwrap();
        assert_eq!(shaders.len(), 4);
        let result = GlobePipelines::new(
            &device,
            &shaders,
            &shading(),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            1,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_module_is_reported() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let result = GlobePipelines::new(
            &device,
            &ShaderLibrary::new(),
            &shading(),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            1,
        );
        assert!(matches!(
            result,
            Err(ShaderError::CompilationFailed { name, .. }) if name == "planet.vert.wgsl"
        ));
    }
}
