//! The wgpu implementation of [`RenderBackend`].

use std::sync::Arc;

use terra_scene::{
    BackendEvent, BackendFactory, FrameError, GlobeError, GlobeOptions, MeshKind, RenderBackend,
    Scene, ShadingPipeline, TextureSet, TextureSlot, Viewport,
};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::depth::{DepthBuffer, FrameTargets};
use crate::gpu::{RenderContext, RenderContextError, SurfaceError};
use crate::pipeline::GlobePipelines;
use crate::shader::{ShaderLibrary, ShaderSources};
use crate::texture::{GlobeTextures, TextureLoader};
use crate::uniforms::{CameraUniform, LightingUniform, ModelUniform};

impl From<RenderContextError> for GlobeError {
    fn from(err: RenderContextError) -> Self {
        GlobeError::Backend {
            message: err.to_string(),
        }
    }
}

/// GPU objects created by [`RenderBackend::prepare`].
struct GlobeResources {
    pipelines: GlobePipelines,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    planet_buffer: wgpu::Buffer,
    planet_bind_group: wgpu::BindGroup,
    atmosphere_buffer: wgpu::Buffer,
    atmosphere_bind_group: wgpu::BindGroup,
    lighting_buffer: wgpu::Buffer,
    texture_set: TextureSet,
    textures: GlobeTextures,
    shared_bind_group: wgpu::BindGroup,
}

impl GlobeResources {
    fn rebuild_shared_bind_group(&mut self, device: &wgpu::Device) {
        self.shared_bind_group = shared_bind_group(
            device,
            &self.pipelines.layouts.shared,
            &self.lighting_buffer,
            &self.textures,
        );
    }
}

fn shared_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    lighting: &wgpu::Buffer,
    textures: &GlobeTextures,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("globe-shared-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: lighting.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(textures.view(TextureSlot::Day)),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(textures.view(TextureSlot::Night)),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(
                    textures.view(TextureSlot::SpecularClouds),
                ),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(textures.sampler()),
            },
        ],
    })
}

fn uniform_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    value: &T,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn single_buffer_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

/// Draws the globe into a window surface.
pub struct GlobeRenderer {
    ctx: RenderContext,
    clear_color: wgpu::Color,
    sample_count: u32,
    shader_dir: Option<std::path::PathBuf>,
    targets: FrameTargets,
    drawing_buffer: (u32, u32),
    resources: Option<GlobeResources>,
    loader: Option<TextureLoader>,
    disposed: bool,
}

impl GlobeRenderer {
    pub fn new(ctx: RenderContext, viewport: &Viewport, options: &GlobeOptions) -> Self {
        let sample_count = ctx.supported_sample_count(options.msaa_samples, DepthBuffer::FORMAT);
        if sample_count != options.msaa_samples.max(1) {
            log::warn!(
                "{}x MSAA unsupported for {:?}, using {sample_count}x",
                options.msaa_samples,
                ctx.surface_format
            );
        }
        let (width, height) = viewport.drawing_buffer_size();
        let targets = FrameTargets::new(&ctx.device, ctx.surface_format, width, height, sample_count);
        let [r, g, b, a] = options.clear_color;

        Self {
            ctx,
            clear_color: wgpu::Color { r, g, b, a },
            sample_count,
            shader_dir: options.assets.shader_dir.clone(),
            targets,
            drawing_buffer: (width, height),
            resources: None,
            loader: None,
            disposed: false,
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Whether a decoded image has replaced the placeholder in `slot`.
    pub fn is_texture_loaded(&self, slot: TextureSlot) -> bool {
        self.resources
            .as_ref()
            .is_some_and(|r| r.textures.is_loaded(slot))
    }

    fn upload_decoded(&mut self, events: &mut Vec<BackendEvent>) {
        let (Some(loader), Some(resources)) = (self.loader.as_mut(), self.resources.as_mut()) else {
            return;
        };
        let mut uploaded = false;
        for outcome in loader.drain() {
            match outcome {
                Ok(image) => {
                    let slot = image.slot;
                    match resources
                        .textures
                        .upload(&self.ctx.device, &self.ctx.queue, &image)
                    {
                        Ok(()) => {
                            uploaded = true;
                            events.push(BackendEvent::TextureLoaded(slot));
                        }
                        Err(error) => events.push(BackendEvent::AssetFailed(
                            GlobeError::AssetLoadFailure {
                                slot,
                                path: resources.texture_set.get(slot).path.clone(),
                                reason: error.to_string(),
                            },
                        )),
                    }
                }
                Err(failure) => events.push(BackendEvent::AssetFailed(failure.into())),
            }
        }
        if uploaded {
            resources.rebuild_shared_bind_group(&self.ctx.device);
        }
        if loader.is_finished() {
            self.loader = None;
        }
    }
}

impl RenderBackend for GlobeRenderer {
    fn max_anisotropy(&self) -> u16 {
        self.ctx.max_anisotropy()
    }

    fn prepare(&mut self, scene: &Scene, shading: &ShadingPipeline) -> Result<(), GlobeError> {
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let sources = ShaderSources::load(self.shader_dir.as_deref())?;
        let shaders = ShaderLibrary::compile_all(device, &sources)?;
        let pipelines = GlobePipelines::new(
            device,
            &shaders,
            shading,
            self.ctx.surface_format,
            self.sample_count,
        )?;

        // Both meshes share one sphere.
        let geometry = &scene.body.mesh(MeshKind::Planet).geometry;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globe-vertices"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globe-indices"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let camera_buffer = uniform_buffer(
            device,
            "camera-uniform",
            &CameraUniform::from_camera(&scene.camera),
        );
        let camera_bind_group = single_buffer_bind_group(
            device,
            "camera-bind-group",
            &pipelines.layouts.camera,
            &camera_buffer,
        );
        let planet_buffer = uniform_buffer(
            device,
            "planet-model-uniform",
            &ModelUniform::new(
                scene.body.world_matrix(MeshKind::Planet),
                shading.planet().opacity,
            ),
        );
        let planet_bind_group = single_buffer_bind_group(
            device,
            "planet-bind-group",
            &pipelines.layouts.model,
            &planet_buffer,
        );
        let atmosphere_buffer = uniform_buffer(
            device,
            "atmosphere-model-uniform",
            &ModelUniform::new(
                scene.body.world_matrix(MeshKind::Atmosphere),
                shading.atmosphere().opacity,
            ),
        );
        let atmosphere_bind_group = single_buffer_bind_group(
            device,
            "atmosphere-bind-group",
            &pipelines.layouts.model,
            &atmosphere_buffer,
        );

        let lighting_buffer = uniform_buffer(
            device,
            "lighting-uniform",
            &LightingUniform::from_params(shading.lighting()),
        );
        let textures = GlobeTextures::new(device, queue, shading.textures());
        let shared_bind_group = shared_bind_group(
            device,
            &pipelines.layouts.shared,
            &lighting_buffer,
            &textures,
        );

        let max_dimension = device.limits().max_texture_dimension_2d;
        let loader = TextureLoader::spawn(shading.textures().iter().cloned().collect(), max_dimension)
            .map_err(|e| GlobeError::Backend {
                message: e.to_string(),
            })?;

        log::info!(
            "Globe prepared: {} triangles, {}x MSAA",
            geometry.triangle_count(),
            self.sample_count
        );
        self.resources = Some(GlobeResources {
            pipelines,
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            camera_buffer,
            camera_bind_group,
            planet_buffer,
            planet_bind_group,
            atmosphere_buffer,
            atmosphere_bind_group,
            lighting_buffer,
            texture_set: shading.textures().clone(),
            textures,
            shared_bind_group,
        });
        self.loader = Some(loader);
        Ok(())
    }

    fn set_size(&mut self, viewport: &Viewport) {
        let (width, height) = viewport.drawing_buffer_size();
        self.drawing_buffer = (width, height);
        if self.disposed {
            return;
        }
        self.ctx.resize(width, height);
        self.targets.resize(&self.ctx.device, width, height);
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.drawing_buffer
    }

    fn render(&mut self, scene: &Scene, shading: &ShadingPipeline) -> Result<(), FrameError> {
        if self.ctx.is_lost() {
            return Err(FrameError::ContextLost);
        }
        let Some(resources) = self.resources.as_ref() else {
            return Err(FrameError::Skipped);
        };

        let queue = &self.ctx.queue;
        queue.write_buffer(
            &resources.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from_camera(&scene.camera)),
        );
        queue.write_buffer(
            &resources.planet_buffer,
            0,
            bytemuck::bytes_of(&ModelUniform::new(
                scene.body.world_matrix(MeshKind::Planet),
                shading.planet().opacity,
            )),
        );
        queue.write_buffer(
            &resources.atmosphere_buffer,
            0,
            bytemuck::bytes_of(&ModelUniform::new(
                scene.body.world_matrix(MeshKind::Atmosphere),
                shading.atmosphere().opacity,
            )),
        );
        queue.write_buffer(
            &resources.lighting_buffer,
            0,
            bytemuck::bytes_of(&LightingUniform::from_params(shading.lighting())),
        );

        let frame = match self.ctx.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Timeout) | Err(SurfaceError::Lost) => {
                log::debug!("Surface unavailable, skipping frame");
                return Err(FrameError::Skipped);
            }
            Err(SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                return Err(FrameError::ContextLost);
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("globe-frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("globe-pass"),
                color_attachments: &[Some(self.targets.color_attachment(&view, self.clear_color))],
                depth_stencil_attachment: Some(self.targets.depth_attachment()),
                ..Default::default()
            });

            pass.set_vertex_buffer(0, resources.vertex_buffer.slice(..));
            pass.set_index_buffer(resources.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(0, &resources.camera_bind_group, &[]);
            pass.set_bind_group(2, &resources.shared_bind_group, &[]);

            // Opaque-depth planet first so the shell's back faces are hidden behind it.
            pass.set_pipeline(&resources.pipelines.planet);
            pass.set_bind_group(1, &resources.planet_bind_group, &[]);
            pass.draw_indexed(0..resources.index_count, 0, 0..1);

            pass.set_pipeline(&resources.pipelines.atmosphere);
            pass.set_bind_group(1, &resources.atmosphere_bind_group, &[]);
            pass.draw_indexed(0..resources.index_count, 0, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<BackendEvent> {
        let mut events = Vec::new();
        if self.disposed {
            return events;
        }
        if let Some(reason) = self.ctx.poll_device_lost() {
            log::error!("GPU device lost: {reason}");
            events.push(BackendEvent::ContextLost { reason });
            return events;
        }
        self.upload_decoded(&mut events);
        events
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.loader = None;
        self.resources = None;
        self.ctx.destroy();
    }
}

/// Creates [`GlobeRenderer`]s for winit windows.
#[derive(Debug, Default)]
pub struct WgpuBackendFactory;

impl BackendFactory for WgpuBackendFactory {
    type Surface = Arc<Window>;
    type Backend = GlobeRenderer;

    fn create(
        &mut self,
        window: Arc<Window>,
        viewport: &Viewport,
        options: &GlobeOptions,
    ) -> Result<GlobeRenderer, GlobeError> {
        let ctx = pollster::block_on(RenderContext::new(window, options.vsync))?;
        Ok(GlobeRenderer::new(ctx, viewport, options))
    }
}
