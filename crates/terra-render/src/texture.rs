//! Globe textures: background decoding, placeholders, upload, and mipmaps.
//!
//! Each [`TextureSlot`] starts bound to a 1x1 placeholder so the globe can be
//! drawn before any image arrives. A [`TextureLoader`] worker decodes the
//! files off the render thread; results are drained once per frame and
//! uploaded by [`GlobeTextures::upload`], which also builds the mip chain.

use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use terra_scene::{ColorSpace, GlobeError, TextureDesc, TextureSet, TextureSlot};
use wgpu::util::DeviceExt;

/// Errors that can occur while decoding or uploading a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The file could not be opened or decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Pixel data length doesn't match the expected size for the given dimensions and format.
    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height} {format:?}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// The loader thread could not be started.
    #[error("failed to start texture loader: {0}")]
    Worker(#[source] std::io::Error),
}

/// Calculates the number of mip levels for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    (width.max(height) as f32).log2().floor() as u32 + 1
}

/// GPU format for a texture tagged with `color_space`.
///
/// sRGB textures are decoded to linear by the sampler; linear masks are read
/// as stored.
pub fn format_for(color_space: ColorSpace) -> wgpu::TextureFormat {
    match color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

/// RGBA8 pixels decoded from disk, ready for upload.
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub slot: TextureSlot,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A texture that failed to load. The slot keeps its placeholder.
#[derive(Debug)]
pub struct TextureLoadFailure {
    pub slot: TextureSlot,
    pub path: PathBuf,
    pub error: TextureError,
}

impl From<TextureLoadFailure> for GlobeError {
    fn from(failure: TextureLoadFailure) -> Self {
        GlobeError::AssetLoadFailure {
            slot: failure.slot,
            path: failure.path,
            reason: failure.error.to_string(),
        }
    }
}

pub type LoadOutcome = Result<DecodedTexture, TextureLoadFailure>;

/// Decode `desc.path` into RGBA8, downscaling so neither side exceeds
/// `max_dimension`.
pub fn decode_texture(desc: &TextureDesc, max_dimension: u32) -> Result<DecodedTexture, TextureError> {
    let mut img = image::open(&desc.path)
        .map_err(|source| TextureError::Decode {
            path: desc.path.clone(),
            source,
        })?
        .to_rgba8();

    let (width, height) = img.dimensions();
    validate_dimensions(width, height)?;

    let max_dimension = max_dimension.max(1);
    if width > max_dimension || height > max_dimension {
        let scale = max_dimension as f64 / width.max(height) as f64;
        let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
        let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
        log::warn!(
            "{} texture is {width}x{height}, downscaling to {new_width}x{new_height}",
            desc.slot
        );
        img = image::imageops::resize(
            &img,
            new_width,
            new_height,
            image::imageops::FilterType::Lanczos3,
        );
    }

    let (width, height) = img.dimensions();
    Ok(DecodedTexture {
        slot: desc.slot,
        width,
        height,
        rgba: img.into_raw(),
    })
}

/// Background worker that decodes the globe's textures.
///
/// Dropping the loader abandons outstanding results; the worker exits once it
/// finishes the file it is on.
pub struct TextureLoader {
    receiver: Receiver<LoadOutcome>,
    pending: usize,
}

impl TextureLoader {
    /// Start decoding `descs` in order on a named worker thread.
    pub fn spawn(descs: Vec<TextureDesc>, max_dimension: u32) -> Result<Self, TextureError> {
        let pending = descs.len();
        let (sender, receiver) = crossbeam_channel::bounded(pending.max(1));

        std::thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || {
                for desc in descs {
                    let outcome =
                        decode_texture(&desc, max_dimension).map_err(|error| TextureLoadFailure {
                            slot: desc.slot,
                            path: desc.path.clone(),
                            error,
                        });
                    if sender.send(outcome).is_err() {
                        break;
                    }
                }
            })
            .map_err(TextureError::Worker)?;

        Ok(Self { receiver, pending })
    }

    /// Take every result that has arrived without blocking.
    pub fn drain(&mut self) -> Vec<LoadOutcome> {
        let results: Vec<_> = self.receiver.try_iter().collect();
        self.pending = self.pending.saturating_sub(results.len());
        results
    }

    /// Block until the next result arrives or `timeout` elapses.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of textures still being decoded.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_finished(&self) -> bool {
        self.pending == 0
    }
}

/// A GPU texture bound to one slot.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
    /// False while the placeholder is bound.
    pub loaded: bool,
}

/// The three globe textures plus their shared sampler.
pub struct GlobeTextures {
    slots: Vec<GpuTexture>,
    sampler: wgpu::Sampler,
    anisotropy: u16,
    blitter: MipmapBlitter,
}

impl GlobeTextures {
    /// Create placeholders for every slot in `set`.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, set: &TextureSet) -> Self {
        let anisotropy = set.iter().map(|d| d.anisotropy).max().unwrap_or(1).max(1);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("globe-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            anisotropy_clamp: anisotropy,
            ..Default::default()
        });

        let slots = TextureSlot::ALL
            .into_iter()
            .map(|slot| placeholder(device, queue, slot, set.get(slot).color_space))
            .collect();

        Self {
            slots,
            sampler,
            anisotropy,
            blitter: MipmapBlitter::new(device),
        }
    }

    /// Replace a slot's placeholder with decoded pixels and generate mipmaps.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedTexture,
    ) -> Result<(), TextureError> {
        let format = self.slots[image.slot.index()].format;
        let (width, height) = (image.width, image.height);
        validate_dimensions(width, height)?;
        validate_data_size(&image.rgba, width, height, format)?;

        let mip_levels = mip_level_count(width, height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{}-texture", image.slot)),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row(width, format)),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        if mip_levels > 1 {
            self.blitter
                .generate(device, queue, &texture, format, mip_levels);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.slots[image.slot.index()] = GpuTexture {
            texture,
            view,
            dimensions: (width, height),
            format,
            mip_level_count: mip_levels,
            loaded: true,
        };
        log::info!(
            "Uploaded {} texture ({width}x{height}, {mip_levels} mips)",
            image.slot
        );
        Ok(())
    }

    pub fn get(&self, slot: TextureSlot) -> &GpuTexture {
        &self.slots[slot.index()]
    }

    pub fn view(&self, slot: TextureSlot) -> &wgpu::TextureView {
        &self.slots[slot.index()].view
    }

    pub fn is_loaded(&self, slot: TextureSlot) -> bool {
        self.slots[slot.index()].loaded
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn anisotropy(&self) -> u16 {
        self.anisotropy
    }
}

/// 1x1 black texel in the slot's format. Black keeps an unloaded globe dark
/// with no clouds or specular.
fn placeholder(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    slot: TextureSlot,
    color_space: ColorSpace,
) -> GpuTexture {
    let format = format_for(color_space);
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(&format!("{slot}-placeholder")),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &[0, 0, 0, 255],
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        dimensions: (1, 1),
        format,
        mip_level_count: 1,
        loaded: false,
    }
}

/// WGSL shader for mipmap generation via fullscreen blit.
const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    // Full-screen triangle
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

/// Downsamples level N-1 into level N with one render pass per level.
struct MipmapBlitter {
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl MipmapBlitter {
    fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            shader,
            pipeline_layout,
            bind_group_layout,
            sampler,
        }
    }

    fn generate(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        format: wgpu::TextureFormat,
        mip_count: u32,
    ) {
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mipmap-pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mipmap-encoder"),
        });

        for level in 1..mip_count {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mipmap-bind-group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mipmap-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn expected_byte_size(width: u32, height: u32, format: wgpu::TextureFormat) -> usize {
    let bpp = format.block_copy_size(None).unwrap_or(4) as usize;
    width as usize * height as usize * bpp
}

fn bytes_per_row(width: u32, format: wgpu::TextureFormat) -> u32 {
    let bpp = format.block_copy_size(None).unwrap_or(4);
    width * bpp
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    Ok(())
}

fn validate_data_size(
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<(), TextureError> {
    let expected = expected_byte_size(width, height, format);
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}

/// Create a test GPU device and queue. Returns `None` if no GPU is available.
#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: Default::default(),
                ..Default::default()
            })
            .await
            .ok()
    })
}
