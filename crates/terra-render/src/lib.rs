//! wgpu backend for the Terra globe: device and surface management, WGSL
//! programs, texture streaming, and the frame pass.

pub mod depth;
pub mod gpu;
pub mod pipeline;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod uniforms;

pub use depth::{DepthBuffer, FrameTargets};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pipeline::{GlobeLayouts, GlobePipelines, globe_vertex_layout};
pub use renderer::{GlobeRenderer, WgpuBackendFactory};
pub use shader::{Program, ShaderError, ShaderLibrary, ShaderSources, validate_wgsl};
pub use texture::{
    DecodedTexture, GlobeTextures, TextureError, TextureLoadFailure, TextureLoader,
    decode_texture, mip_level_count,
};
pub use uniforms::{CameraUniform, LightingUniform, ModelUniform};
