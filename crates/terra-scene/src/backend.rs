//! The seam between the scene core and a GPU implementation.

use crate::error::{FrameError, GlobeError};
use crate::graph::Scene;
use crate::material::{ShadingPipeline, TextureSlot};
use crate::view::GlobeOptions;
use crate::viewport::Viewport;

/// Asynchronous notifications drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// A texture finished decoding and replaced its placeholder.
    TextureLoaded(TextureSlot),
    /// A texture failed; carries an [`GlobeError::AssetLoadFailure`].
    AssetFailed(GlobeError),
    /// The device went away.
    ContextLost { reason: String },
}

/// A renderer able to draw a [`Scene`] with a [`ShadingPipeline`].
pub trait RenderBackend {
    /// Highest anisotropic filtering level the device supports (1 when none).
    fn max_anisotropy(&self) -> u16;

    /// Compile programs, allocate buffers, and start texture loads.
    fn prepare(&mut self, scene: &Scene, shading: &ShadingPipeline) -> Result<(), GlobeError>;

    /// Resize the drawing buffer to the viewport's physical size.
    fn set_size(&mut self, viewport: &Viewport);

    fn drawing_buffer_size(&self) -> (u32, u32);

    /// Draw one frame of the current scene.
    fn render(&mut self, scene: &Scene, shading: &ShadingPipeline) -> Result<(), FrameError>;

    /// Take any events that arrived since the last call.
    fn poll_events(&mut self) -> Vec<BackendEvent>;

    /// Release the device. Further calls to `render` fail with `ContextLost`.
    fn dispose(&mut self);
}

/// Creates backends for a host surface type.
pub trait BackendFactory {
    type Surface;
    type Backend: RenderBackend;

    fn create(
        &mut self,
        surface: Self::Surface,
        viewport: &Viewport,
        options: &GlobeOptions,
    ) -> Result<Self::Backend, GlobeError>;
}
