//! GPU-independent core of the Terra globe.
//!
//! Holds the scene graph, lighting parameters, materials, the scroll-driven
//! timeline, and the frame scheduler. Rendering goes through the
//! [`RenderBackend`] trait so everything here runs headless in tests.

pub mod backend;
pub mod camera;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod lighting;
pub mod material;
pub mod render_loop;
pub mod scroll;
pub mod ticker;
pub mod timeline;
pub mod view;
pub mod viewport;

pub use backend::{BackendEvent, BackendFactory, RenderBackend};
pub use camera::PerspectiveCamera;
pub use error::{FrameError, GlobeError};
pub use geometry::{GlobeVertex, SphereGeometry};
pub use graph::{ATMOSPHERE_SCALE, CelestialBody, MeshKind, MeshNode, Scene, Transform};
pub use lighting::{Color, LightingParams, Spherical, SurfaceSample};
pub use material::{ColorSpace, MaterialDesc, ShadingPipeline, Side, TextureDesc, TextureSet, TextureSlot};
pub use render_loop::{RenderLoop, planet_rotation};
pub use scroll::{PinState, ScrollTrigger, ScrollUpdate, ScrubFollower, TriggerEvent};
pub use ticker::{
    Clock, FrameHandle, FrameScheduler, FrameTick, LagSmoothing, ManualClock, SystemClock, Ticker,
};
pub use timeline::{ContentStyle, Ease, HeroFrame, Timeline, Tween, TweenTarget};
pub use view::{FrameOutcome, GlobeOptions, GlobeView, ViewStatus};
pub use viewport::Viewport;
