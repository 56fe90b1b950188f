//! The mounted globe: one owned context per drawing surface.
//!
//! Every host event reaches the view through `&mut self`: resize, scroll,
//! frame ticks. [`GlobeView::teardown`] consumes the view, so nothing can
//! touch the renderer after it has been disposed.

use terra_config::{AssetConfig, Config};

use crate::backend::{BackendEvent, BackendFactory, RenderBackend};
use crate::error::{FrameError, GlobeError};
use crate::graph::Scene;
use crate::lighting::LightingParams;
use crate::material::{ShadingPipeline, TextureSet};
use crate::render_loop::{RenderLoop, planet_rotation};
use crate::scroll::{ScrollTrigger, ScrollUpdate, ScrubFollower};
use crate::ticker::{FrameScheduler, FrameTick};
use crate::timeline::{ContentStyle, Timeline};
use crate::viewport::Viewport;

/// Settings a view is mounted with.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeOptions {
    pub msaa_samples: u32,
    /// Linear RGBA.
    pub clear_color: [f64; 4],
    pub vsync: bool,
    pub assets: AssetConfig,
    pub scrub_lag_seconds: f32,
}

impl From<&Config> for GlobeOptions {
    fn from(config: &Config) -> Self {
        Self {
            msaa_samples: config.render.msaa_samples,
            clear_color: config.render.clear_color,
            vsync: config.window.vsync,
            assets: config.assets.clone(),
            scrub_lag_seconds: config.scroll.scrub_lag_seconds,
        }
    }
}

impl Default for GlobeOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Running,
    /// The device was lost. The render loop is stopped for good.
    ContextLost,
}

/// What happened during one [`GlobeView::on_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// The backend could not present this frame; the loop continues.
    Skipped,
    /// The view is no longer rendering.
    Stopped,
}

/// A globe bound to one render backend.
pub struct GlobeView<B: RenderBackend> {
    backend: B,
    scene: Scene,
    shading: ShadingPipeline,
    timeline: Timeline,
    trigger: ScrollTrigger,
    follower: ScrubFollower,
    render_loop: RenderLoop,
    content: ContentStyle,
    progress: f32,
    status: ViewStatus,
    reports: Vec<GlobeError>,
    frames_rendered: u64,
}

impl<B: RenderBackend> GlobeView<B> {
    /// Build the scene, prepare the backend, and register the render loop.
    ///
    /// Fails with [`GlobeError::MissingSurface`] when `surface` is `None`.
    /// If preparation fails the backend is disposed before the error is
    /// returned.
    pub fn mount<F, S>(
        factory: &mut F,
        surface: Option<F::Surface>,
        viewport: Viewport,
        options: &GlobeOptions,
        scheduler: &mut S,
    ) -> Result<Self, GlobeError>
    where
        F: BackendFactory<Backend = B>,
        S: FrameScheduler,
    {
        let surface = surface.ok_or(GlobeError::MissingSurface)?;
        let mut backend = factory.create(surface, &viewport, options)?;

        let scene = Scene::build(viewport);
        let textures = TextureSet::from_assets(&options.assets, backend.max_anisotropy());
        let shading = ShadingPipeline::new(textures, LightingParams::default());

        backend.set_size(&viewport);
        if let Err(err) = backend.prepare(&scene, &shading) {
            tracing::error!(error = %err, "globe preparation failed");
            backend.dispose();
            return Err(err);
        }

        let mut view = Self {
            backend,
            scene,
            shading,
            timeline: Timeline::hero(),
            trigger: ScrollTrigger::new(0.0, viewport.height() as f64),
            follower: ScrubFollower::new(options.scrub_lag_seconds),
            render_loop: RenderLoop::start(scheduler),
            content: ContentStyle::REST,
            progress: 0.0,
            status: ViewStatus::Running,
            reports: Vec::new(),
            frames_rendered: 0,
        };
        view.scroll_to(0.0);

        tracing::info!(
            width = viewport.width(),
            height = viewport.height(),
            pixel_ratio = viewport.pixel_ratio(),
            "globe mounted"
        );
        Ok(view)
    }

    /// Apply a new viewport to camera, renderer, and scroll geometry at once.
    pub fn resize(&mut self, viewport: Viewport) {
        self.scene.set_viewport(viewport);
        self.backend.set_size(&viewport);
        let update = self.trigger.refresh(0.0, viewport.height() as f64);
        self.retarget(&update);
        tracing::debug!(
            width = viewport.width(),
            height = viewport.height(),
            buffer = ?self.backend.drawing_buffer_size(),
            "viewport resized"
        );
    }

    /// Feed the page scroll offset in logical pixels.
    pub fn scroll_to(&mut self, scroll_y: f64) -> ScrollUpdate {
        let update = self.trigger.update(scroll_y);
        self.retarget(&update);
        update
    }

    /// Set timeline progress directly, bypassing scroll and scrub lag.
    pub fn set_progress(&mut self, progress: f32) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.follower.snap(progress);
        self.apply_progress(progress);
    }

    fn retarget(&mut self, update: &ScrollUpdate) {
        for event in &update.events {
            tracing::debug!(?event, progress = update.progress, "scroll trigger");
        }
        self.follower.set_target(update.progress as f32);
        if self.follower.is_settled() {
            self.apply_progress(self.follower.displayed());
        }
    }

    fn apply_progress(&mut self, progress: f32) {
        let frame = self.timeline.evaluate(progress);
        self.scene.camera.position = frame.camera_position;
        self.scene.body.group.position = frame.group_position;
        self.scene.body.group.scale = frame.group_scale;
        self.content = frame.content;
        self.progress = progress;
    }

    /// Per-frame callback: drain backend events, advance scrub, spin the
    /// planet, and draw once.
    pub fn on_frame(&mut self, scheduler: &mut impl FrameScheduler, tick: &FrameTick) -> FrameOutcome {
        if self.status != ViewStatus::Running || !self.render_loop.is_running(scheduler) {
            return FrameOutcome::Stopped;
        }

        for event in self.backend.poll_events() {
            match event {
                BackendEvent::TextureLoaded(slot) => {
                    tracing::debug!(%slot, "texture ready");
                }
                BackendEvent::AssetFailed(err) => {
                    tracing::warn!(error = %err, "texture unavailable, keeping placeholder");
                    self.reports.push(err);
                }
                BackendEvent::ContextLost { reason } => {
                    self.lose_context(scheduler, reason);
                }
            }
        }
        if self.status != ViewStatus::Running {
            return FrameOutcome::Stopped;
        }

        if !self.follower.is_settled() {
            let progress = self.follower.advance(tick.delta as f32);
            self.apply_progress(progress);
        }
        self.scene.body.planet.transform.rotation_y = planet_rotation(tick.time);

        match self.backend.render(&self.scene, &self.shading) {
            Ok(()) => {
                self.frames_rendered += 1;
                FrameOutcome::Rendered
            }
            Err(FrameError::Skipped) => {
                tracing::debug!(frame = tick.frame, "frame skipped");
                FrameOutcome::Skipped
            }
            Err(FrameError::ContextLost) => {
                self.lose_context(scheduler, "device lost while rendering".to_string());
                FrameOutcome::Stopped
            }
        }
    }

    fn lose_context(&mut self, scheduler: &mut impl FrameScheduler, reason: String) {
        tracing::warn!(%reason, "graphics context lost, stopping render loop");
        self.render_loop.stop(scheduler);
        self.status = ViewStatus::ContextLost;
        self.reports.push(GlobeError::ContextLoss { reason });
    }

    /// Stop the render loop and release the GPU context.
    pub fn teardown(mut self, scheduler: &mut impl FrameScheduler) {
        self.render_loop.stop(scheduler);
        self.backend.dispose();
        tracing::info!(frames = self.frames_rendered, "globe torn down");
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn shading(&self) -> &ShadingPipeline {
        &self.shading
    }

    pub fn set_atmosphere_opacity(&mut self, opacity: f32) {
        self.shading.set_atmosphere_opacity(opacity);
    }

    pub fn content_style(&self) -> ContentStyle {
        self.content
    }

    /// Progress currently applied to the scene.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn trigger(&self) -> &ScrollTrigger {
        &self.trigger
    }

    /// Scroll distance the hero section stays pinned for.
    pub fn hero_height(&self) -> f64 {
        self.trigger.end() - self.trigger.start()
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    /// Non-fatal errors observed since mount.
    pub fn reports(&self) -> &[GlobeError] {
        &self.reports
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_running(&self, scheduler: &impl FrameScheduler) -> bool {
        self.status == ViewStatus::Running && self.render_loop.is_running(scheduler)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
