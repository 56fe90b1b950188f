//! Window creation and event handling via winit.
//!
//! [`TerraApp`] implements winit's [`ApplicationHandler`]. It owns the mounted
//! [`GlobeView`] and the frame [`Ticker`], and routes resize, scroll, and
//! redraw events into the view.

use std::sync::Arc;

use terra_config::Config;
use terra_render::{GlobeRenderer, WgpuBackendFactory};
use terra_scene::{
    FrameOutcome, GlobeError, GlobeOptions, GlobeView, SystemClock, Ticker, ViewStatus, Viewport,
};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::page::PageScroll;

/// Errors that end the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Globe(#[from] GlobeError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Viewport for a window, honouring a configured pixel ratio override.
pub fn viewport_for(
    physical: (u32, u32),
    scale_factor: f64,
    pixel_ratio_override: Option<f64>,
) -> Viewport {
    let logical = Viewport::from_physical(physical.0, physical.1, scale_factor);
    match pixel_ratio_override {
        Some(ratio) => Viewport::new(logical.width(), logical.height(), ratio),
        None => logical,
    }
}

pub struct TerraApp {
    config: Config,
    options: GlobeOptions,
    factory: WgpuBackendFactory,
    ticker: Ticker<SystemClock>,
    window: Option<Arc<Window>>,
    view: Option<GlobeView<GlobeRenderer>>,
    page: PageScroll,
    content_visible: bool,
    exit_error: Option<AppError>,
}

impl TerraApp {
    pub fn new(config: Config) -> Self {
        let options = GlobeOptions::from(&config);
        let page = PageScroll::new(config.scroll.line_height_px);
        Self {
            config,
            options,
            factory: WgpuBackendFactory,
            ticker: Ticker::new(SystemClock::new()),
            window: None,
            view: None,
            page,
            content_visible: true,
            exit_error: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn take_exit_error(&mut self) -> Option<AppError> {
        self.exit_error.take()
    }

    fn current_viewport(&self) -> Option<Viewport> {
        let window = self.window.as_ref()?;
        let size = window.inner_size();
        Some(viewport_for(
            (size.width, size.height),
            window.scale_factor(),
            self.config.render.pixel_ratio_override,
        ))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!(error = %err, "fatal error");
        self.exit_error = Some(err);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(view) = self.view.take() {
            view.teardown(&mut self.ticker);
        }
        event_loop.exit();
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        self.window = Some(window.clone());
        let viewport = self
            .current_viewport()
            .unwrap_or_else(Viewport::default);

        let view = GlobeView::mount(
            &mut self.factory,
            Some(window),
            viewport,
            &self.options,
            &mut self.ticker,
        )?;
        self.page
            .set_extent(view.hero_height(), self.config.scroll.tail_px);
        self.view = Some(view);
        Ok(())
    }

    fn apply_resize(&mut self) {
        let Some(viewport) = self.current_viewport() else {
            return;
        };
        let Some(view) = self.view.as_mut() else {
            return;
        };
        view.resize(viewport);
        self.page
            .set_extent(view.hero_height(), self.config.scroll.tail_px);
        view.scroll_to(self.page.offset());
        info!(
            "Viewport resized to {}x{} (ratio {:.2})",
            viewport.width(),
            viewport.height(),
            viewport.pixel_ratio()
        );
    }

    fn apply_scroll(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        view.scroll_to(self.page.offset());
        self.sync_content();
    }

    /// Apply the hero content style to the foreground layer. This host has no
    /// foreground text, so visibility changes are only reported.
    fn sync_content(&mut self) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let style = view.content_style();
        if style.visible != self.content_visible {
            self.content_visible = style.visible;
            debug!(
                visible = style.visible,
                progress = view.progress(),
                "hero content visibility changed"
            );
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(tick) = self.ticker.tick() else {
            return;
        };
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let outcome = view.on_frame(&mut self.ticker, &tick);
        if outcome == FrameOutcome::Stopped && view.status() == ViewStatus::ContextLost {
            let reason = view
                .reports()
                .iter()
                .rev()
                .find_map(|report| match report {
                    GlobeError::ContextLoss { reason } => Some(reason.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            self.fail(event_loop, GlobeError::ContextLoss { reason }.into());
            return;
        }
        self.sync_content();
    }
}

impl ApplicationHandler for TerraApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.mount(event_loop) {
            self.fail(event_loop, err);
            return;
        }
        info!("Terra window ready");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.apply_resize();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                if self.page.apply_wheel(delta, scale) {
                    self.apply_scroll();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    self.shutdown(event_loop);
                    return;
                }
                let height = self.view.as_ref().map_or(0.0, |v| v.hero_height());
                if self.page.apply_key(&event.logical_key, height) {
                    self.apply_scroll();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.view.is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(view) = self.view.take() {
            warn!("event loop exiting with a mounted view, tearing down");
            view.teardown(&mut self.ticker);
        }
    }
}

/// Create an event loop and run the app until the window closes.
#[instrument(skip(config))]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = TerraApp::new(config);
    event_loop.run_app(&mut app)?;
    match app.take_exit_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
