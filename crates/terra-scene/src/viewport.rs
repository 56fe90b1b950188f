//! Viewport dimensions shared by the camera and the renderer.

/// Logical window size plus device pixel ratio.
///
/// Width and height are clamped to at least one pixel so the aspect ratio is
/// always finite. The pixel ratio falls back to 1.0 when it is not a positive
/// finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio,
        }
    }

    /// Build a viewport from a physical framebuffer size and scale factor.
    pub fn from_physical(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        let probe = Self::new(1, 1, scale_factor);
        let to_logical = |px: u32| (px as f64 / probe.pixel_ratio).round() as u32;
        Self::new(
            to_logical(physical_width),
            to_logical(physical_height),
            probe.pixel_ratio,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the render target in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |logical: u32| ((logical as f64 * self.pixel_ratio).floor() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}
