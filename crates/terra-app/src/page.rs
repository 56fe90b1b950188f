//! The scrollable page the globe's hero section lives in.
//!
//! The page is `hero_height + tail` logical pixels tall. Wheel and keyboard
//! input move the offset; the view turns the offset into timeline progress.

use winit::event::MouseScrollDelta;
use winit::keyboard::{Key, NamedKey};

/// Fraction of the viewport a page-up/page-down step moves.
const PAGE_STEP: f64 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct PageScroll {
    offset: f64,
    max: f64,
    line_height: f64,
}

impl PageScroll {
    pub fn new(line_height: f64) -> Self {
        Self {
            offset: 0.0,
            max: 0.0,
            line_height: line_height.max(1.0),
        }
    }

    /// Set the scrollable extent, clamping the current offset into it.
    pub fn set_extent(&mut self, hero_height: f64, tail: f64) {
        self.max = (hero_height.max(0.0) + tail.max(0.0)).max(0.0);
        self.offset = self.offset.clamp(0.0, self.max);
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Move to `y`. Returns whether the offset changed.
    pub fn scroll_to(&mut self, y: f64) -> bool {
        if !y.is_finite() {
            return false;
        }
        let next = y.clamp(0.0, self.max);
        let changed = next != self.offset;
        self.offset = next;
        changed
    }

    pub fn scroll_by(&mut self, dy: f64) -> bool {
        self.scroll_to(self.offset + dy)
    }

    /// Apply a wheel event. Positive wheel deltas scroll toward the top.
    pub fn apply_wheel(&mut self, delta: MouseScrollDelta, scale_factor: f64) -> bool {
        let dy = match delta {
            MouseScrollDelta::LineDelta(_, lines) => -(lines as f64) * self.line_height,
            MouseScrollDelta::PixelDelta(pos) => -pos.y / scale_factor.max(f64::EPSILON),
        };
        self.scroll_by(dy)
    }

    /// Apply a navigation key. Returns whether the offset changed.
    pub fn apply_key(&mut self, key: &Key, viewport_height: f64) -> bool {
        let page = viewport_height * PAGE_STEP;
        match key {
            Key::Named(NamedKey::ArrowDown) => self.scroll_by(self.line_height),
            Key::Named(NamedKey::ArrowUp) => self.scroll_by(-self.line_height),
            Key::Named(NamedKey::PageDown) | Key::Named(NamedKey::Space) => self.scroll_by(page),
            Key::Named(NamedKey::PageUp) => self.scroll_by(-page),
            Key::Named(NamedKey::Home) => self.scroll_to(0.0),
            Key::Named(NamedKey::End) => self.scroll_to(self.max),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    fn page() -> PageScroll {
        let mut page = PageScroll::new(40.0);
        page.set_extent(720.0, 1080.0);
        page
    }

    #[test]
    fn test_extent_is_hero_plus_tail() {
        assert_eq!(page().max(), 1800.0);
    }

    #[test]
    fn test_wheel_lines_scroll_down() {
        let mut page = page();
        assert!(page.apply_wheel(MouseScrollDelta::LineDelta(0.0, -3.0), 1.0));
        assert_eq!(page.offset(), 120.0);
    }

    #[test]
    fn test_pixel_delta_is_logical() {
        let mut page = page();
        page.apply_wheel(
            MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -200.0)),
            2.0,
        );
        assert_eq!(page.offset(), 100.0);
    }

    #[test]
    fn test_offset_clamps_to_page() {
        let mut page = page();
        assert!(!page.scroll_by(-50.0));
        assert_eq!(page.offset(), 0.0);
        page.scroll_to(10_000.0);
        assert_eq!(page.offset(), 1800.0);
        assert!(!page.scroll_by(10.0));
    }

    #[test]
    fn test_shrinking_extent_clamps_offset() {
        let mut page = page();
        page.scroll_to(1500.0);
        page.set_extent(500.0, 500.0);
        assert_eq!(page.offset(), 1000.0);
    }

    #[test]
    fn test_keys_navigate() {
        let mut page = page();
        page.apply_key(&Key::Named(NamedKey::PageDown), 720.0);
        assert!((page.offset() - 648.0).abs() < 1e-9);
        page.apply_key(&Key::Named(NamedKey::End), 720.0);
        assert_eq!(page.offset(), 1800.0);
        page.apply_key(&Key::Named(NamedKey::Home), 720.0);
        assert_eq!(page.offset(), 0.0);
        assert!(!page.apply_key(&Key::Named(NamedKey::Tab), 720.0));
    }

    #[test]
    fn test_non_finite_scroll_ignored() {
        let mut page = page();
        page.scroll_to(100.0);
        assert!(!page.scroll_to(f64::NAN));
        assert_eq!(page.offset(), 100.0);
    }
}
