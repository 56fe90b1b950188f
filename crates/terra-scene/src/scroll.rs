//! Scroll position to timeline progress.
//!
//! [`ScrollTrigger`] maps a vertical scroll offset onto `[0, 1]` across a
//! pinned section and reports boundary crossings. [`ScrubFollower`] optionally
//! eases the displayed progress toward that value over a fixed catch-up time.

use crate::timeline::Ease;

/// Boundary crossing reported by [`ScrollTrigger::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Scrolled forward past the start.
    Enter,
    /// Scrolled forward past the end.
    Leave,
    /// Scrolled backward past the end.
    EnterBack,
    /// Scrolled backward past the start.
    LeaveBack,
}

/// Where the pinned section sits relative to the scroll range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinState {
    /// Above the range; the section scrolls normally.
    Before,
    /// Inside the range; the section is held in place by translating it down
    /// by `offset` logical pixels.
    Pinned { offset: f64 },
    /// Past the range; the section resumes scrolling, displaced by the full
    /// pinned distance.
    After { offset: f64 },
}

impl PinState {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Pinned { .. })
    }
}

/// Result of feeding a scroll position to a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollUpdate {
    pub progress: f64,
    pub pin: PinState,
    pub events: Vec<TriggerEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Before,
    Active,
    After,
}

/// Tracks progress through a section from "top hits viewport top" to
/// "bottom hits viewport top".
#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    start: f64,
    end: f64,
    scroll: f64,
    region: Option<Region>,
}

impl ScrollTrigger {
    /// `section_top` and `section_height` are in logical pixels from the top
    /// of the page.
    pub fn new(section_top: f64, section_height: f64) -> Self {
        let mut trigger = Self {
            start: 0.0,
            end: 0.0,
            scroll: 0.0,
            region: None,
        };
        trigger.set_bounds(section_top, section_height);
        trigger
    }

    fn set_bounds(&mut self, section_top: f64, section_height: f64) {
        self.start = section_top;
        self.end = section_top + section_height.max(0.0);
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    /// Progress for the last scroll position seen.
    pub fn progress(&self) -> f64 {
        self.progress_at(self.scroll)
    }

    fn progress_at(&self, scroll: f64) -> f64 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if scroll >= self.start { 1.0 } else { 0.0 };
        }
        ((scroll - self.start) / span).clamp(0.0, 1.0)
    }

    fn region_at(&self, scroll: f64) -> Region {
        if scroll < self.start {
            Region::Before
        } else if scroll > self.end {
            Region::After
        } else {
            Region::Active
        }
    }

    fn pin_at(&self, scroll: f64) -> PinState {
        match self.region_at(scroll) {
            Region::Before => PinState::Before,
            Region::Active => PinState::Pinned {
                offset: scroll - self.start,
            },
            Region::After => PinState::After {
                offset: self.end - self.start,
            },
        }
    }

    /// Feed a new scroll offset.
    ///
    /// The first update into or past the range reports `Enter` as if the page
    /// had scrolled there from the top. Jumping across the whole range in one
    /// update reports both crossings in scroll order.
    pub fn update(&mut self, scroll: f64) -> ScrollUpdate {
        let scroll = if scroll.is_finite() { scroll } else { self.scroll };
        let next = self.region_at(scroll);
        let previous = self.region.unwrap_or(Region::Before);

        use Region::*;
        use TriggerEvent::*;
        let events = match (previous, next) {
            (Before, Active) => vec![Enter],
            (Before, After) => vec![Enter, Leave],
            (Active, After) => vec![Leave],
            (After, Active) => vec![EnterBack],
            (After, Before) => vec![EnterBack, LeaveBack],
            (Active, Before) => vec![LeaveBack],
            _ => Vec::new(),
        };

        self.scroll = scroll;
        self.region = Some(next);

        ScrollUpdate {
            progress: self.progress_at(scroll),
            pin: self.pin_at(scroll),
            events,
        }
    }

    /// Recompute the section geometry (after a resize) and re-evaluate at the
    /// current scroll offset.
    pub fn refresh(&mut self, section_top: f64, section_height: f64) -> ScrollUpdate {
        self.set_bounds(section_top, section_height);
        self.update(self.scroll)
    }
}

/// Eases displayed progress toward a target over `lag` seconds.
///
/// A lag of zero makes the follower transparent: the displayed value jumps to
/// each new target immediately.
#[derive(Debug, Clone)]
pub struct ScrubFollower {
    lag: f32,
    from: f32,
    target: f32,
    displayed: f32,
    elapsed: f32,
}

impl ScrubFollower {
    pub fn new(lag_seconds: f32) -> Self {
        Self {
            lag: if lag_seconds.is_finite() {
                lag_seconds.max(0.0)
            } else {
                0.0
            },
            from: 0.0,
            target: 0.0,
            displayed: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn lag(&self) -> f32 {
        self.lag
    }

    pub fn displayed(&self) -> f32 {
        self.displayed
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.displayed == self.target
    }

    /// Start catching up to a new target from the current displayed value.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
        if self.lag == 0.0 {
            self.displayed = target;
            return;
        }
        self.from = self.displayed;
        self.elapsed = 0.0;
    }

    /// Jump straight to `value`, dropping any catch-up in flight.
    pub fn snap(&mut self, value: f32) {
        self.from = value;
        self.target = value;
        self.displayed = value;
        self.elapsed = 0.0;
    }

    /// Advance by `delta` seconds and return the new displayed value.
    pub fn advance(&mut self, delta: f32) -> f32 {
        if self.is_settled() {
            return self.displayed;
        }
        self.elapsed += delta.max(0.0);
        if self.elapsed >= self.lag {
            self.displayed = self.target;
        } else {
            let e = Ease::Power3Out.sample(self.elapsed / self.lag);
            self.displayed = self.from * (1.0 - e) + self.target * e;
        }
        self.displayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_maps_section_extent() {
        let mut trigger = ScrollTrigger::new(0.0, 1000.0);
        assert_eq!(trigger.update(0.0).progress, 0.0);
        assert_eq!(trigger.update(250.0).progress, 0.25);
        assert_eq!(trigger.update(1000.0).progress, 1.0);
        assert_eq!(trigger.update(5000.0).progress, 1.0);
        assert_eq!(trigger.update(-40.0).progress, 0.0);
    }

    #[test]
    fn test_first_update_at_top_enters() {
        let mut trigger = ScrollTrigger::new(0.0, 1080.0);
        let update = trigger.update(0.0);
        assert_eq!(update.events, vec![TriggerEvent::Enter]);
        assert_eq!(update.pin, PinState::Pinned { offset: 0.0 });
    }

    #[test]
    fn test_boundary_events_in_order() {
        let mut trigger = ScrollTrigger::new(100.0, 500.0);
        assert!(trigger.update(0.0).events.is_empty());
        assert_eq!(trigger.update(150.0).events, vec![TriggerEvent::Enter]);
        assert!(trigger.update(300.0).events.is_empty());
        assert_eq!(trigger.update(700.0).events, vec![TriggerEvent::Leave]);
        assert_eq!(trigger.update(550.0).events, vec![TriggerEvent::EnterBack]);
        assert_eq!(trigger.update(50.0).events, vec![TriggerEvent::LeaveBack]);
    }

    #[test]
    fn test_jump_across_range_reports_both_crossings() {
        let mut trigger = ScrollTrigger::new(100.0, 500.0);
        trigger.update(0.0);
        assert_eq!(
            trigger.update(2000.0).events,
            vec![TriggerEvent::Enter, TriggerEvent::Leave]
        );
        assert_eq!(
            trigger.update(0.0).events,
            vec![TriggerEvent::EnterBack, TriggerEvent::LeaveBack]
        );
    }

    #[test]
    fn test_pin_offsets() {
        let mut trigger = ScrollTrigger::new(0.0, 800.0);
        assert_eq!(trigger.update(300.0).pin, PinState::Pinned { offset: 300.0 });
        assert_eq!(trigger.update(1200.0).pin, PinState::After { offset: 800.0 });
        assert!(!trigger.update(1200.0).pin.is_pinned());
    }

    #[test]
    fn test_refresh_keeps_progress_a_function_of_scroll() {
        let mut trigger = ScrollTrigger::new(0.0, 1000.0);
        trigger.update(500.0);
        let update = trigger.refresh(0.0, 2000.0);
        assert_eq!(update.progress, 0.25);
        assert!(update.events.is_empty());

        let mut fresh = ScrollTrigger::new(0.0, 2000.0);
        assert_eq!(fresh.update(500.0).progress, update.progress);
    }

    #[test]
    fn test_refresh_can_cross_boundary() {
        let mut trigger = ScrollTrigger::new(0.0, 1000.0);
        trigger.update(900.0);
        let update = trigger.refresh(0.0, 600.0);
        assert_eq!(update.events, vec![TriggerEvent::Leave]);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_zero_height_section() {
        let mut trigger = ScrollTrigger::new(10.0, 0.0);
        assert_eq!(trigger.update(5.0).progress, 0.0);
        assert_eq!(trigger.update(10.0).progress, 1.0);
    }

    #[test]
    fn test_non_finite_scroll_ignored() {
        let mut trigger = ScrollTrigger::new(0.0, 100.0);
        trigger.update(40.0);
        assert_eq!(trigger.update(f64::NAN).progress, 0.4);
    }

    #[test]
    fn test_follower_without_lag_is_immediate() {
        let mut follower = ScrubFollower::new(0.0);
        follower.set_target(0.6);
        assert_eq!(follower.displayed(), 0.6);
        assert!(follower.is_settled());
        assert_eq!(follower.advance(0.016), 0.6);
    }

    #[test]
    fn test_follower_settles_exactly() {
        let mut follower = ScrubFollower::new(2.0);
        follower.set_target(1.0);
        let mut previous = 0.0;
        for _ in 0..60 {
            let value = follower.advance(0.016);
            assert!(value >= previous && value < 1.0);
            previous = value;
        }
        follower.advance(5.0);
        assert_eq!(follower.displayed(), 1.0);
        assert!(follower.is_settled());
    }

    #[test]
    fn test_follower_retargets_from_displayed_value() {
        let mut follower = ScrubFollower::new(1.0);
        follower.set_target(1.0);
        let midway = follower.advance(0.5);
        follower.set_target(0.0);
        let next = follower.advance(0.0);
        assert_eq!(next, midway);
        follower.advance(1.0);
        assert_eq!(follower.displayed(), 0.0);
    }

    #[test]
    fn test_snap_drops_catch_up() {
        let mut follower = ScrubFollower::new(2.0);
        follower.set_target(1.0);
        follower.advance(0.1);
        follower.snap(0.3);
        assert_eq!(follower.displayed(), 0.3);
        assert_eq!(follower.advance(1.0), 0.3);
    }

    #[test]
    fn test_negative_lag_treated_as_zero() {
        assert_eq!(ScrubFollower::new(-1.0).lag(), 0.0);
        assert_eq!(ScrubFollower::new(f32::INFINITY).lag(), 0.0);
    }
}
