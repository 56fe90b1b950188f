//! Frame scheduling with a substitutable clock.
//!
//! [`Ticker`] produces one [`FrameTick`] per display refresh while at least
//! one [`FrameHandle`] is registered. Time is measured from ticker creation.
//! Long gaps between frames can optionally be hidden by [`LagSmoothing`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since some fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Identifies a registered per-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Policy for hiding long frame gaps.
///
/// When the gap between two ticks exceeds `threshold`, the time base is
/// shifted so the gap appears to have lasted only `adjusted_lag`. An
/// `adjusted_lag` above `threshold` is treated as `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagSmoothing {
    pub threshold: Duration,
    pub adjusted_lag: Duration,
}

impl Default for LagSmoothing {
    fn default() -> Self {
        Self {
            threshold: Duration::from_millis(500),
            adjusted_lag: Duration::from_millis(33),
        }
    }
}

/// One frame's timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the ticker started, after any lag smoothing.
    pub time: f64,
    /// Seconds since the previous tick.
    pub delta: f64,
    /// Frame counter, starting at 1.
    pub frame: u64,
}

/// Registration interface for per-frame callbacks.
pub trait FrameScheduler {
    fn register(&mut self) -> FrameHandle;
    /// Returns whether the handle was registered.
    fn unregister(&mut self, handle: FrameHandle) -> bool;
    fn is_registered(&self, handle: FrameHandle) -> bool;
    /// `None` disables smoothing so frame time always tracks the clock.
    fn set_lag_smoothing(&mut self, smoothing: Option<LagSmoothing>);
    fn lag_smoothing(&self) -> Option<LagSmoothing>;
}

/// Frame scheduler driven by a [`Clock`].
#[derive(Debug)]
pub struct Ticker<C: Clock> {
    clock: C,
    origin: Duration,
    shift: Duration,
    last_raw: Duration,
    last_time: f64,
    frame: u64,
    next_id: u64,
    handles: Vec<FrameHandle>,
    lag_smoothing: Option<LagSmoothing>,
}

impl<C: Clock> Ticker<C> {
    pub fn new(clock: C) -> Self {
        let origin = clock.now();
        Self {
            clock,
            origin,
            shift: Duration::ZERO,
            last_raw: origin,
            last_time: 0.0,
            frame: 0,
            next_id: 0,
            handles: Vec::new(),
            lag_smoothing: Some(LagSmoothing::default()),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn has_listeners(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Produce the next frame, or `None` when nothing is registered.
    pub fn tick(&mut self) -> Option<FrameTick> {
        if self.handles.is_empty() {
            return None;
        }

        let raw = self.clock.now();
        let gap = raw.saturating_sub(self.last_raw);
        self.last_raw = raw;

        if let Some(smoothing) = self.lag_smoothing
            && gap > smoothing.threshold
        {
            let adjusted = smoothing.adjusted_lag.min(smoothing.threshold);
            self.shift += gap.saturating_sub(adjusted);
            tracing::trace!(gap_ms = gap.as_millis() as u64, "lag smoothing applied");
        }

        let time = raw
            .saturating_sub(self.origin)
            .saturating_sub(self.shift)
            .as_secs_f64();
        let delta = (time - self.last_time).max(0.0);
        self.last_time = time;
        self.frame += 1;

        Some(FrameTick {
            time,
            delta,
            frame: self.frame,
        })
    }
}

impl<C: Clock> FrameScheduler for Ticker<C> {
    fn register(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.handles.push(handle);
        handle
    }

    fn unregister(&mut self, handle: FrameHandle) -> bool {
        let before = self.handles.len();
        self.handles.retain(|h| *h != handle);
        self.handles.len() != before
    }

    fn is_registered(&self, handle: FrameHandle) -> bool {
        self.handles.contains(&handle)
    }

    fn set_lag_smoothing(&mut self, smoothing: Option<LagSmoothing>) {
        self.lag_smoothing = smoothing;
    }

    fn lag_smoothing(&self) -> Option<LagSmoothing> {
        self.lag_smoothing
    }
}
