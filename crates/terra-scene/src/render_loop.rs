//! Per-frame callback registration and planet spin.

use crate::ticker::{FrameHandle, FrameScheduler, LagSmoothing};

/// Planet spin about Y, in radians per second.
pub const ROTATION_SPEED: f64 = 0.2;

/// Planet rotation for an elapsed time. No wrapping or smoothing, so the
/// difference between two frames is always `ROTATION_SPEED * dt`.
pub fn planet_rotation(elapsed_secs: f64) -> f32 {
    (elapsed_secs * ROTATION_SPEED) as f32
}

/// Owns the scheduler registration of a mounted view.
#[derive(Debug, Default)]
pub struct RenderLoop {
    handle: Option<FrameHandle>,
    previous_smoothing: Option<LagSmoothing>,
}

impl RenderLoop {
    /// Register with the scheduler. Lag smoothing is switched off while the
    /// loop runs so rotation follows real elapsed time; [`RenderLoop::stop`]
    /// puts the scheduler's previous policy back.
    pub fn start(scheduler: &mut impl FrameScheduler) -> Self {
        let previous_smoothing = scheduler.lag_smoothing();
        scheduler.set_lag_smoothing(None);
        Self {
            handle: Some(scheduler.register()),
            previous_smoothing,
        }
    }

    pub fn handle(&self) -> Option<FrameHandle> {
        self.handle
    }

    pub fn is_running(&self, scheduler: &impl FrameScheduler) -> bool {
        self.handle.is_some_and(|h| scheduler.is_registered(h))
    }

    /// Unregister. Safe to call more than once.
    pub fn stop(&mut self, scheduler: &mut impl FrameScheduler) {
        if let Some(handle) = self.handle.take() {
            scheduler.unregister(handle);
            scheduler.set_lag_smoothing(self.previous_smoothing);
        }
    }
}
