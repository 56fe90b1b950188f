//! Scroll-scrubbed property timeline.
//!
//! A [`Timeline`] is a list of [`Tween`]s that all read the same progress
//! value. Evaluating it is a pure function of progress: the same input always
//! yields the same [`HeroFrame`], no matter which progress values came before.

use glam::Vec3;

use crate::camera::INITIAL_POSITION;

/// Easing curve applied to a tween's local progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    /// Cubic ease-out, `1 - (1 - t)^3`.
    Power2Out,
    /// Quartic ease-out, `1 - (1 - t)^4`.
    Power3Out,
}

impl Ease {
    /// Evaluate the curve at `t` (clamped to `[0, 1]`).
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power2Out => 1.0 - (1.0 - t).powi(3),
            Self::Power3Out => 1.0 - (1.0 - t).powi(4),
        }
    }
}

/// A property a tween writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenTarget {
    ContentOpacity,
    ContentBlur,
    ContentTranslateY,
    ContentScale,
    GroupPositionY,
    /// Uniform scale on all three axes.
    GroupScale,
    CameraPositionY,
    CameraPositionZ,
}

/// Interpolates one property between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub target: TweenTarget,
    pub from: f32,
    pub to: f32,
    pub ease: Ease,
    /// Timeline-local start.
    pub offset: f32,
    pub duration: f32,
}

impl Tween {
    pub fn new(target: TweenTarget, from: f32, to: f32, ease: Ease) -> Self {
        Self {
            target,
            from,
            to,
            ease,
            offset: 0.0,
            duration: 1.0,
        }
    }

    pub fn end(&self) -> f32 {
        self.offset + self.duration
    }

    /// Value at timeline-local time `time`.
    ///
    /// Written as `from * (1 - e) + to * e` so `e == 0` and `e == 1` return
    /// the endpoints bit for bit.
    pub fn value_at(&self, time: f32) -> f32 {
        let local = if self.duration > 0.0 {
            (time - self.offset) / self.duration
        } else if time >= self.offset {
            1.0
        } else {
            0.0
        };
        let e = self.ease.sample(local);
        self.from * (1.0 - e) + self.to * e
    }
}

/// Style applied to the foreground content layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentStyle {
    pub opacity: f32,
    pub blur_px: f32,
    pub translate_y_px: f32,
    pub scale: f32,
    /// False exactly when opacity has reached zero.
    pub visible: bool,
}

impl ContentStyle {
    pub const REST: Self = Self {
        opacity: 1.0,
        blur_px: 0.0,
        translate_y_px: 0.0,
        scale: 1.0,
        visible: true,
    };
}

impl Default for ContentStyle {
    fn default() -> Self {
        Self::REST
    }
}

/// All animated values at one progress point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroFrame {
    pub camera_position: Vec3,
    pub group_position: Vec3,
    pub group_scale: Vec3,
    pub content: ContentStyle,
}

impl HeroFrame {
    pub const REST: Self = Self {
        camera_position: INITIAL_POSITION,
        group_position: Vec3::ZERO,
        group_scale: Vec3::ONE,
        content: ContentStyle::REST,
    };

    fn apply(&mut self, target: TweenTarget, value: f32) {
        match target {
            TweenTarget::ContentOpacity => self.content.opacity = value,
            TweenTarget::ContentBlur => self.content.blur_px = value,
            TweenTarget::ContentTranslateY => self.content.translate_y_px = value,
            TweenTarget::ContentScale => self.content.scale = value,
            TweenTarget::GroupPositionY => self.group_position.y = value,
            TweenTarget::GroupScale => self.group_scale = Vec3::splat(value),
            TweenTarget::CameraPositionY => self.camera_position.y = value,
            TweenTarget::CameraPositionZ => self.camera_position.z = value,
        }
    }
}

impl Default for HeroFrame {
    fn default() -> Self {
        Self::REST
    }
}

/// An ordered set of tweens scrubbed by one progress value.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    tweens: Vec<Tween>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hero sequence: content fades and blurs away while the globe rises
    /// and shrinks and the camera pulls back.
    pub fn hero() -> Self {
        use TweenTarget::*;

        let rest = HeroFrame::REST;
        Self::new()
            .with(Tween::new(ContentOpacity, 1.0, 0.0, Ease::Power2Out))
            .with(Tween::new(ContentBlur, 0.0, 40.0, Ease::Power2Out))
            .with(Tween::new(ContentTranslateY, 0.0, -80.0, Ease::Power2Out))
            .with(Tween::new(ContentScale, 1.0, 0.8, Ease::Power2Out))
            .with(Tween::new(GroupPositionY, 0.0, 6.0, Ease::Power3Out))
            .with(Tween::new(
                CameraPositionZ,
                rest.camera_position.z,
                18.0,
                Ease::Power3Out,
            ))
            .with(Tween::new(
                CameraPositionY,
                rest.camera_position.y,
                6.0,
                Ease::Power3Out,
            ))
            .with(Tween::new(GroupScale, 1.0, 0.85, Ease::Power2Out))
    }

    pub fn with(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Length of the timeline in local time units.
    pub fn duration(&self) -> f32 {
        self.tweens.iter().map(Tween::end).fold(0.0, f32::max)
    }

    /// Evaluate every tween at `progress` (clamped to `[0, 1]`, NaN treated as 0).
    pub fn evaluate(&self, progress: f32) -> HeroFrame {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let time = progress * self.duration();

        let mut frame = HeroFrame::REST;
        for tween in &self.tweens {
            frame.apply(tween.target, tween.value_at(time));
        }
        frame.content.visible = frame.content.opacity > 0.0;
        frame
    }
}
