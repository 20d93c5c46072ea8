//! Interpolated presentation motion for entities and sliding tiles.

use chipway_core::{Cell, MotionState};
use glam::Vec2;

const MIN_DURATION: f32 = 0.0001;

/// Easing curve applied to a motion's progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Easing {
    Linear,
    EaseInOutCubic,
}

impl Easing {
    pub(crate) fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// A single animation between two world positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Motion {
    start: Vec2,
    end: Vec2,
    elapsed: f32,
    duration: f32,
    easing: Easing,
    state: MotionState,
}

impl Motion {
    pub(crate) fn step(start: Vec2, end: Vec2, duration: f32) -> Self {
        Self::new(start, end, duration, Easing::Linear, MotionState::Moving)
    }

    pub(crate) fn dash(start: Vec2, end: Vec2, duration: f32) -> Self {
        Self::new(start, end, duration, Easing::EaseInOutCubic, MotionState::Dashing)
    }

    fn new(start: Vec2, end: Vec2, duration: f32, easing: Easing, state: MotionState) -> Self {
        Self {
            start,
            end,
            elapsed: 0.0,
            duration: duration.max(MIN_DURATION),
            easing,
            state,
        }
    }

    /// Advances the animation and reports whether it finished.
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.elapsed >= self.duration
    }

    pub(crate) fn position(&self) -> Vec2 {
        let t = self.easing.apply(self.elapsed / self.duration);
        self.start.lerp(self.end, t)
    }

    pub(crate) fn state(&self) -> MotionState {
        self.state
    }

    pub(crate) fn end(&self) -> Vec2 {
        self.end
    }
}

/// Presentation of a moveable tile sliding after a push.
///
/// The tile layer already holds the tile at `to`; the slide only animates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSlide {
    pub(crate) from: Cell,
    pub(crate) to: Cell,
    pub(crate) motion: Motion,
}

impl TileSlide {
    /// Cell the tile left.
    #[must_use]
    pub fn from(&self) -> Cell {
        self.from
    }

    /// Cell the tile now occupies.
    #[must_use]
    pub fn to(&self) -> Cell {
        self.to
    }

    /// Interpolated world position of the tile.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.motion.position()
    }
}
