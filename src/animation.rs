use std::time::Duration;

use serde::Deserialize;

use crate::error::SpriteError;

/// What happens to time accumulated past the frame period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Reset the accumulator to zero on every advance.
    #[default]
    Discard,
    /// Keep the remainder for the next period (at most one advance per call).
    Carry,
}

/// Result of feeding elapsed time into the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    NoTrigger,
    /// The clock moved on; carries the new frame index.
    Triggered(usize),
}

/// Fixed-period frame stepper.
///
/// Time is in seconds. `accumulator` stays in `[0, period)` after every call
/// to [`AnimationClock::advance`].
#[derive(Clone, Debug)]
pub struct AnimationClock {
    frame_count: usize,
    current_frame: usize,
    accumulator: f64,
    period: f64,
    overflow: OverflowPolicy,
}

impl AnimationClock {
    pub fn new(frame_count: usize, period: f64) -> Result<Self, SpriteError> {
        if frame_count == 0 {
            return Err(SpriteError::InvalidInput("animation needs at least one frame".into()));
        }
        if !period.is_finite() || period <= 0.0 {
            return Err(SpriteError::InvalidInput(format!(
                "frame period must be positive, got {period}"
            )));
        }

        Ok(Self {
            frame_count,
            current_frame: 0,
            accumulator: 0.0,
            period,
            overflow: OverflowPolicy::Discard,
        })
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn advance(&mut self, dt: f64) -> Result<Advance, SpriteError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SpriteError::InvalidInput(format!(
                "time delta must be non-negative, got {dt}"
            )));
        }

        self.accumulator += dt;
        if self.accumulator < self.period {
            return Ok(Advance::NoTrigger);
        }

        self.accumulator = match self.overflow {
            OverflowPolicy::Discard => 0.0,
            OverflowPolicy::Carry => (self.accumulator - self.period) % self.period,
        };
        self.current_frame = (self.current_frame + 1) % self.frame_count;

        Ok(Advance::Triggered(self.current_frame))
    }

    pub fn advance_by(&mut self, dt: Duration) -> Advance {
        // Duration is never negative or non-finite.
        self.advance(dt.as_secs_f64()).unwrap_or(Advance::NoTrigger)
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.accumulator = 0.0;
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }
}
