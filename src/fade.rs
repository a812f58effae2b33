//! Opacity curves for level-of-detail transitions.
//!
//! Chunks that appear or retire fade over a couple of seconds; the resulting
//! opacity feeds [`crate::PerDrawState::opacity`] and so the dither gate.

use std::time::{Duration, Instant};

pub const DEFAULT_FADE: Duration = Duration::from_secs(2);

/// Hermite smoothstep on [0, 1]: slow start, fast middle, slow end.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn fade_in_opacity(elapsed: Duration, duration: Duration) -> f32 {
    smoothstep(progress(elapsed, duration))
}

pub fn fade_out_opacity(elapsed: Duration, duration: Duration) -> f32 {
    1.0 - smoothstep(progress(elapsed, duration))
}

fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    elapsed.as_secs_f32() / duration.as_secs_f32()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// A fade in progress for one draw.
#[derive(Debug, Clone, Copy)]
pub struct FadeState {
    pub start: Instant,
    pub duration: Duration,
    pub direction: FadeDirection,
}

impl FadeState {
    pub fn fade_in(start: Instant) -> Self {
        Self {
            start,
            duration: DEFAULT_FADE,
            direction: FadeDirection::In,
        }
    }

    pub fn fade_out(start: Instant) -> Self {
        Self {
            start,
            duration: DEFAULT_FADE,
            direction: FadeDirection::Out,
        }
    }

    pub fn opacity_at(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        match self.direction {
            FadeDirection::In => fade_in_opacity(elapsed, self.duration),
            FadeDirection::Out => fade_out_opacity(elapsed, self.duration),
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }
}
