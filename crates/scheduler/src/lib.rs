use std::time::{Duration, Instant};

use tracing::warn;

/// Highest frame rate the preview is driven at.
pub const MAX_FPS: f32 = 30.0;

/// Slack that lets a tick arriving marginally early still count as due.
const EARLY_TOLERANCE: Duration = Duration::from_micros(250);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error("frame rate must be a positive number, got {0}")]
    InvalidRate(f32),
}

/// Paces the render loop at a fixed rate, carrying lateness forward so the
/// average cadence holds even when individual ticks wake up late.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    fps: f32,
    interval: Duration,
    accumulator: Duration,
    last_tick: Option<Instant>,
    frames: u64,
}

impl FrameScheduler {
    /// Rates above [`MAX_FPS`] are clamped with a warning.
    pub fn new(fps: f32) -> Result<Self, SchedulerError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(SchedulerError::InvalidRate(fps));
        }
        let fps = if fps > MAX_FPS {
            warn!(requested = fps, cap = MAX_FPS, "frame rate above cap; clamping");
            MAX_FPS
        } else {
            fps
        };
        Ok(Self {
            fps,
            interval: Duration::from_secs_f32(1.0 / fps),
            accumulator: Duration::ZERO,
            last_tick: None,
            frames: 0,
        })
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames handed out so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns `true` when a frame is due at `now`. The first call is always due.
    pub fn ready_for_frame(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_tick else {
            self.mark_rendered(now);
            return true;
        };
        let delta = now.saturating_duration_since(last);
        self.last_tick = Some(now);
        self.accumulator = self.accumulator.saturating_add(delta);
        if self.accumulator + EARLY_TOLERANCE < self.interval {
            return false;
        }
        self.accumulator = self.accumulator.saturating_sub(self.interval);
        // A long stall must not turn into a burst of catch-up frames.
        if self.accumulator > self.interval {
            self.accumulator = Duration::ZERO;
        }
        self.frames += 1;
        true
    }

    fn mark_rendered(&mut self, now: Instant) {
        self.last_tick = Some(now);
        self.accumulator = Duration::ZERO;
        self.frames += 1;
    }

    /// When the event loop should wake up next.
    pub fn next_deadline(&self, now: Instant) -> Instant {
        match self.last_tick {
            Some(last) => {
                let owed = self.interval.saturating_sub(self.accumulator);
                (last + owed).max(now)
            }
            None => now,
        }
    }

    /// Forgets pacing history, e.g. after the window was hidden.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last_tick = None;
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self {
            fps: MAX_FPS,
            interval: Duration::from_secs_f32(1.0 / MAX_FPS),
            accumulator: Duration::ZERO,
            last_tick: None,
            frames: 0,
        }
    }
}
