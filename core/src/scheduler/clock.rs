//! Frame clock with drift-capped reference timestamp

use std::time::{Duration, Instant};

/// Length of one FPS reporting window
pub const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Reference timestamp of the last accepted frame plus the FPS window.
///
/// The reference only ever moves by whole frame intervals (or is explicitly
/// re-anchored), so rounding in the host's refresh timestamps cannot
/// accumulate into long-term drift.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Instant,
    window_start: Instant,
    window_frames: u32,
}

impl FrameClock {
    /// Create a clock whose origin is `origin`
    pub fn new(origin: Instant) -> Self {
        Self {
            last_frame: origin,
            window_start: origin,
            window_frames: 0,
        }
    }

    /// Reference timestamp of the last accepted frame
    pub fn last_frame(&self) -> Instant {
        self.last_frame
    }

    /// Time since the last accepted frame (zero if `now` is earlier)
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_frame)
    }

    /// Accept one frame: move the reference forward by exactly `interval`
    pub fn advance(&mut self, interval: Duration) {
        self.last_frame += interval;
    }

    /// Drop any backlog and re-anchor the reference at `now`
    pub fn resync(&mut self, now: Instant) {
        self.last_frame = now;
    }

    /// Count a completed frame.
    ///
    /// Returns the observed FPS once a full window has elapsed, then starts a
    /// new window.
    pub fn count_frame(&mut self, now: Instant) -> Option<f32> {
        self.window_frames += 1;
        let window = now.saturating_duration_since(self.window_start);
        if window < FPS_WINDOW {
            return None;
        }
        let fps = self.window_frames as f32 / window.as_secs_f32();
        self.window_frames = 0;
        self.window_start = now;
        Some(fps)
    }
}
