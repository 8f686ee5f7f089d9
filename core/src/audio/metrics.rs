//! Renderer health monitoring

use retrosync_shared::RendererHealth;
use tracing::debug;

/// Per-window renderer counters.
///
/// Windows are measured in rendered stereo frames rather than wall-clock
/// time, since the renderer's only reliable clock is the device's sample
/// rate.
#[derive(Debug, Clone)]
pub(super) struct RendererMetrics {
    /// Frames in one reporting window (one second at the stream rate)
    window_frames: u64,
    /// Frames rendered in the current window
    frames: u64,
    underruns: u64,
    requests: u64,
    overruns: u64,
    min_depth: Option<usize>,
    /// Underruns since creation
    pub total_underruns: u64,
    /// Refill requests since creation
    pub total_requests: u64,
}

impl RendererMetrics {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            window_frames: sample_rate.max(1) as u64,
            frames: 0,
            underruns: 0,
            requests: 0,
            overruns: 0,
            min_depth: None,
            total_underruns: 0,
            total_requests: 0,
        }
    }

    pub fn record_depth(&mut self, depth: usize) {
        self.min_depth = Some(self.min_depth.map_or(depth, |min| min.min(depth)));
    }

    pub fn record_underruns(&mut self, frames: u64) {
        self.underruns += frames;
        self.total_underruns += frames;
    }

    pub fn record_request(&mut self) {
        self.requests += 1;
        self.total_requests += 1;
    }

    pub fn record_overrun(&mut self, samples: usize) {
        self.overruns += samples as u64;
    }

    /// Account for `frames` rendered frames.
    ///
    /// Returns a report and starts a new window once a full window has been
    /// rendered.
    pub fn advance(&mut self, frames: u64, depth: usize) -> Option<RendererHealth> {
        self.frames += frames;
        if self.frames < self.window_frames {
            return None;
        }

        let health = RendererHealth {
            underruns: self.underruns,
            min_depth: self.min_depth.unwrap_or(depth),
            requests: self.requests,
            overruns: self.overruns,
        };
        debug!(
            "AUDIO HEALTH: underruns={}, min_depth={}, requests={}, overruns={}, depth={}",
            health.underruns, health.min_depth, health.requests, health.overruns, depth
        );

        // Reset counters for next window
        self.frames = 0;
        self.underruns = 0;
        self.requests = 0;
        self.overruns = 0;
        self.min_depth = Some(depth);
        Some(health)
    }
}
