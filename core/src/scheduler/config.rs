//! Scheduler configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Frame scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target frames per second; `None` uses the console's native rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Controller port the aggregated input is latched into (default: 0)
    #[serde(default)]
    pub input_port: usize,
    /// Warn when a single frame step takes longer than this (default: 12ms)
    #[serde(default = "default_cpu_budget_ms")]
    pub cpu_budget_ms: f64,
    /// Re-anchor the frame clock to "now" when the scheduler falls this far
    /// behind, instead of stepping through the backlog. Disabled by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resync_threshold_ms: Option<u64>,
}

fn default_cpu_budget_ms() -> f64 {
    12.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: None,
            input_port: 0,
            cpu_budget_ms: default_cpu_budget_ms(),
            resync_threshold_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// CPU budget as a duration
    pub fn cpu_budget(&self) -> Duration {
        Duration::from_secs_f64(self.cpu_budget_ms.max(0.0) / 1000.0)
    }

    /// Backlog after which the clock is re-anchored, if enabled
    pub fn resync_threshold(&self) -> Option<Duration> {
        self.resync_threshold_ms.map(Duration::from_millis)
    }
}

/// Time per frame at the given rate
pub fn frame_interval(frame_rate: f64) -> Duration {
    Duration::from_secs_f64(1.0 / frame_rate)
}
