//! Audio bridge configuration

use serde::{Deserialize, Serialize};

use super::AudioError;

/// Audio configuration.
///
/// Buffer thresholds are expressed in milliseconds of stereo playback and
/// converted to sample counts at the stream's rate by [`AudioConfig::water_marks`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Whether audio output is started at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Master volume level (default: 0.8, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Renderer queue depth that logs a low-buffer warning (default: 50ms)
    #[serde(default = "default_low_water_ms")]
    pub low_water_ms: u32,
    /// Renderer queue depth under which a refill is requested (default: 160ms)
    #[serde(default = "default_high_water_ms")]
    pub high_water_ms: u32,
    /// Maximum samples held on either side of the boundary (default: 500ms)
    #[serde(default = "default_hard_cap_ms")]
    pub hard_cap_ms: u32,
    /// Messages buffered in each mailbox direction (default: 16)
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// Device buffer size in frames; `None` lets the host choose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_frames: Option<u32>,
    /// Skip the real-time renderer and use direct output (default: false)
    #[serde(default)]
    pub force_direct: bool,
}

fn default_true() -> bool {
    true
}
fn default_volume() -> f32 {
    0.8
}
fn default_low_water_ms() -> u32 {
    50
}
fn default_high_water_ms() -> u32 {
    160
}
fn default_hard_cap_ms() -> u32 {
    500
}
fn default_mailbox_capacity() -> usize {
    16
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            volume: default_volume(),
            low_water_ms: default_low_water_ms(),
            high_water_ms: default_high_water_ms(),
            hard_cap_ms: default_hard_cap_ms(),
            mailbox_capacity: default_mailbox_capacity(),
            buffer_frames: None,
            force_direct: false,
        }
    }
}

/// Queue thresholds in interleaved samples (always even)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterMarks {
    /// Depth under which the renderer logs a low-buffer warning
    pub low: usize,
    /// Depth under which the renderer requests a refill
    pub high: usize,
    /// Maximum queue length on either side
    pub hard_cap: usize,
}

impl WaterMarks {
    /// Build marks from explicit sample counts, checking their ordering
    pub fn new(low: usize, high: usize, hard_cap: usize) -> Result<Self, AudioError> {
        let marks = Self {
            low: low & !1,
            high: high & !1,
            hard_cap: hard_cap & !1,
        };
        if marks.low < marks.high && marks.high < marks.hard_cap {
            Ok(marks)
        } else {
            Err(AudioError::InvalidConfig(format!(
                "water marks must satisfy low < high < cap (got {} / {} / {})",
                marks.low, marks.high, marks.hard_cap
            )))
        }
    }
}

impl AudioConfig {
    /// Thresholds in samples for a stereo stream at `sample_rate`
    pub fn water_marks(&self, sample_rate: u32) -> Result<WaterMarks, AudioError> {
        let samples = |ms: u32| (sample_rate as u64 * ms as u64 / 1000) as usize * 2;
        WaterMarks::new(
            samples(self.low_water_ms),
            samples(self.high_water_ms),
            samples(self.hard_cap_ms),
        )
    }

    /// Check the threshold ordering and ranges
    pub fn validate(&self) -> Result<(), AudioError> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(AudioError::InvalidConfig(format!(
                "volume {} outside 0.0-1.0",
                self.volume
            )));
        }
        if self.mailbox_capacity == 0 {
            return Err(AudioError::InvalidConfig(
                "mailbox capacity must be at least 1".to_string(),
            ));
        }
        if !(self.low_water_ms < self.high_water_ms && self.high_water_ms < self.hard_cap_ms) {
            return Err(AudioError::InvalidConfig(format!(
                "water marks must satisfy low < high < cap (got {}ms / {}ms / {}ms)",
                self.low_water_ms, self.high_water_ms, self.hard_cap_ms
            )));
        }
        Ok(())
    }
}
