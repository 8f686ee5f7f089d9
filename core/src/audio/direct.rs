//! Direct (fallback) audio path
//!
//! Used when the real-time renderer cannot be constructed. There is no
//! request protocol and no queue: each device callback reads whatever batch
//! the main context published last and spreads it across the device's
//! channels. Gaps between batches are heard as silence.

use std::sync::{Arc, Mutex, TryLockError};

use super::SamplePublisher;

#[derive(Debug, Default)]
struct Slot {
    samples: Vec<f32>,
    generation: u64,
    volume: f32,
}

/// Most recently published batch, shared with the direct callback
#[derive(Debug, Clone)]
pub struct LatestBatch {
    slot: Arc<Mutex<Slot>>,
}

impl LatestBatch {
    pub fn new(volume: f32) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                samples: Vec::new(),
                generation: 0,
                volume: volume.clamp(0.0, 1.0),
            })),
        }
    }

    /// Replace the batch. The previous batch is discarded even if unplayed.
    pub fn store(&self, samples: &[f32]) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.samples.clear();
        slot.samples.extend_from_slice(samples);
        slot.generation += 1;
    }

    pub fn set_volume(&self, volume: f32) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.volume = volume.clamp(0.0, 1.0);
    }

    /// Number of batches stored so far
    pub fn generation(&self) -> u64 {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).generation
    }
}

impl SamplePublisher for LatestBatch {
    fn publish(&mut self, samples: &[f32]) {
        self.store(samples);
    }
}

/// Callback-side reader for the direct path.
///
/// Converts the core's interleaved stereo at `source_rate` into the device's
/// channel layout at `device_rate` using nearest-sample stepping.
pub struct DirectRenderer {
    latest: LatestBatch,
    /// Local copy of the batch being played
    local: Vec<f32>,
    seen_generation: u64,
    volume: f32,
    /// Read position in stereo frames
    cursor: f64,
    step: f64,
    underruns: u64,
}

impl DirectRenderer {
    pub fn new(latest: LatestBatch, source_rate: u32, device_rate: u32) -> Self {
        Self {
            latest,
            local: Vec::new(),
            seen_generation: 0,
            volume: 1.0,
            cursor: 0.0,
            step: source_rate as f64 / device_rate.max(1) as f64,
            underruns: 0,
        }
    }

    /// Pick up a newer batch if one was published. Never waits: if the main
    /// context holds the slot, the current batch keeps playing.
    fn refresh(&mut self) {
        let slot = match self.latest.slot.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        self.volume = slot.volume;
        if slot.generation != self.seen_generation {
            self.seen_generation = slot.generation;
            self.local.clear();
            self.local.extend_from_slice(&slot.samples);
            self.cursor = 0.0;
        }
    }

    fn next_pair(&mut self) -> (f32, f32) {
        let index = self.cursor as usize * 2;
        match self.local.get(index..index + 2) {
            Some(pair) => {
                self.cursor += self.step;
                (pair[0] * self.volume, pair[1] * self.volume)
            }
            None => {
                self.underruns += 1;
                (0.0, 0.0)
            }
        }
    }

    /// Fill an interleaved device buffer with `channels` channels.
    ///
    /// Mono devices get the average of left and right; channels beyond the
    /// second are silent.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        self.refresh();
        let channels = channels.max(1);
        let mut frames = out.chunks_exact_mut(channels);
        for frame in &mut frames {
            let (left, right) = self.next_pair();
            match frame {
                [mono] => *mono = (left + right) * 0.5,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
        // A trailing partial frame is silence
        frames.into_remainder().fill(0.0);
    }

    /// Output frames that had no sample to play
    pub fn underruns(&self) -> u64 {
        self.underruns
    }
}
