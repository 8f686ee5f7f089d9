//! Bounded stereo sample queue

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer};

/// FIFO of interleaved stereo samples with a hard capacity.
///
/// Only whole stereo pairs are ever stored or removed, so the length is
/// always even. Each side of the audio boundary owns its own queue.
pub struct SampleQueue {
    ring: HeapRb<f32>,
    capacity: usize,
}

impl SampleQueue {
    /// Create an empty queue holding at most `capacity` samples (rounded
    /// down to a whole pair, minimum one pair)
    pub fn new(capacity: usize) -> Self {
        let capacity = (capacity & !1).max(2);
        Self {
            ring: HeapRb::new(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a batch in order.
    ///
    /// A trailing odd sample and anything beyond the capacity are dropped.
    /// Returns the number of samples dropped.
    pub fn push_batch(&mut self, samples: &[f32]) -> usize {
        let whole = samples.len() & !1;
        let room = self.ring.vacant_len() & !1;
        let accepted = self.ring.push_slice(&samples[..whole.min(room)]);
        samples.len() - accepted
    }

    /// Remove the oldest stereo pair
    pub fn pop_pair(&mut self) -> Option<(f32, f32)> {
        if self.len() < 2 {
            return None;
        }
        let left = self.ring.try_pop()?;
        let right = self.ring.try_pop()?;
        Some((left, right))
    }

    /// Move as many whole pairs as fit into `out`, oldest first.
    /// Returns the number of samples written.
    pub fn drain_into(&mut self, out: &mut [f32]) -> usize {
        let len = out.len() & !1;
        self.ring.pop_slice(&mut out[..len])
    }

    /// Remove everything and return the samples in order
    pub fn take_all(&mut self) -> Vec<f32> {
        let mut batch = vec![0.0; self.len()];
        let written = self.drain_into(&mut batch);
        batch.truncate(written);
        batch
    }

    /// Discard all queued samples
    pub fn clear(&mut self) {
        self.ring = HeapRb::new(self.capacity);
    }
}
