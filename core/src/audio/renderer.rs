//! Real-time half of the audio bridge
//!
//! Runs inside the device callback. It never blocks and never waits on the
//! main context: when its queue runs dry it emits silence and counts the gap.
//! The queue holds samples at the core's rate; output is produced at the
//! device's rate by nearest-sample stepping.

use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, TrySendError};

use retrosync_shared::{ToMain, ToRenderer};
use tracing::trace;

use super::config::WaterMarks;
use super::metrics::RendererMetrics;
use super::queue::SampleQueue;

/// Renderer-side buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// Queue empty; waiting for the first batch or recovering from underrun
    AwaitingFill,
    /// Queue at or above the high-water mark
    Filled,
    /// Queue below the high-water mark, refill requested or in flight
    Draining,
}

/// Renderer half of the bridge.
///
/// Owns its queue copy and the receiving end of the main → renderer mailbox.
pub struct AudioRenderer {
    queue: SampleQueue,
    rx: Receiver<ToRenderer>,
    tx: SyncSender<ToMain>,
    marks: WaterMarks,
    volume: f32,
    request_pending: bool,
    state: RendererState,
    connected: bool,
    low_logged: bool,
    metrics: RendererMetrics,
    /// Source pairs advanced per output frame
    step: f64,
    /// Position within `current`, in source pairs
    phase: f64,
    /// Source pair being played
    current: Option<(f32, f32)>,
}

impl AudioRenderer {
    /// Create a renderer and post the initial refill request
    pub(super) fn new(
        rx: Receiver<ToRenderer>,
        tx: SyncSender<ToMain>,
        marks: WaterMarks,
        volume: f32,
        source_rate: u32,
        device_rate: u32,
    ) -> Self {
        let mut renderer = Self {
            queue: SampleQueue::new(marks.hard_cap),
            rx,
            tx,
            marks,
            volume: volume.clamp(0.0, 1.0),
            request_pending: false,
            state: RendererState::AwaitingFill,
            connected: true,
            low_logged: false,
            metrics: RendererMetrics::new(device_rate),
            step: source_rate.max(1) as f64 / device_rate.max(1) as f64,
            phase: 0.0,
            current: None,
        };
        renderer.request_refill();
        renderer
    }

    /// Fill one render quantum of interleaved stereo output.
    pub fn render(&mut self, out: &mut [f32]) {
        self.render_interleaved(out, 2);
    }

    /// Fill one render quantum for a device with `channels` interleaved
    /// channels.
    ///
    /// Frames that cannot be served from the queue are filled with silence;
    /// each one counts as one underrun. Mono devices get the average of left
    /// and right, channels beyond the second are silent, and a trailing
    /// partial frame is silenced without consuming a pair.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        self.drain_mailbox();

        let channels = channels.max(1);
        let mut frames = 0u64;
        let mut missing = 0u64;
        let mut chunks = out.chunks_exact_mut(channels);
        for frame in &mut chunks {
            frames += 1;
            match self.next_pair() {
                Some((left, right)) => match frame {
                    [mono] => *mono = (left + right) * 0.5 * self.volume,
                    [l, r, rest @ ..] => {
                        *l = left * self.volume;
                        *r = right * self.volume;
                        rest.fill(0.0);
                    }
                    [] => {}
                },
                None => {
                    frame.fill(0.0);
                    missing += 1;
                }
            }
        }
        chunks.into_remainder().fill(0.0);

        if missing > 0 {
            self.metrics.record_underruns(missing);
            self.request_refill();
        }

        let depth = self.queue.len();
        self.metrics.record_depth(depth);
        if depth < self.marks.low {
            if !self.low_logged {
                trace!("Audio queue low: {} samples", depth);
                self.low_logged = true;
            }
        } else {
            self.low_logged = false;
        }

        self.update_state();

        if let Some(health) = self.metrics.advance(frames, depth) {
            self.post(ToMain::Health(health));
        }
    }

    /// Source pair for the next output frame, popping as the phase crosses
    /// pair boundaries. `None` when the queue ran dry.
    fn next_pair(&mut self) -> Option<(f32, f32)> {
        while self.current.is_none() || self.phase >= 1.0 {
            let pair = self.queue.pop_pair();
            if self.queue.len() < self.marks.high {
                self.request_refill();
            }
            match pair {
                Some(pair) => {
                    self.current = Some(pair);
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                    }
                }
                None => {
                    self.current = None;
                    return None;
                }
            }
        }
        self.phase += self.step;
        self.current
    }

    /// Apply every message that has arrived, in order
    fn drain_mailbox(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(ToRenderer::Samples(batch)) => {
                    let dropped = self.queue.push_batch(&batch);
                    if dropped > 0 {
                        self.metrics.record_overrun(dropped);
                    }
                    self.request_pending = false;
                }
                Ok(ToRenderer::SetVolume(volume)) => {
                    self.volume = volume.clamp(0.0, 1.0);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.connected = false;
                    break;
                }
            }
        }
    }

    /// Ask the main context for more samples unless a request is outstanding
    fn request_refill(&mut self) {
        if self.request_pending || !self.connected {
            return;
        }
        if self.post(ToMain::RequestSamples) {
            self.request_pending = true;
            self.metrics.record_request();
        }
    }

    fn post(&mut self, message: ToMain) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                self.connected = false;
                false
            }
        }
    }

    fn update_state(&mut self) {
        let depth = self.queue.len();
        self.state = if depth == 0 {
            RendererState::AwaitingFill
        } else if depth >= self.marks.high {
            RendererState::Filled
        } else {
            RendererState::Draining
        };
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Samples currently queued on the renderer side
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_request_pending(&self) -> bool {
        self.request_pending
    }

    /// Whether the main half still exists
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Underruns (output frames filled with silence) since creation
    pub fn total_underruns(&self) -> u64 {
        self.metrics.total_underruns
    }

    /// Refill requests sent since creation
    pub fn total_requests(&self) -> u64 {
        self.metrics.total_requests
    }
}
