//! Main-context half of the audio bridge

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use retrosync_shared::{RendererHealth, ToMain, ToRenderer};
use tracing::{debug, warn};

use super::config::WaterMarks;
use super::queue::SampleQueue;
use super::renderer::AudioRenderer;
use super::{AudioConfig, AudioError, AudioOutput, SamplePublisher};

/// Create a connected bridge/renderer pair for a core producing stereo at
/// `source_rate` and a device playing at `device_rate`.
///
/// Water marks are measured in queued samples, so they are converted at the
/// source rate. The renderer posts its first refill request immediately, so
/// the first `pump` after the first `publish` forwards audio.
pub fn bridge_pair(
    config: &AudioConfig,
    source_rate: u32,
    device_rate: u32,
) -> Result<(AudioBridge, AudioRenderer), AudioError> {
    config.validate()?;
    let marks = config.water_marks(source_rate)?;
    Ok(bridge_pair_with_marks(
        marks,
        config.mailbox_capacity,
        config.volume,
        source_rate,
        device_rate,
    ))
}

/// Create a pair from explicit sample-count thresholds
pub fn bridge_pair_with_marks(
    marks: WaterMarks,
    mailbox_capacity: usize,
    volume: f32,
    source_rate: u32,
    device_rate: u32,
) -> (AudioBridge, AudioRenderer) {
    let capacity = mailbox_capacity.max(1);
    let (to_renderer_tx, to_renderer_rx) = mpsc::sync_channel::<ToRenderer>(capacity);
    let (to_main_tx, to_main_rx) = mpsc::sync_channel::<ToMain>(capacity);

    let bridge = AudioBridge {
        tx: to_renderer_tx,
        rx: to_main_rx,
        pending: SampleQueue::new(marks.hard_cap),
        request_outstanding: false,
        volume: volume.clamp(0.0, 1.0),
        muted: false,
        volume_dirty: false,
        last_health: None,
        overruns: 0,
        batches_sent: 0,
        connected: true,
    };
    let renderer = AudioRenderer::new(
        to_renderer_rx,
        to_main_tx,
        marks,
        volume,
        source_rate,
        device_rate,
    );
    (bridge, renderer)
}

/// Main half of the bridge.
///
/// Collects each accepted frame's sample batch and forwards everything
/// collected as one message whenever the renderer asks for a refill.
pub struct AudioBridge {
    tx: SyncSender<ToRenderer>,
    rx: Receiver<ToMain>,
    pending: SampleQueue,
    request_outstanding: bool,
    volume: f32,
    muted: bool,
    /// A volume update could not be delivered and must be resent
    volume_dirty: bool,
    last_health: Option<RendererHealth>,
    overruns: u64,
    batches_sent: u64,
    connected: bool,
}

impl AudioBridge {
    /// Queue one frame's samples. Forwards at once if a refill request is
    /// waiting unanswered. Samples are discarded once the renderer is gone.
    pub fn publish(&mut self, samples: &[f32]) {
        if !self.connected {
            return;
        }
        let dropped = self.pending.push_batch(samples);
        if dropped > 0 {
            self.overruns += dropped as u64;
            debug!("Audio pending queue full: dropped {} samples", dropped);
        }
        if self.request_outstanding {
            self.forward();
        }
    }

    /// Process renderer messages and answer refill requests.
    ///
    /// Call once per main-context tick.
    pub fn pump(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(ToMain::RequestSamples) => self.request_outstanding = true,
                Ok(ToMain::Health(health)) => {
                    if health.underruns > 0 {
                        debug!(
                            "Audio renderer underran {} frames (min depth {})",
                            health.underruns, health.min_depth
                        );
                    }
                    self.last_health = Some(health);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        warn!("Audio renderer disconnected");
                    }
                    self.connected = false;
                    self.pending.clear();
                    break;
                }
            }
        }

        if self.volume_dirty {
            self.send_volume();
        }
        if self.request_outstanding {
            self.forward();
        }
    }

    /// Send everything pending as a single batch
    fn forward(&mut self) {
        if self.pending.is_empty() || !self.connected {
            return;
        }
        let batch = self.pending.take_all();
        let len = batch.len();
        match self.tx.try_send(ToRenderer::Samples(batch)) {
            Ok(()) => {
                self.request_outstanding = false;
                self.batches_sent += 1;
            }
            Err(TrySendError::Full(_)) => {
                self.overruns += len as u64;
                debug!("Audio mailbox full, dropping {} samples", len);
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Audio renderer disconnected");
                self.connected = false;
                self.pending.clear();
            }
        }
    }

    /// Set the output gain (clamped to 0.0-1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.send_volume();
    }

    /// Silence output without forgetting the configured volume
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.send_volume();
    }

    fn send_volume(&mut self) {
        let effective = if self.muted { 0.0 } else { self.volume };
        match self.tx.try_send(ToRenderer::SetVolume(effective)) {
            Ok(()) => self.volume_dirty = false,
            Err(TrySendError::Full(_)) => self.volume_dirty = true,
            Err(TrySendError::Disconnected(_)) => self.connected = false,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Most recent renderer health report
    pub fn last_health(&self) -> Option<RendererHealth> {
        self.last_health
    }

    /// Samples collected but not yet forwarded
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether a refill request is waiting for samples
    pub fn is_request_outstanding(&self) -> bool {
        self.request_outstanding
    }

    /// Samples dropped on the main side since creation
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl SamplePublisher for AudioBridge {
    fn publish(&mut self, samples: &[f32]) {
        AudioBridge::publish(self, samples);
    }
}

impl AudioOutput for AudioBridge {
    fn pump(&mut self) {
        AudioBridge::pump(self);
    }

    fn last_health(&self) -> Option<RendererHealth> {
        AudioBridge::last_health(self)
    }
}
