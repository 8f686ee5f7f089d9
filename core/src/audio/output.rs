//! Audio output using cpal
//!
//! Both paths open the device at its default rate, channel count and sample
//! format. The preferred path is a real-time stream whose callback owns the
//! renderer half of the bridge; if that stream cannot be built, a direct
//! stream reads the latest published batch instead.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use retrosync_shared::RendererHealth;
use tracing::{debug, error, info, warn};

use super::bridge::{AudioBridge, bridge_pair};
use super::direct::{DirectRenderer, LatestBatch};
use super::{AudioConfig, AudioError, AudioOutput, SamplePublisher};

/// Which output path is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    /// Message-driven renderer with its own queue
    Realtime,
    /// Latest-batch fallback without a queue
    Direct,
}

enum OutputPath {
    Realtime(AudioBridge),
    Direct { latest: LatestBatch, volume: f32, muted: bool },
}

/// Running audio output.
///
/// Lives from the user gesture that enabled audio until `shutdown`; a new one
/// may be started afterwards.
pub struct AudioSubsystem {
    path: OutputPath,
    /// The cpal stream (kept alive for the duration)
    stream: cpal::Stream,
    /// Output sample rate
    sample_rate: u32,
}

impl AudioSubsystem {
    /// Open the default output device for a core producing interleaved
    /// stereo at `source_rate`.
    pub fn start(config: &AudioConfig, source_rate: u32) -> Result<Self, AudioError> {
        config.validate()?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;

        if config.force_direct {
            return Self::open_direct(&device, config, source_rate);
        }

        match Self::open_realtime(&device, config, source_rate) {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!("Real-time audio renderer unavailable ({}); using direct output", e);
                Self::open_direct(&device, config, source_rate)
            }
        }
    }

    /// Real-time renderer at the device's default rate and format. The
    /// renderer converts from the core's rate.
    fn open_realtime(
        device: &cpal::Device,
        config: &AudioConfig,
        source_rate: u32,
    ) -> Result<Self, AudioError> {
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;

        let (bridge, mut renderer) = bridge_pair(config, source_rate, sample_rate)?;
        let stream = build_stream(device, supported, config.buffer_frames, move |data| {
            renderer.render_interleaved(data, channels);
        })?;

        info!(
            "Real-time audio renderer started at {}Hz ({} channels, source {}Hz)",
            sample_rate, channels, source_rate
        );

        Ok(Self {
            path: OutputPath::Realtime(bridge),
            stream,
            sample_rate,
        })
    }

    fn open_direct(
        device: &cpal::Device,
        config: &AudioConfig,
        source_rate: u32,
    ) -> Result<Self, AudioError> {
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;

        let latest = LatestBatch::new(config.volume);
        let mut renderer = DirectRenderer::new(latest.clone(), source_rate, sample_rate);
        let stream = build_stream(device, supported, config.buffer_frames, move |data| {
            renderer.render_interleaved(data, channels);
        })?;

        info!(
            "Direct audio output started at {}Hz ({} channels)",
            sample_rate, channels
        );

        Ok(Self {
            path: OutputPath::Direct {
                latest,
                volume: config.volume,
                muted: false,
            },
            stream,
            sample_rate,
        })
    }

    pub fn mode(&self) -> AudioMode {
        match self.path {
            OutputPath::Realtime(_) => AudioMode::Realtime,
            OutputPath::Direct { .. } => AudioMode::Direct,
        }
    }

    /// Answer pending refill requests. No-op on the direct path.
    pub fn pump(&mut self) {
        if let OutputPath::Realtime(bridge) = &mut self.path {
            bridge.pump();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        match &mut self.path {
            OutputPath::Realtime(bridge) => bridge.set_volume(volume),
            OutputPath::Direct {
                latest,
                volume: current,
                muted,
            } => {
                *current = volume.clamp(0.0, 1.0);
                latest.set_volume(if *muted { 0.0 } else { *current });
            }
        }
    }

    pub fn set_muted(&mut self, mute: bool) {
        match &mut self.path {
            OutputPath::Realtime(bridge) => bridge.set_muted(mute),
            OutputPath::Direct {
                latest,
                volume,
                muted,
            } => {
                *muted = mute;
                latest.set_volume(if mute { 0.0 } else { *volume });
            }
        }
    }

    /// Last renderer health report (real-time path only)
    pub fn last_health(&self) -> Option<RendererHealth> {
        match &self.path {
            OutputPath::Realtime(bridge) => bridge.last_health(),
            OutputPath::Direct { .. } => None,
        }
    }

    /// The main half of the bridge, on the real-time path
    pub fn bridge(&self) -> Option<&AudioBridge> {
        match &self.path {
            OutputPath::Realtime(bridge) => Some(bridge),
            OutputPath::Direct { .. } => None,
        }
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stop the device and release the mailbox.
    ///
    /// Pending refill requests are abandoned; the renderer goes away with
    /// the stream.
    pub fn shutdown(self) {
        if let Err(e) = self.stream.pause() {
            debug!("Failed to pause audio stream on shutdown: {}", e);
        }
        drop(self.stream);
        drop(self.path);
        info!("Audio output shut down");
    }
}

impl SamplePublisher for AudioSubsystem {
    fn publish(&mut self, samples: &[f32]) {
        match &mut self.path {
            OutputPath::Realtime(bridge) => bridge.publish(samples),
            OutputPath::Direct { latest, .. } => latest.store(samples),
        }
    }
}

impl AudioOutput for AudioSubsystem {
    fn pump(&mut self) {
        AudioSubsystem::pump(self);
    }

    fn last_health(&self) -> Option<RendererHealth> {
        AudioSubsystem::last_health(self)
    }
}

/// Build and start an output stream in the device's native sample format.
///
/// `fill` always renders f32; integer formats are converted through a
/// scratch buffer allocated up front.
fn build_stream<F>(
    device: &cpal::Device,
    supported: cpal::SupportedStreamConfig,
    buffer_frames: Option<u32>,
    mut fill: F,
) -> Result<cpal::Stream, AudioError>
where
    F: FnMut(&mut [f32]) + Send + 'static,
{
    let sample_format = supported.sample_format();
    let mut stream_config: cpal::StreamConfig = supported.into();
    if let Some(frames) = buffer_frames {
        stream_config.buffer_size = cpal::BufferSize::Fixed(frames);
    }
    let on_error = |err| error!("Audio stream error: {}", err);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| fill(data),
            on_error,
            None,
        ),
        cpal::SampleFormat::I16 => {
            let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
            device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    if temp_buffer.len() < data.len() {
                        temp_buffer.resize(data.len(), 0.0);
                    }
                    fill(&mut temp_buffer[..data.len()]);
                    for (out, &f) in data.iter_mut().zip(&temp_buffer) {
                        *out = (f * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    }
                },
                on_error,
                None,
            )
        }
        cpal::SampleFormat::U16 => {
            let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
            device.build_output_stream(
                &stream_config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    if temp_buffer.len() < data.len() {
                        temp_buffer.resize(data.len(), 0.0);
                    }
                    fill(&mut temp_buffer[..data.len()]);
                    // 0x8000 is silence for u16 audio
                    for (out, &f) in data.iter_mut().zip(&temp_buffer) {
                        *out = (f * 32767.0 + 32768.0).clamp(0.0, 65535.0) as u16;
                    }
                },
                on_error,
                None,
            )
        }
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    }
    .map_err(|e| AudioError::Build(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::Play(e.to_string()))?;
    Ok(stream)
}
