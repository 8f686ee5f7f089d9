//! Audio streaming across the real-time boundary
//!
//! The main context produces one batch of interleaved stereo samples per
//! emulated frame. A real-time renderer consumes them from its own queue and
//! asks for more when it runs low. The two sides share nothing but a pair of
//! bounded mailboxes.
//!
//! - [`AudioBridge`] - main half: collects batches, answers refill requests
//! - [`AudioRenderer`] - device-callback half: drains its queue, never blocks
//! - [`AudioSubsystem`] - cpal device wiring with a direct fallback path

mod bridge;
mod config;
mod direct;
mod error;
mod metrics;
mod output;
mod queue;
mod renderer;


pub use bridge::{AudioBridge, bridge_pair, bridge_pair_with_marks};
pub use config::{AudioConfig, WaterMarks};
pub use direct::{DirectRenderer, LatestBatch};
pub use error::AudioError;
pub use output::{AudioMode, AudioSubsystem};
pub use queue::SampleQueue;
pub use renderer::{AudioRenderer, RendererState};

use retrosync_shared::RendererHealth;

/// Receiver of each frame's audio batch.
///
/// Called exactly once per accepted frame, in production order.
pub trait SamplePublisher {
    fn publish(&mut self, samples: &[f32]);
}

/// Audio path a session can own: receives batches and is serviced once per
/// main-context tick
pub trait AudioOutput: SamplePublisher {
    /// Handle messages from the renderer side
    fn pump(&mut self);

    /// Most recent renderer health report, if the path produces them
    fn last_health(&self) -> Option<RendererHealth>;
}

/// Publisher that drops everything (audio not enabled yet)
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSamples;

impl SamplePublisher for DiscardSamples {
    fn publish(&mut self, _samples: &[f32]) {}
}

impl<P: SamplePublisher + ?Sized> SamplePublisher for &mut P {
    fn publish(&mut self, samples: &[f32]) {
        (**self).publish(samples);
    }
}
