//! Audio mailbox messages
//!
//! The main context and the real-time renderer never share queue memory.
//! Each side owns its own sample queue and the two are kept consistent only by
//! the order in which these messages are delivered.

/// Message from the main context to the real-time renderer
#[derive(Debug, Clone, PartialEq)]
pub enum ToRenderer {
    /// Interleaved stereo samples, in generation order
    Samples(Vec<f32>),
    /// Output gain applied to every subsequently rendered sample (0.0 - 1.0)
    SetVolume(f32),
}

/// Message from the real-time renderer to the main context
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToMain {
    /// Renderer queue dropped under the high-water mark; send more samples
    RequestSamples,
    /// Once-per-window health counters
    Health(RendererHealth),
}

/// Renderer health over one reporting window (about one second of output).
///
/// Counters reset at the start of every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererHealth {
    /// Output frames replaced by silence because the queue was empty
    pub underruns: u64,
    /// Smallest queue depth (in samples) observed during the window
    pub min_depth: usize,
    /// Refill requests sent during the window
    pub requests: u64,
    /// Samples discarded because a batch would have exceeded the hard cap
    pub overruns: u64,
}
