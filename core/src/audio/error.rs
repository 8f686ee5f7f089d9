//! Error types for audio output

/// Error type for audio output construction
///
/// Underruns and overruns are not errors; they are counted in
/// [`RendererHealth`](retrosync_shared::RendererHealth) instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    /// The host has no default output device
    #[error("no audio output device available")]
    NoDevice,
    /// Querying the device's supported configurations failed
    #[error("failed to query output configs: {0}")]
    Config(String),
    /// The device's default sample format is not handled
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    /// The stream could not be built
    #[error("failed to build audio stream: {0}")]
    Build(String),
    /// The stream was built but would not start or pause
    #[error("failed to control audio stream: {0}")]
    Play(String),
    /// Thresholds or ranges in the configuration are inconsistent
    #[error("invalid audio configuration: {0}")]
    InvalidConfig(String),
}
