//! Emulation core contract
//!
//! The frame-stepped engine this layer drives is an external collaborator.
//! It is synchronous and blocking: one call advances exactly one video frame
//! and leaves that frame's pixels and audio samples behind for inspection.

use retrosync_shared::{ButtonState, ConsoleSpecs};

/// Fault reported by an emulation core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The core could not be brought up (missing BIOS, allocation failure, ...)
    #[error("core initialization failed: {0}")]
    Init(String),
    /// The program image was rejected
    #[error("failed to load program: {0}")]
    Load(String),
    /// The core faulted while stepping a frame; its state is now undefined
    #[error("frame step failed: {0}")]
    Step(String),
    /// An operation required a loaded program
    #[error("no program loaded")]
    NotLoaded,
}

/// Pixel surface produced by the most recent frame.
///
/// The pixel format is owned by the core; this layer only hands it to a
/// [`VideoSink`] for the blit.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    pub width: u32,
    pub height: u32,
    /// Row-major packed pixels, `width * height` entries
    pub pixels: &'a [u32],
}

/// Destination for completed frames (canvas, texture upload, file dump, ...)
pub trait VideoSink {
    /// Copy one completed frame to the display surface.
    fn present(&mut self, frame: VideoFrame<'_>);
}

/// Sink that discards frames, for headless operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVideo;

impl VideoSink for NullVideo {
    fn present(&mut self, _frame: VideoFrame<'_>) {}
}

/// Trait for frame-stepped emulation cores
///
/// The scheduler owns the core exclusively and calls into it sequentially:
/// `set_input` → `run_frame` → `frame_buffer` → `audio_samples`, once per
/// accepted frame. `audio_samples` must not be called more than once per
/// frame; the batch it returns belongs to the frame just run.
pub trait EmulationCore {
    /// Timing characteristics of the emulated console
    fn specs(&self) -> &ConsoleSpecs;

    /// Bring the core up. Called once before the first `load_rom`.
    fn initialize(&mut self) -> Result<(), CoreError>;

    /// Load a program image, replacing any previous one.
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), CoreError>;

    /// Soft reset of the loaded program.
    fn reset(&mut self) -> Result<(), CoreError>;

    /// Advance exactly one frame.
    fn run_frame(&mut self) -> Result<(), CoreError>;

    /// Pixel surface of the frame just rendered.
    fn frame_buffer(&self) -> VideoFrame<'_>;

    /// Interleaved stereo samples generated by the frame just rendered.
    fn audio_samples(&self) -> &[f32];

    /// Latch controller state for the next `run_frame`.
    fn set_input(&mut self, port: usize, buttons: ButtonState);

    /// Serialize the machine state. The format is opaque to this layer.
    fn save_state(&self) -> Result<Vec<u8>, CoreError>;

    /// Restore a previously saved state. Returns `false` if it was rejected.
    fn load_state(&mut self, state: &[u8]) -> bool;

    /// Release everything acquired by `initialize`.
    fn cleanup(&mut self);
}
