//! Retrosync Core - real-time synchronization for frame-stepped emulation
//!
//! This crate sits between a host shell (window, audio device, controllers)
//! and an emulation core that advances one video frame per call. It paces
//! the core at its native rate, streams each frame's audio across the
//! real-time boundary, and folds keyboard and gamepad state into the
//! console's button mask.
//!
//! # Architecture
//!
//! - [`FrameScheduler`] - steps the core from display-refresh callbacks
//! - [`AudioBridge`] / [`AudioRenderer`] - pull-based sample streaming
//! - [`InputAggregator`] - keyboard + gamepad to [`ButtonState`]
//! - [`Session`] - one emulator instance wiring the three together

pub mod audio;
pub mod config;
pub mod emulation;
pub mod input;
pub mod scheduler;
pub mod session;
#[cfg(test)]
pub mod test_utils;

pub use retrosync_shared::{
    BUTTON_NAMES, ButtonState, ConsoleSpecs, NTSC_SPECS, PAL_SPECS, RendererHealth,
};

pub use audio::{
    AudioBridge, AudioConfig, AudioError, AudioMode, AudioOutput, AudioRenderer, AudioSubsystem,
    SamplePublisher, SampleQueue, WaterMarks, bridge_pair,
};
pub use config::{Config, ConfigError};
pub use emulation::{CoreError, EmulationCore, NullVideo, VideoFrame, VideoSink};
#[cfg(feature = "gamepad")]
pub use input::GilrsSource;
pub use input::{
    GamepadSnapshot, GamepadSource, InputAggregator, InputConfig, KeyEventMap, NoGamepads,
    PressedKeySet,
};
pub use scheduler::{
    FrameClock, FrameIo, FrameScheduler, ManualRefreshHost, RefreshHost, SchedulerConfig,
    SchedulerError, TickOutcome, WindowRefreshHost,
};
pub use session::{Session, SessionError};
