//! Shared types for the retrosync synchronization layer.
//!
//! Plain data used on both sides of the real-time audio boundary and by every
//! input source: the console button mask, console timing specs and the audio
//! mailbox messages.

pub mod buttons;
pub mod console;
pub mod messages;

pub use buttons::{BUTTON_NAMES, ButtonState, UnknownButton};
pub use console::{ConsoleSpecs, NTSC_SPECS, PAL_SPECS};
pub use messages::{RendererHealth, ToMain, ToRenderer};
