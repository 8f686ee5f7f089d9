//! Input handling for keyboard and gamepad

mod aggregator;
mod gamepad;
#[cfg(feature = "gamepad")]
mod gilrs_source;
mod keyboard;
pub(crate) mod keycode_serde;
mod keymap;


pub use aggregator::{InputAggregator, InputObserver};
pub use gamepad::{
    GamepadButton, GamepadSnapshot, GamepadSource, NoGamepads, STANDARD_BUTTON_COUNT,
    STANDARD_BUTTON_MAP,
};
#[cfg(feature = "gamepad")]
pub use gilrs_source::GilrsSource;
pub use keyboard::PressedKeySet;
pub use keymap::KeyEventMap;

use serde::{Deserialize, Serialize};

/// Input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Stick deflection needed to press a direction (default: 0.5)
    #[serde(default = "default_axis_deadzone")]
    pub axis_deadzone: f32,
    /// Controller slot read by the aggregator (default: 0)
    #[serde(default)]
    pub gamepad_slot: usize,
    /// Keyboard bindings (button name -> key names)
    #[serde(default)]
    pub keymap: KeyEventMap,
}

fn default_axis_deadzone() -> f32 {
    0.5
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            axis_deadzone: default_axis_deadzone(),
            gamepad_slot: 0,
            keymap: KeyEventMap::default(),
        }
    }
}
