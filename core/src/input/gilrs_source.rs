//! Gamepad polling through gilrs

use gilrs::{Axis, Button, Gilrs};

use super::gamepad::{GamepadButton, GamepadSnapshot, GamepadSource, STANDARD_BUTTON_COUNT};

/// gilrs button for each standard layout slot
const BUTTON_ORDER: [(GamepadButton, Button); STANDARD_BUTTON_COUNT] = [
    (GamepadButton::South, Button::South),
    (GamepadButton::East, Button::East),
    (GamepadButton::West, Button::West),
    (GamepadButton::North, Button::North),
    // gilrs calls the bumpers triggers and the triggers "trigger 2"
    (GamepadButton::LeftBumper, Button::LeftTrigger),
    (GamepadButton::RightBumper, Button::RightTrigger),
    (GamepadButton::LeftTrigger, Button::LeftTrigger2),
    (GamepadButton::RightTrigger, Button::RightTrigger2),
    (GamepadButton::Select, Button::Select),
    (GamepadButton::Start, Button::Start),
    (GamepadButton::LeftStick, Button::LeftThumb),
    (GamepadButton::RightStick, Button::RightThumb),
    (GamepadButton::DPadUp, Button::DPadUp),
    (GamepadButton::DPadDown, Button::DPadDown),
    (GamepadButton::DPadLeft, Button::DPadLeft),
    (GamepadButton::DPadRight, Button::DPadRight),
    (GamepadButton::Home, Button::Mode),
];

/// Gamepad source backed by gilrs.
///
/// Slot `n` is the `n`-th connected controller in gilrs enumeration order.
pub struct GilrsSource {
    /// None if gilrs failed to initialize
    gilrs: Option<Gilrs>,
}

impl GilrsSource {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize gamepad support: {}. Gamepads will not be available.",
                    e
                );
                None
            }
        };
        Self { gilrs }
    }

    pub fn is_available(&self) -> bool {
        self.gilrs.is_some()
    }
}

impl Default for GilrsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GamepadSource for GilrsSource {
    fn poll(&mut self, slot: usize) -> Option<GamepadSnapshot> {
        let gilrs = self.gilrs.as_mut()?;

        // Cached button and axis state only updates as events are consumed
        while gilrs.next_event().is_some() {}

        let (_, gamepad) = gilrs.gamepads().nth(slot)?;
        if !gamepad.is_connected() {
            return None;
        }

        let mut snapshot = GamepadSnapshot::idle();
        for (slot_button, button) in BUTTON_ORDER {
            snapshot.buttons[slot_button as usize] = gamepad.is_pressed(button);
        }
        // gilrs reports Y up as positive
        snapshot.axes = [
            gamepad.value(Axis::LeftStickX),
            -gamepad.value(Axis::LeftStickY),
        ];
        Some(snapshot)
    }
}
