//! Polled gamepad snapshots

use retrosync_shared::ButtonState;
use smallvec::SmallVec;

/// Buttons in standard gamepad layout order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum GamepadButton {
    South = 0,
    East = 1,
    West = 2,
    North = 3,
    LeftBumper = 4,
    RightBumper = 5,
    LeftTrigger = 6,
    RightTrigger = 7,
    Select = 8,
    Start = 9,
    LeftStick = 10,
    RightStick = 11,
    DPadUp = 12,
    DPadDown = 13,
    DPadLeft = 14,
    DPadRight = 15,
    Home = 16,
}

/// Number of buttons in the standard layout
pub const STANDARD_BUTTON_COUNT: usize = 17;

/// Standard layout to console buttons.
///
/// Face buttons follow their position, so the bottom button is B and the
/// right button is A.
pub const STANDARD_BUTTON_MAP: [(GamepadButton, ButtonState); 16] = [
    (GamepadButton::South, ButtonState::B),
    (GamepadButton::East, ButtonState::A),
    (GamepadButton::West, ButtonState::Y),
    (GamepadButton::North, ButtonState::X),
    (GamepadButton::LeftBumper, ButtonState::L),
    (GamepadButton::RightBumper, ButtonState::R),
    (GamepadButton::LeftTrigger, ButtonState::L2),
    (GamepadButton::RightTrigger, ButtonState::R2),
    (GamepadButton::Select, ButtonState::SELECT),
    (GamepadButton::Start, ButtonState::START),
    (GamepadButton::LeftStick, ButtonState::L3),
    (GamepadButton::RightStick, ButtonState::R3),
    (GamepadButton::DPadUp, ButtonState::UP),
    (GamepadButton::DPadDown, ButtonState::DOWN),
    (GamepadButton::DPadLeft, ButtonState::LEFT),
    (GamepadButton::DPadRight, ButtonState::RIGHT),
];

/// One poll of a connected controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    /// Pressed flags indexed by [`GamepadButton`]; missing entries read as
    /// released
    pub buttons: SmallVec<[bool; STANDARD_BUTTON_COUNT]>,
    /// Primary stick, each axis in [-1, 1]. Y grows downwards.
    pub axes: [f32; 2],
}

impl GamepadSnapshot {
    /// Snapshot with no buttons held and the stick centered
    pub fn idle() -> Self {
        Self {
            buttons: SmallVec::from_elem(false, STANDARD_BUTTON_COUNT),
            axes: [0.0, 0.0],
        }
    }

    pub fn with_button(mut self, button: GamepadButton) -> Self {
        let index = button as usize;
        if self.buttons.len() <= index {
            self.buttons.resize(index + 1, false);
        }
        self.buttons[index] = true;
        self
    }

    pub fn with_axes(mut self, x: f32, y: f32) -> Self {
        self.axes = [x, y];
        self
    }

    pub fn is_pressed(&self, button: GamepadButton) -> bool {
        self.buttons.get(button as usize).copied().unwrap_or(false)
    }

    /// Console buttons asserted by this snapshot.
    ///
    /// An axis beyond `deadzone` in either direction adds the matching
    /// D-pad bit.
    pub fn mask(&self, deadzone: f32) -> ButtonState {
        let mut mask = STANDARD_BUTTON_MAP
            .iter()
            .filter(|(button, _)| self.is_pressed(*button))
            .fold(ButtonState::NONE, |mask, (_, bit)| mask | *bit);

        let [x, y] = self.axes;
        if x < -deadzone {
            mask |= ButtonState::LEFT;
        } else if x > deadzone {
            mask |= ButtonState::RIGHT;
        }
        if y < -deadzone {
            mask |= ButtonState::UP;
        } else if y > deadzone {
            mask |= ButtonState::DOWN;
        }
        mask
    }
}

/// Source of polled controller state
pub trait GamepadSource {
    /// Read the controller bound to `slot`. `None` means no controller is
    /// connected there.
    fn poll(&mut self, slot: usize) -> Option<GamepadSnapshot>;
}

/// Source with no controllers, for keyboard-only setups
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGamepads;

impl GamepadSource for NoGamepads {
    fn poll(&mut self, _slot: usize) -> Option<GamepadSnapshot> {
        None
    }
}
