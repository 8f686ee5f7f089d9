//! Console button mask
//!
//! Bits follow the RetroPad joypad ordering so that masks can be handed to a
//! libretro-style core without translation.

use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Currently pressed console buttons.
    ///
    /// Independent input sources are merged with `|`; a button is pressed
    /// while any source asserts it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonState: u32 {
        const B = 1 << 0;
        const Y = 1 << 1;
        const SELECT = 1 << 2;
        const START = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const LEFT = 1 << 6;
        const RIGHT = 1 << 7;
        const A = 1 << 8;
        const X = 1 << 9;
        const L = 1 << 10;
        const R = 1 << 11;
        const L2 = 1 << 12;
        const R2 = 1 << 13;
        const L3 = 1 << 14;
        const R3 = 1 << 15;
    }
}

/// Button names as accepted by [`ButtonState::from_str`], in bit order.
pub const BUTTON_NAMES: [(&str, ButtonState); 16] = [
    ("B", ButtonState::B),
    ("Y", ButtonState::Y),
    ("Select", ButtonState::SELECT),
    ("Start", ButtonState::START),
    ("Up", ButtonState::UP),
    ("Down", ButtonState::DOWN),
    ("Left", ButtonState::LEFT),
    ("Right", ButtonState::RIGHT),
    ("A", ButtonState::A),
    ("X", ButtonState::X),
    ("L", ButtonState::L),
    ("R", ButtonState::R),
    ("L2", ButtonState::L2),
    ("R2", ButtonState::R2),
    ("L3", ButtonState::L3),
    ("R3", ButtonState::R3),
];

impl ButtonState {
    /// No buttons pressed.
    pub const NONE: Self = Self::empty();

    /// Raw mask value as latched into the emulation core.
    pub fn mask(self) -> u32 {
        self.bits()
    }

    /// Build from a raw mask, dropping bits that are not console buttons.
    pub fn from_mask(mask: u32) -> Self {
        Self::from_bits_truncate(mask)
    }

    /// Name of a single-button state, `None` for empty or combined masks.
    pub fn name(self) -> Option<&'static str> {
        BUTTON_NAMES
            .iter()
            .find(|(_, button)| *button == self)
            .map(|(name, _)| *name)
    }
}

/// Error returned when a button name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown button name: '{0}'")]
pub struct UnknownButton(pub String);

impl FromStr for ButtonState {
    type Err = UnknownButton;

    /// Parse a single button name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BUTTON_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, button)| *button)
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.bits())
    }
}
