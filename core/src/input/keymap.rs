//! Physical key to console button mapping

use hashbrown::HashMap;
use retrosync_shared::{BUTTON_NAMES, ButtonState};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use winit::keyboard::KeyCode;

use super::keycode_serde::{keycode_to_string, string_to_keycode};

/// Static many-to-one mapping from physical keys to button bits.
///
/// Several keys may map to the same button. Keys absent from the map are
/// ignored by the aggregator.
///
/// Serialized as a table of button name to key names:
///
/// ```toml
/// A = ["X"]
/// Start = ["Enter", "Space"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEventMap {
    bindings: HashMap<KeyCode, ButtonState>,
}

impl KeyEventMap {
    /// Empty map (every key ignored)
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `key` to `buttons`, replacing any previous binding for the key
    pub fn bind(&mut self, key: KeyCode, buttons: ButtonState) -> &mut Self {
        if buttons.is_empty() {
            self.bindings.remove(&key);
        } else {
            self.bindings.insert(key, buttons);
        }
        self
    }

    /// Builder form of [`bind`](Self::bind)
    pub fn with(mut self, key: KeyCode, buttons: ButtonState) -> Self {
        self.bind(key, buttons);
        self
    }

    pub fn unbind(&mut self, key: KeyCode) {
        self.bindings.remove(&key);
    }

    /// Buttons asserted by `key`, `None` if the key is unmapped
    pub fn lookup(&self, key: KeyCode) -> Option<ButtonState> {
        self.bindings.get(&key).copied()
    }

    /// Keys bound to any of `buttons`, sorted by name for stable output
    pub fn keys_for(&self, buttons: ButtonState) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = self
            .bindings
            .iter()
            .filter(|(_, bound)| bound.intersects(buttons))
            .map(|(key, _)| *key)
            .collect();
        keys.sort_by_key(|key| keycode_to_string(*key).unwrap_or(""));
        keys
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyEventMap {
    /// Arrow keys for the D-pad, X/Z/S/A for the face buttons, Q/W for the
    /// shoulders, Enter or Space for Start and right Shift for Select.
    fn default() -> Self {
        Self::empty()
            .with(KeyCode::ArrowUp, ButtonState::UP)
            .with(KeyCode::ArrowDown, ButtonState::DOWN)
            .with(KeyCode::ArrowLeft, ButtonState::LEFT)
            .with(KeyCode::ArrowRight, ButtonState::RIGHT)
            .with(KeyCode::KeyX, ButtonState::A)
            .with(KeyCode::KeyZ, ButtonState::B)
            .with(KeyCode::KeyS, ButtonState::X)
            .with(KeyCode::KeyA, ButtonState::Y)
            .with(KeyCode::KeyQ, ButtonState::L)
            .with(KeyCode::KeyW, ButtonState::R)
            .with(KeyCode::Enter, ButtonState::START)
            .with(KeyCode::Space, ButtonState::START)
            .with(KeyCode::ShiftRight, ButtonState::SELECT)
    }
}

impl Serialize for KeyEventMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, button) in BUTTON_NAMES {
            let keys: Vec<&str> = self
                .keys_for(button)
                .into_iter()
                .filter_map(keycode_to_string)
                .collect();
            if !keys.is_empty() {
                map.serialize_entry(name, &keys)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeyEventMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let table = HashMap::<String, Vec<String>>::deserialize(deserializer)?;

        let mut keymap = Self::empty();
        for (button_name, key_names) in table {
            let button: ButtonState = button_name.parse().map_err(D::Error::custom)?;
            for key_name in key_names {
                let key = string_to_keycode(&key_name).ok_or_else(|| {
                    D::Error::custom(format!("Unknown key name: '{}'", key_name))
                })?;
                let combined = keymap.lookup(key).unwrap_or_default() | button;
                keymap.bind(key, combined);
            }
        }
        Ok(keymap)
    }
}
