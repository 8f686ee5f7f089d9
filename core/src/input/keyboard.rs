//! Held keyboard keys

use hashbrown::HashSet;
use retrosync_shared::ButtonState;
use winit::keyboard::KeyCode;

use super::KeyEventMap;

/// Set of mapped physical keys currently held down
#[derive(Debug, Clone, Default)]
pub struct PressedKeySet {
    keys: HashSet<KeyCode>,
}

impl PressedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a down edge. Returns `false` if the key was already held
    /// (auto-repeat).
    pub fn press(&mut self, key: KeyCode) -> bool {
        self.keys.insert(key)
    }

    /// Record an up edge. Returns `false` if the key was not held.
    pub fn release(&mut self, key: KeyCode) -> bool {
        self.keys.remove(&key)
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// OR of the buttons mapped from every held key
    pub fn mask(&self, keymap: &KeyEventMap) -> ButtonState {
        self.keys
            .iter()
            .filter_map(|key| keymap.lookup(*key))
            .fold(ButtonState::NONE, |mask, buttons| mask | buttons)
    }
}
