//! Keyboard and gamepad merging

use retrosync_shared::ButtonState;
use tracing::{debug, info};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::{GamepadSource, InputConfig, KeyEventMap, PressedKeySet};

/// Callback invoked with the combined state whenever it changes
pub type InputObserver = Box<dyn FnMut(ButtonState)>;

/// Merges keyboard edges and gamepad polls into one [`ButtonState`].
///
/// The combined state is always `keyboard_mask | gamepad_mask`. The change
/// observer never sees the same value twice in a row.
pub struct InputAggregator {
    keymap: KeyEventMap,
    pressed: PressedKeySet,
    keyboard_mask: ButtonState,
    gamepad_mask: ButtonState,
    /// Last value handed to the observer
    reported: ButtonState,
    enabled: bool,
    gamepad_slot: usize,
    gamepad_connected: bool,
    axis_deadzone: f32,
    observer: Option<InputObserver>,
}

impl InputAggregator {
    /// Create a disabled aggregator
    pub fn new(config: &InputConfig) -> Self {
        Self {
            keymap: config.keymap.clone(),
            pressed: PressedKeySet::new(),
            keyboard_mask: ButtonState::NONE,
            gamepad_mask: ButtonState::NONE,
            reported: ButtonState::NONE,
            enabled: false,
            gamepad_slot: config.gamepad_slot,
            gamepad_connected: false,
            axis_deadzone: config.axis_deadzone.clamp(0.0, 1.0),
            observer: None,
        }
    }

    /// Register the change observer, replacing any previous one
    pub fn on_change(&mut self, observer: impl FnMut(ButtonState) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Start accepting input
    pub fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            debug!("Input enabled");
        }
    }

    /// Stop accepting input and zero all state.
    ///
    /// The observer is told `0` once if anything was held.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.pressed.clear();
        self.keyboard_mask = ButtonState::NONE;
        self.gamepad_mask = ButtonState::NONE;
        self.gamepad_connected = false;
        self.notify();
        debug!("Input disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Feed a winit window event. Returns `true` if it was keyboard input
    /// for a mapped key.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return false;
                };
                match event.state {
                    ElementState::Pressed => self.key_down(key),
                    ElementState::Released => self.key_up(key),
                }
            }
            // Up edges are lost while unfocused
            WindowEvent::Focused(false) => {
                self.release_all_keys();
                false
            }
            _ => false,
        }
    }

    /// Key-down edge. Repeats of a held key change nothing.
    pub fn key_down(&mut self, key: KeyCode) -> bool {
        if !self.enabled || self.keymap.lookup(key).is_none() {
            return false;
        }
        if self.pressed.press(key) {
            self.keyboard_mask = self.pressed.mask(&self.keymap);
            self.notify();
        }
        true
    }

    /// Key-up edge
    pub fn key_up(&mut self, key: KeyCode) -> bool {
        if !self.enabled || self.keymap.lookup(key).is_none() {
            return false;
        }
        if self.pressed.release(key) {
            self.keyboard_mask = self.pressed.mask(&self.keymap);
            self.notify();
        }
        true
    }

    /// Drop every held key
    pub fn release_all_keys(&mut self) {
        if self.pressed.is_empty() {
            return;
        }
        self.pressed.clear();
        self.keyboard_mask = ButtonState::NONE;
        self.notify();
    }

    /// Read the bound controller. Call once per display refresh.
    pub fn poll_gamepad(&mut self, source: &mut dyn GamepadSource) {
        if !self.enabled {
            return;
        }
        match source.poll(self.gamepad_slot) {
            Some(snapshot) => {
                if !self.gamepad_connected {
                    info!("Gamepad connected in slot {}", self.gamepad_slot);
                    self.gamepad_connected = true;
                }
                self.gamepad_mask = snapshot.mask(self.axis_deadzone);
            }
            None => {
                if self.gamepad_connected {
                    info!("Gamepad in slot {} disconnected", self.gamepad_slot);
                    self.gamepad_connected = false;
                }
                self.gamepad_mask = ButtonState::NONE;
            }
        }
        self.notify();
    }

    /// Bind a different controller slot. The old controller's contribution
    /// is dropped until the next poll.
    pub fn set_gamepad_slot(&mut self, slot: usize) {
        if slot == self.gamepad_slot {
            return;
        }
        self.gamepad_slot = slot;
        self.gamepad_connected = false;
        self.gamepad_mask = ButtonState::NONE;
        self.notify();
    }

    fn notify(&mut self) {
        let buttons = self.buttons();
        if buttons == self.reported {
            return;
        }
        self.reported = buttons;
        if let Some(observer) = self.observer.as_mut() {
            observer(buttons);
        }
    }

    /// Combined state of both sources
    pub fn buttons(&self) -> ButtonState {
        self.keyboard_mask | self.gamepad_mask
    }

    pub fn keyboard_mask(&self) -> ButtonState {
        self.keyboard_mask
    }

    pub fn gamepad_mask(&self) -> ButtonState {
        self.gamepad_mask
    }

    pub fn is_gamepad_connected(&self) -> bool {
        self.gamepad_connected
    }

    pub fn gamepad_slot(&self) -> usize {
        self.gamepad_slot
    }

    pub fn pressed_keys(&self) -> &PressedKeySet {
        &self.pressed
    }

    pub fn keymap(&self) -> &KeyEventMap {
        &self.keymap
    }
}
