//! Shared test utilities for unit tests

use hashbrown::HashMap;
use retrosync_shared::{ButtonState, ConsoleSpecs};

use crate::audio::SamplePublisher;
use crate::emulation::{CoreError, EmulationCore, VideoFrame, VideoSink};
use crate::input::{GamepadSnapshot, GamepadSource};

// ============================================================================
// Test Core
// ============================================================================

/// Timing used by [`TestCore`]: 60 fps and 10 stereo pairs per frame
pub const TEST_SPECS: ConsoleSpecs = ConsoleSpecs {
    name: "test console",
    frame_rate: 60.0,
    sample_rate: 600,
    resolution: (4, 2),
    ports: 2,
};

/// Scripted emulation core.
///
/// Every frame fills the pixel buffer and sample batch with the frame number,
/// so tests can tell frames apart by their output.
#[derive(Debug, Default)]
pub struct TestCore {
    pub init_calls: u32,
    pub rom: Option<Vec<u8>>,
    pub resets: u32,
    /// Successful `run_frame` calls
    pub frames: u64,
    /// Every `set_input` call in order
    pub inputs: Vec<(usize, ButtonState)>,
    /// Fail `run_frame` once this many frames have run
    pub fail_at_frame: Option<u64>,
    pub fail_init: bool,
    pub reject_states: bool,
    pub cleaned_up: bool,
    pub pixels: Vec<u32>,
    pub samples: Vec<f32>,
}

impl TestCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Core that faults on the frame after `frames` good ones
    pub fn failing_at(frames: u64) -> Self {
        Self {
            fail_at_frame: Some(frames),
            ..Self::default()
        }
    }

    /// Last latched input, if any
    pub fn last_input(&self) -> Option<ButtonState> {
        self.inputs.last().map(|(_, buttons)| *buttons)
    }
}

impl EmulationCore for TestCore {
    fn specs(&self) -> &ConsoleSpecs {
        &TEST_SPECS
    }

    fn initialize(&mut self) -> Result<(), CoreError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(CoreError::Init("scripted failure".to_string()));
        }
        Ok(())
    }

    fn load_rom(&mut self, rom: &[u8]) -> Result<(), CoreError> {
        if rom.is_empty() {
            return Err(CoreError::Load("empty image".to_string()));
        }
        self.rom = Some(rom.to_vec());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), CoreError> {
        self.resets += 1;
        Ok(())
    }

    fn run_frame(&mut self) -> Result<(), CoreError> {
        if self.fail_at_frame == Some(self.frames) {
            return Err(CoreError::Step(format!("fault at frame {}", self.frames)));
        }
        self.frames += 1;

        let (width, height) = TEST_SPECS.resolution;
        self.pixels = vec![self.frames as u32; (width * height) as usize];
        self.samples = vec![self.frames as f32; TEST_SPECS.samples_per_frame()];
        Ok(())
    }

    fn frame_buffer(&self) -> VideoFrame<'_> {
        let (width, height) = TEST_SPECS.resolution;
        VideoFrame {
            width,
            height,
            pixels: &self.pixels,
        }
    }

    fn audio_samples(&self) -> &[f32] {
        &self.samples
    }

    fn set_input(&mut self, port: usize, buttons: ButtonState) {
        self.inputs.push((port, buttons));
    }

    fn save_state(&self) -> Result<Vec<u8>, CoreError> {
        Ok(self.frames.to_le_bytes().to_vec())
    }

    fn load_state(&mut self, state: &[u8]) -> bool {
        if self.reject_states {
            return false;
        }
        match <[u8; 8]>::try_from(state) {
            Ok(bytes) => {
                self.frames = u64::from_le_bytes(bytes);
                true
            }
            Err(_) => false,
        }
    }

    fn cleanup(&mut self) {
        self.cleaned_up = true;
    }
}

// ============================================================================
// Output Sinks
// ============================================================================

/// Video sink recording the first pixel of every presented frame
#[derive(Debug, Default)]
pub struct TestVideoSink {
    pub frames: Vec<u32>,
}

impl VideoSink for TestVideoSink {
    fn present(&mut self, frame: VideoFrame<'_>) {
        self.frames.push(frame.pixels.first().copied().unwrap_or(0));
    }
}

/// Sample publisher recording every batch
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub batches: Vec<Vec<f32>>,
}

impl SamplePublisher for RecordingPublisher {
    fn publish(&mut self, samples: &[f32]) {
        self.batches.push(samples.to_vec());
    }
}

// ============================================================================
// Gamepads
// ============================================================================

/// Gamepad source whose controllers are plugged in and out by the test
#[derive(Debug, Default)]
pub struct ScriptedGamepads {
    slots: HashMap<usize, GamepadSnapshot>,
    pub polls: u32,
}

impl ScriptedGamepads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect (or update) the controller in `slot`
    pub fn set(&mut self, slot: usize, snapshot: GamepadSnapshot) {
        self.slots.insert(slot, snapshot);
    }

    pub fn unplug(&mut self, slot: usize) {
        self.slots.remove(&slot);
    }
}

impl GamepadSource for ScriptedGamepads {
    fn poll(&mut self, slot: usize) -> Option<GamepadSnapshot> {
        self.polls += 1;
        self.slots.get(&slot).cloned()
    }
}
