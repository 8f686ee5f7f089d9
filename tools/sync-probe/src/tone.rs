//! Synthetic emulation core: a sine tone and a scrolling test pattern

use std::f32::consts::TAU;

use retrosync_core::{CoreError, EmulationCore, VideoFrame};
use retrosync_shared::{ButtonState, ConsoleSpecs};

const BASE_PITCH: f32 = 440.0;
const AMPLITUDE: f32 = 0.25;

/// Core that needs no program image.
///
/// Holding the D-pad bends the tone by a few semitones so controller input
/// is audible as well as logged.
pub struct ToneCore {
    specs: ConsoleSpecs,
    initialized: bool,
    loaded: bool,
    frame: u64,
    phase: f32,
    input: ButtonState,
    fault_at: Option<u64>,
    pixels: Vec<u32>,
    samples: Vec<f32>,
}

impl ToneCore {
    pub fn new(specs: ConsoleSpecs, fault_at: Option<u64>) -> Self {
        let (width, height) = specs.resolution;
        Self {
            pixels: vec![0; (width * height) as usize],
            samples: Vec::with_capacity(specs.samples_per_frame()),
            specs,
            initialized: false,
            loaded: false,
            frame: 0,
            phase: 0.0,
            input: ButtonState::NONE,
            fault_at,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    fn pitch(&self) -> f32 {
        let mut semitones = 0.0;
        if self.input.contains(ButtonState::UP) {
            semitones += 7.0;
        }
        if self.input.contains(ButtonState::DOWN) {
            semitones -= 5.0;
        }
        if self.input.contains(ButtonState::LEFT) {
            semitones -= 2.0;
        }
        if self.input.contains(ButtonState::RIGHT) {
            semitones += 2.0;
        }
        BASE_PITCH * 2f32.powf(semitones / 12.0)
    }

    fn render_tone(&mut self) {
        let step = TAU * self.pitch() / self.specs.sample_rate as f32;
        self.samples.clear();
        for _ in 0..self.specs.samples_per_frame() / 2 {
            let value = self.phase.sin() * AMPLITUDE;
            self.samples.push(value);
            self.samples.push(value);
            self.phase = (self.phase + step) % TAU;
        }
    }

    fn render_pattern(&mut self) {
        let (width, _) = self.specs.resolution;
        let offset = self.frame as u32;
        for (i, pixel) in self.pixels.iter_mut().enumerate() {
            let x = (i as u32 % width).wrapping_add(offset) & 0xFF;
            let y = (i as u32 / width) & 0xFF;
            *pixel = 0xFF00_0000 | (x << 16) | (y << 8) | self.input.bits() & 0xFF;
        }
    }
}

impl EmulationCore for ToneCore {
    fn specs(&self) -> &ConsoleSpecs {
        &self.specs
    }

    fn initialize(&mut self) -> Result<(), CoreError> {
        self.initialized = true;
        Ok(())
    }

    fn load_rom(&mut self, _rom: &[u8]) -> Result<(), CoreError> {
        if !self.initialized {
            return Err(CoreError::Load("core not initialized".to_string()));
        }
        self.loaded = true;
        self.frame = 0;
        self.phase = 0.0;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), CoreError> {
        self.frame = 0;
        self.phase = 0.0;
        Ok(())
    }

    fn run_frame(&mut self) -> Result<(), CoreError> {
        if !self.loaded {
            return Err(CoreError::NotLoaded);
        }
        if self.fault_at == Some(self.frame) {
            return Err(CoreError::Step(format!("injected fault at frame {}", self.frame)));
        }
        self.render_tone();
        self.render_pattern();
        self.frame += 1;
        Ok(())
    }

    fn frame_buffer(&self) -> VideoFrame<'_> {
        let (width, height) = self.specs.resolution;
        VideoFrame {
            width,
            height,
            pixels: &self.pixels,
        }
    }

    fn audio_samples(&self) -> &[f32] {
        &self.samples
    }

    fn set_input(&mut self, _port: usize, buttons: ButtonState) {
        self.input = buttons;
    }

    fn save_state(&self) -> Result<Vec<u8>, CoreError> {
        let mut state = self.frame.to_le_bytes().to_vec();
        state.extend_from_slice(&self.phase.to_le_bytes());
        Ok(state)
    }

    fn load_state(&mut self, state: &[u8]) -> bool {
        let (Some(frame), Some(phase)) = (state.get(..8), state.get(8..12)) else {
            return false;
        };
        let (Ok(frame), Ok(phase)) = (<[u8; 8]>::try_from(frame), <[u8; 4]>::try_from(phase))
        else {
            return false;
        };
        self.frame = u64::from_le_bytes(frame);
        self.phase = f32::from_le_bytes(phase);
        true
    }

    fn cleanup(&mut self) {
        self.loaded = false;
        self.initialized = false;
    }
}
