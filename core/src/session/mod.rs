//! Session composition
//!
//! Owns one scheduler, one input aggregator and (once the user has enabled
//! it) one audio output. The host creates a session per emulator instance
//! and drives it from its refresh callback and window events.

use std::time::Instant;

use retrosync_shared::RendererHealth;
use tracing::info;
use winit::event::WindowEvent;

use crate::audio::{AudioConfig, AudioError, AudioMode, AudioOutput, AudioSubsystem, DiscardSamples};
use crate::config::Config;
use crate::emulation::{CoreError, EmulationCore, VideoSink};
use crate::input::{GamepadSource, InputAggregator};
use crate::scheduler::{FrameIo, FrameScheduler, RefreshHost, SchedulerError, TickOutcome};


/// Session-level failure
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    /// The core refused a saved state
    #[error("save state rejected by the core")]
    StateRejected,
    /// The operation needs a loaded program
    #[error("no program loaded")]
    NotLoaded,
}

/// One running emulator instance
pub struct Session<C: EmulationCore, R: RefreshHost> {
    scheduler: FrameScheduler<C, R>,
    input: InputAggregator,
    audio: Option<Box<dyn AudioOutput>>,
    audio_config: AudioConfig,
    initialized: bool,
    loaded: bool,
}

impl<C: EmulationCore, R: RefreshHost> Session<C, R> {
    pub fn new(core: C, refresh: R, config: &Config) -> Self {
        Self {
            scheduler: FrameScheduler::new(core, refresh, config.scheduler.clone()),
            input: InputAggregator::new(&config.input),
            audio: None,
            audio_config: config.audio.clone(),
            initialized: false,
            loaded: false,
        }
    }

    /// Load a program and start running it.
    ///
    /// Initializes the core on first use. A previously running program is
    /// stopped first.
    pub fn load_rom(&mut self, rom: &[u8], now: Instant) -> Result<(), SessionError> {
        self.scheduler.stop();
        self.input.disable();
        self.loaded = false;

        if !self.initialized {
            self.scheduler.core_mut().initialize()?;
            self.initialized = true;
        }
        self.scheduler.core_mut().load_rom(rom)?;
        self.loaded = true;

        self.input.enable();
        self.scheduler.start(now);
        info!("Loaded program ({} bytes)", rom.len());
        Ok(())
    }

    /// Stop running and release input. The core stays initialized.
    pub fn unload(&mut self) {
        self.scheduler.stop();
        self.input.disable();
        self.loaded = false;
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        if !self.loaded {
            return Err(SessionError::NotLoaded);
        }
        self.scheduler.core_mut().reset()?;
        Ok(())
    }

    /// Per-refresh entry point: poll the gamepad, service the audio
    /// mailbox, then tick the scheduler with the combined input.
    ///
    /// A step fault stops only the scheduler; input and audio keep working.
    pub fn on_refresh(
        &mut self,
        now: Instant,
        video: &mut dyn VideoSink,
        gamepads: &mut dyn GamepadSource,
    ) -> Result<TickOutcome, SessionError> {
        self.input.poll_gamepad(gamepads);
        let input = self.input.buttons();

        let outcome = match self.audio.as_mut() {
            Some(audio) => {
                audio.pump();
                let mut audio: &mut dyn AudioOutput = &mut **audio;
                self.scheduler.tick(
                    now,
                    FrameIo {
                        input,
                        video,
                        audio: &mut audio,
                    },
                )?
            }
            None => self.scheduler.tick(
                now,
                FrameIo {
                    input,
                    video,
                    audio: &mut DiscardSamples,
                },
            )?,
        };
        Ok(outcome)
    }

    /// Run a single frame while paused
    pub fn step(&mut self, video: &mut dyn VideoSink) -> Result<bool, SessionError> {
        if !self.loaded {
            return Err(SessionError::NotLoaded);
        }
        let input = self.input.buttons();
        let stepped = match self.audio.as_mut() {
            Some(audio) => {
                let mut audio: &mut dyn AudioOutput = &mut **audio;
                self.scheduler.step(FrameIo {
                    input,
                    video,
                    audio: &mut audio,
                })?
            }
            None => self.scheduler.step(FrameIo {
                input,
                video,
                audio: &mut DiscardSamples,
            })?,
        };
        Ok(stepped)
    }

    /// Pause or resume a loaded program
    pub fn toggle_pause(&mut self, now: Instant) {
        if self.loaded {
            self.scheduler.toggle(now);
        }
    }

    /// Forward a window event to the input aggregator
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.input.handle_window_event(event)
    }

    /// Open the default audio device with the session's audio settings.
    ///
    /// Platforms require a user gesture before audio may start, so this is
    /// separate from loading. Returns `None` if audio is disabled in the
    /// configuration.
    pub fn start_audio(&mut self) -> Result<Option<AudioMode>, SessionError> {
        if !self.audio_config.enabled {
            return Ok(None);
        }
        let sample_rate = self.scheduler.core().specs().sample_rate;
        let output = AudioSubsystem::start(&self.audio_config, sample_rate)?;
        let mode = output.mode();
        self.attach_audio(Box::new(output));
        Ok(Some(mode))
    }

    /// Route frame audio to `output`, replacing any previous output
    pub fn attach_audio(&mut self, output: Box<dyn AudioOutput>) {
        if self.audio.replace(output).is_some() {
            info!("Replaced audio output");
        }
    }

    /// Stop routing audio. Dropping the returned output releases the device.
    pub fn detach_audio(&mut self) -> Option<Box<dyn AudioOutput>> {
        self.audio.take()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Latest health report from the attached audio output
    pub fn audio_health(&self) -> Option<RendererHealth> {
        self.audio.as_ref().and_then(|audio| audio.last_health())
    }

    pub fn save_state(&self) -> Result<Vec<u8>, SessionError> {
        if !self.loaded {
            return Err(SessionError::NotLoaded);
        }
        Ok(self.scheduler.core().save_state()?)
    }

    pub fn load_state(&mut self, state: &[u8]) -> Result<(), SessionError> {
        if !self.loaded {
            return Err(SessionError::NotLoaded);
        }
        if self.scheduler.core_mut().load_state(state) {
            Ok(())
        } else {
            Err(SessionError::StateRejected)
        }
    }

    /// Stop everything and release the core
    pub fn shutdown(mut self) -> C {
        self.unload();
        self.audio = None;
        let mut core = self.scheduler.into_core();
        if self.initialized {
            core.cleanup();
        }
        info!("Session shut down");
        core
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn scheduler(&self) -> &FrameScheduler<C, R> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler<C, R> {
        &mut self.scheduler
    }

    pub fn input(&self) -> &InputAggregator {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }
}
