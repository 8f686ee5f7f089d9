//! Frame scheduling
//!
//! Paces the emulation core at its native frame rate from the host's
//! display-refresh callback. Refresh callbacks may arrive faster than the
//! target rate (high-refresh displays) or late (host load); the scheduler
//! skips early callbacks and accepts at most one frame per callback.

use std::time::{Duration, Instant};

use retrosync_shared::ButtonState;

use crate::audio::SamplePublisher;
use crate::emulation::{CoreError, EmulationCore, VideoSink};

mod clock;
mod config;
mod refresh;

#[cfg(test)]
mod tests;

pub use clock::{FPS_WINDOW, FrameClock};
pub use config::{SchedulerConfig, frame_interval};
pub use refresh::{ManualRefreshHost, RefreshHandle, RefreshHost, WindowRefreshHost};

/// Fatal scheduling failure
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The core faulted while stepping; the scheduler has stopped itself
    #[error("frame {frame} failed: {source}")]
    Step {
        /// Number of frames successfully run before the fault
        frame: u64,
        #[source]
        source: CoreError,
    },
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The scheduler is stopped; nothing ran
    Idle,
    /// The callback arrived before a full frame interval elapsed
    Skipped,
    /// One frame was run and published
    Stepped,
}

/// Per-frame outputs and input for one tick
pub struct FrameIo<'a> {
    /// Aggregated controller state, latched before the frame runs
    pub input: ButtonState,
    /// Blit target for the completed frame
    pub video: &'a mut dyn VideoSink,
    /// Audio path receiving the frame's sample batch
    pub audio: &'a mut dyn SamplePublisher,
}

/// Observer invoked with the measured FPS once per reporting window
pub type FpsObserver = Box<dyn FnMut(f32)>;

/// Steps an [`EmulationCore`] at a target rate from refresh callbacks.
///
/// The scheduler exclusively owns the core. Each accepted frame latches input,
/// runs the core once and publishes the frame's pixels and samples exactly
/// once, in production order.
pub struct FrameScheduler<C: EmulationCore, R: RefreshHost> {
    core: C,
    refresh: R,
    config: SchedulerConfig,
    frame_rate: f64,
    frame_interval: Duration,
    /// Present only while running
    clock: Option<FrameClock>,
    pending: Option<RefreshHandle>,
    fps: f32,
    frames_run: u64,
    fps_observer: Option<FpsObserver>,
}

impl<C: EmulationCore, R: RefreshHost> FrameScheduler<C, R> {
    /// Create a stopped scheduler
    pub fn new(core: C, refresh: R, config: SchedulerConfig) -> Self {
        let frame_rate = config
            .frame_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(core.specs().frame_rate);

        Self {
            core,
            refresh,
            config,
            frame_rate,
            frame_interval: frame_interval(frame_rate),
            clock: None,
            pending: None,
            fps: 0.0,
            frames_run: 0,
            fps_observer: None,
        }
    }

    /// Start stepping. No-op if already running.
    pub fn start(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        self.clock = Some(FrameClock::new(now));
        self.fps = 0.0;
        self.schedule();
        tracing::info!("Frame scheduler started at {:.3} fps", self.frame_rate);
    }

    /// Stop stepping and cancel the pending refresh. Safe when stopped.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.refresh.cancel_refresh(handle);
        }
        if self.clock.take().is_some() {
            tracing::info!("Frame scheduler stopped after {} frames", self.frames_run);
        }
        self.fps = 0.0;
    }

    /// Stop if running, start otherwise
    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Handle one refresh callback.
    ///
    /// On a step fault the scheduler stops itself before returning the error;
    /// it is never retried since the core's state is undefined afterwards.
    pub fn tick(&mut self, now: Instant, io: FrameIo<'_>) -> Result<TickOutcome, SchedulerError> {
        let Some(clock) = self.clock.as_mut() else {
            return Ok(TickOutcome::Idle);
        };
        self.pending = None;

        let elapsed = clock.elapsed(now);
        if elapsed < self.frame_interval {
            self.schedule();
            return Ok(TickOutcome::Skipped);
        }

        match self.config.resync_threshold() {
            Some(threshold) if elapsed > threshold => {
                tracing::debug!("Frame clock {:?} behind, resyncing", elapsed);
                clock.resync(now);
            }
            _ => clock.advance(self.frame_interval),
        }

        self.run_one(io)?;

        if let Some(fps) = self.clock.as_mut().and_then(|clock| clock.count_frame(now)) {
            self.fps = fps;
            tracing::debug!("FPS: {:.1}", fps);
            if let Some(observer) = self.fps_observer.as_mut() {
                observer(fps);
            }
        }

        self.schedule();
        Ok(TickOutcome::Stepped)
    }

    /// Run exactly one frame while stopped (frame advance).
    ///
    /// Returns `Ok(false)` without stepping if the scheduler is running.
    pub fn step(&mut self, io: FrameIo<'_>) -> Result<bool, SchedulerError> {
        if self.is_running() {
            return Ok(false);
        }
        self.run_one(io)?;
        Ok(true)
    }

    fn run_one(&mut self, io: FrameIo<'_>) -> Result<(), SchedulerError> {
        self.core.set_input(self.config.input_port, io.input);

        let step_start = Instant::now();
        if let Err(source) = self.core.run_frame() {
            tracing::error!("Emulation core faulted on frame {}: {}", self.frames_run, source);
            self.stop();
            return Err(SchedulerError::Step {
                frame: self.frames_run,
                source,
            });
        }

        let step_time = step_start.elapsed();
        if step_time > self.config.cpu_budget() {
            tracing::warn!(
                "Frame took {:?}, exceeds budget of {:?}",
                step_time,
                self.config.cpu_budget()
            );
        }

        io.video.present(self.core.frame_buffer());
        io.audio.publish(self.core.audio_samples());
        self.frames_run += 1;
        Ok(())
    }

    fn schedule(&mut self) {
        if let Some(stale) = self.pending.take() {
            self.refresh.cancel_refresh(stale);
        }
        self.pending = Some(self.refresh.request_refresh());
    }

    /// Change the target rate. Takes effect from the next tick.
    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            tracing::warn!("Ignoring invalid frame rate {}", frame_rate);
            return;
        }
        self.frame_rate = frame_rate;
        self.frame_interval = frame_interval(frame_rate);
    }

    /// Register an observer for once-per-second FPS reports
    pub fn on_fps(&mut self, observer: impl FnMut(f32) + 'static) {
        self.fps_observer = Some(Box::new(observer));
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_some()
    }

    /// FPS measured over the last complete window (0 when stopped)
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Total frames run since creation
    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    /// Reference timestamp of the last accepted frame, while running
    pub fn last_frame_time(&self) -> Option<Instant> {
        self.clock.as_ref().map(FrameClock::last_frame)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    pub fn refresh(&self) -> &R {
        &self.refresh
    }

    pub fn refresh_mut(&mut self) -> &mut R {
        &mut self.refresh
    }

    /// Consume the scheduler, returning the core
    pub fn into_core(mut self) -> C {
        self.stop();
        self.core
    }
}
