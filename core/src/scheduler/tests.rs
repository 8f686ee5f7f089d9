//! Tests for the frame scheduler

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use retrosync_shared::ButtonState;

use super::*;
use crate::test_utils::{RecordingPublisher, TestCore, TestVideoSink};

type TestScheduler = FrameScheduler<TestCore, ManualRefreshHost>;

fn scheduler(core: TestCore) -> TestScheduler {
    FrameScheduler::new(core, ManualRefreshHost::new(), SchedulerConfig::default())
}

/// Output sinks for one or more ticks
#[derive(Default)]
struct Outputs {
    video: TestVideoSink,
    audio: RecordingPublisher,
}

impl Outputs {
    fn io(&mut self, input: ButtonState) -> FrameIo<'_> {
        FrameIo {
            input,
            video: &mut self.video,
            audio: &mut self.audio,
        }
    }
}

/// Fire the pending refresh and tick, as a host would
fn fire(
    sched: &mut TestScheduler,
    out: &mut Outputs,
    now: Instant,
) -> Result<TickOutcome, SchedulerError> {
    assert!(sched.refresh_mut().fire().is_some(), "no refresh pending");
    sched.tick(now, out.io(ButtonState::NONE))
}

// ============================================================================
// Start / Stop
// ============================================================================

#[test]
fn test_new_is_stopped() {
    let sched = scheduler(TestCore::new());
    assert!(!sched.is_running());
    assert_eq!(sched.fps(), 0.0);
    assert_eq!(sched.frame_rate(), 60.0);
    assert!(sched.last_frame_time().is_none());
    assert_eq!(sched.refresh().requests(), 0);
}

#[test]
fn test_start_is_idempotent() {
    let mut sched = scheduler(TestCore::new());
    let t0 = Instant::now();
    sched.start(t0);
    sched.start(t0 + Duration::from_secs(1));

    assert!(sched.is_running());
    assert_eq!(sched.last_frame_time(), Some(t0));
    assert_eq!(sched.refresh().requests(), 1);
}

#[test]
fn test_stop_cancels_pending_refresh() {
    let mut sched = scheduler(TestCore::new());
    sched.start(Instant::now());
    assert!(sched.refresh().is_pending());

    sched.stop();
    assert!(!sched.is_running());
    assert!(!sched.refresh().is_pending());
    assert_eq!(sched.refresh().cancels(), 1);

    // Safe when already stopped
    sched.stop();
    assert_eq!(sched.refresh().cancels(), 1);
}

#[test]
fn test_toggle() {
    let mut sched = scheduler(TestCore::new());
    let t0 = Instant::now();
    sched.toggle(t0);
    assert!(sched.is_running());
    sched.toggle(t0);
    assert!(!sched.is_running());
}

#[test]
fn test_config_frame_rate_overrides_console() {
    let config = SchedulerConfig {
        frame_rate: Some(50.0),
        ..SchedulerConfig::default()
    };
    let sched = FrameScheduler::new(TestCore::new(), ManualRefreshHost::new(), config);
    assert_eq!(sched.frame_rate(), 50.0);
    assert_eq!(sched.frame_interval(), frame_interval(50.0));
}

#[test]
fn test_invalid_frame_rate_ignored() {
    let mut sched = scheduler(TestCore::new());
    sched.set_frame_rate(0.0);
    sched.set_frame_rate(f64::NAN);
    assert_eq!(sched.frame_rate(), 60.0);

    sched.set_frame_rate(30.0);
    assert_eq!(sched.frame_interval(), frame_interval(30.0));
}

// ============================================================================
// Ticking
// ============================================================================

#[test]
fn test_tick_when_stopped_is_idle() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let outcome = sched.tick(Instant::now(), out.io(ButtonState::NONE));
    assert_eq!(outcome.ok(), Some(TickOutcome::Idle));
    assert_eq!(sched.core().frames, 0);
}

#[test]
fn test_early_tick_skips_and_reschedules() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    sched.start(t0);

    // A 144 Hz display fires well before one 60 Hz interval
    let outcome = fire(&mut sched, &mut out, t0 + Duration::from_millis(7));
    assert_eq!(outcome.ok(), Some(TickOutcome::Skipped));
    assert_eq!(sched.core().frames, 0);
    assert!(sched.refresh().is_pending());
    assert_eq!(sched.last_frame_time(), Some(t0));
}

#[test]
fn test_accepted_tick_runs_one_frame() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    sched.start(t0);

    let now = t0 + sched.frame_interval();
    let outcome = fire(&mut sched, &mut out, now);
    assert_eq!(outcome.ok(), Some(TickOutcome::Stepped));
    assert_eq!(sched.core().frames, 1);
    assert_eq!(sched.frames_run(), 1);
    assert_eq!(out.video.frames, vec![1]);
    assert_eq!(out.audio.batches.len(), 1);
    assert!(sched.refresh().is_pending());
}

#[test]
fn test_reference_advances_by_exactly_one_interval() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    // Late and jittery refresh timestamps
    let offsets_ms = [17u64, 40, 55, 70, 90, 200];
    for (accepted, offset) in offsets_ms.iter().enumerate() {
        let outcome = fire(&mut sched, &mut out, t0 + Duration::from_millis(*offset));
        assert_eq!(outcome.ok(), Some(TickOutcome::Stepped));
        assert_eq!(
            sched.last_frame_time(),
            Some(t0 + interval * (accepted as u32 + 1))
        );
    }
}

#[test]
fn test_at_most_one_frame_per_tick() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    // Five intervals behind, still only one frame per callback
    fire(&mut sched, &mut out, t0 + interval * 5).expect("tick");
    assert_eq!(sched.core().frames, 1);
}

#[test]
fn test_backlog_catches_up_one_frame_per_tick() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    let now = t0 + interval * 3;
    for _ in 0..3 {
        assert_eq!(fire(&mut sched, &mut out, now).ok(), Some(TickOutcome::Stepped));
    }
    assert_eq!(fire(&mut sched, &mut out, now).ok(), Some(TickOutcome::Skipped));
    assert_eq!(sched.core().frames, 3);
}

#[test]
fn test_resync_threshold_reanchors_clock() {
    let config = SchedulerConfig {
        resync_threshold_ms: Some(100),
        ..SchedulerConfig::default()
    };
    let mut sched = FrameScheduler::new(TestCore::new(), ManualRefreshHost::new(), config);
    let mut out = Outputs::default();
    let t0 = Instant::now();
    sched.start(t0);

    let now = t0 + Duration::from_millis(500);
    fire(&mut sched, &mut out, now).expect("tick");
    assert_eq!(sched.last_frame_time(), Some(now));
    assert_eq!(
        fire(&mut sched, &mut out, now + Duration::from_millis(1)).ok(),
        Some(TickOutcome::Skipped)
    );
}

#[test]
fn test_input_latched_before_frame() {
    let config = SchedulerConfig {
        input_port: 1,
        ..SchedulerConfig::default()
    };
    let mut sched = FrameScheduler::new(TestCore::new(), ManualRefreshHost::new(), config);
    let mut out = Outputs::default();
    let t0 = Instant::now();
    sched.start(t0);

    sched.refresh_mut().fire();
    sched
        .tick(t0 + sched.frame_interval(), out.io(ButtonState::A | ButtonState::UP))
        .expect("tick");
    assert_eq!(sched.core().inputs, vec![(1, ButtonState::A | ButtonState::UP)]);
}

#[test]
fn test_frames_published_in_order() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    for n in 1..=4u32 {
        fire(&mut sched, &mut out, t0 + interval * n).expect("tick");
    }
    assert_eq!(out.video.frames, vec![1, 2, 3, 4]);
    let firsts: Vec<f32> = out.audio.batches.iter().map(|b| b[0]).collect();
    assert_eq!(firsts, vec![1.0, 2.0, 3.0, 4.0]);
    assert!(out.audio.batches.iter().all(|b| b.len() == 20));
}

// ============================================================================
// Stop guarantees and faults
// ============================================================================

#[test]
fn test_no_frames_after_stop() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);
    fire(&mut sched, &mut out, t0 + interval).expect("tick");
    sched.stop();

    // A stale callback from the host still arrives
    for n in 2..10u32 {
        let outcome = sched.tick(t0 + interval * n, out.io(ButtonState::NONE));
        assert_eq!(outcome.ok(), Some(TickOutcome::Idle));
    }
    assert_eq!(sched.core().frames, 1);
    assert_eq!(sched.fps(), 0.0);
}

#[test]
fn test_step_fault_stops_scheduler() {
    let mut sched = scheduler(TestCore::failing_at(2));
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    fire(&mut sched, &mut out, t0 + interval).expect("frame 1");
    fire(&mut sched, &mut out, t0 + interval * 2).expect("frame 2");
    let err = fire(&mut sched, &mut out, t0 + interval * 3).expect_err("frame 3 faults");

    assert!(matches!(
        err,
        SchedulerError::Step {
            frame: 2,
            source: CoreError::Step(_)
        }
    ));
    assert!(!sched.is_running());
    assert!(!sched.refresh().is_pending());

    // Faulted frame publishes nothing
    assert_eq!(out.video.frames, vec![1, 2]);
    assert_eq!(out.audio.batches.len(), 2);
}

#[test]
fn test_no_retry_after_fault() {
    let mut sched = scheduler(TestCore::failing_at(0));
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    assert!(fire(&mut sched, &mut out, t0 + interval).is_err());
    let outcome = sched.tick(t0 + Duration::from_secs(1), out.io(ButtonState::NONE));
    assert_eq!(outcome.ok(), Some(TickOutcome::Idle));
}

// ============================================================================
// FPS reporting
// ============================================================================

#[test]
fn test_fps_reported_once_per_second() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let reports = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reports);
    sched.on_fps(move |fps| sink.borrow_mut().push(fps));

    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);

    // Just over two seconds of frames, ticked exactly on schedule
    for n in 1..=130u32 {
        fire(&mut sched, &mut out, t0 + interval * n).expect("tick");
    }

    let reports = reports.borrow();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|fps| (fps - 60.0).abs() < 0.5));
    assert!((sched.fps() - 60.0).abs() < 0.5);
}

#[test]
fn test_stop_resets_fps() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    let t0 = Instant::now();
    let interval = sched.frame_interval();
    sched.start(t0);
    for n in 1..=70u32 {
        fire(&mut sched, &mut out, t0 + interval * n).expect("tick");
    }
    assert!(sched.fps() > 0.0);

    sched.stop();
    assert_eq!(sched.fps(), 0.0);
}

#[test]
fn test_frame_clock_window() {
    let t0 = Instant::now();
    let mut clock = FrameClock::new(t0);
    for n in 1..30u32 {
        assert!(clock.count_frame(t0 + Duration::from_millis(n as u64 * 33)).is_none());
    }
    let fps = clock.count_frame(t0 + FPS_WINDOW).expect("window complete");
    assert_eq!(fps, 30.0);
}

#[test]
fn test_frame_clock_elapsed_saturates() {
    let t0 = Instant::now();
    let mut clock = FrameClock::new(t0 + Duration::from_secs(1));
    assert_eq!(clock.elapsed(t0), Duration::ZERO);

    clock.advance(Duration::from_millis(10));
    clock.resync(t0);
    assert_eq!(clock.last_frame(), t0);
}

// ============================================================================
// Frame advance
// ============================================================================

#[test]
fn test_step_while_stopped() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();

    assert!(sched.step(out.io(ButtonState::B)).expect("step"));
    assert_eq!(sched.core().frames, 1);
    assert_eq!(sched.core().last_input(), Some(ButtonState::B));
    assert!(!sched.is_running());
    assert_eq!(sched.refresh().requests(), 0);
}

#[test]
fn test_step_refused_while_running() {
    let mut sched = scheduler(TestCore::new());
    let mut out = Outputs::default();
    sched.start(Instant::now());
    assert!(!sched.step(out.io(ButtonState::NONE)).expect("step"));
    assert_eq!(sched.core().frames, 0);
}

#[test]
fn test_into_core_stops() {
    let mut sched = scheduler(TestCore::new());
    sched.start(Instant::now());
    let core = sched.into_core();
    assert_eq!(core.frames, 0);
}
