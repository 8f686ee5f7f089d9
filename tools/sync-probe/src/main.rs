//! Sync probe - headless driver for the synchronization layer
//!
//! Runs a synthetic tone core through a [`Session`] on a simulated display
//! refresh, with real audio output when a device is available. Useful for
//! checking pacing and buffer health on a given machine.
//!
//! # Usage
//!
//! ```bash
//! # Ten seconds on a simulated 144 Hz display
//! sync-probe --seconds 10 --display-hz 144
//!
//! # PAL timing through the direct fallback path, with renderer health logs
//! RUST_LOG=debug sync-probe --pal --direct
//! ```

mod tone;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use retrosync_core::{
    Config, GamepadSource, ManualRefreshHost, NoGamepads, RendererHealth, Session, VideoFrame,
    VideoSink,
};
use retrosync_shared::{NTSC_SPECS, PAL_SPECS};
use tracing::{error, info, warn};

use tone::ToneCore;

/// Headless driver for frame pacing, audio streaming and input
#[derive(Parser)]
#[command(name = "sync-probe")]
#[command(version)]
struct Args {
    /// How long to run
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Simulated display refresh rate in Hz
    #[arg(long, default_value_t = 144.0)]
    display_hz: f64,

    /// Override the core's native frame rate
    #[arg(long)]
    rate: Option<f64>,

    /// Use PAL instead of NTSC timing
    #[arg(long)]
    pal: bool,

    /// Output volume (0.0-1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Skip the real-time renderer and use direct output
    #[arg(long)]
    direct: bool,

    /// Make the core fault after this many frames
    #[arg(long)]
    fault_at: Option<u64>,

    /// Read settings from this file instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Video sink that only counts presented frames
#[derive(Default)]
struct FrameCounter {
    presented: u64,
    last_corner: u32,
}

impl VideoSink for FrameCounter {
    fn present(&mut self, frame: VideoFrame<'_>) {
        self.presented += 1;
        self.last_corner = frame.pixels.first().copied().unwrap_or(0);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if !(args.display_hz.is_finite() && args.display_hz > 0.0) {
        bail!("--display-hz must be positive");
    }
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        bail!("--seconds must not be negative");
    }

    let config = load_config(&args)?;
    let specs = if args.pal { PAL_SPECS } else { NTSC_SPECS };
    info!("Probing {} for {:.1}s", specs.name, args.seconds);

    let core = ToneCore::new(specs, args.fault_at);
    let mut session = Session::new(core, ManualRefreshHost::new(), &config);
    session
        .scheduler_mut()
        .on_fps(|fps| info!("FPS: {:.2}", fps));
    session
        .input_mut()
        .on_change(|buttons| info!("Buttons: {:#06x}", buttons.mask()));

    if args.no_audio {
        info!("Audio disabled");
    } else {
        match session.start_audio() {
            Ok(Some(mode)) => info!("Audio started ({:?})", mode),
            Ok(None) => info!("Audio disabled in configuration"),
            Err(e) => warn!("Audio unavailable: {}", e),
        }
    }

    session
        .load_rom(&[], Instant::now())
        .context("failed to start tone core")?;

    let mut gamepads = gamepad_source();
    let mut video = FrameCounter::default();
    let display_interval = Duration::from_secs_f64(1.0 / args.display_hz);
    let deadline = Instant::now() + Duration::from_secs_f64(args.seconds);
    let mut next_refresh = Instant::now();
    let mut callbacks = 0u64;
    let mut last_health: Option<RendererHealth> = None;

    while Instant::now() < deadline {
        next_refresh += display_interval;
        let now = Instant::now();
        if next_refresh > now {
            std::thread::sleep(next_refresh - now);
        }

        if session.scheduler_mut().refresh_mut().fire().is_none() {
            continue;
        }
        callbacks += 1;

        if let Err(e) = session.on_refresh(Instant::now(), &mut video, gamepads.as_mut()) {
            error!("{}", e);
            break;
        }

        let health = session.audio_health();
        if health != last_health {
            if let Some(health) = health {
                info!(
                    "Audio: underruns={} min_depth={} requests={} overruns={}",
                    health.underruns, health.min_depth, health.requests, health.overruns
                );
            }
            last_health = health;
        }
    }

    let fps = session.scheduler().fps();
    let frames = session.scheduler().frames_run();
    let core = session.shutdown();

    info!(
        "Done: {} refresh callbacks, {} frames stepped, {} presented, last FPS {:.2}",
        callbacks, frames, video.presented, fps
    );
    info!(
        "Core ran {} frames, last corner pixel {:#010x}",
        core.frames(),
        video.last_corner
    );
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => retrosync_core::config::load(),
    };

    if let Some(rate) = args.rate {
        config.scheduler.frame_rate = Some(rate);
    }
    if let Some(volume) = args.volume {
        config.audio.volume = volume.clamp(0.0, 1.0);
    }
    if args.direct {
        config.audio.force_direct = true;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "gamepad")]
fn gamepad_source() -> Box<dyn GamepadSource> {
    let source = retrosync_core::GilrsSource::new();
    if source.is_available() {
        Box::new(source)
    } else {
        Box::new(NoGamepads)
    }
}

#[cfg(not(feature = "gamepad"))]
fn gamepad_source() -> Box<dyn GamepadSource> {
    Box::new(NoGamepads)
}
