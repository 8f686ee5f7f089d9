//! Console timing specifications

/// Timing characteristics of an emulated console.
///
/// The scheduler paces frames from `frame_rate`; the audio path assumes the
/// core emits interleaved stereo at `sample_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSpecs {
    /// Console name (e.g., "Super Famicom (NTSC)")
    pub name: &'static str,
    /// Native video frames per second
    pub frame_rate: f64,
    /// Native audio output rate in Hz
    pub sample_rate: u32,
    /// Framebuffer size (width, height)
    pub resolution: (u32, u32),
    /// Number of controller ports
    pub ports: usize,
}

impl ConsoleSpecs {
    /// Interleaved stereo samples produced per frame at native rate
    pub fn samples_per_frame(&self) -> usize {
        ((self.sample_rate as f64 / self.frame_rate).round() as usize) * 2
    }
}

/// NTSC 16-bit console timing.
pub const NTSC_SPECS: ConsoleSpecs = ConsoleSpecs {
    name: "16-bit console (NTSC)",
    frame_rate: 60.0988,
    sample_rate: 32_040,
    resolution: (256, 224),
    ports: 2,
};

/// PAL 16-bit console timing.
pub const PAL_SPECS: ConsoleSpecs = ConsoleSpecs {
    name: "16-bit console (PAL)",
    frame_rate: 50.007,
    sample_rate: 32_040,
    resolution: (256, 239),
    ports: 2,
};
