//! Onset and pitch detection
//!
//! Detection is an optional capability. A session picks its detector once, at
//! construction: [`SpectralOnsetPitch`] when detection is enabled, [`NoOnsetPitch`]
//! otherwise. The frame loop only ever talks to the [`OnsetPitchDetector`] trait.
//!
//! Both built-in detectors analyze a window of twice the frame length that slides
//! forward by one frame per call.

pub mod onset;
pub mod pitch;

pub use onset::SpectralFluxOnset;
pub use pitch::YinPitch;

/// Transient and fundamental-frequency detection over successive frames.
///
/// Implementations keep their own history; frames must be passed in playback order.
pub trait OnsetPitchDetector: Send {
    /// Whether the frame starts a transient.
    fn onset(&mut self, frame: &[f32]) -> bool;

    /// Fundamental frequency in Hz. Never negative; 0.0 means unvoiced.
    fn pitch(&mut self, frame: &[f32]) -> f32;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Detector used when onset/pitch detection is unavailable or disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOnsetPitch;

impl OnsetPitchDetector for NoOnsetPitch {
    fn onset(&mut self, _frame: &[f32]) -> bool {
        false
    }

    fn pitch(&mut self, _frame: &[f32]) -> f32 {
        0.0
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Spectral-flux onsets plus YIN pitch.
pub struct SpectralOnsetPitch {
    onset: SpectralFluxOnset,
    pitch: YinPitch,
}

impl SpectralOnsetPitch {
    /// Detector for frames of `frame_len` samples (window = 2 × frame, hop = frame).
    pub fn new(frame_len: usize, sample_rate: u32) -> Self {
        let window_len = (frame_len * 2).max(4);
        Self {
            onset: SpectralFluxOnset::new(window_len, frame_len, sample_rate),
            pitch: YinPitch::new(window_len, sample_rate),
        }
    }
}

impl OnsetPitchDetector for SpectralOnsetPitch {
    fn onset(&mut self, frame: &[f32]) -> bool {
        self.onset.process(frame)
    }

    fn pitch(&mut self, frame: &[f32]) -> f32 {
        self.pitch.process(frame).max(0.0)
    }

    fn name(&self) -> &'static str {
        "spectral-flux+yin"
    }
}

/// Select the session's detector.
pub fn detector_for(
    enabled: bool,
    frame_len: usize,
    sample_rate: u32,
) -> Box<dyn OnsetPitchDetector> {
    if enabled {
        Box::new(SpectralOnsetPitch::new(frame_len, sample_rate))
    } else {
        tracing::warn!("onset/pitch detection disabled - blooms will not spawn");
        Box::new(NoOnsetPitch)
    }
}

/// Fixed-length analysis window that slides forward by each pushed frame.
#[derive(Debug, Clone)]
pub(crate) struct SlidingWindow {
    samples: Vec<f32>,
}

impl SlidingWindow {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub(crate) fn push(&mut self, frame: &[f32]) -> &[f32] {
        let len = self.samples.len();
        let frame = if frame.len() > len {
            &frame[frame.len() - len..]
        } else {
            frame
        };
        self.samples.copy_within(frame.len().., 0);
        let start = len - frame.len();
        for (slot, &s) in self.samples[start..].iter_mut().zip(frame) {
            *slot = if s.is_finite() { s } else { 0.0 };
        }
        &self.samples
    }
}

/// Mean power of a window in dB (full scale), -inf-safe.
pub(crate) fn level_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let power = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    10.0 * (power + 1e-20).log10()
}
