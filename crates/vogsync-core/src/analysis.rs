//! Per-frame audio analysis
//!
//! Extracts the perceptual features the animation runs on: loudness (gained RMS),
//! spectral centroid of the real-input magnitude spectrum, and a color derived from
//! the centroid by interpolating between a warm and a cool endpoint.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::CoreError, Result};

/// RMS gain applied before clipping loudness into [0, 1]
pub const LOUDNESS_GAIN: f32 = 10.0;

/// Color at centroid 0 (amber)
pub const WARM: Rgb = Rgb::new(255, 140, 40);

/// Color at the Nyquist frequency (blue/white)
pub const COOL: Rgb = Rgb::new(180, 220, 255);

/// 8-bit RGB triple. Serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        c.to_array()
    }
}

/// Features extracted from one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// Gained RMS (0.0 - 1.0)
    pub loudness: f32,
    /// Spectral centroid in Hz
    pub centroid: f32,
    /// Color derived from the centroid
    pub color: Rgb,
    /// 1.0 on a detected onset, otherwise 0.0
    pub onset_strength: f32,
    /// Fundamental frequency in Hz, 0.0 when unvoiced or unavailable
    pub pitch_hz: f32,
}

impl Features {
    /// Features used when a frame could not be analyzed.
    pub fn neutral(sample_rate: u32, color_shift: f32) -> Self {
        Self {
            loudness: 0.0,
            centroid: 0.0,
            color: color_from_centroid(0.0, sample_rate, color_shift),
            onset_strength: 0.0,
            pitch_hz: 0.0,
        }
    }

    /// Attach onset/pitch detector output.
    pub fn with_detection(mut self, onset: bool, pitch_hz: f32) -> Self {
        self.onset_strength = if onset { 1.0 } else { 0.0 };
        self.pitch_hz = if pitch_hz.is_finite() && pitch_hz > 0.0 {
            pitch_hz
        } else {
            0.0
        };
        self
    }
}

/// Loudness of a frame: RMS times [`LOUDNESS_GAIN`], clipped to [0, 1].
///
/// Non-finite samples count as silence. An empty frame has loudness 0.
pub fn loudness(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f32 = frame
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    let rms = (sum / frame.len() as f32).sqrt();
    (rms * LOUDNESS_GAIN).clamp(0.0, 1.0)
}

/// Spectral centroid of a frame in Hz.
///
/// Plans a transform for this call only; the frame loop uses
/// [`FrameAnalyzer::spectral_centroid`] which reuses its plan.
pub fn centroid(frame: &[f32], sample_rate: u32) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let fft = FftPlanner::new().plan_fft_forward(frame.len());
    let mut buffer = load_buffer(frame);
    fft.process(&mut buffer);
    centroid_of_spectrum(&buffer, sample_rate)
}

/// Map a centroid to a color between [`WARM`] and [`COOL`].
///
/// `t = clip(centroid / (sr / 2), 0, 1)`, shifted by `shift` and wrapped into
/// [0, 1). A zero shift leaves `t` unwrapped so the Nyquist centroid maps to
/// [`COOL`] exactly.
pub fn color_from_centroid(centroid: f32, sample_rate: u32, shift: f32) -> Rgb {
    let nyquist = sample_rate as f32 / 2.0;
    let mut t = if nyquist > 0.0 && centroid.is_finite() {
        (centroid / nyquist).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if shift.is_finite() && shift != 0.0 {
        t = (t + shift).rem_euclid(1.0);
    }

    let lerp = |warm: u8, cool: u8| ((1.0 - t) * warm as f32 + t * cool as f32) as u8;
    Rgb::new(
        lerp(WARM.r, COOL.r),
        lerp(WARM.g, COOL.g),
        lerp(WARM.b, COOL.b),
    )
}

fn load_buffer(frame: &[f32]) -> Vec<Complex<f32>> {
    frame
        .iter()
        .map(|&s| Complex::new(if s.is_finite() { s } else { 0.0 }, 0.0))
        .collect()
}

/// Centroid over the non-negative frequency bins `0..=N/2` of a full complex spectrum.
fn centroid_of_spectrum(spectrum: &[Complex<f32>], sample_rate: u32) -> f32 {
    let n = spectrum.len();
    if n == 0 {
        return 0.0;
    }
    let bin_width = sample_rate as f32 / n as f32;

    let mut weighted = 0.0f64;
    let mut total = 0.0f64;
    for (k, bin) in spectrum.iter().take(n / 2 + 1).enumerate() {
        let magnitude = bin.norm() as f64;
        weighted += k as f64 * bin_width as f64 * magnitude;
        total += magnitude;
    }

    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    (weighted / total) as f32
}

/// Frame analyzer with a transform planned once for a fixed frame length
pub struct FrameAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    frame_len: usize,
    sample_rate: u32,
    fft_buffer: Vec<Complex<f32>>,
    scratch_buffer: Vec<Complex<f32>>,
}

impl FrameAnalyzer {
    /// Create an analyzer for frames of `frame_len` samples at `sample_rate`.
    pub fn new(frame_len: usize, sample_rate: u32) -> Self {
        let frame_len = frame_len.max(1);
        let fft = FftPlanner::new().plan_fft_forward(frame_len);
        let scratch_len = fft.get_inplace_scratch_len();

        tracing::debug!(
            "FrameAnalyzer created: frame_len={}, sample_rate={}",
            frame_len,
            sample_rate
        );

        Self {
            fft,
            frame_len,
            sample_rate,
            fft_buffer: vec![Complex::new(0.0, 0.0); frame_len],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Centroid of a frame using the planned transform.
    ///
    /// Frames of a different length fall back to [`centroid`].
    pub fn spectral_centroid(&mut self, frame: &[f32]) -> f32 {
        if frame.len() != self.frame_len {
            return centroid(frame, self.sample_rate);
        }
        for (slot, &s) in self.fft_buffer.iter_mut().zip(frame) {
            *slot = Complex::new(if s.is_finite() { s } else { 0.0 }, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);
        centroid_of_spectrum(&self.fft_buffer, self.sample_rate)
    }

    /// Analyze one frame. Onset and pitch are left at zero.
    ///
    /// Rejects frames of the wrong length or containing non-finite samples; the
    /// caller decides how to degrade.
    pub fn analyze(&mut self, frame: &[f32], color_shift: f32) -> Result<Features> {
        if frame.len() != self.frame_len {
            return Err(CoreError::InvalidFrame(format!(
                "expected {} samples, got {}",
                self.frame_len,
                frame.len()
            )));
        }
        if let Some(pos) = frame.iter().position(|s| !s.is_finite()) {
            return Err(CoreError::InvalidFrame(format!(
                "non-finite sample at offset {}",
                pos
            )));
        }

        let centroid = self.spectral_centroid(frame);
        Ok(Features {
            loudness: loudness(frame),
            centroid,
            color: color_from_centroid(centroid, self.sample_rate, color_shift),
            onset_strength: 0.0,
            pitch_hz: 0.0,
        })
    }
}
