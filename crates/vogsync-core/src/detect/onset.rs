//! Spectral-flux onset detection
//!
//! Flux is the sum of positive magnitude increases between consecutive windowed
//! spectra. A frame is an onset when its flux exceeds an adaptive threshold
//! (`ratio` × mean of recent flux + `offset`), the window is above the silence
//! gate, and the minimum inter-onset interval has elapsed.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

use super::{level_db, SlidingWindow};

const FLUX_HISTORY: usize = 8;

/// Onset detector over a sliding Hann-windowed spectrum
pub struct SpectralFluxOnset {
    fft: Arc<dyn Fft<f32>>,
    window: SlidingWindow,
    hann: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    scratch_buffer: Vec<Complex<f32>>,
    prev_magnitudes: Vec<f32>,
    flux_history: VecDeque<f32>,
    /// Multiplier on the mean of recent flux
    pub ratio: f32,
    /// Absolute flux floor added to the threshold
    pub offset: f32,
    /// Windows quieter than this never produce onsets (dB full scale)
    pub silence_db: f32,
    min_interval_frames: usize,
    frames_since_onset: usize,
}

impl SpectralFluxOnset {
    /// Create a detector with a `window_len` analysis window advanced by `hop_len`.
    pub fn new(window_len: usize, hop_len: usize, sample_rate: u32) -> Self {
        let window_len = window_len.max(2);
        let fft = FftPlanner::new().plan_fft_forward(window_len);
        let scratch_len = fft.get_inplace_scratch_len();

        let hann = (0..window_len)
            .map(|i| {
                let t = i as f32 / (window_len - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        // ~50ms between onsets
        let hop_secs = hop_len.max(1) as f32 / sample_rate.max(1) as f32;
        let min_interval_frames = (0.05 / hop_secs).ceil().max(1.0) as usize;

        Self {
            fft,
            window: SlidingWindow::new(window_len),
            hann,
            fft_buffer: vec![Complex::new(0.0, 0.0); window_len],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            prev_magnitudes: vec![0.0; window_len / 2 + 1],
            flux_history: VecDeque::with_capacity(FLUX_HISTORY),
            ratio: 1.5,
            offset: 0.02,
            silence_db: -70.0,
            min_interval_frames,
            frames_since_onset: min_interval_frames,
        }
    }

    /// Push the next frame and report whether it is an onset.
    pub fn process(&mut self, frame: &[f32]) -> bool {
        let samples = self.window.push(frame);
        let silent = level_db(samples) < self.silence_db;

        for ((slot, &s), &w) in self.fft_buffer.iter_mut().zip(samples).zip(&self.hann) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        let norm = 2.0 / self.fft_buffer.len() as f32;
        let mut flux = 0.0f32;
        for (prev, bin) in self.prev_magnitudes.iter_mut().zip(&self.fft_buffer) {
            let magnitude = bin.norm() * norm;
            flux += (magnitude - *prev).max(0.0);
            *prev = magnitude;
        }

        let mean = if self.flux_history.is_empty() {
            0.0
        } else {
            self.flux_history.iter().sum::<f32>() / self.flux_history.len() as f32
        };
        let threshold = mean * self.ratio + self.offset;

        self.frames_since_onset = self.frames_since_onset.saturating_add(1);
        let is_onset =
            !silent && flux > threshold && self.frames_since_onset >= self.min_interval_frames;
        if is_onset {
            self.frames_since_onset = 0;
            tracing::trace!("onset: flux={:.4} threshold={:.4}", flux, threshold);
        }

        self.flux_history.push_back(flux);
        if self.flux_history.len() > FLUX_HISTORY {
            self.flux_history.pop_front();
        }

        is_onset
    }
}
