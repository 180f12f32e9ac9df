//! YIN fundamental-frequency estimation
//!
//! Difference function over the first half of the window, cumulative-mean
//! normalisation, first dip under the absolute threshold, parabolic refinement.

use super::{level_db, SlidingWindow};

/// YIN pitch tracker over a sliding window
pub struct YinPitch {
    sample_rate: u32,
    window: SlidingWindow,
    window_len: usize,
    cmnd: Vec<f32>,
    /// Absolute threshold on the normalised difference
    pub threshold: f32,
    /// Lowest reported frequency (Hz)
    pub min_freq: f32,
    /// Highest reported frequency (Hz)
    pub max_freq: f32,
    /// Windows quieter than this are unvoiced (dB full scale)
    pub silence_db: f32,
}

impl YinPitch {
    pub fn new(window_len: usize, sample_rate: u32) -> Self {
        let window_len = window_len.max(4);
        Self {
            sample_rate,
            window: SlidingWindow::new(window_len),
            window_len,
            cmnd: vec![0.0; window_len / 2 + 1],
            threshold: 0.15,
            min_freq: 50.0,
            max_freq: 1500.0,
            silence_db: -40.0,
        }
    }

    /// Push the next frame and estimate the pitch of the current window.
    pub fn process(&mut self, frame: &[f32]) -> f32 {
        let samples = self.window.push(frame).to_vec();
        self.estimate(&samples)
    }

    fn estimate(&mut self, samples: &[f32]) -> f32 {
        if self.sample_rate == 0 || level_db(samples) < self.silence_db {
            return 0.0;
        }

        let sr = self.sample_rate as f32;
        let half = self.window_len / 2;
        let tau_min = ((sr / self.max_freq).floor() as usize).max(2);
        let tau_max = ((sr / self.min_freq).ceil() as usize).min(half);
        if tau_min + 1 >= tau_max {
            return 0.0;
        }

        // Difference function and its cumulative-mean normalisation
        self.cmnd[0] = 1.0;
        let mut running = 0.0f32;
        for tau in 1..=tau_max {
            let d: f32 = (0..half)
                .map(|j| {
                    let delta = samples[j] - samples[j + tau];
                    delta * delta
                })
                .sum();
            running += d;
            self.cmnd[tau] = if running > 0.0 {
                d * tau as f32 / running
            } else {
                1.0
            };
        }

        let mut tau = tau_min;
        let mut found = None;
        while tau < tau_max {
            if self.cmnd[tau] < self.threshold {
                while tau + 1 < tau_max && self.cmnd[tau + 1] < self.cmnd[tau] {
                    tau += 1;
                }
                found = Some(tau);
                break;
            }
            tau += 1;
        }

        let Some(tau) = found else {
            return 0.0;
        };

        let refined = self.parabolic(tau);
        if refined <= 0.0 {
            return 0.0;
        }
        let freq = sr / refined;
        if freq.is_finite() && (self.min_freq..=self.max_freq).contains(&freq) {
            freq
        } else {
            0.0
        }
    }

    fn parabolic(&self, tau: usize) -> f32 {
        if tau == 0 || tau + 1 >= self.cmnd.len() {
            return tau as f32;
        }
        let (a, b, c) = (self.cmnd[tau - 1], self.cmnd[tau], self.cmnd[tau + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() < f32::EPSILON {
            tau as f32
        } else {
            tau as f32 + 0.5 * (a - c) / denom
        }
    }
}
