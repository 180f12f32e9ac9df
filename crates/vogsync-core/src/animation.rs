//! Animation state machines
//!
//! A session runs exactly one of two animations, chosen when it starts:
//!
//! - **Wave**: a single head sweeps around the zone ring. Onsets kick its speed
//!   (scaled by pitch), the speed decays every frame, and loudness sets its width.
//! - **Bloom**: every onset spawns a burst at a position given by the spectral
//!   centroid. Bursts grow and fade at fixed rates and are dropped once spent.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::analysis::{Features, Rgb};
use crate::params::LiveParameters;
use crate::{error::CoreError, Result};

/// Per-frame speed retention of the wave head
pub const SPEED_RETENTION: f32 = 0.7;
/// Speed added by a full-strength onset at reference pitch
pub const ONSET_KICK: f32 = 1.5;
/// Pitch at which the onset kick is unscaled (Hz)
pub const REFERENCE_PITCH_HZ: f32 = 300.0;
/// Narrowest wave head
pub const MIN_WIDTH: f32 = 0.04;
/// Extra width reached at full energy
pub const WIDTH_RANGE: f32 = 0.2;
/// Bloom radius growth per second
pub const RADIUS_GROWTH: f32 = 0.6;
/// Bloom life lost per second
pub const LIFE_DECAY: f32 = 0.9;
/// Radius of a fresh bloom before `bloom_scale`
pub const BASE_RADIUS: f32 = 0.02;

/// Which animation a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualMode {
    Wave,
    #[default]
    Bloom,
}

impl fmt::Display for VisualMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualMode::Wave => f.write_str("wave"),
            VisualMode::Bloom => f.write_str("bloom"),
        }
    }
}

impl FromStr for VisualMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wave" => Ok(VisualMode::Wave),
            "bloom" => Ok(VisualMode::Bloom),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

/// The moving head of wave mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveHead {
    /// Position on the zone ring, in [0, 1)
    pub position: f32,
    /// Signed speed in ring lengths per second
    pub speed: f32,
    /// Gaussian width of the head
    pub width: f32,
}

impl Default for WaveHead {
    fn default() -> Self {
        Self {
            position: 0.0,
            speed: 0.0,
            width: 0.08,
        }
    }
}

impl WaveHead {
    pub fn step(
        &mut self,
        dt: f32,
        energy: f32,
        onset_strength: f32,
        pitch_hz: f32,
        wave_speed: f32,
    ) {
        let pitch_factor = if pitch_hz > 0.0 {
            (pitch_hz / REFERENCE_PITCH_HZ).clamp(0.5, 2.0)
        } else {
            1.0
        };
        let speed =
            self.speed * SPEED_RETENTION + onset_strength * ONSET_KICK * pitch_factor * wave_speed;

        let position = wrap_unit(self.position + speed * dt);
        if position.is_finite() && speed.is_finite() {
            self.speed = speed;
            self.position = position;
        } else {
            // A non-finite knob would poison the head for the rest of the session
            self.speed = 0.0;
        }

        let energy = if energy.is_finite() { energy } else { 0.0 };
        self.width = MIN_WIDTH + WIDTH_RANGE * (energy * 3.0).clamp(0.0, 1.0);
    }
}

/// Wrap into [0, 1). `rem_euclid` can round up to exactly 1.0 for tiny negatives.
fn wrap_unit(x: f32) -> f32 {
    let wrapped = x.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// A transient burst spawned by an onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bloom {
    pub center: f32,
    pub radius: f32,
    pub life: f32,
    pub color: Rgb,
}

/// Live blooms, oldest first.
///
/// Every bloom decays at the same rate and new blooms start at full life, so the
/// oldest bloom always expires first and expired blooms can be popped from the
/// front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BloomField {
    blooms: VecDeque<Bloom>,
}

impl BloomField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a bloom at full life.
    pub fn add(&mut self, center: f32, color: Rgb, scale: f32) {
        self.blooms.push_back(Bloom {
            center,
            radius: BASE_RADIUS * scale,
            life: 1.0,
            color,
        });
    }

    /// Grow and fade every bloom, then drop expired ones from the front.
    pub fn step(&mut self, dt: f32) {
        for bloom in &mut self.blooms {
            bloom.radius += dt * RADIUS_GROWTH;
            bloom.life -= dt * LIFE_DECAY;
        }
        while self.blooms.front().is_some_and(|b| b.life <= 0.0) {
            self.blooms.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bloom> {
        self.blooms.iter()
    }

    pub fn len(&self) -> usize {
        self.blooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blooms.is_empty()
    }
}

/// Per-session animation state
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationState {
    Wave(WaveHead),
    Bloom(BloomField),
}

impl AnimationState {
    pub fn new(mode: VisualMode) -> Self {
        match mode {
            VisualMode::Wave => AnimationState::Wave(WaveHead::default()),
            VisualMode::Bloom => AnimationState::Bloom(BloomField::new()),
        }
    }

    pub fn mode(&self) -> VisualMode {
        match self {
            AnimationState::Wave(_) => VisualMode::Wave,
            AnimationState::Bloom(_) => VisualMode::Bloom,
        }
    }

    /// Advance one frame.
    ///
    /// In bloom mode the existing blooms decay first, then an onset spawns a new
    /// bloom at `clip(centroid / nyquist, 0, 1)` with the frame color.
    pub fn advance(
        &mut self,
        dt: f32,
        features: &Features,
        sample_rate: u32,
        params: &LiveParameters,
    ) {
        match self {
            AnimationState::Wave(head) => head.step(
                dt,
                features.loudness,
                features.onset_strength,
                features.pitch_hz,
                params.wave_speed,
            ),
            AnimationState::Bloom(field) => {
                field.step(dt);
                if features.onset_strength != 0.0 {
                    let center = centroid_position(features.centroid, sample_rate);
                    field.add(center, features.color, params.bloom_scale);
                    tracing::trace!("bloom spawned at {:.3} ({} live)", center, field.len());
                }
            }
        }
    }
}

fn centroid_position(centroid: f32, sample_rate: u32) -> f32 {
    let nyquist = sample_rate as f32 / 2.0;
    if nyquist <= 0.0 || !centroid.is_finite() {
        return 0.0;
    }
    (centroid / nyquist).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::WARM;

    const DT: f32 = 0.03;

    fn onset_features(centroid: f32) -> Features {
        Features {
            loudness: 0.5,
            centroid,
            color: Rgb::new(10, 20, 30),
            onset_strength: 1.0,
            pitch_hz: 0.0,
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("wave".parse::<VisualMode>().unwrap(), VisualMode::Wave);
        assert_eq!(" BLOOM ".parse::<VisualMode>().unwrap(), VisualMode::Bloom);
        assert!("strobe".parse::<VisualMode>().is_err());
        assert_eq!(VisualMode::default(), VisualMode::Bloom);
    }

    #[test]
    fn test_wave_onset_kick() {
        let mut head = WaveHead::default();
        head.step(DT, 0.0, 1.0, 0.0, 1.0);
        assert!((head.speed - 1.5).abs() < 1e-6);
        assert!((head.position - 0.045).abs() < 1e-6);
        assert!((head.width - MIN_WIDTH).abs() < 1e-6);
    }

    #[test]
    fn test_wave_pitch_factor_is_clamped() {
        let mut low = WaveHead::default();
        low.step(DT, 0.0, 1.0, 30.0, 1.0);
        assert!((low.speed - 0.75).abs() < 1e-6);

        let mut high = WaveHead::default();
        high.step(DT, 0.0, 1.0, 3000.0, 1.0);
        assert!((high.speed - 3.0).abs() < 1e-6);

        let mut mid = WaveHead::default();
        mid.step(DT, 0.0, 1.0, 450.0, 2.0);
        assert!((mid.speed - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_wave_decays_without_onsets() {
        let mut head = WaveHead {
            speed: 2.0,
            ..Default::default()
        };
        for _ in 0..100 {
            head.step(DT, 0.0, 0.0, 0.0, 1.0);
        }
        assert!(head.speed.abs() < 1e-6);
        let parked = head.position;
        head.step(DT, 0.0, 0.0, 0.0, 1.0);
        assert!((head.position - parked).abs() < 1e-6);
    }

    #[test]
    fn test_wave_width_follows_energy() {
        let mut head = WaveHead::default();
        head.step(DT, 1.0, 0.0, 0.0, 1.0);
        assert!((head.width - 0.24).abs() < 1e-6);
        head.step(DT, 0.1, 0.0, 0.0, 1.0);
        assert!((head.width - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_wave_negative_speed_wraps() {
        let mut head = WaveHead::default();
        head.step(DT, 0.0, 1.0, 0.0, -1.0);
        assert!(head.position >= 0.0 && head.position < 1.0);
        assert!((head.position - (1.0 - 0.045)).abs() < 1e-5);
    }

    #[test]
    fn test_wrap_unit_never_returns_one() {
        assert_eq!(wrap_unit(-1e-9), 0.0);
        assert_eq!(wrap_unit(1.0), 0.0);
        assert!((wrap_unit(2.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bloom_add_initial_values() {
        let mut field = BloomField::new();
        field.add(0.25, WARM, 2.0);
        let bloom = field.iter().next().unwrap();
        assert_eq!(bloom.center, 0.25);
        assert_eq!(bloom.life, 1.0);
        assert!((bloom.radius - 0.04).abs() < 1e-7);
    }

    #[test]
    fn test_bloom_expires_when_life_reaches_zero() {
        let mut field = BloomField::new();
        field.add(0.5, WARM, 1.0);

        // life after n steps = 1 - n * 0.027; the 38th step takes it below zero
        for step in 1..=37 {
            field.step(DT);
            assert_eq!(field.len(), 1, "bloom dropped early at step {}", step);
        }
        field.step(DT);
        assert!(field.is_empty());
    }

    #[test]
    fn test_older_blooms_expire_first() {
        let mut field = BloomField::new();
        field.add(0.1, WARM, 1.0);
        for _ in 0..20 {
            field.step(DT);
        }
        field.add(0.9, WARM, 1.0);
        for _ in 0..18 {
            field.step(DT);
        }
        assert_eq!(field.len(), 1);
        assert_eq!(field.iter().next().unwrap().center, 0.9);
    }

    #[test]
    fn test_advance_bloom_spawns_on_onset_only() {
        let params = LiveParameters::default();
        let mut state = AnimationState::new(VisualMode::Bloom);

        let quiet = Features::neutral(22050, 0.0);
        state.advance(DT, &quiet, 22050, &params);
        assert!(matches!(&state, AnimationState::Bloom(f) if f.is_empty()));

        state.advance(DT, &onset_features(5512.5), 22050, &params);
        let AnimationState::Bloom(field) = &state else {
            panic!("expected bloom state");
        };
        assert_eq!(field.len(), 1);
        let bloom = field.iter().next().unwrap();
        assert_eq!(bloom.center, 0.5);
        assert_eq!(bloom.life, 1.0);
        assert_eq!(bloom.color, Rgb::new(10, 20, 30));
    }

    #[test]
    fn test_advance_wave_ignores_bloom_logic() {
        let params = LiveParameters::default();
        let mut state = AnimationState::new(VisualMode::Wave);
        state.advance(DT, &onset_features(5512.5), 22050, &params);
        let AnimationState::Wave(head) = &state else {
            panic!("expected wave state");
        };
        assert!((head.speed - 1.5).abs() < 1e-6);
        assert_eq!(state.mode(), VisualMode::Wave);
    }

    #[test]
    fn test_centroid_position_clamps() {
        assert_eq!(centroid_position(0.0, 22050), 0.0);
        assert_eq!(centroid_position(30_000.0, 22050), 1.0);
        assert_eq!(centroid_position(f32::NAN, 22050), 0.0);
    }
}
