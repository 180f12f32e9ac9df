//! Live parameters
//!
//! Five named scalar knobs that the control plane may change while a session is
//! playing. Each knob is stored as the bit pattern of an `f32` in its own
//! `AtomicU32`, so a read always observes a complete, most recently committed write
//! of that knob. There is no cross-field atomicity: a frame may see a new
//! `ambient_glow` together with an old `bloom_scale`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{error::CoreError, Result};

/// Parameter names, in their canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    BloomScale,
    ClimaxThreshold,
    AmbientGlow,
    ColorShift,
    WaveSpeed,
}

impl ParamKey {
    pub const ALL: [ParamKey; 5] = [
        ParamKey::BloomScale,
        ParamKey::ClimaxThreshold,
        ParamKey::AmbientGlow,
        ParamKey::ColorShift,
        ParamKey::WaveSpeed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::BloomScale => "bloom_scale",
            ParamKey::ClimaxThreshold => "climax_threshold",
            ParamKey::AmbientGlow => "ambient_glow",
            ParamKey::ColorShift => "color_shift",
            ParamKey::WaveSpeed => "wave_speed",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        ParamKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownParameter(s.to_string()))
    }
}

/// A consistent-enough copy of all knobs, taken once per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveParameters {
    /// Multiplier for the initial radius of new blooms
    pub bloom_scale: f32,
    /// Onset strength above which zones get the climax flash
    pub climax_threshold: f32,
    /// Brightness floor added to every zone (0.0 - 1.0)
    pub ambient_glow: f32,
    /// Offset applied to the centroid color position, wrapped into [0, 1)
    pub color_shift: f32,
    /// Multiplier for wave head acceleration on onsets
    pub wave_speed: f32,
}

impl Default for LiveParameters {
    fn default() -> Self {
        Self {
            bloom_scale: 1.0,
            climax_threshold: 0.8,
            ambient_glow: 0.08,
            color_shift: 0.5,
            wave_speed: 1.0,
        }
    }
}

impl LiveParameters {
    pub fn get(&self, key: ParamKey) -> f32 {
        match key {
            ParamKey::BloomScale => self.bloom_scale,
            ParamKey::ClimaxThreshold => self.climax_threshold,
            ParamKey::AmbientGlow => self.ambient_glow,
            ParamKey::ColorShift => self.color_shift,
            ParamKey::WaveSpeed => self.wave_speed,
        }
    }
}

/// Partial update: only present fields are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climax_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_glow: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_shift: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_speed: Option<f32>,
}

impl ParamUpdate {
    fn entries(&self) -> [(ParamKey, Option<f32>); 5] {
        [
            (ParamKey::BloomScale, self.bloom_scale),
            (ParamKey::ClimaxThreshold, self.climax_threshold),
            (ParamKey::AmbientGlow, self.ambient_glow),
            (ParamKey::ColorShift, self.color_shift),
            (ParamKey::WaveSpeed, self.wave_speed),
        ]
    }
}

/// Concurrently writable store of the live parameters.
///
/// Share it behind an `Arc`; writers and the frame loop never block each other.
pub struct ParameterStore {
    values: [AtomicU32; 5],
}

impl ParameterStore {
    pub fn new(initial: LiveParameters) -> Self {
        let values = ParamKey::ALL.map(|k| AtomicU32::new(initial.get(k).to_bits()));
        Self { values }
    }

    pub fn get(&self, key: ParamKey) -> f32 {
        f32::from_bits(self.values[key.index()].load(Ordering::Acquire))
    }

    pub fn set(&self, key: ParamKey, value: f32) {
        self.values[key.index()].store(value.to_bits(), Ordering::Release);
        tracing::debug!("param {} = {}", key, value);
    }

    /// Set a knob by name. Unknown names are rejected and nothing is written.
    pub fn set_named(&self, name: &str, value: f32) -> Result<()> {
        let key: ParamKey = name.parse()?;
        self.set(key, value);
        Ok(())
    }

    pub fn get_named(&self, name: &str) -> Result<f32> {
        Ok(self.get(name.parse()?))
    }

    /// Write every field present in `update`.
    pub fn apply(&self, update: &ParamUpdate) {
        for (key, value) in update.entries() {
            if let Some(value) = value {
                self.set(key, value);
            }
        }
    }

    /// Read all knobs. Each field is individually up to date.
    pub fn snapshot(&self) -> LiveParameters {
        LiveParameters {
            bloom_scale: self.get(ParamKey::BloomScale),
            climax_threshold: self.get(ParamKey::ClimaxThreshold),
            ambient_glow: self.get(ParamKey::AmbientGlow),
            color_shift: self.get(ParamKey::ColorShift),
            wave_speed: self.get(ParamKey::WaveSpeed),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(LiveParameters::default())
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParameterStore")
            .field(&self.snapshot())
            .finish()
    }
}
