//! Player configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then the
//! environment (`WLED_CONTROLLERS`, `FRAME_MS`, `VISUAL_MODE`), then whatever the
//! caller applies on top (the CLI).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::animation::VisualMode;
use crate::logging::LogConfig;
use crate::params::LiveParameters;
use crate::{error::CoreError, Result};

/// Everything a playback session needs besides the audio itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Controller base URLs; zone `i` is driven by `controllers[i]`
    pub controllers: Vec<String>,
    /// Number of zones rendered (bounded by the controller count)
    pub zone_count: usize,
    /// Analysis frame length in milliseconds
    pub frame_ms: u32,
    /// Animation used when the caller does not choose one
    pub mode: VisualMode,
    /// Per-command network timeout
    pub dispatch_timeout_ms: u64,
    /// Use the built-in onset/pitch detector
    pub onset_detection: bool,
    /// Number of fade-out steps after the audio ends
    pub fade_steps: usize,
    /// Pause between fade-out steps
    pub fade_interval_ms: u64,
    /// Initial live parameters
    pub params: LiveParameters,
    /// Logging
    pub log: LogConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            controllers: vec![
                "http://192.168.1.101".to_string(), // left
                "http://192.168.1.102".to_string(), // center
                "http://192.168.1.103".to_string(), // right
            ],
            zone_count: 3,
            frame_ms: 30,
            mode: VisualMode::Bloom,
            dispatch_timeout_ms: 200,
            onset_detection: true,
            fade_steps: 12,
            fade_interval_ms: 30,
            params: LiveParameters::default(),
            log: LogConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let config = Self::from_toml_str(&text)?;
                tracing::debug!("Loaded config from {:?}", path);
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (injectable for tests).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("WLED_CONTROLLERS") {
            let controllers = parse_controller_list(&list);
            // An empty variable keeps the configured controllers
            if !controllers.is_empty() {
                self.controllers = controllers;
            }
        }
        if let Some(frame_ms) = lookup("FRAME_MS") {
            self.frame_ms = frame_ms.trim().parse().map_err(|_| {
                CoreError::Config(format!("FRAME_MS is not a number: {:?}", frame_ms))
            })?;
        }
        if let Some(mode) = lookup("VISUAL_MODE") {
            self.mode = mode.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_ms == 0 {
            return Err(CoreError::Config("frame_ms must be > 0".to_string()));
        }
        if self.zone_count == 0 {
            return Err(CoreError::Config("zone_count must be > 0".to_string()));
        }
        if self.controllers.is_empty() {
            return Err(CoreError::Config("no controllers configured".to_string()));
        }
        if self.dispatch_timeout_ms == 0 {
            return Err(CoreError::Config(
                "dispatch_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Zones actually driven: `min(zone_count, controllers)`
    pub fn active_zones(&self) -> usize {
        self.zone_count.min(self.controllers.len())
    }

    /// Samples per frame at `sample_rate`
    pub fn frame_len(&self, sample_rate: u32) -> usize {
        (sample_rate as u64 * self.frame_ms as u64 / 1000) as usize
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_ms as u64)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    pub fn fade_interval(&self) -> Duration {
        Duration::from_millis(self.fade_interval_ms)
    }
}

/// Split a comma-separated controller list, dropping blanks.
pub fn parse_controller_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
