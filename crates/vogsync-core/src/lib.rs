//! vogsync Core - Audio Analysis and Light Animation
//!
//! This crate contains everything that turns audio frames into zone values, with
//! no network or device I/O:
//! - **Analysis**: loudness, spectral centroid and centroid color per frame
//! - **Detection**: optional onset and pitch detection behind a trait
//! - **Animation**: the wave and bloom state machines
//! - **Rendering**: per-zone brightness and color
//! - **Parameters**: live knobs shared with the control plane
//! - **Sources**: decoded mono PCM (WAV files, in-memory buffers)
//!
//! ## Quick Start
//!
//! ```rust
//! use vogsync_core::{
//!     render, AnimationState, FrameAnalyzer, ParameterStore, VisualMode,
//! };
//!
//! let params = ParameterStore::default();
//! let mut analyzer = FrameAnalyzer::new(661, 22050);
//! let mut state = AnimationState::new(VisualMode::Bloom);
//!
//! let frame = vec![0.0f32; 661];
//! let live = params.snapshot();
//! let features = analyzer.analyze(&frame, live.color_shift).unwrap();
//! state.advance(0.03, &features, 22050, &live);
//! let zone = render::compute(0, 3, &state, &live, features.onset_strength, features.color);
//! assert_eq!(zone.brightness, 20);
//! ```

#![allow(missing_docs)]

pub mod analysis;
pub mod animation;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod params;
pub mod render;
pub mod source;

// --- Re-exports grouped by category ---

// Analysis
pub use analysis::{color_from_centroid, Features, FrameAnalyzer, Rgb};

// Detection
pub use detect::{detector_for, NoOnsetPitch, OnsetPitchDetector, SpectralOnsetPitch};

// Animation & Rendering
pub use animation::{AnimationState, Bloom, BloomField, VisualMode, WaveHead};
pub use render::ZoneValue;

// Parameters & Configuration
pub use config::PlayerConfig;
pub use logging::LogConfig;
pub use params::{LiveParameters, ParamKey, ParamUpdate, ParameterStore};

// Audio
pub use source::{AudioSource, MemorySource, PcmAudio, WavSource};

// Errors
pub use error::{CoreError, Result};
