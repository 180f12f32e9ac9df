//! vogsync - Audio-Reactive Lighting Player
//!
//! Plays an audio file and drives a ring of WLED controllers from it, frame by
//! frame:
//! - **Orchestration**: the session state machine, frame clock and fade tail
//! - **Audio output**: cpal playback on a dedicated thread
//! - **Logging**: tracing subscriber setup for the binary
//!
//! Analysis and animation live in `vogsync-core`, controller output in
//! `vogsync-control`.

#![allow(missing_docs)]

/// Audio playback devices
pub mod audio_output;
/// Session errors
pub mod error;
/// Tracing subscriber setup
pub mod logging_setup;
/// Session state machine
pub mod orchestration;

pub use audio_output::{AudioOutput, CpalOutput, NullOutput, PlaybackHandle};
pub use error::{Result, SessionError};
pub use orchestration::{FrameClock, Orchestrator, SessionReport, SessionState, StopHandle};
