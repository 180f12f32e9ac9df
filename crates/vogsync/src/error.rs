//! Session errors
use thiserror::Error;
use vogsync_core::CoreError;

/// Failures that end a playback session in the `Error` state
#[derive(Error, Debug)]
pub enum SessionError {
    /// The audio source could not be decoded
    #[error("Failed to load {source_name}: {error}")]
    Load {
        source_name: String,
        #[source]
        error: CoreError,
    },

    /// The output device could not be opened, or failed while playing
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Another session is still running on this orchestrator
    #[error("A session is already running")]
    Busy,

    /// The sample rate and frame duration give an empty frame
    #[error("Frame length is zero ({sample_rate}Hz, {frame_ms}ms frames)")]
    InvalidFrameLength { sample_rate: u32, frame_ms: u32 },
}

/// Result type for playback sessions
pub type Result<T> = std::result::Result<T, SessionError>;
