//! Error types for the analysis and animation core
use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV decoding error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio that cannot be played or analyzed (no samples, zero sample rate, ...)
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// A single analysis frame was rejected
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Live parameter key not in the fixed set
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Visual mode string was neither `wave` nor `bloom`
    #[error("Invalid visual mode: {0}")]
    InvalidMode(String),

    /// Configuration file or override could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
