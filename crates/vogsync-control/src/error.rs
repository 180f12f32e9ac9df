//! Error types for lighting output
use thiserror::Error;

/// Lighting output errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Transport failure (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Controller answered with a non-success status
    #[error("Controller {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Endpoint is not a usable base URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for lighting output
pub type Result<T> = std::result::Result<T, ControlError>;
