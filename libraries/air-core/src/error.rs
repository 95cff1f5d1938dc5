/// Core error types for On-Air Loudness
use thiserror::Error;

/// Result type alias using `AirError`
pub type Result<T> = std::result::Result<T, AirError>;

/// Core error type for On-Air Loudness
#[derive(Error, Debug)]
pub enum AirError {
    /// Violation thresholds that cannot be checked against
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    /// Unrecognized loudness standard name
    #[error("Unknown loudness standard: {0}")]
    UnknownStandard(String),
}

impl AirError {
    /// Create an invalid thresholds error
    pub fn invalid_thresholds(msg: impl Into<String>) -> Self {
        Self::InvalidThresholds(msg.into())
    }
}
