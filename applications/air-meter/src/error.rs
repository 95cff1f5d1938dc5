/// Meter application error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeterAppError>;

#[derive(Debug, Error)]
pub enum MeterAppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Loudness error: {0}")]
    Loudness(#[from] air_loudness::LoudnessError),

    #[error(transparent)]
    Core(#[from] air_core::AirError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for MeterAppError {
    fn from(err: config::ConfigError) -> Self {
        MeterAppError::Config(err.to_string())
    }
}
