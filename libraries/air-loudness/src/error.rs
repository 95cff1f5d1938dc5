//! Error types for loudness metering

use air_core::AirError;
use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors raised while configuring the meter or the violation monitor.
///
/// The processing path never returns these; it skips malformed frames instead.
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Sample rate too low to form a 100 ms block
    #[error("Invalid sample rate: {0} Hz (must be at least 10 Hz)")]
    InvalidSampleRate(u32),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be at least 1)")]
    InvalidChannelCount(usize),

    /// Gated history must hold at least one block
    #[error("Invalid gated history capacity: {0} blocks")]
    InvalidHistoryCapacity(usize),

    /// Violation thresholds rejected
    #[error(transparent)]
    Thresholds(#[from] AirError),
}
