//! On-Air Loudness file meter
//!
//! Library side of the `air-meter` binary: configuration loading, WAV
//! decoding and the measurement report.

pub mod config;
pub mod error;
pub mod measure;

pub use config::MeterConfig;
pub use error::{MeterAppError, Result};
pub use measure::{measure_file, measure_wav, MeasurementReport};
