//! On-Air Loudness Core
//!
//! Plain data types shared between the measurement engine and its consumers.
//!
//! The engine lives on a dedicated audio lane and hands out readings by value.
//! Everything in this crate is therefore `Clone`, serializable, and free of
//! references back into engine state, so consumers (UI threads, network
//! publishers, loggers) can depend on this crate alone.
//!
//! # Example
//!
//! ```rust
//! use air_core::{LoudnessReading, LoudnessStandard, ViolationThresholds};
//!
//! let thresholds = ViolationThresholds::from_standard(LoudnessStandard::EbuR128);
//! assert_eq!(thresholds.target_lufs, -23.0);
//!
//! // Nothing measured yet: every loudness value is undefined
//! let reading = LoudnessReading::default();
//! assert!(!reading.has_integrated());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

pub use error::{AirError, Result};
pub use types::{
    LoudnessReading, LoudnessStandard, ViolationEvent, ViolationKind, ViolationThresholds,
    DEFAULT_TOLERANCE_LU, QUIET_MARGIN_LU,
};
