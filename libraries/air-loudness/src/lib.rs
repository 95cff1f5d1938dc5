//! Real-time loudness metering for On-Air Loudness
//!
//! This crate provides:
//! - ITU-R BS.1770-4 K-weighting per channel
//! - Momentary (400 ms) and short-term (3 s) loudness
//! - Integrated loudness with absolute and relative gating
//! - Loudness range (LRA) from the gated block distribution
//! - Sample-peak based true peak estimate
//! - Debounced threshold violation alerts (EBU R128, ATSC A/85, streaming, podcast)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐   ┌──────────────────┐
//! │ PCM frames  │──►│ K-weighting  │──►│ 100 ms blocks   │──►│ momentary / S    │
//! └─────────────┘   └──────────────┘   └─────────────────┘   │ gated history    │
//!        │                                                    │   └─► I, LRA     │
//!        └──────────────► true peak ─────────────────────────►└──────────────────┘
//!                                                                      │
//!                                                                      ▼
//!                              ┌──────────────────┐            ┌───────────────┐
//!                              │ ViolationMonitor │◄───────────│LoudnessReading│
//!                              └──────────────────┘            └───────────────┘
//! ```
//!
//! Blocks do not overlap. BS.1770 gates 400 ms blocks with 75 % overlap; this
//! meter gates the 100 ms blocks directly, which makes integrated loudness and
//! LRA slightly more sensitive to short transients.
//!
//! # Example
//!
//! ```
//! use air_loudness::{LoudnessMeter, ViolationMonitor};
//! use air_core::LoudnessStandard;
//! use chrono::Utc;
//!
//! let mut meter = LoudnessMeter::new();
//! let mut monitor = ViolationMonitor::with_standard(LoudnessStandard::EbuR128);
//!
//! // One 10 ms stereo quantum at 48 kHz
//! let left = vec![0.0_f32; 480];
//! let right = vec![0.0_f32; 480];
//! let reading = meter.process(&[&left[..], &right[..]], 48_000);
//!
//! assert_eq!(reading.integrated, f64::NEG_INFINITY);
//! assert!(monitor.check(&reading, Utc::now()).is_empty());
//! ```

#![forbid(unsafe_code)]

mod block;
mod error;
mod gating;
mod kweighting;
mod meter;
mod monitor;
mod range;
mod true_peak;
mod window;

pub use air_core::{LoudnessReading, LoudnessStandard, ViolationEvent, ViolationKind, ViolationThresholds};
pub use block::{lufs_to_power, power_to_lufs, BlockAccumulator};
pub use error::{LoudnessError, Result};
pub use gating::{GatedHistory, GatedLoudness};
pub use kweighting::{BiquadCoefficients, BiquadState, FilterBank, KWeightingFilter};
pub use meter::LoudnessMeter;
pub use monitor::{AlertLog, ViolationMonitor, DEFAULT_ALERT_LOG_CAPACITY, DEFAULT_DEBOUNCE};
pub use range::loudness_range;
pub use true_peak::TruePeakEstimator;
pub use window::LoudnessWindow;

/// Offset in the BS.1770 loudness formula: L = -0.691 + 10 log10(power)
pub const LOUDNESS_OFFSET_LUFS: f64 = -0.691;

/// Absolute gate: blocks at or below this level never count towards I or LRA
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset below the ungated mean loudness
pub const RELATIVE_GATE_LU: f64 = -10.0;

/// Block duration in seconds (100 ms)
pub const BLOCK_DURATION_SECS: f64 = 0.1;

/// Momentary window (400 ms = 4 blocks)
pub const MOMENTARY_BLOCKS: usize = 4;

/// Short-term window (3 s = 30 blocks)
pub const SHORT_TERM_BLOCKS: usize = 30;

/// Default gated history capacity (18000 blocks = 30 minutes)
pub const DEFAULT_GATED_HISTORY_BLOCKS: usize = 18_000;

/// Fixed allowance for inter-sample overshoot added to the sample peak.
///
/// This stands in for the 4x oversampled reconstruction of BS.1770 Annex 2 and
/// is an approximation: real inter-sample peaks can exceed it.
pub const TRUE_PEAK_OVERSHOOT_DB: f64 = 0.5;
