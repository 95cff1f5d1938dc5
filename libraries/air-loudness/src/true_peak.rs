//! True peak estimate
//!
//! The estimate is the highest absolute *unfiltered* sample plus a fixed
//! [`TRUE_PEAK_OVERSHOOT_DB`] allowance. It does not reconstruct the signal
//! with the 4x oversampling filter of BS.1770 Annex 2, so it can under-read
//! inter-sample peaks of material with strong high-frequency content, and it
//! over-reads by 0.5 dB when the sampled peak is the true peak.

use crate::TRUE_PEAK_OVERSHOOT_DB;

/// Per-call and session maximum true peak
#[derive(Debug, Clone)]
pub struct TruePeakEstimator {
    max_dbtp: f64,
}

impl TruePeakEstimator {
    /// Create an estimator with no peak recorded
    pub fn new() -> Self {
        Self {
            max_dbtp: f64::NEG_INFINITY,
        }
    }

    /// Highest absolute sample across all channels, ignoring non-finite samples
    pub fn sample_peak<C: AsRef<[f32]>>(channels: &[C]) -> f32 {
        channels
            .iter()
            .flat_map(|channel| channel.as_ref().iter())
            .filter(|sample| sample.is_finite())
            .fold(0.0_f32, |peak, sample| peak.max(sample.abs()))
    }

    /// Convert a linear sample peak to the dBTP estimate (`-inf` for silence)
    pub fn peak_to_dbtp(peak: f32) -> f64 {
        if peak > 0.0 {
            20.0 * f64::from(peak).log10() + TRUE_PEAK_OVERSHOOT_DB
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Estimate the true peak of one call and fold it into the session maximum
    pub fn measure<C: AsRef<[f32]>>(&mut self, channels: &[C]) -> f64 {
        let dbtp = Self::peak_to_dbtp(Self::sample_peak(channels));
        if dbtp > self.max_dbtp {
            self.max_dbtp = dbtp;
        }
        dbtp
    }

    /// Highest estimate since the last reset
    pub fn max_dbtp(&self) -> f64 {
        self.max_dbtp
    }

    /// Forget the session maximum
    pub fn reset(&mut self) {
        self.max_dbtp = f64::NEG_INFINITY;
    }
}

impl Default for TruePeakEstimator {
    fn default() -> Self {
        Self::new()
    }
}
