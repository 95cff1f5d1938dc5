/// Loudness reading produced by the measurement engine
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of every current and maximum value the engine tracks.
///
/// One reading is produced per processing call. Loudness values are in LUFS,
/// the range in LU and peaks in dBTP. A value that is not defined yet (empty
/// window, nothing above the gate, digital silence) is `f64::NEG_INFINITY`;
/// in JSON it is written as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessReading {
    /// Momentary loudness over the last 400 ms
    #[serde(with = "undefined_as_null")]
    pub momentary: f64,

    /// Short-term loudness over the last 3 s
    #[serde(with = "undefined_as_null")]
    pub short_term: f64,

    /// Gated integrated loudness since the last reset
    #[serde(with = "undefined_as_null")]
    pub integrated: f64,

    /// Estimated true peak of the most recent call
    #[serde(with = "undefined_as_null")]
    pub true_peak: f64,

    /// Loudness range in LU (0 until enough gated blocks exist)
    pub lra: f64,

    /// Highest momentary loudness seen since the last reset
    #[serde(with = "undefined_as_null")]
    pub max_momentary: f64,

    /// Highest short-term loudness seen since the last reset
    #[serde(with = "undefined_as_null")]
    pub max_short_term: f64,

    /// Highest true peak seen since the last reset
    #[serde(with = "undefined_as_null")]
    pub max_true_peak: f64,
}

impl LoudnessReading {
    /// Whether integrated loudness has been established
    pub fn has_integrated(&self) -> bool {
        self.integrated.is_finite()
    }

    /// Distance in dB between the session maximum true peak and 0 dBTP.
    ///
    /// Returns `None` while no peak has been measured.
    pub fn headroom_db(&self) -> Option<f64> {
        self.max_true_peak.is_finite().then_some(-self.max_true_peak)
    }
}

impl Default for LoudnessReading {
    fn default() -> Self {
        Self {
            momentary: f64::NEG_INFINITY,
            short_term: f64::NEG_INFINITY,
            integrated: f64::NEG_INFINITY,
            true_peak: f64::NEG_INFINITY,
            lra: 0.0,
            max_momentary: f64::NEG_INFINITY,
            max_short_term: f64::NEG_INFINITY,
            max_true_peak: f64::NEG_INFINITY,
        }
    }
}

impl fmt::Display for LoudnessReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M: {:.1} LUFS, S: {:.1} LUFS, I: {:.1} LUFS, LRA: {:.1} LU, TP: {:.1} dBTP (max M: {:.1}, max S: {:.1}, max TP: {:.1})",
            self.momentary,
            self.short_term,
            self.integrated,
            self.lra,
            self.true_peak,
            self.max_momentary,
            self.max_short_term,
            self.max_true_peak
        )
    }
}

/// JSON has no infinity, so undefined values travel as `null`
mod undefined_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
    }
}
