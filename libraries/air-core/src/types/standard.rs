/// Loudness delivery standards and the thresholds derived from them
use crate::error::{AirError, Result};
use serde::{Deserialize, Serialize};

/// Default permitted deviation from the target loudness, in LU
pub const DEFAULT_TOLERANCE_LU: f64 = 1.0;

/// Named target / true-peak ceiling pairs used by broadcasters and platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoudnessStandard {
    /// EBU R128 broadcast: -23 LUFS, -1 dBTP
    #[default]
    EbuR128,
    /// ATSC A/85 (US broadcast): -24 LUFS, -2 dBTP
    AtscA85,
    /// Music streaming platforms: -14 LUFS, -1 dBTP
    Streaming,
    /// Podcast distribution: -16 LUFS, -1 dBTP
    Podcast,
}

impl LoudnessStandard {
    /// Every recognized preset, in display order
    pub fn all() -> [Self; 4] {
        [Self::EbuR128, Self::AtscA85, Self::Streaming, Self::Podcast]
    }

    /// Target integrated loudness in LUFS
    pub fn target_lufs(&self) -> f64 {
        match self {
            Self::EbuR128 => -23.0,
            Self::AtscA85 => -24.0,
            Self::Streaming => -14.0,
            Self::Podcast => -16.0,
        }
    }

    /// Maximum permitted true peak in dBTP
    pub fn true_peak_limit_dbtp(&self) -> f64 {
        match self {
            Self::AtscA85 => -2.0,
            Self::EbuR128 | Self::Streaming | Self::Podcast => -1.0,
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::EbuR128 => "EBU R128",
            Self::AtscA85 => "ATSC A/85",
            Self::Streaming => "Streaming",
            Self::Podcast => "Podcast",
        }
    }

    /// Convert to string for settings persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EbuR128 => "ebu_r128",
            Self::AtscA85 => "atsc_a85",
            Self::Streaming => "streaming",
            Self::Podcast => "podcast",
        }
    }

    /// Parse from string (for settings persistence)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' ', '/'], "_").as_str() {
            "ebu_r128" | "ebur128" | "ebu" | "r128" | "broadcast" => Some(Self::EbuR128),
            "atsc_a85" | "atsc" | "a85" | "atsc_a_85" => Some(Self::AtscA85),
            "streaming" | "spotify" | "youtube" => Some(Self::Streaming),
            "podcast" | "podcasts" => Some(Self::Podcast),
            _ => None,
        }
    }

    /// Parse, reporting the offending name on failure
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).ok_or_else(|| AirError::UnknownStandard(s.to_string()))
    }
}

impl std::fmt::Display for LoudnessStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Limits a reading is checked against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViolationThresholds {
    /// Target integrated loudness in LUFS
    pub target_lufs: f64,

    /// True peak ceiling in dBTP
    pub true_peak_limit_dbtp: f64,

    /// Permitted deviation from the target in LU
    pub tolerance_lu: f64,
}

impl ViolationThresholds {
    /// Create thresholds from explicit values
    pub fn new(target_lufs: f64, true_peak_limit_dbtp: f64, tolerance_lu: f64) -> Self {
        Self {
            target_lufs,
            true_peak_limit_dbtp,
            tolerance_lu,
        }
    }

    /// Thresholds for a named standard with the default tolerance
    pub fn from_standard(standard: LoudnessStandard) -> Self {
        Self::new(
            standard.target_lufs(),
            standard.true_peak_limit_dbtp(),
            DEFAULT_TOLERANCE_LU,
        )
    }

    /// Replace the tolerance
    #[must_use]
    pub fn with_tolerance(mut self, tolerance_lu: f64) -> Self {
        self.tolerance_lu = tolerance_lu;
        self
    }

    /// Integrated loudness above which a LOUD violation fires
    pub fn loud_threshold(&self) -> f64 {
        self.target_lufs + self.tolerance_lu
    }

    /// Integrated loudness below which a QUIET violation fires
    pub fn quiet_threshold(&self) -> f64 {
        self.target_lufs - self.tolerance_lu - super::QUIET_MARGIN_LU
    }

    /// Validate thresholds
    pub fn validate(&self) -> Result<()> {
        if !self.target_lufs.is_finite() || self.target_lufs > 0.0 {
            return Err(AirError::invalid_thresholds(format!(
                "target loudness must be a finite value <= 0 LUFS, got {}",
                self.target_lufs
            )));
        }
        if !self.true_peak_limit_dbtp.is_finite() {
            return Err(AirError::invalid_thresholds(format!(
                "true peak limit must be finite, got {}",
                self.true_peak_limit_dbtp
            )));
        }
        if !self.tolerance_lu.is_finite() || self.tolerance_lu < 0.0 {
            return Err(AirError::invalid_thresholds(format!(
                "tolerance must be a finite value >= 0 LU, got {}",
                self.tolerance_lu
            )));
        }
        Ok(())
    }
}

impl Default for ViolationThresholds {
    fn default() -> Self {
        Self::from_standard(LoudnessStandard::default())
    }
}
