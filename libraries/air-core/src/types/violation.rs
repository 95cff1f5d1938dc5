/// Threshold violation events
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extra margin in LU below the tolerance band before a QUIET violation fires
pub const QUIET_MARGIN_LU: f64 = 3.0;

/// Which limit a reading crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    /// True peak above the ceiling
    Peak,
    /// Integrated loudness above target + tolerance
    Loud,
    /// Integrated loudness below target - tolerance - 3 LU
    Quiet,
}

impl ViolationKind {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peak => "peak",
            Self::Loud => "loud",
            Self::Quiet => "quiet",
        }
    }

    /// Unit of the measured value and threshold
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Peak => "dBTP",
            Self::Loud | Self::Quiet => "LUFS",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single firing of a violation check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// Which check fired
    pub kind: ViolationKind,

    /// Measured value that crossed the threshold
    pub value: f64,

    /// Threshold that was crossed
    pub threshold: f64,

    /// When the check fired
    pub timestamp: DateTime<Utc>,
}

impl ViolationEvent {
    /// Create a new event
    pub fn new(kind: ViolationKind, value: f64, threshold: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            value,
            threshold,
            timestamp,
        }
    }

    /// How far past the threshold the value was (always >= 0 for a fired event)
    pub fn excess(&self) -> f64 {
        match self.kind {
            ViolationKind::Peak | ViolationKind::Loud => self.value - self.threshold,
            ViolationKind::Quiet => self.threshold - self.value,
        }
    }

    /// Short human readable message
    pub fn description(&self) -> String {
        let unit = self.kind.unit();
        match self.kind {
            ViolationKind::Peak => format!(
                "True peak {:.1} {unit} exceeds ceiling {:.1} {unit}",
                self.value, self.threshold
            ),
            ViolationKind::Loud => format!(
                "Integrated loudness {:.1} {unit} above {:.1} {unit}",
                self.value, self.threshold
            ),
            ViolationKind::Quiet => format!(
                "Integrated loudness {:.1} {unit} below {:.1} {unit}",
                self.value, self.threshold
            ),
        }
    }
}
