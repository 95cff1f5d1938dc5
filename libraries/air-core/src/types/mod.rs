/// Core domain types
mod reading;
mod standard;
mod violation;

pub use reading::LoudnessReading;
pub use standard::{LoudnessStandard, ViolationThresholds, DEFAULT_TOLERANCE_LU};
pub use violation::{ViolationEvent, ViolationKind, QUIET_MARGIN_LU};
