//! Threshold violation alerts
//!
//! Three independent checks run against each reading:
//!
//! | Kind  | Fires when                                   | Re-fire interval |
//! |-------|----------------------------------------------|------------------|
//! | PEAK  | true peak > ceiling                          | D                |
//! | LOUD  | integrated > target + tolerance              | D                |
//! | QUIET | integrated < target - tolerance - 3 LU       | 5 x D            |
//!
//! QUIET waits longer because integrated loudness is unreliable while little
//! gated history exists. Debounce is a plain timestamp comparison; nothing is
//! scheduled.

use crate::error::Result;
use air_core::{LoudnessReading, LoudnessStandard, ViolationEvent, ViolationKind, ViolationThresholds};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Default minimum interval between two PEAK or two LOUD events
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// QUIET re-fire interval as a multiple of the base debounce
const QUIET_DEBOUNCE_FACTOR: u32 = 5;

/// Default number of undismissed events kept by [`AlertLog`]
pub const DEFAULT_ALERT_LOG_CAPACITY: usize = 64;

/// Debounced checker turning readings into [`ViolationEvent`]s
#[derive(Debug, Clone)]
pub struct ViolationMonitor {
    thresholds: ViolationThresholds,
    debounce: Duration,
    last_peak: Option<DateTime<Utc>>,
    last_loud: Option<DateTime<Utc>>,
    last_quiet: Option<DateTime<Utc>>,
}

impl ViolationMonitor {
    /// Create a monitor with explicit thresholds and base debounce interval
    pub fn new(thresholds: ViolationThresholds, debounce: Duration) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            debounce,
            last_peak: None,
            last_loud: None,
            last_quiet: None,
        })
    }

    /// Monitor a named standard with default tolerance and debounce
    pub fn with_standard(standard: LoudnessStandard) -> Self {
        Self {
            thresholds: ViolationThresholds::from_standard(standard),
            debounce: DEFAULT_DEBOUNCE,
            last_peak: None,
            last_loud: None,
            last_quiet: None,
        }
    }

    /// Current thresholds
    pub fn thresholds(&self) -> &ViolationThresholds {
        &self.thresholds
    }

    /// Replace the thresholds; debounce bookkeeping is kept
    pub fn set_thresholds(&mut self, thresholds: ViolationThresholds) -> Result<()> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        Ok(())
    }

    /// Minimum interval between PEAK events and between LOUD events
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Minimum interval between QUIET events
    pub fn quiet_debounce(&self) -> Duration {
        self.debounce.saturating_mul(QUIET_DEBOUNCE_FACTOR)
    }

    /// Check a reading taken at `now`; returns the events that fired
    pub fn check(&mut self, reading: &LoudnessReading, now: DateTime<Utc>) -> Vec<ViolationEvent> {
        let mut events = Vec::new();
        let debounce = to_delta(self.debounce);
        let quiet_debounce = to_delta(self.quiet_debounce());

        let peak_limit = self.thresholds.true_peak_limit_dbtp;
        if reading.true_peak > peak_limit && ready(&mut self.last_peak, debounce, now) {
            events.push(ViolationEvent::new(
                ViolationKind::Peak,
                reading.true_peak,
                peak_limit,
                now,
            ));
        }

        if reading.integrated.is_finite() {
            let loud = self.thresholds.loud_threshold();
            if reading.integrated > loud && ready(&mut self.last_loud, debounce, now) {
                events.push(ViolationEvent::new(
                    ViolationKind::Loud,
                    reading.integrated,
                    loud,
                    now,
                ));
            }

            let quiet = self.thresholds.quiet_threshold();
            if reading.integrated < quiet && ready(&mut self.last_quiet, quiet_debounce, now) {
                events.push(ViolationEvent::new(
                    ViolationKind::Quiet,
                    reading.integrated,
                    quiet,
                    now,
                ));
            }
        }

        for event in &events {
            debug!("Loudness violation: {}", event.description());
        }
        events
    }

    /// Check a reading against the current wall clock
    pub fn check_now(&mut self, reading: &LoudnessReading) -> Vec<ViolationEvent> {
        self.check(reading, Utc::now())
    }

    /// Forget when each check last fired
    pub fn reset(&mut self) {
        self.last_peak = None;
        self.last_loud = None;
        self.last_quiet = None;
    }
}

/// Whether a check may fire at `now`; records the firing when it may
fn ready(last: &mut Option<DateTime<Utc>>, interval: TimeDelta, now: DateTime<Utc>) -> bool {
    if let Some(previous) = *last {
        if now.signed_duration_since(previous) < interval {
            return false;
        }
    }
    *last = Some(now);
    true
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Consumer-side list of events that have not been dismissed yet.
///
/// Holds at most `capacity` events; the oldest is dropped when a new one
/// arrives on a full log.
#[derive(Debug, Clone)]
pub struct AlertLog {
    events: VecDeque<ViolationEvent>,
    capacity: usize,
}

impl AlertLog {
    /// Create a log holding at most `capacity` events (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a newly fired event
    pub fn push(&mut self, event: ViolationEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Active events, oldest first
    pub fn active(&self) -> impl Iterator<Item = &ViolationEvent> {
        self.events.iter()
    }

    /// Dismiss the `kind` event fired at `timestamp`; returns whether one was found.
    ///
    /// One [`ViolationMonitor::check`] fires at most one event of each kind, so
    /// events raised together by PEAK and LOUD are dismissed separately.
    pub fn dismiss(&mut self, kind: ViolationKind, timestamp: DateTime<Utc>) -> bool {
        match self
            .events
            .iter()
            .position(|event| event.kind == kind && event.timestamp == timestamp)
        {
            Some(index) => {
                self.events.remove(index);
                true
            }
            None => false,
        }
    }

    /// Dismiss every event
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of active events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event is active
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_LOG_CAPACITY)
    }
}

impl Extend<ViolationEvent> for AlertLog {
    fn extend<T: IntoIterator<Item = ViolationEvent>>(&mut self, iter: T) {
        for event in iter {
            self.push(event);
        }
    }
}
