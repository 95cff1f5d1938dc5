//! Gated block history and integrated loudness
//!
//! Integrated loudness uses the two-pass gate of BS.1770:
//! 1. Absolute gate: only blocks above -70 LUFS enter the history at all.
//! 2. Relative gate: of those, only blocks above (ungated mean - 10 LU) count.

use crate::block::power_to_lufs;
use crate::range::loudness_range;
use crate::{ABSOLUTE_GATE_LUFS, RELATIVE_GATE_LU};

/// Integrated loudness and loudness range computed from the same gated set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatedLoudness {
    /// Integrated loudness in LUFS, `-inf` when nothing passes the gates
    pub integrated: f64,
    /// Loudness range in LU
    pub lra: f64,
}

impl Default for GatedLoudness {
    fn default() -> Self {
        Self {
            integrated: f64::NEG_INFINITY,
            lra: 0.0,
        }
    }
}

/// Fixed-capacity ring buffer of block powers above the absolute gate.
///
/// Once full, each new block overwrites the oldest one, so the cost of
/// [`GatedHistory::measure`] is bounded by the capacity rather than by the
/// session length.
#[derive(Debug, Clone)]
pub struct GatedHistory {
    powers: Vec<f64>,
    /// Index of the oldest block once the buffer is full
    head: usize,
    capacity: usize,
    /// Reused by `measure` for the relatively gated set
    scratch: Vec<f64>,
}

impl GatedHistory {
    /// Create a history holding at most `capacity` blocks (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            powers: Vec::with_capacity(capacity),
            head: 0,
            capacity,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Offer a block; returns whether it passed the absolute gate
    pub fn push(&mut self, power: f64) -> bool {
        if power_to_lufs(power) <= ABSOLUTE_GATE_LUFS {
            return false;
        }
        if self.powers.len() < self.capacity {
            self.powers.push(power);
        } else {
            self.powers[self.head] = power;
            self.head = (self.head + 1) % self.capacity;
        }
        true
    }

    /// Blocks currently held
    pub fn len(&self) -> usize {
        self.powers.len()
    }

    /// Whether no block has passed the absolute gate yet
    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Maximum number of blocks held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply the relative gate and compute integrated loudness and LRA
    pub fn measure(&mut self) -> GatedLoudness {
        if self.powers.is_empty() {
            return GatedLoudness::default();
        }

        let ungated = self.powers.iter().sum::<f64>() / self.powers.len() as f64;
        let relative_threshold = power_to_lufs(ungated) + RELATIVE_GATE_LU;

        self.scratch.clear();
        self.scratch.extend(
            self.powers
                .iter()
                .copied()
                .filter(|&power| power_to_lufs(power) > relative_threshold),
        );
        if self.scratch.is_empty() {
            return GatedLoudness::default();
        }

        let gated = self.scratch.iter().sum::<f64>() / self.scratch.len() as f64;
        GatedLoudness {
            integrated: power_to_lufs(gated),
            lra: loudness_range(&mut self.scratch),
        }
    }

    /// Remove every block
    pub fn clear(&mut self) {
        self.powers.clear();
        self.scratch.clear();
        self.head = 0;
    }
}
