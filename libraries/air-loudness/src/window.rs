//! Sliding block windows for momentary and short-term loudness

use crate::block::power_to_lufs;
use std::collections::VecDeque;

/// Bounded FIFO of the most recent block powers
#[derive(Debug, Clone)]
pub struct LoudnessWindow {
    powers: VecDeque<f64>,
    capacity: usize,
}

impl LoudnessWindow {
    /// Create a window holding at most `capacity` blocks
    pub fn new(capacity: usize) -> Self {
        Self {
            powers: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Add a block, evicting the oldest once full
    pub fn push(&mut self, power: f64) {
        self.powers.push_back(power);
        while self.powers.len() > self.capacity {
            self.powers.pop_front();
        }
    }

    /// Loudness of the mean power in the window, `-inf` when empty
    pub fn loudness(&self) -> f64 {
        if self.powers.is_empty() {
            return f64::NEG_INFINITY;
        }
        let mean = self.powers.iter().sum::<f64>() / self.powers.len() as f64;
        power_to_lufs(mean)
    }

    /// Blocks currently in the window
    pub fn len(&self) -> usize {
        self.powers.len()
    }

    /// Whether the window holds no blocks
    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Maximum number of blocks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every block
    pub fn clear(&mut self) {
        self.powers.clear();
    }
}
