//! 100 ms block energy accumulation

use crate::{BLOCK_DURATION_SECS, LOUDNESS_OFFSET_LUFS};

/// Convert a summed mean-square power to loudness in LUFS.
///
/// Power at or below zero has no loudness and maps to negative infinity.
#[inline]
pub fn power_to_lufs(power: f64) -> f64 {
    if power > 0.0 {
        LOUDNESS_OFFSET_LUFS + 10.0 * power.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Inverse of [`power_to_lufs`]
#[inline]
pub fn lufs_to_power(lufs: f64) -> f64 {
    10.0_f64.powf((lufs - LOUDNESS_OFFSET_LUFS) / 10.0)
}

/// Collects K-weighted samples into fixed 100 ms blocks.
///
/// Each finished block is reduced to one power value: the mean square of every
/// channel, summed across channels. A partially filled block is carried over to
/// the next call.
#[derive(Debug, Clone)]
pub struct BlockAccumulator {
    /// Samples per channel in one block
    block_size: usize,
    /// Running sum of squares per channel
    sums: Vec<f64>,
    /// Samples per channel already in the current block
    filled: usize,
}

impl BlockAccumulator {
    /// Create an accumulator for `channels` channels at `sample_rate`
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            block_size: Self::block_size_for(sample_rate),
            sums: vec![0.0; channels],
            filled: 0,
        }
    }

    /// Samples per channel in a 100 ms block at `sample_rate`
    pub fn block_size_for(sample_rate: u32) -> usize {
        (f64::from(sample_rate) * BLOCK_DURATION_SECS) as usize
    }

    /// Samples per channel in one block
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples per channel waiting in the unfinished block
    pub fn pending(&self) -> usize {
        self.filled
    }

    /// Add one run of filtered samples (one slice per channel, equal lengths)
    /// and append the power of every block it completes to `blocks`.
    ///
    /// A run with a different channel count or unequal channel lengths is
    /// ignored and leaves the unfinished block untouched.
    pub fn push<C: AsRef<[f64]>>(&mut self, channels: &[C], blocks: &mut Vec<f64>) {
        if self.block_size == 0 || channels.len() != self.sums.len() {
            return;
        }
        let len = channels.first().map_or(0, |c| c.as_ref().len());
        if channels.iter().any(|c| c.as_ref().len() != len) {
            return;
        }
        let mut pos = 0;

        while pos < len {
            let take = (self.block_size - self.filled).min(len - pos);
            for (sum, channel) in self.sums.iter_mut().zip(channels) {
                *sum += channel.as_ref()[pos..pos + take]
                    .iter()
                    .map(|s| s * s)
                    .sum::<f64>();
            }
            self.filled += take;
            pos += take;

            if self.filled == self.block_size {
                let n = self.block_size as f64;
                blocks.push(self.sums.iter().map(|sum| sum / n).sum());
                self.sums.fill(0.0);
                self.filled = 0;
            }
        }
    }

    /// Drop the unfinished block
    pub fn reset(&mut self) {
        self.sums.fill(0.0);
        self.filled = 0;
    }
}
