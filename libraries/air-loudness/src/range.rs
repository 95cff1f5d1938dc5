//! Loudness range (LRA)

use crate::block::power_to_lufs;

/// Low and high percentiles of the gated block distribution
const LOW_PERCENTILE: f64 = 0.10;
const HIGH_PERCENTILE: f64 = 0.95;

/// Spread in LU between the 10th and 95th percentile of `gated` block powers.
///
/// `gated` is the relatively gated set and is sorted in place. Fewer than two
/// blocks give a range of 0.
pub fn loudness_range(gated: &mut [f64]) -> f64 {
    let n = gated.len();
    if n < 2 {
        return 0.0;
    }
    gated.sort_unstable_by(f64::total_cmp);

    let low = gated[(n as f64 * LOW_PERCENTILE) as usize];
    let high = gated[((n as f64 * HIGH_PERCENTILE) as usize).min(n - 1)];

    (power_to_lufs(high) - power_to_lufs(low)).max(0.0)
}
