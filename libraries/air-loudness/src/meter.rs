//! Streaming loudness meter
//!
//! Ties the K-weighting bank, block accumulator, sliding windows, gated history
//! and true peak estimator together behind `process` / `reset`.

use crate::block::BlockAccumulator;
use crate::error::{LoudnessError, Result};
use crate::gating::{GatedHistory, GatedLoudness};
use crate::kweighting::FilterBank;
use crate::true_peak::TruePeakEstimator;
use crate::window::LoudnessWindow;
use crate::{DEFAULT_GATED_HISTORY_BLOCKS, MOMENTARY_BLOCKS, SHORT_TERM_BLOCKS};
use air_core::LoudnessReading;
use tracing::{debug, warn};

/// Real-time BS.1770 loudness meter for one measurement session.
///
/// Feed it audio as it becomes available; every call returns a fresh
/// [`LoudnessReading`]. Filtering, block accumulation and true peak cost is
/// proportional to the frame length. Integrated loudness and LRA are only
/// recomputed when a call completes at least one 100 ms block, and that pass
/// re-gates and sorts the whole gated history: O(H log H) for H held blocks,
/// with H capped by [`history_capacity`](Self::history_capacity) (18 000 by
/// default). Lower the capacity with
/// [`with_history_capacity`](Self::with_history_capacity) where that matters.
///
/// A change of channel count or sample rate between calls re-initializes the
/// meter, which discards all accumulated history and maxima.
///
/// # Example
///
/// ```
/// use air_loudness::LoudnessMeter;
///
/// let mut meter = LoudnessMeter::new();
///
/// // 1 second of a -20 dBFS 1 kHz tone, mono, 48 kHz, fed in 10 ms quanta
/// let tone: Vec<f32> = (0..48_000)
///     .map(|i| 0.1 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48_000.0).sin())
///     .collect();
/// let mut reading = meter.reading();
/// for quantum in tone.chunks(480) {
///     reading = meter.process(&[quantum], 48_000);
/// }
///
/// assert!(reading.momentary > -24.0 && reading.momentary < -22.0);
/// assert!(reading.has_integrated());
/// ```
#[derive(Debug, Clone)]
pub struct LoudnessMeter {
    /// Current channel count (0 until the first frame)
    channels: usize,
    /// Current sample rate in Hz (0 until the first frame)
    sample_rate: u32,
    filters: FilterBank,
    accumulator: BlockAccumulator,
    momentary: LoudnessWindow,
    short_term: LoudnessWindow,
    gated: GatedHistory,
    true_peak: TruePeakEstimator,
    /// Last gated measurement, refreshed when new blocks arrive
    gated_loudness: GatedLoudness,
    max_momentary: f64,
    max_short_term: f64,
    /// Most recent reading, returned unchanged for skipped frames
    reading: LoudnessReading,
    /// K-weighted samples per channel, reused between calls
    filtered: Vec<Vec<f64>>,
    /// Block powers completed by the current call, reused between calls
    blocks: Vec<f64>,
}

impl LoudnessMeter {
    /// Create a meter with the default 30 minute gated history
    pub fn new() -> Self {
        Self::build(DEFAULT_GATED_HISTORY_BLOCKS)
    }

    /// Create a meter whose gated history holds `blocks` 100 ms blocks
    pub fn with_history_capacity(blocks: usize) -> Result<Self> {
        if blocks == 0 {
            return Err(LoudnessError::InvalidHistoryCapacity(blocks));
        }
        Ok(Self::build(blocks))
    }

    fn build(history_blocks: usize) -> Self {
        Self {
            channels: 0,
            sample_rate: 0,
            filters: FilterBank::default(),
            accumulator: BlockAccumulator::new(0, 0),
            momentary: LoudnessWindow::new(MOMENTARY_BLOCKS),
            short_term: LoudnessWindow::new(SHORT_TERM_BLOCKS),
            gated: GatedHistory::new(history_blocks),
            true_peak: TruePeakEstimator::new(),
            gated_loudness: GatedLoudness::default(),
            max_momentary: f64::NEG_INFINITY,
            max_short_term: f64::NEG_INFINITY,
            reading: LoudnessReading::default(),
            filtered: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Configure the meter for a channel count and sample rate.
    ///
    /// Calling it again with the current configuration does nothing. Any other
    /// configuration rebuilds the filters and clears all measurement state.
    pub fn initialize(&mut self, channels: usize, sample_rate: u32) -> Result<()> {
        if channels == 0 {
            return Err(LoudnessError::InvalidChannelCount(channels));
        }
        if BlockAccumulator::block_size_for(sample_rate) == 0 {
            return Err(LoudnessError::InvalidSampleRate(sample_rate));
        }
        if channels == self.channels && sample_rate == self.sample_rate {
            return Ok(());
        }

        debug!(
            "Configuring loudness meter: {} channel(s) at {} Hz (was {} at {} Hz)",
            channels, sample_rate, self.channels, self.sample_rate
        );

        self.channels = channels;
        self.sample_rate = sample_rate;
        self.filters = FilterBank::new(channels, sample_rate);
        self.accumulator = BlockAccumulator::new(channels, sample_rate);
        self.filtered.resize_with(channels, Vec::new);
        self.clear_measurements();
        Ok(())
    }

    /// Measure one frame of audio.
    ///
    /// `channels` holds one slice per channel, all of the same non-zero length.
    /// Malformed frames (no channels, empty or mismatched channels, or a
    /// configuration [`initialize`](Self::initialize) rejects) are skipped and
    /// the previous reading is returned unchanged. Non-finite samples count as
    /// silence.
    pub fn process<C: AsRef<[f32]>>(&mut self, channels: &[C], sample_rate: u32) -> LoudnessReading {
        let Some(frames) = frame_length(channels) else {
            debug!(
                "Skipping malformed frame ({} channel(s), lengths {:?})",
                channels.len(),
                channels.iter().map(|c| c.as_ref().len()).collect::<Vec<_>>()
            );
            return self.reading;
        };

        if let Err(err) = self.initialize(channels.len(), sample_rate) {
            warn!("Skipping {} frame(s): {}", frames, err);
            return self.reading;
        }

        for (index, (channel, output)) in channels.iter().zip(self.filtered.iter_mut()).enumerate() {
            self.filters.filter(channel.as_ref(), index, output);
        }

        self.blocks.clear();
        self.accumulator.push(&self.filtered, &mut self.blocks);
        for &power in &self.blocks {
            self.momentary.push(power);
            self.short_term.push(power);
            self.gated.push(power);

            let momentary = self.momentary.loudness();
            if momentary.is_finite() && momentary > self.max_momentary {
                self.max_momentary = momentary;
            }
            let short_term = self.short_term.loudness();
            if short_term.is_finite() && short_term > self.max_short_term {
                self.max_short_term = short_term;
            }
        }
        if !self.blocks.is_empty() {
            self.gated_loudness = self.gated.measure();
        }

        let true_peak = self.true_peak.measure(channels);

        self.reading = LoudnessReading {
            momentary: self.momentary.loudness(),
            short_term: self.short_term.loudness(),
            integrated: self.gated_loudness.integrated,
            true_peak,
            lra: self.gated_loudness.lra,
            max_momentary: self.max_momentary,
            max_short_term: self.max_short_term,
            max_true_peak: self.true_peak.max_dbtp(),
        };
        self.reading
    }

    /// Start a new integration period.
    ///
    /// Clears filter history, the unfinished block, all windows, the gated
    /// history and maxima. The channel count and sample rate are kept.
    pub fn reset(&mut self) {
        debug!("Resetting loudness meter");
        self.clear_measurements();
    }

    fn clear_measurements(&mut self) {
        self.filters.reset();
        self.accumulator.reset();
        self.momentary.clear();
        self.short_term.clear();
        self.gated.clear();
        self.true_peak.reset();
        self.gated_loudness = GatedLoudness::default();
        self.max_momentary = f64::NEG_INFINITY;
        self.max_short_term = f64::NEG_INFINITY;
        self.reading = LoudnessReading::default();
        for channel in &mut self.filtered {
            channel.clear();
        }
        self.blocks.clear();
    }

    /// Most recent reading
    pub fn reading(&self) -> LoudnessReading {
        self.reading
    }

    /// Configured channel count (0 before the first frame)
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Configured sample rate in Hz (0 before the first frame)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel in one 100 ms block
    pub fn block_size(&self) -> usize {
        self.accumulator.block_size()
    }

    /// Blocks currently held above the absolute gate
    pub fn gated_block_count(&self) -> usize {
        self.gated.len()
    }

    /// Capacity of the gated history in blocks
    pub fn history_capacity(&self) -> usize {
        self.gated.capacity()
    }
}

impl Default for LoudnessMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared channel length, or `None` for an empty or ragged frame
fn frame_length<C: AsRef<[f32]>>(channels: &[C]) -> Option<usize> {
    let len = channels.first()?.as_ref().len();
    if len == 0 || channels.iter().any(|c| c.as_ref().len() != len) {
        return None;
    }
    Some(len)
}
