//! K-weighting pre-filter (ITU-R BS.1770-4)
//!
//! Two cascaded biquads per channel:
//! - Stage 1: high shelf, about +4 dB above ~1.7 kHz (head acoustics)
//! - Stage 2: high pass at ~38 Hz (RLB weighting)
//!
//! 48 kHz uses the exact coefficients from BS.1770-4 Table 1 and 2. Every other
//! rate uses the 44.1 kHz set, derived via the bilinear transform.

/// Coefficients of one biquad, normalized so that a0 = 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// 48 kHz high shelf (BS.1770-4 Table 1)
const SHELF_48K: BiquadCoefficients = BiquadCoefficients {
    b0: 1.53512485958697,
    b1: -2.69169618940638,
    b2: 1.19839281085285,
    a1: -1.69065929318241,
    a2: 0.73248077421585,
};

/// 48 kHz high pass (BS.1770-4 Table 2)
const HIGHPASS_48K: BiquadCoefficients = BiquadCoefficients {
    b0: 1.0,
    b1: -2.0,
    b2: 1.0,
    a1: -1.99004745483398,
    a2: 0.99007225036621,
};

/// High shelf for all other rates
const SHELF_GENERIC: BiquadCoefficients = BiquadCoefficients {
    b0: 1.5308412300503478,
    b1: -2.6509799951547297,
    b2: 1.1690790799215869,
    a1: -1.6636551132560204,
    a2: 0.7125954280732254,
};

/// High pass for all other rates
const HIGHPASS_GENERIC: BiquadCoefficients = BiquadCoefficients {
    b0: 1.0,
    b1: -2.0,
    b2: 1.0,
    a1: -1.98916967362980,
    a2: 0.98919903578704,
};

impl BiquadCoefficients {
    /// (shelf, high pass) pair for a sample rate
    pub fn k_weighting(sample_rate: u32) -> (Self, Self) {
        if sample_rate == 48_000 {
            (SHELF_48K, HIGHPASS_48K)
        } else {
            (SHELF_GENERIC, HIGHPASS_GENERIC)
        }
    }
}

/// Direct form I history of one biquad
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

impl BiquadState {
    /// y[n] = b0 x[n] + b1 x[n-1] + b2 x[n-2] - a1 y[n-1] - a2 y[n-2]
    #[inline]
    pub fn tick(&mut self, c: &BiquadCoefficients, x: f64) -> f64 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// K-weighting cascade for a single channel
#[derive(Debug, Clone)]
pub struct KWeightingFilter {
    shelf: BiquadCoefficients,
    highpass: BiquadCoefficients,
    shelf_state: BiquadState,
    highpass_state: BiquadState,
}

impl KWeightingFilter {
    /// Create a filter for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let (shelf, highpass) = BiquadCoefficients::k_weighting(sample_rate);
        Self {
            shelf,
            highpass,
            shelf_state: BiquadState::default(),
            highpass_state: BiquadState::default(),
        }
    }

    /// Filter one sample through both stages
    #[inline]
    pub fn tick(&mut self, x: f64) -> f64 {
        let shelved = self.shelf_state.tick(&self.shelf, x);
        self.highpass_state.tick(&self.highpass, shelved)
    }

    /// Filter a run of raw samples into `output` (cleared first, same length).
    ///
    /// Non-finite samples are treated as silence so a corrupt frame cannot
    /// poison the filter history.
    pub fn filter(&mut self, input: &[f32], output: &mut Vec<f64>) {
        output.clear();
        output.extend(input.iter().map(|&sample| {
            let x = if sample.is_finite() {
                f64::from(sample)
            } else {
                0.0
            };
            self.tick(x)
        }));
    }

    /// Clear the filter history
    pub fn reset(&mut self) {
        self.shelf_state = BiquadState::default();
        self.highpass_state = BiquadState::default();
    }
}

/// One K-weighting cascade per channel
#[derive(Debug, Clone, Default)]
pub struct FilterBank {
    filters: Vec<KWeightingFilter>,
}

impl FilterBank {
    /// Create a bank for `channels` channels at `sample_rate`
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            filters: vec![KWeightingFilter::new(sample_rate); channels],
        }
    }

    /// Number of channels in the bank
    pub fn channels(&self) -> usize {
        self.filters.len()
    }

    /// Filter the raw samples of `channel` into `output`.
    ///
    /// An out-of-range channel leaves `output` empty.
    pub fn filter(&mut self, input: &[f32], channel: usize, output: &mut Vec<f64>) {
        match self.filters.get_mut(channel) {
            Some(filter) => filter.filter(input, output),
            None => output.clear(),
        }
    }

    /// Clear the history of every channel
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}
