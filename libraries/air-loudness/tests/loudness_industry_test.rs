//! ITU-R BS.1770-4 / EBU R128 metering behaviour tests
//!
//! These tests drive `LoudnessMeter` the way a host audio lane does: short
//! frames at a fixed cadence, one reading per call.
//!
//! Key behaviours tested:
//! - Digital silence reads negative infinity everywhere
//! - 997 Hz reference tone levels and agreement with the `ebur128` crate
//! - Absolute (-70 LUFS) and relative (-10 LU) gating
//! - Loudness range of constant and alternating programmes
//! - True peak estimate (sample peak + 0.5 dB)
//! - Reset, re-initialization and history capacity

use air_loudness::{power_to_lufs, KWeightingFilter, LoudnessMeter, LoudnessReading};
use ebur128::{EbuR128, Mode};
use std::f64::consts::PI;

// ============================================================================
// Test Signal Generators
// ============================================================================

/// 10 ms at 48 kHz, a typical render quantum
const QUANTUM: usize = 480;

/// Generate a mono sine wave
fn sine(sample_rate: u32, frequency_hz: f64, amplitude: f64, duration_secs: f64) -> Vec<f32> {
    let num_samples = (f64::from(sample_rate) * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / f64::from(sample_rate);
            (amplitude * (2.0 * PI * frequency_hz * t).sin()) as f32
        })
        .collect()
}

/// Amplitude of a 997 Hz sine that reads `lufs` in mono at 48 kHz
/// (0 dBFS reads -3.01 LUFS)
fn amplitude_for_lufs(lufs: f64) -> f64 {
    10.0_f64.powf((lufs + 3.01) / 20.0)
}

/// Deterministic white noise (LCG) for reproducibility
fn noise(num_samples: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..num_samples)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let unit = ((state >> 33) as f64 / (1_u64 << 31) as f64) * 2.0 - 1.0;
            amplitude * unit as f32
        })
        .collect()
}

/// Feed every channel through the meter in `chunk`-sized frames
fn run(meter: &mut LoudnessMeter, channels: &[Vec<f32>], sample_rate: u32, chunk: usize) -> LoudnessReading {
    let len = channels[0].len();
    let mut reading = meter.reading();
    let mut start = 0;
    while start < len {
        let end = (start + chunk).min(len);
        let frame: Vec<&[f32]> = channels.iter().map(|c| &c[start..end]).collect();
        reading = meter.process(&frame, sample_rate);
        start = end;
    }
    reading
}

/// Loudness of the steady-state K-weighted power of a mono signal
fn expected_lufs(signal: &[f32], sample_rate: u32) -> f64 {
    let mut filter = KWeightingFilter::new(sample_rate);
    let mut filtered = Vec::new();
    filter.filter(signal, &mut filtered);
    let settled = &filtered[sample_rate as usize..];
    power_to_lufs(settled.iter().map(|s| s * s).sum::<f64>() / settled.len() as f64)
}

fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let len = channels[0].len();
    (0..len)
        .flat_map(|i| channels.iter().map(move |c| c[i]))
        .collect()
}

fn reference_integrated(channels: &[Vec<f32>], sample_rate: u32) -> f64 {
    let mut reference = EbuR128::new(channels.len() as u32, sample_rate, Mode::I).unwrap();
    reference.add_frames_f32(&interleave(channels)).unwrap();
    reference.loudness_global().unwrap()
}

// ============================================================================
// Silence
// ============================================================================

#[test]
fn test_digital_silence_is_undefined() {
    for &(channels, sample_rate) in &[(1, 48_000), (2, 44_100), (6, 48_000), (2, 96_000)] {
        let mut meter = LoudnessMeter::new();
        let silence = vec![vec![0.0_f32; sample_rate as usize * 5]; channels];
        let reading = run(&mut meter, &silence, sample_rate, 512);

        assert_eq!(reading.momentary, f64::NEG_INFINITY, "{channels}ch @ {sample_rate}");
        assert_eq!(reading.short_term, f64::NEG_INFINITY);
        assert_eq!(reading.integrated, f64::NEG_INFINITY);
        assert_eq!(reading.true_peak, f64::NEG_INFINITY);
        assert_eq!(reading.max_momentary, f64::NEG_INFINITY);
        assert_eq!(reading.max_true_peak, f64::NEG_INFINITY);
        assert_eq!(reading.lra, 0.0);
        assert_eq!(meter.gated_block_count(), 0);
    }
}

#[test]
fn test_very_quiet_signal_below_absolute_gate() {
    // -80 dBFS noise sits below the -70 LUFS absolute gate
    let mut meter = LoudnessMeter::new();
    let signal = vec![noise(48_000 * 5, 0.000_17, 7)];
    let reading = run(&mut meter, &signal, 48_000, QUANTUM);

    assert!(reading.momentary.is_finite());
    assert!(reading.momentary < -70.0);
    assert_eq!(reading.integrated, f64::NEG_INFINITY);
    assert_eq!(meter.gated_block_count(), 0);
}

// ============================================================================
// Reference levels
// ============================================================================

#[test]
fn test_997hz_full_scale_reads_minus_3_01() {
    let mut meter = LoudnessMeter::new();
    let signal = vec![sine(48_000, 997.0, 1.0, 10.0)];
    let reading = run(&mut meter, &signal, 48_000, QUANTUM);

    assert!(
        (reading.integrated - (-3.01)).abs() < 0.05,
        "Expected -3.01 LUFS, got {:.3}",
        reading.integrated
    );
}

#[test]
fn test_stereo_sums_channel_power() {
    let tone = sine(48_000, 997.0, 0.1, 10.0);

    let mut mono = LoudnessMeter::new();
    let mono_reading = run(&mut mono, &[tone.clone()], 48_000, QUANTUM);

    let mut stereo = LoudnessMeter::new();
    let stereo_reading = run(&mut stereo, &[tone.clone(), tone], 48_000, QUANTUM);

    let difference = stereo_reading.integrated - mono_reading.integrated;
    assert!(
        (difference - 10.0 * 2.0_f64.log10()).abs() < 0.01,
        "Stereo should read 3.01 LU above mono, got {:.3}",
        difference
    );
}

#[test]
fn test_wide_channel_frame_is_measured() {
    let tone = sine(48_000, 997.0, 0.3, 1.0);

    let mut mono = LoudnessMeter::new();
    let mono_reading = run(&mut mono, &[tone.clone()], 48_000, QUANTUM);

    let mut meter = LoudnessMeter::new();
    let channels = vec![tone; 33];
    let reading = run(&mut meter, &channels, 48_000, QUANTUM);

    assert_eq!(meter.channel_count(), 33);
    assert!(reading.momentary.is_finite());
    assert!(reading.integrated.is_finite());
    assert!((reading.integrated - mono_reading.integrated - 10.0 * 33.0_f64.log10()).abs() < 0.01);
    assert!((reading.max_true_peak - mono_reading.max_true_peak).abs() < 1e-9);
}

#[test]
fn test_matches_reference_meter_at_48k() {
    let left = sine(48_000, 997.0, 0.125, 10.0);
    let right = sine(48_000, 997.0, 0.25, 10.0);
    let channels = vec![left, right];

    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &channels, 48_000, QUANTUM);
    let reference = reference_integrated(&channels, 48_000);

    assert!(
        (reading.integrated - reference).abs() < 0.1,
        "engine {:.3} LUFS vs ebur128 {:.3} LUFS",
        reading.integrated,
        reference
    );
}

#[test]
fn test_matches_reference_meter_at_44k1() {
    let channels = vec![
        sine(44_100, 2_000.0, 0.2, 10.0),
        sine(44_100, 500.0, 0.2, 10.0),
    ];

    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &channels, 44_100, 441);
    let reference = reference_integrated(&channels, 44_100);

    assert!(
        (reading.integrated - reference).abs() < 0.1,
        "engine {:.3} LUFS vs ebur128 {:.3} LUFS",
        reading.integrated,
        reference
    );
}

// ============================================================================
// Integrated loudness and gating
// ============================================================================

#[test]
fn test_constant_tone_converges() {
    let tone = sine(48_000, 997.0, 0.3, 40.0);
    let expected = expected_lufs(&tone, 48_000);

    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &[tone], 48_000, QUANTUM);
    assert!(
        (reading.integrated - expected).abs() < 0.05,
        "Expected {:.3} LUFS, got {:.3}",
        expected,
        reading.integrated
    );

    // Trailing silence never passes the absolute gate
    let after_silence = run(&mut meter, &[vec![0.0; 48_000 * 10]], 48_000, QUANTUM);
    assert!((after_silence.integrated - reading.integrated).abs() < 0.05);

    // A quieter passage 15 LU down stays below the relative gate
    let quiet = sine(48_000, 997.0, 0.3 * 10.0_f64.powf(-15.0 / 20.0), 20.0);
    let after_quiet = run(&mut meter, &[quiet], 48_000, QUANTUM);
    assert!(
        (after_quiet.integrated - reading.integrated).abs() < 0.05,
        "Relative gate should exclude the quiet passage: {:.3} vs {:.3}",
        after_quiet.integrated,
        reading.integrated
    );
}

#[test]
fn test_relative_gate_counts_moderate_passages() {
    // A passage only 5 LU down is above the relative gate and pulls I down
    let loud = sine(48_000, 997.0, amplitude_for_lufs(-20.0), 20.0);
    let moderate = sine(48_000, 997.0, amplitude_for_lufs(-25.0), 20.0);

    let mut meter = LoudnessMeter::new();
    run(&mut meter, &[loud], 48_000, QUANTUM);
    let reading = run(&mut meter, &[moderate], 48_000, QUANTUM);

    let expected = power_to_lufs(
        (10.0_f64.powf((-20.0 + 0.691) / 10.0) + 10.0_f64.powf((-25.0 + 0.691) / 10.0)) / 2.0,
    );
    assert!(
        (reading.integrated - expected).abs() < 0.1,
        "Expected {:.2} LUFS, got {:.2}",
        expected,
        reading.integrated
    );
}

#[test]
fn test_silence_then_tone_end_to_end() {
    // 10 s of silence followed by 20 s of a -20 LUFS tone, 48 kHz mono
    let mut signal = vec![0.0_f32; 48_000 * 10];
    signal.extend(sine(48_000, 997.0, amplitude_for_lufs(-20.0), 20.0));

    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &[signal], 48_000, QUANTUM);

    assert!(
        (reading.integrated - (-20.0)).abs() < 0.1,
        "integrated {:.3}",
        reading.integrated
    );
    assert!(
        (reading.max_momentary - (-20.0)).abs() < 0.1,
        "max momentary {:.3}",
        reading.max_momentary
    );
    assert!(
        (reading.max_short_term - (-20.0)).abs() < 0.1,
        "max short-term {:.3}",
        reading.max_short_term
    );
    assert!(reading.lra < 0.1, "lra {:.3}", reading.lra);
    assert_eq!(meter.gated_block_count(), 200);
}

#[test]
fn test_history_capacity_evicts_oldest_blocks() {
    let mut meter = LoudnessMeter::with_history_capacity(50).unwrap();
    let loud = sine(48_000, 997.0, amplitude_for_lufs(-10.0), 10.0);
    let quiet = sine(48_000, 997.0, amplitude_for_lufs(-40.0), 10.0);

    run(&mut meter, &[loud], 48_000, QUANTUM);
    let reading = run(&mut meter, &[quiet], 48_000, QUANTUM);

    // Only the last 5 s of quiet tone remain in the history
    assert_eq!(meter.gated_block_count(), 50);
    assert!(
        (reading.integrated - (-40.0)).abs() < 0.1,
        "integrated {:.3}",
        reading.integrated
    );
    // Maxima are not bounded by the history
    assert!((reading.max_momentary - (-10.0)).abs() < 0.1);
}

// ============================================================================
// Momentary / short-term windows
// ============================================================================

#[test]
fn test_momentary_follows_and_maximum_holds() {
    let loud = sine(48_000, 997.0, amplitude_for_lufs(-14.0), 5.0);
    let quiet = sine(48_000, 997.0, amplitude_for_lufs(-30.0), 5.0);

    let mut meter = LoudnessMeter::new();
    let after_loud = run(&mut meter, &[loud], 48_000, QUANTUM);
    let after_quiet = run(&mut meter, &[quiet], 48_000, QUANTUM);

    assert!((after_loud.momentary - (-14.0)).abs() < 0.1);
    assert!((after_quiet.momentary - (-30.0)).abs() < 0.1);
    // Short-term has seen 3 s of the quiet tone only
    assert!((after_quiet.short_term - (-30.0)).abs() < 0.1);
    assert_eq!(after_quiet.max_momentary, after_loud.max_momentary);
    assert_eq!(after_quiet.max_short_term, after_loud.max_short_term);
}

#[test]
fn test_short_term_spans_three_seconds() {
    // 1.5 s loud then 1.5 s silence: short-term averages both halves (-3 dB),
    // momentary has gone silent
    let mut signal = sine(48_000, 997.0, amplitude_for_lufs(-20.0), 1.5);
    signal.extend(vec![0.0_f32; 72_000]);

    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &[signal], 48_000, QUANTUM);

    assert!((reading.short_term - (-23.01)).abs() < 0.1, "short-term {:.3}", reading.short_term);
    assert!(reading.momentary < -70.0);
}

#[test]
fn test_chunk_size_does_not_change_result() {
    let tone = vec![sine(48_000, 1_234.0, 0.4, 6.0), noise(288_000, 0.2, 3)];

    let mut small = LoudnessMeter::new();
    let mut large = LoudnessMeter::new();
    let small_reading = run(&mut small, &tone, 48_000, 64);
    let large_reading = run(&mut large, &tone, 48_000, 48_000);

    assert!((small_reading.integrated - large_reading.integrated).abs() < 1e-9);
    assert!((small_reading.short_term - large_reading.short_term).abs() < 1e-9);
    assert!((small_reading.max_momentary - large_reading.max_momentary).abs() < 1e-9);
    assert!((small_reading.lra - large_reading.lra).abs() < 1e-9);
}

// ============================================================================
// Loudness range
// ============================================================================

#[test]
fn test_lra_zero_for_constant_level() {
    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &[sine(48_000, 997.0, 0.2, 30.0)], 48_000, QUANTUM);
    assert!(reading.lra < 0.05, "lra {:.3}", reading.lra);
}

#[test]
fn test_lra_for_alternating_levels() {
    // 5 s at -20 LUFS, 5 s at -30 LUFS, repeated for a minute
    let mut signal = Vec::new();
    for _ in 0..6 {
        signal.extend(sine(48_000, 997.0, amplitude_for_lufs(-20.0), 5.0));
        signal.extend(sine(48_000, 997.0, amplitude_for_lufs(-30.0), 5.0));
    }

    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &[signal], 48_000, QUANTUM);

    assert!(reading.lra > 0.0);
    assert!((reading.lra - 10.0).abs() < 0.5, "lra {:.3}", reading.lra);
}

// ============================================================================
// True peak
// ============================================================================

#[test]
fn test_full_scale_sine_true_peak() {
    for &frequency in &[440.0, 997.0, 1_000.0] {
        for channels in [1_usize, 2, 6] {
            let tone = sine(48_000, frequency, 1.0, 1.0);
            let mut meter = LoudnessMeter::new();
            let reading = run(&mut meter, &vec![tone; channels], 48_000, 48_000);

            assert!(
                (reading.true_peak - 0.5).abs() < 0.01,
                "{frequency} Hz x{channels}: {:.4} dBTP",
                reading.true_peak
            );
            assert_eq!(reading.max_true_peak, reading.true_peak);
        }
    }
}

#[test]
fn test_true_peak_bypasses_k_weighting() {
    // DC is removed by the high pass but still counts as peak
    let mut meter = LoudnessMeter::new();
    let reading = run(&mut meter, &[vec![0.5_f32; 48_000 * 2]], 48_000, QUANTUM);

    let expected = 20.0 * 0.5_f64.log10() + 0.5;
    assert!((reading.true_peak - expected).abs() < 1e-6);
    assert!(reading.momentary < -70.0);
}

#[test]
fn test_true_peak_is_per_call_and_max_is_held() {
    let mut meter = LoudnessMeter::new();
    let loud = meter.process(&[vec![0.9_f32; QUANTUM]], 48_000);
    let quiet = meter.process(&[vec![0.1_f32; QUANTUM]], 48_000);

    assert!(quiet.true_peak < loud.true_peak);
    assert_eq!(quiet.max_true_peak, loud.true_peak);
}

// ============================================================================
// Robustness, reset and re-initialization
// ============================================================================

#[test]
fn test_non_finite_samples_count_as_silence() {
    let mut clean = sine(48_000, 997.0, 0.3, 5.0);
    let mut corrupt = clean.clone();
    for index in (1_000..clean.len()).step_by(7_919) {
        clean[index] = 0.0;
        corrupt[index] = if index % 2 == 0 { f32::NAN } else { f32::INFINITY };
    }

    let mut clean_meter = LoudnessMeter::new();
    let mut corrupt_meter = LoudnessMeter::new();
    let expected = run(&mut clean_meter, &[clean], 48_000, QUANTUM);
    let reading = run(&mut corrupt_meter, &[corrupt], 48_000, QUANTUM);

    assert_eq!(reading, expected);
    assert!(reading.integrated.is_finite());
}

#[test]
fn test_reset_reproduces_fresh_meter() {
    let signal = vec![sine(44_100, 330.0, 0.5, 4.0), noise(44_100 * 4, 0.3, 11)];
    let chunks = [128_usize, 1_000, 333, 4_410, 97];

    let feed = |meter: &mut LoudnessMeter| -> Vec<LoudnessReading> {
        let mut readings = Vec::new();
        let mut start = 0;
        let mut i = 0;
        while start < signal[0].len() {
            let end = (start + chunks[i % chunks.len()]).min(signal[0].len());
            readings.push(meter.process(&[&signal[0][start..end], &signal[1][start..end]], 44_100));
            start = end;
            i += 1;
        }
        readings
    };

    let mut fresh = LoudnessMeter::new();
    let expected = feed(&mut fresh);

    let mut reused = LoudnessMeter::new();
    run(&mut reused, &[noise(44_100 * 3, 0.9, 5), noise(44_100 * 3, 0.7, 6)], 44_100, 700);
    run(&mut reused, &[noise(1_234, 0.9, 9), noise(1_234, 0.7, 10)], 44_100, 1_234);
    reused.reset();
    let actual = feed(&mut reused);

    assert_eq!(actual, expected);
}

#[test]
fn test_reinitialization_on_format_change() {
    let mut meter = LoudnessMeter::new();
    run(&mut meter, &[sine(48_000, 997.0, 0.5, 3.0)], 48_000, QUANTUM);
    assert!(meter.reading().has_integrated());

    // Same audio at a new rate starts a new measurement
    let reading = meter.process(&[vec![0.0_f32; 441]], 44_100);
    assert_eq!(meter.sample_rate(), 44_100);
    assert_eq!(reading.integrated, f64::NEG_INFINITY);
    assert_eq!(reading.max_true_peak, f64::NEG_INFINITY);

    // And a new channel count does the same
    run(&mut meter, &[sine(44_100, 997.0, 0.5, 1.0)], 44_100, 441);
    let reading = meter.process(&[vec![0.0_f32; 441], vec![0.0_f32; 441]], 44_100);
    assert_eq!(meter.channel_count(), 2);
    assert_eq!(reading.max_momentary, f64::NEG_INFINITY);
}
