//! WAV file measurement
//!
//! Decodes a WAV file with `hound`, feeds it to a [`LoudnessMeter`] in
//! `chunk_ms` frames and checks every reading with a [`ViolationMonitor`].
//! Readings are timestamped in media time (session start plus the audio
//! consumed so far) so debounce intervals mean the same offline as live.

use crate::config::MeterConfig;
use crate::error::{MeterAppError, Result};
use air_core::{LoudnessReading, LoudnessStandard, ViolationEvent, ViolationThresholds};
use air_loudness::{LoudnessMeter, ViolationMonitor};
use chrono::{DateTime, TimeDelta, Utc};
use hound::{SampleFormat, WavReader};
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Result of measuring one file
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementReport {
    pub file: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f64,
    pub standard: LoudnessStandard,
    pub thresholds: ViolationThresholds,
    /// Reading after the last frame
    pub reading: LoudnessReading,
    /// Every violation fired during the run, in order
    pub violations: Vec<ViolationEvent>,
    /// Media time of the first sample
    pub started_at: DateTime<Utc>,
}

impl MeasurementReport {
    /// Whether no violation fired
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Offset of an event from the start of the file
    pub fn offset_of(&self, event: &ViolationEvent) -> TimeDelta {
        event.timestamp.signed_duration_since(self.started_at)
    }
}

impl fmt::Display for MeasurementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.reading;
        writeln!(f, "File:            {}", self.file)?;
        writeln!(
            f,
            "Format:          {} ch, {} Hz, {:.1} s",
            self.channels, self.sample_rate, self.duration_secs
        )?;
        writeln!(
            f,
            "Standard:        {} (target {:.1} LUFS \u{00b1} {:.1} LU, ceiling {:.1} dBTP)",
            self.standard.label(),
            self.thresholds.target_lufs,
            self.thresholds.tolerance_lu,
            self.thresholds.true_peak_limit_dbtp
        )?;
        writeln!(f, "Integrated:      {:.1} LUFS", r.integrated)?;
        writeln!(f, "Loudness range:  {:.1} LU", r.lra)?;
        writeln!(f, "Max momentary:   {:.1} LUFS", r.max_momentary)?;
        writeln!(f, "Max short-term:  {:.1} LUFS", r.max_short_term)?;
        writeln!(f, "Max true peak:   {:.1} dBTP", r.max_true_peak)?;

        if self.passed() {
            write!(f, "Violations:      none")
        } else {
            write!(f, "Violations:      {}", self.violations.len())?;
            for event in &self.violations {
                let offset = self.offset_of(event);
                write!(
                    f,
                    "\n  {:>8.1} s  {:<5}  {}",
                    offset.num_milliseconds() as f64 / 1000.0,
                    event.kind.as_str().to_uppercase(),
                    event.description()
                )?;
            }
            Ok(())
        }
    }
}

/// Measure a WAV file on disk
pub fn measure_file(path: &Path, config: &MeterConfig) -> Result<MeasurementReport> {
    let reader = WavReader::open(path)?;
    let mut report = measure_wav(reader, config, Utc::now())?;
    report.file = path.display().to_string();
    Ok(report)
}

/// Measure WAV data from any reader, timestamping from `session_start`
pub fn measure_wav<R: Read>(
    mut reader: WavReader<R>,
    config: &MeterConfig,
    session_start: DateTime<Utc>,
) -> Result<MeasurementReport> {
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(MeterAppError::UnsupportedFormat(format!(
            "{} channel(s) at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    info!(
        "Measuring {} channel(s) at {} Hz, {}-bit {:?}",
        spec.channels, spec.sample_rate, spec.bits_per_sample, spec.sample_format
    );

    let mut session = Session::new(config, spec.channels as usize, spec.sample_rate, session_start)?;

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => session.run(reader.samples::<f32>())?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1_u64 << (bits - 1)) as f32;
            session.run(reader.samples::<i32>().map(|s| s.map(|v| v as f32 * scale)))?;
        }
        (format, bits) => {
            return Err(MeterAppError::UnsupportedFormat(format!(
                "{}-bit {:?}",
                bits, format
            )))
        }
    }

    Ok(session.finish(config, spec.channels))
}

/// One pass over a file
struct Session {
    meter: LoudnessMeter,
    monitor: ViolationMonitor,
    sample_rate: u32,
    frames_per_chunk: usize,
    buffers: Vec<Vec<f32>>,
    consumed: u64,
    started_at: DateTime<Utc>,
    reading: LoudnessReading,
    violations: Vec<ViolationEvent>,
}

impl Session {
    fn new(config: &MeterConfig, channels: usize, sample_rate: u32, started_at: DateTime<Utc>) -> Result<Self> {
        let meter = LoudnessMeter::with_history_capacity(config.meter.gated_history_blocks)?;
        let monitor = ViolationMonitor::new(config.thresholds(), config.debounce())?;
        let frames_per_chunk =
            ((u64::from(sample_rate) * u64::from(config.meter.chunk_ms)) / 1000).max(1) as usize;

        debug!("Feeding {} frame(s) per chunk", frames_per_chunk);

        Ok(Self {
            meter,
            monitor,
            sample_rate,
            frames_per_chunk,
            buffers: vec![Vec::with_capacity(frames_per_chunk); channels],
            consumed: 0,
            started_at,
            reading: LoudnessReading::default(),
            violations: Vec::new(),
        })
    }

    /// Deinterleave `samples` into chunks and measure each one
    fn run<I>(&mut self, samples: I) -> Result<()>
    where
        I: Iterator<Item = hound::Result<f32>>,
    {
        let channels = self.buffers.len();
        for (index, sample) in samples.enumerate() {
            self.buffers[index % channels].push(sample?);
            if index % channels == channels - 1 && self.buffers[0].len() == self.frames_per_chunk {
                self.flush();
            }
        }

        // A trailing partial frame is dropped
        let complete = self.buffers.iter().map(Vec::len).min().unwrap_or(0);
        for buffer in &mut self.buffers {
            buffer.truncate(complete);
        }
        if complete > 0 {
            self.flush();
        }
        Ok(())
    }

    fn flush(&mut self) {
        let frames = self.buffers[0].len();
        self.reading = self.meter.process(&self.buffers, self.sample_rate);
        self.consumed += frames as u64;

        let now = self.media_time();
        let events = self.monitor.check(&self.reading, now);
        self.violations.extend(events);

        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }

    fn media_time(&self) -> DateTime<Utc> {
        let micros = self.consumed * 1_000_000 / u64::from(self.sample_rate);
        self.started_at + TimeDelta::microseconds(micros as i64)
    }

    fn finish(self, config: &MeterConfig, channels: u16) -> MeasurementReport {
        info!(
            "Measured {:.1} s: {} violation(s)",
            self.consumed as f64 / f64::from(self.sample_rate),
            self.violations.len()
        );

        MeasurementReport {
            file: String::new(),
            sample_rate: self.sample_rate,
            channels,
            duration_secs: self.consumed as f64 / f64::from(self.sample_rate),
            standard: config.alerts.standard,
            thresholds: config.thresholds(),
            reading: self.reading,
            violations: self.violations,
            started_at: self.started_at,
        }
    }
}
