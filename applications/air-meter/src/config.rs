/// Meter configuration
use crate::error::{MeterAppError, Result};
use air_core::{LoudnessStandard, ViolationThresholds, DEFAULT_TOLERANCE_LU};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment overrides, e.g. `AIR_ALERTS__TARGET_LUFS=-16`
pub const ENV_PREFIX: &str = "AIR";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeterConfig {
    #[serde(default = "default_meter")]
    pub meter: MeterSettings,

    #[serde(default = "default_alerts")]
    pub alerts: AlertSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeterSettings {
    /// Gated history capacity in 100 ms blocks
    #[serde(default = "default_gated_history_blocks")]
    pub gated_history_blocks: usize,

    /// Length of each frame fed to the meter, in milliseconds
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertSettings {
    #[serde(default)]
    pub standard: LoudnessStandard,

    /// Overrides the standard's target
    #[serde(default)]
    pub target_lufs: Option<f64>,

    /// Overrides the standard's true peak ceiling
    #[serde(default)]
    pub true_peak_limit_dbtp: Option<f64>,

    #[serde(default = "default_tolerance_lu")]
    pub tolerance_lu: f64,

    /// PEAK / LOUD re-fire interval; QUIET uses five times this
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl MeterConfig {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; otherwise `config.toml` is used when
    /// present. `AIR_`-prefixed environment variables override both, with `__`
    /// between section and key.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(MeterAppError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.meter.gated_history_blocks == 0 {
            return Err(MeterAppError::Config(
                "meter.gated_history_blocks must be at least 1".to_string(),
            ));
        }

        if !(1..=1_000).contains(&self.meter.chunk_ms) {
            return Err(MeterAppError::Config(format!(
                "meter.chunk_ms must be between 1 and 1000, got {}",
                self.meter.chunk_ms
            )));
        }

        self.thresholds().validate()?;
        Ok(())
    }

    /// Thresholds of the configured standard with any overrides applied
    pub fn thresholds(&self) -> ViolationThresholds {
        let alerts = &self.alerts;
        ViolationThresholds::new(
            alerts
                .target_lufs
                .unwrap_or_else(|| alerts.standard.target_lufs()),
            alerts
                .true_peak_limit_dbtp
                .unwrap_or_else(|| alerts.standard.true_peak_limit_dbtp()),
            alerts.tolerance_lu,
        )
    }

    /// Base debounce interval for the violation monitor
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.alerts.debounce_ms)
    }
}

// Default values
fn default_meter() -> MeterSettings {
    MeterSettings {
        gated_history_blocks: default_gated_history_blocks(),
        chunk_ms: default_chunk_ms(),
    }
}

fn default_gated_history_blocks() -> usize {
    air_loudness::DEFAULT_GATED_HISTORY_BLOCKS
}

fn default_chunk_ms() -> u32 {
    10
}

fn default_alerts() -> AlertSettings {
    AlertSettings {
        standard: LoudnessStandard::default(),
        target_lufs: None,
        true_peak_limit_dbtp: None,
        tolerance_lu: default_tolerance_lu(),
        debounce_ms: default_debounce_ms(),
    }
}

fn default_tolerance_lu() -> f64 {
    DEFAULT_TOLERANCE_LU
}

fn default_debounce_ms() -> u64 {
    air_loudness::DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            meter: default_meter(),
            alerts: default_alerts(),
        }
    }
}
