use crate::error::{Result, TransferStatsError};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default sampler tick, in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 200;

/// Configuration for rate trackers
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Sampler configuration
    pub sampler: SamplerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplerConfig {
    /// How often the background sampler recomputes the rate
    pub interval_ms: u64,

    /// Emit a trace line for every recomputed rate
    pub log_samples: bool,
}

impl TrackerConfig {
    /// Create configuration from a config file with environment variable overrides
    pub fn from_config_file(config_path: &str) -> Result<Self> {
        if !Path::new(config_path).exists() {
            return Err(TransferStatsError::ConfigFileNotFound(format!(
                "Cannot read config file '{}'",
                config_path
            )));
        }

        let settings = config::Config::builder()
            .set_default("sampler.interval_ms", DEFAULT_INTERVAL_MS as i64)?
            .set_default("sampler.log_samples", false)?
            .add_source(config::File::from(Path::new(config_path)))
            .build()
            .map_err(|e| {
                TransferStatsError::ConfigFileParseError(format!(
                    "Invalid config in '{}': {}",
                    config_path, e
                ))
            })?;

        let mut config: TrackerConfig = settings.try_deserialize()?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        // Validate the configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides to config
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(interval_str) = env::var("RAX_STATS_INTERVAL_MS") {
            self.sampler.interval_ms = interval_str.parse().map_err(|_| {
                TransferStatsError::InvalidConfigValue(
                    "RAX_STATS_INTERVAL_MS must be a valid number of milliseconds".to_string(),
                )
            })?;
        }

        if let Ok(log_samples_str) = env::var("RAX_STATS_LOG_SAMPLES") {
            self.sampler.log_samples = log_samples_str.parse().map_err(|_| {
                TransferStatsError::InvalidConfigValue(
                    "RAX_STATS_LOG_SAMPLES must be 'true' or 'false'".to_string(),
                )
            })?;
        }

        Ok(())
    }

    /// Sampler tick as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sampler.interval_ms)
    }

    pub fn log_samples(&self) -> bool {
        self.sampler.log_samples
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sampler.interval_ms == 0 {
            return Err(TransferStatsError::InvalidConfigValue(
                "Sampler interval cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig {
                interval_ms: DEFAULT_INTERVAL_MS,
                log_samples: false,
            },
        }
    }
}

impl std::fmt::Display for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tracker Config - Sample Interval: {}ms, Log Samples: {}",
            self.sampler.interval_ms, self.sampler.log_samples
        )
    }
}
