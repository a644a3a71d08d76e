pub mod types;

pub use types::*;

use crate::core::ConfigError;
use anyhow::{Context, Result};
use ::config::{Config as ConfigLoader, Environment, File};
use std::path::Path;

impl Config {
    /// Load configuration from file with optional environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(Some(path.as_ref()))
    }

    /// Load from defaults and `BEACON__*` environment variables only
    pub fn from_env() -> Result<Self> {
        Self::build(None)
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            // Start with default values
            .set_default("telemetry.is_production", false)?
            .set_default("telemetry.sampling_rate", 1.0)?
            .set_default("telemetry.heartbeat_interval_secs", 30)?
            .set_default("transport.buffer_capacity", 1024)?
            .set_default("transport.batch_size", 64)?
            .set_default("transport.flush_interval_ms", 1000)?
            .set_default("transport.drain_timeout_ms", 5000)?
            .set_default("logging.log_level", "info")?
            .set_default("logging.json_logs", false)?;

        if let Some(path) = path {
            // Load from TOML file
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            // Override with environment variables (BEACON__TELEMETRY__WRITE_KEY, ...)
            .add_source(
                Environment::with_prefix("BEACON")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("telemetry.whitelisted_paths"),
            )
            .build()
            .context("Failed to build configuration")?;

        // Deserialize into Config struct
        let cfg: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.telemetry.validate()?;
        self.transport.validate()?;

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}', must be one of: {:?}",
                self.logging.log_level,
                valid_log_levels
            );
        }

        Ok(())
    }
}

impl TelemetryConfig {
    /// Reject settings the manager cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            return Err(ConfigError::InvalidSamplingRate(self.sampling_rate));
        }

        for path in &self.whitelisted_paths {
            if !path.starts_with('/') || path.contains('?') || path.contains('#') {
                return Err(ConfigError::InvalidWhitelistEntry(path.clone()));
            }
        }

        if self.salt.as_deref() == Some("") {
            return Err(ConfigError::EmptySalt);
        }

        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidHeartbeatInterval);
        }

        Ok(())
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidTransport(
                "buffer_capacity must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidTransport(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::InvalidTransport(
                "flush_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
