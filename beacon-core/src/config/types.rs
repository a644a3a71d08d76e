use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity, anonymization and scheduling settings for the manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Unique value identifying this install (only its hash is sent)
    #[serde(default)]
    pub service_id: String,

    /// Events are only sent in production
    #[serde(default)]
    pub is_production: bool,

    /// Transport credential; empty disables sending
    #[serde(default)]
    pub write_key: String,

    /// Literal paths reported without hashing
    #[serde(default)]
    pub whitelisted_paths: Vec<String>,

    /// Hashing salt; a random one is generated per process when unset
    #[serde(default)]
    pub salt: Option<String>,

    /// Fraction of requests that produce an event (0.0 to 1.0)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,

    /// Seconds between memory statistics events
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

impl TelemetryConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

/// Buffering between the request path and the sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Events held before new ones are dropped
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Events per sink call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum time a partial batch waits (milliseconds)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Write events as JSON lines here instead of logging them
    #[serde(default)]
    pub journal_path: Option<PathBuf>,

    /// How long dropping the transport waits for the worker (milliseconds)
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl TransportConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_sampling_rate() -> f64 {
    1.0
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_buffer_capacity() -> usize {
    1024
}

fn default_batch_size() -> usize {
    64
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_id: String::new(),
            is_production: false,
            write_key: String::new(),
            whitelisted_paths: Vec::new(),
            salt: None,
            sampling_rate: default_sampling_rate(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            journal_path: None,
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}
