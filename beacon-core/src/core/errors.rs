//! Error types for telemetry setup
//!
//! Only configuration can fail. Delivery and memory-read problems are
//! absorbed at runtime so the request path never sees them.

use thiserror::Error;

/// Errors surfaced while building a [`crate::MetricsManager`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Sampling rate outside [0, 1] (or NaN)
    #[error("Invalid sampling rate {0}: must be within [0.0, 1.0]")]
    InvalidSamplingRate(f64),

    /// Whitelist entry that can never match a request path
    #[error("Invalid whitelisted path '{0}': must be non-empty, start with '/' and carry no query or fragment")]
    InvalidWhitelistEntry(String),

    /// Salt configured but empty
    #[error("Salt must not be empty; leave it unset to use a random per-process salt")]
    EmptySalt,

    /// Heartbeat interval of zero
    #[error("Heartbeat interval must be greater than zero")]
    InvalidHeartbeatInterval,

    /// Transport buffer or batch settings that cannot work
    #[error("Invalid transport settings: {0}")]
    InvalidTransport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_rate_error_display() {
        let err = ConfigError::InvalidSamplingRate(1.5);
        let msg = format!("{}", err);
        assert!(msg.contains("1.5"));
        assert!(msg.contains("[0.0, 1.0]"));
    }

    #[test]
    fn test_whitelist_error_display() {
        let err = ConfigError::InvalidWhitelistEntry("keys".to_string());
        assert!(err.to_string().contains("'keys'"));
    }

    #[test]
    fn test_empty_salt_error_display() {
        assert!(ConfigError::EmptySalt.to_string().contains("unset"));
    }
}
