//! Beacon Core - Privacy-Preserving Usage Telemetry for HTTP Services
//!
//! Beacon observes the requests a service handles and reports them as
//! anonymized analytics events, alongside periodic process memory
//! statistics. Nothing that identifies a user, a key or a deployment
//! leaves the process in clear text.
//!
//! ## Architecture
//! - **Salted SHA-256** of every non-whitelisted path tail and query value
//! - **Hashed identity** derived from the service id
//! - **Fire-and-forget** transport: enqueue never blocks a request
//! - **Background tasks** for registration and the memory heartbeat
//!
//! ## Core Modules
//! - `anonymize`: Path and query anonymization
//! - `stats`: Memory statistics (allocator counters, process counters)
//! - `sampling`: Per-request sampling decision
//! - `transport`: Event model, transport seam, buffered delivery
//! - `manager`: The metrics manager tying everything together
//! - `middleware`: hyper service wrapper
//! - `config`: Layered configuration
//! - `monitoring`: Prometheus self-metrics

pub mod core;

pub mod anonymize;
pub mod config;
pub mod manager;
pub mod middleware;
pub mod monitoring;
pub mod sampling;
pub mod stats;
pub mod transport;
pub mod utils;

// Test doubles shared by unit and integration tests
pub mod testing;

pub use crate::core::ConfigError;

pub use anonymize::{hash, salted_hash, Anonymizer, QueryParams};
pub use crate::config::{Config, LoggingConfig, TelemetryConfig, TransportConfig};
pub use manager::{BuildInfo, MetricsManager, RequestRecord};
pub use middleware::MetricsService;
pub use monitoring::{encode_metrics, TelemetryMetrics};
pub use sampling::{should_sample, Sampler};
pub use stats::{CountingAllocator, MemorySnapshot, MemoryStatistics};
pub use transport::{
    BufferedTransport, Event, EventKind, EventSink, EventTransport, JsonLinesSink, LogSink,
    NoopTransport,
};

pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::anonymize::{Anonymizer, QueryParams};
    pub use crate::config::Config;
    pub use crate::manager::{BuildInfo, MetricsManager, RequestRecord};
    pub use crate::middleware::MetricsService;
    pub use crate::transport::{BufferedTransport, Event, EventKind, EventTransport};

    pub use crate::{Error, Result};
}
