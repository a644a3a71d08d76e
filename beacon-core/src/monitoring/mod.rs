//! Self-monitoring for the telemetry pipeline
//!
//! Prometheus counters for observed, sampled, enqueued and dropped events,
//! plus the latest memory snapshot as gauges.

pub mod metrics;

pub use metrics::{encode_metrics, TelemetryMetrics};
