//! Prometheus metrics for the telemetry pipeline itself
//!
//! Tracks what the middleware observes and what it hands off, so operators
//! can see sampling and drop rates without looking at the analytics backend.

use crate::stats::MemorySnapshot;
use anyhow::{Context, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use tracing::info;

/// Registry plus every metric the pipeline updates
pub struct TelemetryMetrics {
    registry: Registry,
    /// Requests seen by the middleware
    pub requests_observed_total: IntCounter,
    /// Requests that produced a page event
    pub requests_sampled_total: IntCounter,
    /// Events handed to the transport, by kind
    pub events_enqueued_total: IntCounterVec,
    /// Events the transport refused
    pub events_dropped_total: IntCounter,
    /// Completed heartbeat ticks
    pub heartbeat_ticks_total: IntCounter,
    /// Downstream handler latency in milliseconds
    pub request_latency_ms: Histogram,
    /// Latest memory counters, by counter name
    pub memory: IntGaugeVec,
}

impl TelemetryMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_observed_total = IntCounter::with_opts(
            Opts::new("requests_observed_total", "Requests seen by the middleware")
                .namespace("beacon"),
        )?;
        registry.register(Box::new(requests_observed_total.clone()))?;

        let requests_sampled_total = IntCounter::with_opts(
            Opts::new(
                "requests_sampled_total",
                "Requests that produced a telemetry event",
            )
            .namespace("beacon"),
        )?;
        registry.register(Box::new(requests_sampled_total.clone()))?;

        let events_enqueued_total = IntCounterVec::new(
            Opts::new("events_enqueued_total", "Events handed to the transport")
                .namespace("beacon"),
            &["kind"],
        )?;
        registry.register(Box::new(events_enqueued_total.clone()))?;

        let events_dropped_total = IntCounter::with_opts(
            Opts::new("events_dropped_total", "Events dropped by a full transport")
                .namespace("beacon"),
        )?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        let heartbeat_ticks_total = IntCounter::with_opts(
            Opts::new("heartbeat_ticks_total", "Completed heartbeat ticks").namespace("beacon"),
        )?;
        registry.register(Box::new(heartbeat_ticks_total.clone()))?;

        let request_latency_ms = Histogram::with_opts(
            HistogramOpts::new(
                "beacon_request_latency_ms",
                "Downstream handler latency in milliseconds",
            )
            .buckets(vec![
                1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0,
            ]),
        )?;
        registry.register(Box::new(request_latency_ms.clone()))?;

        let memory = IntGaugeVec::new(
            Opts::new("memory", "Latest process memory counters").namespace("beacon"),
            &["counter"],
        )?;
        registry.register(Box::new(memory.clone()))?;

        info!("Telemetry metrics registry initialized");

        Ok(Self {
            registry,
            requests_observed_total,
            requests_sampled_total,
            events_enqueued_total,
            events_dropped_total,
            heartbeat_ticks_total,
            request_latency_ms,
            memory,
        })
    }

    /// Get the underlying Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Copy a memory snapshot into the gauges
    pub fn record_memory(&self, snapshot: &MemorySnapshot) {
        for (name, value) in snapshot.counters() {
            self.memory
                .with_label_values(&[name])
                .set(i64::try_from(value).unwrap_or(i64::MAX));
        }
    }
}

/// Encode metrics to Prometheus text format
pub fn encode_metrics(metrics: &TelemetryMetrics) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;

    String::from_utf8(buffer).context("Invalid UTF-8 in metrics")
}
