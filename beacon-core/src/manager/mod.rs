//! Telemetry lifecycle: identity, registration, heartbeat, request tracking
//!
//! ## Usage
//!
//! ```no_run
//! use beacon_core::config::TelemetryConfig;
//! use beacon_core::manager::{BuildInfo, MetricsManager};
//! use beacon_core::transport::NoopTransport;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let manager = Arc::new(MetricsManager::new(
//!     &TelemetryConfig::default(),
//!     Arc::new(NoopTransport),
//! )?);
//!
//! manager.spawn_registration(BuildInfo::new("1.0.0", "c1b", "2024-01-01T00:00:00Z"));
//! manager.spawn_heartbeat();
//! # Ok(())
//! # }
//! ```
//!
//! ## Disabled mode
//!
//! When `is_production` is false or `write_key` is empty the manager still
//! works end to end, but every event goes to a [`NoopTransport`].

pub mod types;

pub use types::{BuildInfo, RequestRecord};

use crate::anonymize::{self, Anonymizer, QueryParams};
use crate::config::TelemetryConfig;
use crate::core::ConfigError;
use crate::monitoring::TelemetryMetrics;
use crate::sampling::Sampler;
use crate::stats::{MemorySnapshot, MemoryStatistics};
use crate::transport::{Event, EventTransport, NoopTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Event name for heartbeat memory statistics
pub const MEMSTATS_EVENT: &str = "memstats";

pub struct MetricsManager {
    identity: String,
    enabled: bool,
    anonymizer: Anonymizer,
    sampler: Sampler,
    heartbeat_interval: Duration,
    statistics: MemoryStatistics,
    transport: Arc<dyn EventTransport>,
    metrics: Option<Arc<TelemetryMetrics>>,
    shutdown: watch::Sender<bool>,
}

impl MetricsManager {
    /// Validate `config` and build a manager around `transport`
    pub fn new(
        config: &TelemetryConfig,
        transport: Arc<dyn EventTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let enabled = config.is_production && !config.write_key.is_empty();
        let transport: Arc<dyn EventTransport> = if enabled {
            transport
        } else {
            info!(
                "Telemetry disabled (production: {}, write key set: {}), events will be discarded",
                config.is_production,
                !config.write_key.is_empty()
            );
            Arc::new(NoopTransport)
        };

        // Empty salts were rejected by validate()
        let salt = match &config.salt {
            Some(salt) => salt.clone(),
            None => {
                warn!(
                    "No salt configured, using a random per-process salt; \
                     hashes will not be stable across restarts"
                );
                uuid::Uuid::new_v4().to_string()
            }
        };

        let identity = anonymize::hash(&config.service_id);
        let (shutdown, _) = watch::channel(false);

        info!(
            "MetricsManager initialized (identity {}, sampling {:.2}, heartbeat every {:?}, {} whitelisted paths)",
            identity,
            config.sampling_rate,
            config.heartbeat_interval(),
            config.whitelisted_paths.len()
        );

        Ok(Self {
            identity,
            enabled,
            anonymizer: Anonymizer::new(config.whitelisted_paths.clone(), salt),
            sampler: Sampler::new(config.sampling_rate),
            heartbeat_interval: config.heartbeat_interval(),
            statistics: MemoryStatistics::new(),
            transport,
            metrics: None,
            shutdown,
        })
    }

    /// Replace the entropy-seeded sampler (seeded sampling in tests)
    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Count requests and events in Prometheus
    pub fn with_metrics(mut self, metrics: Arc<TelemetryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Hashed install identity sent as the event user id
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether events reach the configured transport
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn anonymizer(&self) -> &Anonymizer {
        &self.anonymizer
    }

    /// Latest memory snapshot committed by the heartbeat
    pub fn memory_snapshot(&self) -> MemorySnapshot {
        self.statistics.snapshot()
    }

    pub fn metrics(&self) -> Option<&Arc<TelemetryMetrics>> {
        self.metrics.as_ref()
    }

    fn send(&self, event: Event) {
        if let Some(metrics) = &self.metrics {
            metrics
                .events_enqueued_total
                .with_label_values(&[event.kind.as_str()])
                .inc();
        }
        self.transport.enqueue(event);
    }

    // ===== REGISTRATION =====

    /// Emit the one-time identify event
    pub fn register(&self, build: &BuildInfo) {
        let num_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(0);

        let event = Event::identify(self.identity.clone())
            .with_property("version", build.version.clone())
            .with_property("build_hash", build.build_hash.clone())
            .with_property("build_time", build.build_time.clone())
            .with_property("registered_at", chrono::Utc::now().to_rfc3339())
            .with_property("os", std::env::consts::OS)
            .with_property("arch", std::env::consts::ARCH)
            .with_property("num_cpus", num_cpus)
            .with_property("crate_version", env!("CARGO_PKG_VERSION"));

        info!(
            "Registering install {} (version {}, build {})",
            self.identity, build.version, build.build_hash
        );
        self.send(event);
    }

    /// Run [`register`](Self::register) on a background task
    pub fn spawn_registration(self: &Arc<Self>, build: BuildInfo) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager.register(&build);
        })
    }

    // ===== HEARTBEAT =====

    /// Refresh memory statistics and emit them as a non-interaction event
    pub fn commit_memory_statistics(&self) {
        self.statistics.update();

        if let Some(metrics) = &self.metrics {
            metrics.record_memory(&self.statistics.snapshot());
            metrics.heartbeat_ticks_total.inc();
        }

        let event = Event::track(self.identity.clone(), MEMSTATS_EVENT)
            .with_properties(self.statistics.to_payload())
            .non_interaction();

        debug!("Heartbeat: memory statistics captured");
        self.send(event);
    }

    /// Run [`commit_memory_statistics`](Self::commit_memory_statistics) every
    /// heartbeat interval until [`shutdown`](Self::shutdown)
    ///
    /// The first tick fires immediately.
    pub fn spawn_heartbeat(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            if *shutdown.borrow() {
                return;
            }

            let mut ticker = tokio::time::interval(manager.heartbeat_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => manager.commit_memory_statistics(),
                    _ = shutdown.changed() => break,
                }
            }

            info!("Heartbeat loop stopped");
        })
    }

    // ===== REQUESTS =====

    /// Record a finished request, emitting a page event if it is sampled
    pub fn track_request(&self, record: &RequestRecord) {
        if let Some(metrics) = &self.metrics {
            metrics.requests_observed_total.inc();
            metrics
                .request_latency_ms
                .observe(record.latency.as_secs_f64() * 1000.0);
        }

        if !self.enabled || !self.sampler.sample() {
            return;
        }

        if let Some(metrics) = &self.metrics {
            metrics.requests_sampled_total.inc();
        }

        let event = self.page_event(record);
        self.send(event);
    }

    /// Anonymized page event for `record`
    pub fn page_event(&self, record: &RequestRecord) -> Event {
        let path = self.anonymizer.anonymize_path(record.uri.path());
        let query = record
            .uri
            .query()
            .map(|raw| self.anonymizer.anonymize_query(&QueryParams::parse(raw)))
            .unwrap_or_default();

        let scheme = record.uri.scheme_str().unwrap_or("http");
        let url = if query.is_empty() {
            format!("{}://{}{}", scheme, self.identity, path)
        } else {
            format!("{}://{}{}?{}", scheme, self.identity, path, query)
        };

        let mut event = Event::page(self.identity.clone(), path.clone())
            .with_property("url", url)
            .with_property("path", path)
            .with_property("query", query)
            .with_property("method", record.method.as_str())
            .with_property("status", record.status.as_u16())
            .with_property("latency_ms", record.latency.as_millis() as u64);

        if let Some(size) = record.response_size {
            event = event.with_property("size", size);
        }

        event
    }

    // ===== SHUTDOWN =====

    /// Stop the heartbeat loop at its next suspension point
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        info!("MetricsManager shutdown requested");
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}
