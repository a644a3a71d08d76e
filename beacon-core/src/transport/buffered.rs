//! Non-blocking buffered transport
//!
//! Events go into a bounded channel with `try_send`; a worker thread drains
//! it in batches and hands each batch to an [`EventSink`]. When the buffer is
//! full the event is dropped: losing telemetry is preferable to stalling a
//! request.
//!
//! Dropping the transport closes the channel and waits up to
//! `drain_timeout` for the worker to drain. A worker stuck in its sink past
//! that is detached so process exit is never held hostage.

use super::{Event, EventSink, EventTransport};
use crate::config::TransportConfig;
use crate::core::ConfigError;
use crate::monitoring::TelemetryMetrics;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

pub struct BufferedTransport {
    sender: Option<Sender<Event>>,
    thread_handle: Option<thread::JoinHandle<()>>,
    /// Disconnects when the worker thread exits, panicking or not
    worker_done: Receiver<()>,
    drain_timeout: Duration,
    counters: Arc<Counters>,
    metrics: Option<Arc<TelemetryMetrics>>,
}

impl BufferedTransport {
    /// Start the worker thread feeding `sink`
    pub fn new<S: EventSink>(sink: S, config: &TransportConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (sender, receiver) = bounded(config.buffer_capacity);
        let counters = Arc::new(Counters::default());
        let batch_size = config.batch_size;
        let flush_interval = config.flush_interval();

        let worker_counters = counters.clone();
        let (done_guard, worker_done) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("beacon-transport".to_string())
            .spawn(move || {
                let _done_guard = done_guard;
                Self::worker_loop(sink, receiver, batch_size, flush_interval, worker_counters);
            })
            .map_err(|e| ConfigError::InvalidTransport(format!("cannot spawn worker: {}", e)))?;

        info!(
            "BufferedTransport started (capacity {}, batch {}, flush every {:?})",
            config.buffer_capacity, batch_size, flush_interval
        );

        Ok(Self {
            sender: Some(sender),
            thread_handle: Some(handle),
            worker_done,
            drain_timeout: config.drain_timeout(),
            counters,
            metrics: None,
        })
    }

    /// Mirror drop counts into Prometheus
    pub fn with_metrics(mut self, metrics: Arc<TelemetryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn worker_loop<S: EventSink>(
        mut sink: S,
        receiver: Receiver<Event>,
        batch_size: usize,
        flush_interval: Duration,
        counters: Arc<Counters>,
    ) {
        let mut batch = Vec::with_capacity(batch_size);
        let mut deadline = Instant::now() + flush_interval;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(timeout) {
                Ok(event) => {
                    batch.push(event);
                    if batch.len() >= batch_size {
                        Self::deliver(&mut sink, &mut batch, &counters);
                        deadline = Instant::now() + flush_interval;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !batch.is_empty() {
                        Self::deliver(&mut sink, &mut batch, &counters);
                    }
                    deadline = Instant::now() + flush_interval;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Sender gone: whatever is left was already drained into `batch`
        if !batch.is_empty() {
            Self::deliver(&mut sink, &mut batch, &counters);
        }
        if let Err(e) = sink.flush() {
            warn!("Failed to flush telemetry sink: {:#}", e);
        }
        info!("BufferedTransport worker stopping");
    }

    fn deliver<S: EventSink>(sink: &mut S, batch: &mut Vec<Event>, counters: &Counters) {
        let len = batch.len() as u64;
        match sink.deliver(batch) {
            Ok(()) => {
                counters.delivered.fetch_add(len, Ordering::Relaxed);
            }
            Err(e) => {
                // Best effort: no retry
                counters.failed.fetch_add(len, Ordering::Relaxed);
                warn!("Dropping telemetry batch of {} events: {:#}", len, e);
            }
        }
        batch.clear();
    }

    /// Events accepted into the buffer
    pub fn enqueued(&self) -> u64 {
        self.counters.enqueued.load(Ordering::Relaxed)
    }

    /// Events rejected because the buffer was full or closed
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    /// Events the sink accepted
    pub fn delivered(&self) -> u64 {
        self.counters.delivered.load(Ordering::Relaxed)
    }

    /// Events lost to sink errors
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }
}

impl EventTransport for BufferedTransport {
    fn enqueue(&self, event: Event) {
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.events_dropped_total.inc();
                }
                match e {
                    TrySendError::Full(event) => {
                        debug!("Telemetry buffer full, dropping {} event", event.kind.as_str())
                    }
                    TrySendError::Disconnected(event) => {
                        debug!("Telemetry worker gone, dropping {} event", event.kind.as_str())
                    }
                }
            }
        }
    }
}

impl Drop for BufferedTransport {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        let _ = self.sender.take();

        let Some(handle) = self.thread_handle.take() else {
            return;
        };

        match self.worker_done.recv_timeout(self.drain_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Telemetry worker still busy after {:?}, detaching it",
                    self.drain_timeout
                );
            }
            // Guard dropped: the worker has returned or unwound
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    error!("Telemetry worker panicked; undelivered events were lost");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, StallingSink};

    fn config(capacity: usize, batch: usize, flush_ms: u64) -> TransportConfig {
        TransportConfig {
            buffer_capacity: capacity,
            batch_size: batch,
            flush_interval_ms: flush_ms,
            journal_path: None,
            drain_timeout_ms: 5000,
        }
    }

    struct PanickingSink;

    impl EventSink for PanickingSink {
        fn deliver(&mut self, _batch: &[Event]) -> anyhow::Result<()> {
            panic!("sink exploded");
        }
    }

    #[test]
    fn test_events_reach_sink_on_drop() {
        let sink = RecordingSink::new();
        let events = sink.events();

        {
            let transport = BufferedTransport::new(sink, &config(16, 4, 10_000)).unwrap();
            for i in 0..6 {
                transport.enqueue(Event::track("id", format!("e{}", i)));
            }
            assert_eq!(transport.enqueued(), 6);
        }

        let delivered = events.lock();
        assert_eq!(delivered.len(), 6);
        assert_eq!(delivered[0].name, "e0");
        assert_eq!(delivered[5].name, "e5");
    }

    #[test]
    fn test_partial_batch_flushed_on_interval() {
        let sink = RecordingSink::new();
        let events = sink.events();
        let transport = BufferedTransport::new(sink, &config(16, 100, 20)).unwrap();

        transport.enqueue(Event::identify("id"));
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(events.lock().len(), 1);
        assert_eq!(transport.delivered(), 1);
    }

    #[test]
    fn test_full_buffer_drops_without_blocking() {
        let (sink, release) = StallingSink::new();
        let transport = BufferedTransport::new(sink, &config(2, 1, 10)).unwrap();

        let start = Instant::now();
        for _ in 0..50 {
            transport.enqueue(Event::identify("id"));
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(transport.dropped() > 0);
        assert_eq!(transport.enqueued() + transport.dropped(), 50);

        release.release();
    }

    #[test]
    fn test_drop_detaches_stuck_worker() {
        let (sink, release) = StallingSink::new();
        let mut cfg = config(4, 1, 10);
        cfg.drain_timeout_ms = 50;
        let transport = BufferedTransport::new(sink, &cfg).unwrap();

        transport.enqueue(Event::identify("id"));
        // Let the worker pick the event up and block in the sink
        std::thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        drop(transport);
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "drop waited {:?} on a stuck sink",
            start.elapsed()
        );

        // Lets the detached worker finish
        release.release();
    }

    #[test]
    fn test_drop_survives_worker_panic() {
        let transport = BufferedTransport::new(PanickingSink, &config(4, 1, 10)).unwrap();
        transport.enqueue(Event::identify("id"));
        std::thread::sleep(Duration::from_millis(50));

        // Must return instead of propagating the worker's panic
        drop(transport);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = BufferedTransport::new(RecordingSink::new(), &config(0, 1, 10));
        assert!(matches!(result, Err(ConfigError::InvalidTransport(_))));
    }
}
