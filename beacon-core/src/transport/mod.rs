//! Hand-off to the analytics transport
//!
//! The core never talks to the network. It builds [`Event`]s and passes them
//! to an [`EventTransport`], which must accept them without blocking. Batching,
//! delivery and any retry policy belong to the transport and its sink.

pub mod buffered;
pub mod event;
pub mod sink;

pub use buffered::BufferedTransport;
pub use event::{Event, EventKind, Properties};
pub use sink::{EventSink, JsonLinesSink, LogSink};

/// Accepts events for best-effort delivery
///
/// `enqueue` is called on the request path and must return promptly. An
/// implementation that cannot take an event drops it.
pub trait EventTransport: Send + Sync {
    fn enqueue(&self, event: Event);
}

/// Discards every event (telemetry disabled)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransport;

impl EventTransport for NoopTransport {
    fn enqueue(&self, event: Event) {
        tracing::trace!("Telemetry disabled, discarding {} event", event.kind.as_str());
    }
}
