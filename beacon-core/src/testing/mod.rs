//! Test doubles for the transport seam
//!
//! - `RecordingTransport`: keeps every enqueued event in memory
//! - `RecordingSink`: keeps every delivered batch in memory
//! - `StallingSink`: blocks delivery until released, to model a dead backend

use crate::transport::{Event, EventKind, EventSink, EventTransport};
use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared list of captured events
pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Transport that records instead of sending
#[derive(Clone, Default)]
pub struct RecordingTransport {
    events: EventLog,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventTransport for RecordingTransport {
    fn enqueue(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Sink that records delivered events
#[derive(Default)]
pub struct RecordingSink {
    events: EventLog,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the captured events, usable after the sink moves into a worker
    pub fn events(&self) -> EventLog {
        self.events.clone()
    }
}

impl EventSink for RecordingSink {
    fn deliver(&mut self, batch: &[Event]) -> anyhow::Result<()> {
        self.events.lock().extend_from_slice(batch);
        Ok(())
    }
}

/// Sink whose `deliver` blocks until its [`StallRelease`] is released or dropped
pub struct StallingSink {
    gate: Receiver<()>,
}

/// Unblocks a [`StallingSink`] for good
pub struct StallRelease {
    _sender: Sender<()>,
}

impl StallRelease {
    pub fn release(self) {}
}

impl StallingSink {
    pub fn new() -> (Self, StallRelease) {
        let (sender, gate) = bounded(0);
        (Self { gate }, StallRelease { _sender: sender })
    }
}

impl EventSink for StallingSink {
    fn deliver(&mut self, _batch: &[Event]) -> anyhow::Result<()> {
        // Returns Err once the release handle is gone
        let _ = self.gate.recv();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_stalling_sink_blocks_until_released() {
        let (mut sink, release) = StallingSink::new();

        let handle = std::thread::spawn(move || {
            let start = Instant::now();
            sink.deliver(&[]).unwrap();
            start.elapsed()
        });

        std::thread::sleep(Duration::from_millis(50));
        release.release();

        let waited = handle.join().unwrap();
        assert!(waited >= Duration::from_millis(40));
    }

    #[test]
    fn test_recording_transport_counts_by_kind() {
        let transport = RecordingTransport::new();
        transport.enqueue(Event::identify("a"));
        transport.enqueue(Event::page("a", "/"));
        transport.enqueue(Event::page("a", "/x"));

        assert_eq!(transport.count(), 3);
        assert_eq!(transport.count_kind(EventKind::Page), 2);
    }
}
