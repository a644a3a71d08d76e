//! Process memory statistics for the heartbeat
//!
//! [`MemoryStatistics`] holds the latest [`MemorySnapshot`] behind a mutex.
//! `update()` gathers every counter first and swaps the whole snapshot in one
//! critical section, so a reader never sees half of one capture and half of
//! another.

pub mod allocator;
pub mod process;

pub use allocator::{allocation_counters, AllocationCounters, CountingAllocator};
pub use process::{ProcessCounters, ProcessReader};

use crate::transport::Properties;
use parking_lot::Mutex;
use serde_json::Value;

/// One complete capture of the memory counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Number of completed updates; zero until the first `update()`
    pub sequence: u64,

    pub allocated_bytes: u64,
    pub total_allocated_bytes: u64,
    pub peak_allocated_bytes: u64,
    pub allocations: u64,
    pub deallocations: u64,
    pub reallocations: u64,
    pub live_allocations: u64,
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
    pub max_resident_bytes: u64,
    pub minor_page_faults: u64,
    pub major_page_faults: u64,
}

impl MemorySnapshot {
    fn capture(sequence: u64, alloc: AllocationCounters, process: ProcessCounters) -> Self {
        Self {
            sequence,
            allocated_bytes: alloc.allocated_bytes,
            total_allocated_bytes: alloc.total_allocated_bytes,
            peak_allocated_bytes: alloc.peak_allocated_bytes,
            allocations: alloc.allocations,
            deallocations: alloc.deallocations,
            reallocations: alloc.reallocations,
            live_allocations: alloc.live_allocations(),
            resident_bytes: process.resident_bytes,
            virtual_bytes: process.virtual_bytes,
            max_resident_bytes: process.max_resident_bytes,
            minor_page_faults: process.minor_page_faults,
            major_page_faults: process.major_page_faults,
        }
    }

    /// Counter names and values, in payload order
    pub fn counters(&self) -> [(&'static str, u64); 12] {
        [
            ("allocated_bytes", self.allocated_bytes),
            ("total_allocated_bytes", self.total_allocated_bytes),
            ("peak_allocated_bytes", self.peak_allocated_bytes),
            ("allocations", self.allocations),
            ("deallocations", self.deallocations),
            ("reallocations", self.reallocations),
            ("live_allocations", self.live_allocations),
            ("resident_bytes", self.resident_bytes),
            ("virtual_bytes", self.virtual_bytes),
            ("max_resident_bytes", self.max_resident_bytes),
            ("minor_page_faults", self.minor_page_faults),
            ("major_page_faults", self.major_page_faults),
        ]
    }
}

/// Mutex-guarded memory snapshot, refreshed by the heartbeat loop
pub struct MemoryStatistics {
    snapshot: Mutex<MemorySnapshot>,
    reader: Mutex<ProcessReader>,
}

impl MemoryStatistics {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(MemorySnapshot::default()),
            reader: Mutex::new(ProcessReader::new()),
        }
    }

    /// Capture fresh counters and publish them atomically
    ///
    /// Crate-private: only the manager's heartbeat refreshes the snapshot.
    pub(crate) fn update(&self) {
        // The reader lock also serializes concurrent updates, which keeps
        // `sequence` strictly increasing.
        let mut reader = self.reader.lock();
        let process = reader.read();
        let alloc = allocation_counters();

        let mut snapshot = self.snapshot.lock();
        *snapshot = MemorySnapshot::capture(snapshot.sequence + 1, alloc, process);
    }

    /// Copy of the latest complete snapshot
    pub fn snapshot(&self) -> MemorySnapshot {
        *self.snapshot.lock()
    }

    /// Event properties for the latest snapshot, tagged non-interaction
    pub fn to_payload(&self) -> Properties {
        let snapshot = self.snapshot();

        let mut payload = Properties::new();
        for (name, value) in snapshot.counters() {
            payload.insert(name.to_string(), Value::from(value));
        }
        payload.insert("non_interaction".to_string(), Value::from(1));
        payload
    }
}

impl Default for MemoryStatistics {
    fn default() -> Self {
        Self::new()
    }
}
