//! Allocation-counting global allocator
//!
//! Wraps another [`GlobalAlloc`] and keeps process-wide counters in atomics.
//! Install it in the binary:
//!
//! ```no_run
//! use beacon_core::stats::CountingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: CountingAllocator = CountingAllocator::system();
//! ```
//!
//! When it is not installed every counter stays at zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED: AtomicU64 = AtomicU64::new(0);
static PEAK_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static TOTAL_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static DEALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static REALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// Point-in-time copy of the allocator counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationCounters {
    /// Bytes currently allocated
    pub allocated_bytes: u64,
    /// High-water mark of `allocated_bytes`
    pub peak_allocated_bytes: u64,
    /// Bytes ever allocated (never decreases)
    pub total_allocated_bytes: u64,
    pub allocations: u64,
    pub deallocations: u64,
    pub reallocations: u64,
}

impl AllocationCounters {
    /// Allocations not yet freed
    pub fn live_allocations(&self) -> u64 {
        self.allocations.saturating_sub(self.deallocations)
    }
}

/// Read the current counters
///
/// Each counter is read independently with relaxed ordering; the values are
/// statistics, not a consistent ledger.
pub fn allocation_counters() -> AllocationCounters {
    AllocationCounters {
        allocated_bytes: ALLOCATED.load(Ordering::Relaxed),
        peak_allocated_bytes: PEAK_ALLOCATED.load(Ordering::Relaxed),
        total_allocated_bytes: TOTAL_ALLOCATED.load(Ordering::Relaxed),
        allocations: ALLOCATIONS.load(Ordering::Relaxed),
        deallocations: DEALLOCATIONS.load(Ordering::Relaxed),
        reallocations: REALLOCATIONS.load(Ordering::Relaxed),
    }
}

/// Global allocator that counts what passes through it
pub struct CountingAllocator<A = System> {
    inner: A,
}

impl CountingAllocator<System> {
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A> CountingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[inline]
fn record_alloc(size: u64) {
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    TOTAL_ALLOCATED.fetch_add(size, Ordering::Relaxed);
    let now = ALLOCATED.fetch_add(size, Ordering::Relaxed) + size;
    PEAK_ALLOCATED.fetch_max(now, Ordering::Relaxed);
}

#[inline]
fn record_dealloc(size: u64) {
    DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    ALLOCATED.fetch_sub(size, Ordering::Relaxed);
}

// SAFETY: every call is forwarded unchanged to `inner`; the wrapper only
// touches atomics and never allocates itself.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size() as u64);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size() as u64);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.inner.dealloc(ptr, layout);
        record_dealloc(layout.size() as u64);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            REALLOCATIONS.fetch_add(1, Ordering::Relaxed);
            let old_size = layout.size() as u64;
            let new_size = new_size as u64;
            if new_size > old_size {
                let grown = new_size - old_size;
                TOTAL_ALLOCATED.fetch_add(grown, Ordering::Relaxed);
                let now = ALLOCATED.fetch_add(grown, Ordering::Relaxed) + grown;
                PEAK_ALLOCATED.fetch_max(now, Ordering::Relaxed);
            } else {
                ALLOCATED.fetch_sub(old_size - new_size, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Not installed as the test binary's allocator; drive it directly.
    static TEST_ALLOC: CountingAllocator = CountingAllocator::system();

    #[test]
    fn test_alloc_and_dealloc_are_counted() {
        let before = allocation_counters();
        let layout = Layout::from_size_align(128, 8).unwrap();

        unsafe {
            let ptr = TEST_ALLOC.alloc(layout);
            assert!(!ptr.is_null());
            let grown = TEST_ALLOC.realloc(ptr, layout, 256);
            assert!(!grown.is_null());
            TEST_ALLOC.dealloc(grown, Layout::from_size_align(256, 8).unwrap());
        }

        let after = allocation_counters();
        assert!(after.allocations >= before.allocations + 1);
        assert!(after.deallocations >= before.deallocations + 1);
        assert!(after.reallocations >= before.reallocations + 1);
        assert!(after.total_allocated_bytes >= before.total_allocated_bytes + 256);
        assert!(after.peak_allocated_bytes >= 256);
    }

    #[test]
    fn test_live_allocations_saturates() {
        let counters = AllocationCounters {
            allocations: 3,
            deallocations: 5,
            ..Default::default()
        };
        assert_eq!(counters.live_allocations(), 0);
    }
}
