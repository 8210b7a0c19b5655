//! Peak heap measurement.
//!
//! [`TrackingAllocator`] wraps the system allocator and keeps two counters:
//! bytes currently live and the high-water mark since the last reset. It only
//! observes allocations once installed as the process's global allocator:
//!
//! ```rust,ignore
//! use cleanbench::bench::TrackingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//! ```
//!
//! Without it the counters stay at zero and [`AllocationProbe`] reports zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

/// Global allocator that counts live and peak heap bytes.
pub struct TrackingAllocator;

// SAFETY: every call is forwarded unchanged to `System`; the counters are
// plain atomics and never allocate.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

fn record_alloc(bytes: usize) {
    let current = CURRENT.fetch_add(bytes, Ordering::Relaxed) + bytes;
    PEAK.fetch_max(current, Ordering::Relaxed);
}

fn record_dealloc(bytes: usize) {
    // saturating: frees of blocks allocated before a reset must not wrap
    let _ = CURRENT.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(bytes))
    });
}

/// Bytes currently live on the tracked heap.
pub fn current_bytes() -> usize {
    CURRENT.load(Ordering::Relaxed)
}

/// Source of peak-memory readings for the benchmark harness.
pub trait MemoryProbe {
    /// Start a new measurement window.
    fn reset(&mut self);

    /// Peak bytes allocated above the live heap at the last [`reset`](Self::reset).
    fn peak_bytes(&self) -> u64;
}

/// [`MemoryProbe`] backed by [`TrackingAllocator`]'s counters.
///
/// Counters are process-wide, so concurrent work on other threads is
/// included in the reading.
#[derive(Debug, Default)]
pub struct AllocationProbe {
    baseline: usize,
}

impl AllocationProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryProbe for AllocationProbe {
    fn reset(&mut self) {
        self.baseline = CURRENT.load(Ordering::Relaxed);
        PEAK.store(self.baseline, Ordering::Relaxed);
    }

    fn peak_bytes(&self) -> u64 {
        PEAK.load(Ordering::Relaxed).saturating_sub(self.baseline) as u64
    }
}

/// Probe that always reports zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl MemoryProbe for NoopProbe {
    fn reset(&mut self) {}

    fn peak_bytes(&self) -> u64 {
        0
    }
}

/// Bytes as mebibytes, for display.
pub fn as_mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_peak_per_window() {
        // Unit tests run without the tracking allocator installed, so only
        // this test moves the counters.
        let mut probe = AllocationProbe::new();
        probe.reset();
        record_alloc(4096);
        record_alloc(1024);
        record_dealloc(4096);
        assert_eq!(probe.peak_bytes(), 5120);
        record_dealloc(1024);

        probe.reset();
        assert_eq!(probe.peak_bytes(), 0);
        record_alloc(512);
        assert_eq!(probe.peak_bytes(), 512);
        record_dealloc(512);
    }

    #[test]
    fn test_noop_probe() {
        let mut probe = NoopProbe;
        probe.reset();
        assert_eq!(probe.peak_bytes(), 0);
    }

    #[test]
    fn test_as_mib() {
        assert_eq!(as_mib(1024 * 1024), 1.0);
    }
}
