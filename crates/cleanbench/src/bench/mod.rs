//! Benchmark harness.
//!
//! This module provides:
//! - [`BenchmarkHarness`]: run a cleaner at several scale factors
//! - [`TrackingAllocator`] and [`MemoryProbe`]: peak heap measurement
//! - [`ScalingReport`]: near-linear scaling check
//! - [`BenchmarkLedger`]: caller-owned accumulator of samples

mod harness;
mod ledger;
mod memory;
mod scaling;

pub use harness::{BenchmarkHarness, BenchmarkRun, BenchmarkSample, replicate};
pub use ledger::{BenchmarkLedger, BenchmarkReport, FailedFactor};
pub use memory::{AllocationProbe, MemoryProbe, NoopProbe, TrackingAllocator, as_mib, current_bytes};
pub use scaling::{ScalingEntry, ScalingReport};
