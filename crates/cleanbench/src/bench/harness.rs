//! Scale-factor benchmark runs.

use super::memory::{AllocationProbe, MemoryProbe};
use crate::config::{BenchmarkConfig, ConfigValidationError};
use crate::error::BenchmarkError;
use crate::pipeline::Cleaner;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Measurements for one scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub scale_factor: usize,
    /// Rows handed to the cleaner.
    pub row_count: usize,
    /// Rows the cleaner kept.
    pub rows_out: usize,
    pub elapsed_seconds: f64,
    pub peak_memory_bytes: u64,
    pub throughput_rows_per_sec: f64,
}

impl BenchmarkSample {
    fn new(scale_factor: usize, row_count: usize, rows_out: usize, elapsed_seconds: f64, peak: u64) -> Self {
        let throughput = if elapsed_seconds > 0.0 {
            row_count as f64 / elapsed_seconds
        } else {
            0.0
        };
        Self {
            scale_factor,
            row_count,
            rows_out,
            elapsed_seconds,
            peak_memory_bytes: peak,
            throughput_rows_per_sec: throughput,
        }
    }
}

impl std::fmt::Display for BenchmarkSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x{:<4} rows={:<10} kept={:<10} time={:.4}s peak={:.2} MiB throughput={:.0} rows/s",
            self.scale_factor,
            self.row_count,
            self.rows_out,
            self.elapsed_seconds,
            super::memory::as_mib(self.peak_memory_bytes),
            self.throughput_rows_per_sec
        )
    }
}

/// Build a table holding `base`'s rows repeated `factor` times, in order.
///
/// Uses one gather over a precomputed index, so the result owns fresh
/// buffers and shares nothing mutable with `base`.
pub fn replicate(base: &DataFrame, factor: usize) -> Result<DataFrame, BenchmarkError> {
    let fail = |reason: String| BenchmarkError::Replication {
        scale_factor: factor,
        reason,
    };

    if factor == 0 {
        return Err(fail("scale factor must be at least 1".to_string()));
    }
    let height = base.height();
    if height == 0 {
        return Err(fail("base table has no rows".to_string()));
    }
    let rows = height
        .checked_mul(factor)
        .filter(|&rows| IdxSize::try_from(rows).is_ok())
        .ok_or_else(|| fail(format!("{height} x {factor} rows exceeds the index range")))?;

    let indices: Vec<IdxSize> = (0..rows).map(|i| (i % height) as IdxSize).collect();
    let idx = IdxCa::from_vec("replicate".into(), indices);
    base.take(&idx).map_err(|e| fail(e.to_string()))
}

/// Runs a cleaner over a base table at several scale factors.
///
/// ```rust,ignore
/// let harness = BenchmarkHarness::new(BenchmarkConfig::default())?;
/// for outcome in harness.run(&cleaner, &base) {
///     match outcome {
///         Ok(sample) => println!("{sample}"),
///         Err(e) => eprintln!("{e}"),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BenchmarkHarness<P = AllocationProbe> {
    config: BenchmarkConfig,
    probe: PhantomData<fn() -> P>,
}

impl BenchmarkHarness<AllocationProbe> {
    pub fn new(config: BenchmarkConfig) -> Result<Self, ConfigValidationError> {
        Self::with_probe(config)
    }
}

impl<P: MemoryProbe + Default> BenchmarkHarness<P> {
    /// Harness measuring memory through probe type `P`.
    pub fn with_probe(config: BenchmarkConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            probe: PhantomData,
        })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Benchmark over the configured scale factors.
    pub fn run<'a>(&self, cleaner: &'a Cleaner, base: &'a DataFrame) -> BenchmarkRun<'a, P> {
        self.run_with_factors(cleaner, base, &self.config.scale_factors)
    }

    /// Benchmark over `factors` instead of the configured ones.
    ///
    /// Nothing executes until the returned iterator is polled.
    pub fn run_with_factors<'a>(
        &self,
        cleaner: &'a Cleaner,
        base: &'a DataFrame,
        factors: &[usize],
    ) -> BenchmarkRun<'a, P> {
        BenchmarkRun {
            cleaner,
            base,
            factors: factors.to_vec(),
            position: 0,
            warmup_pending: self.config.warmup,
            probe: P::default(),
        }
    }
}

/// Lazy sequence of per-factor outcomes, in factor order.
///
/// A failed factor yields its error and the run moves on to the next one.
pub struct BenchmarkRun<'a, P = AllocationProbe> {
    cleaner: &'a Cleaner,
    base: &'a DataFrame,
    factors: Vec<usize>,
    position: usize,
    warmup_pending: bool,
    probe: P,
}

impl<P: MemoryProbe> BenchmarkRun<'_, P> {
    /// Rewind to the first factor.
    pub fn restart(&mut self) {
        self.position = 0;
    }

    pub fn factors(&self) -> &[usize] {
        &self.factors
    }

    fn warm_up(&mut self) {
        self.warmup_pending = false;
        debug!("Warm-up pass on {} rows", self.base.height());
        if let Err(e) = self.cleaner.clean(self.base.clone()) {
            warn!("Warm-up pass failed: {}", e);
        }
    }

    fn measure(&mut self, factor: usize) -> Result<BenchmarkSample, BenchmarkError> {
        let table = replicate(self.base, factor)?;
        let row_count = table.height();

        self.probe.reset();
        let start = Instant::now();
        let result = self.cleaner.clean(table);
        let elapsed = start.elapsed().as_secs_f64();
        let peak = self.probe.peak_bytes();

        let result = result.map_err(|source| BenchmarkError::Cleaning {
            scale_factor: factor,
            source,
        })?;

        let sample = BenchmarkSample::new(factor, row_count, result.rows_after(), elapsed, peak);
        info!("{}", sample);
        Ok(sample)
    }
}

impl<P: MemoryProbe> Iterator for BenchmarkRun<'_, P> {
    type Item = Result<BenchmarkSample, BenchmarkError>;

    fn next(&mut self) -> Option<Self::Item> {
        let factor = *self.factors.get(self.position)?;
        self.position += 1;

        if self.warmup_pending {
            self.warm_up();
        }

        let outcome = self.measure(factor);
        if let Err(e) = &outcome {
            warn!("Scale factor x{} failed: {}", factor, e);
        }
        Some(outcome)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.factors.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl<P: MemoryProbe> ExactSizeIterator for BenchmarkRun<'_, P> {}
