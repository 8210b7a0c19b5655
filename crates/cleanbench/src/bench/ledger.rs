//! Accumulated benchmark results.

use super::harness::BenchmarkSample;
use super::scaling::ScalingReport;
use crate::error::BenchmarkError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failed scale factor, kept in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedFactor {
    pub scale_factor: usize,
    pub code: String,
    pub message: String,
}

impl From<&BenchmarkError> for FailedFactor {
    fn from(error: &BenchmarkError) -> Self {
        Self {
            scale_factor: error.scale_factor(),
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Samples collected across one or more benchmark runs.
///
/// The ledger is an ordinary value owned by the caller; pass it to whatever
/// needs to record into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkLedger {
    samples: Vec<BenchmarkSample>,
    failures: Vec<FailedFactor>,
}

impl BenchmarkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: BenchmarkSample) {
        self.samples.push(sample);
    }

    pub fn record_failure(&mut self, error: &BenchmarkError) {
        self.failures.push(FailedFactor::from(error));
    }

    /// Record every outcome of a run, in order.
    pub fn record_all<I>(&mut self, outcomes: I)
    where
        I: IntoIterator<Item = Result<BenchmarkSample, BenchmarkError>>,
    {
        for outcome in outcomes {
            match outcome {
                Ok(sample) => self.record(sample),
                Err(error) => self.record_failure(&error),
            }
        }
    }

    pub fn samples(&self) -> &[BenchmarkSample] {
        &self.samples
    }

    pub fn failures(&self) -> &[FailedFactor] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.failures.is_empty()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.failures.clear();
    }

    /// Snapshot the ledger into a report, evaluating scaling over the
    /// recorded samples.
    pub fn report(&self, cleaner: impl Into<String>, tolerance: f64) -> BenchmarkReport {
        BenchmarkReport {
            cleaner: cleaner.into(),
            generated_at: Utc::now(),
            samples: self.samples.clone(),
            failures: self.failures.clone(),
            scaling: ScalingReport::evaluate(&self.samples, tolerance),
        }
    }
}

/// Serializable outcome of a benchmark session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub cleaner: String,
    pub generated_at: DateTime<Utc>,
    pub samples: Vec<BenchmarkSample>,
    pub failures: Vec<FailedFactor>,
    pub scaling: ScalingReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(scale_factor: usize) -> BenchmarkSample {
        BenchmarkSample {
            scale_factor,
            row_count: 10 * scale_factor,
            rows_out: 10 * scale_factor,
            elapsed_seconds: 0.001 * scale_factor as f64,
            peak_memory_bytes: 1024,
            throughput_rows_per_sec: 10_000.0,
        }
    }

    #[test]
    fn test_record_and_reset() {
        let mut ledger = BenchmarkLedger::new();
        ledger.record(sample(1));
        ledger.record(sample(10));
        assert_eq!(ledger.samples().len(), 2);

        ledger.reset();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_all_splits_failures() {
        let mut ledger = BenchmarkLedger::new();
        ledger.record_all(vec![
            Ok(sample(1)),
            Err(BenchmarkError::Replication {
                scale_factor: 0,
                reason: "scale factor must be at least 1".to_string(),
            }),
            Ok(sample(2)),
        ]);

        assert_eq!(ledger.samples().len(), 2);
        assert_eq!(ledger.failures().len(), 1);
        assert_eq!(ledger.failures()[0].code, "BENCHMARK_IO_ERROR");
    }

    #[test]
    fn test_ledger_accumulates_across_runs() {
        let mut ledger = BenchmarkLedger::new();
        ledger.record_all(vec![Ok(sample(1))]);
        ledger.record_all(vec![Ok(sample(5))]);
        let factors: Vec<usize> = ledger.samples().iter().map(|s| s.scale_factor).collect();
        assert_eq!(factors, vec![1, 5]);
    }

    #[test]
    fn test_report_serializes() {
        let mut ledger = BenchmarkLedger::new();
        ledger.record(sample(1));
        ledger.record(sample(10));

        let report = ledger.report("ecommerce", 0.2);
        assert_eq!(report.scaling.entries.len(), 2);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"cleaner\":\"ecommerce\""));
        assert!(json.contains("generated_at"));
    }
}
