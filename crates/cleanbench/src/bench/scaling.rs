//! Linear-scaling check over benchmark samples.
//!
//! Each sample is compared with the first one. With `row_ratio` the growth in
//! rows and `time_ratio` the growth in elapsed time, the sample scales
//! linearly when `time_ratio / row_ratio <= 1 + tolerance`. With the default
//! tolerance of 0.2, ten times the rows may take up to twelve times as long.
//! Deviations are flagged and logged, never turned into errors.

use super::harness::BenchmarkSample;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Comparison of one sample against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingEntry {
    pub scale_factor: usize,
    pub row_ratio: f64,
    pub time_ratio: f64,
    /// `time_ratio / row_ratio`; `None` when the baseline took no measurable
    /// time or had no rows.
    pub normalized_ratio: Option<f64>,
    pub flagged: bool,
}

/// Scaling verdict for a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingReport {
    pub tolerance: f64,
    pub baseline_factor: Option<usize>,
    pub entries: Vec<ScalingEntry>,
}

impl ScalingReport {
    /// Compare every sample with the first.
    pub fn evaluate(samples: &[BenchmarkSample], tolerance: f64) -> Self {
        let Some(baseline) = samples.first() else {
            return Self {
                tolerance,
                baseline_factor: None,
                entries: Vec::new(),
            };
        };

        let limit = 1.0 + tolerance;
        let entries = samples
            .iter()
            .map(|sample| {
                let row_ratio = ratio(sample.row_count as f64, baseline.row_count as f64);
                let time_ratio = ratio(sample.elapsed_seconds, baseline.elapsed_seconds);
                let normalized_ratio = match (row_ratio, time_ratio) {
                    (Some(rows), Some(time)) if rows > 0.0 => Some(time / rows),
                    _ => None,
                };
                let flagged = normalized_ratio.is_some_and(|r| r > limit);
                if flagged {
                    warn!(
                        "Scale x{} deviates from linear: {:.2}x rows took {:.2}x time (limit {:.2})",
                        sample.scale_factor,
                        row_ratio.unwrap_or_default(),
                        time_ratio.unwrap_or_default(),
                        limit
                    );
                }
                ScalingEntry {
                    scale_factor: sample.scale_factor,
                    row_ratio: row_ratio.unwrap_or_default(),
                    time_ratio: time_ratio.unwrap_or_default(),
                    normalized_ratio,
                    flagged,
                }
            })
            .collect();

        Self {
            tolerance,
            baseline_factor: Some(baseline.scale_factor),
            entries,
        }
    }

    /// Entries that exceeded the tolerance.
    pub fn flagged(&self) -> impl Iterator<Item = &ScalingEntry> {
        self.entries.iter().filter(|e| e.flagged)
    }

    pub fn is_linear(&self) -> bool {
        self.flagged().next().is_none()
    }
}

fn ratio(value: f64, baseline: f64) -> Option<f64> {
    (baseline > 0.0).then(|| value / baseline)
}

impl std::fmt::Display for ScalingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scaling (tolerance {:.0}%):", self.tolerance * 100.0)?;
        for entry in &self.entries {
            let verdict = match (entry.normalized_ratio, entry.flagged) {
                (None, _) => "n/a",
                (Some(_), true) => "NON-LINEAR",
                (Some(_), false) => "ok",
            };
            writeln!(
                f,
                "  x{:<4} rows {:>6.2}x  time {:>6.2}x  {}",
                entry.scale_factor, entry.row_ratio, entry.time_ratio, verdict
            )?;
        }
        Ok(())
    }
}
