//! The cleaning orchestrator and its builder.

use crate::config::{CleanerConfig, ConfigValidationError};
use crate::error::{CleaningError, Result};
use crate::pipeline::progress::{
    CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::stages::RawTable;
use crate::types::CleaningResult;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs normalization, coercion, and missing-value resolution over a table.
///
/// A `Cleaner` is pure configuration plus an optional progress reporter; it
/// holds no per-run state, so one instance can clean any number of tables.
///
/// # Example
///
/// ```rust,ignore
/// use cleanbench::{datasets, Cleaner};
///
/// let cleaner = Cleaner::new(datasets::telco_churn())?;
/// let result = cleaner.clean(df)?;
/// println!("{} rows kept", result.rows_after());
/// ```
pub struct Cleaner {
    config: CleanerConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Cleaner: Send, Sync);

impl Cleaner {
    /// Create a new cleaner builder.
    pub fn builder() -> CleanerBuilder {
        CleanerBuilder::default()
    }

    /// Cleaner for `config` without progress reporting.
    pub fn new(config: CleanerConfig) -> std::result::Result<Self, ConfigValidationError> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Clean a raw table.
    ///
    /// The input is consumed; the returned table holds exactly the configured
    /// columns, typed, with no missing values, and surviving rows in their
    /// input order.
    ///
    /// # Errors
    ///
    /// - [`CleaningError::Schema`] when a configured column has no raw match
    /// - [`CleaningError::EmptyResult`] when the input had rows and none survive
    pub fn clean(&self, df: DataFrame) -> Result<CleaningResult> {
        match self.clean_internal(df) {
            Ok(result) => Ok(result),
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Cleaner '{}' failed: {}", self.config.name, e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn clean_internal(&self, df: DataFrame) -> Result<CleaningResult> {
        let start_time = Instant::now();
        let specs = &self.config.columns;
        let rows_before = df.height();

        info!(
            "Cleaning {} rows x {} columns with '{}'",
            rows_before,
            df.width(),
            self.config.name
        );
        let raw = RawTable::new(df);
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Raw,
            rows_before,
            "Accepted raw table",
        ));

        // Step 1: Normalize column labels
        let normalized = raw.normalize(&self.config.aliases, specs)?;
        info!("Step 1: Normalized {} columns", normalized.frame().width());
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Normalized,
            rows_before,
            format!("Normalized {} columns", normalized.frame().width()),
        ));

        // Step 2: Coerce types
        let (typed, coercion) = normalized.coerce(specs)?;
        info!(
            "Step 2: Coerced {} values ({} unparseable)",
            coercion.total_coerced(),
            coercion.total_warnings()
        );
        debug!("Missing after coercion: {}", coercion.total_missing());
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Typed,
            rows_before,
            format!("Coerced {} values", coercion.total_coerced()),
        ));

        // Step 3: Resolve missing values
        let (cleaned, resolution) = typed.resolve(specs)?;
        let rows_after = cleaned.height();
        info!(
            "Step 3: Dropped {} rows, filled {} values",
            resolution.rows_dropped(),
            resolution.values_filled()
        );

        if rows_before > 0 && rows_after == 0 {
            return Err(CleaningError::EmptyResult {
                rows_before,
                dropped_by_column: resolution.dropped_by_column,
            });
        }

        self.report_progress(ProgressUpdate::new(
            CleaningStage::Cleaned,
            rows_after,
            format!("Kept {} of {} rows", rows_after, rows_before),
        ));

        let (table, row_ids) = cleaned.into_parts();
        let duration = start_time.elapsed();
        info!(
            "Cleaning complete: {} -> {} rows in {:.2?}",
            rows_before, rows_after, duration
        );

        Ok(CleaningResult {
            table,
            row_ids,
            rows_before,
            rows_dropped: rows_before - rows_after,
            coercion,
            resolution,
            duration,
        })
    }
}

/// Builder for creating a [`Cleaner`] instance.
///
/// Use [`Cleaner::builder()`] to get started.
#[derive(Default)]
pub struct CleanerBuilder {
    config: Option<CleanerConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(CleanerBuilder: Send);

impl CleanerBuilder {
    /// Set the cleaner configuration.
    pub fn config(mut self, config: CleanerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving stage transitions.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the cleaner.
    ///
    /// Returns an error if no configuration was given or it is invalid.
    pub fn build(self) -> std::result::Result<Cleaner, ConfigValidationError> {
        let config = self.config.ok_or(ConfigValidationError::EmptySpecs)?;
        config.validate()?;

        Ok(Cleaner {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnSpec, ValidRange};
    use std::sync::Mutex;

    fn config() -> CleanerConfig {
        CleanerConfig::builder("orders")
            .column(ColumnSpec::numeric("price").within(ValidRange::greater_than(0.0)))
            .column(ColumnSpec::binary("is_returned"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_cleaner_builder_requires_config() {
        let err = Cleaner::builder().build().err().unwrap();
        assert_eq!(err, ConfigValidationError::EmptySpecs);
    }

    #[test]
    fn test_cleaner_reports_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let cleaner = Cleaner::builder()
            .config(config())
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .unwrap();

        let df = df!["price" => ["1.5", "2"], "is_returned" => ["no", "yes"]].unwrap();
        cleaner.clean(df).unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                CleaningStage::Raw,
                CleaningStage::Normalized,
                CleaningStage::Typed,
                CleaningStage::Cleaned,
            ]
        );
    }

    #[test]
    fn test_cleaner_reports_failure() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let cleaner = Cleaner::builder()
            .config(config())
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .unwrap();

        let err = cleaner.clean(df!["price" => ["1"]].unwrap()).unwrap_err();
        assert!(err.is_schema_error());
        assert_eq!(stages.lock().unwrap().last(), Some(&CleaningStage::Failed));
    }

    #[test]
    fn test_empty_result_when_every_row_dropped() {
        let cleaner = Cleaner::new(config()).unwrap();
        let df = df!["price" => ["-1", "abc"], "is_returned" => ["no", "yes"]].unwrap();

        match cleaner.clean(df).unwrap_err() {
            CleaningError::EmptyResult {
                rows_before,
                dropped_by_column,
            } => {
                assert_eq!(rows_before, 2);
                assert_eq!(dropped_by_column[0], ("price".to_string(), 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_row_input_is_not_an_error() {
        let cleaner = Cleaner::new(config()).unwrap();
        let df = df!["price" => Vec::<String>::new(), "is_returned" => Vec::<String>::new()].unwrap();

        let result = cleaner.clean(df).unwrap();
        assert_eq!(result.rows_before, 0);
        assert_eq!(result.rows_after(), 0);
        assert_eq!(result.table.width(), 2);
    }
}
