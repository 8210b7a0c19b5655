//! Error types for the cleaning pipeline and the benchmark harness.
//!
//! Structural problems (a required column that cannot be resolved, a table
//! that loses every row) are errors and always reach the caller. Per-value
//! parse failures are not errors: the coercer turns them into missing values
//! and counts them in [`CoercionStats`](crate::types::CoercionStats).
//!
//! Errors are serializable so a reporting layer can emit them as JSON.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for a `clean` invocation.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// A required canonical column could not be resolved from any alias.
    #[error("Required column '{column}' could not be resolved from any raw column label")]
    Schema { column: String },

    /// Every row was dropped during missing-value resolution.
    #[error(
        "Every row was dropped ({rows_before} rows before resolution; dropped per column: {})",
        format_drops(.dropped_by_column)
    )]
    EmptyResult {
        rows_before: usize,
        dropped_by_column: Vec<(String, usize)>,
    },

    /// A statistic was requested over a column with no usable values.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// The raw column has a dtype the coercer cannot read.
    #[error("Column '{column}' has dtype {dtype}, which cannot be coerced to {target}")]
    UnsupportedDtype {
        column: String,
        dtype: String,
        target: &'static str,
    },

    /// Invalid cleaner configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

fn format_drops(drops: &[(String, usize)]) -> String {
    if drops.is_empty() {
        return "none".to_string();
    }
    drops
        .iter()
        .map(|(column, count)| format!("{column}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for reporting layers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SCHEMA_ERROR",
            Self::EmptyResult { .. } => "EMPTY_RESULT",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::UnsupportedDtype { .. } => "UNSUPPORTED_DTYPE",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a schema mismatch.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::Schema { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }

    /// Check if this error is recoverable by fixing the configuration rather
    /// than the data.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Json(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Failure of a single scale factor inside a benchmark run.
///
/// A failed factor never stops the run; the harness yields the error in place
/// of that factor's sample and moves on.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// The scaled table could not be built.
    #[error("Failed to replicate base table x{scale_factor}: {reason}")]
    Replication { scale_factor: usize, reason: String },

    /// The cleaner failed on the scaled table.
    #[error("Cleaning failed at scale x{scale_factor}: {source}")]
    Cleaning {
        scale_factor: usize,
        #[source]
        source: CleaningError,
    },
}

impl BenchmarkError {
    /// Scale factor the error belongs to.
    pub fn scale_factor(&self) -> usize {
        match self {
            Self::Replication { scale_factor, .. } | Self::Cleaning { scale_factor, .. } => {
                *scale_factor
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Replication { .. } => "BENCHMARK_IO_ERROR",
            Self::Cleaning { source, .. } => source.error_code(),
        }
    }
}

impl Serialize for BenchmarkError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("BenchmarkError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("scale_factor", &self.scale_factor())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
