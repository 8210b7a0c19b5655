//! Deterministic Tabular Cleaning Library
//!
//! Cleaning pipelines for raw tabular datasets, built on Polars, with a
//! harness that measures how cleaning throughput and peak memory scale with
//! input size.
//!
//! # Overview
//!
//! Every cleaner runs the same three steps, in a fixed order:
//!
//! - **Normalization**: raw column labels are matched to canonical names
//!   (case, whitespace, underscores, and hyphens ignored; aliases for other
//!   spellings), and unrecognized columns are dropped
//! - **Coercion**: each column is converted to its declared kind (numeric,
//!   binary, or categorical); unparseable cells become missing and are counted
//! - **Resolution**: each column's missing values are dropped or filled
//!   according to its policy
//!
//! A cleaner is pure configuration: a [`CleanerConfig`] listing
//! [`ColumnSpec`]s and an [`AliasMap`]. Two are built in, see [`datasets`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cleanbench::{datasets, Cleaner};
//! use polars::prelude::*;
//!
//! let raw = CsvReadOptions::default()
//!     .with_infer_schema_length(Some(0))
//!     .try_into_reader_with_file_path(Some("orders.csv".into()))?
//!     .finish()?;
//!
//! let cleaner = Cleaner::new(datasets::ecommerce()?)?;
//! let result = cleaner.clean(raw)?;
//!
//! println!(
//!     "{} -> {} rows, {} unparseable values",
//!     result.rows_before,
//!     result.rows_after(),
//!     result.coercion.total_warnings()
//! );
//! ```
//!
//! # Benchmarking
//!
//! ```rust,ignore
//! use cleanbench::bench::{BenchmarkHarness, BenchmarkLedger, TrackingAllocator};
//! use cleanbench::BenchmarkConfig;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//!
//! let config = BenchmarkConfig::builder().scale_factors([1, 10, 20]).build()?;
//! let harness = BenchmarkHarness::new(config)?;
//!
//! let mut ledger = BenchmarkLedger::new();
//! ledger.record_all(harness.run(&cleaner, &base));
//! println!("{}", ledger.report(cleaner.name(), 0.2).scaling);
//! ```

pub mod bench;
pub mod cleaner;
pub mod config;
pub mod datasets;
pub mod error;
pub mod pipeline;
pub mod synth;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use bench::{BenchmarkHarness, BenchmarkLedger, BenchmarkSample, ScalingReport};
pub use cleaner::{AliasMap, ColumnNormalizer, MissingValueResolver, TypeCoercer};
pub use config::{
    BenchmarkConfig, BenchmarkConfigBuilder, CleanerConfig, CleanerConfigBuilder,
    ConfigValidationError,
};
pub use datasets::Dataset;
pub use error::{BenchmarkError, CleaningError, ResultExt};
pub use pipeline::{
    CleaningStage, Cleaner, CleanerBuilder, ClosureProgressReporter, ProgressReporter,
    ProgressUpdate,
};
pub use types::{
    CleaningResult, CleaningSummary, CoercionStats, ColumnCoercion, ColumnKind, ColumnSpec,
    FillPolicy, FillValue, ResolutionSummary, Statistic, ValidRange,
};
pub use utils::{TableProfile, profile_table};
