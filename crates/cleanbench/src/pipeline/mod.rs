//! Pipeline module.
//!
//! This module provides the [`Cleaner`] orchestrator, the typed table states
//! it moves through, and progress reporting.

mod builder;
pub mod progress;
pub mod stages;

pub use builder::{Cleaner, CleanerBuilder};
pub use progress::{CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
pub use stages::{CleanedTable, NormalizedTable, RawTable, TypedTable};
