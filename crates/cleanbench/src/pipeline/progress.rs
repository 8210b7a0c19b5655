//! Progress reporting for the cleaning pipeline.
//!
//! A reporter only observes stage transitions and has no way to alter them.
//!
//! # Example
//!
//! ```rust,ignore
//! use cleanbench::{datasets, Cleaner};
//!
//! let cleaner = Cleaner::builder()
//!     .config(datasets::ecommerce()?)
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?;
//! let result = cleaner.clean(df)?;
//! ```

use serde::{Deserialize, Serialize};

/// States a table passes through inside [`Cleaner::clean`](super::Cleaner::clean).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Raw input accepted
    Raw,
    /// Columns renamed to canonical names
    Normalized,
    /// Columns coerced to their expected dtypes
    Typed,
    /// Missing values resolved; terminal
    Cleaned,
    /// A stage returned an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Raw => "Raw",
            Self::Normalized => "Normalized",
            Self::Typed => "Typed",
            Self::Cleaned => "Cleaned",
            Self::Failed => "Failed",
        }
    }

    /// Fraction of the pipeline completed once this stage is reached.
    pub fn progress(&self) -> f32 {
        match self {
            Self::Raw => 0.0,
            Self::Normalized => 1.0 / 3.0,
            Self::Typed => 2.0 / 3.0,
            Self::Cleaned => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress notification sent at each stage transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Stage just reached
    pub stage: CleaningStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Rows in the table at this stage
    pub rows: usize,

    /// Human-readable message
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: CleaningStage, rows: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.progress(),
            rows,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(CleaningStage::Failed, 0, message)
    }
}

/// Trait for receiving progress updates during cleaning.
///
/// Implementations must be `Send + Sync` so a [`Cleaner`](super::Cleaner)
/// holding one can be shared across threads.
pub trait ProgressReporter: Send + Sync {
    /// Called once per stage transition. Implementations should be cheap.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
