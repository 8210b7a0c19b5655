//! Cleaning stages.
//!
//! This module provides the three steps every cleaner runs, in order:
//! - [`ColumnNormalizer`]: map raw column labels onto canonical names
//! - [`TypeCoercer`]: convert each canonical column to its expected dtype
//! - [`MissingValueResolver`]: drop or fill the remaining missing values
//!
//! The [`Cleaner`](crate::pipeline::Cleaner) orchestrator chains them.

mod coercer;
mod converters;
mod normalizer;
mod resolver;

pub use coercer::TypeCoercer;
pub use normalizer::{AliasMap, ColumnNormalizer};
pub use resolver::MissingValueResolver;
