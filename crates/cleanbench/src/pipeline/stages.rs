//! Typed pipeline states.
//!
//! Each state can only be built by the previous state's transition, so a
//! table cannot reach [`CleanedTable`] without passing normalization,
//! coercion, and resolution in that order. Every state carries the original
//! row position of each of its rows.

use crate::cleaner::{AliasMap, ColumnNormalizer, MissingValueResolver, TypeCoercer};
use crate::error::Result;
use crate::types::{CoercionStats, ColumnSpec, ResolutionSummary};
use polars::prelude::*;

const ROW_ID: &str = "row_id";

/// Input table as received.
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
    row_ids: IdxCa,
}

/// Columns renamed to canonical names; values still raw.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    frame: DataFrame,
    row_ids: IdxCa,
}

/// Columns coerced to their expected dtypes; missing values still present.
#[derive(Debug, Clone)]
pub struct TypedTable {
    frame: DataFrame,
    row_ids: IdxCa,
}

/// Terminal state: no missing values in any spec column.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    frame: DataFrame,
    row_ids: IdxCa,
}

impl RawTable {
    pub fn new(frame: DataFrame) -> Self {
        let row_ids = IdxCa::from_vec(ROW_ID.into(), (0..frame.height() as IdxSize).collect());
        Self { frame, row_ids }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn normalize(self, aliases: &AliasMap, specs: &[ColumnSpec]) -> Result<NormalizedTable> {
        let frame = ColumnNormalizer.normalize(&self.frame, aliases, specs)?;
        Ok(NormalizedTable {
            frame,
            row_ids: self.row_ids,
        })
    }
}

impl NormalizedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn coerce(self, specs: &[ColumnSpec]) -> Result<(TypedTable, CoercionStats)> {
        let (frame, stats) = TypeCoercer.coerce(&self.frame, specs)?;
        Ok((
            TypedTable {
                frame,
                row_ids: self.row_ids,
            },
            stats,
        ))
    }
}

impl TypedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn resolve(self, specs: &[ColumnSpec]) -> Result<(CleanedTable, ResolutionSummary)> {
        let (frame, row_ids, summary) =
            MissingValueResolver.resolve(&self.frame, &self.row_ids, specs)?;
        Ok((CleanedTable { frame, row_ids }, summary))
    }
}

impl CleanedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Split into the table and the original row positions, in output order.
    pub fn into_parts(self) -> (DataFrame, Vec<IdxSize>) {
        let row_ids = self.row_ids.into_no_null_iter().collect();
        (self.frame, row_ids)
    }
}
