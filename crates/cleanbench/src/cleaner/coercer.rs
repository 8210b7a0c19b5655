//! Type coercion of normalized columns.

use super::converters::{self, Converted};
use crate::error::{Result, ResultExt};
use crate::types::{CoercionStats, ColumnKind, ColumnSpec};
use polars::prelude::*;
use tracing::{debug, info};

/// Converts each canonical column to the dtype its [`ColumnKind`] expects.
///
/// Coercion never drops or fills anything. Unparseable cells become null and
/// are counted as warnings in [`CoercionStats`].
pub struct TypeCoercer;

impl TypeCoercer {
    /// Coerce every column named in `specs`.
    ///
    /// `df` must already be normalized: it holds exactly the spec columns.
    pub fn coerce(&self, df: &DataFrame, specs: &[ColumnSpec]) -> Result<(DataFrame, CoercionStats)> {
        let mut stats = CoercionStats::default();
        let mut columns = Vec::with_capacity(specs.len());

        for spec in specs {
            let series = df
                .column(&spec.name)
                .context(format!("Column '{}' missing after normalization", spec.name))?
                .as_materialized_series();

            let converted = Self::convert(series, &spec.kind)?;
            Self::log_outcome(&spec.name, &spec.kind, &converted);

            stats.record(spec.name.clone(), converted.outcome);
            columns.push(converted.series.into_column());
        }

        if stats.total_warnings() > 0 {
            info!(
                "Coercion finished with {} unparseable values across {} columns",
                stats.total_warnings(),
                stats.columns.values().filter(|c| c.unparseable > 0).count()
            );
        }

        Ok((DataFrame::new(columns)?, stats))
    }

    fn convert(series: &Series, kind: &ColumnKind) -> Result<Converted> {
        match kind {
            ColumnKind::Numeric { valid_range } => {
                converters::to_numeric(series, valid_range.as_ref())
            }
            ColumnKind::Binary {
                extra_true,
                extra_false,
            } => converters::to_binary(series, extra_true, extra_false),
            ColumnKind::Categorical { labels } => converters::to_categorical(series, labels),
        }
    }

    fn log_outcome(name: &str, kind: &ColumnKind, converted: &Converted) {
        let outcome = &converted.outcome;
        if outcome.unparseable > 0 {
            debug!(
                "Column '{}' ({}): {} unparseable values set to missing, e.g. {:?}",
                name,
                kind.type_name(),
                outcome.unparseable,
                converted.rejected_samples
            );
        }
        if outcome.other_category > 0 {
            debug!(
                "Column '{}': {} values outside the label set kept as 'other'",
                name, outcome.other_category
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidRange;
    use pretty_assertions::assert_eq;

    fn specs() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::numeric("price").within(ValidRange::greater_than(0.0)),
            ColumnSpec::binary("is_returned"),
            ColumnSpec::categorical("product_category", ["books", "toys"]),
        ]
    }

    #[test]
    fn test_coerce_sets_output_dtypes() {
        let df = df![
            "price" => ["19.99", "abc", "-5"],
            "is_returned" => ["yes", "No", ""],
            "product_category" => ["Books", "garden", "TOYS"],
        ]
        .unwrap();

        let (out, stats) = TypeCoercer.coerce(&df, &specs()).unwrap();

        assert_eq!(out.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(out.column("is_returned").unwrap().dtype(), &DataType::UInt8);
        assert_eq!(out.column("product_category").unwrap().dtype(), &DataType::String);
        assert_eq!(out.height(), 3);

        let price = stats.get("price").unwrap();
        assert_eq!(price.parsed, 1);
        assert_eq!(price.unparseable, 2);
        assert_eq!(stats.get("is_returned").unwrap().already_missing, 1);
        assert_eq!(stats.get("product_category").unwrap().other_category, 1);
        assert_eq!(stats.total_warnings(), 2);
    }

    #[test]
    fn test_coerce_preserves_column_order() {
        let df = df![
            "price" => ["1"],
            "is_returned" => ["no"],
            "product_category" => ["books"],
        ]
        .unwrap();

        let (out, _) = TypeCoercer.coerce(&df, &specs()).unwrap();
        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["price", "is_returned", "product_category"]);
    }

    #[test]
    fn test_coerce_rejects_unsupported_dtype() {
        let list = Series::new("price".into(), &[Series::new("".into(), &[1i64])]);
        let df = DataFrame::new(vec![
            list.into_column(),
            Series::new("is_returned".into(), &["no"]).into_column(),
            Series::new("product_category".into(), &["books"]).into_column(),
        ])
        .unwrap();

        let err = TypeCoercer.coerce(&df, &specs()).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_DTYPE");
    }
}
