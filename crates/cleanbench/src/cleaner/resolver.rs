//! Missing-value resolution.
//!
//! Each column carries exactly one [`FillPolicy`]. Policies run in column
//! declaration order, so a statistic is computed over the rows that survived
//! earlier drops, and a later drop discards rows an earlier fill touched.

use crate::error::{CleaningError, Result, ResultExt};
use crate::types::{ColumnKind, ColumnSpec, FillPolicy, FillValue, ResolutionSummary, Statistic};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Replacement for the missing cells of one column, already in the column's
/// output type.
#[derive(Debug, Clone, PartialEq)]
enum Replacement {
    Number(f64),
    Flag(u8),
    Label(String),
}

impl std::fmt::Display for Replacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
            Self::Label(v) => write!(f, "'{v}'"),
        }
    }
}

/// Applies per-column drop and fill policies to a typed table.
pub struct MissingValueResolver;

impl MissingValueResolver {
    /// Resolve every missing value named by `specs`.
    ///
    /// `row_ids` holds the original position of each row of `df` and is
    /// filtered alongside it. The returned table has no nulls in any spec
    /// column; filtering allocates a new table and never touches `df`.
    ///
    /// # Errors
    ///
    /// [`CleaningError::NoValidValues`] when a statistic is requested over a
    /// column that has rows but no non-missing values.
    pub fn resolve(
        &self,
        df: &DataFrame,
        row_ids: &IdxCa,
        specs: &[ColumnSpec],
    ) -> Result<(DataFrame, IdxCa, ResolutionSummary)> {
        let mut table = df.clone();
        let mut ids = row_ids.clone();
        let mut summary = ResolutionSummary::default();
        // per fill column, which surviving rows hold a filled value
        let mut filled: Vec<(String, Option<BooleanChunked>)> = Vec::new();

        for spec in specs {
            let series = table
                .column(&spec.name)
                .context(format!("Column '{}' missing before resolution", spec.name))?
                .as_materialized_series()
                .clone();
            let missing = series.null_count();

            match &spec.fill {
                FillPolicy::DropRow => {
                    if missing > 0 {
                        let keep = series.is_not_null();
                        table = table.filter(&keep)?;
                        ids = ids.filter(&keep)?;
                        for (_, mask) in filled.iter_mut() {
                            if let Some(mask) = mask {
                                *mask = mask.filter(&keep)?;
                            }
                        }
                        debug!("Dropped {} rows missing '{}'", missing, spec.name);
                    }
                    summary.dropped_by_column.push((spec.name.clone(), missing));
                }
                FillPolicy::FillConstant(value) => {
                    let mut mask = None;
                    if missing > 0 {
                        let replacement = constant_replacement(spec, value);
                        mask = Some(series.is_null());
                        table.replace(&spec.name, fill_nulls(&series, &replacement)?)?;
                        debug!(
                            "Filled {} missing values in '{}' with {}",
                            missing, spec.name, replacement
                        );
                    }
                    filled.push((spec.name.clone(), mask));
                }
                FillPolicy::FillStatistic(statistic) => {
                    let mut mask = None;
                    if missing > 0 {
                        let replacement = statistic_replacement(&spec.name, &series, *statistic)?;
                        mask = Some(series.is_null());
                        table.replace(&spec.name, fill_nulls(&series, &replacement)?)?;
                        debug!(
                            "Filled {} missing values in '{}' with {:?} {}",
                            missing, spec.name, statistic, replacement
                        );
                    }
                    filled.push((spec.name.clone(), mask));
                }
            }
        }

        // fills on rows a later drop removed are not counted
        summary.filled_by_column = filled
            .into_iter()
            .map(|(name, mask)| {
                let count = mask.and_then(|m| m.sum()).unwrap_or(0) as usize;
                (name, count)
            })
            .collect();

        Ok((table, ids, summary))
    }
}

fn constant_replacement(spec: &ColumnSpec, value: &FillValue) -> Replacement {
    match (&spec.kind, value) {
        (ColumnKind::Binary { .. }, FillValue::Flag(flag)) => Replacement::Flag(u8::from(*flag)),
        (ColumnKind::Binary { .. }, FillValue::Number(n)) => Replacement::Flag(u8::from(*n != 0.0)),
        (_, FillValue::Number(n)) => Replacement::Number(*n),
        (_, FillValue::Flag(flag)) => Replacement::Number(f64::from(u8::from(*flag))),
        (_, FillValue::Label(label)) => Replacement::Label(label.clone()),
    }
}

fn statistic_replacement(name: &str, series: &Series, statistic: Statistic) -> Result<Replacement> {
    let replacement = match (statistic, series.dtype()) {
        (Statistic::Mean, DataType::Float64) => series.f64()?.mean().map(Replacement::Number),
        (Statistic::Mode, DataType::Float64) => float_mode(series.f64()?).map(Replacement::Number),
        (Statistic::Mode, DataType::UInt8) => flag_mode(series.u8()?).map(Replacement::Flag),
        (Statistic::Mode, DataType::String) => label_mode(series.str()?).map(Replacement::Label),
        (_, dtype) => {
            return Err(CleaningError::UnsupportedDtype {
                column: name.to_string(),
                dtype: dtype.to_string(),
                target: "statistic fill",
            });
        }
    };

    replacement.ok_or_else(|| CleaningError::NoValidValues(name.to_string()))
}

/// Most frequent value; ties go to the smallest.
fn float_mode(values: &Float64Chunked) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().flatten().collect();
    sorted.sort_by(f64::total_cmp);

    let mut best: Option<(f64, usize)> = None;
    for run in sorted.chunk_by(|a, b| a == b) {
        if best.is_none_or(|(_, count)| run.len() > count) {
            best = Some((run[0], run.len()));
        }
    }
    best.map(|(value, _)| value)
}

fn flag_mode(values: &UInt8Chunked) -> Option<u8> {
    let mut counts = [0usize; 2];
    for flag in values.into_iter().flatten() {
        counts[usize::from(flag.min(1))] += 1;
    }
    match counts {
        [0, 0] => None,
        [zeros, ones] if ones > zeros => Some(1),
        _ => Some(0),
    }
}

fn label_mode(values: &StringChunked) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in values.into_iter().flatten() {
        *counts.entry(label).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

fn fill_nulls(series: &Series, replacement: &Replacement) -> Result<Series> {
    let filled = match replacement {
        Replacement::Number(v) => series.f64()?.fill_null_with_values(*v)?.into_series(),
        Replacement::Flag(v) => series.u8()?.fill_null_with_values(*v)?.into_series(),
        Replacement::Label(v) => {
            let ca = series.str()?;
            let fill = StringChunked::full(ca.name().clone(), v.as_str(), ca.len());
            ca.zip_with(&ca.is_not_null(), &fill)?.into_series()
        }
    };
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(n: usize) -> IdxCa {
        IdxCa::from_vec("row_id".into(), (0..n as IdxSize).collect())
    }

    #[test]
    fn test_drop_row_filters_table_and_ids() {
        let df = df![
            "price" => [Some(1.0), None, Some(3.0)],
            "qty" => [Some(1.0), Some(2.0), None],
        ]
        .unwrap();
        let specs = vec![
            ColumnSpec::numeric("price"),
            ColumnSpec::numeric("qty").fill_constant(FillValue::Number(1.0)),
        ];

        let (out, row_ids, summary) = MissingValueResolver.resolve(&df, &ids(3), &specs).unwrap();

        assert_eq!(out.height(), 2);
        let kept: Vec<Option<IdxSize>> = row_ids.into_iter().collect();
        assert_eq!(kept, vec![Some(0), Some(2)]);
        let qty: Vec<Option<f64>> = out.column("qty").unwrap().as_materialized_series().f64().unwrap().into_iter().collect();
        assert_eq!(qty, vec![Some(1.0), Some(1.0)]);
        assert_eq!(summary.dropped_by_column, vec![("price".to_string(), 1)]);
        assert_eq!(summary.filled_by_column, vec![("qty".to_string(), 1)]);
        // input untouched
        assert_eq!(df.column("price").unwrap().null_count(), 1);
    }

    #[test]
    fn test_later_drop_wins_over_earlier_fill() {
        let df = df![
            "a" => [None, Some(2.0)],
            "b" => [None, Some(1.0)],
        ]
        .unwrap();
        let specs = vec![
            ColumnSpec::numeric("a").fill_mean(),
            ColumnSpec::numeric("b"),
        ];

        let (out, _, summary) = MissingValueResolver.resolve(&df, &ids(2), &specs).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(summary.values_filled(), 0);
        assert_eq!(summary.filled_by_column, vec![("a".to_string(), 0)]);
        assert_eq!(summary.rows_dropped(), 1);
    }

    #[test]
    fn test_fill_count_only_covers_surviving_rows() {
        let df = df![
            "a" => [None, Some(2.0), None, Some(4.0)],
            "b" => [None, Some(1.0), Some(1.0), Some(1.0)],
            "c" => [Some("x"), None, None, Some("y")],
        ]
        .unwrap();
        let specs = vec![
            ColumnSpec::numeric("a").fill_mean(),
            ColumnSpec::categorical("c", ["x", "y"]).fill_mode(),
            ColumnSpec::numeric("b"),
        ];

        let (out, row_ids, summary) = MissingValueResolver.resolve(&df, &ids(4), &specs).unwrap();
        let kept: Vec<Option<IdxSize>> = row_ids.into_iter().collect();
        assert_eq!(kept, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            summary.filled_by_column,
            vec![("a".to_string(), 1), ("c".to_string(), 2)]
        );
        assert_eq!(out.column("a").unwrap().null_count(), 0);
    }

    #[test]
    fn test_mean_is_computed_after_earlier_drops() {
        let df = df![
            "keep" => [None, Some(1u8), Some(1u8)],
            "x" => [Some(100.0), Some(2.0), None],
        ]
        .unwrap();
        let specs = vec![ColumnSpec::binary("keep"), ColumnSpec::numeric("x").fill_mean()];

        let (out, _, _) = MissingValueResolver.resolve(&df, &ids(3), &specs).unwrap();
        let x: Vec<Option<f64>> = out.column("x").unwrap().as_materialized_series().f64().unwrap().into_iter().collect();
        assert_eq!(x, vec![Some(2.0), Some(2.0)]);
    }

    #[test]
    fn test_mode_ties_go_to_smallest() {
        let df = df![
            "flag" => [Some(1u8), Some(0u8), None],
            "label" => [Some("toys"), Some("books"), None],
        ]
        .unwrap();
        let specs = vec![
            ColumnSpec::binary("flag").fill_mode(),
            ColumnSpec::categorical("label", ["books", "toys"]).fill_mode(),
        ];

        let (out, _, _) = MissingValueResolver.resolve(&df, &ids(3), &specs).unwrap();
        assert_eq!(out.column("flag").unwrap().as_materialized_series().u8().unwrap().get(2), Some(0));
        assert_eq!(out.column("label").unwrap().as_materialized_series().str().unwrap().get(2), Some("books"));
    }

    #[test]
    fn test_mode_picks_most_frequent_label() {
        let df = df!["label" => [Some("toys"), Some("toys"), Some("books"), None]].unwrap();
        let specs = vec![ColumnSpec::categorical("label", ["books", "toys"]).fill_mode()];

        let (out, _, _) = MissingValueResolver.resolve(&df, &ids(4), &specs).unwrap();
        assert_eq!(out.column("label").unwrap().as_materialized_series().str().unwrap().get(3), Some("toys"));
    }

    #[test]
    fn test_binary_constant_fill() {
        let df = df!["is_returned" => [Some(1u8), None]].unwrap();
        let specs =
            vec![ColumnSpec::binary("is_returned").fill_constant(FillValue::Flag(false))];

        let (out, _, _) = MissingValueResolver.resolve(&df, &ids(2), &specs).unwrap();
        let column = out.column("is_returned").unwrap();
        assert_eq!(column.dtype(), &DataType::UInt8);
        assert_eq!(column.u8().unwrap().get(1), Some(0));
    }

    #[test]
    fn test_statistic_over_all_missing_column_fails() {
        let df = df!["tenure" => [None::<f64>, None]].unwrap();
        let specs = vec![ColumnSpec::numeric("tenure").fill_mean()];

        let err = MissingValueResolver
            .resolve(&df, &ids(2), &specs)
            .unwrap_err();
        assert!(matches!(err, CleaningError::NoValidValues(column) if column == "tenure"));
    }

    #[test]
    fn test_statistic_over_empty_table_is_noop() {
        let df = df!["tenure" => Vec::<f64>::new()].unwrap();
        let specs = vec![ColumnSpec::numeric("tenure").fill_mean()];

        let (out, row_ids, summary) = MissingValueResolver.resolve(&df, &ids(0), &specs).unwrap();
        assert_eq!(out.height(), 0);
        assert_eq!(row_ids.len(), 0);
        assert_eq!(summary.values_filled(), 0);
    }
}
