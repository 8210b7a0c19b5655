//! Column converters used by the type coercer.
//!
//! Each converter makes one pass over its input column and returns the
//! typed column together with its [`ColumnCoercion`] counts. Values that
//! cannot be converted become null; they are never replaced with a default.

use crate::error::{CleaningError, Result};
use crate::types::{ColumnCoercion, OTHER_CATEGORY, ValidRange};
use crate::utils::{
    BINARY_FALSE_VALUES, BINARY_TRUE_VALUES, is_missing_marker, is_numeric_dtype,
    parse_numeric_string, value_key,
};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

/// Up to this many unparseable values are kept for the debug log.
pub(crate) const SAMPLE_LIMIT: usize = 3;

/// Conversion output: typed column, counts, and a few offending raw values.
pub(crate) struct Converted {
    pub series: Series,
    pub outcome: ColumnCoercion,
    pub rejected_samples: Vec<String>,
}

impl Converted {
    fn reject(&mut self, raw: impl std::fmt::Display) {
        self.outcome.unparseable += 1;
        if self.rejected_samples.len() < SAMPLE_LIMIT {
            self.rejected_samples.push(raw.to_string());
        }
    }
}

fn empty_converted(name: &PlSmallStr, dtype: &DataType) -> Converted {
    Converted {
        series: Series::new_empty(name.clone(), dtype),
        outcome: ColumnCoercion::default(),
        rejected_samples: Vec::new(),
    }
}

fn unsupported(series: &Series, target: &'static str) -> CleaningError {
    CleaningError::UnsupportedDtype {
        column: series.name().to_string(),
        dtype: series.dtype().to_string(),
        target,
    }
}

/// Convert a column to `Float64`.
///
/// String cells are parsed with currency/percent/thousands formatting
/// tolerated; numeric and boolean columns are cast. Values outside `range`
/// count as unparseable.
pub(crate) fn to_numeric(series: &Series, range: Option<&ValidRange>) -> Result<Converted> {
    let mut out = empty_converted(series.name(), &DataType::Float64);
    let accept = |v: f64| v.is_finite() && range.is_none_or(|r| r.contains(v));

    let values: Vec<Option<f64>> = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|cell| match cell {
                None => {
                    out.outcome.already_missing += 1;
                    None
                }
                Some(raw) if is_missing_marker(raw) => {
                    out.outcome.already_missing += 1;
                    None
                }
                Some(raw) => match parse_numeric_string(raw).filter(|&v| accept(v)) {
                    Some(v) => {
                        out.outcome.parsed += 1;
                        Some(v)
                    }
                    None => {
                        out.reject(raw);
                        None
                    }
                },
            })
            .collect(),
        dtype if is_numeric_dtype(dtype) || dtype == &DataType::Boolean || dtype.is_null() => {
            series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|cell| match cell {
                    None => {
                        out.outcome.already_missing += 1;
                        None
                    }
                    Some(v) if accept(v) => {
                        out.outcome.parsed += 1;
                        Some(v)
                    }
                    Some(v) => {
                        out.reject(v);
                        None
                    }
                })
                .collect()
        }
        _ => return Err(unsupported(series, "numeric")),
    };

    out.series = Series::new(series.name().clone(), values);
    Ok(out)
}

/// Convert a column to `UInt8` holding 0 or 1.
///
/// Strings are matched case-insensitively against the shared encodings plus
/// the column's extra encodings. Booleans map directly; numbers must be
/// exactly 0 or 1.
pub(crate) fn to_binary(
    series: &Series,
    extra_true: &[String],
    extra_false: &[String],
) -> Result<Converted> {
    let mut out = empty_converted(series.name(), &DataType::UInt8);

    let values: Vec<Option<u8>> = match series.dtype() {
        DataType::String => {
            let truthy: HashSet<String> = BINARY_TRUE_VALUES
                .iter()
                .map(|v| v.to_string())
                .chain(extra_true.iter().map(|v| value_key(v)))
                .collect();
            let falsy: HashSet<String> = BINARY_FALSE_VALUES
                .iter()
                .map(|v| v.to_string())
                .chain(extra_false.iter().map(|v| value_key(v)))
                .collect();

            series
                .str()?
                .into_iter()
                .map(|cell| match cell {
                    None => {
                        out.outcome.already_missing += 1;
                        None
                    }
                    Some(raw) if is_missing_marker(raw) => {
                        out.outcome.already_missing += 1;
                        None
                    }
                    Some(raw) => {
                        let key = value_key(raw);
                        if truthy.contains(&key) {
                            out.outcome.parsed += 1;
                            Some(1)
                        } else if falsy.contains(&key) {
                            out.outcome.parsed += 1;
                            Some(0)
                        } else {
                            out.reject(raw);
                            None
                        }
                    }
                })
                .collect()
        }
        dtype if is_numeric_dtype(dtype) || dtype == &DataType::Boolean || dtype.is_null() => {
            series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|cell| match cell {
                    None => {
                        out.outcome.already_missing += 1;
                        None
                    }
                    Some(v) if v == 0.0 => {
                        out.outcome.parsed += 1;
                        Some(0)
                    }
                    Some(v) if v == 1.0 => {
                        out.outcome.parsed += 1;
                        Some(1)
                    }
                    Some(v) => {
                        out.reject(v);
                        None
                    }
                })
                .collect()
        }
        _ => return Err(unsupported(series, "binary")),
    };

    out.series = Series::new(series.name().clone(), values);
    Ok(out)
}

/// Map a column onto a fixed label set.
///
/// Matching ignores case and surrounding whitespace and emits the label's
/// declared spelling. Values outside the set become [`OTHER_CATEGORY`].
pub(crate) fn to_categorical(series: &Series, labels: &[String]) -> Result<Converted> {
    let mut out = empty_converted(series.name(), &DataType::String);

    let as_strings = match series.dtype() {
        DataType::String => series.clone(),
        dtype if is_numeric_dtype(dtype) || dtype == &DataType::Boolean || dtype.is_null() => {
            series.cast(&DataType::String)?
        }
        _ => return Err(unsupported(series, "categorical")),
    };

    let lookup: HashMap<String, &str> = labels
        .iter()
        .map(|label| (value_key(label), label.as_str()))
        .collect();

    let values: Vec<Option<&str>> = as_strings
        .str()?
        .into_iter()
        .map(|cell| match cell {
            None => {
                out.outcome.already_missing += 1;
                None
            }
            Some(raw) if is_missing_marker(raw) => {
                out.outcome.already_missing += 1;
                None
            }
            Some(raw) => match lookup.get(&value_key(raw)) {
                Some(label) => {
                    out.outcome.parsed += 1;
                    Some(*label)
                }
                None => {
                    out.outcome.other_category += 1;
                    Some(OTHER_CATEGORY)
                }
            },
        })
        .collect();

    out.series = Series::new(series.name().clone(), values);
    Ok(out)
}
