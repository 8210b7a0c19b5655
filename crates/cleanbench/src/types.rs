//! Core data types: column specifications and cleaning results.

use crate::config::ConfigValidationError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};
use std::time::Duration;

/// Sentinel label for categorical values outside the declared label set.
pub const OTHER_CATEGORY: &str = "other";

// =============================================================================
// Column Specifications
// =============================================================================

/// Bounds a numeric value must fall within to count as parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl ValidRange {
    /// Values strictly greater than `min`.
    pub fn greater_than(min: f64) -> Self {
        Self {
            lower: Bound::Excluded(min),
            upper: Bound::Unbounded,
        }
    }

    /// Values greater than or equal to `min`.
    pub fn at_least(min: f64) -> Self {
        Self {
            lower: Bound::Included(min),
            upper: Bound::Unbounded,
        }
    }

    /// Values in `min..=max`.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            lower: Bound::Included(min),
            upper: Bound::Included(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower, self.upper).contains(&value)
    }

    /// A range is well formed when its bounds are finite and not inverted.
    pub fn is_well_formed(&self) -> bool {
        let bound_value = |b: &Bound<f64>| match b {
            Bound::Included(v) | Bound::Excluded(v) => Some(*v),
            Bound::Unbounded => None,
        };
        let lower = bound_value(&self.lower);
        let upper = bound_value(&self.upper);
        if lower.is_some_and(|v| !v.is_finite()) || upper.is_some_and(|v| !v.is_finite()) {
            return false;
        }
        match (lower, upper) {
            (Some(lo), Some(hi)) => lo < hi || (lo == hi && self.contains(lo)),
            _ => true,
        }
    }
}

/// Expected type of a canonical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Parsed to `Float64`.
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valid_range: Option<ValidRange>,
    },
    /// Parsed to `UInt8` holding 0 or 1.
    Binary {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extra_true: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extra_false: Vec<String>,
    },
    /// Mapped onto a fixed label set; anything else becomes [`OTHER_CATEGORY`].
    Categorical { labels: Vec<String> },
}

impl ColumnKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::Binary { .. } => "binary",
            Self::Categorical { .. } => "categorical",
        }
    }

    /// Polars dtype a column of this kind has after coercion.
    pub fn output_dtype(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Float64,
            Self::Binary { .. } => DataType::UInt8,
            Self::Categorical { .. } => DataType::String,
        }
    }
}

/// Statistic used by [`FillPolicy::FillStatistic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Mean of the non-missing values (numeric columns only).
    Mean,
    /// Most frequent non-missing value; ties go to the smallest value.
    Mode,
}

/// Literal used by [`FillPolicy::FillConstant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Flag(bool),
    Number(f64),
    Label(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(s) => write!(f, "'{s}'"),
        }
    }
}

/// What to do with a missing value in a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "value", rename_all = "snake_case")]
pub enum FillPolicy {
    /// Remove the row.
    DropRow,
    /// Replace with a literal.
    FillConstant(FillValue),
    /// Replace with a statistic over the non-missing values.
    FillStatistic(Statistic),
}

impl FillPolicy {
    pub fn describe(&self) -> String {
        match self {
            Self::DropRow => "drop row".to_string(),
            Self::FillConstant(value) => format!("fill constant {value}"),
            Self::FillStatistic(Statistic::Mean) => "fill mean".to_string(),
            Self::FillStatistic(Statistic::Mode) => "fill mode".to_string(),
        }
    }
}

/// Declarative description of one canonical column.
///
/// Constructors default to [`FillPolicy::DropRow`]; chain a fill method to
/// change it.
///
/// ```rust,ignore
/// let price = ColumnSpec::numeric("price").within(ValidRange::greater_than(0.0));
/// let churn = ColumnSpec::binary("churn");
/// let contract = ColumnSpec::categorical("contract_type", ["month-to-month", "one year"])
///     .fill_mode();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub fill: FillPolicy,
}

impl ColumnSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric { valid_range: None },
            fill: FillPolicy::DropRow,
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Binary {
                extra_true: Vec::new(),
                extra_false: Vec::new(),
            },
            fill: FillPolicy::DropRow,
        }
    }

    pub fn categorical<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical {
                labels: labels.into_iter().map(Into::into).collect(),
            },
            fill: FillPolicy::DropRow,
        }
    }

    /// Restrict a numeric column to a range. No effect on other kinds.
    pub fn within(mut self, range: ValidRange) -> Self {
        if let ColumnKind::Numeric { valid_range } = &mut self.kind {
            *valid_range = Some(range);
        }
        self
    }

    /// Extra encodings read as 0 for a binary column. No effect on other kinds.
    pub fn false_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ColumnKind::Binary { extra_false, .. } = &mut self.kind {
            extra_false.extend(aliases.into_iter().map(Into::into));
        }
        self
    }

    /// Extra encodings read as 1 for a binary column. No effect on other kinds.
    pub fn true_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ColumnKind::Binary { extra_true, .. } = &mut self.kind {
            extra_true.extend(aliases.into_iter().map(Into::into));
        }
        self
    }

    pub fn drop_row(mut self) -> Self {
        self.fill = FillPolicy::DropRow;
        self
    }

    pub fn fill_constant(mut self, value: FillValue) -> Self {
        self.fill = FillPolicy::FillConstant(value);
        self
    }

    pub fn fill_mean(mut self) -> Self {
        self.fill = FillPolicy::FillStatistic(Statistic::Mean);
        self
    }

    pub fn fill_mode(mut self) -> Self {
        self.fill = FillPolicy::FillStatistic(Statistic::Mode);
        self
    }

    /// Check the spec is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName);
        }

        match &self.kind {
            ColumnKind::Numeric {
                valid_range: Some(range),
            } if !range.is_well_formed() => {
                return Err(ConfigValidationError::InvalidRange(self.name.clone()));
            }
            ColumnKind::Categorical { labels } if labels.is_empty() => {
                return Err(ConfigValidationError::EmptyLabelSet(self.name.clone()));
            }
            _ => {}
        }

        let compatible = match (&self.kind, &self.fill) {
            (_, FillPolicy::DropRow) => true,
            (_, FillPolicy::FillStatistic(Statistic::Mode)) => true,
            (ColumnKind::Numeric { .. }, FillPolicy::FillStatistic(Statistic::Mean)) => true,
            (_, FillPolicy::FillStatistic(Statistic::Mean)) => false,
            (ColumnKind::Numeric { .. }, FillPolicy::FillConstant(FillValue::Number(n))) => {
                n.is_finite()
            }
            (ColumnKind::Binary { .. }, FillPolicy::FillConstant(FillValue::Flag(_))) => true,
            (
                ColumnKind::Categorical { labels },
                FillPolicy::FillConstant(FillValue::Label(label)),
            ) => label == OTHER_CATEGORY || labels.iter().any(|l| l == label),
            (_, FillPolicy::FillConstant(_)) => false,
        };

        if !compatible {
            return Err(ConfigValidationError::IncompatibleFill {
                column: self.name.clone(),
                kind: self.kind.type_name(),
                fill: self.fill.describe(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Coercion Statistics
// =============================================================================

/// Per-column outcome of type coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCoercion {
    /// Values converted to the expected type.
    pub parsed: usize,
    /// Values that were missing before coercion (null, blank, or a missing marker).
    pub already_missing: usize,
    /// Values present but not parseable; now missing. Each one is a coercion warning.
    pub unparseable: usize,
    /// Categorical values outside the label set, kept as [`OTHER_CATEGORY`].
    pub other_category: usize,
}

impl ColumnCoercion {
    /// Values that are missing after coercion.
    pub fn missing(&self) -> usize {
        self.already_missing + self.unparseable
    }
}

/// Coercion outcome for every column of a table, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionStats {
    pub columns: BTreeMap<String, ColumnCoercion>,
}

impl CoercionStats {
    pub fn record(&mut self, column: impl Into<String>, outcome: ColumnCoercion) {
        self.columns.insert(column.into(), outcome);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnCoercion> {
        self.columns.get(column)
    }

    /// Total values converted to their expected type, including categorical
    /// values folded into [`OTHER_CATEGORY`].
    pub fn total_coerced(&self) -> usize {
        self.columns
            .values()
            .map(|c| c.parsed + c.other_category)
            .sum()
    }

    /// Total coercion warnings (values that failed to parse).
    pub fn total_warnings(&self) -> usize {
        self.columns.values().map(|c| c.unparseable).sum()
    }

    /// Total values missing after coercion.
    pub fn total_missing(&self) -> usize {
        self.columns.values().map(ColumnCoercion::missing).sum()
    }
}

// =============================================================================
// Resolution and Cleaning Results
// =============================================================================

/// What the missing-value resolver did, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    /// Rows removed by each drop-row column.
    pub dropped_by_column: Vec<(String, usize)>,
    /// Values filled in each fill column.
    pub filled_by_column: Vec<(String, usize)>,
}

impl ResolutionSummary {
    pub fn rows_dropped(&self) -> usize {
        self.dropped_by_column.iter().map(|(_, n)| n).sum()
    }

    pub fn values_filled(&self) -> usize {
        self.filled_by_column.iter().map(|(_, n)| n).sum()
    }
}

/// Output of a single `clean` invocation.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    /// Cleaned table; columns are exactly the cleaner's canonical columns.
    pub table: DataFrame,
    /// Original row position of each surviving row, in output order.
    pub row_ids: Vec<IdxSize>,
    pub rows_before: usize,
    pub rows_dropped: usize,
    pub coercion: CoercionStats,
    pub resolution: ResolutionSummary,
    pub duration: Duration,
}

impl CleaningResult {
    pub fn rows_after(&self) -> usize {
        self.table.height()
    }

    /// Values converted to their expected type during coercion.
    pub fn values_coerced(&self) -> usize {
        self.coercion.total_coerced()
    }

    /// Values filled during resolution.
    pub fn values_filled(&self) -> usize {
        self.resolution.values_filled()
    }

    pub fn summary(&self) -> CleaningSummary {
        CleaningSummary {
            rows_before: self.rows_before,
            rows_after: self.rows_after(),
            rows_dropped: self.rows_dropped,
            values_coerced: self.values_coerced(),
            coercion_warnings: self.coercion.total_warnings(),
            values_filled: self.values_filled(),
            duration_ms: self.duration.as_millis() as u64,
            coercion: self.coercion.clone(),
            resolution: self.resolution.clone(),
        }
    }
}

/// Serializable digest of a [`CleaningResult`] without the table itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_dropped: usize,
    pub values_coerced: usize,
    pub coercion_warnings: usize,
    pub values_filled: usize,
    pub duration_ms: u64,
    pub coercion: CoercionStats,
    pub resolution: ResolutionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range_bounds() {
        let positive = ValidRange::greater_than(0.0);
        assert!(positive.contains(0.01));
        assert!(!positive.contains(0.0));

        let age = ValidRange::between(10.0, 100.0);
        assert!(age.contains(10.0));
        assert!(age.contains(100.0));
        assert!(!age.contains(100.5));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let spec = ColumnSpec::numeric("age").within(ValidRange::between(100.0, 10.0));
        assert!(matches!(
            spec.validate(),
            Err(ConfigValidationError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_mean_on_binary_is_rejected() {
        let spec = ColumnSpec::binary("churn").fill_mean();
        assert!(matches!(
            spec.validate(),
            Err(ConfigValidationError::IncompatibleFill { .. })
        ));
    }

    #[test]
    fn test_constant_must_match_kind() {
        assert!(
            ColumnSpec::numeric("qty")
                .fill_constant(FillValue::Number(1.0))
                .validate()
                .is_ok()
        );
        assert!(
            ColumnSpec::binary("flag")
                .fill_constant(FillValue::Number(1.0))
                .validate()
                .is_err()
        );
        assert!(
            ColumnSpec::categorical("c", ["a", "b"])
                .fill_constant(FillValue::Label("z".to_string()))
                .validate()
                .is_err()
        );
        assert!(
            ColumnSpec::categorical("c", ["a", "b"])
                .fill_constant(FillValue::Label(OTHER_CATEGORY.to_string()))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_empty_label_set_is_rejected() {
        let spec = ColumnSpec::categorical("c", Vec::<String>::new());
        assert!(matches!(
            spec.validate(),
            Err(ConfigValidationError::EmptyLabelSet(_))
        ));
    }

    #[test]
    fn test_column_spec_json_shape() {
        let spec = ColumnSpec::numeric("price")
            .within(ValidRange::greater_than(0.0))
            .fill_constant(FillValue::Number(1.5));
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"type\":\"numeric\""));
        assert!(json.contains("\"policy\":\"fill_constant\""));

        let back: ColumnSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_coercion_totals() {
        let mut stats = CoercionStats::default();
        stats.record(
            "price",
            ColumnCoercion {
                parsed: 8,
                already_missing: 1,
                unparseable: 1,
                other_category: 0,
            },
        );
        stats.record(
            "category",
            ColumnCoercion {
                parsed: 9,
                already_missing: 0,
                unparseable: 0,
                other_category: 1,
            },
        );
        assert_eq!(stats.total_coerced(), 18);
        assert_eq!(stats.total_warnings(), 1);
        assert_eq!(stats.total_missing(), 2);
    }
}
