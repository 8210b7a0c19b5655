//! Configuration types for cleaners and benchmark runs.
//!
//! Both configurations use the builder pattern and are validated on
//! `build()`. They are serde types so they can be loaded from JSON.

use crate::cleaner::AliasMap;
use crate::types::ColumnSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default throughput tolerance band for scaling validation.
///
/// A 10x table may take up to `10 * (1 + tolerance)` times as long as the
/// baseline before it is flagged.
pub const DEFAULT_SCALING_TOLERANCE: f64 = 0.2;

/// Scale factors used when none are given.
pub const DEFAULT_SCALE_FACTORS: [usize; 3] = [1, 10, 20];

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Cleaner declares no columns")]
    EmptySpecs,

    #[error("Column name must not be empty")]
    EmptyColumnName,

    #[error("Column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("Categorical column '{0}' has an empty label set")]
    EmptyLabelSet(String),

    #[error("Column '{0}' has an empty or inverted valid range")]
    InvalidRange(String),

    #[error("Column '{column}' ({kind}) cannot use policy '{fill}'")]
    IncompatibleFill {
        column: String,
        kind: &'static str,
        fill: String,
    },

    #[error("Alias '{alias}' targets '{target}', which is not a declared column")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("Alias '{alias}' maps to both '{first}' and '{second}'")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Benchmark needs at least one scale factor")]
    EmptyScaleFactors,

    #[error("Invalid scale factor: {0} (must be at least 1)")]
    InvalidScaleFactor(usize),

    #[error("Invalid scaling tolerance: {0} (must be a finite value >= 0.0)")]
    InvalidTolerance(f64),
}

// =============================================================================
// Cleaner Configuration
// =============================================================================

/// Everything a dataset-specific cleaner supplies: a name, the alias map, and
/// the column specifications. The pipeline steps themselves are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Dataset name, used in logs and reports.
    pub name: String,

    /// Raw-label variants mapped to canonical column names.
    #[serde(default)]
    pub aliases: AliasMap,

    /// Canonical columns in output order.
    pub columns: Vec<ColumnSpec>,
}

impl CleanerConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = CleanerConfig::builder("orders")
    ///     .column(ColumnSpec::numeric("price"))
    ///     .alias("Unit Price", "price")
    ///     .build()?;
    /// ```
    pub fn builder(name: impl Into<String>) -> CleanerConfigBuilder {
        CleanerConfigBuilder {
            name: name.into(),
            aliases: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Load and validate a configuration from JSON.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a column specification by canonical name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Canonical column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.columns.is_empty() {
            return Err(ConfigValidationError::EmptySpecs);
        }

        let mut seen = HashSet::new();
        for spec in &self.columns {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigValidationError::DuplicateColumn(spec.name.clone()));
            }
        }

        for (alias, target) in self.aliases.iter() {
            if !seen.contains(target) {
                return Err(ConfigValidationError::UnknownAliasTarget {
                    alias: alias.to_string(),
                    target: target.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Builder for [`CleanerConfig`] with fluent API.
#[derive(Debug)]
pub struct CleanerConfigBuilder {
    name: String,
    aliases: Vec<(String, String)>,
    columns: Vec<ColumnSpec>,
}

impl CleanerConfigBuilder {
    /// Append a canonical column. Output columns follow call order.
    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    /// Map a raw label variant to a canonical column name.
    pub fn alias(mut self, raw: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.push((raw.into(), canonical.into()));
        self
    }

    /// Map several raw label variants to one canonical column name.
    pub fn aliases<I, S>(mut self, raws: I, canonical: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases
            .extend(raws.into_iter().map(|raw| (raw.into(), canonical.to_string())));
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleanerConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleanerConfig, ConfigValidationError> {
        let mut aliases = AliasMap::new();
        for (raw, canonical) in self.aliases {
            aliases.insert(raw, canonical)?;
        }

        let config = CleanerConfig {
            name: self.name,
            aliases,
            columns: self.columns,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Benchmark Configuration
// =============================================================================

/// Configuration for a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Multipliers applied to the base table, run in order.
    /// Default: [1, 10, 20]
    pub scale_factors: Vec<usize>,

    /// Relative slack allowed in the time-per-row ratio before a sample is
    /// flagged as non-linear.
    /// Default: 0.2
    pub tolerance: f64,

    /// Clean the base table once before measuring, so lazy allocations inside
    /// polars are not charged to the first factor.
    /// Default: true
    pub warmup: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            scale_factors: DEFAULT_SCALE_FACTORS.to_vec(),
            tolerance: DEFAULT_SCALING_TOLERANCE,
            warmup: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.scale_factors.is_empty() {
            return Err(ConfigValidationError::EmptyScaleFactors);
        }
        if let Some(&factor) = self.scale_factors.iter().find(|&&f| f == 0) {
            return Err(ConfigValidationError::InvalidScaleFactor(factor));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigValidationError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Builder for [`BenchmarkConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct BenchmarkConfigBuilder {
    scale_factors: Option<Vec<usize>>,
    tolerance: Option<f64>,
    warmup: Option<bool>,
}

impl BenchmarkConfigBuilder {
    pub fn scale_factors(mut self, factors: impl Into<Vec<usize>>) -> Self {
        self.scale_factors = Some(factors.into());
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn warmup(mut self, warmup: bool) -> Self {
        self.warmup = Some(warmup);
        self
    }

    pub fn build(self) -> Result<BenchmarkConfig, ConfigValidationError> {
        let config = BenchmarkConfig {
            scale_factors: self
                .scale_factors
                .unwrap_or_else(|| DEFAULT_SCALE_FACTORS.to_vec()),
            tolerance: self.tolerance.unwrap_or(DEFAULT_SCALING_TOLERANCE),
            warmup: self.warmup.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FillValue, ValidRange};

    fn orders() -> CleanerConfigBuilder {
        CleanerConfig::builder("orders")
            .column(ColumnSpec::numeric("price").within(ValidRange::greater_than(0.0)))
            .column(ColumnSpec::binary("is_returned").fill_constant(FillValue::Flag(false)))
    }

    #[test]
    fn test_builder_keeps_declaration_order() {
        let config = orders().alias("Unit Price", "price").build().unwrap();
        let names: Vec<&str> = config.column_names().collect();
        assert_eq!(names, vec!["price", "is_returned"]);
        assert_eq!(config.aliases.resolve("unit_price"), Some("price"));
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let result = orders().column(ColumnSpec::numeric("price")).build();
        assert_eq!(
            result.unwrap_err(),
            ConfigValidationError::DuplicateColumn("price".to_string())
        );
    }

    #[test]
    fn test_empty_specs_are_rejected() {
        let result = CleanerConfig::builder("nothing").build();
        assert_eq!(result.unwrap_err(), ConfigValidationError::EmptySpecs);
    }

    #[test]
    fn test_alias_to_undeclared_column_is_rejected() {
        let result = orders().alias("cost", "total").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::UnknownAliasTarget { .. }
        ));
    }

    #[test]
    fn test_cleaner_config_json_roundtrip() {
        let config = orders().alias("Returned?", "is_returned").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let loaded = CleanerConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_cleaner_config_from_frontend_json() {
        let json = r#"{
            "name": "subscriptions",
            "aliases": { "Monthly Fee": "fee" },
            "columns": [
                { "name": "fee", "kind": { "type": "numeric" }, "fill": { "policy": "fill_statistic", "value": "mean" } },
                { "name": "active", "kind": { "type": "binary" }, "fill": { "policy": "drop_row" } }
            ]
        }"#;
        let config = CleanerConfig::from_json(json).unwrap();
        assert_eq!(config.columns.len(), 2);
        assert_eq!(config.aliases.resolve("MONTHLY FEE"), Some("fee"));
    }

    #[test]
    fn test_benchmark_defaults() {
        let config = BenchmarkConfig::builder().build().unwrap();
        assert_eq!(config.scale_factors, vec![1, 10, 20]);
        assert_eq!(config.tolerance, DEFAULT_SCALING_TOLERANCE);
        assert!(config.warmup);
    }

    #[test]
    fn test_benchmark_validation() {
        assert_eq!(
            BenchmarkConfig::builder()
                .scale_factors(vec![1, 0])
                .build()
                .unwrap_err(),
            ConfigValidationError::InvalidScaleFactor(0)
        );
        assert_eq!(
            BenchmarkConfig::builder()
                .scale_factors(Vec::new())
                .build()
                .unwrap_err(),
            ConfigValidationError::EmptyScaleFactors
        );
        assert!(matches!(
            BenchmarkConfig::builder().tolerance(-0.1).build(),
            Err(ConfigValidationError::InvalidTolerance(_))
        ));
    }
}
