//! Column label normalization onto a canonical schema.

use crate::config::ConfigValidationError;
use crate::error::{CleaningError, Result};
use crate::types::ColumnSpec;
use crate::utils::label_key;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Lookup table from raw label variants to canonical column names.
///
/// Keys are stored as [`label_key`]s, so lookups ignore case, whitespace,
/// underscores, and hyphens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct AliasMap {
    entries: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `raw` as a variant of `canonical`.
    ///
    /// Fails if `raw` already resolves to a different canonical name.
    pub fn insert(
        &mut self,
        raw: impl AsRef<str>,
        canonical: impl Into<String>,
    ) -> std::result::Result<(), ConfigValidationError> {
        let key = label_key(raw.as_ref());
        let canonical = canonical.into();
        if let Some(existing) = self.entries.get(&key)
            && existing != &canonical
        {
            return Err(ConfigValidationError::AmbiguousAlias {
                alias: raw.as_ref().to_string(),
                first: existing.clone(),
                second: canonical,
            });
        }
        self.entries.insert(key, canonical);
        Ok(())
    }

    /// Canonical name for a raw label, if any alias matches.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        self.entries.get(&label_key(raw)).map(String::as_str)
    }

    /// `(alias key, canonical name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, String>> for AliasMap {
    type Error = ConfigValidationError;

    fn try_from(raw: BTreeMap<String, String>) -> std::result::Result<Self, Self::Error> {
        let mut aliases = Self::new();
        for (alias, canonical) in raw {
            aliases.insert(alias, canonical)?;
        }
        Ok(aliases)
    }
}

impl From<AliasMap> for BTreeMap<String, String> {
    fn from(aliases: AliasMap) -> Self {
        aliases.entries
    }
}

/// Renames raw columns to canonical names and drops everything else.
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    /// Build a table holding exactly the canonical columns of `specs`, in
    /// declaration order.
    ///
    /// A raw label matches a canonical column when its key equals the
    /// canonical name's key or an alias key for it. Unmatched raw columns are
    /// dropped. When several raw columns match the same canonical column, the
    /// leftmost wins.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::Schema`] naming the first canonical column
    /// that no raw column matched.
    pub fn normalize(
        &self,
        df: &DataFrame,
        aliases: &AliasMap,
        specs: &[ColumnSpec],
    ) -> Result<DataFrame> {
        let canonical_keys: HashMap<String, &str> = specs
            .iter()
            .map(|spec| (label_key(&spec.name), spec.name.as_str()))
            .collect();

        let mut matched: HashMap<&str, &Column> = HashMap::with_capacity(specs.len());

        for column in df.get_columns() {
            let raw = column.name().as_str();
            let key = label_key(raw);
            let target = canonical_keys
                .get(&key)
                .copied()
                .or_else(|| aliases.resolve(raw));

            match target {
                Some(canonical) => {
                    if matched.contains_key(canonical) {
                        warn!(
                            "Column '{}' also maps to '{}'; keeping the first match",
                            raw, canonical
                        );
                    } else {
                        debug!("Mapped column '{}' -> '{}'", raw, canonical);
                        matched.insert(canonical, column);
                    }
                }
                None => debug!("Dropping unrecognized column '{}'", raw),
            }
        }

        let mut columns = Vec::with_capacity(specs.len());
        for spec in specs {
            let Some(column) = matched.get(spec.name.as_str()) else {
                return Err(CleaningError::Schema {
                    column: spec.name.clone(),
                });
            };
            let mut column = (*column).clone();
            column.rename(spec.name.as_str().into());
            columns.push(column);
        }

        Ok(DataFrame::new(columns)?)
    }
}
