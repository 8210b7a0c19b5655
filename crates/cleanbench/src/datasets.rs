//! Built-in cleaner configurations.
//!
//! Each dataset is pure data: a list of [`ColumnSpec`]s and an alias map.
//! Raw labels such as `TotalCharges` or `Monthly Charges` already match their
//! canonical names through label normalization; aliases cover genuinely
//! different spellings.

use crate::config::{CleanerConfig, ConfigValidationError};
use crate::types::{ColumnSpec, FillValue, ValidRange};
use serde::{Deserialize, Serialize};

/// Product categories recognized by the e-commerce cleaner.
pub const PRODUCT_CATEGORIES: [&str; 8] = [
    "electronics",
    "clothing",
    "home",
    "books",
    "beauty",
    "sports",
    "toys",
    "grocery",
];

/// Contract types recognized by the telco cleaner.
pub const CONTRACT_TYPES: [&str; 3] = ["month-to-month", "one year", "two year"];

const NO_PHONE_SERVICE: &str = "no phone service";
const NO_INTERNET_SERVICE: &str = "no internet service";

/// Columns whose "no internet service" answer means 0.
pub const INTERNET_ADDONS: [&str; 6] = [
    "online_security",
    "online_backup",
    "device_protection",
    "tech_support",
    "streaming_tv",
    "streaming_movies",
];

/// Yes/no account flags filled with their most frequent value.
pub const ACCOUNT_FLAGS: [&str; 5] = [
    "senior_citizen",
    "partner",
    "dependents",
    "phone_service",
    "paperless_billing",
];

/// Built-in datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    Ecommerce,
    TelcoChurn,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ecommerce => "ecommerce",
            Self::TelcoChurn => "telco-churn",
        }
    }

    /// Cleaner configuration for this dataset.
    pub fn config(&self) -> Result<CleanerConfig, ConfigValidationError> {
        match self {
            Self::Ecommerce => ecommerce(),
            Self::TelcoChurn => telco_churn(),
        }
    }
}

/// E-commerce transactions: price, quantity, category, return flag.
pub fn ecommerce() -> Result<CleanerConfig, ConfigValidationError> {
    CleanerConfig::builder(Dataset::Ecommerce.name())
        .column(ColumnSpec::numeric("price").within(ValidRange::greater_than(0.0)))
        .column(
            ColumnSpec::numeric("quantity")
                .within(ValidRange::greater_than(0.0))
                .fill_constant(FillValue::Number(1.0)),
        )
        .column(ColumnSpec::categorical("product_category", PRODUCT_CATEGORIES).fill_mode())
        .column(ColumnSpec::binary("is_returned").fill_constant(FillValue::Flag(false)))
        .aliases(["unit_price", "purchase_amount", "amount"], "price")
        .aliases(["qty", "units"], "quantity")
        .aliases(["category", "product_type"], "product_category")
        .aliases(["returned", "return_flag"], "is_returned")
        .build()
}

/// Telco customer churn: tenure, charges, service flags, contract, churn.
pub fn telco_churn() -> Result<CleanerConfig, ConfigValidationError> {
    let non_negative = ValidRange::at_least(0.0);

    let mut builder = CleanerConfig::builder(Dataset::TelcoChurn.name())
        .column(ColumnSpec::numeric("tenure").within(non_negative).fill_mean())
        .column(
            ColumnSpec::numeric("monthly_charges")
                .within(non_negative)
                .fill_mean(),
        )
        .column(ColumnSpec::numeric("total_charges").within(non_negative));

    for name in ACCOUNT_FLAGS {
        builder = builder.column(ColumnSpec::binary(name).fill_mode());
    }
    builder = builder.column(
        ColumnSpec::binary("multiple_lines")
            .false_aliases([NO_PHONE_SERVICE])
            .fill_mode(),
    );
    for name in INTERNET_ADDONS {
        builder = builder.column(
            ColumnSpec::binary(name)
                .false_aliases([NO_INTERNET_SERVICE])
                .fill_mode(),
        );
    }

    builder
        .column(ColumnSpec::categorical("contract_type", CONTRACT_TYPES).fill_mode())
        .column(ColumnSpec::binary("churn"))
        .alias("tenure_months", "tenure")
        .alias("contract", "contract_type")
        .alias("churned", "churn")
        .build()
}
