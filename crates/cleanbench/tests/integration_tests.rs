//! Integration tests for the cleaning pipeline.
//!
//! These tests verify end-to-end behavior of the built-in cleaners and the
//! pipeline guarantees using fixtures and synthetic tables.

use cleanbench::{
    AliasMap, CleanerConfig, Cleaner, CleaningError, CleaningStage, ColumnSpec, FillValue,
    ValidRange, datasets, synth,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a fixture with every column as text, the way the CLI does.
fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn u8_values(df: &DataFrame, name: &str) -> Vec<Option<u8>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .u8()
        .unwrap()
        .into_iter()
        .collect()
}

fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn returns_cleaner() -> Cleaner {
    let config = CleanerConfig::builder("returns")
        .column(ColumnSpec::numeric("price"))
        .column(ColumnSpec::binary("is_returned"))
        .alias(" Price ", "price")
        .alias("is_Returned", "is_returned")
        .build()
        .unwrap();
    Cleaner::new(config).unwrap()
}

// ============================================================================
// Pipeline Scenarios
// ============================================================================

#[test]
fn test_unparseable_values_drop_their_rows() {
    let df = df![
        "Cust_ID" => [1i64, 2, 3],
        " Price " => ["19.99", "abc", "5.00"],
        "is_Returned" => ["yes", "no", "maybe"],
    ]
    .unwrap();

    let result = returns_cleaner().clean(df).unwrap();

    assert_eq!(column_names(&result.table), vec!["price", "is_returned"]);
    assert_eq!(result.rows_before, 3);
    assert_eq!(result.rows_after(), 1);
    assert_eq!(result.rows_dropped, 2);
    assert_eq!(result.row_ids, vec![0]);

    assert_eq!(result.table.column("price").unwrap().dtype(), &DataType::Float64);
    assert_eq!(result.table.column("is_returned").unwrap().dtype(), &DataType::UInt8);
    assert_eq!(f64_values(&result.table, "price"), vec![Some(19.99)]);
    assert_eq!(u8_values(&result.table, "is_returned"), vec![Some(1)]);

    assert_eq!(result.coercion.total_warnings(), 2);
    assert_eq!(
        result.resolution.dropped_by_column,
        vec![("price".to_string(), 1), ("is_returned".to_string(), 1)]
    );
}

#[test]
fn test_zero_row_input_yields_zero_row_result() {
    let df = df![
        " Price " => Vec::<String>::new(),
        "is_Returned" => Vec::<String>::new(),
    ]
    .unwrap();

    let result = returns_cleaner().clean(df).unwrap();
    assert_eq!(result.rows_before, 0);
    assert_eq!(result.rows_after(), 0);
    assert_eq!(column_names(&result.table), vec!["price", "is_returned"]);
}

#[test]
fn test_all_rows_dropped_is_an_error() {
    let df = df![
        " Price " => ["abc", ""],
        "is_Returned" => ["yes", "no"],
    ]
    .unwrap();

    let err = returns_cleaner().clean(df).unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_RESULT");
    match err {
        CleaningError::EmptyResult {
            rows_before,
            dropped_by_column,
        } => {
            assert_eq!(rows_before, 2);
            assert_eq!(dropped_by_column[0], ("price".to_string(), 2));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_required_column_is_schema_error() {
    let df = df![" Price " => ["1.0"], "returned_at" => ["2024-01-01"]].unwrap();

    let err = returns_cleaner().clean(df).unwrap_err();
    assert!(err.is_schema_error());
    assert!(err.to_string().contains("is_returned"));
}

// ============================================================================
// Pipeline Properties
// ============================================================================

#[test]
fn test_cleaning_is_deterministic() {
    let cleaner = Cleaner::new(datasets::ecommerce().unwrap()).unwrap();
    let raw = synth::ecommerce(500, 11).unwrap();

    let first = cleaner.clean(raw.clone()).unwrap();
    let second = cleaner.clean(raw).unwrap();

    assert!(first.table.equals_missing(&second.table));
    assert_eq!(first.row_ids, second.row_ids);
    assert_eq!(first.coercion, second.coercion);
    assert_eq!(first.resolution, second.resolution);
}

#[test]
fn test_surviving_rows_keep_input_order() {
    let cleaner = Cleaner::new(datasets::telco_churn().unwrap()).unwrap();
    let raw = synth::telco_churn(400, 3).unwrap();

    let result = cleaner.clean(raw).unwrap();

    assert!(result.rows_dropped > 0);
    assert!(result.row_ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(result.row_ids.len(), result.rows_after());
}

#[test]
fn test_output_columns_match_specs_exactly() {
    let config = datasets::telco_churn().unwrap();
    let expected: Vec<String> = config.column_names().map(str::to_string).collect();
    let cleaner = Cleaner::new(config).unwrap();

    let result = cleaner.clean(synth::telco_churn(100, 5).unwrap()).unwrap();
    assert_eq!(column_names(&result.table), expected);

    for column in result.table.get_columns() {
        assert_eq!(column.null_count(), 0, "column '{}' has nulls", column.name());
    }
}

#[test]
fn test_binary_columns_are_uint8() {
    let config = datasets::telco_churn().unwrap();
    let cleaner = Cleaner::new(config.clone()).unwrap();
    let result = cleaner.clean(synth::telco_churn(100, 9).unwrap()).unwrap();

    for spec in &config.columns {
        let column = result.table.column(&spec.name).unwrap();
        assert_eq!(column.dtype(), &spec.kind.output_dtype(), "column '{}'", spec.name);
    }
}

#[test]
fn test_result_does_not_alias_input() {
    let raw = df![
        " Price " => ["1.0", "2.0", "abc"],
        "is_Returned" => ["yes", "no", "yes"],
    ]
    .unwrap();
    let original = raw.clone();

    let mut result = returns_cleaner().clean(raw.clone()).unwrap();
    result
        .table
        .replace("price", Series::new("price".into(), [99.0, 99.0]))
        .unwrap();

    assert!(raw.equals_missing(&original));
    assert_eq!(f64_values(&result.table, "price"), vec![Some(99.0), Some(99.0)]);
}

#[test]
fn test_row_count_unchanged_without_drop_misses() {
    let config = CleanerConfig::builder("fills")
        .column(ColumnSpec::numeric("price"))
        .column(ColumnSpec::numeric("qty").fill_constant(FillValue::Number(1.0)))
        .build()
        .unwrap();
    let df = df!["price" => ["1", "2", "3"], "qty" => ["", "x", "4"]].unwrap();

    let result = Cleaner::new(config).unwrap().clean(df).unwrap();
    assert_eq!(result.rows_after(), result.rows_before);
    assert_eq!(result.values_filled(), 2);
    assert_eq!(f64_values(&result.table, "qty"), vec![Some(1.0), Some(1.0), Some(4.0)]);
}

#[test]
fn test_fills_on_dropped_rows_are_not_counted() {
    let config = CleanerConfig::builder("drop_after_fill")
        .column(ColumnSpec::numeric("a").fill_mean())
        .column(ColumnSpec::numeric("b"))
        .build()
        .unwrap();
    let df = df!["a" => ["", "2", "4"], "b" => ["", "1", "1"]].unwrap();

    let result = Cleaner::new(config).unwrap().clean(df).unwrap();

    assert_eq!(result.rows_after(), 2);
    assert_eq!(f64_values(&result.table, "a"), vec![Some(2.0), Some(4.0)]);
    assert_eq!(result.values_filled(), 0);
    assert_eq!(result.summary().values_filled, 0);
}

#[test]
fn test_progress_follows_fixed_stage_order() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let cleaner = Cleaner::builder()
        .config(datasets::ecommerce().unwrap())
        .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
        .build()
        .unwrap();
    cleaner.clean(synth::ecommerce(50, 2).unwrap()).unwrap();

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            CleaningStage::Raw,
            CleaningStage::Normalized,
            CleaningStage::Typed,
            CleaningStage::Cleaned,
        ]
    );
}

#[test]
fn test_cleaner_is_shareable_across_threads() {
    let cleaner = Arc::new(Cleaner::new(datasets::ecommerce().unwrap()).unwrap());

    let handles: Vec<_> = (0..2)
        .map(|seed| {
            let cleaner = Arc::clone(&cleaner);
            std::thread::spawn(move || {
                cleaner
                    .clean(synth::ecommerce(100, seed).unwrap())
                    .unwrap()
                    .rows_after()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("Thread should not panic") > 0);
    }
}

// ============================================================================
// Fixture Tests
// ============================================================================

#[test]
fn test_ecommerce_fixture() {
    let raw = load_csv("ecommerce_raw.csv");
    let cleaner = Cleaner::new(datasets::ecommerce().unwrap()).unwrap();

    let result = cleaner.clean(raw).unwrap();
    let table = &result.table;

    assert_eq!(
        column_names(table),
        vec!["price", "quantity", "product_category", "is_returned"]
    );
    assert_eq!(result.row_ids, vec![0, 3, 5, 6, 7]);
    assert_eq!(
        f64_values(table, "price"),
        vec![Some(19.99), Some(1250.0), Some(45.5), Some(12.0), Some(7.25)]
    );
    assert_eq!(
        f64_values(table, "quantity"),
        vec![Some(2.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0)]
    );
    assert_eq!(
        str_values(table, "product_category"),
        vec![
            Some("books".to_string()),
            Some("electronics".to_string()),
            Some("other".to_string()),
            Some("books".to_string()),
            Some("books".to_string()),
        ]
    );
    assert_eq!(
        u8_values(table, "is_returned"),
        vec![Some(1), Some(0), Some(0), Some(1), Some(0)]
    );

    let summary = result.summary();
    assert_eq!(summary.rows_dropped, 3);
    assert_eq!(summary.coercion_warnings, 5);
    assert_eq!(summary.values_filled, 6);

    let price = result.coercion.get("price").unwrap();
    assert_eq!((price.parsed, price.unparseable, price.already_missing), (5, 2, 1));
    assert_eq!(result.coercion.get("product_category").unwrap().other_category, 1);
}

#[test]
fn test_telco_fixture() {
    let raw = load_csv("telco_raw.csv");
    let cleaner = Cleaner::new(datasets::telco_churn().unwrap()).unwrap();

    let result = cleaner.clean(raw).unwrap();
    let table = &result.table;

    assert_eq!(table.width(), 17);
    assert_eq!(result.row_ids, vec![0, 1, 2, 4, 5]);
    assert_eq!(result.coercion.total_warnings(), 0);
    assert_eq!(
        result.resolution.dropped_by_column[0],
        ("total_charges".to_string(), 1)
    );

    // tenure mean over the five known values: (1 + 34 + 2 + 0 + 45) / 5
    let tenure = f64_values(table, "tenure");
    assert!((tenure[3].unwrap() - 16.4).abs() < 1e-9);

    let monthly = f64_values(table, "monthly_charges");
    assert!((monthly[4].unwrap() - 52.78).abs() < 1e-9);

    assert_eq!(u8_values(table, "churn"), vec![Some(0), Some(0), Some(1), Some(1), Some(0)]);
    assert_eq!(u8_values(table, "multiple_lines")[0], Some(0));
    assert_eq!(u8_values(table, "online_security")[4], Some(0));
    assert_eq!(u8_values(table, "senior_citizen")[3], Some(1));
    assert_eq!(
        str_values(table, "contract_type"),
        vec![
            Some("month-to-month".to_string()),
            Some("one year".to_string()),
            Some("month-to-month".to_string()),
            Some("month-to-month".to_string()),
            Some("one year".to_string()),
        ]
    );
}

#[test]
fn test_json_config_fixture() {
    let json = std::fs::read_to_string(fixtures_path().join("orders_config.json")).unwrap();
    let config = CleanerConfig::from_json(&json).unwrap();
    assert_eq!(config.aliases.resolve("unit price"), Some("price"));

    let result = Cleaner::new(config)
        .unwrap()
        .clean(load_csv("ecommerce_raw.csv"))
        .unwrap();

    assert_eq!(
        column_names(&result.table),
        vec!["price", "product_category", "is_returned"]
    );
    assert_eq!(result.rows_after(), 5);
    assert_eq!(str_values(&result.table, "product_category")[3], Some("books".to_string()));
}

#[test]
fn test_json_config_rejects_bad_fill() {
    let json = r#"{
        "name": "bad",
        "columns": [
            { "name": "churn", "kind": { "type": "binary" }, "fill": { "policy": "fill_statistic", "value": "mean" } }
        ]
    }"#;

    let err = CleanerConfig::from_json(json).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
    assert!(err.is_recoverable());
}

#[test]
fn test_explicit_alias_map() {
    let mut aliases = AliasMap::new();
    aliases.insert("Purchase Amount", "price").unwrap();

    let config = CleanerConfig {
        name: "aliases".to_string(),
        aliases,
        columns: vec![ColumnSpec::numeric("price").within(ValidRange::greater_than(0.0))],
    };
    let df = df!["PURCHASE_AMOUNT" => ["10", "0"]].unwrap();

    let result = Cleaner::new(config).unwrap().clean(df).unwrap();
    assert_eq!(f64_values(&result.table, "price"), vec![Some(10.0)]);
}
