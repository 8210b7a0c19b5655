//! CLI entry point for the cleaning pipelines and the benchmark harness.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use cleanbench::bench::{BenchmarkHarness, BenchmarkLedger, TrackingAllocator, as_mib};
use cleanbench::{
    BenchmarkConfig, Cleaner, CleanerConfig, CleaningResult, Dataset, profile_table, synth,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

/// CLI-compatible dataset enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDataset {
    /// E-commerce transactions (price, quantity, category, return flag)
    Ecommerce,
    /// Telco customer churn (tenure, charges, service flags, contract, churn)
    TelcoChurn,
}

impl From<CliDataset> for Dataset {
    fn from(cli: CliDataset) -> Self {
        match cli {
            CliDataset::Ecommerce => Dataset::Ecommerce,
            CliDataset::TelcoChurn => Dataset::TelcoChurn,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Deterministic tabular cleaning with a scaling benchmark",
    long_about = "Cleans raw CSV tables into typed, gap-free tables and benchmarks how\n\
                  cleaning time and peak memory grow with input size.\n\n\
                  EXAMPLES:\n  \
                  # Clean a CSV with the built-in e-commerce cleaner\n  \
                  cleanbench clean --dataset ecommerce --input orders.csv --output clean.csv\n\n  \
                  # Benchmark the telco cleaner on 10k synthetic rows at x1, x10, x20\n  \
                  cleanbench bench --dataset telco-churn --synthetic 10000\n\n  \
                  # Profile a raw CSV\n  \
                  cleanbench profile --input raw.csv"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings, errors, and the result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout carries only the JSON document.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a raw CSV file
    Clean {
        /// Built-in cleaner to use
        #[arg(short, long, value_enum, required_unless_present = "config")]
        dataset: Option<CliDataset>,

        /// Path to the raw CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the cleaned CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON cleaner configuration, used instead of a built-in dataset
        #[arg(short, long, conflicts_with = "dataset")]
        config: Option<PathBuf>,
    },

    /// Benchmark a cleaner at several scale factors
    Bench {
        /// Built-in cleaner to benchmark
        #[arg(short, long, value_enum)]
        dataset: CliDataset,

        /// Raw CSV used as the base table
        #[arg(short, long, required_unless_present = "synthetic", conflicts_with = "synthetic")]
        input: Option<PathBuf>,

        /// Generate a synthetic base table with this many rows
        #[arg(long)]
        synthetic: Option<usize>,

        /// Scale factors, comma separated
        #[arg(long, value_delimiter = ',', default_value = "1,10,20")]
        factors: Vec<usize>,

        /// Allowed deviation from linear scaling before a factor is flagged
        #[arg(long, default_value = "0.2")]
        tolerance: f64,

        /// Seed for --synthetic
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Skip the warm-up pass before the first factor
        #[arg(long)]
        no_warmup: bool,
    },

    /// Print row count, dtypes, and missing values per column of a CSV
    Profile {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match &args.command {
        Command::Clean {
            dataset,
            input,
            output,
            config,
        } => run_clean(&args, *dataset, input, output.as_deref(), config.as_deref()),
        Command::Bench {
            dataset,
            input,
            synthetic,
            factors,
            tolerance,
            seed,
            no_warmup,
        } => {
            let config = BenchmarkConfig::builder()
                .scale_factors(factors.clone())
                .tolerance(*tolerance)
                .warmup(!no_warmup)
                .build()?;
            let base = match (input, synthetic) {
                (Some(path), _) => load_csv(path)?,
                (None, Some(rows)) => synthesize((*dataset).into(), *rows, *seed)?,
                (None, None) => return Err(anyhow!("Either --input or --synthetic is required")),
            };
            run_bench(&args, (*dataset).into(), &base, config)
        }
        Command::Profile { input } => run_profile(&args, input),
    }
}

fn run_clean(
    args: &Args,
    dataset: Option<CliDataset>,
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = match (config_path, dataset) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config {}", path.display()))?;
            CleanerConfig::from_json(&json)?
        }
        (None, Some(dataset)) => Dataset::from(dataset).config()?,
        (None, None) => return Err(anyhow!("Either --dataset or --config is required")),
    };
    let cleaner = Cleaner::new(config)?;

    let raw = load_csv(input)?;
    let raw_shape = raw.shape();

    let mut result = match cleaner.clean(raw) {
        Ok(result) => result,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            return Err(anyhow!("Cleaning failed [{}]: {}", e.error_code(), e));
        }
    };

    if let Some(path) = output {
        write_csv(&mut result.table, path)?;
        info!("Cleaned table written to: {}", path.display());
    }

    if args.json {
        let document = serde_json::json!({
            "cleaner": cleaner.name(),
            "input": input.display().to_string(),
            "output": output.map(|p| p.display().to_string()),
            "summary": result.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    print_clean_summary(cleaner.name(), input, output, raw_shape, &result);
    Ok(())
}

fn synthesize(dataset: Dataset, rows: usize, seed: u64) -> Result<DataFrame> {
    info!("Generating {} synthetic {} rows (seed {})", rows, dataset.name(), seed);
    let df = match dataset {
        Dataset::Ecommerce => synth::ecommerce(rows, seed)?,
        Dataset::TelcoChurn => synth::telco_churn(rows, seed)?,
    };
    Ok(df)
}

fn run_bench(args: &Args, dataset: Dataset, base: &DataFrame, config: BenchmarkConfig) -> Result<()> {
    let cleaner = Cleaner::new(dataset.config()?)?;
    let tolerance = config.tolerance;
    let harness = BenchmarkHarness::new(config)?;

    info!("{}", "=".repeat(80));
    info!(
        "Benchmarking '{}' on {} base rows at factors {:?}",
        cleaner.name(),
        base.height(),
        harness.config().scale_factors
    );
    info!("{}", "=".repeat(80));

    let mut ledger = BenchmarkLedger::new();
    ledger.record_all(harness.run(&cleaner, base));
    let report = ledger.report(cleaner.name(), tolerance);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{}", "=".repeat(80));
        println!("BENCHMARK: {} ({} base rows)", report.cleaner, base.height());
        println!("{}", "=".repeat(80));
        println!(
            "{:<8} {:>12} {:>12} {:>10} {:>12} {:>14}",
            "Factor", "Rows", "Kept", "Time (s)", "Peak (MiB)", "Rows/s"
        );
        println!("{}", "-".repeat(72));
        for sample in &report.samples {
            println!(
                "x{:<7} {:>12} {:>12} {:>10.4} {:>12.2} {:>14.0}",
                sample.scale_factor,
                sample.row_count,
                sample.rows_out,
                sample.elapsed_seconds,
                as_mib(sample.peak_memory_bytes),
                sample.throughput_rows_per_sec
            );
        }
        for failure in &report.failures {
            println!("x{:<7} FAILED [{}] {}", failure.scale_factor, failure.code, failure.message);
        }
        println!();
        print!("{}", report.scaling);
        println!("{}", "=".repeat(80));
    }

    if ledger.samples().is_empty() {
        return Err(anyhow!("Every scale factor failed"));
    }
    Ok(())
}

fn run_profile(args: &Args, input: &Path) -> Result<()> {
    let df = load_csv(input)?;
    let profile = profile_table(&df)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!();
    println!("{}", "=".repeat(80));
    println!("PROFILE: {}", input.display());
    println!("{}", "=".repeat(80));
    println!("  Rows: {}", profile.rows);
    println!("  Columns: {}", profile.columns.len());
    println!("  Missing values: {}", profile.total_missing());
    println!();
    println!("{:<30} {:<12} {:>10}", "Column", "Type", "Missing");
    println!("{}", "-".repeat(54));
    for column in &profile.columns {
        println!(
            "{:<30} {:<12} {:>10}",
            truncate_str(&column.name, 29),
            column.dtype,
            column.missing
        );
    }
    println!("{}", "=".repeat(80));
    Ok(())
}

/// Print a human-readable summary of a cleaning run.
fn print_clean_summary(
    cleaner: &str,
    input: &Path,
    output: Option<&Path>,
    raw_shape: (usize, usize),
    result: &CleaningResult,
) {
    let summary = result.summary();

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE ({})", cleaner);
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Input:  {} ({} rows x {} columns)",
        input.display(),
        raw_shape.0,
        raw_shape.1
    );
    match output {
        Some(path) => println!(
            "Output: {} ({} rows x {} columns)",
            path.display(),
            summary.rows_after,
            result.table.width()
        ),
        None => println!(
            "Output: not written ({} rows x {} columns)",
            summary.rows_after,
            result.table.width()
        ),
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} dropped)",
        summary.rows_before, summary.rows_after, summary.rows_dropped
    );
    println!(
        "  Values coerced: {} ({} unparseable)",
        summary.values_coerced, summary.coercion_warnings
    );
    println!("  Values filled: {}", summary.values_filled);
    println!();

    let drops: Vec<_> = summary
        .resolution
        .dropped_by_column
        .iter()
        .filter(|(_, n)| *n > 0)
        .collect();
    let fills: Vec<_> = summary
        .resolution
        .filled_by_column
        .iter()
        .filter(|(_, n)| *n > 0)
        .collect();
    if !drops.is_empty() || !fills.is_empty() {
        println!("Actions Taken:");
        for (column, n) in drops {
            println!("  - Dropped {} rows missing '{}'", n, column);
        }
        for (column, n) in fills {
            println!("  - Filled {} values in '{}'", n, column);
        }
        println!();
    }

    let warnings: Vec<_> = summary
        .coercion
        .columns
        .iter()
        .filter(|(_, c)| c.unparseable > 0)
        .collect();
    if !warnings.is_empty() {
        println!("Warnings:");
        for (column, outcome) in warnings {
            println!("  ! {} unparseable values in '{}'", outcome.unparseable, column);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Load a CSV with every column read as text, so the cleaner sees the raw
/// cell contents.
fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", path.display()));
    }
    info!("Loading dataset from: {}", path.display());

    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => {
            info!("Dataset loaded: {:?}", df.shape());
            return Ok(df);
        }
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            let cursor = std::io::Cursor::new(cleaned);

            let df = CsvReadOptions::default()
                .with_infer_schema_length(Some(0))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()?;
            info!("Dataset loaded after pre-cleaning: {:?}", df.shape());
            Ok(df)
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Collapse tripled quotes and drop blank lines.
///
/// Doubled quotes are left alone: inside a quoted field they escape a quote.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
        info!("Created output directory: {}", parent.display());
    }
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Could not create {}", path.display()))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_csv_content_keeps_escaped_quotes() {
        let raw = "name,note\n\"Ann\",\"say \"\"hi\"\" now\"\n\n\"\"\"Bob\"\"\",x\n";
        let cleaned = clean_csv_content(raw);
        assert_eq!(
            cleaned,
            "name,note\n\"Ann\",\"say \"\"hi\"\" now\"\n\"Bob\",x"
        );
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("price", 10), "price");
        assert_eq!(truncate_str("product_category_label", 10), "product...");
    }
}
