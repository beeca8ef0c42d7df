//! CLI entry point: load a CSV, run the configured imputers and the outlier
//! clipper, write the result.
//!
//! The core library is I/O-free; this binary is the data-loading
//! collaborator that constructs components from a JSON job file and orders
//! the fit/transform calls.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Deserialize;
use tabfill::{
    BinnedMedianImputer, BinnedModeImputer, BinningConfig, BinningStrategy, CategoryMedianImputer,
    CategoryModeImputer, ColumnPair, OutlierClipper, OutlierStrategy, ScalarImputer,
    ScalarStrategy,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular missing-value imputation and outlier clipping",
    long_about = "Fits group-statistic imputers, scalar imputers and outlier bounds on a \
                  CSV dataset and applies them, writing the transformed CSV.\n\n\
                  EXAMPLES:\n  \
                  # Fill and clip according to a job file\n  \
                  tabfill -i data.csv -j job.json -o cleaned.csv\n\n  \
                  # Fit on one dataset, apply to another\n  \
                  tabfill -i train.csv --apply-to test.csv -j job.json -o cleaned.csv"
)]
struct Args {
    /// Path to the CSV file to fit on
    #[arg(short, long)]
    input: String,

    /// Optional CSV to transform instead of the fitted one
    #[arg(long)]
    apply_to: Option<String>,

    /// Path to the JSON job file describing imputers and outlier strategies
    #[arg(short, long)]
    job: String,

    /// Output CSV path
    #[arg(short, long)]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Grouped-imputer section of the job file: pairs per variant plus the
/// shared binning settings for the binned variants.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobSpec {
    n_bins: Option<usize>,
    binning_strategy: Option<BinningStrategy>,
    binned_median: Vec<ColumnPair>,
    category_median: Vec<ColumnPair>,
    category_mode: Vec<ColumnPair>,
    binned_mode: Vec<ColumnPair>,
    /// Column name -> scalar strategy. BTreeMap keeps the run order stable.
    scalar: BTreeMap<String, ScalarStrategy>,
    /// Column name -> outlier strategy.
    outliers: BTreeMap<String, OutlierStrategy>,
}

impl JobSpec {
    fn binning(&self) -> BinningConfig {
        let defaults = BinningConfig::default();
        BinningConfig::new(
            self.n_bins.unwrap_or(defaults.n_bins),
            self.binning_strategy.unwrap_or(defaults.strategy),
        )
    }
}

fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path))
}

fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

fn run_job(spec: &JobSpec, fit_df: &DataFrame, apply_df: &DataFrame) -> Result<DataFrame> {
    let mut working = apply_df.clone();

    if !spec.binned_median.is_empty() {
        let mut imputer = BinnedMedianImputer::new(spec.binned_median.clone(), spec.binning());
        imputer.fit(fit_df)?;
        working = imputer.transform(&working)?;
    }
    if !spec.category_median.is_empty() {
        let mut imputer = CategoryMedianImputer::new(spec.category_median.clone());
        imputer.fit(fit_df)?;
        working = imputer.transform(&working)?;
    }
    if !spec.category_mode.is_empty() {
        let mut imputer = CategoryModeImputer::new(spec.category_mode.clone());
        imputer.fit(fit_df)?;
        working = imputer.transform(&working)?;
    }
    if !spec.binned_mode.is_empty() {
        let mut imputer = BinnedModeImputer::new(spec.binned_mode.clone(), spec.binning());
        imputer.fit(fit_df)?;
        working = imputer.transform(&working)?;
    }
    if !spec.scalar.is_empty() {
        let strategies: Vec<_> = spec
            .scalar
            .iter()
            .map(|(c, s)| (c.clone(), s.clone()))
            .collect();
        let mut imputer = ScalarImputer::new(strategies);
        imputer.fit(fit_df)?;
        working = imputer.transform(&working)?;
    }
    if !spec.outliers.is_empty() {
        let strategies: Vec<_> = spec
            .outliers
            .iter()
            .map(|(c, s)| (c.clone(), s.clone()))
            .collect();
        let mut clipper = OutlierClipper::new(strategies);
        clipper.fit(fit_df)?;
        working = clipper.transform(&working)?;
    }

    Ok(working)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    let job_text = std::fs::read_to_string(&args.job)
        .with_context(|| format!("Job file not found: {}", args.job))?;
    let spec: JobSpec = serde_json::from_str(&job_text).context("Invalid job file")?;

    info!("Loading dataset from: {}", args.input);
    let fit_df = load_csv(&args.input)?;
    info!("Dataset loaded: {:?}", fit_df.shape());

    let apply_df = match &args.apply_to {
        Some(path) => {
            info!("Applying to: {}", path);
            load_csv(path)?
        }
        None => fit_df.clone(),
    };

    let before = null_counts(&apply_df);
    let mut result = run_job(&spec, &fit_df, &apply_df)?;
    let after = null_counts(&result);

    info!("Missing cells before: {:?}", before);
    info!("Missing cells after:  {:?}", after);

    let mut file = std::fs::File::create(&args.output)
        .with_context(|| format!("Cannot create output file: {}", args.output))?;
    CsvWriter::new(&mut file).finish(&mut result)?;
    info!("Wrote {} rows to {}", result.height(), args.output);

    Ok(())
}
