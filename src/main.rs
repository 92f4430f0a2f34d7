//! CLI entry point for the movie feature-engineering pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use movie_features::{EngagementFilter, Pipeline, PipelineConfig};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "movie-features",
    about = "Clean a movie dataset and derive analysis/ML-ready features"
)]
struct Args {
    /// Input CSV file with a header row.
    input: PathBuf,

    /// Output CSV file for the transformed table.
    #[arg(short, long, default_value = "features.csv")]
    output: PathBuf,

    /// JSON pipeline configuration file. CLI flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum vote count a row must reach to be kept.
    #[arg(long)]
    min_votes: Option<f64>,

    /// Number of most frequent companies kept in the top-K expansion.
    #[arg(long)]
    top_k: Option<usize>,

    /// Exclusive lower bound enforced on the budget column.
    #[arg(long)]
    budget_floor: Option<f64>,

    /// Disable deduplication by identifier.
    #[arg(long)]
    no_dedup: bool,

    /// Keep zero values in financial columns instead of treating them
    /// as missing.
    #[arg(long)]
    keep_zero: bool,
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(min) = args.min_votes {
        config.engagement = EngagementFilter::Single {
            column: "vote_count".to_string(),
            min,
        };
    }
    if let Some(k) = args.top_k {
        config.top_k = k;
    }
    if let Some(floor) = args.budget_floor {
        config.financial_floors.insert("budget".to_string(), floor);
    }
    if args.no_dedup {
        config.deduplicate = false;
    }
    if args.keep_zero {
        config.zero_is_missing = false;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Rejoin parsed list columns into comma-separated text so the frame can
/// be written as CSV.
fn stringify_list_columns(mut df: DataFrame) -> Result<DataFrame> {
    let list_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::List(_)))
        .map(|c| c.name().to_string())
        .collect();

    for col_name in list_columns {
        let series = df.column(&col_name)?.as_materialized_series().clone();
        let list_ca = series.list()?;
        let mut joined: Vec<String> = Vec::with_capacity(list_ca.len());
        for opt_inner in list_ca.into_iter() {
            let text = match opt_inner {
                Some(inner) => inner
                    .str()?
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", "),
                None => String::new(),
            };
            joined.push(text);
        }
        df.replace(&col_name, Series::new(col_name.as_str().into(), joined))?;
    }
    Ok(df)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(args.input.clone()))
        .with_context(|| format!("opening {}", args.input.display()))?
        .finish()
        .with_context(|| format!("reading {}", args.input.display()))?;

    let run = Pipeline::new(config).run(df)?;

    info!(
        rows_before = run.summary.rows_before,
        rows_after = run.summary.rows_after,
        columns_after = run.summary.columns_after,
        "pipeline finished"
    );
    for action in &run.summary.actions {
        info!(column = %action.target, "{}", action.description);
    }

    let mut df = stringify_list_columns(run.data)?;
    let mut file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!(output = %args.output.display(), "wrote transformed dataset");
    Ok(())
}
