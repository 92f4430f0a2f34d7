//! Movie Dataset Feature-Engineering Pipeline
//!
//! Cleans and enriches a tabular dataset of movie records into
//! analysis/ML-ready features, built on Polars.
//!
//! # Overview
//!
//! The pipeline is a sequence of four ordered, deterministic stages, each
//! consuming a full `DataFrame` and producing a new one:
//!
//! - **Cleaner**: drops low-information columns, filters rows on
//!   financial/engagement/status/rating quality and deduplicates by
//!   identifier (first occurrence wins).
//! - **Numeric Normalizer**: coerces financial columns to numeric, treats
//!   zero as missing and enforces per-column positivity floors.
//! - **Feature Engineer**: parses delimited or literal-encoded list
//!   columns, derives counts, calendar features (year, month, day-of-week,
//!   season, weekend flag) and log transforms.
//! - **ML Feature Preparer**: one-hot indicator encoding, including
//!   cardinality-limited top-K expansion for high-cardinality categories.
//!
//! Malformed values degrade to missing rather than erroring, and every
//! transformation silently skips when its input column is absent, so the
//! same pipeline runs over schema variants.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use movie_features::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("movies.csv".into()))?
//!     .finish()?;
//!
//! let config = PipelineConfig::builder()
//!     .top_k(20)
//!     .financial_floor("budget", 10_000.0)
//!     .build()?;
//!
//! let run = Pipeline::new(config).run(df)?;
//! println!("{} rows, {} columns", run.data.height(), run.data.width());
//! for action in &run.summary.actions {
//!     println!("[{:?}] {}: {}", action.stage, action.target, action.description);
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod financial;
pub mod pipeline;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::Cleaner;
pub use config::{
    ConfigValidationError, EngagementFilter, PipelineConfig, PipelineConfigBuilder,
};
pub use encoding::MlFeaturePreparer;
pub use error::{PipelineError, Result as PipelineResult};
pub use features::FeatureEngineer;
pub use features::calendar::{CalendarFields, month_to_season, parse_date};
pub use features::lists::parse_list_cell;
pub use financial::FinancialNormalizer;
pub use pipeline::{Pipeline, PipelineRun};
pub use types::{PipelineSummary, Stage, StageAction};
pub use utils::{clean_numeric_string, has_column, parse_numeric_string};
