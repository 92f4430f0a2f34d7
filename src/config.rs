//! Configuration types for the feature-engineering pipeline.
//!
//! This module reifies the thresholds and column names that tend to drift
//! between ad hoc copies of the same cleaning script into one struct with
//! named, documented defaults. Use the builder for fluent setup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default columns dropped by the cleaner: image paths, external
/// identifiers and free-text fields with no modelling value.
pub const DEFAULT_DROP_COLUMNS: [&str; 7] = [
    "poster_path",
    "backdrop_path",
    "homepage",
    "imdb_id",
    "original_title",
    "overview",
    "tagline",
];

/// Default list-valued columns parsed by the feature engineer.
pub const DEFAULT_LIST_COLUMNS: [&str; 4] = [
    "genres",
    "production_companies",
    "production_countries",
    "spoken_languages",
];

/// Minimum-engagement row filter for the cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngagementFilter {
    /// No engagement filtering.
    Disabled,
    /// Keep rows where `column >= min`.
    Single { column: String, min: f64 },
    /// Keep rows where either threshold is met. Schema variants carry the
    /// vote count under different names (e.g. `vote_count` vs
    /// `imdb_votes`); a row passes if any present column clears its bar.
    Either {
        primary: (String, f64),
        secondary: (String, f64),
    },
}

impl Default for EngagementFilter {
    fn default() -> Self {
        EngagementFilter::Single {
            column: "vote_count".to_string(),
            min: 100.0,
        }
    }
}

/// Configuration for the full pipeline.
///
/// Use [`PipelineConfig::builder()`] for fluent construction, or
/// deserialize from JSON. Defaults reproduce the reference movie-dataset
/// pipeline (TMDB-style schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // ---- Cleaner ----
    /// Low-information columns removed unconditionally when present.
    pub drop_columns: Vec<String>,
    /// Identifier column used for deduplication. Default: "id"
    pub id_column: String,
    /// Whether to deduplicate by identifier (first occurrence wins).
    /// Default: true
    pub deduplicate: bool,
    /// Primary financial column that must be non-missing. Default: "budget"
    pub budget_column: String,
    /// Whether rows missing the budget column value are dropped.
    /// Default: true
    pub require_budget: bool,
    /// Minimum-engagement filter. Default: `vote_count >= 100`
    pub engagement: EngagementFilter,
    /// Status column and the accepted sentinel value. Rows with any other
    /// or missing status are dropped. Default: ("status", "Released")
    pub status_column: String,
    pub accepted_status: Option<String>,
    /// Rating column that must be non-missing. Default: "vote_average"
    pub rating_column: String,
    /// Whether rows missing a rating are dropped. Default: true
    pub require_rating: bool,

    // ---- Numeric normalizer ----
    /// Financial columns coerced to numeric. Default: ["budget", "revenue"]
    pub financial_columns: Vec<String>,
    /// Treat exact zero as missing in financial columns. Default: true
    pub zero_is_missing: bool,
    /// Drop rows where any financial column is missing after coercion.
    /// Default: true
    pub drop_missing_financial: bool,
    /// Per-column exclusive lower bounds. Columns not listed use
    /// [`PipelineConfig::DEFAULT_FLOOR`] (plain positivity).
    pub financial_floors: HashMap<String, f64>,

    // ---- Feature engineer ----
    /// List-valued columns to parse into string sequences.
    pub list_columns: Vec<String>,
    /// Multi-valued entity column for count/top-N derivation.
    /// Default: Some("production_companies")
    pub count_column: Option<String>,
    /// Length of the derived top-N truncated sequence. Default: Some(3)
    pub top_n: Option<usize>,
    /// Release date column. Default: "release_date"
    pub date_column: String,
    /// Date formats tried in order (chrono syntax). Default: ["%Y-%m-%d"]
    pub date_formats: Vec<String>,
    /// Columns receiving a `<col>_log` = ln(1 + x) transform when present.
    /// Default: ["budget", "revenue", "popularity"]
    pub log_columns: Vec<String>,

    // ---- ML feature preparer ----
    /// Small-cardinality list column for full one-hot expansion, with the
    /// indicator name prefix. Default: Some(("genres", "genre"))
    pub onehot_column: Option<(String, String)>,
    /// High-cardinality list column for top-K expansion, with prefix.
    /// Default: Some(("production_companies", "company"))
    pub topk_column: Option<(String, String)>,
    /// Number of most frequent tokens kept in the top-K expansion.
    /// Default: 10
    pub top_k: usize,
    /// Scalar categorical column for one-hot expansion, with prefix.
    /// Default: Some(("release_season", "season"))
    pub scalar_onehot_column: Option<(String, String)>,
}

impl PipelineConfig {
    /// Exclusive lower bound applied to financial columns without an
    /// explicit floor: values must be strictly positive.
    pub const DEFAULT_FLOOR: f64 = 0.0;

    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.top_k == 0 {
            return Err(ConfigValidationError::InvalidTopK(self.top_k));
        }
        if let Some(0) = self.top_n {
            return Err(ConfigValidationError::InvalidTopN(0));
        }
        match &self.engagement {
            EngagementFilter::Single { min, .. } if !min.is_finite() => {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: "engagement.min".to_string(),
                    value: *min,
                });
            }
            EngagementFilter::Either {
                primary: (_, t1),
                secondary: (_, t2),
            } if !t1.is_finite() || !t2.is_finite() => {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: "engagement".to_string(),
                    value: if t1.is_finite() { *t2 } else { *t1 },
                });
            }
            _ => {}
        }
        for (col, floor) in &self.financial_floors {
            if !floor.is_finite() {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: format!("financial_floors.{col}"),
                    value: *floor,
                });
            }
        }
        if self.date_formats.is_empty() {
            return Err(ConfigValidationError::EmptyDateFormats);
        }
        Ok(())
    }

    /// Exclusive lower bound for a financial column.
    pub fn floor_for(&self, column: &str) -> f64 {
        self.financial_floors
            .get(column)
            .copied()
            .unwrap_or(Self::DEFAULT_FLOOR)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
            id_column: "id".to_string(),
            deduplicate: true,
            budget_column: "budget".to_string(),
            require_budget: true,
            engagement: EngagementFilter::default(),
            status_column: "status".to_string(),
            accepted_status: Some("Released".to_string()),
            rating_column: "vote_average".to_string(),
            require_rating: true,
            financial_columns: vec!["budget".to_string(), "revenue".to_string()],
            zero_is_missing: true,
            drop_missing_financial: true,
            financial_floors: HashMap::new(),
            list_columns: DEFAULT_LIST_COLUMNS.iter().map(|s| s.to_string()).collect(),
            count_column: Some("production_companies".to_string()),
            top_n: Some(3),
            date_column: "release_date".to_string(),
            date_formats: vec!["%Y-%m-%d".to_string()],
            log_columns: vec![
                "budget".to_string(),
                "revenue".to_string(),
                "popularity".to_string(),
            ],
            onehot_column: Some(("genres".to_string(), "genre".to_string())),
            topk_column: Some(("production_companies".to_string(), "company".to_string())),
            top_k: 10,
            scalar_onehot_column: Some(("release_season".to_string(), "season".to_string())),
        }
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be finite)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid top-K limit: {0} (must be at least 1)")]
    InvalidTopK(usize),

    #[error("Invalid top-N truncation length: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("At least one date format is required")]
    EmptyDateFormats,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Replace the set of columns dropped by the cleaner.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the identifier column used for deduplication.
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.config.id_column = column.into();
        self
    }

    /// Enable or disable deduplication by identifier.
    pub fn deduplicate(mut self, dedup: bool) -> Self {
        self.config.deduplicate = dedup;
        self
    }

    /// Enable or disable the budget-presence filter.
    pub fn require_budget(mut self, require: bool) -> Self {
        self.config.require_budget = require;
        self
    }

    /// Set the minimum-engagement filter.
    pub fn engagement(mut self, filter: EngagementFilter) -> Self {
        self.config.engagement = filter;
        self
    }

    /// Set the accepted status sentinel, or `None` to disable the filter.
    pub fn accepted_status(mut self, status: Option<String>) -> Self {
        self.config.accepted_status = status;
        self
    }

    /// Enable or disable the rating-presence filter.
    pub fn require_rating(mut self, require: bool) -> Self {
        self.config.require_rating = require;
        self
    }

    /// Replace the set of financial columns to normalize.
    pub fn financial_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.financial_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable zero-as-missing in financial columns.
    pub fn zero_is_missing(mut self, enabled: bool) -> Self {
        self.config.zero_is_missing = enabled;
        self
    }

    /// Enable or disable dropping rows with missing financial values.
    pub fn drop_missing_financial(mut self, enabled: bool) -> Self {
        self.config.drop_missing_financial = enabled;
        self
    }

    /// Set an exclusive lower bound for one financial column.
    pub fn financial_floor(mut self, column: impl Into<String>, floor: f64) -> Self {
        self.config.financial_floors.insert(column.into(), floor);
        self
    }

    /// Replace the set of list-valued columns to parse.
    pub fn list_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.list_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the multi-valued entity column for count/top-N derivation,
    /// or `None` to disable.
    pub fn count_column(mut self, column: Option<String>) -> Self {
        self.config.count_column = column;
        self
    }

    /// Set the top-N truncation length, or `None` to skip the column.
    pub fn top_n(mut self, n: Option<usize>) -> Self {
        self.config.top_n = n;
        self
    }

    /// Set the release date column.
    pub fn date_column(mut self, column: impl Into<String>) -> Self {
        self.config.date_column = column.into();
        self
    }

    /// Replace the list of date formats tried in order.
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.date_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the set of columns receiving a log transform.
    pub fn log_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.log_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the full one-hot column and prefix, or `None` to disable.
    pub fn onehot_column(mut self, column: Option<(String, String)>) -> Self {
        self.config.onehot_column = column;
        self
    }

    /// Set the top-K one-hot column and prefix, or `None` to disable.
    pub fn topk_column(mut self, column: Option<(String, String)>) -> Self {
        self.config.topk_column = column;
        self
    }

    /// Set the top-K cardinality limit.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the scalar one-hot column and prefix, or `None` to disable.
    pub fn scalar_onehot_column(mut self, column: Option<(String, String)>) -> Self {
        self.config.scalar_onehot_column = column;
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
