//! Pipeline orchestration.
//!
//! Runs the four stages in order — cleaning, financial normalization,
//! feature engineering, ML feature encoding — each a whole-table
//! transformation taking ownership of the frame and returning a new one.

use crate::cleaner::Cleaner;
use crate::config::PipelineConfig;
use crate::encoding::MlFeaturePreparer;
use crate::error::Result;
use crate::features::FeatureEngineer;
use crate::financial::FinancialNormalizer;
use crate::types::{PipelineSummary, Stage};
use polars::prelude::*;
use std::time::Instant;
use tracing::info;

/// Result of a pipeline run: the transformed frame plus an audit summary.
#[derive(Debug)]
pub struct PipelineRun {
    pub data: DataFrame,
    pub summary: PipelineSummary,
}

/// The feature-engineering pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use movie_features::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder().top_k(20).build()?;
/// let run = Pipeline::new(config).run(df)?;
/// println!("{} rows survived", run.data.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
}

// The pipeline runs synchronously but may be handed to a worker thread.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all four stages over the frame.
    ///
    /// The input frame is consumed; rows are only removed, never added,
    /// and the encoding stage only appends columns. A zero-row frame is
    /// valid input at every stage.
    pub fn run(&self, df: DataFrame) -> Result<PipelineRun> {
        let start = Instant::now();
        let mut summary = PipelineSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        info!(rows = df.height(), columns = df.width(), "starting pipeline");

        info!(stage = Stage::Cleaning.display_name(), "running stage");
        let (df, actions) = Cleaner::clean(df, &self.config)?;
        summary.actions.extend(actions);

        info!(stage = Stage::Normalizing.display_name(), "running stage");
        let (df, actions) = FinancialNormalizer::normalize(df, &self.config)?;
        summary.actions.extend(actions);

        info!(stage = Stage::FeatureEngineering.display_name(), "running stage");
        let (df, actions) = FeatureEngineer::engineer(df, &self.config)?;
        summary.actions.extend(actions);

        info!(stage = Stage::Encoding.display_name(), "running stage");
        let (df, actions) = MlFeaturePreparer::prepare(df, &self.config)?;
        summary.actions.extend(actions);

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            rows = df.height(),
            columns = df.width(),
            removed = summary.rows_removed(),
            duration_ms = summary.duration_ms,
            "pipeline complete"
        );

        Ok(PipelineRun { data: df, summary })
    }
}
