//! Summary types describing what the pipeline did to a dataset.

use serde::{Deserialize, Serialize};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Column dropping, row filtering and deduplication.
    Cleaning,
    /// Financial column coercion and positivity enforcement.
    Normalizing,
    /// List parsing, calendar and log-transform derivation.
    FeatureEngineering,
    /// One-hot and top-K categorical encoding.
    Encoding,
}

impl Stage {
    /// Human-readable display name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cleaning => "Cleaning",
            Self::Normalizing => "Numeric Normalizing",
            Self::FeatureEngineering => "Feature Engineering",
            Self::Encoding => "ML Feature Encoding",
        }
    }
}

/// A single action taken during pipeline execution, for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageAction {
    /// Stage the action belongs to.
    pub stage: Stage,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
}

impl StageAction {
    pub fn new(stage: Stage, target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stage,
            target: target.into(),
            description: description.into(),
        }
    }
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows before processing.
    pub rows_before: usize,
    /// Number of rows after processing.
    pub rows_after: usize,

    /// Number of columns before processing.
    pub columns_before: usize,
    /// Number of columns after processing.
    pub columns_after: usize,

    /// Actions taken, in execution order.
    pub actions: Vec<StageAction>,
}

impl PipelineSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action in the audit trail.
    pub fn add_action(&mut self, action: StageAction) {
        self.actions.push(action);
    }

    /// Number of rows removed across all stages.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed() as f64 / self.rows_before as f64) * 100.0
        }
    }
}
