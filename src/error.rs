//! Error types for the feature-engineering pipeline.
//!
//! Malformed cell values are never errors: numeric coercion, date parsing
//! and list parsing all degrade to null/empty per the missing-value
//! contract. The variants here cover structural failures only (invalid
//! configuration, frame-level Polars errors, I/O at the edges).

use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A stage failed at the frame level.
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap an error with the stage it occurred in.
    pub fn in_stage(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PipelineError::StageFailed {
            stage: stage.into(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
