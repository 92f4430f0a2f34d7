//! Financial column normalization stage.
//!
//! Coerces the configured financial columns to `Float64`, treats exact
//! zero as missing, drops rows lacking required values and enforces
//! per-column exclusive lower bounds. Absent columns are left untouched.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::{Stage, StageAction};
use crate::utils::{has_column, to_float64};
use polars::prelude::*;
use tracing::debug;

/// Numeric normalizer for financial columns.
pub struct FinancialNormalizer;

impl FinancialNormalizer {
    /// Normalize the configured financial columns.
    ///
    /// Coercion failures become nulls, never errors. A budget of `0`
    /// after normalization is treated identically to an absent budget.
    pub fn normalize(
        df: DataFrame,
        config: &PipelineConfig,
    ) -> Result<(DataFrame, Vec<StageAction>)> {
        let mut actions = Vec::new();
        let mut df = df;

        let present: Vec<String> = config
            .financial_columns
            .iter()
            .filter(|c| has_column(&df, c))
            .cloned()
            .collect();

        if present.is_empty() {
            debug!("skipping financial normalization: no configured columns present");
            return Ok((df, actions));
        }

        // 1. Coerce each present column to Float64, zero becoming null
        // when configured.
        for col_name in &present {
            let series = df.column(col_name)?.as_materialized_series();
            let Some(floats) = to_float64(series) else {
                debug!(column = %col_name, "skipping coercion: unsupported dtype");
                continue;
            };
            let floats = if config.zero_is_missing {
                let ca = floats.f64()?;
                let values: Vec<Option<f64>> = ca
                    .into_iter()
                    .map(|opt| opt.filter(|v| *v != 0.0))
                    .collect();
                Series::new(col_name.as_str().into(), values)
            } else {
                floats
            };
            df.replace(col_name, floats)?;
            actions.push(StageAction::new(
                Stage::Normalizing,
                col_name.clone(),
                "Coerced to numeric (zero and unparseable values become missing)",
            ));
        }

        // 2. Drop rows missing any required financial value.
        if config.drop_missing_financial {
            let before = df.height();
            let mut keep = vec![true; df.height()];
            for col_name in &present {
                let series = df.column(col_name)?.as_materialized_series();
                let not_null = series.is_not_null();
                for (i, flag) in not_null.into_iter().enumerate() {
                    if !flag.unwrap_or(false) {
                        keep[i] = false;
                    }
                }
            }
            let mask = BooleanChunked::from_slice("mask".into(), &keep);
            df = df.filter(&mask)?;
            let removed = before - df.height();
            if removed > 0 {
                actions.push(StageAction::new(
                    Stage::Normalizing,
                    "dataset",
                    format!("Removed {removed} rows with missing financial values"),
                ));
            }
        }

        // 3. Enforce per-column exclusive lower bounds.
        for col_name in &present {
            let floor = config.floor_for(col_name);
            let series = df.column(col_name)?.as_materialized_series();
            let Ok(ca) = series.f64() else {
                continue;
            };
            let keep: Vec<bool> = ca
                .into_iter()
                .map(|opt| opt.map(|v| v > floor).unwrap_or(!config.drop_missing_financial))
                .collect();
            let before = df.height();
            let mask = BooleanChunked::from_slice("mask".into(), &keep);
            df = df.filter(&mask)?;
            let removed = before - df.height();
            if removed > 0 {
                actions.push(StageAction::new(
                    Stage::Normalizing,
                    col_name.clone(),
                    format!("Removed {removed} rows with {col_name} <= {floor}"),
                ));
            }
        }

        Ok((df, actions))
    }
}
