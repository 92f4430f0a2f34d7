//! Dataset cleaning stage.
//!
//! Drops low-information columns, applies configurable row-quality
//! filters and deduplicates by identifier. Every filter is a pass-through
//! when its target column is absent, so the same pipeline runs over
//! schema variants that carry different subsets of columns.

use crate::config::{EngagementFilter, PipelineConfig};
use crate::error::Result;
use crate::types::{Stage, StageAction};
use crate::utils::{has_column, to_float64};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Cleaning stage: column dropping, row filters, deduplication.
pub struct Cleaner;

impl Cleaner {
    /// Clean the dataset per the configured filters.
    ///
    /// Row filters apply conjunctively in a fixed order: budget presence,
    /// engagement threshold, accepted status, rating presence. Rows are
    /// only removed, never added; input row order is preserved.
    pub fn clean(
        df: DataFrame,
        config: &PipelineConfig,
    ) -> Result<(DataFrame, Vec<StageAction>)> {
        let mut actions = Vec::new();
        let mut df = df;

        // 1. Unconditionally drop configured low-information columns.
        let present: Vec<PlSmallStr> = config
            .drop_columns
            .iter()
            .filter(|c| has_column(&df, c))
            .map(|s| s.as_str().into())
            .collect();
        if !present.is_empty() {
            df = df.drop_many(present.clone());
            actions.push(StageAction::new(
                Stage::Cleaning,
                "dataset",
                format!("Dropped {} low-information columns: {:?}", present.len(), present),
            ));
        }

        // 2. Require the primary financial field to be present.
        if config.require_budget {
            if has_column(&df, &config.budget_column) {
                let before = df.height();
                let mask = df
                    .column(&config.budget_column)?
                    .as_materialized_series()
                    .is_not_null();
                df = df.filter(&mask)?;
                record_removed(&mut actions, &config.budget_column, before, df.height(), "missing budget");
            } else {
                debug!(column = %config.budget_column, "skipping budget filter: column absent");
            }
        }

        // 3. Minimum-engagement threshold.
        df = Self::apply_engagement_filter(df, config, &mut actions)?;

        // 4. Accepted-status sentinel. Rows with other or missing status drop.
        if let Some(accepted) = &config.accepted_status {
            if has_column(&df, &config.status_column) {
                let before = df.height();
                let series = df
                    .column(&config.status_column)?
                    .as_materialized_series()
                    .cast(&DataType::String)?;
                let str_series = series.str()?;
                let keep: Vec<bool> = str_series
                    .into_iter()
                    .map(|opt| opt.map(|v| v.trim() == accepted.as_str()).unwrap_or(false))
                    .collect();
                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                df = df.filter(&mask)?;
                record_removed(&mut actions, &config.status_column, before, df.height(), "non-accepted status");
            } else {
                debug!(column = %config.status_column, "skipping status filter: column absent");
            }
        }

        // 5. Require the rating field to be non-missing.
        if config.require_rating {
            if has_column(&df, &config.rating_column) {
                let before = df.height();
                let mask = df
                    .column(&config.rating_column)?
                    .as_materialized_series()
                    .is_not_null();
                df = df.filter(&mask)?;
                record_removed(&mut actions, &config.rating_column, before, df.height(), "missing rating");
            } else {
                debug!(column = %config.rating_column, "skipping rating filter: column absent");
            }
        }

        // 6. Deduplicate by identifier, first occurrence wins. Rows with a
        // missing identifier are removed as well.
        if config.deduplicate {
            if has_column(&df, &config.id_column) {
                let before = df.height();
                let series = df.column(&config.id_column)?.as_materialized_series().clone();
                let mut seen: HashSet<String> = HashSet::with_capacity(df.height());
                let mut keep = Vec::with_capacity(df.height());
                for i in 0..df.height() {
                    let value = series.get(i)?;
                    if matches!(value, AnyValue::Null) {
                        keep.push(false);
                        continue;
                    }
                    keep.push(seen.insert(value.to_string()));
                }
                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                df = df.filter(&mask)?;
                record_removed(&mut actions, &config.id_column, before, df.height(), "duplicate or missing identifier");
            } else {
                debug!(column = %config.id_column, "skipping deduplication: identifier column absent");
            }
        }

        Ok((df, actions))
    }

    fn apply_engagement_filter(
        df: DataFrame,
        config: &PipelineConfig,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        match &config.engagement {
            EngagementFilter::Disabled => Ok(df),
            EngagementFilter::Single { column, min } => {
                let Some(keep) = threshold_mask(&df, column, *min)? else {
                    debug!(column = %column, "skipping engagement filter: column absent or non-numeric");
                    return Ok(df);
                };
                let before = df.height();
                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                let df = df.filter(&mask)?;
                record_removed(actions, column, before, df.height(), "below engagement threshold");
                Ok(df)
            }
            EngagementFilter::Either { primary, secondary } => {
                let first = threshold_mask(&df, &primary.0, primary.1)?;
                let second = threshold_mask(&df, &secondary.0, secondary.1)?;
                let keep = match (first, second) {
                    (None, None) => {
                        debug!(
                            primary = %primary.0,
                            secondary = %secondary.0,
                            "skipping engagement filter: neither column present"
                        );
                        return Ok(df);
                    }
                    (Some(a), None) => a,
                    (None, Some(b)) => b,
                    (Some(a), Some(b)) => {
                        a.iter().zip(b.iter()).map(|(x, y)| *x || *y).collect()
                    }
                };
                let before = df.height();
                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                let df = df.filter(&mask)?;
                record_removed(
                    actions,
                    &format!("{}|{}", primary.0, secondary.0),
                    before,
                    df.height(),
                    "below engagement threshold",
                );
                Ok(df)
            }
        }
    }
}

/// Per-row `value >= min` for a numeric-coercible column. `None` when the
/// column is absent or cannot be coerced; null cells fail the threshold.
fn threshold_mask(df: &DataFrame, column: &str, min: f64) -> Result<Option<Vec<bool>>> {
    if !has_column(df, column) {
        return Ok(None);
    }
    let series = df.column(column)?.as_materialized_series();
    let Some(floats) = to_float64(series) else {
        return Ok(None);
    };
    let ca = floats.f64()?;
    Ok(Some(
        ca.into_iter()
            .map(|opt| opt.map(|v| v >= min).unwrap_or(false))
            .collect(),
    ))
}

fn record_removed(
    actions: &mut Vec<StageAction>,
    target: &str,
    before: usize,
    after: usize,
    reason: &str,
) {
    let removed = before - after;
    if removed > 0 {
        debug!(column = target, removed, reason, "rows removed");
        actions.push(StageAction::new(
            Stage::Cleaning,
            target,
            format!("Removed {removed} rows: {reason}"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_df() -> DataFrame {
        df!(
            "id" => ["1", "2", "2", "3", "4"],
            "budget" => [Some(100.0), Some(200.0), Some(250.0), None, Some(400.0)],
            "vote_count" => [150.0, 200.0, 300.0, 400.0, 50.0],
            "vote_average" => [Some(7.1), Some(6.0), Some(6.5), Some(8.0), Some(5.5)],
            "status" => ["Released", "Released", "Released", "Released", "Released"],
            "homepage" => ["a", "b", "c", "d", "e"],
        )
        .unwrap()
    }

    #[test]
    fn test_drops_configured_columns() {
        let (df, _) = Cleaner::clean(sample_df(), &PipelineConfig::default()).unwrap();
        assert!(!has_column(&df, "homepage"));
        assert!(has_column(&df, "budget"));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let (df, _) = Cleaner::clean(sample_df(), &PipelineConfig::default()).unwrap();
        // id "2" appears twice; the first copy (budget 200.0) survives.
        // id "3" drops for missing budget, id "4" for low vote_count.
        let ids: Vec<Option<&str>> = df.column("id").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some("1"), Some("2")]);
        let budgets: Vec<Option<f64>> =
            df.column("budget").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(budgets[1], Some(200.0));
    }

    #[test]
    fn test_status_filter_drops_other_and_missing() {
        let df = df!(
            "status" => [Some("Released"), Some("Post Production"), None],
            "title" => ["a", "b", "c"],
        )
        .unwrap();
        let config = PipelineConfig::builder()
            .require_budget(false)
            .require_rating(false)
            .deduplicate(false)
            .engagement(EngagementFilter::Disabled)
            .build()
            .unwrap();
        let (df, _) = Cleaner::clean(df, &config).unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_engagement_either_mode() {
        let df = df!(
            "vote_count" => [Some(10.0), Some(200.0), None],
            "imdb_votes" => [Some(5000.0), Some(1.0), Some(2.0)],
        )
        .unwrap();
        let config = PipelineConfig::builder()
            .require_budget(false)
            .require_rating(false)
            .deduplicate(false)
            .accepted_status(None)
            .engagement(EngagementFilter::Either {
                primary: ("vote_count".to_string(), 100.0),
                secondary: ("imdb_votes".to_string(), 1000.0),
            })
            .build()
            .unwrap();
        let (df, _) = Cleaner::clean(df, &config).unwrap();
        // Row 0 passes via imdb_votes, row 1 via vote_count, row 2 fails both.
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_absent_columns_are_skipped() {
        let df = df!("title" => ["a", "b"]).unwrap();
        let (df, actions) = Cleaner::clean(df, &PipelineConfig::default()).unwrap();
        assert_eq!(df.height(), 2);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_empty_table_passes_through() {
        let df = df!(
            "id" => Vec::<String>::new(),
            "budget" => Vec::<f64>::new(),
        )
        .unwrap();
        let (df, _) = Cleaner::clean(df, &PipelineConfig::default()).unwrap();
        assert_eq!(df.height(), 0);
    }
}
