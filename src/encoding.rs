//! ML feature preparation stage: one-hot indicator encoding.
//!
//! Operates on the already-parsed list columns, not raw text. Every
//! expansion is data-driven: indicator columns exist only for observed
//! values, so callers must not assume a fixed output schema across
//! datasets. All three expansions are two-phase: a full-table aggregate
//! pass (distinct set or frequency table), then a per-row annotate pass.
//! The stage only appends columns; it never mutates or removes one.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::{Stage, StageAction};
use crate::utils::has_column;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// ML feature preparer: categorical one-hot expansion.
pub struct MlFeaturePreparer;

impl MlFeaturePreparer {
    pub fn prepare(
        df: DataFrame,
        config: &PipelineConfig,
    ) -> Result<(DataFrame, Vec<StageAction>)> {
        let mut actions = Vec::new();
        let mut df = df;

        if let Some((column, prefix)) = &config.onehot_column {
            df = Self::expand_full(df, column, prefix, &mut actions)?;
        }
        if let Some((column, prefix)) = &config.topk_column {
            df = Self::expand_top_k(df, column, prefix, config.top_k, &mut actions)?;
        }
        if let Some((column, prefix)) = &config.scalar_onehot_column {
            df = Self::expand_scalar(df, column, prefix, &mut actions)?;
        }

        Ok((df, actions))
    }

    /// Full one-hot expansion over a small-cardinality list column: one
    /// indicator per distinct trimmed token, in first-seen order.
    fn expand_full(
        mut df: DataFrame,
        column: &str,
        prefix: &str,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        let Some(rows) = collect_token_rows(&df, column)? else {
            debug!(column, "skipping one-hot expansion: column absent or not a list");
            return Ok(df);
        };

        let tokens = distinct_in_order(&rows);
        for token in &tokens {
            let indicator: Vec<i32> = rows
                .iter()
                .map(|row| i32::from(row.iter().any(|t| t == token)))
                .collect();
            let name = format!("{prefix}_{token}");
            df.with_column(Series::new(name.as_str().into(), indicator))?;
        }
        if !tokens.is_empty() {
            actions.push(StageAction::new(
                Stage::Encoding,
                column,
                format!("One-hot encoded {} distinct tokens", tokens.len()),
            ));
        }
        Ok(df)
    }

    /// Top-K one-hot expansion over a high-cardinality list column.
    ///
    /// Token frequencies are computed over the whole table; the K most
    /// frequent tokens are selected with ties broken by first-seen order,
    /// which makes the output deterministic for any row permutation that
    /// preserves first occurrences. Alongside the per-token indicators an
    /// aggregate `has_top_<prefix>` column marks rows containing any
    /// selected token.
    fn expand_top_k(
        mut df: DataFrame,
        column: &str,
        prefix: &str,
        k: usize,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        let Some(rows) = collect_token_rows(&df, column)? else {
            debug!(column, "skipping top-K expansion: column absent or not a list");
            return Ok(df);
        };

        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in &rows {
            for token in row {
                let next_index = first_seen.len();
                first_seen.entry(token.as_str()).or_insert(next_index);
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<&str> = counts.keys().copied().collect();
        ranked.sort_by_key(|t| (std::cmp::Reverse(counts[t]), first_seen[t]));
        ranked.truncate(k);

        if ranked.is_empty() {
            return Ok(df);
        }

        let top_set: std::collections::HashSet<&str> = ranked.iter().copied().collect();
        let mut aggregate: Vec<i32> = Vec::with_capacity(rows.len());
        for row in &rows {
            aggregate.push(i32::from(
                row.iter().any(|t| top_set.contains(t.as_str())),
            ));
        }

        let ranked: Vec<String> = ranked.into_iter().map(str::to_string).collect();
        for token in &ranked {
            let indicator: Vec<i32> = rows
                .iter()
                .map(|row| i32::from(row.iter().any(|t| t == token)))
                .collect();
            let name = format!("{prefix}_{token}");
            df.with_column(Series::new(name.as_str().into(), indicator))?;
        }
        let aggregate_name = format!("has_top_{prefix}");
        df.with_column(Series::new(aggregate_name.as_str().into(), aggregate))?;

        actions.push(StageAction::new(
            Stage::Encoding,
            column,
            format!("Top-{k} one-hot encoded {} tokens", ranked.len()),
        ));
        Ok(df)
    }

    /// One-hot expansion over a scalar categorical column: one indicator
    /// per distinct observed value, in first-seen order. Rows with a
    /// missing value get 0 in every indicator.
    fn expand_scalar(
        mut df: DataFrame,
        column: &str,
        prefix: &str,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        if !has_column(&df, column) {
            debug!(column, "skipping scalar one-hot expansion: column absent");
            return Ok(df);
        }
        let series = df
            .column(column)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let str_series = series.str()?;
        let values: Vec<Option<String>> = str_series
            .into_iter()
            .map(|opt| opt.map(|v| v.trim().to_string()))
            .collect();

        let mut distinct: Vec<String> = Vec::new();
        for value in values.iter().flatten() {
            if !distinct.contains(value) {
                distinct.push(value.clone());
            }
        }

        for value in &distinct {
            let indicator: Vec<i32> = values
                .iter()
                .map(|opt| i32::from(opt.as_deref() == Some(value.as_str())))
                .collect();
            let name = format!("{prefix}_{value}");
            df.with_column(Series::new(name.as_str().into(), indicator))?;
        }
        if !distinct.is_empty() {
            actions.push(StageAction::new(
                Stage::Encoding,
                column,
                format!("One-hot encoded {} distinct values", distinct.len()),
            ));
        }
        Ok(df)
    }
}

/// Materialize a list column as per-row token vectors with trimmed,
/// non-empty tokens. `None` when the column is absent or not a list
/// (e.g. it was never parsed because the raw column was missing).
fn collect_token_rows(df: &DataFrame, column: &str) -> Result<Option<Vec<Vec<String>>>> {
    if !has_column(df, column) {
        return Ok(None);
    }
    let series = df.column(column)?.as_materialized_series().clone();
    let Ok(list_ca) = series.list() else {
        return Ok(None);
    };
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(list_ca.len());
    for opt_inner in list_ca.into_iter() {
        let tokens = match opt_inner {
            Some(inner) => inner
                .str()?
                .into_iter()
                .flatten()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => Vec::new(),
        };
        rows.push(tokens);
    }
    Ok(Some(rows))
}

/// Distinct tokens across all rows, in first-seen order.
fn distinct_in_order(rows: &[Vec<String>]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut distinct = Vec::new();
    for row in rows {
        for token in row {
            if seen.insert(token.as_str()) {
                distinct.push(token.clone());
            }
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list_df(column: &str, rows: Vec<Vec<&str>>) -> DataFrame {
        let series: Vec<Series> = rows
            .into_iter()
            .map(|tokens| {
                Series::new(
                    PlSmallStr::EMPTY,
                    tokens.into_iter().map(str::to_string).collect::<Vec<_>>(),
                )
            })
            .collect();
        DataFrame::new(vec![Series::new(column.into(), series).into()]).unwrap()
    }

    fn indicator(df: &DataFrame, name: &str) -> Vec<i32> {
        df.column(name)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    fn encoding_only_config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_full_onehot_expansion() {
        let df = list_df(
            "genres",
            vec![vec!["Action", "Drama"], vec!["Drama"], vec![]],
        );
        let (df, _) = MlFeaturePreparer::prepare(df, &encoding_only_config()).unwrap();
        assert_eq!(indicator(&df, "genre_Action"), vec![1, 0, 0]);
        assert_eq!(indicator(&df, "genre_Drama"), vec![1, 1, 0]);
    }

    #[test]
    fn test_top_k_tie_break_is_first_seen_order() {
        // A and B tie on frequency; C is less frequent. With K = 2 the
        // selected set must be {A, B} regardless of the ordering of the
        // tied tokens within rows after their first occurrences.
        let df = list_df(
            "production_companies",
            vec![
                vec!["A", "B"],
                vec!["B", "A"],
                vec!["A", "B", "C"],
                vec!["C"],
            ],
        );
        let cfg = PipelineConfig::builder().top_k(2).build().unwrap();
        let (df, _) = MlFeaturePreparer::prepare(df, &cfg).unwrap();

        assert!(has_column(&df, "company_A"));
        assert!(has_column(&df, "company_B"));
        assert!(!has_column(&df, "company_C"));
        assert_eq!(indicator(&df, "has_top_company"), vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_top_k_deterministic_under_shuffled_equal_frequencies() {
        // Same frequencies, different row order that preserves first-seen
        // order of the tied tokens: selection must not change.
        let build = |rows: Vec<Vec<&str>>| {
            let cfg = PipelineConfig::builder().top_k(2).build().unwrap();
            let (df, _) = MlFeaturePreparer::prepare(
                list_df("production_companies", rows),
                &cfg,
            )
            .unwrap();
            let mut cols: Vec<String> = df
                .get_column_names()
                .iter()
                .filter(|c| c.starts_with("company_"))
                .map(|c| c.to_string())
                .collect();
            cols.sort();
            cols
        };

        let first = build(vec![vec!["A", "B"], vec!["B", "A", "C"], vec!["A", "B"], vec!["C"]]);
        let second = build(vec![vec!["A", "B", "C"], vec!["A", "B"], vec!["B", "A"], vec!["C"]]);
        assert_eq!(first, second);
        assert_eq!(first, vec!["company_A".to_string(), "company_B".to_string()]);
    }

    #[test]
    fn test_scalar_onehot_expansion() {
        let df = df!(
            "release_season" => [Some("winter"), Some("summer"), None, Some("winter")],
        )
        .unwrap();
        let (df, _) = MlFeaturePreparer::prepare(df, &encoding_only_config()).unwrap();
        assert_eq!(indicator(&df, "season_winter"), vec![1, 0, 0, 1]);
        assert_eq!(indicator(&df, "season_summer"), vec![0, 1, 0, 0]);
        // Only observed values produce columns.
        assert!(!has_column(&df, "season_autumn"));
    }

    #[test]
    fn test_token_whitespace_normalized_in_names() {
        let df = list_df("genres", vec![vec![" Drama ", "Drama"]]);
        let (df, _) = MlFeaturePreparer::prepare(df, &encoding_only_config()).unwrap();
        // Both spellings collapse into one indicator column.
        assert_eq!(indicator(&df, "genre_Drama"), vec![1]);
    }

    #[test]
    fn test_absent_columns_skip_silently() {
        let df = df!("title" => ["a", "b"]).unwrap();
        let (df, actions) = MlFeaturePreparer::prepare(df, &encoding_only_config()).unwrap();
        assert_eq!(df.width(), 1);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_zero_rows_yield_zero_new_columns() {
        let df = list_df("genres", vec![]);
        let (df, _) = MlFeaturePreparer::prepare(df, &encoding_only_config()).unwrap();
        assert_eq!(df.width(), 1);
    }

    #[test]
    fn test_stage_only_appends() {
        let df = list_df("genres", vec![vec!["Action"]]);
        let before: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        let (df, _) = MlFeaturePreparer::prepare(df, &encoding_only_config()).unwrap();
        for name in &before {
            assert!(has_column(&df, name));
        }
    }
}
