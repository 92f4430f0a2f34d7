//! Feature engineering stage.
//!
//! Order within this stage matters: season depends on month, which
//! depends on the parsed date, and the count/top-N columns depend on the
//! parsed list sequences. Each sub-step checks column presence
//! independently, so a missing input never blocks the others.

pub mod calendar;
pub mod lists;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::{Stage, StageAction};
use crate::utils::{has_column, to_float64};
use calendar::CalendarFields;
use polars::prelude::*;
use tracing::debug;

/// Derived column names for calendar features.
pub const YEAR_COLUMN: &str = "release_year";
pub const MONTH_COLUMN: &str = "release_month";
pub const DAY_OF_WEEK_COLUMN: &str = "release_day_of_week";
pub const SEASON_COLUMN: &str = "release_season";
pub const WEEKEND_COLUMN: &str = "is_weekend";

/// Feature engineering stage: list parsing, derived counts, calendar
/// features and log transforms.
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn engineer(
        df: DataFrame,
        config: &PipelineConfig,
    ) -> Result<(DataFrame, Vec<StageAction>)> {
        let mut actions = Vec::new();
        let mut df = df;

        df = Self::parse_list_columns(df, config, &mut actions)?;
        df = Self::derive_counts(df, config, &mut actions)?;
        df = Self::derive_calendar(df, config, &mut actions)?;
        df = Self::derive_log_transforms(df, config, &mut actions)?;

        Ok((df, actions))
    }

    /// Replace each configured text column with a `List(String)` column of
    /// parsed tokens. Missing cells become empty sequences.
    fn parse_list_columns(
        mut df: DataFrame,
        config: &PipelineConfig,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        for col_name in &config.list_columns {
            if !has_column(&df, col_name) {
                debug!(column = %col_name, "skipping list parsing: column absent");
                continue;
            }
            let series = df.column(col_name)?.as_materialized_series();
            if matches!(series.dtype(), DataType::List(_)) {
                continue;
            }
            let DataType::String = series.dtype() else {
                debug!(column = %col_name, dtype = ?series.dtype(), "skipping list parsing: not text");
                continue;
            };
            let str_series = series.str()?;
            let mut rows: Vec<Series> = Vec::with_capacity(str_series.len());
            for opt_val in str_series.into_iter() {
                let tokens = opt_val.map(lists::parse_list_cell).unwrap_or_default();
                rows.push(Series::new(PlSmallStr::EMPTY, tokens));
            }
            let parsed = if rows.is_empty() {
                Series::new_empty(
                    col_name.as_str().into(),
                    &DataType::List(Box::new(DataType::String)),
                )
            } else {
                Series::new(col_name.as_str().into(), rows)
            };
            df.replace(col_name, parsed)?;
            actions.push(StageAction::new(
                Stage::FeatureEngineering,
                col_name.clone(),
                "Parsed into string sequences",
            ));
        }
        Ok(df)
    }

    /// Derive `<col>_count` and the optional `<col>_top<N>` truncation from
    /// the parsed sequence. The parsed column is the canonical source; raw
    /// cell text is never re-split here.
    fn derive_counts(
        mut df: DataFrame,
        config: &PipelineConfig,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        let Some(count_col) = &config.count_column else {
            return Ok(df);
        };
        if !has_column(&df, count_col) {
            debug!(column = %count_col, "skipping count derivation: column absent");
            return Ok(df);
        }
        let series = df.column(count_col)?.as_materialized_series().clone();
        let Ok(list_ca) = series.list() else {
            debug!(column = %count_col, "skipping count derivation: not a parsed list column");
            return Ok(df);
        };

        let mut counts: Vec<u32> = Vec::with_capacity(list_ca.len());
        for opt_inner in list_ca.into_iter() {
            counts.push(opt_inner.map(|s| s.len() as u32).unwrap_or(0));
        }
        let count_name = format!("{count_col}_count");
        df.with_column(Series::new(count_name.as_str().into(), counts))?;
        actions.push(StageAction::new(
            Stage::FeatureEngineering,
            count_name,
            "Derived sequence length",
        ));

        if let Some(n) = config.top_n {
            let mut truncated: Vec<Series> = Vec::with_capacity(list_ca.len());
            for opt_inner in list_ca.into_iter() {
                let inner = match opt_inner {
                    Some(s) => s.slice(0, n),
                    None => Series::new_empty(PlSmallStr::EMPTY, &DataType::String),
                };
                truncated.push(inner);
            }
            let top_name = format!("{count_col}_top{n}");
            let top_series = if truncated.is_empty() {
                Series::new_empty(
                    top_name.as_str().into(),
                    &DataType::List(Box::new(DataType::String)),
                )
            } else {
                Series::new(top_name.as_str().into(), truncated)
            };
            df.with_column(top_series)?;
            actions.push(StageAction::new(
                Stage::FeatureEngineering,
                format!("{count_col}_top{n}"),
                format!("Derived first {n} entries"),
            ));
        }

        Ok(df)
    }

    /// Parse the date column and derive year, month, day-of-week, season
    /// and weekend indicator. All derived cells are null where the source
    /// date is null or unparseable.
    fn derive_calendar(
        mut df: DataFrame,
        config: &PipelineConfig,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        if !has_column(&df, &config.date_column) {
            debug!(column = %config.date_column, "skipping calendar derivation: column absent");
            return Ok(df);
        }
        let series = df.column(&config.date_column)?.as_materialized_series().clone();

        let dates: Vec<Option<chrono::NaiveDate>> = match series.dtype() {
            DataType::String => {
                let str_series = series.str()?;
                str_series
                    .into_iter()
                    .map(|opt| opt.and_then(|v| calendar::parse_date(v, &config.date_formats)))
                    .collect()
            }
            DataType::Date => {
                let date_ca = series.date()?;
                date_ca.as_date_iter().collect()
            }
            other => {
                debug!(column = %config.date_column, dtype = ?other, "skipping calendar derivation: unsupported dtype");
                return Ok(df);
            }
        };

        // Replace the source column with a typed Date column.
        let days: Int32Chunked = dates
            .iter()
            .map(|opt| opt.map(calendar::days_since_epoch))
            .collect();
        let date_series = days
            .with_name(config.date_column.as_str().into())
            .into_date()
            .into_series();
        df.replace(&config.date_column, date_series)?;

        let fields: Vec<Option<CalendarFields>> = dates
            .iter()
            .map(|opt| opt.map(CalendarFields::from_date))
            .collect();

        let years: Vec<Option<i32>> = fields.iter().map(|f| f.map(|f| f.year)).collect();
        let months: Vec<Option<i32>> =
            fields.iter().map(|f| f.map(|f| f.month as i32)).collect();
        let days_of_week: Vec<Option<i32>> = fields
            .iter()
            .map(|f| f.map(|f| f.day_of_week as i32))
            .collect();
        let seasons: Vec<Option<String>> = fields
            .iter()
            .map(|f| f.map(|f| f.season.to_string()))
            .collect();
        let weekends: Vec<Option<i32>> =
            fields.iter().map(|f| f.map(|f| f.is_weekend)).collect();

        df.with_column(Series::new(YEAR_COLUMN.into(), years))?;
        df.with_column(Series::new(MONTH_COLUMN.into(), months))?;
        df.with_column(Series::new(DAY_OF_WEEK_COLUMN.into(), days_of_week))?;
        df.with_column(Series::new(SEASON_COLUMN.into(), seasons))?;
        df.with_column(Series::new(WEEKEND_COLUMN.into(), weekends))?;

        actions.push(StageAction::new(
            Stage::FeatureEngineering,
            config.date_column.clone(),
            "Derived year, month, day-of-week, season and weekend indicator",
        ));

        Ok(df)
    }

    /// Add `<col>_log` = ln(1 + x) for each configured column present.
    /// Null where the input is null or negative; zero is valid input.
    fn derive_log_transforms(
        mut df: DataFrame,
        config: &PipelineConfig,
        actions: &mut Vec<StageAction>,
    ) -> Result<DataFrame> {
        for col_name in &config.log_columns {
            if !has_column(&df, col_name) {
                debug!(column = %col_name, "skipping log transform: column absent");
                continue;
            }
            let series = df.column(col_name)?.as_materialized_series();
            let Some(floats) = to_float64(series) else {
                debug!(column = %col_name, "skipping log transform: not numeric");
                continue;
            };
            let ca = floats.f64()?;
            let logged: Vec<Option<f64>> = ca
                .into_iter()
                .map(|opt| opt.filter(|v| *v >= 0.0).map(|v| (1.0 + v).ln()))
                .collect();
            let log_name = format!("{col_name}_log");
            df.with_column(Series::new(log_name.as_str().into(), logged))?;
            actions.push(StageAction::new(
                Stage::FeatureEngineering,
                log_name,
                "Derived log(1 + x) transform",
            ));
        }
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn inner_tokens(df: &DataFrame, column: &str, row: usize) -> Vec<String> {
        let list_ca = df.column(column).unwrap().list().unwrap();
        match list_ca.get_as_series(row) {
            Some(inner) => inner
                .str()
                .unwrap()
                .into_iter()
                .map(|v| v.unwrap().to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    #[test]
    fn test_list_columns_parsed() {
        let df = df!(
            "genres" => [Some("Action, Drama"), Some("['Comedy', 'Romance']"), None],
        )
        .unwrap();
        let (df, _) = FeatureEngineer::engineer(df, &config()).unwrap();
        assert_eq!(inner_tokens(&df, "genres", 0), vec!["Action", "Drama"]);
        assert_eq!(inner_tokens(&df, "genres", 1), vec!["Comedy", "Romance"]);
        assert_eq!(inner_tokens(&df, "genres", 2), Vec::<String>::new());
    }

    #[test]
    fn test_count_and_top_n_from_parsed_sequence() {
        let df = df!(
            "production_companies" => ["A, B, C, D", "X", ""],
        )
        .unwrap();
        let (df, _) = FeatureEngineer::engineer(df, &config()).unwrap();

        let counts: Vec<Option<u32>> = df
            .column("production_companies_count")
            .unwrap()
            .u32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(counts, vec![Some(4), Some(1), Some(0)]);

        assert_eq!(
            inner_tokens(&df, "production_companies_top3", 0),
            vec!["A", "B", "C"]
        );
        assert_eq!(inner_tokens(&df, "production_companies_top3", 1), vec!["X"]);
        assert_eq!(
            inner_tokens(&df, "production_companies_top3", 2),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_calendar_derivation() {
        let df = df!(
            "release_date" => [Some("2021-12-25"), Some("2021-07-04"), Some("garbage"), None],
        )
        .unwrap();
        let (df, _) = FeatureEngineer::engineer(df, &config()).unwrap();

        assert_eq!(df.column("release_date").unwrap().dtype(), &DataType::Date);

        let months: Vec<Option<i32>> = df
            .column(MONTH_COLUMN)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(months, vec![Some(12), Some(7), None, None]);

        let dows: Vec<Option<i32>> = df
            .column(DAY_OF_WEEK_COLUMN)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        // 2021-12-25 was a Saturday (5), 2021-07-04 a Sunday (6).
        assert_eq!(dows, vec![Some(5), Some(6), None, None]);

        let seasons: Vec<Option<&str>> = df
            .column(SEASON_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(seasons, vec![Some("winter"), Some("summer"), None, None]);

        let weekends: Vec<Option<i32>> = df
            .column(WEEKEND_COLUMN)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(weekends, vec![Some(1), Some(1), None, None]);
    }

    #[test]
    fn test_log_transforms() {
        let df = df!(
            "budget" => [Some(0.0), Some(99.0), None, Some(-5.0)],
        )
        .unwrap();
        let (df, _) = FeatureEngineer::engineer(df, &config()).unwrap();
        let logs: Vec<Option<f64>> = df
            .column("budget_log")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(logs[0], Some(0.0));
        assert!((logs[1].unwrap() - 100.0_f64.ln()).abs() < 1e-12);
        assert_eq!(logs[2], None);
        assert_eq!(logs[3], None);
    }

    #[test]
    fn test_missing_columns_skip_independently() {
        // Only the date column exists; list, count and log steps no-op.
        let df = df!("release_date" => ["2020-01-15"]).unwrap();
        let (df, _) = FeatureEngineer::engineer(df, &config()).unwrap();
        assert!(has_column(&df, SEASON_COLUMN));
        assert!(!has_column(&df, "production_companies_count"));
        assert!(!has_column(&df, "budget_log"));
    }

    #[test]
    fn test_zero_row_table() {
        let df = df!(
            "genres" => Vec::<String>::new(),
            "release_date" => Vec::<String>::new(),
            "budget" => Vec::<f64>::new(),
        )
        .unwrap();
        let (df, _) = FeatureEngineer::engineer(df, &config()).unwrap();
        assert_eq!(df.height(), 0);
        assert!(has_column(&df, SEASON_COLUMN));
        assert!(matches!(
            df.column("genres").unwrap().dtype(),
            DataType::List(_)
        ));
    }
}
