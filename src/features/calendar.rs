//! Calendar feature derivation from release dates.
//!
//! Unparseable dates become missing, and that missingness propagates to
//! every derived column; no derived field ever defaults to a sentinel.

use chrono::{Datelike, NaiveDate};

/// Days from 0001-01-01 (CE) to 1970-01-01, the Polars date epoch.
pub(crate) const UNIX_EPOCH_DAYS_CE: i32 = 719_163;

/// The weekend set is fixed: Saturday and Sunday (day-of-week 5 and 6,
/// with 0 = Monday).
pub const WEEKEND_DAYS: [u32; 2] = [5, 6];

/// Parse a date cell against the configured formats, in order.
pub fn parse_date(cell: &str, formats: &[String]) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Fixed month-to-season mapping: Dec/Jan/Feb are winter, Mar/Apr/May
/// spring, Jun/Jul/Aug summer, everything else autumn.
pub fn month_to_season(month: u32) -> &'static str {
    match month {
        12 | 1 | 2 => "winter",
        3 | 4 | 5 => "spring",
        6 | 7 | 8 => "summer",
        _ => "autumn",
    }
}

/// Calendar fields derived from one parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub year: i32,
    /// 1-12.
    pub month: u32,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u32,
    pub season: &'static str,
    /// 1 if day-of-week is Saturday or Sunday, else 0.
    pub is_weekend: i32,
}

impl CalendarFields {
    pub fn from_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            year: date.year(),
            month: date.month(),
            day_of_week,
            season: month_to_season(date.month()),
            is_weekend: i32::from(WEEKEND_DAYS.contains(&day_of_week)),
        }
    }
}

/// Days since the Unix epoch, the physical representation of the Polars
/// `Date` dtype.
pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_CE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn formats() -> Vec<String> {
        vec!["%Y-%m-%d".to_string()]
    }

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("2021-12-25", &formats()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 12, 25).unwrap());
    }

    #[test]
    fn test_parse_date_invalid_is_none() {
        assert_eq!(parse_date("not a date", &formats()), None);
        assert_eq!(parse_date("2021-13-45", &formats()), None);
        assert_eq!(parse_date("", &formats()), None);
    }

    #[test]
    fn test_parse_date_fallback_formats() {
        let formats = vec!["%Y-%m-%d".to_string(), "%d/%m/%Y".to_string()];
        let date = parse_date("25/12/2021", &formats).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 12, 25).unwrap());
    }

    #[test]
    fn test_month_to_season_all_months() {
        assert_eq!(month_to_season(12), "winter");
        assert_eq!(month_to_season(1), "winter");
        assert_eq!(month_to_season(2), "winter");
        assert_eq!(month_to_season(3), "spring");
        assert_eq!(month_to_season(4), "spring");
        assert_eq!(month_to_season(5), "spring");
        assert_eq!(month_to_season(6), "summer");
        assert_eq!(month_to_season(7), "summer");
        assert_eq!(month_to_season(8), "summer");
        assert_eq!(month_to_season(9), "autumn");
        assert_eq!(month_to_season(10), "autumn");
        assert_eq!(month_to_season(11), "autumn");
    }

    #[test]
    fn test_christmas_2021_is_a_winter_saturday() {
        let fields =
            CalendarFields::from_date(NaiveDate::from_ymd_opt(2021, 12, 25).unwrap());
        assert_eq!(fields.year, 2021);
        assert_eq!(fields.month, 12);
        assert_eq!(fields.day_of_week, 5);
        assert_eq!(fields.season, "winter");
        assert_eq!(fields.is_weekend, 1);
    }

    #[test]
    fn test_fourth_of_july_2021_is_a_summer_sunday() {
        let fields =
            CalendarFields::from_date(NaiveDate::from_ymd_opt(2021, 7, 4).unwrap());
        assert_eq!(fields.day_of_week, 6);
        assert_eq!(fields.season, "summer");
        assert_eq!(fields.is_weekend, 1);
    }

    #[test]
    fn test_monday_is_not_weekend() {
        let fields =
            CalendarFields::from_date(NaiveDate::from_ymd_opt(2021, 7, 5).unwrap());
        assert_eq!(fields.day_of_week, 0);
        assert_eq!(fields.is_weekend, 0);
    }

    #[test]
    fn test_days_since_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(days_since_epoch(epoch), 0);
        let next = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(days_since_epoch(next), 1);
    }
}
