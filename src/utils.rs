//! Shared helpers used across pipeline stages.

use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// `"$1,234.56"` becomes `"1234.56"`, `"  42%  "` becomes `"42"`.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles common formatting like currency symbols and thousands
/// separators. Returns `None` for anything unparseable.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Check whether the frame has a column with this name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Coerce a series to `Float64`.
///
/// String series are parsed value by value with the tolerant numeric
/// parser; unparseable cells become null. Numeric series are cast.
/// Returns `None` when the dtype supports neither (the caller skips the
/// column in that case).
pub fn to_float64(series: &Series) -> Option<Series> {
    match series.dtype() {
        DataType::String => {
            let str_series = series.str().ok()?;
            let mut values: Vec<Option<f64>> = Vec::with_capacity(str_series.len());
            for opt_val in str_series.into_iter() {
                values.push(opt_val.and_then(parse_numeric_string));
            }
            Some(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) => series.cast(&DataType::Float64).ok(),
        _ => None,
    }
}
