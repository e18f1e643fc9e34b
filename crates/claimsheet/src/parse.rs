//! Permissive cell parsers
//!
//! Claim exports mix native dates, `YYYYMMDD` integers, Excel serials and
//! hand-typed strings in the same column. These parsers return `None` for
//! anything they cannot read; a rule whose input does not parse simply does
//! not apply to that row.

use chrono::{Duration, NaiveDate};
use claimsheet_core::{date, parse_lenient_number, CellValue};

/// Layouts with a four-digit year, tried after the `YYYYMMDD` digit check
const LONG_YEAR_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y %m %d"];

/// Layouts with a two-digit year
const SHORT_YEAR_FORMATS: &[&str] = &["%y-%m-%d", "%y/%m/%d", "%y.%m.%d"];

/// Serials in this range are read as Excel dates
const SERIAL_RANGE: std::ops::RangeInclusive<i64> = 20_000..=80_000;

/// Integers in this range are read as `YYYYMMDD`
const YYYYMMDD_RANGE: std::ops::RangeInclusive<i64> = 19_000_101..=21_001_231;

/// Parse a mileage-like value: numbers are truncated, text may carry
/// thousands separators (`"70,000"`).
pub fn parse_int_like(value: &CellValue) -> Option<i64> {
    let n = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => parse_lenient_number(s.as_str())?,
        _ => return None,
    };
    let truncated = n.trunc();
    (truncated.abs() < i64::MAX as f64).then_some(truncated as i64)
}

/// Parse a date from any of the shapes claim files use
pub fn parse_excel_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Date(d) => Some(d.date()),
        CellValue::Number(n) => parse_numeric_date(*n),
        CellValue::Text(s) => parse_text_date(s.as_str()),
        _ => None,
    }
}

fn parse_numeric_date(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() {
        return None;
    }
    let whole = n.trunc() as i64;

    if YYYYMMDD_RANGE.contains(&whole) {
        if let Some(d) = parse_yyyymmdd(&whole.to_string()) {
            return Some(d);
        }
    }

    if SERIAL_RANGE.contains(&whole) {
        return date::serial_to_datetime(n).map(|dt| dt.date());
    }

    None
}

fn parse_yyyymmdd(digits: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 8 {
        if let Some(d) = parse_yyyymmdd(&digits) {
            return Some(d);
        }
    }

    // chrono's %Y accepts any width, so pick the layouts by the year's width
    let formats = match s.chars().take_while(char::is_ascii_digit).count() {
        4 => LONG_YEAR_FORMATS,
        2 => SHORT_YEAR_FORMATS,
        _ => return None,
    };

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Whole days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let delta: Duration = to - from;
    delta.num_days()
}
