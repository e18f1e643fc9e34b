//! Excel serial date conversion
//!
//! Serials count days since 1899-12-30, which absorbs the 1900 leap-year bug
//! for every date after 1900-02-28. The fractional part is the time of day.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or(NaiveDate::MIN)
        .and_time(chrono::NaiveTime::MIN)
}

/// Convert an Excel serial number to a date-time.
///
/// Returns `None` for negative or non-finite serials.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    epoch().checked_add_signed(Duration::milliseconds(millis))
}

/// Convert a date-time to an Excel serial number.
pub fn datetime_to_serial(value: NaiveDateTime) -> f64 {
    let delta = value - epoch();
    delta.num_milliseconds() as f64 / MILLIS_PER_DAY
}
