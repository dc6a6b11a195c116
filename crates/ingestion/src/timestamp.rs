//! Timestamp and counter cell parsing.
//!
//! Instrument exports write either a bare time of day (`HH:MM:SS.mmmuuun`)
//! or a full date-time; both are accepted. Spreadsheet cells may instead
//! carry a serial day number whose fraction is the time of day.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Largest float that still maps to an exact integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const TIME_FORMAT: &str = "%H:%M:%S%.f";

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// First serial day past 9999-12-31.
const MAX_SERIAL: f64 = 2_958_466.0;

/// A parsed timestamp cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub date: Option<NaiveDate>,
    pub time: NaiveTime,
}

impl From<NaiveDateTime> for ParsedTimestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            date: Some(dt.date()),
            time: dt.time(),
        }
    }
}

/// Parse a timestamp cell.
///
/// RFC 3339 values keep the wall-clock time of their own offset.
pub fn parse_timestamp(raw: &str) -> Option<ParsedTimestamp> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().into());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.into());
        }
    }

    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .ok()
        .map(|time| ParsedTimestamp { date: None, time })
}

/// Timestamp from a spreadsheet serial number (1900 date system).
///
/// Serials below 1 are a bare time of day. Larger serials count days from
/// 1899-12-30, which matches Excel for every date after February 1900.
/// The time is rounded to the microsecond.
pub fn timestamp_from_serial(serial: f64) -> Option<ParsedTimestamp> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    let total = (serial * MICROS_PER_DAY as f64).round() as i64;
    let (days, micros) = (total / MICROS_PER_DAY, total % MICROS_PER_DAY);

    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        (micros / 1_000_000) as u32,
        (micros % 1_000_000) as u32 * 1_000,
    )?;
    let date = if days == 0 {
        None
    } else {
        Some(NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days as u64))?)
    };
    Some(ParsedTimestamp { date, time })
}

/// Parse a counter delta cell.
///
/// Accepts non-negative integers and integral float literals such as `3.0`.
/// The error is a human-readable reason.
pub fn parse_counter(raw: &str) -> Result<u64, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("empty cell".to_string());
    }
    if let Ok(value) = s.parse::<u64>() {
        return Ok(value);
    }

    let value: f64 = s
        .parse()
        .map_err(|_| "not a non-negative integer".to_string())?;
    counter_from_f64(value)
}

/// Counter delta from a numeric cell; same rules as [`parse_counter`].
pub fn counter_from_f64(value: f64) -> Result<u64, String> {
    if !value.is_finite() {
        return Err("not a finite number".to_string());
    }
    if value < 0.0 {
        return Err("negative counter delta".to_string());
    }
    if value.fract() != 0.0 {
        return Err("fractional counter delta".to_string());
    }
    if value > MAX_EXACT_FLOAT {
        return Err("counter delta too large to represent exactly".to_string());
    }
    Ok(value as u64)
}
