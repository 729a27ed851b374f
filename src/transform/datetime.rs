//! Date-time coercion
//!
//! Every accepted input is rendered in one canonical UTC form:
//! `2017-01-01T00:00:00.000000Z`.

use super::types::IntegerDatetimeMode;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Canonical output format
pub const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%MZ",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y%m%dT%H%M%S",
    "%b %d %Y %H:%M:%S",
    "%B %d %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y%m%d",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Current time in UTC
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a UTC timestamp in the canonical form
pub fn strftime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// Parse a free-form date/time string into UTC.
///
/// Inputs with an explicit offset are converted; naive inputs (and bare dates)
/// are taken to be UTC.
pub fn strptime_to_utc(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    let fail = || Error::DateTimeParse {
        value: input.to_string(),
    };
    if trimmed.is_empty() {
        return Err(fail());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(trimmed, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
        }
    }

    Err(fail())
}

/// Convert a value into the canonical UTC date-time string.
///
/// In the Unix modes a value that does not read as a timestamp falls back to
/// string parsing.
pub fn to_datetime_string(value: &Value, mode: IntegerDatetimeMode) -> Result<String> {
    let numeric = match mode {
        IntegerDatetimeMode::NoIntegerParsing => None,
        IntegerDatetimeMode::UnixSeconds => unix_seconds_to_datetime(value),
        IntegerDatetimeMode::UnixMilliseconds => unix_milliseconds_to_datetime(value),
    };
    if let Some(dt) = numeric {
        return Ok(strftime(&dt));
    }

    string_to_datetime(value)
}

fn string_to_datetime(value: &Value) -> Result<String> {
    let result = match value {
        Value::String(s) => strptime_to_utc(s).map(|dt| strftime(&dt)),
        other => Err(Error::DateTimeParse {
            value: other.to_string(),
        }),
    };
    if let Err(e) = &result {
        tracing::warn!("{e}, ({value})");
    }
    result
}

fn unix_seconds_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}

fn unix_milliseconds_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !millis.is_finite() {
        return None;
    }
    let micros = (millis * 1000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}
