//! Timestamp rendering for the `{datetime}` tag
//!
//! A strftime pattern is applied to the record timestamp in local time, then
//! the sub-second part is appended at the configured precision.

use super::error::LoggerError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Pattern used when the configured one cannot be rendered.
const FALLBACK_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Sub-second precision of the `{datetime}` tag.
///
/// # Examples
///
/// ```
/// use rust_cascade_logger::core::DatetimePrecision;
///
/// let precision: DatetimePrecision = "ms".parse().unwrap();
/// assert_eq!(precision.digits(), 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DatetimePrecision {
    /// Whole seconds, nothing appended
    Seconds,
    Millis,
    #[default]
    Micros,
    Nanos,
}

impl DatetimePrecision {
    /// Number of digits appended after the seconds.
    #[must_use]
    pub fn digits(&self) -> usize {
        match self {
            DatetimePrecision::Seconds => 0,
            DatetimePrecision::Millis => 3,
            DatetimePrecision::Micros => 6,
            DatetimePrecision::Nanos => 9,
        }
    }

    /// Sub-second remainder of `datetime` in this precision's unit.
    #[must_use]
    pub fn sub_second(&self, datetime: &DateTime<Utc>) -> u32 {
        let nanos = datetime.timestamp_subsec_nanos() % 1_000_000_000;
        match self {
            DatetimePrecision::Seconds => 0,
            DatetimePrecision::Millis => nanos / 1_000_000,
            DatetimePrecision::Micros => nanos / 1_000,
            DatetimePrecision::Nanos => nanos,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatetimePrecision::Seconds => "s",
            DatetimePrecision::Millis => "ms",
            DatetimePrecision::Micros => "us",
            DatetimePrecision::Nanos => "ns",
        }
    }
}

impl fmt::Display for DatetimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatetimePrecision {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" => Ok(DatetimePrecision::Seconds),
            "ms" => Ok(DatetimePrecision::Millis),
            "us" => Ok(DatetimePrecision::Micros),
            "ns" => Ok(DatetimePrecision::Nanos),
            other => Err(LoggerError::config(
                "datetime_precision",
                format!("expected one of s, ms, us, ns; got '{}'", other),
            )),
        }
    }
}

impl TryFrom<String> for DatetimePrecision {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self, LoggerError> {
        value.parse()
    }
}

impl From<DatetimePrecision> for String {
    fn from(precision: DatetimePrecision) -> Self {
        precision.as_str().to_string()
    }
}

/// Check that `pattern` is a strftime pattern chrono can render.
pub fn validate_pattern(pattern: &str) -> Result<(), LoggerError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::config(
            "datetime_format",
            format!("invalid strftime pattern '{}'", pattern),
        ));
    }
    Ok(())
}

/// Render `datetime` in local time with `pattern`, followed by
/// `.<sub-second digits>` unless the precision is whole seconds.
#[must_use]
pub fn format_datetime(
    datetime: &DateTime<Utc>,
    pattern: &str,
    precision: DatetimePrecision,
) -> String {
    let local: DateTime<Local> = datetime.with_timezone(&Local);
    let mut out = String::with_capacity(32);

    if write!(out, "{}", local.format(pattern)).is_err() {
        out.clear();
        let _ = write!(out, "{}", local.format(FALLBACK_PATTERN));
    }

    let digits = precision.digits();
    if digits > 0 {
        let _ = write!(out, ".{:0width$}", precision.sub_second(datetime), width = digits);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.012345678 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::nanoseconds(12_345_678)
    }

    #[test]
    fn test_precision_parse() {
        assert_eq!("s".parse::<DatetimePrecision>().unwrap(), DatetimePrecision::Seconds);
        assert_eq!("MS".parse::<DatetimePrecision>().unwrap(), DatetimePrecision::Millis);
        assert_eq!("us".parse::<DatetimePrecision>().unwrap(), DatetimePrecision::Micros);
        assert_eq!("ns".parse::<DatetimePrecision>().unwrap(), DatetimePrecision::Nanos);
        assert!(matches!(
            "ps".parse::<DatetimePrecision>(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_sub_second_is_zero_padded() {
        let dt = fixed_datetime();
        assert_eq!(format_datetime(&dt, "%S", DatetimePrecision::Seconds), "45");
        assert_eq!(format_datetime(&dt, "%S", DatetimePrecision::Millis), "45.012");
        assert_eq!(format_datetime(&dt, "%S", DatetimePrecision::Micros), "45.012345");
        assert_eq!(format_datetime(&dt, "%S", DatetimePrecision::Nanos), "45.012345678");
    }

    #[test]
    fn test_pattern_uses_local_time() {
        let dt = fixed_datetime();
        let expected = dt.with_timezone(&Local).format("%Y/%m/%d %H:%M").to_string();
        assert_eq!(
            format_datetime(&dt, "%Y/%m/%d %H:%M", DatetimePrecision::Seconds),
            expected
        );
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        assert!(validate_pattern("%a %b %d %T").is_ok());
        assert!(validate_pattern("%Q").is_err());

        let rendered = format_datetime(&fixed_datetime(), "%Q", DatetimePrecision::Seconds);
        assert_eq!(rendered.len(), "2025-01-08 10:30:45".len());
    }

    #[test]
    fn test_default_precision() {
        assert_eq!(DatetimePrecision::default(), DatetimePrecision::Micros);
        assert_eq!(DatetimePrecision::Micros.to_string(), "us");
    }
}
