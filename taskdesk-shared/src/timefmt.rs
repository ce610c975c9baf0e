/// ISO-8601 handling for task due dates
///
/// Due dates are naive wall-clock timestamps. Input is accepted in the usual
/// ISO-8601 shapes; output is always `YYYY-MM-DDTHH:MM:SS`, with a
/// microsecond fraction only when the value has one.
///
/// | Input                          | Stored as                 |
/// |--------------------------------|---------------------------|
/// | `2024-01-01`                   | `2024-01-01T00:00:00`     |
/// | `2024-01-01T09:30`             | `2024-01-01T09:30:00`     |
/// | `2024-01-01 09:30:15.250`      | `2024-01-01T09:30:15.250000` |
/// | `2024-01-01T09:30:00+02:00`    | `2024-01-01T09:30:00`     |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Error returned for a due date that is not ISO-8601
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid isoformat string: '{0}'")]
pub struct DateParseError(pub String);

/// Parses an ISO-8601 date or date-time
///
/// A UTC offset, if present, is dropped and the local wall time kept.
pub fn parse_iso_datetime(input: &str) -> Result<NaiveDateTime, DateParseError> {
    let value = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(DateParseError(input.to_string()))
}

/// Formats a due date as ISO-8601
pub fn format_iso_datetime(value: &NaiveDateTime) -> String {
    if value.nanosecond() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Serde adapter for `Option<NaiveDateTime>` fields rendered as ISO-8601 or `null`
pub mod option_iso {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&super::format_iso_datetime(dt)),
            None => serializer.serialize_none(),
        }
    }
}
