//! Parsing of client-supplied instants.
//!
//! Clients send dates as RFC 3339 timestamps, `YYYY-MM-DDTHH:MM[:SS]` (read as
//! UTC), plain `YYYY-MM-DD` dates (midnight UTC) or epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::errors::AppError;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses `raw` into a UTC instant, or `None` if no supported format matches.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }

    raw.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

/// Like [`parse_instant`] but reports failures as a validation error naming `field`.
pub fn require_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_instant(raw)
        .ok_or_else(|| AppError::Validation(format!("{field} is not a valid date or time: '{raw}'")))
}

/// An instant as it arrives in a JSON body: epoch millis or a date string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InstantInput {
    Millis(i64),
    Text(String),
}

impl InstantInput {
    pub fn resolve(&self, field: &str) -> Result<DateTime<Utc>, AppError> {
        match self {
            InstantInput::Millis(millis) => Utc
                .timestamp_millis_opt(*millis)
                .single()
                .ok_or_else(|| AppError::Validation(format!("{field} is out of range"))),
            InstantInput::Text(raw) => require_instant(field, raw),
        }
    }
}
