//! Wall-clock normalization for meeting times.
//!
//! The catalog has served meeting times in two encodings over its lifetime:
//!
//! - v1: a Go timestamp on a nominal date, e.g. `0000-01-01T10:00:00-05:00`
//! - v2: a bare 12-hour clock, e.g. `10:00am`
//!
//! Both are normalized to a [`NaiveTime`]; anything else is an error.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{AppError, Result};

/// Format used when writing times back out.
const CLOCK_FORMAT: &str = "%I:%M%p";

/// Parse a wire time in either supported encoding.
pub fn parse_clock(raw: &str) -> Result<NaiveTime> {
    let trimmed = raw.trim();
    parse_go_timestamp(trimmed)
        .or_else(|| parse_twelve_hour(trimmed))
        .ok_or_else(|| AppError::TimeFormat(raw.to_string()))
}

/// Render a time the way the catalog's current encoding does.
///
/// Times with a seconds component fall back to the timestamp form so that
/// nothing is lost when the value is parsed again.
pub fn format_clock(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format(CLOCK_FORMAT).to_string().to_lowercase()
    } else {
        format!("0000-01-01T{}", time.format("%H:%M:%S"))
    }
}

/// Render a time for the agenda, e.g. `09:30 AM`.
pub fn display_clock(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

fn parse_go_timestamp(raw: &str) -> Option<NaiveTime> {
    if !raw.contains('T') {
        return None;
    }
    // Year zero is Go's zero value; shift it so every parser accepts the date.
    let shifted = match raw.strip_prefix("0000-") {
        Some(rest) => format!("0001-{rest}"),
        None => raw.to_string(),
    };

    DateTime::parse_from_rfc3339(&shifted)
        .map(|dt| dt.time())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&shifted, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.time())
        })
        .ok()
}

fn parse_twelve_hour(raw: &str) -> Option<NaiveTime> {
    let upper = raw.to_uppercase().replace(' ', "");
    NaiveTime::parse_from_str(&upper, CLOCK_FORMAT).ok()
}

/// Serde adapter for optional wire times.
///
/// Missing, `null` and empty-string values become `None` (online sections
/// carry no meeting time). Any other value must parse.
pub mod optional_clock {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&format_clock(*time)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_clock(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
