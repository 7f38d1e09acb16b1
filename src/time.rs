//! Instant parsing and formatting
//!
//! Instants are Unix epoch milliseconds internally. At the edges they are
//! accepted as RFC 3339 strings, raw integer milliseconds, or relative
//! expressions such as `now`, `now-7d`, `12h` (meaning twelve hours ago).

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid timestamp '{0}': expected RFC 3339, epoch milliseconds, or a relative time like now-7d")]
pub struct InstantError(pub String);

fn relative_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:now-)?(\d+)\s*(ms|s|m|h|d|w)$").unwrap_or_else(|e| panic!("bad regex: {}", e))
    })
}

/// Milliseconds in one unit of a relative expression
fn unit_millis(unit: &str) -> i64 {
    match unit {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => 7 * 86_400_000,
    }
}

/// Parse an instant relative to `now` (epoch milliseconds)
pub fn parse_instant_at(input: &str, now: i64) -> Result<i64, InstantError> {
    let text = input.trim();

    if text.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Ok(millis) = text.parse::<i64>() {
        return Ok(millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp_millis());
    }

    // datetime-local form inputs carry no offset; read them as UTC
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return Ok(naive.and_utc().timestamp_millis());
    }

    if let Some(caps) = relative_pattern().captures(text) {
        let amount: i64 = caps[1].parse().map_err(|_| InstantError(input.to_string()))?;
        let offset = amount
            .checked_mul(unit_millis(&caps[2]))
            .ok_or_else(|| InstantError(input.to_string()))?;
        return Ok(now - offset);
    }

    Err(InstantError(input.to_string()))
}

/// Parse an instant relative to the wall clock
pub fn parse_instant(input: &str) -> Result<i64, InstantError> {
    parse_instant_at(input, Utc::now().timestamp_millis())
}

/// Format epoch milliseconds as RFC 3339 (UTC, millisecond precision)
pub fn format_instant(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}
