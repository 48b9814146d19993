//! Built-in converters.
//!
//! - [`string_converter`]: any caller value to `String`
//! - [`time_converter`]: epoch milliseconds or a formatted date to `DateTime<Utc>`
//!
//! [`install`] registers both.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use dynbind_core::Converters;
use serde_json::Value;
use std::convert::Infallible;
use thiserror::Error;

/// Register every built-in converter.
pub fn install(converters: &mut Converters) {
    converters.register(string_converter);
    converters.register(time_converter);
}

/// Render any value as a string.
///
/// Floats use fixed six decimals; non-scalar values become their JSON text.
pub fn string_converter(value: &Value) -> Result<String, Infallible> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => format!("{f:.6}"),
            None => n.to_string(),
        },
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

/// Errors of [`time_converter`].
#[derive(Error, Debug)]
pub enum TimeError {
    /// No known layout matched the string.
    #[error("no suitable time format identified: {0}")]
    UnknownFormat(String),

    /// The number is outside the representable range.
    #[error("timestamp {0} ms is out of range")]
    OutOfRange(i64),

    /// The value is neither a number nor a string.
    #[error("cannot convert {0} to a timestamp")]
    Unsupported(&'static str),
}

/// Layouts that carry a full date.
enum Layout {
    /// `chrono` RFC 3339 parser.
    Rfc3339,
    /// Fixed format with a numeric offset.
    Offset(&'static str),
    /// Fixed format without any zone.
    Naive(&'static str),
    /// Fixed format plus a zone abbreviation, read as UTC. The abbreviation
    /// is the n-th whitespace-separated token counted from the end.
    Named(&'static str, usize),
    /// Fixed format without a year; the year resolves to 0.
    NoYear(&'static str),
    /// Time of day only, on January 1st of year 0.
    TimeOfDay(&'static str),
    /// Date only, at midnight.
    Date(&'static str),
}

/// Tried in order; the first match wins.
const LAYOUTS: &[Layout] = &[
    // RFC 3339, with and without fractional seconds
    Layout::Rfc3339,
    // ANSI C
    Layout::Naive("%a %b %e %H:%M:%S %Y"),
    // Unix date
    Layout::Named("%a %b %e %H:%M:%S %Y", 1),
    // Ruby date
    Layout::Offset("%a %b %d %H:%M:%S %z %Y"),
    // RFC 822 and RFC 822 with numeric zone
    Layout::Named("%d %b %y %H:%M", 0),
    Layout::Offset("%d %b %y %H:%M %z"),
    // RFC 850
    Layout::Named("%A, %d-%b-%y %H:%M:%S", 0),
    // RFC 1123 and RFC 1123 with numeric zone
    Layout::Named("%a, %d %b %Y %H:%M:%S", 0),
    Layout::Offset("%a, %d %b %Y %H:%M:%S %z"),
    // Kitchen
    Layout::TimeOfDay("%I:%M%p"),
    // Stamp, then milli, micro and nano stamps
    Layout::NoYear("%b %e %H:%M:%S"),
    Layout::NoYear("%b %e %H:%M:%S%.3f"),
    Layout::NoYear("%b %e %H:%M:%S%.6f"),
    Layout::NoYear("%b %e %H:%M:%S%.9f"),
    // Plain dates; the last one is year/day/month
    Layout::Date("%Y-%m-%d"),
    Layout::Date("%Y.%m.%d"),
    Layout::Date("%Y/%d/%m"),
];

impl Layout {
    fn parse(&self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Layout::Offset(fmt) => DateTime::parse_from_str(s, fmt)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Layout::Naive(fmt) => NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|t| t.and_utc()),
            Layout::Named(fmt, from_end) => {
                let tokens: Vec<&str> = s.split_whitespace().collect();
                let at = tokens.len().checked_sub(from_end + 1)?;
                if !tokens[at].chars().all(|c| c.is_ascii_uppercase()) {
                    return None;
                }
                let rest: Vec<&str> = tokens
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != at)
                    .map(|(_, t)| *t)
                    .collect();
                NaiveDateTime::parse_from_str(&rest.join(" "), fmt)
                    .ok()
                    .map(|t| t.and_utc())
            }
            Layout::NoYear(fmt) => {
                NaiveDateTime::parse_from_str(&format!("0000 {s}"), &format!("%Y {fmt}"))
                    .ok()
                    .map(|t| t.and_utc())
            }
            Layout::TimeOfDay(fmt) => {
                let time = NaiveTime::parse_from_str(s, fmt).ok()?;
                let date = NaiveDate::from_ymd_opt(0, 1, 1)?;
                Some(date.and_time(time).and_utc())
            }
            Layout::Date(fmt) => NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| t.and_utc()),
        }
    }
}

/// Epoch milliseconds, truncated to whole seconds.
fn from_millis(ms: i64) -> Result<DateTime<Utc>, TimeError> {
    Utc.timestamp_opt(ms / 1000, 0)
        .single()
        .ok_or(TimeError::OutOfRange(ms))
}

/// Interpret a value as a point in time.
///
/// Numbers and numeric strings are epoch milliseconds, kept to the whole
/// second. Other strings are tried against a fixed list of layouts; zone
/// abbreviations are read as UTC.
pub fn time_converter(value: &Value) -> Result<DateTime<Utc>, TimeError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => from_millis(ms),
            None => from_millis(n.as_f64().unwrap_or_default() as i64),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ms) = s.parse::<i64>() {
                return from_millis(ms);
            }
            LAYOUTS
                .iter()
                .find_map(|layout| layout.parse(s))
                .ok_or_else(|| TimeError::UnknownFormat(s.to_string()))
        }
        other => Err(TimeError::Unsupported(dynbind_core::value_kind(other))),
    }
}
