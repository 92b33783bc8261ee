//! Duration text form used in sidecar files
//!
//! `[d.]hh:mm:ss[.fffffff]` with 100 ns ticks, the form existing sidecars
//! were written in. Used through `#[serde(with = "crate::timespan")]`.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

const NANOS_PER_TICK: u128 = 100;
const TICKS_PER_SECOND: u128 = 10_000_000;
const FRACTION_DIGITS: usize = 7;

/// Format a duration, e.g. `00:01:05.5000000` or `1.02:00:00`
pub fn format_timespan(duration: Duration) -> String {
    let ticks = duration.as_nanos() / NANOS_PER_TICK;
    let fraction = ticks % TICKS_PER_SECOND;
    let total_seconds = ticks / TICKS_PER_SECOND;

    let days = total_seconds / 86_400;
    let hours = (total_seconds / 3600) % 24;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    let mut text = String::new();
    if days > 0 {
        text.push_str(&format!("{days}."));
    }
    text.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if fraction > 0 {
        text.push_str(&format!(".{fraction:07}"));
    }
    text
}

/// Parse `[d.]hh:mm:ss[.fffffff]`
pub fn parse_timespan(text: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration: {text:?}");

    let parts: Vec<&str> = text.trim().split(':').collect();
    let [day_hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };

    let (days, hours) = match day_hours.split_once('.') {
        Some((days, hours)) => (parse_number(days)?, parse_number(hours)?),
        None => (0, parse_number(day_hours)?),
    };
    let minutes = parse_number(minutes)?;
    let (seconds, nanos) = match seconds.split_once('.') {
        Some((seconds, fraction)) => (parse_number(seconds)?, parse_fraction(fraction)?),
        None => (parse_number(seconds)?, 0),
    };

    if (days > 0 && hours >= 24) || minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    let total_seconds = days
        .checked_mul(86_400)
        .and_then(|total| total.checked_add(hours.checked_mul(3600)?))
        .and_then(|total| total.checked_add(minutes * 60 + seconds))
        .ok_or_else(invalid)?;
    Ok(Duration::new(total_seconds, nanos))
}

fn parse_number(text: &str) -> Result<u64, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid number: {text:?}"));
    }
    text.parse().map_err(|e| format!("invalid number {text:?}: {e}"))
}

/// Fractional seconds, up to 7 digits, as nanoseconds
fn parse_fraction(text: &str) -> Result<u32, String> {
    if text.is_empty() || text.len() > FRACTION_DIGITS {
        return Err(format!("invalid fraction: {text:?}"));
    }

    let padded = format!("{text:0<9}");
    parse_number(&padded).map(|nanos| nanos as u32)
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timespan(*duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timespan(&text).map_err(serde::de::Error::custom)
}
