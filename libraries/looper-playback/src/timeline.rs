//! Timeline conversions and time formatting
//!
//! Percentages are 0-100 of the media duration, the unit the timeline and
//! boundary sliders speak.

use std::time::Duration;

/// Position as a percentage of `duration` (0 when duration is unknown)
pub fn time_to_percent(time: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    (time.as_secs_f64() / duration.as_secs_f64() * 100.0).clamp(0.0, 100.0)
}

/// Percentage of `duration` back to a time, clamped to `[0, duration]`
pub fn percent_to_time(percent: f64, duration: Duration) -> Duration {
    if !percent.is_finite() {
        return Duration::ZERO;
    }

    duration.mul_f64(percent.clamp(0.0, 100.0) / 100.0)
}

/// `mm:ss`, or `hh:mm:ss` from one hour up
pub fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// [`format_time`] with milliseconds: `mm:ss.mmm` or `hh:mm:ss.mmm`
pub fn format_time_precise(time: Duration) -> String {
    format!("{}.{:03}", format_time(time), time.subsec_millis())
}
