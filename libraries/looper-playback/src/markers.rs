//! Marker and boundary editing
//!
//! Two independent protocols:
//! - two-point creation: a pending start marker followed by an end mark
//!   (or a press-and-hold over the range)
//! - live boundary drag: start/end of the looping segment moved in
//!   percent-of-duration space, converted back to times only on commit

use crate::error::{PlaybackError, Result};
use crate::timeline::percent_to_time;
use std::time::{Duration, Instant};

/// Minimum distance between the two drag handles, in percent
pub const MIN_SEPARATION_PERCENT: f64 = 1.0;

/// Resolve a pending start and the current time into a segment range
///
/// Reversed marks are swapped; identical marks are rejected.
pub fn resolve_marks(pending_start: Duration, now: Duration) -> Result<(Duration, Duration)> {
    match now.cmp(&pending_start) {
        std::cmp::Ordering::Greater => Ok((pending_start, now)),
        std::cmp::Ordering::Less => Ok((now, pending_start)),
        std::cmp::Ordering::Equal => Err(PlaybackError::InvalidBoundary(
            "segment start and end are the same".to_string(),
        )),
    }
}

/// Handle positions of the segment being edited by drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryDrag {
    start_percent: f64,
    end_percent: f64,
    visible: bool,
}

impl Default for BoundaryDrag {
    fn default() -> Self {
        Self {
            start_percent: 0.0,
            end_percent: 100.0,
            visible: false,
        }
    }
}

impl BoundaryDrag {
    /// Place both handles and make them visible
    pub fn show(&mut self, start_percent: f64, end_percent: f64) {
        self.start_percent = start_percent.clamp(0.0, 100.0);
        self.end_percent = end_percent.clamp(0.0, 100.0);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn start_percent(&self) -> f64 {
        self.start_percent
    }

    pub fn end_percent(&self) -> f64 {
        self.end_percent
    }

    /// Move the start handle; returns the applied position
    ///
    /// A value within [`MIN_SEPARATION_PERCENT`] of the end handle (or past
    /// it) lands at `end - 1`, never below zero.
    pub fn set_start(&mut self, percent: f64) -> f64 {
        let percent = if percent.is_finite() { percent } else { 0.0 };
        let limit = self.end_percent - MIN_SEPARATION_PERCENT;

        self.start_percent = if percent > limit {
            limit.max(0.0)
        } else {
            percent.max(0.0)
        };
        self.start_percent
    }

    /// Move the end handle; returns the applied position
    ///
    /// Mirrors [`set_start`](Self::set_start): lands at `start + 1` at the
    /// lowest, never above 100.
    pub fn set_end(&mut self, percent: f64) -> f64 {
        let percent = if percent.is_finite() { percent } else { 100.0 };
        let limit = self.start_percent + MIN_SEPARATION_PERCENT;

        self.end_percent = if percent < limit {
            limit.min(100.0)
        } else {
            percent.min(100.0)
        };
        self.end_percent
    }

    /// Convert the handles back to a time range
    ///
    /// Fails when the range collapses (unknown duration or handles pinned
    /// together at an edge).
    pub fn to_times(&self, duration: Duration) -> Result<(Duration, Duration)> {
        let start = percent_to_time(self.start_percent, duration);
        let end = percent_to_time(self.end_percent, duration);

        if end <= start {
            return Err(PlaybackError::InvalidBoundary(format!(
                "end {:?} is not after start {:?}",
                end, start
            )));
        }

        Ok((start, end))
    }
}

/// Press-and-hold recording in progress
#[derive(Debug, Clone, Copy)]
pub struct HoldRecord {
    started_at: Instant,
    start_time: Duration,
}

impl HoldRecord {
    pub fn begin(start_time: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            start_time,
        }
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    pub fn held_for(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Range recorded by the hold, if it was held long enough
    ///
    /// Short presses yield `Ok(None)`.
    pub fn finish(&self, now: Duration, min_hold: Duration) -> Result<Option<(Duration, Duration)>> {
        if self.held_for() < min_hold {
            return Ok(None);
        }

        resolve_marks(self.start_time, now).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn marks_in_order_pass_through() {
        assert_eq!(resolve_marks(secs(5), secs(10)).unwrap(), (secs(5), secs(10)));
    }

    #[test]
    fn reversed_marks_are_swapped() {
        assert_eq!(resolve_marks(secs(10), secs(5)).unwrap(), (secs(5), secs(10)));
    }

    #[test]
    fn identical_marks_are_rejected() {
        assert!(matches!(
            resolve_marks(secs(7), secs(7)),
            Err(PlaybackError::InvalidBoundary(_))
        ));
    }

    #[test]
    fn start_cannot_reach_end() {
        let mut drag = BoundaryDrag::default();
        drag.show(10.0, 50.0);

        assert_eq!(drag.set_start(60.0), 49.0);
        assert_eq!(drag.set_start(50.0), 49.0);
        assert_eq!(drag.set_start(20.0), 20.0);
        assert_eq!(drag.set_start(-5.0), 0.0);
    }

    #[test]
    fn end_cannot_reach_start() {
        let mut drag = BoundaryDrag::default();
        drag.show(10.0, 50.0);

        assert_eq!(drag.set_end(5.0), 11.0);
        assert_eq!(drag.set_end(10.0), 11.0);
        assert_eq!(drag.set_end(80.0), 80.0);
        assert_eq!(drag.set_end(120.0), 100.0);
    }

    #[test]
    fn clamping_respects_edges() {
        let mut drag = BoundaryDrag::default();
        drag.show(99.5, 100.0);
        assert_eq!(drag.set_end(0.0), 100.0);

        drag.show(0.0, 0.5);
        assert_eq!(drag.set_start(10.0), 0.0);
    }

    #[test]
    fn to_times_converts_percentages() {
        let mut drag = BoundaryDrag::default();
        drag.show(10.0, 50.0);

        let (start, end) = drag.to_times(secs(200)).unwrap();
        assert_eq!(start, secs(20));
        assert_eq!(end, secs(100));
    }

    #[test]
    fn to_times_rejects_unknown_duration() {
        let mut drag = BoundaryDrag::default();
        drag.show(10.0, 50.0);
        assert!(drag.to_times(Duration::ZERO).is_err());
    }

    #[test]
    fn short_hold_is_discarded() {
        let hold = HoldRecord::begin(secs(3));
        assert_eq!(hold.finish(secs(8), secs(60)).unwrap(), None);
    }

    #[test]
    fn long_enough_hold_yields_range() {
        let hold = HoldRecord::begin(secs(3));
        assert_eq!(
            hold.finish(secs(8), Duration::ZERO).unwrap(),
            Some((secs(3), secs(8)))
        );
    }
}
