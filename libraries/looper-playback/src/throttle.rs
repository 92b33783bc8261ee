//! Seek throttling for interactive drags
//!
//! Timeline scrubbing and boundary-marker drags fire a position change per
//! pointer event. The backend queues every seek, so at most one is let
//! through per window (50 ms by default); the final position is always
//! applied unthrottled on release.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::fmt;
use std::time::Duration;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket with one cell per window and no burst
pub struct SeekThrottle {
    window: Duration,
    /// `None` when the window is zero (throttling disabled)
    limiter: Option<DirectLimiter>,
}

impl SeekThrottle {
    /// Create a throttle allowing one seek per `window`
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            limiter: Quota::with_period(window).map(RateLimiter::direct),
        }
    }

    /// Whether a seek may be issued now; consumes the cell if so
    pub fn try_acquire(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }

    /// Start a fresh window, so the next seek passes immediately
    pub fn reset(&mut self) {
        self.limiter = Quota::with_period(self.window).map(RateLimiter::direct);
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl fmt::Debug for SeekThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeekThrottle")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seek_passes_then_throttles() {
        let throttle = SeekThrottle::new(Duration::from_secs(60));

        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
        assert!(!throttle.try_acquire());
    }

    #[test]
    fn reset_opens_a_new_window() {
        let mut throttle = SeekThrottle::new(Duration::from_secs(60));
        assert!(throttle.try_acquire());

        throttle.reset();
        assert!(throttle.try_acquire());
    }

    #[test]
    fn seek_passes_again_after_window() {
        let throttle = SeekThrottle::new(Duration::from_millis(20));
        assert!(throttle.try_acquire());

        std::thread::sleep(Duration::from_millis(40));
        assert!(throttle.try_acquire());
    }

    #[test]
    fn zero_window_never_throttles() {
        let throttle = SeekThrottle::new(Duration::ZERO);
        for _ in 0..10 {
            assert!(throttle.try_acquire());
        }
    }
}
