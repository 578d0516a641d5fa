//! In-flight request tracking for the network-idle quiescence signal.
//!
//! The page is idle once at most `concurrency` requests are outstanding and
//! no request has started or finished for `idle_time`. A non-zero
//! concurrency tolerates background polling that never settles.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Default quiet period before a page counts as idle.
pub const DEFAULT_IDLE_TIME: Duration = Duration::from_millis(500);

/// Default bound on a single idle wait.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of one network-idle wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
    /// In-flight requests still considered idle.
    pub concurrency: usize,
    /// Required quiet period.
    pub idle_time: Duration,
    /// Upper bound on the wait.
    pub timeout: Duration,
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            concurrency: 0,
            idle_time: DEFAULT_IDLE_TIME,
            timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl IdleOptions {
    /// Returns a copy with a different concurrency tolerance.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Set of outstanding network requests plus the time of the last change.
#[derive(Debug)]
pub struct InflightTracker {
    in_flight: HashSet<String>,
    last_event: Instant,
}

impl Default for InflightTracker {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl InflightTracker {
    /// Creates an empty tracker whose quiet period starts at `now`.
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            last_event: now,
        }
    }

    /// Records a request start.
    pub fn request_started(&mut self, request_id: impl Into<String>, now: Instant) {
        self.in_flight.insert(request_id.into());
        self.last_event = now;
    }

    /// Records a request completion or failure. Unknown ids are ignored.
    pub fn request_finished(&mut self, request_id: &str, now: Instant) {
        if self.in_flight.remove(request_id) {
            self.last_event = now;
        }
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns true if the page counts as idle at `now`.
    #[must_use]
    pub fn is_idle(&self, now: Instant, concurrency: usize, idle_time: Duration) -> bool {
        self.in_flight.len() <= concurrency
            && now.saturating_duration_since(self.last_event) >= idle_time
    }

    /// Forgets outstanding requests, e.g. after a new document replaced the old one.
    pub fn reset(&mut self, now: Instant) {
        self.in_flight.clear();
        self.last_event = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn test_empty_tracker_idle_after_quiet_period() {
        let start = Instant::now();
        let tracker = InflightTracker::new(start);
        assert!(!tracker.is_idle(start, 0, QUIET));
        assert!(tracker.is_idle(start + QUIET, 0, QUIET));
    }

    #[test]
    fn test_outstanding_request_blocks_idle() {
        let start = Instant::now();
        let mut tracker = InflightTracker::new(start);
        tracker.request_started("1", start);
        assert_eq!(tracker.in_flight(), 1);
        assert!(!tracker.is_idle(start + QUIET * 4, 0, QUIET));

        tracker.request_finished("1", start + QUIET);
        assert!(!tracker.is_idle(start + QUIET, 0, QUIET));
        assert!(tracker.is_idle(start + QUIET * 2, 0, QUIET));
    }

    #[test]
    fn test_concurrency_tolerates_background_polling() {
        let start = Instant::now();
        let mut tracker = InflightTracker::new(start);
        tracker.request_started("poll-a", start);
        tracker.request_started("poll-b", start);

        assert!(!tracker.is_idle(start + QUIET, 1, QUIET));
        assert!(tracker.is_idle(start + QUIET, 2, QUIET));
    }

    #[test]
    fn test_unknown_finish_does_not_reset_quiet_period() {
        let start = Instant::now();
        let mut tracker = InflightTracker::new(start);
        tracker.request_finished("never-started", start + QUIET);
        assert!(tracker.is_idle(start + QUIET, 0, QUIET));
    }

    #[test]
    fn test_reset_clears_in_flight() {
        let start = Instant::now();
        let mut tracker = InflightTracker::new(start);
        tracker.request_started("1", start);
        tracker.reset(start + QUIET);
        assert_eq!(tracker.in_flight(), 0);
        assert!(tracker.is_idle(start + QUIET * 2, 0, QUIET));
    }

    #[test]
    fn test_idle_options_default_and_override() {
        let opts = IdleOptions::default();
        assert_eq!(opts.concurrency, 0);
        assert_eq!(opts.idle_time, DEFAULT_IDLE_TIME);
        assert_eq!(opts.with_concurrency(2).concurrency, 2);
    }
}
