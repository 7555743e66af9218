//! Failure streak tracking and exponential backoff.
//!
//! The wait after a probe is the base interval while the host answers, and
//! `base * 2^streak` (capped at [`MAX_BACKOFF`]) once it stops answering.
//! Probe time is subtracted so the cadence does not drift with latency.

use std::time::Duration;

use tracing::debug;

/// Upper bound on the wait between probes of a failing host.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Consecutive failures are counted up to this value and no further.
pub const STREAK_CAP: u32 = 10;

/// Wait before the next probe for a given failure streak.
pub fn backoff(base: Duration, streak: u32) -> Duration {
    if streak == 0 {
        return base;
    }
    let factor = 1u32 << streak.min(STREAK_CAP);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Tracks the consecutive failure count for one worker.
#[derive(Debug, Default)]
pub struct BackoffTracker {
    consecutive_failures: u32,
}

impl BackoffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a probe outcome and return the new streak.
    pub fn record(&mut self, ok: bool) -> u32 {
        if ok {
            if self.consecutive_failures > 0 {
                debug!(
                    failures = self.consecutive_failures,
                    "streak reset after success"
                );
            }
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = (self.consecutive_failures + 1).min(STREAK_CAP);
        }
        self.consecutive_failures
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Backoff for the current streak with `elapsed` probe time taken off,
    /// floored at zero.
    pub fn next_wait(&self, base: Duration, elapsed: Duration) -> Duration {
        backoff(base, self.consecutive_failures).saturating_sub(elapsed)
    }
}
