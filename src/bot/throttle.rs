use chrono::{DateTime, Utc};
use governor::clock::{Clock, FakeRelativeClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

// Type alias for the rate limiter to simplify signatures
type DecisionLimiter = RateLimiter<
    NotKeyed,
    InMemoryState,
    FakeRelativeClock,
    NoOpMiddleware<<FakeRelativeClock as Clock>::Instant>,
>;

/// Debounce for bot decisions: at most one evaluation per interval
///
/// A single-cell GCRA limiter whose clock is advanced by observation
/// timestamps rather than the wall clock, so replayed feeds throttle exactly
/// like live ones. Rejected ticks never block; the caller just skips the
/// evaluation.
pub struct DecisionThrottle {
    limiter: DecisionLimiter,
    clock: FakeRelativeClock,
    interval: Duration,
    last_seen: Option<DateTime<Utc>>,
}

impl DecisionThrottle {
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let quota = Quota::with_period(interval).unwrap_or(Quota::per_second(NonZeroU32::MIN));
        let clock = FakeRelativeClock::default();
        let limiter = RateLimiter::direct_with_clock(quota, &clock);

        Self {
            limiter,
            clock,
            interval,
            last_seen: None,
        }
    }

    /// Returns true if an evaluation may run for an observation stamped `at`
    ///
    /// Timestamps older than the newest one seen do not move the clock back.
    pub fn admit(&mut self, at: DateTime<Utc>) -> bool {
        match self.last_seen {
            Some(previous) if at > previous => {
                if let Ok(elapsed) = (at - previous).to_std() {
                    self.clock.advance(elapsed);
                }
                self.last_seen = Some(at);
            }
            Some(_) => {}
            None => self.last_seen = Some(at),
        }

        self.limiter.check().is_ok()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for DecisionThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionThrottle")
            .field("interval", &self.interval)
            .field("last_seen", &self.last_seen)
            .finish()
    }
}
