//! Exponential backoff policy for reconnection scheduling.

use std::time::Duration;

/// Deterministic exponential backoff between reconnection attempts.
///
/// `delay()` returns `min_delay * 2^attempts` clamped to
/// `[min_delay, max_delay]` and increments the attempt counter. The
/// counter is reset to zero when a connection successfully opens, never
/// at any other point.
///
/// The policy itself is free of randomness so its schedule is fully
/// predictable in tests; jitter, when configured, is applied by the
/// caller through an injectable [`RandomProvider`](crate::RandomProvider).
#[derive(Debug, Clone)]
pub struct Backoff {
    min_delay: Duration,
    max_delay: Duration,
    attempts: u32,
}

impl Backoff {
    /// Create a new backoff policy with the given bounds.
    ///
    /// A `max_delay` smaller than `min_delay` is raised to `min_delay`.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            attempts: 0,
        }
    }

    /// Compute the delay for the next retry and increment the attempt count.
    ///
    /// Consecutive calls without an intervening [`reset`](Self::reset) are
    /// monotonically non-decreasing and never leave `[min_delay, max_delay]`.
    pub fn delay(&mut self) -> Duration {
        let delay = if self.attempts >= 32 {
            self.max_delay
        } else {
            self.min_delay
                .saturating_mul(1u32 << self.attempts)
                .clamp(self.min_delay, self.max_delay)
        };
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    /// Reset the attempt count after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Number of delays handed out since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Lower delay bound.
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Upper delay bound.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_until_capped() {
        let mut backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(40));

        assert_eq!(backoff.delay(), Duration::from_millis(10));
        assert_eq!(backoff.delay(), Duration::from_millis(20));
        assert_eq!(backoff.delay(), Duration::from_millis(40));
        assert_eq!(backoff.delay(), Duration::from_millis(40));
        assert_eq!(backoff.attempts(), 4);
    }

    #[test]
    fn delays_are_monotone_and_bounded() {
        let mut backoff = Backoff::new(Duration::from_millis(3), Duration::from_secs(7));

        let mut previous = Duration::ZERO;
        for _ in 0..64 {
            let delay = backoff.delay();
            assert!(delay >= previous);
            assert!(delay >= Duration::from_millis(3));
            assert!(delay <= Duration::from_secs(7));
            previous = delay;
        }
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(5));

        backoff.delay();
        backoff.delay();
        assert_eq!(backoff.attempts(), 2);

        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.delay(), Duration::from_millis(100));
    }

    #[test]
    fn inverted_bounds_are_normalized() {
        let mut backoff = Backoff::new(Duration::from_secs(2), Duration::from_millis(1));
        assert_eq!(backoff.delay(), Duration::from_secs(2));
        assert_eq!(backoff.delay(), Duration::from_secs(2));
    }
}
