//! Configuration for link behavior and reconnection parameters.

use std::time::Duration;

/// Construction options for a [`Link`](crate::Link).
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Target endpoint address handed to the transport on every attempt.
    pub url: String,

    /// Initial delay before a scheduled reconnection attempt.
    pub min_delay: Duration,

    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,

    /// Retry budget before the automatic loop gives up.
    /// `None` means unlimited retries.
    pub max_attempts: Option<u32>,

    /// Whether sends issued while not open are buffered for replay.
    /// When false, such sends are dropped.
    pub use_message_buffer: bool,

    /// Whether construction immediately begins connecting.
    pub auto_connect: bool,

    /// Maximum number of buffered payloads; enqueueing into a full
    /// buffer evicts the oldest. `None` means unbounded.
    pub max_buffer: Option<usize>,

    /// Optional bound on a single open attempt. `None` leaves the
    /// attempt to run until the transport resolves it.
    pub connect_timeout: Option<Duration>,

    /// Symmetric jitter applied to retry delays, as a fraction of the
    /// computed delay (0.25 means +-25%). Zero disables jitter. Jittered
    /// delays are clamped back to `[min_delay, max_delay]`.
    pub jitter: f64,
}

impl LinkConfig {
    /// Create a configuration for `url` with default behavior:
    /// 1s..5s backoff, unlimited retries, buffering on, auto-connect on.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            max_attempts: None,
            use_message_buffer: true,
            auto_connect: true,
            max_buffer: None,
            connect_timeout: None,
            jitter: 0.0,
        }
    }

    /// Set the backoff bounds. A `max` below `min` is raised to `min`.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    /// Cap the automatic retry loop at `attempts` scheduled retries.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Drop, rather than buffer, messages sent while not open.
    pub fn without_buffering(mut self) -> Self {
        self.use_message_buffer = false;
        self
    }

    /// Bound the buffer to `capacity` payloads, evicting the oldest.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.max_buffer = Some(capacity);
        self
    }

    /// Require an explicit `connect()` call instead of connecting at
    /// construction.
    pub fn manual_connect(mut self) -> Self {
        self.auto_connect = false;
        self
    }

    /// Bound each open attempt to `timeout`.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Apply symmetric jitter to retry delays. The fraction is clamped
    /// to `[0.0, 1.0]`.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_fraction_is_clamped() {
        assert_eq!(LinkConfig::new("u").with_jitter(5.0).jitter, 1.0);
        assert_eq!(LinkConfig::new("u").with_jitter(-1.0).jitter, 0.0);
        assert_eq!(LinkConfig::new("u").with_jitter(f64::NAN).jitter, 0.0);
        assert_eq!(LinkConfig::new("u").with_jitter(0.25).jitter, 0.25);
    }
}
