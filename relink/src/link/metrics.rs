//! Counters tracking connection and message activity for a link.

use std::time::Duration;

/// Metrics for a single link.
#[derive(Debug, Clone, Default)]
pub struct LinkMetrics {
    /// Total number of connection attempts made.
    pub connection_attempts: u64,

    /// Total number of connections that reached open.
    pub connections_established: u64,

    /// Total number of failed open attempts.
    pub connection_failures: u64,

    /// Total number of payloads written to a transport.
    pub messages_sent: u64,

    /// Total number of payloads received from a transport.
    pub messages_received: u64,

    /// Total number of payloads absorbed by the buffer while not open.
    pub messages_queued: u64,

    /// Total number of payloads dropped: buffering disabled, buffer
    /// eviction, or unsent at session end without buffering.
    pub messages_dropped: u64,

    /// Consecutive failed open attempts since the last success.
    pub consecutive_failures: u32,

    /// Delay of the most recently scheduled retry.
    pub current_retry_delay: Duration,

    /// Whether a connection is currently open.
    pub is_connected: bool,
}

impl LinkMetrics {
    /// Record the start of an open attempt.
    pub fn record_connection_attempt(&mut self) {
        self.connection_attempts += 1;
    }

    /// Record a connection reaching open.
    pub fn record_connection_success(&mut self) {
        self.connections_established += 1;
        self.consecutive_failures = 0;
        self.is_connected = true;
    }

    /// Record a failed open attempt.
    pub fn record_connection_failure(&mut self) {
        self.connection_failures += 1;
        self.consecutive_failures += 1;
        self.is_connected = false;
    }

    /// Record a scheduled retry and its delay.
    pub fn record_retry_scheduled(&mut self, delay: Duration) {
        self.current_retry_delay = delay;
    }

    /// Record a payload written to the transport.
    pub fn record_message_sent(&mut self) {
        self.messages_sent += 1;
    }

    /// Record a payload received from the transport.
    pub fn record_message_received(&mut self) {
        self.messages_received += 1;
    }

    /// Record a payload buffered while not open.
    pub fn record_message_queued(&mut self) {
        self.messages_queued += 1;
    }

    /// Record a dropped payload.
    pub fn record_message_dropped(&mut self) {
        self.messages_dropped += 1;
    }

    /// Record the live connection going away.
    pub fn record_disconnected(&mut self) {
        self.is_connected = false;
    }
}
