//! Error types for link operations.

use thiserror::Error;

/// Failures surfaced through the link's `error` event.
///
/// None of these terminate the host process: open failures and lost
/// connections are recovered by the retry loop, and an exhausted retry
/// budget parks the link until `connect()` is called again. A send
/// attempted while not open is not an error at all; it is reflected in
/// [`SendOutcome`](crate::SendOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The transport could not establish a connection.
    #[error("transport open failed: {reason}")]
    OpenFailed {
        /// Transport-reported cause.
        reason: String,
    },

    /// The transport dropped or errored after having been open.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Transport-reported cause.
        reason: String,
    },

    /// The automatic retry loop exceeded its attempt budget and gave up.
    #[error("gave up after {attempts} reconnect attempts")]
    RetryExhausted {
        /// Number of scheduled retries performed before giving up.
        attempts: u32,
    },
}
