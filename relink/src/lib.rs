//! # Relink
//!
//! Resilient client-side connection management over pluggable transports.
//!
//! This crate provides:
//! - **Link**: a connection wrapper with automatic reconnection,
//!   exponential backoff, and replay of messages buffered while down
//! - **Transports**: a framed TCP transport with CRC32C checksums, and
//!   an in-process transport for scripting connection outcomes in tests
//! - **Providers**: injectable time, task, and random sources so retry
//!   schedules run deterministically under tokio's paused test clock

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// =============================================================================
// Modules
// =============================================================================

/// Exponential backoff policy for reconnection scheduling.
pub mod backoff;

/// FIFO buffering of outbound messages while no connection is live.
pub mod buffer;

/// Lifecycle and data events emitted by a link.
pub mod event;

/// Resilient link connection management.
pub mod link;

/// Provider bundle for time, task, and random sources.
pub mod providers;

/// Random number generation provider abstraction.
pub mod random;

/// Task spawning abstraction.
pub mod task;

/// Time provider abstraction.
pub mod time;

/// Transport abstraction and bundled implementations.
pub mod transport;

/// Frame codec for stream transports.
pub mod wire;

// =============================================================================
// Public API Re-exports
// =============================================================================

// Link exports
pub use link::{Link, LinkConfig, LinkError, LinkMetrics, LinkState, SendOutcome};

// Policy exports
pub use backoff::Backoff;
pub use buffer::MessageBuffer;

// Event exports
pub use event::{EventSink, LinkEvent, NullSink};

// Provider exports
pub use providers::{Providers, TokioProviders};
pub use random::{RandomProvider, SeededRandomProvider, TokioRandomProvider};
pub use task::{TaskProvider, TokioTaskProvider};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};

// Transport exports
pub use transport::memory::{
    MemoryAcceptor, MemoryConnection, MemoryEndpoint, MemoryTransport, OpenAttempt,
};
pub use transport::tcp::{TcpConnection, TcpTransport};
pub use transport::{Connection, Transport};

// Wire format exports
pub use wire::{HEADER_SIZE, MAX_PAYLOAD_SIZE, WireError, encode_frame, try_decode_frame};
