//! Transport abstraction the link manages the lifecycle of.
//!
//! The link never touches a socket directly; it drives an opaque
//! capability: `open(url)` yields a connection that can send payloads,
//! yield inbound payloads, and eventually close or error. A fresh
//! connection is created for every attempt and never reused, and the
//! worker task owns the live connection exclusively, so events from a
//! superseded attempt have no path back into current state.

use async_trait::async_trait;
use std::io;

pub mod memory;
pub mod tcp;

/// Capability for opening connections to an endpoint.
#[async_trait(?Send)]
pub trait Transport: Clone + 'static {
    /// The connection type produced by a successful open.
    type Connection: Connection + 'static;

    /// Attempt to establish a connection to `url`.
    ///
    /// Resolving `Ok` corresponds to the transport's `opened`
    /// notification, `Err` to `errored` before open.
    async fn open(&self, url: &str) -> io::Result<Self::Connection>;
}

/// One established transport connection.
#[async_trait(?Send)]
pub trait Connection {
    /// Write one payload. Valid only between open and close.
    async fn send(&mut self, payload: &[u8]) -> io::Result<()>;

    /// Wait for the next inbound payload.
    ///
    /// `Ok(Some(payload))` is a message, `Ok(None)` an orderly close by
    /// the remote side, `Err` a connection error. After `Ok(None)` or
    /// `Err` the connection is dead. Implementations must be
    /// cancel-safe at their await point, as the caller races this
    /// against its own wakeups.
    async fn recv(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Request closure. Idempotent.
    async fn close(&mut self);
}
