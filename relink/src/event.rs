//! Lifecycle and data events emitted by a link.

use crate::link::LinkError;

/// Event emitted by the link state machine to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A transport connection reached open.
    Open,
    /// A payload arrived from the remote side.
    Message(Vec<u8>),
    /// The live transport connection was torn down, either by the remote
    /// side or by an explicit close.
    Close,
    /// A recoverable or terminal failure, see [`LinkError`].
    Error(LinkError),
}

/// Sink for link events, injected into the state machine at construction.
///
/// `notify` is fire-and-forget: the state machine never inspects a result
/// and a slow or failing sink must not block it. Implementations are
/// expected to hand the event off (push to a channel, record, log) and
/// return promptly.
pub trait EventSink {
    /// Deliver one event to the subscriber.
    fn notify(&self, event: LinkEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: LinkEvent) {}
}

/// Forward events into an unbounded channel; a closed receiver drops
/// events silently, preserving fire-and-forget semantics.
impl EventSink for tokio::sync::mpsc::UnboundedSender<LinkEvent> {
    fn notify(&self, event: LinkEvent) {
        let _ = self.send(event);
    }
}
