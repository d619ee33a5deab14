//! Core link implementation: state machine, retry loop, and send path.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::backoff::Backoff;
use crate::buffer::MessageBuffer;
use crate::event::{EventSink, LinkEvent};
use crate::link::{LinkConfig, LinkError, LinkMetrics};
use crate::providers::Providers;
use crate::random::RandomProvider;
use crate::task::TaskProvider;
use crate::time::TimeProvider;
use crate::transport::{Connection, Transport};

/// Lifecycle state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and no open attempt in flight. A retry may be
    /// scheduled while in this state.
    Closed,
    /// An open attempt is in flight.
    Opening,
    /// A connection is established and usable.
    Open,
    /// An explicit close was requested and teardown is in progress.
    Closing,
}

/// Result of a [`Link::send`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The payload was handed to the open connection's transmit queue.
    Sent,
    /// No connection was open; the payload was buffered for replay.
    Queued,
    /// No connection was open and buffering is disabled; the payload
    /// was discarded.
    Dropped,
}

/// State shared between the link handle and its worker task.
struct Shared {
    config: LinkConfig,
    state: LinkState,
    /// Explicit close requested; the worker winds down when it sees this.
    closing: bool,
    /// The worker should be connecting or connected. Cleared by an
    /// explicit close and by retry exhaustion.
    connect_requested: bool,
    /// A retry sleep is in progress, so `connect()` has nothing to do.
    retry_pending: bool,
    backoff: Backoff,
    buffer: MessageBuffer,
    /// Payloads accepted for transmission on the live connection.
    outbox: std::collections::VecDeque<Vec<u8>>,
    metrics: LinkMetrics,
}

/// A resilient client-side connection.
///
/// Wraps a [`Transport`] endpoint and keeps it connected: failed opens
/// and lost connections are retried with exponential backoff, and sends
/// issued while no connection is open are buffered and replayed once one
/// is (unless buffering is disabled). Lifecycle changes and inbound
/// payloads are delivered through the [`EventSink`] supplied at
/// construction.
///
/// All work happens on a single worker task spawned through the
/// [`TaskProvider`], so the handle methods are synchronous and cheap:
/// they update shared state and wake the worker.
pub struct Link<T: Transport, P: Providers> {
    shared: Rc<RefCell<Shared>>,
    wake: Rc<Notify>,
    worker: RefCell<Option<tokio::task::JoinHandle<()>>>,
    transport: T,
    providers: P,
    sink: Rc<dyn EventSink>,
}

impl<T: Transport, P: Providers> Link<T, P> {
    /// Create a link. With `auto_connect` set in the configuration the
    /// first open attempt begins immediately; otherwise the link stays
    /// closed until [`connect`](Self::connect) is called.
    pub fn new(
        transport: T,
        config: LinkConfig,
        providers: P,
        sink: impl EventSink + 'static,
    ) -> Self {
        let backoff = Backoff::new(config.min_delay, config.max_delay);
        let buffer = MessageBuffer::new(config.max_buffer);
        let connect_requested = config.auto_connect;

        let shared = Rc::new(RefCell::new(Shared {
            config,
            state: LinkState::Closed,
            closing: false,
            connect_requested,
            retry_pending: false,
            backoff,
            buffer,
            outbox: std::collections::VecDeque::new(),
            metrics: LinkMetrics::default(),
        }));
        let wake = Rc::new(Notify::new());
        let sink: Rc<dyn EventSink> = Rc::new(sink);

        let link = Self {
            shared,
            wake,
            worker: RefCell::new(None),
            transport,
            providers,
            sink,
        };
        link.ensure_worker();
        link
    }

    /// Begin connecting if the link is not already open, opening, or
    /// waiting on a scheduled retry. Re-arms a link parked by retry
    /// exhaustion or closed explicitly; the backoff attempt count is not
    /// reset, only a successful open does that.
    ///
    /// Called while a close is still being carried out, the request is
    /// latched: the worker reconnects as soon as teardown completes.
    pub fn connect(&self) {
        {
            let mut shared = self.shared.borrow_mut();
            if shared.state == LinkState::Closing {
                shared.connect_requested = true;
                return;
            }
            shared.closing = false;
            if matches!(shared.state, LinkState::Open | LinkState::Opening) {
                return;
            }
            if shared.retry_pending {
                return;
            }
            shared.connect_requested = true;
        }
        self.ensure_worker();
        self.wake.notify_one();
    }

    /// Hand a payload to the link for transmission.
    ///
    /// Never blocks. With a connection open the payload joins the
    /// transmit queue and [`SendOutcome::Sent`] is returned; delivery is
    /// then subject to the connection staying up. Otherwise the payload
    /// is buffered for replay ([`SendOutcome::Queued`]) or, with
    /// buffering disabled, discarded ([`SendOutcome::Dropped`]).
    pub fn send(&self, payload: impl Into<Vec<u8>>) -> SendOutcome {
        let outcome = {
            let mut shared = self.shared.borrow_mut();
            if shared.state == LinkState::Open && !shared.closing {
                shared.outbox.push_back(payload.into());
                SendOutcome::Sent
            } else if shared.config.use_message_buffer {
                if shared.buffer.enqueue(payload.into()).is_some() {
                    shared.metrics.record_message_dropped();
                }
                shared.metrics.record_message_queued();
                tracing::debug!(buffered = shared.buffer.len(), "payload queued while not open");
                SendOutcome::Queued
            } else {
                shared.metrics.record_message_dropped();
                SendOutcome::Dropped
            }
        };
        if outcome == SendOutcome::Sent {
            self.wake.notify_one();
        }
        outcome
    }

    /// Request an orderly shutdown.
    ///
    /// Synchronous and idempotent: any scheduled retry is cancelled, an
    /// in-flight open attempt is discarded on completion, and a live
    /// connection is closed (emitting `Close`). Buffered payloads are
    /// kept and replayed if the link is later reconnected with
    /// [`connect`](Self::connect). Await [`closed`](Self::closed) for
    /// the worker to finish winding down.
    pub fn close(&self) {
        {
            let mut shared = self.shared.borrow_mut();
            shared.closing = true;
            shared.connect_requested = false;
            if matches!(shared.state, LinkState::Open | LinkState::Opening) {
                shared.state = LinkState::Closing;
            }
        }
        self.wake.notify_one();
    }

    /// Wait for the worker task to finish after a [`close`](Self::close).
    pub async fn closed(&self) {
        let handle = self.worker.borrow_mut().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.shared.borrow().state
    }

    /// Whether a connection is currently open.
    pub fn is_open(&self) -> bool {
        self.shared.borrow().state == LinkState::Open
    }

    /// Number of payloads waiting in the replay buffer.
    pub fn buffered(&self) -> usize {
        self.shared.borrow().buffer.len()
    }

    /// Snapshot of the link's metrics.
    pub fn metrics(&self) -> LinkMetrics {
        self.shared.borrow().metrics.clone()
    }

    /// The endpoint url this link targets.
    pub fn url(&self) -> String {
        self.shared.borrow().config.url.clone()
    }

    /// Spawn the worker task if none is running.
    ///
    /// The worker exits once it observes an explicit close, so a
    /// `connect()` after `closed().await` needs a fresh one.
    fn ensure_worker(&self) {
        let mut worker = self.worker.borrow_mut();
        let running = worker.as_ref().is_some_and(|handle| !handle.is_finished());
        if running {
            return;
        }
        let driver = LinkWorker {
            shared: Rc::clone(&self.shared),
            wake: Rc::clone(&self.wake),
            transport: self.transport.clone(),
            providers: self.providers.clone(),
            sink: Rc::clone(&self.sink),
        };
        *worker = Some(
            self.providers
                .task()
                .spawn_task("link-worker", async move { driver.run().await }),
        );
    }
}

impl<T: Transport, P: Providers> Drop for Link<T, P> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.closing = true;
            shared.connect_requested = false;
        }
        self.wake.notify_one();
    }
}

/// How a live session ended.
enum SessionEnd {
    /// Torn down by an explicit close; the worker winds down.
    Explicit,
    /// The connection dropped or errored; the retry loop takes over.
    Lost,
}

/// The background task driving a link's lifecycle.
///
/// Owns the live connection exclusively. A connection belonging to a
/// superseded attempt is never polled again, so its events cannot reach
/// current state.
struct LinkWorker<T: Transport, P: Providers> {
    shared: Rc<RefCell<Shared>>,
    wake: Rc<Notify>,
    transport: T,
    providers: P,
    sink: Rc<dyn EventSink>,
}

impl<T: Transport, P: Providers> LinkWorker<T, P> {
    async fn run(&self) {
        loop {
            // Park until connecting is requested or the link is closing.
            loop {
                {
                    let mut shared = self.shared.borrow_mut();
                    if shared.closing {
                        if !shared.connect_requested {
                            return;
                        }
                        // A connect() was latched while the close was in
                        // progress; honor it now that teardown is done.
                        shared.closing = false;
                    }
                    if shared.connect_requested {
                        break;
                    }
                }
                self.wake.notified().await;
            }
            self.connect_cycle().await;
        }
    }

    /// Drive attempts and sessions until an explicit close or retry
    /// exhaustion parks the link.
    async fn connect_cycle(&self) {
        let mut delay_next = false;
        loop {
            if self.shared.borrow().closing {
                self.finish_closing();
                return;
            }
            if delay_next && !self.schedule_retry().await {
                return;
            }

            {
                let mut shared = self.shared.borrow_mut();
                shared.state = LinkState::Opening;
                shared.metrics.record_connection_attempt();
            }
            match self.open_attempt().await {
                Ok(mut connection) => {
                    if self.shared.borrow().closing {
                        // The open raced an explicit close; the
                        // connection never became the live session.
                        connection.close().await;
                        self.finish_closing();
                        return;
                    }
                    match self.open_phase(connection).await {
                        SessionEnd::Explicit => return,
                        SessionEnd::Lost => delay_next = true,
                    }
                }
                Err(reason) => {
                    tracing::warn!(url = %self.url(), %reason, "open attempt failed");
                    {
                        let mut shared = self.shared.borrow_mut();
                        shared.state = LinkState::Closed;
                        shared.metrics.record_connection_failure();
                    }
                    self.sink.notify(LinkEvent::Error(LinkError::OpenFailed { reason }));
                    delay_next = true;
                }
            }
        }
    }

    /// Sleep for the next backoff delay, cancellable by wakeups.
    ///
    /// Returns false when the link should stop retrying: an explicit
    /// close arrived, or the retry budget is exhausted (in which case
    /// `RetryExhausted` is emitted and the link parks until the next
    /// explicit `connect()`).
    async fn schedule_retry(&self) -> bool {
        let delay = {
            let mut shared = self.shared.borrow_mut();
            if let Some(max) = shared.config.max_attempts {
                if shared.backoff.attempts() >= max {
                    let attempts = shared.backoff.attempts();
                    shared.connect_requested = false;
                    drop(shared);
                    tracing::warn!(url = %self.url(), attempts, "retry budget exhausted");
                    self.sink
                        .notify(LinkEvent::Error(LinkError::RetryExhausted { attempts }));
                    return false;
                }
            }
            let base = shared.backoff.delay();
            let min = shared.backoff.min_delay();
            let max = shared.backoff.max_delay();
            let jitter = shared.config.jitter;
            let delay = apply_jitter(base, jitter, min, max, self.providers.random());
            shared.metrics.record_retry_scheduled(delay);
            shared.retry_pending = true;
            delay
        };
        tracing::debug!(url = %self.url(), ?delay, "retry scheduled");

        let time = self.providers.time();
        let started = time.now();
        let cancelled = loop {
            if self.shared.borrow().closing {
                break true;
            }
            let elapsed = time.now().saturating_sub(started);
            if elapsed >= delay {
                break false;
            }
            tokio::select! {
                _ = time.sleep(delay - elapsed) => {}
                _ = self.wake.notified() => {}
            }
        };
        self.shared.borrow_mut().retry_pending = false;
        !cancelled
    }

    /// One open attempt, bounded by the configured connect timeout.
    async fn open_attempt(&self) -> Result<T::Connection, String> {
        let (url, timeout) = {
            let shared = self.shared.borrow();
            (shared.config.url.clone(), shared.config.connect_timeout)
        };
        match timeout {
            Some(limit) => match self
                .providers
                .time()
                .timeout(limit, self.transport.open(&url))
                .await
            {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("open attempt exceeded {limit:?}")),
            },
            None => self.transport.open(&url).await.map_err(|e| e.to_string()),
        }
    }

    /// Run one live session until it ends.
    async fn open_phase(&self, mut connection: T::Connection) -> SessionEnd {
        {
            let mut shared = self.shared.borrow_mut();
            shared.state = LinkState::Open;
            shared.backoff.reset();
            shared.metrics.record_connection_success();
            // Replay everything buffered while the link was down, ahead
            // of anything sent from here on.
            let replay = shared.buffer.drain();
            for payload in replay.into_iter().rev() {
                shared.outbox.push_front(payload);
            }
        }
        tracing::info!(url = %self.url(), "connection open");
        self.sink.notify(LinkEvent::Open);

        loop {
            if self.shared.borrow().closing {
                connection.close().await;
                self.end_session();
                return SessionEnd::Explicit;
            }

            // Flush before blocking so a send that raced the last wakeup
            // is never stranded in the outbox.
            while let Some(payload) = self.next_outgoing() {
                match connection.send(&payload).await {
                    Ok(()) => self.shared.borrow_mut().metrics.record_message_sent(),
                    Err(error) => {
                        self.requeue_unsent(payload);
                        self.sink.notify(LinkEvent::Error(LinkError::ConnectionLost {
                            reason: error.to_string(),
                        }));
                        self.end_session();
                        return SessionEnd::Lost;
                    }
                }
            }

            tokio::select! {
                _ = self.wake.notified() => {}
                inbound = connection.recv() => match inbound {
                    Ok(Some(payload)) => {
                        let mut shared = self.shared.borrow_mut();
                        if !shared.closing {
                            shared.metrics.record_message_received();
                            drop(shared);
                            self.sink.notify(LinkEvent::Message(payload));
                        }
                    }
                    Ok(None) => {
                        tracing::info!(url = %self.url(), "connection closed by remote");
                        self.end_session();
                        return SessionEnd::Lost;
                    }
                    Err(error) => {
                        tracing::warn!(url = %self.url(), %error, "connection lost");
                        self.sink.notify(LinkEvent::Error(LinkError::ConnectionLost {
                            reason: error.to_string(),
                        }));
                        self.end_session();
                        return SessionEnd::Lost;
                    }
                }
            }
        }
    }

    /// Tear down after a live session, emitting `Close`.
    ///
    /// Unsent outbox payloads flow back into the buffer for replay on
    /// the next session; with buffering disabled they are dropped.
    /// `connect_requested` is left alone: `close()` already cleared it,
    /// and a connect latched during teardown must survive.
    fn end_session(&self) {
        {
            let mut shared = self.shared.borrow_mut();
            shared.state = LinkState::Closed;
            shared.metrics.record_disconnected();
            // Unsent outbox payloads predate anything queued since the
            // session started closing, so they go back in first.
            let unsent: Vec<Vec<u8>> = shared.outbox.drain(..).collect();
            let queued = shared.buffer.drain();
            for payload in unsent.into_iter().chain(queued) {
                if shared.config.use_message_buffer {
                    if shared.buffer.enqueue(payload).is_some() {
                        shared.metrics.record_message_dropped();
                    }
                } else {
                    shared.metrics.record_message_dropped();
                }
            }
        }
        self.sink.notify(LinkEvent::Close);
    }

    /// Settle state when an explicit close interrupts connecting before
    /// any session went live. No `Close` is emitted: nothing was open.
    fn finish_closing(&self) {
        self.shared.borrow_mut().state = LinkState::Closed;
    }

    /// Put a payload that failed to transmit back at the front of the
    /// outbox so `end_session` can return it to the buffer first.
    fn requeue_unsent(&self, payload: Vec<u8>) {
        self.shared.borrow_mut().outbox.push_front(payload);
    }

    fn next_outgoing(&self) -> Option<Vec<u8>> {
        self.shared.borrow_mut().outbox.pop_front()
    }

    fn url(&self) -> String {
        self.shared.borrow().config.url.clone()
    }
}

/// Apply symmetric jitter to a delay and clamp it back into bounds.
///
/// The fraction is capped at 1.0 so the scale factor stays within
/// `[0.0, 2.0]`; non-finite or non-positive fractions disable jitter.
fn apply_jitter(
    delay: Duration,
    jitter: f64,
    min: Duration,
    max: Duration,
    random: &impl RandomProvider,
) -> Duration {
    if jitter.is_nan() || jitter <= 0.0 {
        return delay;
    }
    let jitter = jitter.min(1.0);
    let spread = jitter * (2.0 * random.random_ratio() - 1.0);
    delay.mul_f64((1.0 + spread).max(0.0)).clamp(min, max)
}
