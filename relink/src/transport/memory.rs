//! In-process transport with scripted open attempts.
//!
//! Primarily useful for tests and demos: every `open` call travels to a
//! [`MemoryAcceptor`], which decides per attempt whether to accept,
//! refuse, or leave it pending. An accepted attempt yields a
//! [`MemoryEndpoint`] through which the script delivers inbound
//! payloads, observes what the link transmitted, and injects orderly
//! closes or faults.

use async_trait::async_trait;
use std::io;
use tokio::sync::{mpsc, oneshot};

use crate::transport::{Connection, Transport};

/// Inbound signal for the client side of an accepted connection.
enum Frame {
    Payload(Vec<u8>),
    Close,
    Fault(String),
}

struct OpenRequest {
    url: String,
    reply: oneshot::Sender<Result<MemoryConnection, String>>,
}

/// Client half: a [`Transport`] whose attempts are resolved by the
/// paired [`MemoryAcceptor`].
#[derive(Clone)]
pub struct MemoryTransport {
    opens: mpsc::UnboundedSender<OpenRequest>,
}

impl MemoryTransport {
    /// Create a connected transport/acceptor pair.
    pub fn new() -> (Self, MemoryAcceptor) {
        let (opens_tx, opens_rx) = mpsc::unbounded_channel();
        (
            Self { opens: opens_tx },
            MemoryAcceptor { opens: opens_rx },
        )
    }
}

#[async_trait(?Send)]
impl Transport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn open(&self, url: &str) -> io::Result<MemoryConnection> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.opens
            .send(OpenRequest {
                url: url.to_string(),
                reply: reply_tx,
            })
            .map_err(|_| {
                io::Error::new(io::ErrorKind::ConnectionRefused, "acceptor dropped")
            })?;

        match reply_rx.await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(reason)) => Err(io::Error::new(io::ErrorKind::ConnectionRefused, reason)),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "open attempt dropped",
            )),
        }
    }
}

/// Server half: receives open attempts in order.
pub struct MemoryAcceptor {
    opens: mpsc::UnboundedReceiver<OpenRequest>,
}

impl MemoryAcceptor {
    /// Wait for the next open attempt. Returns `None` once every
    /// [`MemoryTransport`] clone has been dropped.
    pub async fn next_open(&mut self) -> Option<OpenAttempt> {
        self.opens.recv().await.map(|request| OpenAttempt {
            url: request.url,
            reply: request.reply,
        })
    }

    /// Take an already-arrived open attempt without waiting.
    pub fn try_next_open(&mut self) -> Option<OpenAttempt> {
        self.opens.try_recv().ok().map(|request| OpenAttempt {
            url: request.url,
            reply: request.reply,
        })
    }
}

/// One pending open attempt awaiting a decision.
pub struct OpenAttempt {
    url: String,
    reply: oneshot::Sender<Result<MemoryConnection, String>>,
}

impl OpenAttempt {
    /// The url the client asked to open.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Accept the attempt, yielding the server-side endpoint.
    pub fn accept(self) -> MemoryEndpoint {
        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();
        let (to_server_tx, to_server_rx) = mpsc::unbounded_channel();

        let connection = MemoryConnection {
            outbound: to_server_tx,
            inbound: to_client_rx,
        };
        let _ = self.reply.send(Ok(connection));

        MemoryEndpoint {
            to_client: to_client_tx,
            from_client: to_server_rx,
        }
    }

    /// Refuse the attempt; the client's `open` resolves with an error.
    pub fn refuse(self, reason: &str) {
        let _ = self.reply.send(Err(reason.to_string()));
    }
}

/// Server-side control surface for one accepted connection.
pub struct MemoryEndpoint {
    to_client: mpsc::UnboundedSender<Frame>,
    from_client: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryEndpoint {
    /// Deliver one payload to the client.
    pub fn deliver(&self, payload: Vec<u8>) {
        let _ = self.to_client.send(Frame::Payload(payload));
    }

    /// Close the connection in an orderly fashion; the client's `recv`
    /// resolves `Ok(None)`.
    pub fn close(&self) {
        let _ = self.to_client.send(Frame::Close);
    }

    /// Fail the connection; the client's `recv` resolves with an error.
    pub fn fail(&self, reason: &str) {
        let _ = self.to_client.send(Frame::Fault(reason.to_string()));
    }

    /// Wait for the next payload transmitted by the client. Returns
    /// `None` once the client connection has been dropped and all its
    /// payloads consumed.
    pub async fn received(&mut self) -> Option<Vec<u8>> {
        self.from_client.recv().await
    }

    /// Take an already-transmitted payload without waiting.
    pub fn try_received(&mut self) -> Option<Vec<u8>> {
        self.from_client.try_recv().ok()
    }
}

/// Client-side connection produced by an accepted open attempt.
#[derive(Debug)]
pub struct MemoryConnection {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait(?Send)]
impl Connection for MemoryConnection {
    async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.outbound
            .send(payload.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "endpoint dropped"))
    }

    async fn recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.inbound.recv().await {
            Some(Frame::Payload(payload)) => Ok(Some(payload)),
            Some(Frame::Close) | None => Ok(None),
            Some(Frame::Fault(reason)) => {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, reason))
            }
        }
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn accepted_attempt_carries_payloads_both_ways() {
        let (transport, mut acceptor) = MemoryTransport::new();

        let open = transport.open("mem://server");
        tokio::pin!(open);
        // Drive the open future far enough to enqueue the attempt.
        assert!(futures_poll_once(open.as_mut()).await.is_none());

        let attempt = acceptor.try_next_open().expect("attempt queued");
        assert_eq!(attempt.url(), "mem://server");
        let mut endpoint = attempt.accept();

        let mut connection = open.await.expect("accepted");
        connection.send(b"ping").await.expect("send");
        assert_eq!(endpoint.received().await, Some(b"ping".to_vec()));

        endpoint.deliver(b"pong".to_vec());
        assert_eq!(connection.recv().await.expect("recv"), Some(b"pong".to_vec()));

        endpoint.close();
        assert_eq!(connection.recv().await.expect("recv"), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn refused_attempt_errors_the_open() {
        let (transport, mut acceptor) = MemoryTransport::new();

        let open = transport.open("mem://server");
        tokio::pin!(open);
        assert!(futures_poll_once(open.as_mut()).await.is_none());

        acceptor
            .try_next_open()
            .expect("attempt queued")
            .refuse("connection refused");

        let error = open.await.expect_err("refused");
        assert_eq!(error.kind(), io::ErrorKind::ConnectionRefused);
    }

    /// Poll a future exactly once, returning its output if ready.
    async fn futures_poll_once<F: std::future::Future + Unpin>(future: F) -> Option<F::Output> {
        use std::future::Future;
        use std::pin::Pin;
        use std::task::{Context, Poll};

        struct PollOnce<F>(Option<F>);
        impl<F: Future + Unpin> Future for PollOnce<F> {
            type Output = Option<F::Output>;
            fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
                let mut inner = self.0.take().expect("polled after completion");
                match Pin::new(&mut inner).poll(cx) {
                    Poll::Ready(output) => Poll::Ready(Some(output)),
                    Poll::Pending => Poll::Ready(None),
                }
            }
        }
        PollOnce(Some(future)).await
    }
}
