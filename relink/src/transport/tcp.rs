//! TCP transport with length-prefixed, checksummed framing.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::transport::{Connection, Transport};
use crate::wire::{encode_frame, try_decode_frame};

/// Transport that opens framed TCP connections.
///
/// Each payload travels as one [`wire`](crate::wire) frame; a frame
/// codec error is treated as a connection error so the link tears the
/// session down and reconnects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    /// Create a new TCP transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Transport for TcpTransport {
    type Connection = TcpConnection;

    async fn open(&self, url: &str) -> io::Result<TcpConnection> {
        let stream = TcpStream::connect(url).await?;
        Ok(TcpConnection::new(stream))
    }
}

/// One framed TCP connection.
pub struct TcpConnection {
    stream: TcpStream,
    read_buffer: Vec<u8>,
}

impl TcpConnection {
    /// Wrap an established stream, e.g. one returned by a listener's
    /// `accept` on the server side of a test.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buffer: Vec::with_capacity(4096),
        }
    }
}

#[async_trait(?Send)]
impl Connection for TcpConnection {
    async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let frame = encode_frame(payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.stream.write_all(&frame).await
    }

    async fn recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            let decoded = try_decode_frame(&self.read_buffer)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            if let Some((payload, consumed)) = decoded {
                self.read_buffer.drain(..consumed);
                return Ok(Some(payload));
            }

            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                if self.read_buffer.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed mid-frame",
                ));
            }
            self.read_buffer.extend_from_slice(&chunk[..n]);
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
