//! Echo demo: a framed TCP echo server and a link that keeps itself
//! connected to it.
//!
//! Run with:
//! ```text
//! cargo run --example tcp_echo
//! ```

use std::error::Error;
use std::time::Duration;

use relink::{
    Connection, Link, LinkConfig, LinkEvent, TcpConnection, TcpTransport, TokioProviders,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let local = tokio::task::LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    tracing::info!(%addr, "echo server listening");

    tokio::task::spawn_local(async move {
        loop {
            let Ok((stream, peer)) = listener.accept().await else {
                return;
            };
            tracing::info!(%peer, "echo server accepted");
            tokio::task::spawn_local(async move {
                let mut connection = TcpConnection::new(stream);
                while let Ok(Some(payload)) = connection.recv().await {
                    if connection.send(&payload).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let config = LinkConfig::new(addr)
        .with_backoff(Duration::from_millis(100), Duration::from_secs(2));
    let link = Link::new(TcpTransport::new(), config, TokioProviders::new(), events_tx);

    for greeting in ["hello", "from", "relink"] {
        link.send(greeting.as_bytes().to_vec());
    }

    let mut echoed = 0;
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Open => tracing::info!("link open"),
            LinkEvent::Message(payload) => {
                tracing::info!(payload = %String::from_utf8_lossy(&payload), "echoed");
                echoed += 1;
                if echoed == 3 {
                    link.close();
                }
            }
            LinkEvent::Close => {
                tracing::info!("link closed");
                break;
            }
            LinkEvent::Error(error) => tracing::warn!(%error, "link error"),
        }
    }

    link.closed().await;
    Ok(())
}
