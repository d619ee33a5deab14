//! Resilient client-side connection management.
//!
//! This module provides the [`Link`] abstraction: a wrapper around a
//! [`Transport`](crate::Transport) endpoint that keeps it connected.
//!
//! # Overview
//!
//! A Link represents a logical connection to a remote endpoint. It handles:
//! - **Automatic reconnection** with exponential backoff
//! - **Message buffering** during disconnection periods, replayed once
//!   a connection reaches open
//! - **A bounded retry budget** that parks the link instead of retrying
//!   forever, when configured
//!
//! # Connection Lifecycle
//!
//! ```text
//! ┌──────────┐    connect     ┌───────────┐
//! │  Closed  ├───────────────►│  Opening  │
//! │          │◄───────────────┤           │
//! └────┬─────┘  open failed   └─────┬─────┘
//!      │ ▲                          │ opened
//!      │ │ conn. lost               ▼
//!      │ │                    ┌───────────┐
//!      │ └────────────────────┤   Open    │
//!      │                      └─────┬─────┘
//!      │ backoff                    │ close()
//!      ▼                            ▼
//! ┌──────────┐               ┌───────────┐
//! │  retry   │               │  Closing  │
//! │scheduled │               └───────────┘
//! └──────────┘
//! ```
//!
//! # Backoff Strategy
//!
//! - Initial delay: configurable (default 1s)
//! - Maximum delay: configurable (default 5s)
//! - Exponential growth, reset only on a successful open
//! - Optional symmetric jitter through an injectable random provider
//!
//! # Configuration
//!
//! ```ignore
//! use relink::LinkConfig;
//!
//! let config = LinkConfig::new("127.0.0.1:4500")
//!     .with_backoff(Duration::from_millis(100), Duration::from_secs(5))
//!     .with_max_attempts(10);
//! ```

/// Core link implementation with automatic reconnection and buffering
pub mod core;

/// Configuration structures for link behavior
pub mod config;

/// Metrics collection and connection state tracking
pub mod metrics;

/// Error types specific to link operations
pub mod error;

// Re-export main types
pub use config::LinkConfig;
pub use core::{Link, LinkState, SendOutcome};
pub use error::LinkError;
pub use metrics::LinkMetrics;
