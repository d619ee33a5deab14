//! Task spawning abstraction for single-threaded execution.

use std::future::Future;

/// Provider for spawning local tasks in a single-threaded context.
///
/// The link's worker runs on the current thread via `spawn_local`, which
/// keeps all state transitions on one cooperative execution context; no
/// two transitions can interleave arbitrarily.
pub trait TaskProvider: Clone {
    /// Spawn a named task on the current thread.
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static;
}

/// Task provider backed by tokio's `spawn_local`.
///
/// Must be used within a [`tokio::task::LocalSet`] (or a local runtime).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTaskProvider;

impl TaskProvider for TokioTaskProvider {
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static,
    {
        tracing::debug!(task = name, "spawning local task");
        tokio::task::spawn_local(future)
    }
}
