//! Provider bundle trait for simplified type parameters.
//!
//! Bundles the time, task, and random providers into a single type
//! parameter so downstream code carries one generic instead of three.
//! The transport is deliberately not part of the bundle: it is the
//! external collaborator under test, passed to the link separately.

use crate::random::{RandomProvider, TokioRandomProvider};
use crate::task::{TaskProvider, TokioTaskProvider};
use crate::time::{TimeProvider, TokioTimeProvider};

/// Bundle of the provider types for a runtime environment.
pub trait Providers: Clone + 'static {
    /// Time provider type for sleep, timeout, and time queries.
    type Time: TimeProvider + Clone + 'static;

    /// Task provider type for spawning local tasks.
    type Task: TaskProvider + Clone + 'static;

    /// Random provider type for jitter.
    type Random: RandomProvider + Clone + 'static;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the task provider instance.
    fn task(&self) -> &Self::Task;

    /// Get the random provider instance.
    fn random(&self) -> &Self::Random;
}

/// Production providers using the tokio runtime.
///
/// The random provider slot is generic so tests can install a
/// [`SeededRandomProvider`](crate::SeededRandomProvider) for
/// reproducible jitter while keeping real time and task spawning.
#[derive(Clone)]
pub struct TokioProviders<R: RandomProvider = TokioRandomProvider> {
    time: TokioTimeProvider,
    task: TokioTaskProvider,
    random: R,
}

impl TokioProviders {
    /// Create a production providers bundle.
    pub fn new() -> Self {
        Self {
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
            random: TokioRandomProvider::new(),
        }
    }
}

impl Default for TokioProviders {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomProvider + 'static> TokioProviders<R> {
    /// Create a bundle with a custom random provider.
    pub fn with_random(random: R) -> Self {
        Self {
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
            random,
        }
    }
}

impl<R: RandomProvider + 'static> Providers for TokioProviders<R> {
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;
    type Random = R;

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }

    fn random(&self) -> &Self::Random {
        &self.random
    }
}
