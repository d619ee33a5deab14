//! Shared harness for link integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use relink::{EventSink, LinkEvent};

/// Run a future on a single-threaded runtime with the clock paused.
///
/// Timers auto-advance whenever every task is idle, so backoff schedules
/// execute instantly and deterministically.
pub fn run_paused<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("test runtime");
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, future)
}

/// Run a future on a single-threaded runtime with real time and IO.
pub fn run_real<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime");
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, future)
}

/// Let every ready task run to quiescence without advancing the clock.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Shorthand for millisecond durations.
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Event sink that records everything it is notified of.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<LinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<LinkEvent> {
        self.events.borrow().clone()
    }

    /// Take the recorded events, leaving the sink empty.
    pub fn take(&self) -> Vec<LinkEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: LinkEvent) {
        self.events.borrow_mut().push(event);
    }
}
