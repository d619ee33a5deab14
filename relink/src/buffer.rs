//! FIFO buffering of outbound messages while no connection is live.

use std::collections::VecDeque;

/// Ordered queue of pending outbound payloads.
///
/// Messages sent while the link is not open are parked here and drained,
/// in enqueue order, into the transmit path once a connection reaches
/// open. Unbounded by default; with a capacity set, enqueueing into a
/// full buffer evicts the oldest entry.
#[derive(Debug)]
pub struct MessageBuffer {
    entries: VecDeque<Vec<u8>>,
    capacity: Option<usize>,
}

impl MessageBuffer {
    /// Create a buffer, optionally bounded to `capacity` entries.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append a payload, returning the evicted oldest entry if the
    /// buffer was at capacity.
    pub fn enqueue(&mut self, message: Vec<u8>) -> Option<Vec<u8>> {
        let evicted = match self.capacity {
            Some(capacity) if self.entries.len() >= capacity => self.entries.pop_front(),
            _ => None,
        };
        self.entries.push_back(message);
        evicted
    }

    /// Remove and return all buffered payloads in enqueue order.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        self.entries.drain(..).collect()
    }

    /// Number of buffered payloads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
