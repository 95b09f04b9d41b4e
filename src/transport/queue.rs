//! Outbound retry queue.

use std::collections::VecDeque;

use tracing::warn;

use crate::util::now_ms;

/// One queued outbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Serialized envelope.
    pub payload: String,
    /// Enqueue time in ms.
    pub enqueued_at: u64,
}

/// Bounded FIFO of envelopes waiting for an open channel.
///
/// Pushing past capacity drops the oldest entry.
#[derive(Debug)]
pub struct RetryQueue {
    entries: VecDeque<QueuedMessage>,
    capacity: usize,
    dropped: u64,
}

impl RetryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    /// Queues a payload, evicting the oldest if full.
    pub fn push(&mut self, payload: String) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
            warn!(capacity = self.capacity, "Retry queue full, dropped oldest message");
        }
        self.entries.push_back(QueuedMessage {
            payload,
            enqueued_at: now_ms(),
        });
    }

    /// Removes and returns every queued entry in enqueue order.
    pub fn take_all(&mut self) -> Vec<QueuedMessage> {
        self.entries.drain(..).collect()
    }

    /// Number of queued entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped by eviction.
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
