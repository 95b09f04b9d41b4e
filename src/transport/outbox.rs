//! Outbound send path.
//!
//! Every envelope the bridge emits goes through one [`Outbox`]. While a link
//! to the socket writer is open the envelope is handed to it; otherwise, or
//! when the hand-off fails, it is parked in the [`RetryQueue`]. Opening a
//! link announces the page and then flushes the queue in enqueue order.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::to_string;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::protocol::Outbound;

use super::RetryQueue;

// ============================================================================
// Types
// ============================================================================

/// Sender half feeding the socket writer.
pub(crate) type Link = mpsc::UnboundedSender<String>;

struct LinkState {
    link: Option<Link>,
    queue: RetryQueue,
}

impl LinkState {
    /// Hands `text` to the link, or queues it.
    fn deliver(&mut self, text: String) {
        let Some(link) = &self.link else {
            trace!("Channel not open, queueing message");
            self.queue.push(text);
            return;
        };

        if let Err(mpsc::error::SendError(text)) = link.send(text) {
            warn!("Link closed during send, queueing message");
            self.link = None;
            self.queue.push(text);
        }
    }
}

struct OutboxInner {
    page: String,
    state: Mutex<LinkState>,
}

// ============================================================================
// Outbox
// ============================================================================

/// Shared outbound send path with a bounded retry queue.
#[derive(Clone)]
pub struct Outbox {
    inner: Arc<OutboxInner>,
}

impl Outbox {
    /// Creates a closed outbox.
    #[must_use]
    pub fn new(page: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(OutboxInner {
                page: page.into(),
                state: Mutex::new(LinkState {
                    link: None,
                    queue: RetryQueue::new(queue_capacity),
                }),
            }),
        }
    }

    /// Page label carried by `ready`, `ping`, and `console`.
    #[inline]
    #[must_use]
    pub fn page(&self) -> &str {
        &self.inner.page
    }

    /// Sends an envelope, queueing it if the channel is down.
    pub fn send(&self, message: &Outbound) {
        match to_string(message) {
            Ok(text) => self.send_text(text),
            Err(e) => warn!(error = %e, kind = message.kind(), "Failed to serialize envelope"),
        }
    }

    /// Sends serialized text, queueing it if the channel is down.
    pub fn send_text(&self, text: String) {
        self.inner.state.lock().deliver(text);
    }


    /// Attaches a writer link, announces the page, and flushes the queue.
    pub(crate) fn open(&self, link: Link) {
        let ready = to_string(&Outbound::ready(self.page()));

        let mut state = self.inner.state.lock();
        state.link = Some(link);

        match ready {
            Ok(text) => state.deliver(text),
            Err(e) => warn!(error = %e, "Failed to serialize ready"),
        }

        let pending = state.queue.take_all();
        debug!(count = pending.len(), "Flushing retry queue");
        for message in pending {
            state.deliver(message.payload);
        }
    }

    /// Detaches the writer link. Later sends are queued.
    pub(crate) fn close(&self) {
        self.inner.state.lock().link = None;
    }

    /// Detaches the writer link and queues what it never wrote.
    ///
    /// `unsent` is the envelope whose write failed; it goes first, followed by
    /// everything still buffered in `rx`. The link is dropped under the same
    /// lock, so no concurrent send can be queued ahead of them.
    pub(crate) fn detach(&self, unsent: Option<String>, rx: &mut mpsc::UnboundedReceiver<String>) {
        let mut state = self.inner.state.lock();
        state.link = None;

        let mut requeued = 0usize;
        for text in unsent.into_iter().chain(std::iter::from_fn(|| rx.try_recv().ok())) {
            state.queue.push(text);
            requeued += 1;
        }
        if requeued > 0 {
            debug!(count = requeued, "Requeued unwritten envelopes");
        }
    }

    /// Returns `true` while a writer link is attached.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner
            .state
            .lock()
            .link
            .as_ref()
            .is_some_and(|link| !link.is_closed())
    }

    /// Number of queued envelopes.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Envelopes dropped from the queue by eviction.
    #[must_use]
    pub fn queue_dropped(&self) -> u64 {
        self.inner.state.lock().queue.dropped()
    }
}

// ============================================================================
// Tests
// ============================================================================
