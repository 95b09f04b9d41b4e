//! Fixed-capacity, FIFO-evicting event log.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use serde::Serialize;

use crate::util::now_ms;

// ============================================================================
// LogEntry
// ============================================================================

/// One record plus its sequence id and capture time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry<T> {
    /// Monotonically increasing sequence id, never reused after a clear.
    pub seq: u64,
    /// Capture time in milliseconds since the epoch.
    pub timestamp: u64,
    /// The recorded event.
    #[serde(flatten)]
    pub record: T,
}

// ============================================================================
// LogPage
// ============================================================================

/// One page of filtered log entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPage<T> {
    /// Entries currently retained.
    pub total: usize,
    /// Entries matching the filter.
    pub matched: usize,
    /// Offset applied to the matching entries.
    pub offset: usize,
    /// Matching entries in insertion order.
    pub entries: Vec<LogEntry<T>>,
}

// ============================================================================
// RingLog
// ============================================================================

/// A bounded event history.
///
/// Insertion beyond capacity evicts the oldest entry. The retained set is
/// always the last `capacity` inserted records, in insertion order.
#[derive(Debug, Clone)]
pub struct RingLog<T> {
    entries: VecDeque<LogEntry<T>>,
    capacity: usize,
    next_seq: u64,
    evicted: u64,
}

impl<T> RingLog<T> {
    /// Creates an empty log.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_seq: 1,
            evicted: 0,
        }
    }

    /// Appends a record stamped with the current time.
    pub fn push(&mut self, record: T) -> u64 {
        self.push_at(record, now_ms())
    }

    /// Appends a record with an explicit timestamp.
    pub fn push_at(&mut self, record: T, timestamp: u64) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.capacity == 0 {
            self.evicted += 1;
            return seq;
        }

        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }

        self.entries.push_back(LogEntry {
            seq,
            timestamp,
            record,
        });
        seq
    }

    /// Number of retained entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is retained.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries dropped by eviction since creation.
    #[inline]
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Iterates retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry<T>> {
        self.entries.iter()
    }

    /// Drops every retained entry. Sequence ids keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> RingLog<T> {
    /// Returns matching entries, skipping `offset` and keeping at most `limit`.
    #[must_use]
    pub fn query(
        &self,
        filter: impl Fn(&T) -> bool,
        offset: usize,
        limit: Option<usize>,
    ) -> LogPage<T> {
        let matching: Vec<&LogEntry<T>> =
            self.entries.iter().filter(|e| filter(&e.record)).collect();
        let matched = matching.len();
        let entries = matching
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        LogPage {
            total: self.entries.len(),
            matched,
            offset,
            entries,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
