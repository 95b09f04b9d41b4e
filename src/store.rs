//! Bounded keyed store with FIFO eviction.
//!
//! Backs the snapshot store and the screenshot cache. Entries are evicted
//! in insertion order once capacity is exceeded. Reusing a key replaces the
//! entry and moves it to the newest position.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

// ============================================================================
// BoundedStore
// ============================================================================

/// Insertion-ordered map holding at most `capacity` entries.
#[derive(Debug)]
pub struct BoundedStore<K, V> {
    entries: VecDeque<(K, Arc<V>)>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> BoundedStore<K, V> {
    /// Creates an empty store.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts a value and returns the keys evicted to make room.
    pub fn insert(&mut self, key: K, value: V) -> Vec<K> {
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push_back((key, Arc::new(value)));

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            if let Some((k, _)) = self.entries.pop_front() {
                evicted.push(k);
            }
        }
        evicted
    }

    /// Returns a value by key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Arc::clone(v))
    }

    /// Iterates entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> {
        self.entries.iter().map(|(k, v)| (k, v))
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

    /// Drops every entry and returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}

// ============================================================================
// Tests
// ============================================================================
