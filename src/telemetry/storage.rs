//! Storage-change log.
//!
//! Both storage scopes are polled on a fixed interval; successive snapshots
//! are diffed key by key and every added, removed, or changed key becomes one
//! log entry.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::Result;
use crate::host::{StorageHost, StorageScope};
use crate::util::truncate_chars;

// ============================================================================
// Types
// ============================================================================

/// How a key changed between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Key appeared.
    Added,
    /// Key disappeared.
    Removed,
    /// Key's value changed.
    Changed,
}

/// One key-level storage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    /// Scope the key lives in.
    pub scope: StorageScope,
    /// Changed key.
    pub key: String,
    /// Change kind.
    pub change: ChangeKind,
    /// Value before, truncated.
    pub old_value: Option<String>,
    /// Value after, truncated.
    pub new_value: Option<String>,
}

type ScopeSnapshot = BTreeMap<String, String>;

// ============================================================================
// StorageWatcher
// ============================================================================

/// Remembers the last polled state of each scope.
#[derive(Debug, Default)]
pub struct StorageWatcher {
    previous: FxHashMap<StorageScope, ScopeSnapshot>,
    value_chars: usize,
}

impl StorageWatcher {
    /// Creates a watcher that truncates logged values to `value_chars`.
    #[must_use]
    pub fn new(value_chars: usize) -> Self {
        Self {
            previous: FxHashMap::default(),
            value_chars,
        }
    }

    /// Records the current state as the baseline without emitting changes.
    pub fn baseline(&mut self, host: &dyn StorageHost) -> Result<()> {
        let snapshots = read_all(host)?;
        self.previous.extend(snapshots);
        Ok(())
    }

    /// Polls both scopes and returns changes since the last poll.
    ///
    /// Both scopes are read before any baseline moves; if either read fails
    /// the baselines are kept and the changes surface on the next poll.
    pub fn poll(&mut self, host: &dyn StorageHost) -> Result<Vec<StorageChange>> {
        let snapshots = read_all(host)?;

        let mut changes = Vec::new();
        for (scope, next) in snapshots {
            let prev = self.previous.remove(&scope).unwrap_or_default();
            changes.extend(diff_scope(scope, &prev, &next, self.value_chars));
            self.previous.insert(scope, next);
        }
        Ok(changes)
    }

    /// Forgets all remembered state.
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

/// Reads every scope, failing as a whole if any read fails.
fn read_all(host: &dyn StorageHost) -> Result<Vec<(StorageScope, ScopeSnapshot)>> {
    StorageScope::ALL
        .into_iter()
        .map(|scope| -> Result<(StorageScope, ScopeSnapshot)> {
            Ok((scope, host.entries(scope)?.into_iter().collect()))
        })
        .collect()
}

/// Diffs two snapshots of one scope.
fn diff_scope(
    scope: StorageScope,
    prev: &ScopeSnapshot,
    next: &ScopeSnapshot,
    value_chars: usize,
) -> Vec<StorageChange> {
    let clip = |v: &String| Some(truncate_chars(v, value_chars));
    let mut changes = Vec::new();

    for (key, new_value) in next {
        match prev.get(key) {
            None => changes.push(StorageChange {
                scope,
                key: key.clone(),
                change: ChangeKind::Added,
                old_value: None,
                new_value: clip(new_value),
            }),
            Some(old_value) if old_value != new_value => changes.push(StorageChange {
                scope,
                key: key.clone(),
                change: ChangeKind::Changed,
                old_value: clip(old_value),
                new_value: clip(new_value),
            }),
            Some(_) => {}
        }
    }

    for (key, old_value) in prev {
        if !next.contains_key(key) {
            changes.push(StorageChange {
                scope,
                key: key.clone(),
                change: ChangeKind::Removed,
                old_value: clip(old_value),
                new_value: None,
            });
        }
    }

    changes
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    use crate::error::Error;
    use crate::testing::MemoryStorage;

    /// Memory storage whose session scope can be made unreadable.
    #[derive(Default)]
    struct UnreadableSession {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    impl StorageHost for UnreadableSession {
        fn entries(&self, scope: StorageScope) -> Result<Vec<(String, String)>> {
            if scope == StorageScope::Session && self.failing.load(Ordering::SeqCst) {
                return Err(Error::host("session storage unavailable"));
            }
            self.inner.entries(scope)
        }

        fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>> {
            self.inner.get(scope, key)
        }

        fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()> {
            self.inner.set(scope, key, value)
        }

        fn remove(&self, scope: StorageScope, key: &str) -> Result<()> {
            self.inner.remove(scope, key)
        }

        fn clear(&self, scope: StorageScope) -> Result<()> {
            self.inner.clear(scope)
        }
    }

    #[test]
    fn test_diff_scope_classifies_keys() {
        let prev = BTreeMap::from([
            ("keep".to_string(), "1".to_string()),
            ("edit".to_string(), "old".to_string()),
            ("gone".to_string(), "x".to_string()),
        ]);
        let next = BTreeMap::from([
            ("keep".to_string(), "1".to_string()),
            ("edit".to_string(), "new".to_string()),
            ("born".to_string(), "y".to_string()),
        ]);

        let changes = diff_scope(StorageScope::Local, &prev, &next, 200);
        assert_eq!(changes.len(), 3);
        let kinds: Vec<(&str, ChangeKind)> =
            changes.iter().map(|c| (c.key.as_str(), c.change)).collect();
        assert!(kinds.contains(&("born", ChangeKind::Added)));
        assert!(kinds.contains(&("edit", ChangeKind::Changed)));
        assert!(kinds.contains(&("gone", ChangeKind::Removed)));
    }

    #[test]
    fn test_values_are_truncated() {
        let next = BTreeMap::from([("k".to_string(), "v".repeat(500))]);
        let changes = diff_scope(StorageScope::Session, &BTreeMap::new(), &next, 200);
        assert_eq!(changes[0].new_value.as_ref().map(String::len), Some(200));
    }

    #[test]
    fn test_watcher_poll_after_baseline() {
        let storage = MemoryStorage::default();
        storage.set(StorageScope::Local, "a", "1").expect("set");

        let mut watcher = StorageWatcher::new(200);
        watcher.baseline(&storage).expect("baseline");
        assert!(watcher.poll(&storage).expect("poll").is_empty());

        storage.set(StorageScope::Session, "b", "2").expect("set");
        storage.remove(StorageScope::Local, "a").expect("remove");
        let changes = watcher.poll(&storage).expect("poll");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].scope, StorageScope::Local);
        assert_eq!(changes[0].change, ChangeKind::Removed);
        assert_eq!(changes[1].scope, StorageScope::Session);
        assert_eq!(changes[1].change, ChangeKind::Added);
    }

    #[test]
    fn test_failed_scope_read_keeps_other_scope_changes() {
        let storage = UnreadableSession::default();
        let mut watcher = StorageWatcher::new(200);
        watcher.baseline(&storage).expect("baseline");

        storage.set(StorageScope::Local, "token", "abc").expect("set");
        storage.failing.store(true, Ordering::SeqCst);
        assert!(watcher.poll(&storage).is_err());

        storage.failing.store(false, Ordering::SeqCst);
        let changes = watcher.poll(&storage).expect("poll");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].scope, StorageScope::Local);
        assert_eq!(changes[0].key, "token");
        assert_eq!(changes[0].change, ChangeKind::Added);
    }
}
