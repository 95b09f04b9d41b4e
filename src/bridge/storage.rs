//! Storage inspection, mutation, and change polling.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::error::Result;
use crate::host::{StorageEstimate, StorageScope};
use crate::protocol::to_json_text;

use super::Bridge;
use super::dispatch::Reply;

// ============================================================================
// Types
// ============================================================================

/// Usage of one storage scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScopeUsage {
    /// Number of keys.
    pub keys: usize,
    /// Estimated bytes, two per UTF-16 code unit of keys and values.
    pub bytes: usize,
}

/// Usage across scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    /// Local scope.
    pub local: ScopeUsage,
    /// Session scope.
    pub session: ScopeUsage,
    /// Host quota estimate, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<StorageEstimate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Polling {
    polling: bool,
    already_polling: bool,
}

#[derive(Serialize)]
struct Cleared {
    cleared: usize,
}

#[derive(Serialize)]
struct Entry<'a> {
    scope: StorageScope,
    key: &'a str,
    value: Option<String>,
}

#[derive(Serialize)]
struct Entries {
    scope: StorageScope,
    entries: BTreeMap<String, String>,
}

// ============================================================================
// Bridge - Storage
// ============================================================================

impl Bridge {
    pub(crate) fn storage_usage(&self) -> Result<Reply> {
        let storage = &self.inner.hosts.storage;
        let usage = |scope| -> Result<ScopeUsage> {
            let entries = storage.entries(scope)?;
            let units: usize = entries
                .iter()
                .map(|(k, v)| k.encode_utf16().count() + v.encode_utf16().count())
                .sum();
            Ok(ScopeUsage {
                keys: entries.len(),
                bytes: units * 2,
            })
        };

        to_json_text(&StorageUsage {
            local: usage(StorageScope::Local)?,
            session: usage(StorageScope::Session)?,
            estimate: storage.estimate(),
        })
        .map(Some)
    }

    /// Starts polling both scopes for changes.
    pub(crate) fn storage_start(&self) -> Result<Reply> {
        let mut poller = self.inner.storage_poller.lock();
        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return to_json_text(&Polling {
                polling: true,
                already_polling: true,
            })
            .map(Some);
        }

        let storage = Arc::clone(&self.inner.hosts.storage);
        let watcher = Arc::clone(&self.inner.storage_watcher);
        let logs = Arc::clone(&self.inner.logs);
        watcher.lock().baseline(storage.as_ref())?;

        let period = self.inner.config.storage_poll_interval;
        *poller = Some(tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let changes = match watcher.lock().poll(storage.as_ref()) {
                    Ok(changes) => changes,
                    Err(e) => {
                        warn!(error = %e, "Storage poll failed");
                        continue;
                    }
                };
                if changes.is_empty() {
                    continue;
                }
                debug!(count = changes.len(), "Storage changes");
                let mut log = logs.storage.lock();
                for change in changes {
                    log.push(change);
                }
            }
        }));

        debug!(?period, "Storage polling started");
        to_json_text(&Polling {
            polling: true,
            already_polling: false,
        })
        .map(Some)
    }

    pub(crate) fn storage_stop(&self) -> Result<Reply> {
        if let Some(handle) = self.inner.storage_poller.lock().take() {
            handle.abort();
            debug!("Storage polling stopped");
        }
        self.inner.storage_watcher.lock().reset();
        Ok(None)
    }

    pub(crate) fn storage_log(
        &self,
        scope: Option<StorageScope>,
        key: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Reply> {
        let page = self.inner.logs.storage.lock().query(
            |c| scope.is_none_or(|s| c.scope == s) && key.is_none_or(|k| c.key == k),
            offset,
            limit,
        );
        to_json_text(&page).map(Some)
    }

    pub(crate) fn storage_clear_log(&self) -> Result<Reply> {
        let mut log = self.inner.logs.storage.lock();
        let cleared = log.len();
        log.clear();
        to_json_text(&Cleared { cleared }).map(Some)
    }

    /// Reads one key, or every entry of the scope.
    pub(crate) fn storage_get(&self, scope: StorageScope, key: Option<&str>) -> Result<Reply> {
        let storage = &self.inner.hosts.storage;
        let text = match key {
            Some(key) => to_json_text(&Entry {
                scope,
                key,
                value: storage.get(scope, key)?,
            })?,
            None => to_json_text(&Entries {
                scope,
                entries: storage.entries(scope)?.into_iter().collect(),
            })?,
        };
        Ok(Some(text))
    }

    pub(crate) fn storage_set(&self, scope: StorageScope, key: &str, value: &str) -> Result<Reply> {
        self.inner.hosts.storage.set(scope, key, value)?;
        Ok(None)
    }

    pub(crate) fn storage_remove(&self, scope: StorageScope, key: &str) -> Result<Reply> {
        self.inner.hosts.storage.remove(scope, key)?;
        Ok(None)
    }

    /// Clears one scope, or both.
    pub(crate) fn storage_clear(&self, scope: Option<StorageScope>) -> Result<Reply> {
        let scopes = scope.map_or(StorageScope::ALL.to_vec(), |s| vec![s]);
        for scope in scopes {
            self.inner.hosts.storage.clear(scope)?;
        }
        Ok(None)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use crate::host::{StorageHost, StorageScope};
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_get_set_remove_clear() {
        let mut h = Harness::new();
        h.call(json!({"type": "storage_set", "id": "1", "key": "theme", "value": "dark"}))
            .await;
        h.call(json!({"type": "storage_set", "id": "2", "scope": "session", "key": "cart", "value": "3"}))
            .await;

        let reply = h.call(json!({"type": "storage_get", "id": "3", "key": "theme"})).await;
        let entry = Harness::result_of(&reply);
        assert_eq!(entry["scope"], "local");
        assert_eq!(entry["value"], "dark");

        let reply = h.call(json!({"type": "storage_get", "id": "4", "scope": "session"})).await;
        assert_eq!(Harness::result_of(&reply)["entries"]["cart"], "3");

        h.call(json!({"type": "storage_remove", "id": "5", "key": "theme"})).await;
        let reply = h.call(json!({"type": "storage_get", "id": "6", "key": "theme"})).await;
        assert!(Harness::result_of(&reply)["value"].is_null());

        h.call(json!({"type": "storage_clear", "id": "7"})).await;
        assert!(h.storage.entries(StorageScope::Session).expect("entries").is_empty());
    }

    #[tokio::test]
    async fn test_usage_counts_utf16_bytes() {
        let mut h = Harness::new();
        h.storage.set(StorageScope::Local, "ab", "cd").expect("set");
        h.storage.set(StorageScope::Local, "k", "é").expect("set");

        let reply = h.call(json!({"type": "storage_usage", "id": "1"})).await;
        let usage = Harness::result_of(&reply);
        assert_eq!(usage["local"]["keys"], 2);
        assert_eq!(usage["local"]["bytes"], 12);
        assert_eq!(usage["session"]["keys"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_logs_changes() {
        let mut h = Harness::new();
        h.storage.set(StorageScope::Local, "existing", "1").expect("set");

        let reply = h.call(json!({"type": "storage_start", "id": "1"})).await;
        assert_eq!(Harness::result_of(&reply)["alreadyPolling"], false);
        let reply = h.call(json!({"type": "storage_start", "id": "2"})).await;
        assert_eq!(Harness::result_of(&reply)["alreadyPolling"], true);

        h.storage.set(StorageScope::Local, "existing", "2").expect("set");
        h.storage.set(StorageScope::Session, "token", "abc").expect("set");
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let reply = h.call(json!({"type": "storage_log", "id": "3"})).await;
        let page = Harness::result_of(&reply);
        assert_eq!(page["total"], 2);
        assert_eq!(page["entries"][0]["change"], "changed");
        assert_eq!(page["entries"][0]["oldValue"], "1");
        assert_eq!(page["entries"][1]["change"], "added");

        let reply = h
            .call(json!({"type": "storage_log", "id": "4", "scope": "session", "key": "token"}))
            .await;
        assert_eq!(Harness::result_of(&reply)["matched"], 1);

        h.call(json!({"type": "storage_stop", "id": "5"})).await;
        h.storage.remove(StorageScope::Session, "token").expect("remove");
        tokio::time::sleep(Duration::from_secs(3)).await;

        let reply = h.call(json!({"type": "storage_clear_log", "id": "6"})).await;
        assert_eq!(Harness::result_of(&reply)["cleared"], 2);
    }

    #[tokio::test]
    async fn test_without_storage_host_is_unsupported() {
        let mut h = Harness::minimal();
        let reply = h.call(json!({"type": "storage_usage", "id": "1"})).await;
        assert_eq!(Harness::error_of(&reply)["type"], "unsupported");
    }
}
