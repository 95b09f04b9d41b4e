//! Snapshot and accessibility handlers.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::SnapshotId;
use crate::protocol::to_json_text;
use crate::snapshot::{SnapshotSummary, accessibility_tree, capture, diff};

use super::Bridge;
use super::dispatch::Reply;

// ============================================================================
// Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Captured {
    #[serde(flatten)]
    summary: SnapshotSummary,
    evicted: Vec<SnapshotId>,
}

#[derive(Serialize)]
struct Cleared {
    cleared: usize,
}

// ============================================================================
// Bridge - Snapshot
// ============================================================================

impl Bridge {
    pub(crate) fn snapshot_capture(
        &self,
        id: Option<SnapshotId>,
        selector: Option<&str>,
        max_elements: Option<usize>,
    ) -> Result<Reply> {
        let root = self.resolve_or_root(selector)?;
        let id = id.unwrap_or_else(SnapshotId::generate);
        let max = max_elements.unwrap_or(self.inner.config.limits.snapshot_elements);

        let snapshot = capture(self.inner.hosts.document.as_ref(), &root, id.clone(), max)?;
        let summary = SnapshotSummary::from(&snapshot);
        let evicted = self.inner.snapshots.lock().insert(id, snapshot);
        if !evicted.is_empty() {
            debug!(?evicted, "Evicted snapshots");
        }

        to_json_text(&Captured { summary, evicted }).map(Some)
    }

    pub(crate) fn snapshot_diff(&self, before: &SnapshotId, after: &SnapshotId) -> Result<Reply> {
        let (first, second) = {
            let store = self.inner.snapshots.lock();
            (store.get(before), store.get(after))
        };
        let first = first.ok_or_else(|| Error::snapshot_not_found(before.clone()))?;
        let second = second.ok_or_else(|| Error::snapshot_not_found(after.clone()))?;

        to_json_text(&diff(&first, &second)).map(Some)
    }

    pub(crate) fn snapshot_list(&self) -> Result<Reply> {
        let list: Vec<SnapshotSummary> = self
            .inner
            .snapshots
            .lock()
            .iter()
            .map(|(_, snapshot)| SnapshotSummary::from(snapshot.as_ref()))
            .collect();
        to_json_text(&list).map(Some)
    }

    pub(crate) fn snapshot_clear(&self) -> Result<Reply> {
        let cleared = self.inner.snapshots.lock().clear();
        to_json_text(&Cleared { cleared }).map(Some)
    }

    pub(crate) fn accessibility(&self, selector: Option<&str>, max_elements: Option<usize>) -> Result<Reply> {
        let root = self.resolve_or_root(selector)?;
        let max = max_elements.unwrap_or(self.inner.config.limits.snapshot_elements);
        let tree = accessibility_tree(self.inner.hosts.document.as_ref(), &root, max)?;
        to_json_text(&tree).map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================
