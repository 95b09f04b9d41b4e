//! Bounded depth-first document capture.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::host::{DocumentHost, ElementInfo, Viewport};
use crate::identifiers::{ElementId, SnapshotId};
use crate::util::now_ms;

// ============================================================================
// Types
// ============================================================================

/// One captured element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotNode {
    /// Lowercase tag name.
    pub tag: String,
    /// Element id attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class list.
    pub classes: Vec<String>,
    /// Own text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attributes other than `id` and `class`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Form value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Structural address.
    pub path: String,
    /// Captured element children.
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    /// Counts this node and all descendants.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SnapshotNode::count).sum::<usize>()
    }

    /// Visits this node and all descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SnapshotNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// An immutable structural copy of the document at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Snapshot id.
    pub id: SnapshotId,
    /// Capture time in ms.
    pub timestamp: u64,
    /// Captured tree.
    pub tree: SnapshotNode,
    /// Viewport at capture time.
    pub viewport: Viewport,
    /// Document URL.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Nodes in `tree`.
    pub node_count: usize,
    /// `true` if the element bound stopped the walk early.
    pub truncated: bool,
}

/// List entry for a retained snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// Snapshot id.
    pub id: SnapshotId,
    /// Capture time in ms.
    pub timestamp: u64,
    /// Document URL.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Nodes captured.
    pub node_count: usize,
    /// `true` if the element bound stopped the walk early.
    pub truncated: bool,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            timestamp: snapshot.timestamp,
            url: snapshot.url.clone(),
            title: snapshot.title.clone(),
            node_count: snapshot.node_count,
            truncated: snapshot.truncated,
        }
    }
}

// ============================================================================
// Capture
// ============================================================================

/// Captures the subtree at `root`, visiting at most `max_elements` elements.
///
/// # Errors
///
/// Returns any error the host raises while describing elements.
pub fn capture(
    document: &dyn DocumentHost,
    root: &ElementId,
    id: SnapshotId,
    max_elements: usize,
) -> Result<Snapshot> {
    let mut walker = Walker {
        document,
        budget: max_elements.max(1),
        truncated: false,
    };

    let info = document.describe(root)?;
    let path = node_path(None, &info, 1);
    let tree = walker.visit(root, info, path)?;
    let node_count = tree.count();

    debug!(snapshot_id = %id, node_count, truncated = walker.truncated, "Snapshot captured");

    Ok(Snapshot {
        id,
        timestamp: now_ms(),
        tree,
        viewport: document.viewport()?,
        url: document.url(),
        title: document.title(),
        node_count,
        truncated: walker.truncated,
    })
}

struct Walker<'a> {
    document: &'a dyn DocumentHost,
    budget: usize,
    truncated: bool,
}

impl Walker<'_> {
    fn visit(&mut self, element: &ElementId, info: ElementInfo, path: String) -> Result<SnapshotNode> {
        self.budget -= 1;

        let mut children = Vec::new();
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();

        for child in self.document.children(element)? {
            if self.budget == 0 {
                self.truncated = true;
                break;
            }
            let child_info = self.document.describe(&child)?;
            let nth = seen.entry(child_info.tag.clone()).or_insert(0);
            *nth += 1;
            let child_path = node_path(Some(&path), &child_info, *nth);
            children.push(self.visit(&child, child_info, child_path)?);
        }

        Ok(SnapshotNode {
            tag: info.tag,
            id: info.id,
            classes: info.classes,
            text: info.text,
            attrs: info.attrs,
            value: info.value,
            path,
            children,
        })
    }
}

/// Structural address of an element.
///
/// An element id terminates the chain (`div#app`). Otherwise the address is
/// the parent's followed by `tag:nth-of-type(n)`.
pub(crate) fn node_path(parent: Option<&str>, info: &ElementInfo, nth_of_type: usize) -> String {
    if let Some(id) = &info.id {
        return format!("{}#{}", info.tag, id);
    }
    match parent {
        Some(parent) => format!("{parent} > {}:nth-of-type({nth_of_type})", info.tag),
        None => info.tag.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
