//! Structural diff between two snapshots.
//!
//! Both trees are flattened into `path -> node` maps. A path present only in
//! the later tree is added, only in the earlier tree is removed, and in both
//! is modified when text, value, classes, or attributes differ. Moving a
//! subtree without changing its addressing ancestry is not a change.
//!
//! Two elements sharing an id share a path; the later one in document order
//! wins.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use super::{Snapshot, SnapshotNode};

// ============================================================================
// Types
// ============================================================================

/// Summary of an added or removed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    /// Structural address.
    pub path: String,
    /// Tag name.
    pub tag: String,
    /// Element id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class list.
    pub classes: Vec<String>,
    /// Own text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<&SnapshotNode> for NodeSummary {
    fn from(node: &SnapshotNode) -> Self {
        Self {
            path: node.path.clone(),
            tag: node.tag.clone(),
            id: node.id.clone(),
            classes: node.classes.clone(),
            text: node.text.clone(),
        }
    }
}

/// One differing field of a modified node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum FieldChange {
    /// Own text changed.
    Text {
        /// Earlier text.
        before: Option<String>,
        /// Later text.
        after: Option<String>,
    },
    /// Form value changed.
    Value {
        /// Earlier value.
        before: Option<String>,
        /// Later value.
        after: Option<String>,
    },
    /// Class list changed.
    Classes {
        /// Classes only in the later node.
        added: Vec<String>,
        /// Classes only in the earlier node.
        removed: Vec<String>,
    },
    /// Attributes changed.
    Attributes {
        /// Name/value pairs only in the later node.
        added: BTreeMap<String, String>,
        /// Name/value pairs only in the earlier node.
        removed: BTreeMap<String, String>,
    },
}

/// A node present in both snapshots with differing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedNode {
    /// Structural address.
    pub path: String,
    /// Tag name.
    pub tag: String,
    /// Differing fields.
    pub changes: Vec<FieldChange>,
}

/// Result of diffing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    /// Paths only in the later snapshot, in document order.
    pub added: Vec<NodeSummary>,
    /// Paths only in the earlier snapshot, in document order.
    pub removed: Vec<NodeSummary>,
    /// Paths in both with differing fields.
    pub modified: Vec<ModifiedNode>,
    /// Paths in both with no differing field.
    pub unchanged_count: usize,
}

impl SnapshotDiff {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

// ============================================================================
// Diff
// ============================================================================

/// Path-ordered flattening of one tree.
struct Flat<'a> {
    order: Vec<&'a str>,
    nodes: FxHashMap<&'a str, &'a SnapshotNode>,
}

impl<'a> Flat<'a> {
    fn new(root: &'a SnapshotNode) -> Self {
        let mut flat = Flat {
            order: Vec::new(),
            nodes: FxHashMap::default(),
        };
        root.walk(&mut |node| {
            if flat.nodes.insert(node.path.as_str(), node).is_none() {
                flat.order.push(node.path.as_str());
            }
        });
        flat
    }
}

/// Diffs `before` against `after`.
#[must_use]
pub fn diff(before: &Snapshot, after: &Snapshot) -> SnapshotDiff {
    diff_trees(&before.tree, &after.tree)
}

/// Diffs two trees.
#[must_use]
pub fn diff_trees(before: &SnapshotNode, after: &SnapshotNode) -> SnapshotDiff {
    let before = Flat::new(before);
    let after = Flat::new(after);
    let mut result = SnapshotDiff::default();

    for path in &after.order {
        let node = after.nodes[path];
        match before.nodes.get(path) {
            None => result.added.push(NodeSummary::from(node)),
            Some(old) => {
                let changes = compare(old, node);
                if changes.is_empty() {
                    result.unchanged_count += 1;
                } else {
                    result.modified.push(ModifiedNode {
                        path: (*path).to_string(),
                        tag: node.tag.clone(),
                        changes,
                    });
                }
            }
        }
    }

    for path in &before.order {
        if !after.nodes.contains_key(path) {
            result.removed.push(NodeSummary::from(before.nodes[path]));
        }
    }

    result
}

fn compare(before: &SnapshotNode, after: &SnapshotNode) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if before.text != after.text {
        changes.push(FieldChange::Text {
            before: before.text.clone(),
            after: after.text.clone(),
        });
    }

    if before.value != after.value {
        changes.push(FieldChange::Value {
            before: before.value.clone(),
            after: after.value.clone(),
        });
    }

    let old: FxHashSet<&String> = before.classes.iter().collect();
    let new: FxHashSet<&String> = after.classes.iter().collect();
    if old != new {
        changes.push(FieldChange::Classes {
            added: after.classes.iter().filter(|c| !old.contains(c)).cloned().collect(),
            removed: before.classes.iter().filter(|c| !new.contains(c)).cloned().collect(),
        });
    }

    if before.attrs != after.attrs {
        let pair_difference = |a: &BTreeMap<String, String>, b: &BTreeMap<String, String>| {
            a.iter()
                .filter(|(k, v)| b.get(*k) != Some(*v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        changes.push(FieldChange::Attributes {
            added: pair_difference(&after.attrs, &before.attrs),
            removed: pair_difference(&before.attrs, &after.attrs),
        });
    }

    changes
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::SnapshotId;
    use crate::snapshot::capture;
    use crate::testing::FakeDocument;

    fn page() -> FakeDocument {
        let doc = FakeDocument::new();
        let body = doc.body();
        let app = doc.append(&body, "div", &[("id", "app"), ("data-state", "idle")]);
        let list = doc.append(&app, "ul", &[]);
        doc.append_text(&list, "li", "one");
        doc
    }

    fn snap(doc: &FakeDocument, id: &str) -> Snapshot {
        capture(doc, &doc.body(), SnapshotId::new(id), 1000).expect("capture")
    }

    #[test]
    fn test_self_diff_is_empty() {
        let doc = page();
        let s = snap(&doc, "a");
        let result = diff(&s, &s);
        assert!(result.is_empty());
        assert_eq!(result.unchanged_count, s.node_count);
    }

    #[test]
    fn test_added_leaf() {
        let doc = page();
        let before = snap(&doc, "a");
        let list = doc.query_one("ul");
        doc.append_text(&list, "li", "two");
        let after = snap(&doc, "b");

        let result = diff(&before, &after);
        assert_eq!(result.added.len(), 1);
        assert_eq!(
            result.added[0].path,
            "div#app > ul:nth-of-type(1) > li:nth-of-type(2)"
        );
        assert!(result.removed.is_empty());
        assert!(result.modified.is_empty());
    }

    #[test]
    fn test_attribute_change_is_pair_difference() {
        let doc = page();
        let before = snap(&doc, "a");
        let app = doc.query_one("#app");
        doc.set_attr(&app, "data-state", "busy");
        doc.set_attr(&app, "aria-busy", "true");
        let after = snap(&doc, "b");

        let result = diff(&before, &after);
        assert_eq!(result.modified.len(), 1);
        let json = serde_json::to_value(&result.modified[0].changes[0]).expect("serialize");
        assert_eq!(json["field"], "attributes");
        assert_eq!(json["added"]["data-state"], "busy");
        assert_eq!(json["added"]["aria-busy"], "true");
        assert_eq!(json["removed"]["data-state"], "idle");
    }

    #[test]
    fn test_classes_and_text() {
        let doc = page();
        let before = snap(&doc, "a");
        let li = doc.query_one("li");
        doc.set_attr(&li, "class", "done");
        doc.set_text(&li, "uno");
        let after = snap(&doc, "b");

        let result = diff(&before, &after);
        assert_eq!(result.modified.len(), 1);
        let changes = &result.modified[0].changes;
        assert!(changes.contains(&FieldChange::Text {
            before: Some("one".into()),
            after: Some("uno".into()),
        }));
        assert!(changes.contains(&FieldChange::Classes {
            added: vec!["done".into()],
            removed: vec![],
        }));
    }

    #[test]
    fn test_removed_subtree() {
        let doc = page();
        let before = snap(&doc, "a");
        doc.remove(&doc.query_one("ul"));
        let after = snap(&doc, "b");

        let result = diff(&before, &after);
        assert_eq!(result.removed.len(), 2);
        assert!(result.added.is_empty());
    }
}
