//! Document snapshots, structural diffs, and accessibility trees.
//!
//! # Snapshot Model
//!
//! A snapshot is an immutable tree of [`SnapshotNode`]s captured from the
//! host document, bounded by an element count. Every node carries a `path`:
//!
//! | Element | Path |
//! |---------|------|
//! | has an id | `tag#id` |
//! | capture root without id | `tag` |
//! | otherwise | `<parent path> > tag:nth-of-type(n)` |
//!
//! Retained snapshots live in a [`SnapshotStore`] (10 by default, FIFO).

// ============================================================================
// Submodules
// ============================================================================

/// Accessibility tree.
pub mod accessibility;

/// Bounded capture.
pub mod capture;

/// Structural diff.
pub mod diff;

// ============================================================================
// Re-exports
// ============================================================================

pub use accessibility::{AccessibilityNode, AccessibilityTree, accessibility_tree};
pub use capture::{Snapshot, SnapshotNode, SnapshotSummary, capture};
pub use diff::{FieldChange, ModifiedNode, NodeSummary, SnapshotDiff, diff};

use crate::identifiers::SnapshotId;
use crate::store::BoundedStore;

/// Retained snapshots keyed by id.
pub type SnapshotStore = BoundedStore<SnapshotId, Snapshot>;
