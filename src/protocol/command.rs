//! Inbound command definitions.
//!
//! Every command arrives as one envelope: `{"type": <kind>, "id": <id>,
//! ...fields}`. The set of kinds is closed; dispatch is an exhaustive match
//! over [`Command`].
//!
//! # Command Families
//!
//! | Family | Kinds |
//! |--------|-------|
//! | Code execution | `execute`, `batch_execute` |
//! | Terminal | `terminal_*`, `session_*` |
//! | DOM | `dom_query`, `dom_click`, `dom_type`, `dom_scroll`, `dom_paste`, `dom_keypress`, `dom_focus` |
//! | Snapshot | `snapshot_*`, `accessibility_tree` |
//! | Telemetry | `network_*`, `mutation_*`, `performance_*` |
//! | Screenshot | `screenshot_*` |
//! | Storage | `storage_*` |
//! | Files | `file_read`, `file_write` |
//! | Diagnostics | `diagnostics` |

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::health::CapabilityFamily;
use crate::host::StorageScope;
use crate::identifiers::{CorrelationId, ScreenshotId, SessionId, SnapshotId};
use crate::screenshot::ScreenshotFormat;
use crate::telemetry::{MutationKind, PerformanceCategory};

// ============================================================================
// Envelope
// ============================================================================

/// A decoded inbound command envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation id echoed on the result.
    pub id: CorrelationId,

    /// Command kind and fields.
    #[serde(flatten)]
    pub command: Command,
}

// ============================================================================
// Command
// ============================================================================

/// All command kinds the bridge serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Command {
    // ========================================================================
    // Code Execution
    // ========================================================================
    /// Evaluate code against the page's global scope.
    Execute {
        /// Code to evaluate.
        code: String,
        /// Deadline for thenable results, in ms.
        #[serde(default)]
        timeout: Option<u64>,
    },

    /// Evaluate an ordered sequence of code fragments under one deadline.
    BatchExecute {
        /// Fragments in execution order.
        commands: Vec<BatchStep>,
        /// Shared deadline in ms.
        #[serde(default)]
        timeout: Option<u64>,
    },

    // ========================================================================
    // Terminal
    // ========================================================================
    /// Run a command line in the default session.
    TerminalExecute {
        /// Command line.
        command: String,
        /// Deadline in ms.
        #[serde(default)]
        timeout: Option<u64>,
    },

    /// Read captured output of a session.
    TerminalRead {
        /// Session, default session if absent.
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Only output captured after this timestamp.
        #[serde(default)]
        since: Option<u64>,
        /// Keep only the last `limit` entries.
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Report a session's state.
    TerminalStatus {
        /// Session, default session if absent.
        #[serde(default)]
        session_id: Option<SessionId>,
    },

    /// Create a named session.
    SessionCreate {
        /// Explicit id; generated if absent.
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Display name.
        #[serde(default)]
        name: Option<String>,
        /// Initial working directory.
        #[serde(default)]
        cwd: Option<String>,
        /// Environment merged into each command.
        #[serde(default)]
        env: BTreeMap<String, String>,
    },

    /// List sessions.
    SessionList,

    /// Mark a session attached.
    SessionAttach {
        /// Target session.
        session_id: SessionId,
    },

    /// Mark a session detached.
    SessionDetach {
        /// Target session.
        session_id: SessionId,
    },

    /// Run a command line in a named session.
    SessionExec {
        /// Target session.
        session_id: SessionId,
        /// Command line.
        command: String,
        /// Deadline in ms.
        #[serde(default)]
        timeout: Option<u64>,
    },

    /// Remove a session.
    SessionKill {
        /// Target session.
        session_id: SessionId,
    },

    // ========================================================================
    // DOM
    // ========================================================================
    /// Summarize elements matching a selector.
    DomQuery {
        /// CSS selector.
        selector: String,
        /// Maximum summaries returned.
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Click the first matching element.
    DomClick {
        /// CSS selector.
        selector: String,
    },

    /// Type text into the first matching element.
    DomType {
        /// CSS selector.
        selector: String,
        /// Text to insert.
        text: String,
        /// Replace the current value instead of appending.
        #[serde(default)]
        clear: bool,
    },

    /// Scroll the page or an element into view.
    DomScroll {
        /// Element to scroll into view; page scroll if absent.
        #[serde(default)]
        selector: Option<String>,
        /// Horizontal amount or position.
        #[serde(default)]
        x: Option<f64>,
        /// Vertical amount or position.
        #[serde(default)]
        y: Option<f64>,
        /// Relative or absolute page scroll.
        #[serde(default)]
        mode: ScrollMode,
    },

    /// Paste text into the first matching element.
    DomPaste {
        /// CSS selector.
        selector: String,
        /// Pasted text.
        text: String,
    },

    /// Dispatch a key press.
    DomKeypress {
        /// Target element; active element if absent.
        #[serde(default)]
        selector: Option<String>,
        /// Key name or single character.
        key: String,
        /// Ctrl modifier.
        #[serde(default)]
        ctrl: bool,
        /// Shift modifier.
        #[serde(default)]
        shift: bool,
        /// Alt modifier.
        #[serde(default)]
        alt: bool,
        /// Meta modifier.
        #[serde(default)]
        meta: bool,
    },

    /// Focus the first matching element.
    DomFocus {
        /// CSS selector.
        selector: String,
    },

    // ========================================================================
    // Snapshot
    // ========================================================================
    /// Capture a DOM snapshot.
    SnapshotCapture {
        /// Explicit id; generated if absent.
        #[serde(default)]
        snapshot_id: Option<SnapshotId>,
        /// Subtree root; document body if absent.
        #[serde(default)]
        selector: Option<String>,
        /// Element bound.
        #[serde(default)]
        max_elements: Option<usize>,
    },

    /// Diff two retained snapshots.
    SnapshotDiff {
        /// Earlier snapshot.
        before_id: SnapshotId,
        /// Later snapshot.
        after_id: SnapshotId,
    },

    /// List retained snapshots.
    SnapshotList,

    /// Drop all retained snapshots.
    SnapshotClear,

    /// Compute the accessibility tree.
    AccessibilityTree {
        /// Subtree root; document body if absent.
        #[serde(default)]
        selector: Option<String>,
        /// Element bound.
        #[serde(default)]
        max_elements: Option<usize>,
    },

    // ========================================================================
    // Telemetry
    // ========================================================================
    /// Read the network log.
    NetworkLog {
        /// Method filter.
        #[serde(default)]
        method: Option<String>,
        /// URL regex filter.
        #[serde(default)]
        url_pattern: Option<String>,
        /// Status filter.
        #[serde(default)]
        status: Option<u16>,
        /// Only errored or >= 400 entries.
        #[serde(default)]
        errors_only: bool,
        /// Entries to skip.
        #[serde(default)]
        offset: usize,
        /// Entries to return.
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Clear the network log.
    NetworkClear,

    /// Start recording document changes.
    MutationStart,

    /// Stop recording document changes.
    MutationStop,

    /// Read the mutation log.
    MutationLog {
        /// Kind filter.
        #[serde(default)]
        mutation_type: Option<MutationKind>,
        /// Entries to skip.
        #[serde(default)]
        offset: usize,
        /// Entries to return.
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Clear the mutation log.
    MutationClear,

    /// Start recording performance measurements.
    PerformanceStart {
        /// Categories; all if absent.
        #[serde(default)]
        categories: Option<Vec<PerformanceCategory>>,
    },

    /// Stop recording performance measurements.
    PerformanceStop,

    /// Read the performance log.
    PerformanceMetrics {
        /// Category filter.
        #[serde(default)]
        category: Option<PerformanceCategory>,
        /// Entries to skip.
        #[serde(default)]
        offset: usize,
        /// Entries to return.
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Clear the performance log.
    PerformanceClear,

    /// Summarize the performance log.
    PerformanceSnapshot,

    // ========================================================================
    // Screenshot
    // ========================================================================
    /// Render an element or the full page.
    ScreenshotCapture {
        /// Explicit id; generated if absent.
        #[serde(default)]
        screenshot_id: Option<ScreenshotId>,
        /// Element to render; body if absent.
        #[serde(default)]
        selector: Option<String>,
        /// Render the whole scrollable page.
        #[serde(default)]
        full_page: bool,
        /// Output format.
        #[serde(default)]
        format: ScreenshotFormat,
        /// JPEG quality (0-100).
        #[serde(default)]
        quality: Option<u8>,
        /// Device pixel scale.
        #[serde(default)]
        scale: Option<f64>,
    },

    /// Fetch a cached screenshot.
    ScreenshotGet {
        /// Screenshot id.
        screenshot_id: ScreenshotId,
    },

    /// List cached screenshots.
    ScreenshotList,

    /// Drop all cached screenshots.
    ScreenshotClear,

    /// Compare two cached screenshots.
    ScreenshotCompare {
        /// First screenshot.
        first_id: ScreenshotId,
        /// Second screenshot.
        second_id: ScreenshotId,
    },

    // ========================================================================
    // Storage
    // ========================================================================
    /// Report storage usage.
    StorageUsage,

    /// Start polling storage for changes.
    StorageStart,

    /// Stop polling storage.
    StorageStop,

    /// Read the storage-change log.
    StorageLog {
        /// Scope filter.
        #[serde(default)]
        scope: Option<StorageScope>,
        /// Key filter.
        #[serde(default)]
        key: Option<String>,
        /// Entries to skip.
        #[serde(default)]
        offset: usize,
        /// Entries to return.
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Clear the storage-change log.
    StorageClearLog,

    /// Read one key, or every entry of a scope.
    StorageGet {
        /// Scope.
        #[serde(default = "default_scope")]
        scope: StorageScope,
        /// Key; all entries if absent.
        #[serde(default)]
        key: Option<String>,
    },

    /// Write one key.
    StorageSet {
        /// Scope.
        #[serde(default = "default_scope")]
        scope: StorageScope,
        /// Key.
        key: String,
        /// Value.
        value: String,
    },

    /// Remove one key.
    StorageRemove {
        /// Scope.
        #[serde(default = "default_scope")]
        scope: StorageScope,
        /// Key.
        key: String,
    },

    /// Clear one scope, or both if absent.
    StorageClear {
        /// Scope.
        #[serde(default)]
        scope: Option<StorageScope>,
    },

    // ========================================================================
    // Files
    // ========================================================================
    /// Read a file as base64.
    FileRead {
        /// File path.
        path: String,
    },

    /// Write a base64 payload to a file.
    FileWrite {
        /// File path.
        path: String,
        /// Base64 content.
        content: String,
    },

    // ========================================================================
    // Diagnostics
    // ========================================================================
    /// Report health and buffer state.
    Diagnostics,
}

fn default_scope() -> StorageScope {
    StorageScope::Local
}

// ============================================================================
// BatchStep
// ============================================================================

/// One fragment of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStep {
    /// Code to evaluate.
    pub code: String,
    /// Keep going if this fragment fails.
    #[serde(default)]
    pub continue_on_error: bool,
    /// Caller label echoed in the outcome.
    #[serde(default)]
    pub label: Option<String>,
}

// ============================================================================
// ScrollMode
// ============================================================================

/// Page scroll interpretation of `x`/`y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    /// Relative to the current position.
    #[default]
    By,
    /// Absolute position.
    To,
}

// ============================================================================
// CommandKind
// ============================================================================

/// Field-less mirror of [`Command`] used to recognize the `type` tag before
/// full decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Execute,
    BatchExecute,
    TerminalExecute,
    TerminalRead,
    TerminalStatus,
    SessionCreate,
    SessionList,
    SessionAttach,
    SessionDetach,
    SessionExec,
    SessionKill,
    DomQuery,
    DomClick,
    DomType,
    DomScroll,
    DomPaste,
    DomKeypress,
    DomFocus,
    SnapshotCapture,
    SnapshotDiff,
    SnapshotList,
    SnapshotClear,
    AccessibilityTree,
    NetworkLog,
    NetworkClear,
    MutationStart,
    MutationStop,
    MutationLog,
    MutationClear,
    PerformanceStart,
    PerformanceStop,
    PerformanceMetrics,
    PerformanceClear,
    PerformanceSnapshot,
    ScreenshotCapture,
    ScreenshotGet,
    ScreenshotList,
    ScreenshotClear,
    ScreenshotCompare,
    StorageUsage,
    StorageStart,
    StorageStop,
    StorageLog,
    StorageClearLog,
    StorageGet,
    StorageSet,
    StorageRemove,
    StorageClear,
    FileRead,
    FileWrite,
    Diagnostics,
}

impl CommandKind {
    /// Parses a `type` tag. Returns `None` for kinds this bridge does not know.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(tag.to_string())).ok()
    }

    /// Capability family the kind is accounted under.
    #[must_use]
    pub fn family(self) -> CapabilityFamily {
        use CommandKind::*;

        match self {
            Execute => CapabilityFamily::CodeExecution,
            BatchExecute => CapabilityFamily::BatchExecution,
            TerminalExecute | TerminalRead | TerminalStatus | SessionCreate | SessionList
            | SessionAttach | SessionDetach | SessionExec | SessionKill => {
                CapabilityFamily::Terminal
            }
            DomQuery | DomClick | DomType | DomScroll | DomPaste | DomKeypress | DomFocus => {
                CapabilityFamily::DomQuery
            }
            SnapshotCapture | SnapshotDiff | SnapshotList | SnapshotClear | AccessibilityTree => {
                CapabilityFamily::Snapshot
            }
            NetworkLog | NetworkClear | MutationStart | MutationStop | MutationLog
            | MutationClear | PerformanceStart | PerformanceStop | PerformanceMetrics
            | PerformanceClear | PerformanceSnapshot => CapabilityFamily::Telemetry,
            ScreenshotCapture | ScreenshotGet | ScreenshotList | ScreenshotClear
            | ScreenshotCompare => CapabilityFamily::Screenshot,
            StorageUsage | StorageStart | StorageStop | StorageLog | StorageClearLog
            | StorageGet | StorageSet | StorageRemove | StorageClear => CapabilityFamily::Storage,
            FileRead | FileWrite => CapabilityFamily::FileTransfer,
            Diagnostics => CapabilityFamily::Diagnostics,
        }
    }
}

impl Command {
    /// Returns the kind of this command.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Execute { .. } => CommandKind::Execute,
            Self::BatchExecute { .. } => CommandKind::BatchExecute,
            Self::TerminalExecute { .. } => CommandKind::TerminalExecute,
            Self::TerminalRead { .. } => CommandKind::TerminalRead,
            Self::TerminalStatus { .. } => CommandKind::TerminalStatus,
            Self::SessionCreate { .. } => CommandKind::SessionCreate,
            Self::SessionList => CommandKind::SessionList,
            Self::SessionAttach { .. } => CommandKind::SessionAttach,
            Self::SessionDetach { .. } => CommandKind::SessionDetach,
            Self::SessionExec { .. } => CommandKind::SessionExec,
            Self::SessionKill { .. } => CommandKind::SessionKill,
            Self::DomQuery { .. } => CommandKind::DomQuery,
            Self::DomClick { .. } => CommandKind::DomClick,
            Self::DomType { .. } => CommandKind::DomType,
            Self::DomScroll { .. } => CommandKind::DomScroll,
            Self::DomPaste { .. } => CommandKind::DomPaste,
            Self::DomKeypress { .. } => CommandKind::DomKeypress,
            Self::DomFocus { .. } => CommandKind::DomFocus,
            Self::SnapshotCapture { .. } => CommandKind::SnapshotCapture,
            Self::SnapshotDiff { .. } => CommandKind::SnapshotDiff,
            Self::SnapshotList => CommandKind::SnapshotList,
            Self::SnapshotClear => CommandKind::SnapshotClear,
            Self::AccessibilityTree { .. } => CommandKind::AccessibilityTree,
            Self::NetworkLog { .. } => CommandKind::NetworkLog,
            Self::NetworkClear => CommandKind::NetworkClear,
            Self::MutationStart => CommandKind::MutationStart,
            Self::MutationStop => CommandKind::MutationStop,
            Self::MutationLog { .. } => CommandKind::MutationLog,
            Self::MutationClear => CommandKind::MutationClear,
            Self::PerformanceStart { .. } => CommandKind::PerformanceStart,
            Self::PerformanceStop => CommandKind::PerformanceStop,
            Self::PerformanceMetrics { .. } => CommandKind::PerformanceMetrics,
            Self::PerformanceClear => CommandKind::PerformanceClear,
            Self::PerformanceSnapshot => CommandKind::PerformanceSnapshot,
            Self::ScreenshotCapture { .. } => CommandKind::ScreenshotCapture,
            Self::ScreenshotGet { .. } => CommandKind::ScreenshotGet,
            Self::ScreenshotList => CommandKind::ScreenshotList,
            Self::ScreenshotClear => CommandKind::ScreenshotClear,
            Self::ScreenshotCompare { .. } => CommandKind::ScreenshotCompare,
            Self::StorageUsage => CommandKind::StorageUsage,
            Self::StorageStart => CommandKind::StorageStart,
            Self::StorageStop => CommandKind::StorageStop,
            Self::StorageLog { .. } => CommandKind::StorageLog,
            Self::StorageClearLog => CommandKind::StorageClearLog,
            Self::StorageGet { .. } => CommandKind::StorageGet,
            Self::StorageSet { .. } => CommandKind::StorageSet,
            Self::StorageRemove { .. } => CommandKind::StorageRemove,
            Self::StorageClear { .. } => CommandKind::StorageClear,
            Self::FileRead { .. } => CommandKind::FileRead,
            Self::FileWrite { .. } => CommandKind::FileWrite,
            Self::Diagnostics => CommandKind::Diagnostics,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
