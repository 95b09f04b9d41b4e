//! Host capability seams.
//!
//! The bridge never implements the page itself. Everything it touches in the
//! page goes through one of these narrow traits, provided by the embedder:
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`ScriptHost`] | Evaluate code against the page's global scope |
//! | [`DocumentHost`] | Query, read, and mutate elements |
//! | [`ShellHost`] | Run a command line, stream its output |
//! | [`StorageHost`] | Key-value storage scopes |
//! | [`Rasterizer`] | Turn a vector image into pixels |
//! | [`TelemetryHost`] | Subscribe to mutation and performance feeds |
//! | [`FileHost`] | Read and write files for transfers |
//!
//! Elements are referenced by opaque [`ElementId`](crate::ElementId)s that
//! the host maps to live nodes.

// ============================================================================
// Submodules
// ============================================================================

/// Document access.
pub mod document;

/// File transfer access.
pub mod files;

/// Keyboard key model.
pub mod keyboard;

/// Rasterization.
pub mod render;

/// Code evaluation.
pub mod script;

/// Command shell.
pub mod shell;

/// Key-value storage.
pub mod storage;

/// Telemetry subscriptions.
pub mod telemetry;

/// Fallback for capabilities the embedder does not provide.
pub mod unavailable;

// ============================================================================
// Re-exports
// ============================================================================

pub use document::{DocumentHost, ElementInfo, Rect, ScrollTarget, Viewport};
pub use files::FileHost;
pub use keyboard::{Key, KeyEvent, Modifiers};
pub use render::Rasterizer;
pub use script::{Deferred, Evaluation, ScriptError, ScriptHost, ScriptValue};
pub use shell::{OutputStream, ShellExit, ShellHost, ShellOutput, ShellRequest};
pub use storage::{StorageEstimate, StorageHost, StorageScope};
pub use telemetry::{TelemetryHost, TelemetryStream};
pub use unavailable::Unavailable;
