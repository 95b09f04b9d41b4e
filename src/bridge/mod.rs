//! The bridge: one page, one controller channel, every command handler.
//!
//! A [`Bridge`] owns the outbound send path, the socket supervisor, and all
//! per-page state (logs, caches, terminal sessions). Handlers are grouped by
//! capability in submodules that each add an `impl Bridge` block.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Bridge struct, lifecycle, and accessors |
//! | `builder` | Host wiring and config validation |
//! | `dispatch` | Inbound decoding, routing, result envelopes |
//! | `execute` | Code and batch execution |
//! | `terminal` | Terminal commands and sessions |
//! | `dom` | Element queries and interactions |
//! | `snapshot` | Snapshots, diffs, accessibility trees |
//! | `telemetry` | Network, mutation, and performance logs |
//! | `screenshot` | Renders, cache, comparison |
//! | `storage` | Storage access and change polling |
//! | `files` | File reads and writes |
//! | `diagnostics` | Self-report |
//!
//! # Example
//!
//! ```ignore
//! let bridge = Bridge::builder()
//!     .controller_url("ws://127.0.0.1:9222/bridge")
//!     .script_host(Arc::new(script))
//!     .document_host(Arc::new(document))
//!     .build()?;
//!
//! bridge.connect();
//!
//! // Host feeds push into the sink
//! let sink = bridge.telemetry();
//! sink.mutation(MutationRecord::child_list("body", vec!["div".into()], vec![]));
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod core;
mod diagnostics;
mod dispatch;
mod dom;
mod execute;
mod files;
mod screenshot;
mod snapshot;
mod storage;
mod telemetry;
mod terminal;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::builder::BridgeBuilder;
pub use self::core::Bridge;
pub use self::diagnostics::{Diagnostics, LogUsage, LogsUsage, Recording};
pub use self::dom::{ElementSummary, QueryResult};
pub use self::execute::{BatchOutcome, StepOutcome};
pub use self::storage::{ScopeUsage, StorageUsage};
pub use self::terminal::CommandOutcome;
