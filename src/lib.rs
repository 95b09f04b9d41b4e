//! Page Bridge - In-page remote control over a persistent WebSocket channel.
//!
//! This library runs inside a hosted page and lets a remote controller drive
//! and inspect it: evaluate code, run shell commands, query and interact with
//! elements, capture snapshots and screenshots, and read network, mutation,
//! performance, and storage telemetry.
//!
//! # Architecture
//!
//! The bridge is the client of a client-server pair:
//!
//! - **Controller (remote)**: Sends commands, receives results and telemetry
//! - **Bridge (this crate)**: Executes commands against the page via host traits
//!
//! Key design principles:
//!
//! - One [`Bridge`] per page: one channel, one outbox, one set of logs
//! - Every decodable command gets exactly one `result` envelope
//! - Outbound messages are queued (bounded) while the channel is down
//! - The page itself is reached only through narrow [`host`] traits
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use page_bridge::{Bridge, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let bridge = Bridge::builder()
//!         .controller_url("ws://127.0.0.1:9222/bridge")
//!         .page("checkout")
//!         .script_host(Arc::new(MyScriptHost::new()))
//!         .document_host(Arc::new(MyDocument::new()))
//!         .build()?;
//!
//!     bridge.connect();
//!     tokio::signal::ctrl_c().await.ok();
//!     bridge.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | [`Bridge`], [`BridgeBuilder`], command handlers |
//! | [`config`] | [`BridgeConfig`], capacities, limits |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`health`] | Connection health and per-family counters |
//! | [`host`] | Host capability traits |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire envelopes and value serialization |
//! | [`screenshot`] | Rendering, encoding, and the screenshot cache |
//! | [`snapshot`] | DOM snapshots, diffs, accessibility trees |
//! | [`telemetry`] | Bounded logs and the [`TelemetrySink`] |
//! | [`terminal`] | Terminal sessions |
//! | [`transport`] | Outbox, retry queue, socket supervisor |

// ============================================================================
// Modules
// ============================================================================

/// The bridge and its command handlers.
///
/// Use [`Bridge::builder()`] to wire host capabilities.
pub mod bridge;

/// Configuration and defaults.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Health counters.
pub mod health;

/// Host capability traits.
pub mod host;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Wire protocol types.
pub mod protocol;

/// Screenshot rendering and caching.
pub mod screenshot;

/// DOM snapshots.
pub mod snapshot;

/// Bounded keyed store shared by snapshots and screenshots.
pub mod store;

/// Telemetry logs.
pub mod telemetry;

/// Terminal sessions.
pub mod terminal;

/// WebSocket transport layer.
///
/// Handles the outbound queue and the reconnecting socket supervisor.
pub mod transport;

mod util;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{Bridge, BridgeBuilder, Diagnostics};

// Configuration
pub use config::{BridgeConfig, Capacities, Limits};

// Error types
pub use error::{Error, Result};

// Host traits
pub use host::{
    DocumentHost, FileHost, Rasterizer, ScriptHost, ShellHost, StorageHost, TelemetryHost,
};

// Identifier types
pub use identifiers::{CorrelationId, ElementId, ScreenshotId, SessionId, SnapshotId};

// Telemetry entry point
pub use telemetry::TelemetrySink;
