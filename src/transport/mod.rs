//! WebSocket transport layer.
//!
//! This module handles communication between the bridge (inside the page)
//! and the remote controller via one persistent WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Bridge (page)  │         WebSocket            │  Controller     │
//! │                 │                              │                 │
//! │  Outbox ────────┼─────────────────────────────►│  commands in,   │
//! │  Dispatcher ◄───┼──────────────────────────────│  results out    │
//! │                 │   controller_url?page=...    │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ConnectionManager::connect` - Start the supervisor (no-op if running)
//! 2. Open - Send `ready`, flush the retry queue, start the heartbeat
//! 3. Close or error - Detach the outbox, count a reconnect, wait, redial
//! 4. `ConnectionManager::shutdown` - Close the socket and stop redialing
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket supervisor, heartbeat, inbound routing |
//! | `outbox` | Send path with queue fallback |
//! | `queue` | Bounded FIFO retry queue |

// ============================================================================
// Submodules
// ============================================================================

/// Socket supervisor.
pub mod connection;

/// Outbound send path.
pub mod outbox;

/// Bounded retry queue.
pub mod queue;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::ConnectionManager;
pub use outbox::Outbox;
pub use queue::{QueuedMessage, RetryQueue};
