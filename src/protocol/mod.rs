//! WebSocket protocol message types.
//!
//! This module defines the envelope format exchanged between this page
//! (the bridge) and the remote controller.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `ready` | Bridge → Controller | Announces this page once per connect |
//! | `ping` / `pong` | Both | Heartbeat and latency measurement |
//! | `<command>` | Controller → Bridge | One of the enumerated [`Command`] kinds |
//! | `result` | Bridge → Controller | Correlated outcome of one command |
//! | `console` | Bridge → Controller | Mirror of the page's console output |
//!
//! # Command Naming
//!
//! Command kinds are snake_case tags in the `type` field
//! (`snapshot_capture`, `dom_click`, ...); kind-specific fields are camelCase.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Inbound command envelopes |
//! | `message` | Outbound envelopes and inbound control frames |
//! | `serialize` | Value and error serialization rules |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound command definitions.
pub mod command;

/// Outbound messages and control frames.
pub mod message;

/// Value and error serialization.
pub mod serialize;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{BatchStep, Command, CommandKind, Envelope, ScrollMode};
pub use message::{ConsoleLevel, ControlFrame, Outbound, Timing};
pub use serialize::{ErrorPayload, serialize_value};
pub(crate) use serialize::to_json_text;
