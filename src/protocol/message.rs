//! Outbound envelopes and transport control frames.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::CorrelationId;
use crate::util::now_ms;

// ============================================================================
// Outbound
// ============================================================================

/// Every message the bridge sends to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Sent once per successful connect.
    Ready {
        /// Page label.
        page: String,
        /// Send time in ms.
        timestamp: u64,
    },

    /// Heartbeat.
    Ping {
        /// Page label.
        page: String,
        /// Send time in ms.
        timestamp: u64,
    },

    /// Reply to one decoded command.
    Result {
        /// Correlation id of the command.
        id: CorrelationId,
        /// Serialized result, on success.
        result: Option<String>,
        /// Serialized error, on failure.
        error: Option<String>,
        /// Handler timing.
        timing: Option<Timing>,
    },

    /// Mirrored page console output.
    Console {
        /// Page label.
        page: String,
        /// Console level.
        level: ConsoleLevel,
        /// Console arguments.
        args: Vec<Value>,
    },
}

impl Outbound {
    /// Creates a `ready` announcement stamped now.
    #[must_use]
    pub fn ready(page: impl Into<String>) -> Self {
        Self::Ready {
            page: page.into(),
            timestamp: now_ms(),
        }
    }

    /// Creates a `ping` carrying `timestamp`.
    #[must_use]
    pub fn ping(page: impl Into<String>, timestamp: u64) -> Self {
        Self::Ping {
            page: page.into(),
            timestamp,
        }
    }

    /// Creates a successful result.
    #[must_use]
    pub fn success(id: CorrelationId, result: Option<String>, timing: Timing) -> Self {
        Self::Result {
            id,
            result,
            error: None,
            timing: Some(timing),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(id: CorrelationId, error: String, timing: Timing) -> Self {
        Self::Result {
            id,
            result: None,
            error: Some(error),
            timing: Some(timing),
        }
    }

    /// Returns the envelope type tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Ping { .. } => "ping",
            Self::Result { .. } => "result",
            Self::Console { .. } => "console",
        }
    }
}

/// Handler timing attached to results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Handler duration in ms.
    pub duration: f64,
    /// Completion time in ms since the epoch.
    pub timestamp: u64,
}

/// Console output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

// ============================================================================
// ControlFrame
// ============================================================================

/// Inbound frames consumed by the transport itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlFrame {
    /// Heartbeat reply.
    Pong {
        /// Echoed or controller time in ms.
        #[serde(default)]
        timestamp: Option<u64>,
    },
}

impl ControlFrame {
    /// Parses `text` as a control frame. Commands and garbage return `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

// ============================================================================
// Tests
// ============================================================================
