//! Error types for the page bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use page_bridge::{Error, Result};
//!
//! fn lookup(store: &SnapshotStore, id: &SnapshotId) -> Result<Arc<Snapshot>> {
//!     store.get(id).ok_or_else(|| Error::snapshot_not_found(id.clone()))
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Decode`], [`Error::InvalidArgument`] |
//! | Document | [`Error::ElementNotFound`], [`Error::StaleElement`] |
//! | Stores | [`Error::SnapshotNotFound`], [`Error::ScreenshotNotFound`], [`Error::SessionNotFound`] |
//! | Execution | [`Error::Script`], [`Error::Timeout`], [`Error::SessionBusy`] |
//! | Host | [`Error::Unsupported`], [`Error::Host`], [`Error::Render`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`], [`Error::Image`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use base64::DecodeError as Base64Error;
use image::ImageError;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError as UrlError;

use crate::host::ScriptError;
use crate::identifiers::{ElementId, ScreenshotId, SessionId, SnapshotId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. Handler errors are
/// turned into the structured payload sent back to the controller, see
/// [`ErrorPayload`](crate::protocol::ErrorPayload).
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Channel is not open.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound envelope could not be decoded.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// Invalid argument in command fields.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// No element matched the selector.
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// CSS selector used.
        selector: String,
    },

    /// Element reference is no longer attached to the document.
    #[error("Stale element: {element_id}")]
    StaleElement {
        /// The stale element's ID.
        element_id: ElementId,
    },

    // ========================================================================
    // Store Errors
    // ========================================================================
    /// Snapshot not retained.
    #[error("Snapshot not found: {snapshot_id}")]
    SnapshotNotFound {
        /// The missing snapshot ID.
        snapshot_id: SnapshotId,
    },

    /// Screenshot not cached.
    #[error("Screenshot not found: {screenshot_id}")]
    ScreenshotNotFound {
        /// The missing screenshot ID.
        screenshot_id: ScreenshotId,
    },

    /// Terminal session does not exist.
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// The missing session ID.
        session_id: SessionId,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Code raised an error inside the page.
    #[error("{0}")]
    Script(ScriptError),

    /// Deadline elapsed before the operation settled.
    ///
    /// The underlying operation is not canceled.
    #[error("Timeout after {elapsed_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds elapsed when the deadline fired.
        elapsed_ms: u64,
    },

    /// A command is already running in the session.
    #[error("Session {session_id} is busy running: {command}")]
    SessionBusy {
        /// The busy session.
        session_id: SessionId,
        /// Command currently running.
        command: String,
    },

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// Host does not provide this capability.
    #[error("Capability unavailable: {capability}")]
    Unsupported {
        /// Name of the missing capability.
        capability: String,
    },

    /// Host capability failed.
    #[error("Host error: {message}")]
    Host {
        /// Message reported by the host.
        message: String,
    },

    /// Rendering or encoding a screenshot failed.
    #[error("Render error: {message}")]
    Render {
        /// Description of the render failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    /// Image encoding error.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Base64 decoding error.
    #[error("Base64 error: {0}")]
    Base64(#[from] Base64Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElement { element_id }
    }

    /// Creates a snapshot not found error.
    #[inline]
    pub fn snapshot_not_found(snapshot_id: SnapshotId) -> Self {
        Self::SnapshotNotFound { snapshot_id }
    }

    /// Creates a screenshot not found error.
    #[inline]
    pub fn screenshot_not_found(screenshot_id: ScreenshotId) -> Self {
        Self::ScreenshotNotFound { screenshot_id }
    }

    /// Creates a session not found error.
    #[inline]
    pub fn session_not_found(session_id: SessionId) -> Self {
        Self::SessionNotFound { session_id }
    }

    /// Creates a session busy error.
    #[inline]
    pub fn session_busy(session_id: SessionId, command: impl Into<String>) -> Self {
        Self::SessionBusy {
            session_id,
            command: command.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }

    /// Creates an unsupported capability error.
    #[inline]
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }

    /// Creates a host error.
    #[inline]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// Creates a render error.
    #[inline]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

impl From<ScriptError> for Error {
    fn from(err: ScriptError) -> Self {
        Self::Script(err)
    }
}

// ============================================================================
// Error Predicates & Tags
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the error comes from a missing stored entity.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::SnapshotNotFound { .. }
                | Self::ScreenshotNotFound { .. }
                | Self::SessionNotFound { .. }
        )
    }

    /// Error class name reported to the controller.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Script(err) => &err.name,
            Self::Timeout { .. } => "TimeoutError",
            Self::InvalidArgument { .. } | Self::Decode { .. } => "TypeError",
            Self::ElementNotFound { .. }
            | Self::SnapshotNotFound { .. }
            | Self::ScreenshotNotFound { .. }
            | Self::SessionNotFound { .. } => "NotFoundError",
            Self::StaleElement { .. } => "StaleElementError",
            Self::SessionBusy { .. } => "SessionBusyError",
            Self::Unsupported { .. } => "NotSupportedError",
            _ => "Error",
        }
    }

    /// Error category reported in the payload `type` field.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_) => "transport",
            Self::Decode { .. } | Self::Json(_) | Self::Base64(_) => "decode",
            Self::InvalidArgument { .. } | Self::Url(_) => "invalid_argument",
            Self::ElementNotFound { .. }
            | Self::StaleElement { .. }
            | Self::SnapshotNotFound { .. }
            | Self::ScreenshotNotFound { .. }
            | Self::SessionNotFound { .. } => "not_found",
            Self::Script(_) => "script",
            Self::Timeout { .. } => "timeout",
            Self::SessionBusy { .. } => "busy",
            Self::Unsupported { .. } => "unsupported",
            Self::Host { .. } | Self::Io(_) => "host",
            Self::Render { .. } | Self::Image(_) => "render",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
