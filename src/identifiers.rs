//! Type-safe identifiers for bridge entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//! All identifiers are strings on the wire.
//!
//! | Type | Source |
//! |------|--------|
//! | [`CorrelationId`] | Controller, echoed on the result envelope |
//! | [`ElementId`] | Host document, opaque element reference |
//! | [`SnapshotId`] | Controller or generated |
//! | [`ScreenshotId`] | Controller or generated |
//! | [`SessionId`] | Controller or generated, `"default"` for the implicit session |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Macro
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

string_id!(
    /// Caller-supplied id linking a result envelope to its command.
    CorrelationId
);

string_id!(
    /// Opaque element reference handed out by the host document.
    ElementId
);

string_id!(
    /// Identifier of a retained DOM snapshot.
    SnapshotId
);

string_id!(
    /// Identifier of a cached screenshot.
    ScreenshotId
);

string_id!(
    /// Identifier of a terminal session.
    SessionId
);

impl SnapshotId {
    /// Generates a fresh snapshot id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("snap-{}", short_uuid()))
    }
}

impl ScreenshotId {
    /// Generates a fresh screenshot id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("shot-{}", short_uuid()))
    }
}

impl SessionId {
    /// Id of the session created lazily on first use.
    pub const DEFAULT: &'static str = "default";

    /// Returns the default session id.
    #[inline]
    #[must_use]
    pub fn default_session() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    /// Returns `true` if this is the lazily created default session.
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    /// Generates a fresh session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("session-{}", short_uuid()))
    }
}

fn short_uuid() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

// ============================================================================
// Tests
// ============================================================================
