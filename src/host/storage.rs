//! Key-value storage access.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// A key-value storage scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Persistent storage.
    Local,
    /// Per-session storage.
    Session,
}

impl StorageScope {
    /// Both scopes, in polling order.
    pub const ALL: [StorageScope; 2] = [StorageScope::Local, StorageScope::Session];

    /// Wire name of the scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota estimate reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEstimate {
    /// Bytes in use.
    pub usage: u64,
    /// Bytes available.
    pub quota: u64,
}

// ============================================================================
// StorageHost
// ============================================================================

/// Reads and writes the page's key-value storage.
pub trait StorageHost: Send + Sync {
    /// Returns all entries of a scope.
    fn entries(&self, scope: StorageScope) -> Result<Vec<(String, String)>>;

    /// Returns one value.
    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>>;

    /// Stores one value.
    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()>;

    /// Removes one key.
    fn remove(&self, scope: StorageScope, key: &str) -> Result<()>;

    /// Removes every key of a scope.
    fn clear(&self, scope: StorageScope) -> Result<()>;

    /// Returns the host's quota estimate, if it has one.
    fn estimate(&self) -> Option<StorageEstimate> {
        None
    }
}
