//! File transfer access.

use async_trait::async_trait;

use crate::error::Result;

/// Reads and writes files in the host's filesystem.
#[async_trait]
pub trait FileHost: Send + Sync {
    /// Reads a whole file.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Writes a whole file, replacing any existing content.
    async fn write(&self, path: &str, data: Vec<u8>) -> Result<()>;
}
