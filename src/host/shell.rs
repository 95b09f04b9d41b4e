//! Command shell access.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// One chunk of command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Source stream.
    pub stream: OutputStream,
    /// Text as emitted.
    pub text: String,
}

impl ShellOutput {
    /// Creates a stdout chunk.
    #[must_use]
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    /// Creates a stderr chunk.
    #[must_use]
    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

/// A command line to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellRequest {
    /// Full command line.
    pub command: String,
    /// Working directory, if the session has one.
    pub cwd: Option<String>,
    /// Extra environment.
    pub env: BTreeMap<String, String>,
}

/// Final status of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellExit {
    /// Exit status.
    pub code: i32,
    /// Working directory after the command, if it changed.
    pub cwd: Option<String>,
}

// ============================================================================
// ShellHost
// ============================================================================

/// Runs command lines in the host's shell.
#[async_trait]
pub trait ShellHost: Send + Sync {
    /// Runs `request`, streaming output chunks into `output` as they arrive.
    ///
    /// Resolves once the command exits.
    async fn run(
        &self,
        request: ShellRequest,
        output: mpsc::UnboundedSender<ShellOutput>,
    ) -> Result<ShellExit>;
}
