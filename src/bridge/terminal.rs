//! Terminal and session handlers.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::host::{OutputStream, ShellExit, ShellOutput};
use crate::identifiers::SessionId;
use crate::protocol::to_json_text;
use crate::terminal::{RunTicket, SessionSpec, TerminalMux};

use super::Bridge;
use super::dispatch::Reply;

// ============================================================================
// Types
// ============================================================================

/// Result of one finished command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    /// Session the command ran in.
    pub session_id: SessionId,
    /// Command line.
    pub command: String,
    /// Exit status.
    pub exit_code: i32,
    /// Collected standard output.
    pub stdout: String,
    /// Collected standard error.
    pub stderr: String,
    /// Working directory after the command.
    pub cwd: Option<String>,
    /// Run time in ms.
    pub duration: f64,
}

#[derive(Default)]
struct Collected {
    stdout: String,
    stderr: String,
}

impl Collected {
    fn push(&mut self, chunk: &ShellOutput) {
        match chunk.stream {
            OutputStream::Stdout => self.stdout.push_str(&chunk.text),
            OutputStream::Stderr => self.stderr.push_str(&chunk.text),
        }
    }
}

// ============================================================================
// Bridge - Terminal
// ============================================================================

impl Bridge {
    /// Runs a command in a session and waits for it to exit.
    ///
    /// On timeout the session returns to idle immediately; the host command
    /// keeps running and its later output is still captured.
    pub(crate) async fn terminal_execute(
        &self,
        session_id: Option<SessionId>,
        command: &str,
        timeout_ms: Option<u64>,
    ) -> Result<Reply> {
        let session_id = session_id.unwrap_or_else(SessionId::default_session);
        let mux = Arc::clone(&self.inner.terminals);
        let (ticket, request) = mux.begin(&session_id, command)?;

        let started = Instant::now();
        let deadline = sleep(self.deadline(timeout_ms));
        tokio::pin!(deadline);

        let (output_tx, mut output_rx) = mpsc::unbounded_channel::<ShellOutput>();
        let shell = Arc::clone(&self.inner.hosts.shell);
        let mut run = tokio::spawn(async move { shell.run(request, output_tx).await });

        let mut collected = Collected::default();

        let joined = loop {
            tokio::select! {
                biased;

                Some(chunk) = output_rx.recv() => {
                    collected.push(&chunk);
                    mux.append(&ticket, chunk);
                }

                joined = &mut run => break Some(joined),

                () = &mut deadline => break None,
            }
        };

        let Some(joined) = joined else {
            let elapsed = started.elapsed().as_millis() as u64;
            warn!(session_id = %session_id, command, elapsed, "Command timed out");
            mux.finish(&ticket, None, None);
            tokio::spawn(drain_late(mux, ticket, output_rx, run));
            return Err(Error::timeout(format!("terminal: {command}"), elapsed));
        };

        while let Ok(chunk) = output_rx.try_recv() {
            collected.push(&chunk);
            mux.append(&ticket, chunk);
        }

        let exit = match joined {
            Ok(Ok(exit)) => exit,
            Ok(Err(e)) => {
                mux.finish(&ticket, None, None);
                return Err(e);
            }
            Err(join_err) => {
                mux.finish(&ticket, None, None);
                return Err(Error::host(format!("shell task aborted: {join_err}")));
            }
        };

        mux.finish(&ticket, Some(exit.code), exit.cwd.clone());
        debug!(session_id = %session_id, command, exit_code = exit.code, "Command finished");

        let outcome = CommandOutcome {
            cwd: exit.cwd.or_else(|| {
                mux.status(&session_id).ok().and_then(|status| status.cwd)
            }),
            session_id,
            command: command.to_string(),
            exit_code: exit.code,
            stdout: collected.stdout,
            stderr: collected.stderr,
            duration: started.elapsed().as_secs_f64() * 1000.0,
        };
        to_json_text(&outcome).map(Some)
    }

    pub(crate) fn terminal_read(
        &self,
        session_id: Option<SessionId>,
        since: Option<u64>,
        limit: Option<usize>,
    ) -> Result<Reply> {
        let session_id = session_id.unwrap_or_else(SessionId::default_session);
        to_json_text(&self.inner.terminals.read(&session_id, since, limit)?).map(Some)
    }

    pub(crate) fn terminal_status(&self, session_id: Option<SessionId>) -> Result<Reply> {
        let session_id = session_id.unwrap_or_else(SessionId::default_session);
        to_json_text(&self.inner.terminals.status(&session_id)?).map(Some)
    }

    pub(crate) fn session_create(
        &self,
        id: Option<SessionId>,
        name: Option<String>,
        cwd: Option<String>,
        env: BTreeMap<String, String>,
    ) -> Result<Reply> {
        let summary = self.inner.terminals.create(SessionSpec { id, name, cwd, env })?;
        to_json_text(&summary).map(Some)
    }

    pub(crate) fn session_list(&self) -> Result<Reply> {
        to_json_text(&self.inner.terminals.list()).map(Some)
    }

    pub(crate) fn session_attach(&self, session_id: &SessionId, attached: bool) -> Result<Reply> {
        to_json_text(&self.inner.terminals.set_attached(session_id, attached)?).map(Some)
    }

    pub(crate) fn session_kill(&self, session_id: &SessionId) -> Result<Reply> {
        to_json_text(&self.inner.terminals.kill(session_id)?).map(Some)
    }
}

/// Keeps capturing a timed-out command until the host finishes it.
async fn drain_late(
    mux: Arc<TerminalMux>,
    ticket: RunTicket,
    mut output_rx: mpsc::UnboundedReceiver<ShellOutput>,
    run: JoinHandle<Result<ShellExit>>,
) {
    while let Some(chunk) = output_rx.recv().await {
        mux.append(&ticket, chunk);
    }
    if let Ok(Ok(exit)) = run.await {
        mux.finish(&ticket, Some(exit.code), exit.cwd);
    }
}

// ============================================================================
// Tests
// ============================================================================
