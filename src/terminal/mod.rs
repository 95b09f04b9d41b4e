//! Terminal session multiplexer.
//!
//! Named, independent sessions over the host shell. Each session is a small
//! state machine:
//!
//! ```text
//! idle ──execute──► running ──exit / error / timeout──► idle
//! ```
//!
//! The default session is created the first time it is addressed; other
//! sessions must be created explicitly and live until killed. Killing only
//! drops bookkeeping; it does not stop the host process.

// ============================================================================
// Submodules
// ============================================================================

/// Per-session state.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use session::{
    HistoryEntry, OutputEntry, SessionState, SessionStatus, SessionSummary, TerminalSession,
};

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::{ShellOutput, ShellRequest};
use crate::identifiers::SessionId;

// ============================================================================
// Types
// ============================================================================

/// Identifies one command run in one session.
///
/// Run numbers are unique across the multiplexer, so a ticket from a killed
/// session never matches a session later created under the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    /// Session the command runs in.
    pub session_id: SessionId,
    run: u64,
}

/// Parameters for an explicit create.
#[derive(Debug, Clone, Default)]
pub struct SessionSpec {
    /// Explicit id; generated if absent.
    pub id: Option<SessionId>,
    /// Display name.
    pub name: Option<String>,
    /// Initial working directory.
    pub cwd: Option<String>,
    /// Environment merged into each command.
    pub env: BTreeMap<String, String>,
}

/// Output read from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOutput {
    /// Session read.
    pub session_id: SessionId,
    /// Matching entries, oldest first.
    pub entries: Vec<OutputEntry>,
}

// ============================================================================
// TerminalMux
// ============================================================================

/// All sessions of one bridge.
#[derive(Debug)]
pub struct TerminalMux {
    sessions: Mutex<FxHashMap<SessionId, TerminalSession>>,
    runs: AtomicU64,
    output_cap: usize,
    history_cap: usize,
}

impl TerminalMux {
    /// Creates an empty multiplexer.
    #[must_use]
    pub fn new(output_cap: usize, history_cap: usize) -> Self {
        Self {
            sessions: Mutex::new(FxHashMap::default()),
            runs: AtomicU64::new(0),
            output_cap,
            history_cap,
        }
    }

    fn session(&self, id: SessionId, name: Option<String>) -> TerminalSession {
        TerminalSession::new(id, name, self.output_cap).with_history_cap(self.history_cap)
    }

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is taken.
    pub fn create(&self, spec: SessionSpec) -> Result<SessionSummary> {
        let id = spec.id.unwrap_or_else(SessionId::generate);
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&id) {
            return Err(Error::invalid_argument(format!("session already exists: {id}")));
        }

        let session = self
            .session(id.clone(), spec.name)
            .with_cwd(spec.cwd)
            .with_env(spec.env);
        let summary = session.summary();
        sessions.insert(id.clone(), session);

        debug!(session_id = %id, "Session created");
        Ok(summary)
    }

    /// Lists sessions, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut list: Vec<SessionSummary> =
            self.sessions.lock().values().map(TerminalSession::summary).collect();
        list.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        list
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns `true` if no session exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Sets a session's attached flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for unknown ids.
    pub fn set_attached(&self, id: &SessionId, attached: bool) -> Result<SessionSummary> {
        self.with_session(id, |session| {
            session.set_attached(attached);
            session.summary()
        })
    }

    /// Removes a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for unknown ids.
    pub fn kill(&self, id: &SessionId) -> Result<SessionSummary> {
        let session = self
            .sessions
            .lock()
            .remove(id)
            .ok_or_else(|| Error::session_not_found(id.clone()))?;
        debug!(session_id = %id, running = ?session.current_command(), "Session killed");
        Ok(session.summary())
    }

    /// Returns a session's full status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for unknown non-default ids.
    pub fn status(&self, id: &SessionId) -> Result<SessionStatus> {
        self.with_session(id, |session| session.status())
    }

    /// Reads a session's captured output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for unknown non-default ids.
    pub fn read(&self, id: &SessionId, since: Option<u64>, limit: Option<usize>) -> Result<TerminalOutput> {
        self.with_session(id, |session| TerminalOutput {
            session_id: id.clone(),
            entries: session.read(since, limit),
        })
    }

    /// Starts a command in a session.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionNotFound`] for unknown non-default ids
    /// - [`Error::SessionBusy`] if a command is already running
    pub fn begin(&self, id: &SessionId, command: &str) -> Result<(RunTicket, ShellRequest)> {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        let request = self.with_session(id, |session| {
            session.begin(run, command).ok_or_else(|| {
                Error::session_busy(id.clone(), session.current_command().unwrap_or_default())
            })
        })??;

        debug!(session_id = %id, command, run, "Command started");
        Ok((
            RunTicket {
                session_id: id.clone(),
                run,
            },
            request,
        ))
    }

    /// Records one output chunk. Dropped if the session was killed, even
    /// if another session now has the same id.
    pub fn append(&self, ticket: &RunTicket, chunk: ShellOutput) {
        if let Some(session) = self.sessions.lock().get_mut(&ticket.session_id)
            && session.owns(ticket.run)
        {
            session.append_output(chunk.stream, chunk.text);
        }
    }

    /// Returns the session to idle with a final status.
    pub fn finish(&self, ticket: &RunTicket, exit_code: Option<i32>, cwd: Option<String>) {
        if let Some(session) = self.sessions.lock().get_mut(&ticket.session_id) {
            session.finish(ticket.run, exit_code, cwd);
        }
    }

    /// Runs `f` on a session, creating the default session on first use.
    fn with_session<T>(&self, id: &SessionId, f: impl FnOnce(&mut TerminalSession) -> T) -> Result<T> {
        let mut sessions = self.sessions.lock();
        if !sessions.contains_key(id) {
            if !id.is_default() {
                return Err(Error::session_not_found(id.clone()));
            }
            debug!(session_id = %id, "Creating default session");
            sessions.insert(id.clone(), self.session(id.clone(), None));
        }

        sessions
            .get_mut(id)
            .map(f)
            .ok_or_else(|| Error::session_not_found(id.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_created_once() {
        let mux = TerminalMux::new(100, 100);
        let default = SessionId::default_session();

        mux.status(&default).expect("status");
        mux.read(&default, None, None).expect("read");
        let (ticket, _) = mux.begin(&default, "ls").expect("begin");
        mux.finish(&ticket, Some(0), None);

        assert_eq!(mux.len(), 1);
        assert_eq!(mux.status(&default).expect("status").summary.history_len, 1);
    }

    #[test]
    fn test_unknown_named_session_is_not_found() {
        let mux = TerminalMux::new(100, 100);
        let err = mux.begin(&SessionId::new("nope"), "ls").expect_err("missing");
        assert!(matches!(err, Error::SessionNotFound { .. }));
        assert!(mux.is_empty());
    }

    #[test]
    fn test_busy_session_rejects_second_command() {
        let mux = TerminalMux::new(100, 100);
        let id = SessionId::new("build");
        mux.create(SessionSpec {
            id: Some(id.clone()),
            ..SessionSpec::default()
        })
        .expect("create");

        mux.begin(&id, "make").expect("begin");
        let err = mux.begin(&id, "make test").expect_err("busy");
        assert!(matches!(err, Error::SessionBusy { ref command, .. } if command == "make"));
    }

    #[test]
    fn test_create_duplicate_and_kill() {
        let mux = TerminalMux::new(100, 100);
        let summary = mux.create(SessionSpec::default()).expect("create");
        assert!(summary.id.as_str().starts_with("session-"));

        let again = mux.create(SessionSpec {
            id: Some(summary.id.clone()),
            ..SessionSpec::default()
        });
        assert!(again.is_err());

        let attached = mux.set_attached(&summary.id, true).expect("attach");
        assert!(attached.attached);

        mux.kill(&summary.id).expect("kill");
        assert!(mux.kill(&summary.id).is_err());
    }

    #[test]
    fn test_killed_run_does_not_touch_recreated_session() {
        let mux = TerminalMux::new(100, 100);
        let default = SessionId::default_session();
        let (stale, _) = mux.begin(&default, "sleep 10").expect("begin");
        mux.kill(&default).expect("kill");

        let (current, _) = mux.begin(&default, "build").expect("begin");
        assert_ne!(stale, current);

        mux.append(&stale, ShellOutput::stdout("old"));
        mux.finish(&stale, Some(0), None);

        let status = mux.status(&default).expect("status");
        assert_eq!(status.summary.state, SessionState::Running);
        assert_eq!(status.current_command.as_deref(), Some("build"));
        assert_eq!(status.output_len, 0);
        assert!(matches!(
            mux.begin(&default, "echo"),
            Err(Error::SessionBusy { .. })
        ));

        mux.append(&current, ShellOutput::stdout("new"));
        mux.finish(&current, Some(0), None);
        let output = mux.read(&default, None, None).expect("read");
        assert_eq!(output.entries.len(), 1);
        assert_eq!(output.entries[0].text, "new");
    }

    #[test]
    fn test_history_is_capped() {
        let mux = TerminalMux::new(100, 3);
        let default = SessionId::default_session();
        for i in 0..5 {
            let (ticket, _) = mux.begin(&default, &format!("echo {i}")).expect("begin");
            mux.finish(&ticket, Some(0), None);
        }
        let status = mux.status(&default).expect("status");
        assert_eq!(status.history.len(), 3);
        assert_eq!(status.history[0].command, "echo 2");
    }

    #[test]
    fn test_output_after_kill_is_dropped() {
        let mux = TerminalMux::new(100, 100);
        let default = SessionId::default_session();
        let (ticket, _) = mux.begin(&default, "tail -f log").expect("begin");
        mux.kill(&default).expect("kill");
        mux.append(&ticket, ShellOutput::stdout("late"));
        mux.finish(&ticket, Some(0), None);
        assert!(mux.is_empty());
    }
}
