//! One terminal session.

// ============================================================================
// Imports
// ============================================================================

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::host::{OutputStream, ShellRequest};
use crate::identifiers::SessionId;
use crate::util::now_ms;

/// Commands kept in a session's history.
pub const DEFAULT_HISTORY_CAP: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Accepts `execute`.
    Idle,
    /// A command is in flight.
    Running,
}

/// One executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Command line.
    pub command: String,
    /// Start time in ms.
    pub timestamp: u64,
}

/// One captured output chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEntry {
    /// Source stream.
    #[serde(rename = "type")]
    pub stream: OutputStream,
    /// Text as emitted.
    pub text: String,
    /// Capture time in ms.
    pub timestamp: u64,
}

/// Compact session view for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// Display name.
    pub name: String,
    /// Creation time in ms.
    pub created: u64,
    /// Last activity in ms.
    pub last_activity: u64,
    /// Visibility flag.
    pub attached: bool,
    /// Lifecycle state.
    pub state: SessionState,
    /// Commands retained in history.
    pub history_len: usize,
}

/// Full session status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Summary fields.
    #[serde(flatten)]
    pub summary: SessionSummary,
    /// Command in flight.
    pub current_command: Option<String>,
    /// Last exit status.
    pub exit_code: Option<i32>,
    /// Working directory.
    pub cwd: Option<String>,
    /// Session environment.
    pub env: BTreeMap<String, String>,
    /// Retained output chunks.
    pub output_len: usize,
    /// Recent commands, oldest first.
    pub history: Vec<HistoryEntry>,
}

// ============================================================================
// TerminalSession
// ============================================================================

/// An independently addressable execution context.
#[derive(Debug, Clone)]
pub struct TerminalSession {
    id: SessionId,
    name: String,
    created: u64,
    last_activity: u64,
    attached: bool,
    state: SessionState,
    current_command: Option<String>,
    history: VecDeque<HistoryEntry>,
    history_cap: usize,
    output: VecDeque<OutputEntry>,
    output_cap: usize,
    exit_code: Option<i32>,
    cwd: Option<String>,
    env: BTreeMap<String, String>,
    first_run: Option<u64>,
    run: u64,
}

impl TerminalSession {
    /// Creates an idle session keeping up to `output_cap` chunks and
    /// [`DEFAULT_HISTORY_CAP`] commands.
    #[must_use]
    pub fn new(id: SessionId, name: Option<String>, output_cap: usize) -> Self {
        let now = now_ms();
        Self {
            name: name.unwrap_or_else(|| id.to_string()),
            id,
            created: now,
            last_activity: now,
            attached: false,
            state: SessionState::Idle,
            current_command: None,
            history: VecDeque::new(),
            history_cap: DEFAULT_HISTORY_CAP,
            output: VecDeque::new(),
            output_cap,
            exit_code: None,
            cwd: None,
            env: BTreeMap::new(),
            first_run: None,
            run: 0,
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: Option<String>) -> Self {
        self.cwd = cwd;
        self
    }

    /// Sets how many commands the history keeps.
    #[must_use]
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Sets the session environment.
    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Session id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Command in flight.
    #[inline]
    #[must_use]
    pub fn current_command(&self) -> Option<&str> {
        self.current_command.as_deref()
    }

    /// Sets the visibility flag.
    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
        self.touch();
    }

    /// Moves idle to running under `run` and returns the shell request.
    ///
    /// Run numbers must increase across every session of a multiplexer, so
    /// a run issued before this session existed never matches it.
    /// Returns `None` if a command is already running.
    pub(super) fn begin(&mut self, run: u64, command: &str) -> Option<ShellRequest> {
        if self.state == SessionState::Running {
            return None;
        }

        self.first_run.get_or_insert(run);
        self.run = run;
        self.state = SessionState::Running;
        self.current_command = Some(command.to_string());
        self.history.push_back(HistoryEntry {
            command: command.to_string(),
            timestamp: now_ms(),
        });
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
        self.touch();

        Some(ShellRequest {
            command: command.to_string(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
        })
    }

    /// Returns `true` if `run` was started by this session.
    #[inline]
    #[must_use]
    pub fn owns(&self, run: u64) -> bool {
        self.first_run.is_some_and(|first| run >= first)
    }

    /// Returns to idle with a final status, if `run` is the current run.
    pub(super) fn finish(&mut self, run: u64, exit_code: Option<i32>, cwd: Option<String>) {
        if run != self.run {
            return;
        }
        self.state = SessionState::Idle;
        self.current_command = None;
        if exit_code.is_some() {
            self.exit_code = exit_code;
        }
        if cwd.is_some() {
            self.cwd = cwd;
        }
        self.touch();
    }

    /// Appends output, trimming the oldest beyond the cap.
    pub fn append_output(&mut self, stream: OutputStream, text: String) {
        self.output.push_back(OutputEntry {
            stream,
            text,
            timestamp: now_ms(),
        });
        while self.output.len() > self.output_cap {
            self.output.pop_front();
        }
        self.touch();
    }

    /// Output captured at or after `since`, keeping the last `limit` entries.
    #[must_use]
    pub fn read(&self, since: Option<u64>, limit: Option<usize>) -> Vec<OutputEntry> {
        let matching: Vec<&OutputEntry> = self
            .output
            .iter()
            .filter(|e| since.is_none_or(|t| e.timestamp >= t))
            .collect();
        let skip = limit.map_or(0, |n| matching.len().saturating_sub(n));
        matching.into_iter().skip(skip).cloned().collect()
    }

    /// Compact view.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created: self.created,
            last_activity: self.last_activity,
            attached: self.attached,
            state: self.state,
            history_len: self.history.len(),
        }
    }

    /// Full view.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            summary: self.summary(),
            current_command: self.current_command.clone(),
            exit_code: self.exit_code,
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            output_len: self.output.len(),
            history: self.history.iter().cloned().collect(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = now_ms();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_running_command() {
        let mut session = TerminalSession::new(SessionId::new("s"), None, 10);
        let request = session.begin(1, "ls").expect("idle");
        assert_eq!(request.command, "ls");
        assert!(session.begin(2, "pwd").is_none());
        assert_eq!(session.current_command(), Some("ls"));

        session.finish(1, Some(0), Some("/tmp".into()));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.status().cwd.as_deref(), Some("/tmp"));
        assert!(session.begin(3, "pwd").is_some());
    }

    #[test]
    fn test_stale_finish_is_ignored() {
        let mut session = TerminalSession::new(SessionId::new("s"), None, 10);
        session.begin(1, "sleep 100").expect("idle");
        session.finish(1, None, None);
        session.begin(2, "echo").expect("idle");

        session.finish(1, Some(1), None);
        assert_eq!(session.state(), SessionState::Running);
        assert!(session.owns(1));
    }

    #[test]
    fn test_runs_before_first_command_are_not_owned() {
        let mut session = TerminalSession::new(SessionId::new("s"), None, 10);
        assert!(!session.owns(4));

        session.begin(7, "make").expect("idle");
        assert!(!session.owns(4));
        assert!(session.owns(7));
        assert!(session.owns(9));
    }

    #[test]
    fn test_history_cap_trims_oldest() {
        let mut session =
            TerminalSession::new(SessionId::new("s"), None, 10).with_history_cap(2);
        for (run, command) in (1..).zip(["a", "b", "c"]) {
            session.begin(run, command).expect("idle");
            session.finish(run, Some(0), None);
        }

        let status = session.status();
        assert_eq!(status.summary.history_len, 2);
        let commands: Vec<&str> = status.history.iter().map(|h| h.command.as_str()).collect();
        assert_eq!(commands, vec!["b", "c"]);
    }

    #[test]
    fn test_output_cap_trims_oldest() {
        let mut session = TerminalSession::new(SessionId::new("s"), None, 3);
        for i in 0..5 {
            session.append_output(OutputStream::Stdout, i.to_string());
        }
        let texts: Vec<String> = session.read(None, None).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["2", "3", "4"]);
        let tail: Vec<String> = session.read(None, Some(1)).into_iter().map(|e| e.text).collect();
        assert_eq!(tail, vec!["4"]);
    }

    #[test]
    fn test_request_carries_env_and_cwd() {
        let mut session = TerminalSession::new(SessionId::new("s"), Some("build".into()), 10)
            .with_cwd(Some("/src".into()))
            .with_env(BTreeMap::from([("CI".into(), "1".into())]));
        let request = session.begin(1, "make").expect("idle");
        assert_eq!(request.cwd.as_deref(), Some("/src"));
        assert_eq!(request.env.get("CI").map(String::as_str), Some("1"));
        assert_eq!(session.summary().name, "build");
    }
}
