//! Inbound message decoding and command routing.
//!
//! Every decodable command produces exactly one `result` envelope. Messages
//! that cannot be parsed, lack a type, or lack a correlation id are counted
//! as errors and dropped; unknown types are ignored.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::CorrelationId;
use crate::protocol::{Command, CommandKind, Envelope, ErrorPayload, Outbound, Timing};
use crate::util::now_ms;

use super::Bridge;

/// Handler output: result text, or nothing for acknowledgements.
pub(crate) type Reply = Option<String>;

// ============================================================================
// Bridge - Dispatch
// ============================================================================

impl Bridge {
    /// Handles one inbound text frame.
    ///
    /// Sends the result through the outbox; nothing is returned to the caller.
    pub async fn handle_text(&self, text: &str) {
        let health = &self.inner.health;

        let mut value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Dropping unparseable message");
                health.record_error();
                return;
            }
        };

        let Some(tag) = value.get("type").and_then(Value::as_str).map(str::to_owned) else {
            warn!("Dropping message without type");
            health.record_error();
            return;
        };

        let Some(kind) = CommandKind::from_tag(&tag) else {
            debug!(%tag, "Ignoring unknown message type");
            return;
        };

        let Some(id) = correlation_id(&mut value) else {
            warn!(%tag, "Dropping command without id");
            health.record_error();
            return;
        };

        health.record_message();
        trace!(%id, ?kind, "Command received");

        let started = Instant::now();
        let outcome = match serde_json::from_value::<Envelope>(value) {
            Ok(envelope) => self.dispatch(envelope.command).await,
            Err(e) => Err(Error::invalid_argument(format!("{tag}: {e}"))),
        };

        self.respond(id, kind, started, outcome);
    }

    /// Routes a decoded command to its handler.
    pub(crate) async fn dispatch(&self, command: Command) -> Result<Reply> {
        match command {
            // Code execution
            Command::Execute { code, timeout } => self.execute(&code, timeout).await,
            Command::BatchExecute { commands, timeout } => {
                self.batch_execute(commands, timeout).await
            }

            // Terminal
            Command::TerminalExecute { command, timeout } => {
                self.terminal_execute(None, &command, timeout).await
            }
            Command::SessionExec {
                session_id,
                command,
                timeout,
            } => self.terminal_execute(Some(session_id), &command, timeout).await,
            Command::TerminalRead {
                session_id,
                since,
                limit,
            } => self.terminal_read(session_id, since, limit),
            Command::TerminalStatus { session_id } => self.terminal_status(session_id),
            Command::SessionCreate {
                session_id,
                name,
                cwd,
                env,
            } => self.session_create(session_id, name, cwd, env),
            Command::SessionList => self.session_list(),
            Command::SessionAttach { session_id } => self.session_attach(&session_id, true),
            Command::SessionDetach { session_id } => self.session_attach(&session_id, false),
            Command::SessionKill { session_id } => self.session_kill(&session_id),

            // DOM
            Command::DomQuery { selector, limit } => self.dom_query(&selector, limit),
            Command::DomClick { selector } => self.dom_click(&selector).await,
            Command::DomType {
                selector,
                text,
                clear,
            } => self.dom_type(&selector, &text, clear).await,
            Command::DomScroll {
                selector,
                x,
                y,
                mode,
            } => self.dom_scroll(selector.as_deref(), x, y, mode),
            Command::DomPaste { selector, text } => self.dom_paste(&selector, &text).await,
            Command::DomKeypress {
                selector,
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => self.dom_keypress(selector.as_deref(), &key, [ctrl, shift, alt, meta]),
            Command::DomFocus { selector } => self.dom_focus(&selector).await,

            // Snapshot
            Command::SnapshotCapture {
                snapshot_id,
                selector,
                max_elements,
            } => self.snapshot_capture(snapshot_id, selector.as_deref(), max_elements),
            Command::SnapshotDiff {
                before_id,
                after_id,
            } => self.snapshot_diff(&before_id, &after_id),
            Command::SnapshotList => self.snapshot_list(),
            Command::SnapshotClear => self.snapshot_clear(),
            Command::AccessibilityTree {
                selector,
                max_elements,
            } => self.accessibility(selector.as_deref(), max_elements),

            // Telemetry
            Command::NetworkLog {
                method,
                url_pattern,
                status,
                errors_only,
                offset,
                limit,
            } => self.network_log(method, url_pattern.as_deref(), status, errors_only, offset, limit),
            Command::NetworkClear => self.network_clear(),
            Command::MutationStart => self.mutation_start(),
            Command::MutationStop => self.mutation_stop(),
            Command::MutationLog {
                mutation_type,
                offset,
                limit,
            } => self.mutation_log(mutation_type, offset, limit),
            Command::MutationClear => self.mutation_clear(),
            Command::PerformanceStart { categories } => self.performance_start(categories),
            Command::PerformanceStop => self.performance_stop(),
            Command::PerformanceMetrics {
                category,
                offset,
                limit,
            } => self.performance_metrics(category, offset, limit),
            Command::PerformanceClear => self.performance_clear(),
            Command::PerformanceSnapshot => self.performance_snapshot(),

            // Screenshot
            Command::ScreenshotCapture {
                screenshot_id,
                selector,
                full_page,
                format,
                quality,
                scale,
            } => self.screenshot_capture(
                screenshot_id,
                selector,
                full_page,
                format,
                quality,
                scale,
            ),
            Command::ScreenshotGet { screenshot_id } => self.screenshot_get(&screenshot_id),
            Command::ScreenshotList => self.screenshot_list(),
            Command::ScreenshotClear => self.screenshot_clear(),
            Command::ScreenshotCompare {
                first_id,
                second_id,
            } => self.screenshot_compare(&first_id, &second_id),

            // Storage
            Command::StorageUsage => self.storage_usage(),
            Command::StorageStart => self.storage_start(),
            Command::StorageStop => self.storage_stop(),
            Command::StorageLog {
                scope,
                key,
                offset,
                limit,
            } => self.storage_log(scope, key.as_deref(), offset, limit),
            Command::StorageClearLog => self.storage_clear_log(),
            Command::StorageGet { scope, key } => self.storage_get(scope, key.as_deref()),
            Command::StorageSet { scope, key, value } => self.storage_set(scope, &key, &value),
            Command::StorageRemove { scope, key } => self.storage_remove(scope, &key),
            Command::StorageClear { scope } => self.storage_clear(scope),

            // Files
            Command::FileRead { path } => self.file_read(&path).await,
            Command::FileWrite { path, content } => self.file_write(&path, &content).await,

            // Diagnostics
            Command::Diagnostics => self.diagnostics(),
        }
    }

    /// Records the outcome and sends the result envelope.
    fn respond(&self, id: CorrelationId, kind: CommandKind, started: Instant, outcome: Result<Reply>) {
        let duration = started.elapsed().as_secs_f64() * 1000.0;
        let timing = Timing {
            duration,
            timestamp: now_ms(),
        };

        self.inner
            .health
            .record_command(kind.family(), duration, outcome.is_err());

        let message = match outcome {
            Ok(result) => Outbound::success(id, result, timing),
            Err(e) => {
                debug!(%id, ?kind, error = %e, "Command failed");
                Outbound::failure(id, ErrorPayload::from_error(&e).to_text(), timing)
            }
        };

        self.inner.outbox.send(&message);
    }
}

/// Reads the correlation id, accepting numbers as well as strings.
fn correlation_id(value: &mut Value) -> Option<CorrelationId> {
    let id = match value.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    value["id"] = Value::String(id.clone());
    Some(CorrelationId::new(id))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::health::CapabilityFamily;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_unknown_type_is_ignored() {
        let mut h = Harness::new();
        h.bridge.handle_text(r#"{"type":"teleport","id":"1"}"#).await;
        assert!(h.try_next().is_none());
        assert_eq!(h.bridge.health().errors, 0);
    }

    #[tokio::test]
    async fn test_malformed_and_missing_id_count_errors() {
        let mut h = Harness::new();
        h.bridge.handle_text("{not json").await;
        h.bridge.handle_text(r#"{"type":"snapshot_list"}"#).await;
        h.bridge.handle_text(r#"{"id":"1"}"#).await;
        assert!(h.try_next().is_none());
        assert_eq!(h.bridge.health().errors, 3);
    }

    #[tokio::test]
    async fn test_bad_fields_reply_with_error() {
        let mut h = Harness::new();
        let reply = h.call(json!({"type": "dom_click", "id": "7"})).await;
        assert_eq!(reply["id"], "7");
        assert!(reply["result"].is_null());
        let error = Harness::error_of(&reply);
        assert_eq!(error["type"], "invalid_argument");
        let message = error["message"].as_str().unwrap_or_default();
        assert!(message.contains("dom_click: "));
        assert!(message.contains("selector"));
    }

    #[tokio::test]
    async fn test_bad_fields_with_numeric_id_name_the_command() {
        let mut h = Harness::new();
        let reply = h.call(json!({"type": "snapshot_diff", "id": 8, "beforeId": "a"})).await;
        assert_eq!(reply["id"], "8");
        let error = Harness::error_of(&reply);
        assert_eq!(error["type"], "invalid_argument");
        assert!(error["message"].as_str().unwrap_or_default().contains("snapshot_diff: "));
    }

    #[tokio::test]
    async fn test_numeric_id_is_echoed_as_text() {
        let mut h = Harness::new();
        let reply = h.call(json!({"type": "snapshot_list", "id": 42})).await;
        assert_eq!(reply["id"], "42");
        assert_eq!(Harness::result_of(&reply), json!([]));
    }

    #[tokio::test]
    async fn test_every_result_carries_timing_and_counts_family() {
        let mut h = Harness::new();
        let reply = h.call(json!({"type": "screenshot_list", "id": "a"})).await;
        assert!(reply["timing"]["duration"].as_f64().is_some());
        assert!(reply["timing"]["timestamp"].as_u64().is_some());

        let report = h.bridge.health();
        assert_eq!(report.messages, 1);
        assert_eq!(report.families[&CapabilityFamily::Screenshot].count, 1);
    }
}
