//! Self-report of the bridge's state.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Result;
use crate::health::HealthReport;
use crate::protocol::to_json_text;
use crate::telemetry::{PerformanceCategory, RingLog};

use super::Bridge;
use super::dispatch::Reply;

// ============================================================================
// Types
// ============================================================================

/// Fill level of one bounded log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogUsage {
    /// Entries retained.
    pub len: usize,
    /// Capacity.
    pub capacity: usize,
    /// Entries evicted so far.
    pub evicted: u64,
}

impl LogUsage {
    fn of<T>(log: &RingLog<T>) -> Self {
        Self {
            len: log.len(),
            capacity: log.capacity(),
            evicted: log.evicted(),
        }
    }
}

/// Fill levels of all logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogsUsage {
    /// Network log.
    pub network: LogUsage,
    /// Mutation log.
    pub mutation: LogUsage,
    /// Performance log.
    pub performance: LogUsage,
    /// Storage-change log.
    pub storage: LogUsage,
}

/// Which recorders are on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Mutation recording.
    pub mutations: bool,
    /// Performance categories recorded.
    pub performance: Vec<PerformanceCategory>,
    /// Storage polling.
    pub storage_polling: bool,
}

/// Full diagnostics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Page label.
    pub page: String,
    /// Document URL.
    pub url: String,
    /// Document title.
    pub title: String,
    /// `true` while the channel is open.
    pub connected: bool,
    /// Messages waiting for a connection.
    pub queued: usize,
    /// Messages dropped from the retry queue.
    pub dropped: u64,
    /// Counters.
    pub health: HealthReport,
    /// Log fill levels.
    pub logs: LogsUsage,
    /// Retained snapshots.
    pub snapshots: usize,
    /// Cached screenshots.
    pub screenshots: usize,
    /// Terminal sessions.
    pub sessions: usize,
    /// Recorder state.
    pub recording: Recording,
}

// ============================================================================
// Bridge - Diagnostics
// ============================================================================

impl Bridge {
    /// Collects the diagnostics report.
    #[must_use]
    pub fn diagnostics_report(&self) -> Diagnostics {
        let inner = &self.inner;
        let document = &inner.hosts.document;
        let logs = &inner.logs;

        Diagnostics {
            page: inner.config.page.clone(),
            url: document.url(),
            title: document.title(),
            connected: inner.outbox.is_open(),
            queued: inner.outbox.queue_len(),
            dropped: inner.outbox.queue_dropped(),
            health: inner.health.report(),
            logs: LogsUsage {
                network: LogUsage::of(&logs.network.lock()),
                mutation: LogUsage::of(&logs.mutation.lock()),
                performance: LogUsage::of(&logs.performance.lock()),
                storage: LogUsage::of(&logs.storage.lock()),
            },
            snapshots: inner.snapshots.lock().len(),
            screenshots: inner.screenshots.lock().len(),
            sessions: inner.terminals.len(),
            recording: Recording {
                mutations: logs.mutation_active(),
                performance: logs.performance_active(),
                storage_polling: inner
                    .storage_poller
                    .lock()
                    .as_ref()
                    .is_some_and(|handle| !handle.is_finished()),
            },
        }
    }

    pub(crate) fn diagnostics(&self) -> Result<Reply> {
        to_json_text(&self.diagnostics_report()).map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================
