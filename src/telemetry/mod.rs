//! Bounded telemetry logs.
//!
//! Four independent [`RingLog`] instances share one eviction policy:
//!
//! | Log | Capacity | Fed by |
//! |-----|----------|--------|
//! | network | 100 | [`TelemetrySink::request_started`] |
//! | mutation | 200 | [`TelemetrySink::mutation`] while recording |
//! | performance | 500 | [`TelemetrySink::performance`] while recording |
//! | storage | 200 | the bridge's storage poller |
//!
//! The host pushes events through a [`TelemetrySink`] handed out by
//! [`Bridge::telemetry`](crate::Bridge::telemetry).

// ============================================================================
// Submodules
// ============================================================================

/// DOM-mutation records.
pub mod mutation;

/// Network request records.
pub mod network;

/// Performance records and summary.
pub mod performance;

/// Fixed-capacity event log.
pub mod ring;

/// Storage-change records and watcher.
pub mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use mutation::{MutationKind, MutationRecord};
pub use network::{
    NetworkFilter, NetworkRecord, NetworkRequest, NetworkResponse, PendingRequest, RequestApi,
};
pub use performance::{NavigationTiming, PerformanceCategory, PerformanceRecord, PerformanceSummary};
pub use ring::{LogEntry, LogPage, RingLog};
pub use storage::{ChangeKind, StorageChange, StorageWatcher};

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::trace;

use crate::config::{Capacities, Limits};
use crate::protocol::{ConsoleLevel, Outbound};
use crate::transport::Outbox;

// ============================================================================
// TelemetryLogs
// ============================================================================

/// The four logs plus recording switches.
#[derive(Debug)]
pub struct TelemetryLogs {
    /// Network requests.
    pub network: Mutex<RingLog<NetworkRecord>>,
    /// Document changes.
    pub mutation: Mutex<RingLog<MutationRecord>>,
    /// Performance measurements.
    pub performance: Mutex<RingLog<PerformanceRecord>>,
    /// Storage changes.
    pub storage: Mutex<RingLog<StorageChange>>,
    mutation_active: AtomicBool,
    performance_active: Mutex<FxHashSet<PerformanceCategory>>,
}

impl TelemetryLogs {
    /// Creates empty logs sized by `capacities`.
    #[must_use]
    pub fn new(capacities: &Capacities) -> Self {
        Self {
            network: Mutex::new(RingLog::new(capacities.network)),
            mutation: Mutex::new(RingLog::new(capacities.mutation)),
            performance: Mutex::new(RingLog::new(capacities.performance)),
            storage: Mutex::new(RingLog::new(capacities.storage)),
            mutation_active: AtomicBool::new(false),
            performance_active: Mutex::new(FxHashSet::default()),
        }
    }

    /// Appends a network record.
    pub fn record_network(&self, record: NetworkRecord) {
        self.network.lock().push(record);
    }

    /// Switches mutation recording. Returns the previous state.
    pub fn set_mutation_active(&self, active: bool) -> bool {
        self.mutation_active.swap(active, Ordering::SeqCst)
    }

    /// Returns `true` while mutations are recorded.
    #[must_use]
    pub fn mutation_active(&self) -> bool {
        self.mutation_active.load(Ordering::SeqCst)
    }

    /// Replaces the set of recorded performance categories.
    pub fn set_performance_active(&self, categories: impl IntoIterator<Item = PerformanceCategory>) {
        let mut active = self.performance_active.lock();
        active.clear();
        active.extend(categories);
    }

    /// Returns the recorded performance categories in subscription order.
    #[must_use]
    pub fn performance_active(&self) -> Vec<PerformanceCategory> {
        let active = self.performance_active.lock();
        PerformanceCategory::ALL
            .into_iter()
            .filter(|c| active.contains(c))
            .collect()
    }
}

// ============================================================================
// TelemetrySink
// ============================================================================

/// Entry point for host-side event feeds.
#[derive(Clone)]
pub struct TelemetrySink {
    logs: Arc<TelemetryLogs>,
    outbox: Outbox,
    page: Arc<str>,
    limits: Limits,
}

impl TelemetrySink {
    pub(crate) fn new(logs: Arc<TelemetryLogs>, outbox: Outbox, page: &str, limits: Limits) -> Self {
        Self {
            logs,
            outbox,
            page: Arc::from(page),
            limits,
        }
    }

    /// Starts timing a request. Settle the returned handle exactly once.
    pub fn request_started(&self, request: NetworkRequest) -> PendingRequest {
        PendingRequest::new(Arc::clone(&self.logs), request, self.limits.body_chars)
    }

    /// Records a document change if mutation recording is on.
    pub fn mutation(&self, record: MutationRecord) {
        if self.logs.mutation_active() {
            self.logs.mutation.lock().push(record);
        }
    }

    /// Records a measurement if its category is being recorded.
    pub fn performance(&self, record: PerformanceRecord) {
        if self.logs.performance_active.lock().contains(&record.category) {
            self.logs.performance.lock().push(record);
        }
    }

    /// Forwards one console call to the controller.
    pub fn console(&self, level: ConsoleLevel, args: Vec<Value>) {
        trace!(?level, count = args.len(), "Forwarding console output");
        self.outbox.send(&Outbound::Console {
            page: self.page.to_string(),
            level,
            args,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (TelemetrySink, Arc<TelemetryLogs>, Outbox) {
        let logs = Arc::new(TelemetryLogs::new(&Capacities::DEFAULT));
        let outbox = Outbox::new("page", 100);
        let sink = TelemetrySink::new(Arc::clone(&logs), outbox.clone(), "page", Limits::DEFAULT);
        (sink, logs, outbox)
    }

    #[test]
    fn test_mutations_only_while_active() {
        let (sink, logs, _) = sink();
        sink.mutation(MutationRecord::character_data("body", None, Some("a".into())));
        assert!(logs.mutation.lock().is_empty());

        logs.set_mutation_active(true);
        sink.mutation(MutationRecord::character_data("body", None, Some("b".into())));
        assert_eq!(logs.mutation.lock().len(), 1);
    }

    #[test]
    fn test_performance_filters_by_category() {
        let (sink, logs, _) = sink();
        logs.set_performance_active([PerformanceCategory::Paint]);
        sink.performance(PerformanceRecord::new(PerformanceCategory::Paint, "first-paint", 1.0, 0.0));
        sink.performance(PerformanceRecord::new(PerformanceCategory::Resource, "/x", 1.0, 2.0));
        assert_eq!(logs.performance.lock().len(), 1);
        assert_eq!(logs.performance_active(), vec![PerformanceCategory::Paint]);
    }

    #[test]
    fn test_console_is_queued_while_offline() {
        let (sink, _, outbox) = sink();
        sink.console(ConsoleLevel::Error, vec![Value::from("boom")]);
        assert_eq!(outbox.queue_len(), 1);
    }
}
