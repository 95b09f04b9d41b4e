//! Network, mutation, and performance log handlers.

// ============================================================================
// Imports
// ============================================================================

use regex::RegexBuilder;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::host::TelemetryStream;
use crate::protocol::to_json_text;
use crate::telemetry::{MutationKind, NetworkFilter, PerformanceCategory, PerformanceSummary};

use super::Bridge;
use super::dispatch::Reply;

// ============================================================================
// Types
// ============================================================================

#[derive(Serialize)]
struct Cleared {
    cleared: usize,
}

#[derive(Serialize)]
struct Recording {
    recording: bool,
    #[serde(rename = "alreadyRecording")]
    already: bool,
}

#[derive(Serialize)]
struct PerformanceRecording {
    categories: Vec<PerformanceCategory>,
    unsupported: Vec<PerformanceCategory>,
}

// ============================================================================
// Bridge - Network
// ============================================================================

impl Bridge {
    pub(crate) fn network_log(
        &self,
        method: Option<String>,
        url_pattern: Option<&str>,
        status: Option<u16>,
        errors_only: bool,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Reply> {
        let url_pattern = url_pattern
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::invalid_argument(format!("urlPattern: {e}")))
            })
            .transpose()?;

        let filter = NetworkFilter {
            method,
            url_pattern,
            status,
            errors_only,
        };

        let page = self
            .inner
            .logs
            .network
            .lock()
            .query(|r| filter.matches(r), offset, limit);
        to_json_text(&page).map(Some)
    }

    pub(crate) fn network_clear(&self) -> Result<Reply> {
        let mut log = self.inner.logs.network.lock();
        let cleared = log.len();
        log.clear();
        to_json_text(&Cleared { cleared }).map(Some)
    }
}

// ============================================================================
// Bridge - Mutations
// ============================================================================

impl Bridge {
    pub(crate) fn mutation_start(&self) -> Result<Reply> {
        let logs = &self.inner.logs;
        if logs.mutation_active() {
            return to_json_text(&Recording {
                recording: true,
                already: true,
            })
            .map(Some);
        }

        self.inner.hosts.telemetry.subscribe(TelemetryStream::Mutations)?;
        logs.set_mutation_active(true);
        debug!("Mutation recording started");

        to_json_text(&Recording {
            recording: true,
            already: false,
        })
        .map(Some)
    }

    pub(crate) fn mutation_stop(&self) -> Result<Reply> {
        if self.inner.logs.set_mutation_active(false) {
            self.inner.hosts.telemetry.unsubscribe(TelemetryStream::Mutations);
            debug!("Mutation recording stopped");
        }
        Ok(None)
    }

    pub(crate) fn mutation_log(
        &self,
        kind: Option<MutationKind>,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Reply> {
        let page = self
            .inner
            .logs
            .mutation
            .lock()
            .query(|r| kind.is_none_or(|k| r.kind == k), offset, limit);
        to_json_text(&page).map(Some)
    }

    pub(crate) fn mutation_clear(&self) -> Result<Reply> {
        let mut log = self.inner.logs.mutation.lock();
        let cleared = log.len();
        log.clear();
        to_json_text(&Cleared { cleared }).map(Some)
    }
}

// ============================================================================
// Bridge - Performance
// ============================================================================

impl Bridge {
    /// Subscribes to each requested category; unsupported ones are skipped.
    pub(crate) fn performance_start(&self, categories: Option<Vec<PerformanceCategory>>) -> Result<Reply> {
        let requested = categories.unwrap_or_else(|| PerformanceCategory::ALL.to_vec());
        let already = self.inner.logs.performance_active();
        let telemetry = &self.inner.hosts.telemetry;

        let mut active = already.clone();
        let mut unsupported = Vec::new();
        for category in requested {
            if active.contains(&category) {
                continue;
            }
            match telemetry.subscribe(TelemetryStream::Performance(category)) {
                Ok(()) => active.push(category),
                Err(e) => {
                    warn!(%category, error = %e, "Performance category unavailable");
                    unsupported.push(category);
                }
            }
        }

        self.inner.logs.set_performance_active(active);
        to_json_text(&PerformanceRecording {
            categories: self.inner.logs.performance_active(),
            unsupported,
        })
        .map(Some)
    }

    pub(crate) fn performance_stop(&self) -> Result<Reply> {
        let active = self.inner.logs.performance_active();
        for category in &active {
            self.inner
                .hosts
                .telemetry
                .unsubscribe(TelemetryStream::Performance(*category));
        }
        self.inner.logs.set_performance_active([]);
        debug!(stopped = active.len(), "Performance recording stopped");
        Ok(None)
    }

    pub(crate) fn performance_metrics(
        &self,
        category: Option<PerformanceCategory>,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Reply> {
        let page = self
            .inner
            .logs
            .performance
            .lock()
            .query(|r| category.is_none_or(|c| r.category == c), offset, limit);
        to_json_text(&page).map(Some)
    }

    pub(crate) fn performance_clear(&self) -> Result<Reply> {
        let mut log = self.inner.logs.performance.lock();
        let cleared = log.len();
        log.clear();
        to_json_text(&Cleared { cleared }).map(Some)
    }

    pub(crate) fn performance_snapshot(&self) -> Result<Reply> {
        let summary = PerformanceSummary::from_log(&self.inner.logs.performance.lock());
        to_json_text(&summary).map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================
