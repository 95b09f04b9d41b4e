//! Connection health and per-capability counters.
//!
//! One [`HealthMetrics`] lives on each bridge. The transport records
//! connects, pings, and pongs; the dispatcher records every handled command
//! under its [`CapabilityFamily`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::util::now_ms;

// ============================================================================
// CapabilityFamily
// ============================================================================

/// Groups of command kinds that share a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityFamily {
    /// `execute`.
    CodeExecution,
    /// `batch_execute`.
    BatchExecution,
    /// Terminal and session commands.
    Terminal,
    /// DOM queries and interactions.
    DomQuery,
    /// Snapshots and accessibility trees.
    Snapshot,
    /// Screenshots.
    Screenshot,
    /// Network, mutation, and performance logs.
    Telemetry,
    /// Storage access and change log.
    Storage,
    /// File reads and writes.
    FileTransfer,
    /// Diagnostics report.
    Diagnostics,
}

impl CapabilityFamily {
    /// Wire name of the family.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeExecution => "codeExecution",
            Self::BatchExecution => "batchExecution",
            Self::Terminal => "terminal",
            Self::DomQuery => "domQuery",
            Self::Snapshot => "snapshot",
            Self::Screenshot => "screenshot",
            Self::Telemetry => "telemetry",
            Self::Storage => "storage",
            Self::FileTransfer => "fileTransfer",
            Self::Diagnostics => "diagnostics",
        }
    }
}

impl fmt::Display for CapabilityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Counter block for one family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyStats {
    /// Commands handled.
    pub count: u64,
    /// Total handler time in ms.
    pub total_time: f64,
    /// Mean handler time in ms.
    pub average_time: f64,
    /// Commands that failed.
    pub errors: u64,
}

/// Connection block of the health report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHealth {
    /// Last successful connect, in ms.
    pub connected_at: Option<u64>,
    /// Reconnects scheduled since start.
    pub reconnects: u64,
    /// Last ping sent, in ms.
    pub last_ping: Option<u64>,
    /// Last pong received, in ms.
    pub last_pong: Option<u64>,
    /// `last_pong - last_ping` as of the last pong.
    pub latency: Option<u64>,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Connection block.
    pub connection: ConnectionHealth,
    /// Inbound messages seen.
    pub messages: u64,
    /// Errors seen (decode and handler).
    pub errors: u64,
    /// Per-family counters.
    pub families: FxHashMap<CapabilityFamily, FamilyStats>,
    /// Milliseconds since the bridge was created.
    pub uptime: u64,
}

// ============================================================================
// HealthMetrics
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    connection: ConnectionHealth,
    messages: u64,
    errors: u64,
    families: FxHashMap<CapabilityFamily, FamilyStats>,
}

/// Process-wide counters for one bridge.
#[derive(Debug)]
pub struct HealthMetrics {
    started_at: u64,
    counters: Mutex<Counters>,
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: now_ms(),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Records a successful connect.
    pub fn record_connect(&self, at: u64) {
        self.counters.lock().connection.connected_at = Some(at);
    }

    /// Records a scheduled reconnect.
    pub fn record_reconnect(&self) {
        self.counters.lock().connection.reconnects += 1;
    }

    /// Records a sent ping. Overwrites any pending ping.
    pub fn record_ping(&self, at: u64) {
        self.counters.lock().connection.last_ping = Some(at);
    }

    /// Records a received pong and derives latency from the last ping.
    pub fn record_pong(&self, at: u64) {
        let mut counters = self.counters.lock();
        let connection = &mut counters.connection;
        connection.last_pong = Some(at);
        if let Some(ping) = connection.last_ping {
            connection.latency = Some(at.saturating_sub(ping));
        }
    }

    /// Counts one inbound message.
    pub fn record_message(&self) {
        self.counters.lock().messages += 1;
    }

    /// Counts one error not tied to a family (decode failures).
    pub fn record_error(&self) {
        self.counters.lock().errors += 1;
    }

    /// Records one handled command.
    pub fn record_command(&self, family: CapabilityFamily, duration_ms: f64, failed: bool) {
        let mut counters = self.counters.lock();
        if failed {
            counters.errors += 1;
        }
        let stats = counters.families.entry(family).or_default();
        stats.count += 1;
        stats.total_time += duration_ms;
        stats.average_time = stats.total_time / stats.count as f64;
        if failed {
            stats.errors += 1;
        }
    }

    /// Returns the derived latency, if a pong has arrived after a ping.
    #[must_use]
    pub fn latency(&self) -> Option<u64> {
        self.counters.lock().connection.latency
    }

    /// Copies every counter.
    #[must_use]
    pub fn report(&self) -> HealthReport {
        let counters = self.counters.lock();
        HealthReport {
            connection: counters.connection.clone(),
            messages: counters.messages,
            errors: counters.errors,
            families: counters.families.clone(),
            uptime: now_ms().saturating_sub(self.started_at),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_is_pong_minus_ping() {
        let health = HealthMetrics::new();
        health.record_ping(1000);
        health.record_pong(1050);
        assert_eq!(health.latency(), Some(50));
    }

    #[test]
    fn test_unanswered_ping_is_overwritten() {
        let health = HealthMetrics::new();
        health.record_ping(1000);
        health.record_ping(6000);
        health.record_pong(6020);
        assert_eq!(health.latency(), Some(20));
    }

    #[test]
    fn test_pong_without_ping_has_no_latency() {
        let health = HealthMetrics::new();
        health.record_pong(10);
        assert_eq!(health.latency(), None);
    }

    #[test]
    fn test_family_counters() {
        let health = HealthMetrics::new();
        health.record_command(CapabilityFamily::Terminal, 10.0, false);
        health.record_command(CapabilityFamily::Terminal, 30.0, true);
        health.record_error();

        let report = health.report();
        let stats = report.families[&CapabilityFamily::Terminal];
        assert_eq!(stats.count, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_time, 40.0);
        assert_eq!(stats.average_time, 20.0);
        assert_eq!(report.errors, 2);
    }

    #[test]
    fn test_report_serializes_family_keys() {
        let health = HealthMetrics::new();
        health.record_command(CapabilityFamily::FileTransfer, 1.0, false);
        let json = serde_json::to_value(health.report()).expect("serialize");
        assert_eq!(json["families"]["fileTransfer"]["count"], 1);
    }
}
