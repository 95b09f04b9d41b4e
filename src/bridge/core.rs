//! Core Bridge struct and accessors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::health::{HealthMetrics, HealthReport};
use crate::host::{
    DocumentHost, FileHost, Rasterizer, ScriptHost, ShellHost, StorageHost, TelemetryHost,
};
use crate::identifiers::ElementId;
use crate::screenshot::ScreenshotCache;
use crate::snapshot::SnapshotStore;
use crate::telemetry::{StorageWatcher, TelemetryLogs, TelemetrySink};
use crate::terminal::TerminalMux;
use crate::transport::{ConnectionManager, Outbox};

use super::BridgeBuilder;

// ============================================================================
// Types
// ============================================================================

/// Host capabilities wired into a bridge.
#[derive(Clone)]
pub(crate) struct Hosts {
    pub script: Arc<dyn ScriptHost>,
    pub document: Arc<dyn DocumentHost>,
    pub shell: Arc<dyn ShellHost>,
    pub storage: Arc<dyn StorageHost>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub telemetry: Arc<dyn TelemetryHost>,
    pub files: Arc<dyn FileHost>,
}

/// Internal shared state for a bridge.
pub(crate) struct BridgeInner {
    /// Effective configuration.
    pub config: BridgeConfig,
    /// Host capabilities.
    pub hosts: Hosts,
    /// Outbound send path.
    pub outbox: Outbox,
    /// Socket supervisor.
    pub connection: ConnectionManager,
    /// Counters.
    pub health: Arc<HealthMetrics>,
    /// Telemetry logs.
    pub logs: Arc<TelemetryLogs>,
    /// Retained snapshots.
    pub snapshots: Mutex<SnapshotStore>,
    /// Cached renders.
    pub screenshots: Mutex<ScreenshotCache>,
    /// Terminal sessions.
    pub terminals: Arc<TerminalMux>,
    /// Storage diff state.
    pub storage_watcher: Arc<Mutex<StorageWatcher>>,
    /// Storage poll task while polling.
    pub storage_poller: Mutex<Option<JoinHandle<()>>>,
}

// ============================================================================
// Bridge
// ============================================================================

/// A remote-control bridge for one page.
///
/// Cloning is cheap; all clones share the same logs, caches, sessions, and
/// connection.
///
/// # Example
///
/// ```ignore
/// let bridge = Bridge::builder()
///     .controller_url("ws://127.0.0.1:9222/bridge")
///     .page("checkout")
///     .script_host(Arc::new(script))
///     .document_host(Arc::new(document))
///     .build()?;
///
/// bridge.connect();
/// ```
#[derive(Clone)]
pub struct Bridge {
    pub(crate) inner: Arc<BridgeInner>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("page", &self.inner.config.page)
            .field("url", &self.inner.connection.url().as_str())
            .field("connected", &self.inner.outbox.is_open())
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Wires a bridge from a validated configuration.
    pub(crate) fn new(config: BridgeConfig, hosts: Hosts) -> Result<Self> {
        let health = Arc::new(HealthMetrics::new());
        let outbox = Outbox::new(config.page.clone(), config.queue_capacity);
        let connection = ConnectionManager::new(&config, outbox.clone(), Arc::clone(&health))?;
        let capacities = config.capacities;

        Ok(Self {
            inner: Arc::new(BridgeInner {
                hosts,
                outbox,
                connection,
                health,
                logs: Arc::new(TelemetryLogs::new(&capacities)),
                snapshots: Mutex::new(SnapshotStore::new(capacities.snapshots)),
                screenshots: Mutex::new(ScreenshotCache::new(capacities.screenshots)),
                terminals: Arc::new(TerminalMux::new(
                    capacities.terminal_output,
                    capacities.terminal_history,
                )),
                storage_watcher: Arc::new(Mutex::new(StorageWatcher::new(
                    config.limits.storage_value_chars,
                ))),
                storage_poller: Mutex::new(None),
                config,
            }),
        })
    }
}

// ============================================================================
// Bridge - Lifecycle
// ============================================================================

impl Bridge {
    /// Connects to the controller and starts serving commands.
    ///
    /// No-op if already connecting or connected. Must be called within a
    /// tokio runtime.
    pub fn connect(&self) {
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<String>();
        if !self.inner.connection.connect(inbound_tx) {
            return;
        }

        info!(page = %self.inner.config.page, url = %self.inner.connection.url(), "Bridge connecting");

        let bridge = self.clone();
        tokio::spawn(async move {
            while let Some(text) = inbound_rx.recv().await {
                let handler = bridge.clone();
                tokio::spawn(async move { handler.handle_text(&text).await });
            }
            debug!("Inbound channel closed");
        });
    }

    /// Closes the connection and stops the storage poller.
    pub fn shutdown(&self) {
        self.inner.connection.shutdown();
        if let Some(handle) = self.inner.storage_poller.lock().take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Bridge - Accessors
// ============================================================================

impl Bridge {
    /// Returns the effective configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Returns the page label.
    #[inline]
    #[must_use]
    pub fn page(&self) -> &str {
        &self.inner.config.page
    }

    /// Returns `true` while the channel is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.outbox.is_open()
    }

    /// Returns a snapshot of the health counters.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        self.inner.health.report()
    }

    /// Returns the sink host event feeds push into.
    #[must_use]
    pub fn telemetry(&self) -> TelemetrySink {
        TelemetrySink::new(
            Arc::clone(&self.inner.logs),
            self.inner.outbox.clone(),
            &self.inner.config.page,
            self.inner.config.limits,
        )
    }
}

// ============================================================================
// Bridge - Internal
// ============================================================================

impl Bridge {
    /// Resolves a selector to its first match.
    pub(crate) fn resolve(&self, selector: &str) -> Result<ElementId> {
        self.inner
            .hosts
            .document
            .query(selector, None)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found(selector))
    }

    /// Resolves an optional selector, defaulting to the document root.
    pub(crate) fn resolve_or_root(&self, selector: Option<&str>) -> Result<ElementId> {
        match selector {
            Some(selector) => self.resolve(selector),
            None => self.inner.hosts.document.root(),
        }
    }

    /// Caller deadline in ms, or the configured default.
    pub(crate) fn deadline(&self, timeout_ms: Option<u64>) -> Duration {
        timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.inner.config.execution_timeout)
    }

    /// Waits the DOM settle delay.
    pub(crate) async fn settle(&self) {
        tokio::time::sleep(self.inner.config.settle_delay).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
