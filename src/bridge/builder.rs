//! Builder pattern for bridge configuration.
//!
//! Provides a fluent API for wiring host capabilities into a [`Bridge`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use page_bridge::Bridge;
//!
//! let bridge = Bridge::builder()
//!     .controller_url("ws://127.0.0.1:9222/bridge")
//!     .page("preview-1")
//!     .script_host(Arc::new(script))
//!     .document_host(Arc::new(document))
//!     .shell_host(Arc::new(shell))
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::host::{
    DocumentHost, FileHost, Rasterizer, ScriptHost, ShellHost, StorageHost, TelemetryHost,
    Unavailable,
};
use crate::transport::connection::controller_url;

use super::core::{Bridge, Hosts};

// ============================================================================
// BridgeBuilder
// ============================================================================

/// Builder for configuring a [`Bridge`] instance.
///
/// Use [`Bridge::builder()`] to create a new builder. Script and document
/// hosts are required; every other capability reports itself unsupported
/// when not provided.
#[derive(Default, Clone)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    script: Option<Arc<dyn ScriptHost>>,
    document: Option<Arc<dyn DocumentHost>>,
    shell: Option<Arc<dyn ShellHost>>,
    storage: Option<Arc<dyn StorageHost>>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    telemetry: Option<Arc<dyn TelemetryHost>>,
    files: Option<Arc<dyn FileHost>>,
}

impl fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("config", &self.config)
            .field("script", &self.script.is_some())
            .field("document", &self.document.is_some())
            .field("shell", &self.shell.is_some())
            .field("storage", &self.storage.is_some())
            .field("rasterizer", &self.rasterizer.is_some())
            .field("telemetry", &self.telemetry.is_some())
            .field("files", &self.files.is_some())
            .finish()
    }
}

// ============================================================================
// BridgeBuilder - Configuration
// ============================================================================

impl BridgeBuilder {
    /// Creates a new builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the controller endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn controller_url(mut self, url: impl Into<String>) -> Self {
        self.config.controller_url = url.into();
        self
    }

    /// Sets the page label announced to the controller.
    #[inline]
    #[must_use]
    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.config.page = page.into();
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Sets the delay before reconnecting.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Sets the default deadline for code execution and terminal commands.
    #[inline]
    #[must_use]
    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        self.config.execution_timeout = timeout;
        self
    }

    /// Sets the delay between targeting an element and acting on it.
    #[inline]
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }
}

// ============================================================================
// BridgeBuilder - Hosts
// ============================================================================

impl BridgeBuilder {
    /// Sets the code evaluation host. Required.
    #[must_use]
    pub fn script_host<H: ScriptHost + 'static>(mut self, host: Arc<H>) -> Self {
        self.script = Some(host);
        self
    }

    /// Sets the document host. Required.
    #[must_use]
    pub fn document_host<H: DocumentHost + 'static>(mut self, host: Arc<H>) -> Self {
        self.document = Some(host);
        self
    }

    /// Sets the shell host.
    #[must_use]
    pub fn shell_host<H: ShellHost + 'static>(mut self, host: Arc<H>) -> Self {
        self.shell = Some(host);
        self
    }

    /// Sets the storage host.
    #[must_use]
    pub fn storage_host<H: StorageHost + 'static>(mut self, host: Arc<H>) -> Self {
        self.storage = Some(host);
        self
    }

    /// Sets the rasterizer used for screenshots.
    #[must_use]
    pub fn rasterizer<H: Rasterizer + 'static>(mut self, host: Arc<H>) -> Self {
        self.rasterizer = Some(host);
        self
    }

    /// Sets the telemetry subscription host.
    #[must_use]
    pub fn telemetry_host<H: TelemetryHost + 'static>(mut self, host: Arc<H>) -> Self {
        self.telemetry = Some(host);
        self
    }

    /// Sets the file transfer host.
    #[must_use]
    pub fn file_host<H: FileHost + 'static>(mut self, host: Arc<H>) -> Self {
        self.files = Some(host);
        self
    }
}

// ============================================================================
// BridgeBuilder - Build
// ============================================================================

impl BridgeBuilder {
    /// Builds the bridge. Does not connect; call [`Bridge::connect`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - Controller URL is not set or not a WebSocket URL
    /// - Script or document host is not set
    /// - A capacity, interval, or timeout is zero
    pub fn build(self) -> Result<Bridge> {
        let mut config = self.config;
        Self::validate_url(&config)?;
        Self::validate_timing(&config)?;
        Self::validate_capacities(&config)?;

        if config.page.trim().is_empty() {
            config.page = format!("page-{}", &Uuid::new_v4().simple().to_string()[..8]);
        }

        let script = self.script.ok_or_else(|| {
            Error::config(
                "Script host is required. Use .script_host() to set it.\n\
                 Example: Bridge::builder().script_host(Arc::new(host))",
            )
        })?;
        let document = self.document.ok_or_else(|| {
            Error::config(
                "Document host is required. Use .document_host() to set it.\n\
                 Example: Bridge::builder().document_host(Arc::new(host))",
            )
        })?;

        let unavailable = Arc::new(Unavailable);
        let hosts = Hosts {
            script,
            document,
            shell: self.shell.unwrap_or_else(|| unavailable.clone()),
            storage: self.storage.unwrap_or_else(|| unavailable.clone()),
            rasterizer: self.rasterizer.unwrap_or_else(|| unavailable.clone()),
            telemetry: self.telemetry.unwrap_or_else(|| unavailable.clone()),
            files: self.files.unwrap_or(unavailable),
        };

        Bridge::new(config, hosts)
    }

    /// Validates the controller URL.
    fn validate_url(config: &BridgeConfig) -> Result<()> {
        if config.controller_url.trim().is_empty() {
            return Err(Error::config(
                "Controller URL is required. Use .controller_url() to set it.\n\
                 Example: Bridge::builder().controller_url(\"ws://127.0.0.1:9222/bridge\")",
            ));
        }
        controller_url(&config.controller_url, &config.page).map(|_| ())
    }

    /// Validates intervals and timeouts.
    fn validate_timing(config: &BridgeConfig) -> Result<()> {
        let checks = [
            ("heartbeat_interval", config.heartbeat_interval),
            ("execution_timeout", config.execution_timeout),
            ("storage_poll_interval", config.storage_poll_interval),
        ];
        if let Some((name, _)) = checks.iter().find(|(_, d)| d.is_zero()) {
            return Err(Error::config(format!(
                "{name} must be greater than zero.\n\
                 Omit it to use the default."
            )));
        }
        Ok(())
    }

    /// Validates buffer capacities.
    fn validate_capacities(config: &BridgeConfig) -> Result<()> {
        let caps = &config.capacities;
        let checks = [
            ("queue", config.queue_capacity),
            ("snapshots", caps.snapshots),
            ("screenshots", caps.screenshots),
            ("terminal_output", caps.terminal_output),
            ("terminal_history", caps.terminal_history),
        ];
        if let Some((name, _)) = checks.iter().find(|(_, n)| *n == 0) {
            return Err(Error::config(format!(
                "{name} capacity must be at least 1."
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{FakeDocument, FakeScript};

    fn minimal() -> BridgeBuilder {
        Bridge::builder()
            .controller_url("ws://127.0.0.1:9/bridge")
            .script_host(Arc::new(FakeScript::new()))
            .document_host(Arc::new(FakeDocument::new()))
    }

    #[test]
    fn test_builder_requires_url() {
        let err = Bridge::builder()
            .script_host(Arc::new(FakeScript::new()))
            .document_host(Arc::new(FakeDocument::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("controller_url"));
    }

    #[test]
    fn test_builder_requires_script_host() {
        let err = Bridge::builder()
            .controller_url("ws://127.0.0.1:9/bridge")
            .document_host(Arc::new(FakeDocument::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Script host"));
    }

    #[test]
    fn test_builder_rejects_http_url() {
        let err = minimal()
            .controller_url("http://127.0.0.1:9/bridge")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let err = minimal()
            .execution_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("execution_timeout"));
    }

    #[test]
    fn test_builder_generates_page_label() {
        let bridge = minimal().build().expect("build");
        assert!(bridge.page().starts_with("page-"));
        assert!(!bridge.is_connected());

        let named = minimal().page("checkout").build().expect("build");
        assert_eq!(named.page(), "checkout");
    }

    #[test]
    fn test_builder_debug_shows_hosts() {
        let debug = format!("{:?}", minimal());
        assert!(debug.contains("script: true"));
        assert!(debug.contains("shell: false"));
    }
}
