//! Bridge configuration.
//!
//! Provides a type-safe set of tunables for the bridge: where the controller
//! lives, how this page identifies itself, and the bounds of every buffer.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use page_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_controller_url("ws://127.0.0.1:9222/bridge")
//!     .with_page("preview-1")
//!     .with_heartbeat_interval(Duration::from_secs(10));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::terminal::session::DEFAULT_HISTORY_CAP;

// ============================================================================
// Constants
// ============================================================================

/// Interval between heartbeat pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Constant delay before a reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Outbound retry queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default deadline for code and batch execution.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before acting on an element (click, type, focus, paste).
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Interval between storage polls.
pub const DEFAULT_STORAGE_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Capacities
// ============================================================================

/// Capacities of the bounded logs and caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    /// Network log entries.
    pub network: usize,
    /// DOM-mutation log entries.
    pub mutation: usize,
    /// Performance log entries.
    pub performance: usize,
    /// Storage-change log entries.
    pub storage: usize,
    /// Retained snapshots.
    pub snapshots: usize,
    /// Cached screenshots.
    pub screenshots: usize,
    /// Output lines kept per terminal session.
    pub terminal_output: usize,
    /// Commands kept in each terminal session's history.
    pub terminal_history: usize,
}

impl Capacities {
    /// Default capacities.
    pub const DEFAULT: Self = Self {
        network: 100,
        mutation: 200,
        performance: 500,
        storage: 200,
        snapshots: 10,
        screenshots: 10,
        terminal_output: 1000,
        terminal_history: DEFAULT_HISTORY_CAP,
    };
}

impl Default for Capacities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// Truncation Limits
// ============================================================================

/// Character limits applied before text is stored or returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Request/response bodies in the network log.
    pub body_chars: usize,
    /// Values in the storage-change log.
    pub storage_value_chars: usize,
    /// Outer markup of a serialized element.
    pub markup_chars: usize,
    /// Default element bound for snapshots and accessibility trees.
    pub snapshot_elements: usize,
    /// Default element count returned by DOM queries.
    pub query_results: usize,
}

impl Limits {
    /// Default limits.
    pub const DEFAULT: Self = Self {
        body_chars: 1000,
        storage_value_chars: 200,
        markup_chars: 2000,
        snapshot_elements: 1000,
        query_results: 50,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// BridgeConfig
// ============================================================================

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Controller WebSocket URL.
    pub controller_url: String,
    /// Label identifying this page instance.
    pub page: String,
    /// Heartbeat ping interval.
    pub heartbeat_interval: Duration,
    /// Delay before reconnecting after close or error.
    pub reconnect_delay: Duration,
    /// Retry queue bound.
    pub queue_capacity: usize,
    /// Default code/batch/terminal execution deadline.
    pub execution_timeout: Duration,
    /// Delay before DOM interactions act.
    pub settle_delay: Duration,
    /// Storage poll interval.
    pub storage_poll_interval: Duration,
    /// Log and cache capacities.
    pub capacities: Capacities,
    /// Truncation limits.
    pub limits: Limits,
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeConfig {
    /// Creates a configuration with default settings and no controller URL.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            controller_url: String::new(),
            page: String::new(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            storage_poll_interval: DEFAULT_STORAGE_POLL_INTERVAL,
            capacities: Capacities::DEFAULT,
            limits: Limits::DEFAULT,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Sets the controller WebSocket URL.
    #[inline]
    #[must_use]
    pub fn with_controller_url(mut self, url: impl Into<String>) -> Self {
        self.controller_url = url.into();
        self
    }

    /// Sets the page label.
    #[inline]
    #[must_use]
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = page.into();
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the retry queue bound.
    #[inline]
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the default execution deadline.
    #[inline]
    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Sets the DOM settle delay.
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the storage poll interval.
    #[inline]
    #[must_use]
    pub fn with_storage_poll_interval(mut self, interval: Duration) -> Self {
        self.storage_poll_interval = interval;
        self
    }

    /// Sets all capacities.
    #[inline]
    #[must_use]
    pub fn with_capacities(mut self, capacities: Capacities) -> Self {
        self.capacities = capacities;
        self
    }

    /// Sets all truncation limits.
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
