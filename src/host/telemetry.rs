//! Telemetry subscriptions.

use crate::error::Result;
use crate::telemetry::PerformanceCategory;

/// A host event feed the bridge can switch on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryStream {
    /// Document change notifications.
    Mutations,
    /// One performance instrumentation category.
    Performance(PerformanceCategory),
}

/// Starts and stops host event feeds.
///
/// Once subscribed, the host pushes events into the bridge's
/// [`TelemetrySink`](crate::telemetry::TelemetrySink).
pub trait TelemetryHost: Send + Sync {
    /// Starts a feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`](crate::Error::Unsupported) if the host
    /// cannot provide the feed.
    fn subscribe(&self, stream: TelemetryStream) -> Result<()>;

    /// Stops a feed. Stopping an inactive feed is a no-op.
    fn unsubscribe(&self, stream: TelemetryStream);
}
