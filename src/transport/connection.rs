//! WebSocket connection supervisor.
//!
//! The supervisor keeps at most one live socket to the controller:
//!
//! - On open it records the connect, attaches the [`Outbox`] (which sends
//!   `ready` and flushes the retry queue), and starts the heartbeat.
//! - Every heartbeat tick sends a `ping` and records its timestamp. A `pong`
//!   records the arrival time and derives latency.
//! - Other inbound text is forwarded to the dispatcher.
//! - On close or error the outbox is detached, a reconnect is counted, and
//!   the next attempt starts after a constant delay.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::health::HealthMetrics;
use crate::protocol::{ControlFrame, Outbound};
use crate::util::now_ms;

use super::Outbox;

// ============================================================================
// Types
// ============================================================================

/// Why one socket session ended.
enum SessionEnd {
    /// Socket closed or failed; reconnect.
    Lost,
    /// Shutdown requested; stop.
    Shutdown,
}

struct ManagerInner {
    url: Url,
    page: String,
    heartbeat_interval: Duration,
    reconnect_delay: Duration,
    outbox: Outbox,
    health: Arc<HealthMetrics>,
    running: AtomicBool,
    shutdown: watch::Sender<bool>,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owns the channel lifecycle.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

impl ConnectionManager {
    /// Creates a manager for `config.controller_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse or is not a
    /// WebSocket URL.
    pub fn new(config: &BridgeConfig, outbox: Outbox, health: Arc<HealthMetrics>) -> Result<Self> {
        let url = controller_url(&config.controller_url, &config.page)?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                url,
                page: config.page.clone(),
                heartbeat_interval: config.heartbeat_interval,
                reconnect_delay: config.reconnect_delay,
                outbox,
                health,
                running: AtomicBool::new(false),
                shutdown,
            }),
        })
    }

    /// URL dialed on every attempt.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Starts the supervisor. No-op if it is already connecting or open.
    ///
    /// Inbound command text is delivered to `inbound`.
    pub fn connect(&self, inbound: mpsc::UnboundedSender<String>) -> bool {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Connect ignored, supervisor already running");
            return false;
        }

        self.inner.shutdown.send_replace(false);
        let manager = self.clone();
        tokio::spawn(async move {
            manager.supervise(inbound).await;
            manager.inner.running.store(false, Ordering::SeqCst);
        });
        true
    }

    /// Stops the supervisor and closes the socket.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Returns `true` while the supervisor runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    async fn supervise(&self, inbound: mpsc::UnboundedSender<String>) {
        let mut shutdown_rx = self.inner.shutdown.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            match self.run_session(&inbound, &mut shutdown_rx).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Lost) => {}
                Err(e) => warn!(error = %e, url = %self.inner.url, "Connection attempt failed"),
            }

            self.inner.outbox.close();
            self.inner.health.record_reconnect();
            info!(
                delay_ms = self.inner.reconnect_delay.as_millis() as u64,
                "Reconnect scheduled"
            );

            tokio::select! {
                _ = sleep(self.inner.reconnect_delay) => {}
                _ = shutdown_rx.changed() => {}
            }
        }

        self.inner.outbox.close();
        debug!("Connection supervisor stopped");
    }

    /// Runs one socket from connect to close.
    async fn run_session(
        &self,
        inbound: &mpsc::UnboundedSender<String>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd> {
        let (ws_stream, _) = connect_async(self.inner.url.as_str()).await?;
        let (mut ws_write, mut ws_read) = ws_stream.split();

        info!(page = %self.inner.page, "Connected to controller");
        self.inner.health.record_connect(now_ms());

        let (link_tx, mut link_rx) = mpsc::unbounded_channel::<String>();
        self.inner.outbox.open(link_tx);

        let mut heartbeat = interval(self.inner.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat.tick().await;

        let mut unsent = None;
        let end = loop {
            tokio::select! {
                outgoing = link_rx.recv() => {
                    let Some(text) = outgoing else {
                        break SessionEnd::Lost;
                    };
                    trace!(bytes = text.len(), "Sending envelope");
                    if let Err(e) = ws_write.send(Message::Text(text.clone().into())).await {
                        warn!(error = %e, "Send failed, requeueing");
                        unsent = Some(text);
                        break SessionEnd::Lost;
                    }
                }

                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.route_inbound(text.as_str(), inbound),

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break SessionEnd::Lost;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break SessionEnd::Lost;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break SessionEnd::Lost;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                _ = heartbeat.tick() => {
                    let now = now_ms();
                    self.inner.health.record_ping(now);
                    self.inner.outbox.send(&Outbound::ping(&self.inner.page, now));
                }

                _ = shutdown_rx.changed() => {
                    debug!("Shutdown requested");
                    let _ = ws_write.close().await;
                    break SessionEnd::Shutdown;
                }
            }
        };

        self.inner.outbox.detach(unsent, &mut link_rx);

        Ok(end)
    }

    /// Consumes control frames and forwards everything else.
    fn route_inbound(&self, text: &str, inbound: &mpsc::UnboundedSender<String>) {
        if let Some(ControlFrame::Pong { .. }) = ControlFrame::parse(text) {
            let now = now_ms();
            self.inner.health.record_pong(now);
            trace!(latency = ?self.inner.health.latency(), "Pong received");
            return;
        }

        if inbound.send(text.to_string()).is_err() {
            warn!("Dispatcher gone, dropping inbound message");
        }
    }
}

/// Appends the page label to the controller URL.
pub(crate) fn controller_url(base: &str, page: &str) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| Error::config(format!("invalid controller URL: {e}")))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(Error::config(format!(
            "controller URL must use ws or wss, got {}",
            url.scheme()
        )));
    }

    url.query_pairs_mut().append_pair("page", page);
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
