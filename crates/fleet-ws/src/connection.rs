//! Push-channel connection manager.
//!
//! `PushConnector` owns the only socket to the push endpoint. Each successful
//! `connect()` starts a session task that runs the read loop, reports
//! open/close transitions to the sink and, when configured, reconnects with
//! capped exponential backoff. Starting a new session always closes and
//! joins the previous one first, so two sockets are never live at once.

use crate::error::{WsError, WsResult};
use crate::message::decode_frame;
use crate::sink::PushSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

/// Connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// WebSocket URL.
    #[serde(default)]
    pub url: String,
    /// Reconnect attempts after an unrequested close (0 = never reconnect).
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Handshake must complete within this.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl PushConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Delay before reconnect `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at the max delay, plus up to `min(base, 1000)` ms of jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.reconnect_base_delay_ms;
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = base
            .saturating_mul(1u64 << exponent)
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(delay + rand_jitter(base.min(1000)))
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// How a session's read loop ended without an error.
enum SessionEnd {
    /// The owner asked the session to stop.
    Cancelled,
    /// The server ended the stream.
    StreamEnded,
}

/// State shared between the connector and its session task.
struct Shared {
    config: PushConfig,
    state: RwLock<ConnectionState>,
    reconnect_count: RwLock<u32>,
    sink: Arc<dyn PushSink>,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn mark_connecting(&self) {
        *self.state.write() = ConnectionState::Connecting;
    }

    fn mark_connected(&self) {
        *self.state.write() = ConnectionState::Connected;
        *self.reconnect_count.write() = 0;
        self.sink.on_connection_change(true);
    }

    /// Notifies the sink only on an actual transition away from open/opening.
    fn mark_disconnected(&self) {
        let previous = std::mem::replace(&mut *self.state.write(), ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            self.sink.on_connection_change(false);
        }
    }

    fn handle_text(&self, text: &str) {
        let message = match decode_frame(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "Dropping undecodable push frame");
                return;
            }
        };

        if let Some(vehicles) = message.vehicles {
            debug!(count = vehicles.len(), "Pushed vehicle snapshot");
            self.sink.on_vehicles(vehicles);
        }
        if let Some(statistics) = message.statistics {
            debug!(total = statistics.total, "Pushed statistics");
            self.sink.on_statistics(statistics);
        }
    }

    async fn try_connect(&self, token: &CancellationToken) -> WsResult<SessionEnd> {
        info!(url = %self.config.url, "Connecting to push channel");

        let timeout_ms = self.config.connect_timeout_ms;
        let handshake = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            connect_async_tls_with_config(self.config.url.as_str(), None, true, None),
        );

        let (ws_stream, _response) = tokio::select! {
            () = token.cancelled() => return Ok(SessionEnd::Cancelled),
            result = handshake => result.map_err(|_| WsError::ConnectTimeout(timeout_ms))??,
        };
        let (mut write, mut read) = ws_stream.split();

        self.mark_connected();
        info!("Push channel connected");

        loop {
            tokio::select! {
                biased;

                () = token.cancelled() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(?e, "Failed to send Close frame");
                    }
                    return Ok(SessionEnd::Cancelled);
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_text(&text),
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Ok(SessionEnd::StreamEnded),
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }
}

/// Session task body: connect, read, and retry until cancelled or out of attempts.
async fn run_session(shared: Arc<Shared>, token: CancellationToken) {
    let max_attempts = shared.config.max_reconnect_attempts;
    let mut attempt = 0u32;

    loop {
        shared.mark_connecting();

        let result = shared.try_connect(&token).await;
        let was_connected = shared.state() == ConnectionState::Connected;
        shared.mark_disconnected();

        match result {
            Ok(SessionEnd::Cancelled) => {
                debug!("Push session cancelled");
                return;
            }
            Ok(SessionEnd::StreamEnded) => info!("Push stream ended"),
            Err(WsError::ConnectionClosed { code, reason }) => {
                warn!(code, %reason, "Push channel closed by server");
            }
            Err(e) => warn!(error = %e, "Push channel error"),
        }

        if token.is_cancelled() {
            return;
        }

        if was_connected {
            attempt = 0;
        }
        attempt += 1;
        if attempt > max_attempts {
            if max_attempts == 0 {
                info!("Automatic reconnect disabled; push channel stays down");
            } else {
                error!(attempts = max_attempts, "Max reconnection attempts reached");
            }
            return;
        }
        *shared.reconnect_count.write() = attempt;

        let delay = shared.config.backoff_delay(attempt);
        warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting push channel");

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = token.cancelled() => {
                info!("Push session cancelled during backoff");
                return;
            }
        }
    }
}

struct Session {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

async fn close_session(session: Session) {
    session.token.cancel();
    if let Err(e) = session.handle.await {
        if e.is_panic() {
            error!(?e, "Push session task panicked");
        }
    }
}

/// Owner of the push-channel socket.
pub struct PushConnector {
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
    /// Serializes connect/disconnect so sessions never overlap.
    lifecycle: TokioMutex<()>,
}

impl PushConnector {
    pub fn new(config: PushConfig, sink: Arc<dyn PushSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(ConnectionState::Disconnected),
                reconnect_count: RwLock::new(0),
                sink,
            }),
            session: Mutex::new(None),
            lifecycle: TokioMutex::new(()),
        }
    }

    pub fn url(&self) -> &str {
        &self.shared.config.url
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_count(&self) -> u32 {
        *self.shared.reconnect_count.read()
    }

    /// Start a new session, closing any existing one first.
    ///
    /// Returns once the session task is spawned; the open is reported to the
    /// sink asynchronously. Fails only when no URL is configured.
    pub async fn connect(&self) -> WsResult<()> {
        if self.shared.config.url.trim().is_empty() {
            return Err(WsError::ConnectionFailed(
                "no push URL configured".to_string(),
            ));
        }

        let _guard = self.lifecycle.lock().await;

        let previous = self.session.lock().take();
        if let Some(previous) = previous {
            info!("Closing previous push session");
            close_session(previous).await;
        }

        let token = CancellationToken::new();
        self.shared.mark_connecting();
        let handle = tokio::spawn(run_session(self.shared.clone(), token.clone()));
        *self.session.lock() = Some(Session { token, handle });
        Ok(())
    }

    /// Close the session if any. Always reports "disconnected" to the sink.
    pub async fn disconnect(&self) {
        let _guard = self.lifecycle.lock().await;

        let previous = self.session.lock().take();
        if let Some(previous) = previous {
            close_session(previous).await;
            info!("Push channel disconnected");
        }

        *self.shared.state.write() = ConnectionState::Disconnected;
        self.shared.sink.on_connection_change(false);
    }

    /// Non-blocking close for drop paths. The session task exits on its own.
    pub fn close_now(&self) {
        let previous = self.session.lock().take();
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        *self.shared.state.write() = ConnectionState::Disconnected;
        self.shared.sink.on_connection_change(false);
    }
}

impl Drop for PushConnector {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.token.cancel();
        }
    }
}

impl std::fmt::Debug for PushConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConnector")
            .field("url", &self.shared.config.url)
            .field("state", &self.state())
            .finish()
    }
}

/// Pseudo-random jitter in `0..max_ms` from the clock's sub-second nanos.
fn rand_jitter(max_ms: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    if max_ms == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % max_ms
}
