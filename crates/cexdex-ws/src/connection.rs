//! WebSocket connection manager.
//!
//! Runs a single connection: subscribe, forward data frames, report the
//! close. Reconnecting is left to the caller.

use crate::error::{WsError, WsResult};
use crate::message::{ControlResponse, SubscribeRequest, WsEvent};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Stream names to subscribe to (e.g. "btcusdc@trade").
    pub streams: Vec<String>,
    /// Id of the subscribe request.
    pub subscribe_id: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            streams: Vec::new(),
            subscribe_id: 1,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    event_tx: mpsc::Sender<WsEvent>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(config: ConnectionConfig, event_tx: mpsc::Sender<WsEvent>) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            event_tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Signal graceful shutdown.
    ///
    /// The message loop sends a Close frame and exits.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shutdown_token.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect, subscribe and run the message loop until the socket ends.
    ///
    /// A `Closed` event is always sent before returning once the socket
    /// has been opened.
    pub async fn connect(&self) -> WsResult<()> {
        if self.is_shutdown() {
            return Ok(());
        }

        *self.state.write() = ConnectionState::Connecting;
        info!(url = %self.config.url, "Connecting to WebSocket");

        // TCP_NODELAY for lower latency
        let ws_stream = match connect_async_tls_with_config(&self.config.url, None, true, None)
            .await
        {
            Ok((stream, _response)) => stream,
            Err(e) => {
                error!(?e, "WebSocket connect failed");
                *self.state.write() = ConnectionState::Closed;
                return Err(WsError::ConnectionFailed(e.to_string()));
            }
        };
        let (mut write, mut read) = ws_stream.split();

        *self.state.write() = ConnectionState::Connected;
        info!("WebSocket connected");

        let result = match self.subscribe(&mut write).await {
            Ok(()) => {
                self.emit(WsEvent::Connected).await;
                self.run_loop(&mut write, &mut read).await
            }
            Err(e) => Err(e),
        };

        *self.state.write() = ConnectionState::Closed;
        let (code, reason) = match &result {
            Ok(()) => (1000, "Normal close".to_string()),
            Err(WsError::ConnectionClosed { code, reason }) => (*code, reason.clone()),
            Err(e) => (1006, e.to_string()),
        };
        self.emit(WsEvent::Closed { code, reason }).await;
        result
    }

    async fn subscribe(&self, write: &mut SplitSink<WsStream, Message>) -> WsResult<()> {
        if self.config.streams.is_empty() {
            warn!("No streams configured, skipping subscribe");
            return Ok(());
        }
        let request = SubscribeRequest::subscribe(&self.config.streams, self.config.subscribe_id);
        let text = serde_json::to_string(&request)?;
        write.send(Message::Text(text)).await?;
        info!(streams = ?self.config.streams, id = request.id, "Subscribe request sent");
        Ok(())
    }

    async fn run_loop(
        &self,
        write: &mut SplitSink<WsStream, Message>,
        read: &mut SplitStream<WsStream>,
    ) -> WsResult<()> {
        loop {
            tokio::select! {
                biased;

                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_message(text).await?;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "Stream ended".to_string(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    async fn handle_text_message(&self, text: String) -> WsResult<()> {
        // Control replies are internal only and never forwarded downstream
        if let Some(response) = ControlResponse::try_parse(&text) {
            if let Some(message) = response.error_message() {
                error!(id = response.id, %message, "Subscription rejected");
                return Err(WsError::SubscriptionRejected(message));
            }
            debug!(id = response.id, "Subscription acknowledged");
            return Ok(());
        }

        self.emit(WsEvent::Text(text)).await;
        Ok(())
    }

    async fn emit(&self, event: WsEvent) {
        if self.event_tx.send(event).await.is_err() {
            warn!("Event receiver dropped");
        }
    }
}
