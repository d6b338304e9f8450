//! WebSocket client for the exchange trade stream.
//!
//! Connects once, subscribes to the configured streams, and forwards data
//! frames over a channel. There is no reconnect: when the socket ends the
//! manager reports [`WsEvent::Closed`] and returns.

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{WsError, WsResult};
pub use message::{ControlResponse, SubscribeRequest, WsEvent};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
