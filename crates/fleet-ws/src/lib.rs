//! WebSocket push channel for the fleet tracking dashboard.
//!
//! Provides the single live connection to the backend's push endpoint:
//! - Explicit Disconnected/Connecting/Connected state machine
//! - At most one live session; `connect()` closes the previous one first
//! - Defensive frame decoding (`vehicles` and `statistics` routed independently)
//! - Optional reconnection with capped exponential backoff

pub mod connection;
pub mod error;
pub mod message;
pub mod sink;

pub use connection::{ConnectionState, PushConfig, PushConnector};
pub use error::{WsError, WsResult};
pub use message::{decode_frame, PushMessage};
pub use sink::PushSink;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
