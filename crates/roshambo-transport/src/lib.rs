//! Network plumbing for roshambo.
//!
//! The game server never touches sockets directly. It accepts peers from a
//! [`Transport`] and talks to each one through a [`Connection`]: a numbered
//! pipe carrying whole frames of bytes in both directions. What the bytes
//! mean is the protocol crate's business.
//!
//! With the `websocket` feature (on by default) the crate ships
//! [`WebSocketTransport`], built on `tokio-tungstenite`.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide connection number. Doubles as the player's identity, so
/// two connections never share one, not even across transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Hands out the next unused ID. Numbering starts at 1.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of incoming peers.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Resolves with the next peer once its handshake is done.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One peer, seen as a duplex stream of frames.
///
/// The handler waits in `recv` and calls `send` from sibling `select!`
/// arms of the same task, so the two directions must not share a lock.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next frame from the peer, or `Ok(None)` once it hung up cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
