//! `RoshamboServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session controller →
//! room actors.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use roshambo_protocol::{Codec, JsonCodec};
use roshambo_room::{RoomConfig, SessionController};
use roshambo_transport::{Transport, WebSocketTransport};
use tokio::sync::{Mutex, watch};

use crate::RoshamboError;
use crate::handler::handle_connection;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Shared server state passed to each connection handler task.
///
/// The controller sits behind a `Mutex` because it is the one place that
/// spans rooms; per-room work happens in the room actors, outside the lock.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) controller: Mutex<SessionController>,
    pub(crate) codec: C,
    /// Flipped to `true` once on teardown; connection tasks watch it.
    pub(crate) shutdown: watch::Sender<bool>,
}

/// Builder for configuring and starting a roshambo server.
///
/// # Example
///
/// ```rust,no_run
/// use roshambo::prelude::*;
///
/// # async fn start() -> Result<(), RoshamboError> {
/// let server = RoshamboServer::builder()
///     .bind("0.0.0.0:5000")
///     .require_ready(true)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RoshamboServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl RoshamboServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind to. Port `0` picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the per-round time budget.
    pub fn round_duration(mut self, duration: Duration) -> Self {
        self.room_config.round_duration = duration;
        self
    }

    /// Makes rooms wait for both players' `playerReady` before round 1.
    pub fn require_ready(mut self, require: bool) -> Self {
        self.room_config.require_ready = require;
        self
    }

    /// Binds the listener. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<RoshamboServer<JsonCodec>, RoshamboError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let (shutdown, _) = watch::channel(false);

        let state = Arc::new(ServerState {
            controller: Mutex::new(SessionController::new(self.room_config)),
            codec: JsonCodec,
            shutdown,
        });

        Ok(RoshamboServer { transport, state })
    }
}

impl Default for RoshamboServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound roshambo server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct RoshamboServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl RoshamboServer<JsonCodec> {
    pub fn builder() -> RoshamboServerBuilder {
        RoshamboServerBuilder::new()
    }
}

impl<C: Codec> RoshamboServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), RoshamboError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops
    /// accepting, closes every connection, and tears down every room
    /// (cancelling their deadlines).
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), RoshamboError> {
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "roshambo server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        self.state.shutdown.send_replace(true);
        self.state.controller.lock().await.shutdown().await;
        tracing::info!("server stopped");
        Ok(())
    }
}
