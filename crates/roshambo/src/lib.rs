//! # Roshambo
//!
//! A server-authoritative, two-player rock-paper-scissors game server.
//!
//! Players connect over WebSocket, join a room by name, and play rounds
//! against a per-round deadline. A round resolves the instant both moves
//! are in, or when the clock runs out (a player who moved wins by
//! timeout). Rounds continue until the room empties.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roshambo::prelude::*;
//!
//! # async fn start() -> Result<(), RoshamboError> {
//! let server = RoshamboServer::builder().bind("0.0.0.0:5000").build().await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::RoshamboError;
pub use server::{DEFAULT_BIND_ADDR, RoshamboServer, RoshamboServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{DEFAULT_BIND_ADDR, RoshamboError, RoshamboServer, RoshamboServerBuilder};
    pub use roshambo_protocol::{ClientMessage, Move, PlayerId, RoomId, ServerMessage};
    pub use roshambo_room::{RoomConfig, RoomError};
    pub use roshambo_timer::DEFAULT_ROUND_DURATION;
}
