//! Unified error type for the roshambo server.

use roshambo_protocol::ProtocolError;
use roshambo_room::RoomError;
use roshambo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum RoshamboError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, already seated, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),
}
