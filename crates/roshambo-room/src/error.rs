//! Error types for the room layer.

use roshambo_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
///
/// Only join failures ever reach a client. Everything else is logged and
/// swallowed by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Both seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player already holds a seat in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player does not hold a seat in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// HTTP-style status code used when the error is reported to a client.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::NotInRoom(..) => 404,
            Self::RoomFull(_) | Self::AlreadyInRoom(..) => 409,
            Self::Unavailable(_) => 503,
        }
    }
}
