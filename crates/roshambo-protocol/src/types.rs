//! Core protocol types for roshambo's wire format.
//!
//! Every type in this module travels "on the wire": it is serialized to
//! JSON, sent over a WebSocket text frame, and parsed on the other side
//! (usually by a browser client). The JSON shapes are therefore part of
//! the public contract and are pinned down by the tests at the bottom.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a participant.
///
/// There is no account system: a participant *is* its connection, so the
/// server derives this from the transport's connection ID. It lives only
/// as long as that connection.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as `42`. When it
/// is used as a map key (score and move maps), serde_json writes it as the
/// string `"42"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifies a room.
///
/// Room IDs are chosen by the clients (players agree on a name and both
/// join it). The server only uses them as map keys; the one rule is that
/// an ID must not be blank (see [`ClientMessage::validate`]).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the raw room key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A hand gesture. Serialized in lowercase: `"rock"`, `"paper"`, `"scissors"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    /// All moves, in a fixed order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Returns `true` if `self` beats `other`.
    ///
    /// Rock crushes scissors, paper covers rock, scissors cut paper.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors)
                | (Move::Paper, Move::Rock)
                | (Move::Scissors, Move::Paper)
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rock => write!(f, "rock"),
            Self::Paper => write!(f, "paper"),
            Self::Scissors => write!(f, "scissors"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerInfo
// ---------------------------------------------------------------------------

/// A seated participant as shown to clients in `roomData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    /// Whether the player has sent `playerReady`. Only meaningful for
    /// rooms that gate the first round on readiness.
    #[serde(default)]
    pub ready: bool,
}

// ---------------------------------------------------------------------------
// ClientMessage: what browsers send
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// Internally tagged by `"type"` with camelCase names, so a join looks like:
///
/// ```json
/// { "type": "joinRoom", "roomId": "lobby-7", "playerName": "Ada" }
/// ```
///
/// There is no explicit "disconnect" message: closing the socket is the
/// disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Take a seat in a room, creating it if nobody is there yet.
    JoinRoom { room_id: RoomId, player_name: String },

    /// Submit (or replace) this round's move.
    PlayerMove {
        room_id: RoomId,
        #[serde(rename = "move")]
        choice: Move,
    },

    /// Signal readiness to start the first round.
    PlayerReady { room_id: RoomId },
}

impl ClientMessage {
    /// The room this message is addressed to.
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::PlayerMove { room_id, .. }
            | Self::PlayerReady { room_id } => room_id,
        }
    }

    /// Checks the fields serde can't: room IDs and player names must not
    /// be blank.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] naming the offending field.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.room_id().as_str().trim().is_empty() {
            return Err(ProtocolError::InvalidMessage("roomId is empty".into()));
        }
        if matches!(self, Self::JoinRoom { player_name, .. } if player_name.trim().is_empty()) {
            return Err(ProtocolError::InvalidMessage("playerName is empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ServerMessage: what the server broadcasts
// ---------------------------------------------------------------------------

/// Messages the server sends to clients.
///
/// Everything except `Error` is broadcast to every player seated in the
/// room named by `roomId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The seat list changed (join or leave). Ordered by seat.
    RoomData {
        room_id: RoomId,
        players: Vec<PlayerInfo>,
    },

    /// The room's round clock just started for the first time.
    GameStart { room_id: RoomId, round: u64 },

    /// A round was resolved.
    RoundResult {
        room_id: RoomId,
        round: u64,
        /// Moves on record at resolution time.
        moves: BTreeMap<PlayerId, Move>,
        /// Human-readable outcome: `"draw"`, `"Ada wins"`,
        /// `"Ada wins (timeout)"`.
        round_result: String,
        winner: Option<PlayerId>,
        /// Cumulative wins per seated player.
        score: BTreeMap<PlayerId, u32>,
    },

    /// A request from this connection was rejected. `code` follows HTTP
    /// conventions (400 = invalid request, 409 = conflict such as a full
    /// room).
    Error { code: u16, message: String },
}

impl ServerMessage {
    /// The room this message concerns, if any.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::RoomData { room_id, .. }
            | Self::GameStart { room_id, .. }
            | Self::RoundResult { room_id, .. } => Some(room_id),
            Self::Error { .. } => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
