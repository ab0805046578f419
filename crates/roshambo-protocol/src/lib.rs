//! Wire protocol for roshambo.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Move`],
//!   [`PlayerId`], [`RoomId`]): the messages on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how they become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about connections, rooms, or timers.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room (session controller)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, Move, PlayerId, PlayerInfo, RoomId, ServerMessage};
