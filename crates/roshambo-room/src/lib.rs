//! Rooms and rounds for roshambo.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! seats, moves, score, and round deadline. Inputs for a room are handled
//! one at a time, so a round can only ever be resolved once.
//!
//! # Key types
//!
//! - [`duel`] / [`on_deadline`]: the outcome resolver
//! - [`Room`]: the synchronous round state machine
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRegistry`]: creates and deletes rooms
//! - [`SessionController`]: routes connection inputs across rooms
//! - [`RoomConfig`]: seat count, round duration, ready gating

mod config;
mod controller;
mod error;
mod outcome;
mod registry;
mod room;
mod state;

pub use config::{RoomConfig, RoomPhase};
pub use controller::SessionController;
pub use error::RoomError;
pub use outcome::{Outcome, Seat, duel, on_deadline};
pub use registry::RoomRegistry;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
pub use state::{Participant, Room};
