//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and talks to the outside world through an
//! mpsc channel. Commands and the round deadline are handled by a single
//! `select!` loop, so for any given room a move, a leave, and a deadline
//! never interleave: whichever is picked first runs to completion, and a
//! deadline cancelled by a command is gone before the loop polls the timer
//! again.

use std::collections::{BTreeMap, HashMap};

use roshambo_protocol::{Move, PlayerId, PlayerInfo, RoomId, ServerMessage};
use tokio::sync::{mpsc, oneshot};

use crate::state::{Participant, Room};
use crate::{RoomConfig, RoomError, RoomPhase};

/// Channel sender for delivering outbound messages to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/response: the caller
/// waits for the actor's answer on that channel.
pub(crate) enum RoomCommand {
    Join {
        player: Participant,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Replies with the number of players left in the room.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    Move {
        player_id: PlayerId,
        choice: Move,
    },

    Ready {
        player_id: PlayerId,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of a room, for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: RoomPhase,
    /// Seated players in seat order.
    pub players: Vec<PlayerInfo>,
    /// Current (unresolved) round.
    pub round: u64,
    /// Round the active deadline belongs to, `None` if no clock is running.
    pub deadline_round: Option<u64>,
    pub score: BTreeMap<PlayerId, u32>,
    /// Number of moves on record for the current round.
    pub pending_moves: usize,
}

impl RoomInfo {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Handle to a running room actor.
///
/// Cheap to clone; it is just an `mpsc::Sender` plus the room key.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Seats a player, registering `sender` for the room's broadcasts.
    pub async fn join(&self, player: Participant, sender: PlayerSender) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Unseats a player. Returns how many players remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Submits a move (fire-and-forget).
    pub async fn submit_move(&self, player_id: PlayerId, choice: Move) -> Result<(), RoomError> {
        self.send(RoomCommand::Move { player_id, choice }).await
    }

    /// Signals readiness (fire-and-forget).
    pub async fn ready(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Ready { player_id }).await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to cancel its deadline and stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-player outbound channels, keyed like the room's seats.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::debug!(room_id = %self.room.id(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle(cmd),
                    }
                }
                expiry = self.room.timer_mut().expired() => {
                    tracing::debug!(
                        room_id = %self.room.id(),
                        round = expiry.round,
                        late_by = ?expiry.late_by,
                        "round deadline expired"
                    );
                    let msgs = self.room.expire(expiry.round);
                    self.broadcast(msgs);
                }
            }
        }

        if let Some(round) = self.room.timer_mut().cancel() {
            tracing::debug!(room_id = %self.room.id(), round, "pending deadline cancelled on shutdown");
        }
        tracing::debug!(room_id = %self.room.id(), "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player,
                sender,
                reply,
            } => {
                let player_id = player.id;
                let result = match self.room.join(player) {
                    Ok(msgs) => {
                        self.senders.insert(player_id, sender);
                        self.broadcast(msgs);
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = match self.room.leave(player_id) {
                    Ok(msgs) => {
                        self.senders.remove(&player_id);
                        self.broadcast(msgs);
                        Ok(self.room.player_count())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            RoomCommand::Move { player_id, choice } => {
                let msgs = self.room.submit_move(player_id, choice);
                self.broadcast(msgs);
            }
            RoomCommand::Ready { player_id } => {
                let msgs = self.room.ready(player_id);
                self.broadcast(msgs);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {}
        }
    }

    /// Sends every message to every seated player. Silently drops messages
    /// for receivers that are gone (their connection is closing).
    fn broadcast(&self, msgs: Vec<ServerMessage>) {
        for msg in msgs {
            for player in self.room.players() {
                if let Some(sender) = self.senders.get(&player.id) {
                    let _ = sender.send(msg.clone());
                }
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room.id().clone(),
            phase: self.room.phase(),
            players: self.room.players().iter().map(PlayerInfo::from).collect(),
            round: self.room.round(),
            deadline_round: self.room.deadline_round(),
            score: self.room.scores(),
            pending_moves: self.room.moves().len(),
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(room_id: RoomId, config: RoomConfig, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(room_id.clone(), config),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
