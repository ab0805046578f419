//! Session controller: routes per-connection inputs to rooms.
//!
//! The controller is the only component that deals with more than one
//! room. It owns the [`RoomRegistry`] and remembers which rooms each
//! connection sits in, so a disconnect can clean up all of them.

use std::collections::{HashMap, HashSet};

use roshambo_protocol::{Move, PlayerId, RoomId};

use crate::state::Participant;
use crate::{PlayerSender, RoomConfig, RoomError, RoomRegistry};

pub struct SessionController {
    registry: RoomRegistry,
    /// Rooms each connection is seated in.
    memberships: HashMap<PlayerId, HashSet<RoomId>>,
}

impl SessionController {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            registry: RoomRegistry::new(config),
            memberships: HashMap::new(),
        }
    }

    /// Seats `player_id` in `room_id`, creating the room on first use.
    ///
    /// On success `sender` starts receiving the room's broadcasts,
    /// beginning with the updated `roomData`.
    ///
    /// # Errors
    /// `RoomFull` or `AlreadyInRoom` when the seat is refused. These are the
    /// only errors a client ever gets to see. `Unavailable` if the room's
    /// actor has stopped; the dead room is dropped so the next join starts
    /// a fresh one.
    pub async fn join(
        &mut self,
        player_id: PlayerId,
        room_id: &RoomId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let created = self.registry.get(room_id).is_none();
        let handle = self.registry.get_or_create(room_id);

        match handle.join(Participant::new(player_id, name), sender).await {
            Ok(()) => {
                self.memberships
                    .entry(player_id)
                    .or_default()
                    .insert(room_id.clone());
                Ok(())
            }
            Err(e) => {
                tracing::debug!(%room_id, %player_id, error = %e, "join refused");
                // Don't leave behind a room nobody managed to enter, nor a
                // stopped actor that would refuse every later join.
                if created || matches!(e, RoomError::Unavailable(_)) {
                    let _ = self.registry.delete_if_empty(room_id).await;
                }
                Err(e)
            }
        }
    }

    /// Forwards a move to the room. Unknown rooms are ignored.
    pub async fn submit_move(&self, player_id: PlayerId, room_id: &RoomId, choice: Move) {
        let Some(handle) = self.registry.get(room_id) else {
            tracing::debug!(%room_id, %player_id, "move for unknown room, ignoring");
            return;
        };
        if let Err(e) = handle.submit_move(player_id, choice).await {
            tracing::debug!(%room_id, %player_id, error = %e, "move not delivered");
        }
    }

    /// Forwards a readiness signal to the room. Unknown rooms are ignored.
    pub async fn ready(&self, player_id: PlayerId, room_id: &RoomId) {
        let Some(handle) = self.registry.get(room_id) else {
            tracing::debug!(%room_id, %player_id, "ready for unknown room, ignoring");
            return;
        };
        if let Err(e) = handle.ready(player_id).await {
            tracing::debug!(%room_id, %player_id, error = %e, "ready not delivered");
        }
    }

    /// Removes the connection from every room it sits in.
    ///
    /// Rooms left empty are deleted along with their deadline. Rooms with
    /// a player left keep their clock running.
    pub async fn disconnect(&mut self, player_id: PlayerId) {
        let Some(rooms) = self.memberships.remove(&player_id) else {
            return;
        };

        for room_id in rooms {
            let Some(handle) = self.registry.get(&room_id) else {
                continue;
            };
            match handle.leave(player_id).await {
                Ok(0) => {
                    if let Err(e) = self.registry.delete_if_empty(&room_id).await {
                        tracing::warn!(%room_id, error = %e, "failed to delete empty room");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(%room_id, %player_id, error = %e, "leave failed");
                }
            }
        }
        tracing::debug!(%player_id, "connection cleaned up");
    }

    /// Rooms the connection is currently seated in.
    pub fn rooms_of(&self, player_id: PlayerId) -> Vec<RoomId> {
        self.memberships
            .get(&player_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Tears down every room and forgets all memberships.
    pub async fn shutdown(&mut self) {
        self.memberships.clear();
        self.registry.shutdown_all().await;
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
