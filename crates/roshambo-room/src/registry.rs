//! Room registry: owns every live room actor, keyed by room ID.

use std::collections::HashMap;

use roshambo_protocol::RoomId;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Process-wide table of rooms.
///
/// Rooms are created lazily by the first join to an unseen ID and deleted
/// the moment their last player leaves. There is no expiry; an occupied
/// room lives as long as the process.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomHandle>,
    config: RoomConfig,
    channel_size: usize,
}

impl RoomRegistry {
    /// Creates an empty registry. Every room it spawns uses `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config: config.validated(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Returns the room for `room_id`, spawning an empty one (round 1, no
    /// deadline) if it does not exist yet.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn get_or_create(&mut self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(room_id) {
            return handle.clone();
        }

        let handle = spawn_room(room_id.clone(), self.config.clone(), self.channel_size);
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, rooms = self.rooms.len(), "room created");
        handle
    }

    /// Looks up a room.
    pub fn get(&self, room_id: &RoomId) -> Option<&RoomHandle> {
        self.rooms.get(room_id)
    }

    /// Deletes the room if nobody is seated in it.
    ///
    /// Deleting shuts the actor down, which cancels any armed deadline, so
    /// no timer can fire for a room that is gone. Returns `true` if the room
    /// was removed.
    ///
    /// # Errors
    /// `NotFound` if the registry has no such room.
    pub async fn delete_if_empty(&mut self, room_id: &RoomId) -> Result<bool, RoomError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        // An actor that already stopped has nobody left to serve.
        let empty = match handle.get_info().await {
            Ok(info) => info.player_count() == 0,
            Err(RoomError::Unavailable(_)) => true,
            Err(e) => return Err(e),
        };
        if !empty {
            return Ok(false);
        }

        if let Some(handle) = self.rooms.remove(room_id) {
            let _ = handle.shutdown().await;
        }
        tracing::info!(%room_id, rooms = self.rooms.len(), "room deleted");
        Ok(true)
    }

    /// Shuts down every room. Used on server teardown.
    pub async fn shutdown_all(&mut self) {
        for (room_id, handle) in self.rooms.drain() {
            let _ = handle.shutdown().await;
            tracing::debug!(%room_id, "room shut down");
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
