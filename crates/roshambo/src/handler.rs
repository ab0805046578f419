//! Per-connection handler: message routing and disconnect cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The connection ID doubles as the player ID. The task then loops over
//! three sources:
//!   1. Frames from the client → decode → session controller
//!   2. Broadcasts from the player's rooms → encode → client
//!   3. Server shutdown → close
//!
//! When the loop ends for any reason the player leaves every room.

use std::sync::Arc;

use roshambo_protocol::{ClientMessage, Codec, PlayerId, ServerMessage};
use roshambo_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::RoshamboError;
use crate::server::ServerState;

/// Drop guard that removes the player from all rooms when the handler
/// exits, whether it returns, errors out, or panics.
///
/// `Drop` is synchronous, so the cleanup is spawned as its own task.
struct DisconnectGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        runtime.spawn(async move {
            state.controller.lock().await.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), RoshamboError> {
    let player_id = PlayerId(conn.id().as_u64());
    tracing::info!(%player_id, "player connected");

    let mut shutdown = state.shutdown.subscribe();
    if *shutdown.borrow() {
        let _ = conn.close().await;
        return Ok(());
    }

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    dispatch(&conn, &state, player_id, &outbound_tx, &data).await?;
                }
                Ok(None) => {
                    tracing::info!(%player_id, "connection closed");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%player_id, error = %e, "recv error");
                    break;
                }
            },
            // `outbound_tx` lives as long as this loop, so this never yields `None`.
            Some(msg) = outbound_rx.recv() => {
                send_message(&conn, &state.codec, &msg).await?;
            }
            _ = shutdown.changed() => {
                tracing::debug!(%player_id, "closing connection for shutdown");
                let _ = conn.close().await;
                break;
            }
        }
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// Decodes one client frame and hands it to the session controller.
///
/// Frames that don't decode are dropped, as are messages naming a blank
/// room. The only reply sent from here is the error for a refused join
/// (400 when invalid, otherwise the room's verdict); everything else
/// reaches the client as a room broadcast.
async fn dispatch<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    player_id: PlayerId,
    outbound: &mpsc::UnboundedSender<ServerMessage>,
    data: &[u8],
) -> Result<(), RoshamboError> {
    let msg: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%player_id, error = %e, "dropping malformed frame");
            return Ok(());
        }
    };

    if let Err(e) = msg.validate() {
        tracing::debug!(%player_id, error = %e, "rejecting invalid message");
        // A refused join is the only request that gets an answer.
        if matches!(msg, ClientMessage::JoinRoom { .. }) {
            let reply = ServerMessage::Error {
                code: 400,
                message: e.to_string(),
            };
            send_message(conn, &state.codec, &reply).await?;
        }
        return Ok(());
    }

    match msg {
        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            // Lock only for the join itself, release before network I/O.
            let result = {
                let mut controller = state.controller.lock().await;
                controller
                    .join(player_id, &room_id, player_name, outbound.clone())
                    .await
            };
            if let Err(e) = result {
                let reply = ServerMessage::Error {
                    code: e.code(),
                    message: e.to_string(),
                };
                send_message(conn, &state.codec, &reply).await?;
            }
        }
        ClientMessage::PlayerMove { room_id, choice } => {
            state
                .controller
                .lock()
                .await
                .submit_move(player_id, &room_id, choice)
                .await;
        }
        ClientMessage::PlayerReady { room_id } => {
            state.controller.lock().await.ready(player_id, &room_id).await;
        }
    }

    Ok(())
}

async fn send_message(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    msg: &ServerMessage,
) -> Result<(), RoshamboError> {
    let bytes = codec.encode(msg)?;
    conn.send(&bytes).await?;
    Ok(())
}
