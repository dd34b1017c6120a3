//! WebSocket handler for room members.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use reelsync_engine::JoinEnvelope;
use tokio::sync::mpsc;

use crate::websocket::{parse_join, relay_frame, RoomManager};

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Waits for the join handshake, ignoring anything sent before it
/// 2. Registers the connection in its room
/// 3. Spawns a task to forward frames relayed from other members
/// 4. Stamps and relays incoming frames until the connection ends
/// 5. Leaves the room on disconnect
pub async fn handle_websocket_connection(socket: WebSocket, rooms: Arc<RoomManager>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let Some(join) = await_join(&mut ws_receiver).await else {
        tracing::debug!("WebSocket closed before joining a room");
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn_id = rooms.register(join.room.clone(), join.user.clone(), tx);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(frame.into())).await {
                tracing::warn!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match relay_frame(text.as_str(), &join.user) {
                Ok(frame) => {
                    rooms.broadcast_except(&conn_id, &frame);
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Dropping frame");
                }
            },
            Ok(Message::Binary(_)) => {
                tracing::warn!(conn_id = %conn_id, "Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    rooms.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        room = %join.room,
        user = %join.user,
        active_connections = rooms.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Read frames until a valid join handshake arrives.
///
/// Returns `None` if the connection ends first.
async fn await_join(ws_receiver: &mut SplitStream<WebSocket>) -> Option<JoinEnvelope> {
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match parse_join(text.as_str()) {
                Ok(join) => return Some(join),
                Err(e) => tracing::warn!(error = %e, "Ignoring frame sent before joining"),
            },
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}
