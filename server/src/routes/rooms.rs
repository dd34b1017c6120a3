//! Room routes: the WebSocket endpoint and a membership listing.

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::handlers::handle_websocket_connection;
use crate::websocket::MemberInfo;
use crate::AppState;

/// Room listing response.
#[derive(Serialize)]
pub struct RoomResponse {
    pub room: String,
    pub members: Vec<MemberInfo>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms/{room}", get(room_handler))
}

/// GET /ws - Upgrade to a room connection.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state.rooms))
}

/// GET /rooms/{room} - Current members of a room.
async fn room_handler(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<RoomResponse>> {
    if room.trim().is_empty() {
        return Err(AppError::BadRequest("room name is blank".to_string()));
    }

    let members = state.rooms.members(&room);
    if members.is_empty() {
        return Err(AppError::NotFound(format!("room {room}")));
    }

    Ok(Json(RoomResponse { room, members }))
}
