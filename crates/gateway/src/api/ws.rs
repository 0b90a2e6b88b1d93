//! `GET /v1/debug/sessions/:id/ws` — live-subscribe to a debug session's
//! network events, console errors, and status transitions.
//!
//! Grounded on the teacher's `nodes::ws::node_ws` handler shape: split the
//! socket into sink/stream, forward a channel into the sink from a
//! dedicated writer task, and read the socket only to notice disconnects.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use mon_domain::types::SessionId;

use crate::state::AppState;

pub async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: SessionId) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    let (tx, mut rx) = mpsc::channel(64);
    let subscription = state.broadcaster.subscribe(session_id, tx);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&message) else {
                continue;
            };
            if ws_sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_stream.next().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }

    writer.abort();
    state.broadcaster.unsubscribe(session_id, subscription);
}
