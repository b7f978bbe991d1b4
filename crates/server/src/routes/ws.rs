// crates/server/src/routes/ws.rs
//! Real-time change feed over WebSocket.
//!
//! The server pushes one JSON text frame per change:
//! `{"path": "...", "changeKind": "created|modified|deleted", "timestamp": "..."}`.
//! Anything the client sends other than close is ignored. A client that
//! falls too far behind is disconnected.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (id, mut rx) = state.fanout.subscribe();

    let mut forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        // Dropped by the fan-out for lagging behind.
        let _ = sink.send(Message::Close(None)).await;
    });

    let read_until_close = async {
        while let Some(Ok(msg)) = stream.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    };

    tokio::select! {
        _ = &mut forward_task => {}
        _ = read_until_close => {}
    }

    state.fanout.unsubscribe(id);
    forward_task.abort();
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}
