//! WebSocket transport for the real-time session protocol.
//!
//! Each socket is one connection. Inbound frames are parsed and validated
//! here and handed to the router in arrival order; outbound events are
//! drained from the connection's queue by a forwarding task.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::{Router, routing::get};
use futures_util::{SinkExt, StreamExt};
use storyhall_session::application::router::ConnectionRouter;
use storyhall_session::domain::commands::ClientCommand;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.router))
}

async fn handle_socket(socket: WebSocket, router: Arc<ConnectionRouter>) {
    let (connection_id, mut events) = match router.connect() {
        Ok(registered) => registered,
        Err(e) => {
            error!(error = %e, "cannot register WebSocket connection");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = socket.split();

    info!(%connection_id, "WebSocket connection established");

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(%connection_id, error = %e, "failed to serialize event"),
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientCommand::from_json(text.as_str()) {
                Ok(command) => router.handle(connection_id, command).await,
                Err(e) => {
                    debug!(%connection_id, error = %e, "rejected malformed frame");
                    router.reject(connection_id, &e);
                }
            },
            Ok(Message::Close(_)) => {
                info!(%connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                warn!(%connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    router.disconnect(connection_id);
    send_task.abort();

    info!(%connection_id, "WebSocket connection terminated");
}

/// Returns the WebSocket router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
