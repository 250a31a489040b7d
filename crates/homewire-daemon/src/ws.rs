//! WebSocket handler for remote clients

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Per-connection task: forwards push messages to the client and answers
/// its requests in arrival order on the same socket.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: Arc<AppState>) {
    let client = addr.to_string();
    let (mut sender, mut receiver) = socket.split();
    let mut pushes = state.hub.subscribe();

    state.hub.register(&client);
    info!(client = %client, "WebSocket client connected");

    loop {
        tokio::select! {
            // Fan unsolicited push messages out to this client
            push = pushes.recv() => {
                match push {
                    Ok(message) => {
                        if let Ok(json) = serde_json::to_string(&message) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Lagging drops pushes for this client only, not fatal
                        debug!(client = %client, skipped, "Push channel lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // Handle requests from this client
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let response = state.dispatcher.dispatch(text.as_str());
                        if let Ok(json) = serde_json::to_string(&response) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(client = %client, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.hub.unregister(&client);
    info!(client = %client, "WebSocket client disconnected");
}
