//! WebSocket streaming of the negotiation trace.
//!
//! Connect to `/api/schedule/ws/trace` to receive every
//! [`ProtocolMessage`] the engine emits, across all sessions, as JSON
//! text frames. The stream is broadcast-backed: a client that cannot
//! keep up lags and skips messages rather than stalling the engine.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use unimerge_protocol::ProtocolMessage;

use crate::api::AppState;

/// WebSocket handler for live trace updates.
pub async fn ws_trace_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_trace_socket(socket, state))
}

/// Handle a WebSocket connection subscribed to the trace.
async fn handle_trace_socket(mut socket: WebSocket, state: AppState) {
    info!("trace client connected");
    let mut rx = state.engine.subscribe_trace();

    loop {
        tokio::select! {
            // Handle incoming frames from the client
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("received from trace client: {}", text);
                        // The stream is one-way; client text is ignored.
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("trace client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            warn!("failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("websocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            // Forward engine emissions
            message = rx.recv() => {
                match message {
                    Ok(message) => {
                        if let Err(e) = send_message(&mut socket, &message).await {
                            warn!("failed to send trace message: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "trace client lagging, messages skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("trace channel closed");
                        break;
                    }
                }
            }
        }
    }
}

/// Send one trace message over the socket as a JSON text frame.
async fn send_message(
    socket: &mut WebSocket,
    message: &ProtocolMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(|e| {
        axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    socket.send(Message::Text(json)).await
}
