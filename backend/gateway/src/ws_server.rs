//! WebSocket entrypoint and connection handler.
//!
//! Each socket gets a fresh identity, a writer task fed by the session
//! registry, and a reader loop that validates frames and forwards them to
//! the signal hub. Whichever side stops first ends the connection.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tandem_core::{ConnectionId, OutboundEvent};

use crate::server::GatewayState;
use crate::ws_protocol::{decode_frame, encode_event, error_event};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: GatewayState) {
    let id = ConnectionId::generate();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEvent>();

    // The writer must be registered before the hub greets the connection.
    state.sessions.register(id.clone(), tx.clone()).await;
    if let Err(e) = state.hub.connect(id.clone()).await {
        error!(connection_id = %id, error = %e, "Rejecting connection");
        state.sessions.unregister(&id).await;
        return;
    }
    info!(connection_id = %id, "WebSocket connection opened");

    let send_id = id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match encode_event(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(connection_id = %send_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let hub = state.hub.clone();
    let recv_id = id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode_frame(&text) {
                    Ok(event) => {
                        debug!(connection_id = %recv_id, event = event.name(), "Inbound event");
                        if hub.submit(recv_id.clone(), event).await.is_err() {
                            return "hub unavailable".to_string();
                        }
                    }
                    Err(err) => {
                        warn!(connection_id = %recv_id, error = %err, "Rejected inbound frame");
                        let _ = tx.send(error_event(&err));
                    }
                },
                Ok(Message::Close(frame)) => {
                    return frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "client closed".to_string());
                }
                Ok(_) => {} // binary, ping and pong carry nothing for us
                Err(e) => return format!("transport error: {e}"),
            }
        }
        "transport closed".to_string()
    });

    // If either task exits, abort the other.
    let reason = tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            "send failed".to_string()
        }
        result = (&mut recv_task) => {
            send_task.abort();
            result.unwrap_or_else(|_| "reader aborted".to_string())
        }
    };

    if let Err(e) = state.hub.disconnect(id.clone(), reason.clone()).await {
        warn!(connection_id = %id, error = %e, "Could not report disconnect");
    }
    state.sessions.unregister(&id).await;

    info!(connection_id = %id, reason = %reason, "WebSocket connection closed");
}
