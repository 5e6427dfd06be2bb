// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket stream of desk events for one bus channel.
//!
//! Clients pick the channel in the query string:
//! `/ws?channel=room:10`, `/ws?channel=ticket:XN-0001`, `/ws?channel=dashboard`,
//! `/ws?channel=all_rooms` or `/ws?channel=display:lobby`.
//!
//! Server -> Client (JSON, one event per text frame):
//! ```json
//! {"type": "ticket_called", "ticket_id": 4, "number": "XN-U0001", "room_id": 10, ...}
//! ```

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use qdesk_bus::{Channel, EventBus};
use qdesk_core::DeskEvent;

use crate::server::GatewayState;

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub channel: String,
}

/// WebSocket upgrade handler. Unknown channel names are refused before upgrading.
pub async fn ws_handler(
    Query(params): Query<WsParams>,
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> Response {
    let channel: Channel = match params.channel.parse() {
        Ok(channel) => channel,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let bus = Arc::clone(&state.bus);
    ws.on_upgrade(move |socket| handle_socket(socket, bus, channel))
}

/// Forwards bus events to the client until either side closes.
async fn handle_socket(socket: WebSocket, bus: Arc<EventBus>, channel: Channel) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut events = bus.subscribe(channel.clone());
    tracing::debug!(%channel, "websocket subscribed");

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    let Some(frame) = encode(&event) else { continue };
                    if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%channel, skipped, "websocket subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Subscriptions are read-only; client frames are ignored.
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(%channel, "websocket closed");
}

fn encode(event: &DeskEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(kind = event.kind(), error = %e, "event not serializable");
            None
        }
    }
}
