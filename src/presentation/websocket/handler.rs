//! WebSocket Connection Handler
//!
//! Authenticates the upgrade, then runs one reader loop and one writer task
//! per connection.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::interval;

use super::gateway::{ConnectionId, Gateway};
use super::messages::{ClientEvent, ServerEvent};
use super::session::SessionState;
use crate::application::dto::{JoinRoomRequest, SendMessageRequest};
use crate::application::services::{decode_token, ChatError, ChatService};
use crate::infrastructure::metrics;
use crate::presentation::middleware::bearer_token;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Query string of the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// WebSocket upgrade handler. The token comes from `?token=` or an
/// `Authorization: Bearer` header and is checked before upgrading.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = params
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&headers))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let claims = decode_token(&state.settings.jwt.secret, token)?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let max_message_size = state.settings.websocket.max_message_size;
    let max_frame_size = state.settings.websocket.max_frame_size;
    let username = claims.username;

    Ok(ws
        .max_message_size(max_message_size)
        .max_frame_size(max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, username)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, username: String) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let heartbeat_ms = state.gateway.heartbeat_interval();
    let connection_id = state.gateway.register(&username, tx);
    let mut session = SessionState::new(username, heartbeat_ms);
    metrics::WS_CONNECTIONS_ACTIVE.inc();

    tracing::info!(
        connection_id = %connection_id,
        username = %session.username,
        "WebSocket connected"
    );

    // Forward queued events to the socket and keep the peer pinging back
    let writer = tokio::spawn(async move {
        let mut ping = interval(Duration::from_millis(heartbeat_ms.max(1)));
        ping.tick().await;

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sink.close().await;
    });

    let mut liveness = interval(session.check_interval());
    liveness.tick().await;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                };
                session.touch();

                match message {
                    Message::Text(text) => {
                        dispatch_frame(
                            state.chat.as_ref(),
                            &state.gateway,
                            connection_id,
                            &session.username,
                            text.as_str(),
                        )
                        .await;
                    }
                    Message::Binary(_) => {
                        state.gateway.send_to(
                            connection_id,
                            ServerEvent::error("Binary frames are not supported"),
                        );
                    }
                    Message::Close(_) => break,
                    // Pings are answered by the protocol layer
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }

            _ = liveness.tick() => {
                if !session.is_alive() {
                    tracing::info!(connection_id = %connection_id, "Heartbeat timeout, closing connection");
                    break;
                }
            }
        }
    }

    state.gateway.unregister(connection_id);
    metrics::WS_CONNECTIONS_ACTIVE.dec();
    writer.abort();

    tracing::info!(
        connection_id = %connection_id,
        username = %session.username,
        "WebSocket disconnected"
    );
}

/// Handle one inbound text frame for a connection authenticated as
/// `identity`. Failures are answered with an `error` event to that
/// connection only.
pub async fn dispatch_frame(
    chat: &dyn ChatService,
    gateway: &Gateway,
    connection_id: ConnectionId,
    identity: &str,
    frame: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(frame) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Malformed frame");
            metrics::record_socket_event("malformed", false);
            gateway.send_to(connection_id, ServerEvent::error(format!("Malformed event: {}", e)));
            return;
        }
    };

    let name = event.name();
    let result = match event {
        ClientEvent::JoinRoom(request) => {
            join_room(chat, gateway, connection_id, identity, &request).await
        }
        ClientEvent::SendMessage(request) => {
            send_message(chat, gateway, connection_id, identity, &request).await
        }
    };
    metrics::record_socket_event(name, result.is_ok());

    if let Err(e) = result {
        match &e {
            ChatError::Store(inner) => tracing::error!(
                connection_id = %connection_id,
                username = %identity,
                event = name,
                error = %inner,
                "Socket event failed"
            ),
            other => tracing::warn!(
                connection_id = %connection_id,
                username = %identity,
                event = name,
                error = %other,
                "Socket event rejected"
            ),
        }
        gateway.send_to(connection_id, ServerEvent::error(e.client_message()));
    }
}

async fn join_room(
    chat: &dyn ChatService,
    gateway: &Gateway,
    connection_id: ConnectionId,
    identity: &str,
    request: &JoinRoomRequest,
) -> Result<(), ChatError> {
    let room = chat.open_room(identity, request).await?;

    // Subscribe before reading history so nothing sent meanwhile is lost
    gateway.join(connection_id, &room.key);

    let messages = chat.history(&room).await?;
    tracing::debug!(
        connection_id = %connection_id,
        room_key = %room.key,
        count = messages.len(),
        "Replaying history"
    );
    gateway.send_to(connection_id, ServerEvent::ChatHistory { messages });

    Ok(())
}

async fn send_message(
    chat: &dyn ChatService,
    gateway: &Gateway,
    connection_id: ConnectionId,
    identity: &str,
    request: &SendMessageRequest,
) -> Result<(), ChatError> {
    let (room, message) = chat.send(identity, request).await?;

    gateway.join(connection_id, &room.key);
    let delivered = gateway.broadcast(&room.key, &ServerEvent::Message(message));
    tracing::debug!(
        connection_id = %connection_id,
        room_key = %room.key,
        delivered,
        "Message broadcast"
    );

    Ok(())
}
