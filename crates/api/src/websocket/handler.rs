//! WebSocket handler for Axum
//!
//! Handles WebSocket connections, identity lookup, and event routing.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use helpdesk_engine::Channel;
use helpdesk_shared::{AgentId, AgentStatus, UserId};

use crate::state::AppState;

use super::{
    connection::Connection,
    events::{ClientEvent, ServerEvent},
};

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    user_id: Uuid,
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
///
/// Identifies the caller by user id and resolves their role from the users
/// table; agents get the agent channels and presence controls.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Query(params): Query<WebSocketQuery>,
) -> Result<Response, StatusCode> {
    let role = match sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
        .bind(params.user_id)
        .fetch_optional(&app_state.pool)
        .await
    {
        Ok(Some(role)) => role,
        Ok(None) => {
            tracing::warn!(user_id = %params.user_id, "WebSocket auth failed: user not found");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            tracing::error!(error = ?e, "WebSocket auth: database error");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let user_id = UserId::from(params.user_id);
    let is_agent = matches!(role.as_str(), "agent" | "admin");
    tracing::info!(user_id = %user_id, is_agent, "WebSocket connection upgrade requested");

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user_id, is_agent, app_state)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, user_id: UserId, is_agent: bool, app_state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending events to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let conn = Connection::new(user_id, is_agent, tx);
    let ws_state = app_state.ws.clone();
    let conn = ws_state.add_connection(conn).await;
    let session_id = conn.session_id;

    // Every connection follows its own user channel; agents additionally
    // follow their direct channel and the all-agents broadcast.
    ws_state
        .rooms
        .join(Channel::User(user_id), Arc::clone(&conn))
        .await;
    let agent_id = AgentId::from(user_id.0);
    if is_agent {
        ws_state
            .rooms
            .join(Channel::Agent(agent_id), Arc::clone(&conn))
            .await;
        ws_state
            .rooms
            .join(Channel::AllAgents, Arc::clone(&conn))
            .await;
        // Connecting counts as presence.
        app_state
            .scheduler
            .set_agent_status(agent_id, AgentStatus::Online)
            .await;
    }

    // Send connection acknowledgment
    let _ = conn.send(ServerEvent::Connected { session_id });

    // Spawn task to send messages to client
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize WebSocket event");
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    handle_client_event(event, Arc::clone(&conn), &app_state).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        message = %text,
                        "Failed to parse client event"
                    );
                    let _ = conn.send(ServerEvent::Error {
                        message: "Invalid event format".to_string(),
                    });
                }
            },
            Message::Close(_) => {
                tracing::info!(session_id = %session_id, "WebSocket close frame received");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                // Axum handles ping/pong automatically
            }
            _ => {} // Ignore binary messages
        }
    }

    // Cleanup on disconnect
    tracing::info!(session_id = %session_id, user_id = %user_id, "WebSocket connection closing");
    ws_state.remove_connection(&session_id).await;

    if is_agent {
        app_state
            .scheduler
            .set_agent_status(agent_id, AgentStatus::Offline)
            .await;
    }

    send_task.abort();
}

/// Handle client event
async fn handle_client_event(event: ClientEvent, conn: Arc<Connection>, app_state: &AppState) {
    match event {
        ClientEvent::Ping => {
            let _ = conn.send(ServerEvent::Pong);
        }

        ClientEvent::WatchQueue => {
            app_state
                .ws
                .rooms
                .join(Channel::Queue, Arc::clone(&conn))
                .await;
        }

        ClientEvent::UnwatchQueue => {
            app_state
                .ws
                .rooms
                .leave(Channel::Queue, &conn.session_id)
                .await;
        }

        ClientEvent::SetPresence { status } => {
            if !conn.is_agent {
                let _ = conn.send(ServerEvent::Error {
                    message: "Only agents can set presence".to_string(),
                });
                return;
            }

            let Ok(status) = status.parse::<AgentStatus>() else {
                let _ = conn.send(ServerEvent::Error {
                    message: "Invalid status. Must be online, away, busy, or offline".to_string(),
                });
                return;
            };

            app_state
                .scheduler
                .set_agent_status(AgentId::from(conn.user_id.0), status)
                .await;
        }
    }
}
