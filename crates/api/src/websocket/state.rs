//! Global WebSocket state management
//!
//! Maintains global state for all WebSocket connections and rooms.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::Connection;
use super::room::RoomManager;

/// Global WebSocket state shared across all connections
#[derive(Clone)]
pub struct WebSocketState {
    /// All active connections indexed by session_id
    pub connections: Arc<RwLock<HashMap<Uuid, Arc<Connection>>>>,

    /// Room manager for channel subscriptions
    pub rooms: Arc<RoomManager>,
}

impl WebSocketState {
    /// Create new WebSocket state
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RoomManager::new()),
        }
    }

    /// Add a connection
    pub async fn add_connection(&self, conn: Connection) -> Arc<Connection> {
        let conn = Arc::new(conn);
        let mut connections = self.connections.write().await;
        connections.insert(conn.session_id, Arc::clone(&conn));

        tracing::info!(
            session_id = %conn.session_id,
            user_id = %conn.user_id,
            is_agent = conn.is_agent,
            total_connections = connections.len(),
            "WebSocket connection added"
        );

        conn
    }

    /// Remove a connection
    pub async fn remove_connection(&self, session_id: &Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.remove(session_id) {
            // Also remove from all rooms
            self.rooms.remove_connection(session_id).await;

            tracing::info!(
                session_id = %session_id,
                user_id = %conn.user_id,
                remaining_connections = connections.len(),
                "WebSocket connection removed"
            );
        }
    }

    /// Get total number of active connections
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

impl Default for WebSocketState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use helpdesk_engine::Channel;
    use helpdesk_shared::UserId;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_add_and_remove_connection() {
        let state = WebSocketState::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let user_id = UserId::new();

        let conn = Connection::new(user_id, false, tx);
        let session_id = conn.session_id;

        let added = state.add_connection(conn).await;
        assert_eq!(state.connection_count().await, 1);
        assert_eq!(added.user_id, user_id);

        state.remove_connection(&session_id).await;
        assert_eq!(state.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_connection_clears_rooms() {
        let state = WebSocketState::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let conn = state
            .add_connection(Connection::new(UserId::new(), true, tx))
            .await;
        state.rooms.join(Channel::AllAgents, Arc::clone(&conn)).await;
        assert_eq!(state.rooms.room_size(Channel::AllAgents).await, 1);

        state.remove_connection(&conn.session_id).await;
        assert_eq!(state.rooms.room_size(Channel::AllAgents).await, 0);
    }
}
