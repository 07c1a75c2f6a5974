//! Channel room management for pub/sub
//!
//! Manages per-channel "rooms" for broadcasting engine events to all
//! subscribed connections.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use helpdesk_engine::Channel;

use super::connection::Connection;
use super::events::ServerEvent;

/// Manages channel rooms for broadcasting events
pub struct RoomManager {
    /// Map of engine channel -> list of connections
    rooms: Arc<RwLock<HashMap<Channel, Vec<Arc<Connection>>>>>,
}

impl RoomManager {
    /// Create a new room manager
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a connection to a channel room
    pub async fn join(&self, channel: Channel, conn: Arc<Connection>) {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(channel).or_default();
        if room.iter().any(|c| c.session_id == conn.session_id) {
            return;
        }
        room.push(Arc::clone(&conn));

        tracing::debug!(
            channel = %channel,
            session_id = %conn.session_id,
            room_size = room.len(),
            "Connection joined channel room"
        );
    }

    /// Remove a connection from a channel room
    pub async fn leave(&self, channel: Channel, session_id: &Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(conns) = rooms.get_mut(&channel) {
            conns.retain(|c| c.session_id != *session_id);

            // Clean up empty rooms
            if conns.is_empty() {
                rooms.remove(&channel);
            } else {
                tracing::debug!(
                    channel = %channel,
                    session_id = %session_id,
                    room_size = conns.len(),
                    "Connection left channel room"
                );
            }
        }
    }

    /// Broadcast an event to all connections in a channel room
    ///
    /// Silently ignores send errors (closed connections will be cleaned up)
    pub async fn broadcast(&self, channel: Channel, event: ServerEvent) {
        let rooms = self.rooms.read().await;
        let Some(conns) = rooms.get(&channel) else {
            tracing::debug!(channel = %channel, "No subscribers for channel");
            return;
        };

        let mut failed_count = 0;
        for conn in conns {
            if conn.send(event.clone()).is_err() {
                failed_count += 1;
            }
        }

        if failed_count > 0 {
            tracing::warn!(
                channel = %channel,
                failed = failed_count,
                "Some subscribers unreachable (likely closed)"
            );
        }
    }

    /// Remove a connection from all rooms
    pub async fn remove_connection(&self, session_id: &Uuid) {
        let mut rooms = self.rooms.write().await;
        for conns in rooms.values_mut() {
            conns.retain(|c| c.session_id != *session_id);
        }
        rooms.retain(|_, conns| !conns.is_empty());
    }

    /// Get room size (number of connections) for a channel
    pub async fn room_size(&self, channel: Channel) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(&channel).map(|v| v.len()).unwrap_or(0)
    }

    /// Get total number of active rooms
    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use helpdesk_shared::UserId;
    use tokio::sync::mpsc;

    fn connection() -> (Arc<Connection>, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Connection::new(UserId::new(), false, tx)), rx)
    }

    #[tokio::test]
    async fn test_room_join_and_leave() {
        let rooms = RoomManager::new();
        let (conn, _rx) = connection();

        assert_eq!(rooms.room_size(Channel::Queue).await, 0);

        rooms.join(Channel::Queue, Arc::clone(&conn)).await;
        assert_eq!(rooms.room_size(Channel::Queue).await, 1);

        // Joining twice does not duplicate the subscription.
        rooms.join(Channel::Queue, Arc::clone(&conn)).await;
        assert_eq!(rooms.room_size(Channel::Queue).await, 1);

        rooms.leave(Channel::Queue, &conn.session_id).await;
        assert_eq!(rooms.room_size(Channel::Queue).await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_to_room() {
        let rooms = RoomManager::new();
        let (conn1, mut rx1) = connection();
        let (conn2, mut rx2) = connection();

        rooms.join(Channel::AllAgents, conn1).await;
        rooms.join(Channel::AllAgents, conn2).await;

        rooms
            .broadcast(Channel::AllAgents, ServerEvent::Pong)
            .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_remove_connection_from_all_rooms() {
        let rooms = RoomManager::new();
        let (conn, _rx) = connection();
        let user = conn.user_id;

        rooms.join(Channel::User(user), Arc::clone(&conn)).await;
        rooms.join(Channel::Queue, Arc::clone(&conn)).await;
        assert_eq!(rooms.room_count().await, 2);

        rooms.remove_connection(&conn.session_id).await;
        assert_eq!(rooms.room_count().await, 0);
    }
}
