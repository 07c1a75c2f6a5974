//! WebSocket connection management
//!
//! Represents an active WebSocket connection and its send channel.

use helpdesk_shared::UserId;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Represents an active WebSocket connection
#[derive(Debug)]
pub struct Connection {
    /// Unique session ID for this connection
    pub session_id: Uuid,

    /// Authenticated user ID
    pub user_id: UserId,

    /// Whether the user holds an agent or admin role
    pub is_agent: bool,

    /// Channel to send events to this connection
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    /// Create a new connection
    pub fn new(user_id: UserId, is_agent: bool, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            is_agent,
            sender,
        }
    }

    /// Send an event to this connection
    ///
    /// Returns Ok(()) if sent successfully, Err if connection is closed
    #[allow(clippy::result_large_err)] // Error type is from tokio mpsc, containing the failed event
    pub fn send(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<ServerEvent>> {
        self.sender.send(event)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new(UserId::new(), false, tx);

        conn.send(ServerEvent::Pong).unwrap();
        assert!(matches!(rx.try_recv().unwrap(), ServerEvent::Pong));
    }

    #[tokio::test]
    async fn test_send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::new(UserId::new(), true, tx);
        drop(rx);

        assert!(conn.send(ServerEvent::Pong).is_err());
    }
}
