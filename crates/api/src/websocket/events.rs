//! WebSocket event types and serialization
//!
//! Defines all client-to-server and server-to-client event types
//! with type-safe serde serialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Heartbeat ping to keep connection alive
    Ping,

    /// Start receiving queue-length updates
    WatchQueue,

    /// Stop receiving queue-length updates
    UnwatchQueue,

    /// Set agent presence status (agents only)
    SetPresence {
        status: String, // "online" | "away" | "busy" | "offline"
    },
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection acknowledged
    Connected { session_id: Uuid },

    /// Heartbeat response
    Pong,

    /// Error message
    Error { message: String },

    /// Ticket lifecycle event forwarded from the scheduling engine
    TicketEvent { event_type: String, data: Value },

    /// Queue length changed
    QueueUpdate { queue_length: u64 },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_deserialization() {
        let json = r#"{"type":"set_presence","status":"away"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::SetPresence { status } => assert_eq!(status, "away"),
            _ => panic!("Expected SetPresence event"),
        }

        let json = r#"{"type":"watch_queue"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(json).unwrap(),
            ClientEvent::WatchQueue
        ));
    }

    #[test]
    fn test_server_event_serialization() {
        let event = ServerEvent::Pong;
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_queue_update_serialization() {
        let event = ServerEvent::QueueUpdate { queue_length: 4 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("queue_update"));
        assert!(json.contains("4"));
    }
}
