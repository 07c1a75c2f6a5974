//! Engine-to-WebSocket transport adapter
//!
//! Implements the engine's [`Transport`] trait by mapping engine channels
//! onto WebSocket rooms. Delivery failures stay local to this layer; the
//! engine treats publish as best-effort.

use async_trait::async_trait;
use helpdesk_engine::{Channel, EventKind, QueueEvent, Transport};

use super::events::ServerEvent;
use super::state::WebSocketState;

/// Routes engine events onto WebSocket channel rooms.
pub struct WsTransport {
    ws: WebSocketState,
}

impl WsTransport {
    pub fn new(ws: WebSocketState) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn publish(&self, channel: Channel, event: QueueEvent) -> anyhow::Result<()> {
        let server_event = match event.kind {
            EventKind::QueueUpdate => ServerEvent::QueueUpdate {
                queue_length: event.payload["queue_length"].as_u64().unwrap_or(0),
            },
            kind => ServerEvent::TicketEvent {
                event_type: kind.as_str().to_string(),
                data: event.payload,
            },
        };

        self.ws.rooms.broadcast(channel, server_event).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::websocket::connection::Connection;
    use helpdesk_shared::UserId;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_queue_event_maps_to_queue_update() {
        let ws = WebSocketState::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Connection::new(UserId::new(), false, tx));
        ws.rooms.join(Channel::Queue, conn).await;

        let transport = WsTransport::new(ws);
        transport
            .publish(
                Channel::Queue,
                QueueEvent {
                    kind: EventKind::QueueUpdate,
                    payload: json!({ "queue_length": 7 }),
                },
            )
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            ServerEvent::QueueUpdate { queue_length } => assert_eq!(queue_length, 7),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ticket_event_carries_kind_and_payload() {
        let ws = WebSocketState::new();
        let user = UserId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Connection::new(user, false, tx));
        ws.rooms.join(Channel::User(user), conn).await;

        let transport = WsTransport::new(ws);
        transport
            .publish(
                Channel::User(user),
                QueueEvent {
                    kind: EventKind::TicketAssigned,
                    payload: json!({ "ticket_number": "TKT-1" }),
                },
            )
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            ServerEvent::TicketEvent { event_type, data } => {
                assert_eq!(event_type, "ticket_assigned");
                assert_eq!(data["ticket_number"], "TKT-1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
