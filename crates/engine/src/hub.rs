//! Notification fan-out
//!
//! Events are a closed set of kind tags with opaque JSON payloads, published
//! to one of four channels. Delivery is best-effort and non-blocking with
//! respect to the scheduling operation that produced the event: callers hand
//! events to a single dispatcher task over an unbounded channel, so the
//! ticket/queue state change never waits on (or rolls back for) delivery.
//! The single dispatcher preserves per-ticket generation order.

use std::fmt;
use std::sync::Arc;

use helpdesk_shared::{AgentId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::store::Transport;

/// Destination for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The requester of a ticket.
    User(UserId),
    /// One specific agent.
    Agent(AgentId),
    /// All connected agents.
    AllAgents,
    /// Everyone watching the queue (waiting users, dashboards).
    Queue,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::User(id) => write!(f, "user:{id}"),
            Channel::Agent(id) => write!(f, "agent:{id}"),
            Channel::AllAgents => write!(f, "agents:online"),
            Channel::Queue => write!(f, "queue"),
        }
    }
}

/// Closed set of event kinds pushed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TicketQueued,
    TicketAssigned,
    NewTicket,
    NewMessage,
    AdminReply,
    StatusChanged,
    TicketClosed,
    TicketCancelled,
    QueueUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TicketQueued => "ticket_queued",
            EventKind::TicketAssigned => "ticket_assigned",
            EventKind::NewTicket => "new_ticket",
            EventKind::NewMessage => "new_message",
            EventKind::AdminReply => "admin_reply",
            EventKind::StatusChanged => "status_changed",
            EventKind::TicketClosed => "ticket_closed",
            EventKind::TicketCancelled => "ticket_cancelled",
            EventKind::QueueUpdate => "queue_update",
        }
    }
}

/// An event kind plus its opaque payload; the host defines the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEvent {
    pub kind: EventKind,
    pub payload: Value,
}

/// Fan-out broadcaster for ticket and queue events.
pub struct NotificationHub {
    tx: mpsc::UnboundedSender<(Channel, QueueEvent)>,
}

impl NotificationHub {
    /// Spawn the dispatcher task. Must be called within a Tokio runtime.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Channel, QueueEvent)>();

        tokio::spawn(async move {
            while let Some((channel, event)) = rx.recv().await {
                if let Err(err) = transport.publish(channel, event).await {
                    tracing::warn!(
                        channel = %channel,
                        error = %err,
                        "Notification delivery failed; event dropped"
                    );
                }
            }
        });

        Self { tx }
    }

    pub fn notify_user(&self, user_id: UserId, kind: EventKind, payload: Value) {
        self.send(Channel::User(user_id), kind, payload);
    }

    pub fn notify_agent(&self, agent_id: AgentId, kind: EventKind, payload: Value) {
        self.send(Channel::Agent(agent_id), kind, payload);
    }

    pub fn broadcast_to_agents(&self, kind: EventKind, payload: Value) {
        self.send(Channel::AllAgents, kind, payload);
    }

    pub fn broadcast_queue_length(&self, length: usize) {
        self.send(
            Channel::Queue,
            EventKind::QueueUpdate,
            serde_json::json!({ "queue_length": length }),
        );
    }

    fn send(&self, channel: Channel, kind: EventKind, payload: Value) {
        if self
            .tx
            .send((channel, QueueEvent { kind, payload }))
            .is_err()
        {
            tracing::warn!(channel = %channel, "Notification dispatcher stopped; event dropped");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingTransport {
        published: Mutex<Vec<(Channel, QueueEvent)>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn publish(&self, channel: Channel, event: QueueEvent) -> anyhow::Result<()> {
            self.published.lock().unwrap().push((channel, event));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let transport = Arc::new(RecordingTransport {
            published: Mutex::new(Vec::new()),
        });
        let hub = NotificationHub::new(Arc::clone(&transport) as Arc<dyn Transport>);
        let user = UserId::new();

        hub.notify_user(user, EventKind::TicketQueued, serde_json::json!({"p": 1}));
        hub.notify_user(user, EventKind::TicketAssigned, serde_json::json!({"p": 2}));
        hub.broadcast_queue_length(3);

        // Dispatcher runs on a background task; give it a moment.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let published = transport.published.lock().unwrap();
        assert_eq!(published.len(), 3);
        assert_eq!(published[0].1.kind, EventKind::TicketQueued);
        assert_eq!(published[1].1.kind, EventKind::TicketAssigned);
        assert_eq!(published[2].0, Channel::Queue);
        assert_eq!(published[2].1.payload["queue_length"], 3);
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn publish(&self, _channel: Channel, _event: QueueEvent) -> anyhow::Result<()> {
            anyhow::bail!("subscriber gone")
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_panic_or_block() {
        let hub = NotificationHub::new(Arc::new(FailingTransport));
        hub.broadcast_to_agents(EventKind::NewTicket, serde_json::json!({}));
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Still usable after a failed publish.
        hub.broadcast_queue_length(0);
    }
}
