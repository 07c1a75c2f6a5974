//! Boundary traits supplied by the host application
//!
//! The engine never talks to storage or the network directly; it records
//! state changes through [`TicketStore`], resolves identity through
//! [`AgentDirectory`], and reaches subscribers through [`Transport`].
//! Persistence is fire-and-forget from the scheduler's perspective: writes
//! are handed off after the in-memory transition commits and are never read
//! back for verification.

use async_trait::async_trait;
use helpdesk_shared::{AgentId, AssignmentEvent, StatusChange, Ticket};

use crate::hub::{Channel, QueueEvent};

/// Durable record of tickets and their audit trails.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a newly created ticket.
    async fn save_ticket(&self, ticket: &Ticket) -> anyhow::Result<()>;

    /// Persist the current state of an existing ticket.
    async fn update_ticket(&self, ticket: &Ticket) -> anyhow::Result<()>;

    /// Append an assignment/transfer audit record.
    async fn record_assignment_event(&self, event: &AssignmentEvent) -> anyhow::Result<()>;

    /// Append a status-transition audit record.
    async fn record_status_change(&self, change: &StatusChange) -> anyhow::Result<()>;
}

/// Identity and authorization, external to the engine.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Whether the given id belongs to a support agent.
    async fn is_admin(&self, agent_id: AgentId) -> anyhow::Result<bool>;

    /// Default per-agent concurrency limit for lazily created records.
    fn default_capacity(&self) -> u32;
}

/// Mechanism the notification hub uses to reach subscribers.
///
/// The engine is agnostic to whether this is a duplex-connection fan-out or a
/// message bus; payloads are opaque `(event kind, JSON)` pairs.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, channel: Channel, event: QueueEvent) -> anyhow::Result<()>;
}
