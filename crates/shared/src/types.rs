//! Common types used across the helpdesk platform

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// Ticket ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TicketId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Agent ID wrapper
///
/// Ordered so that scheduling tie-breaks on agent id are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AgentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// User ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Order ID wrapper (tickets may reference the order they concern)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Ticket category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    General,
    Order,
    Payment,
    Account,
    Technical,
    Refund,
    Other,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::General => "general",
            TicketCategory::Order => "order",
            TicketCategory::Payment => "payment",
            TicketCategory::Account => "account",
            TicketCategory::Technical => "technical",
            TicketCategory::Refund => "refund",
            TicketCategory::Other => "other",
        }
    }
}

impl Default for TicketCategory {
    fn default() -> Self {
        Self::General
    }
}

/// Ticket priority, ordered LOW < MEDIUM < HIGH < URGENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }

    /// Numeric weight used for queue scoring: a higher-priority tier always
    /// dominates arrival order.
    pub fn weight(&self) -> u8 {
        match self {
            TicketPriority::Low => 1,
            TicketPriority::Medium => 2,
            TicketPriority::High => 3,
            TicketPriority::Urgent => 4,
        }
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Ticket lifecycle status
///
/// OPEN is the initial state and remains the state while a ticket waits in
/// the queue. CLOSED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Pending,
    Waiting,
    Resolved,
    Closed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Pending => "pending",
            TicketStatus::Waiting => "waiting",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal tickets accept no further transitions or messages.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Closed | TicketStatus::Cancelled)
    }

    /// True before any agent has been assigned (queueable states).
    pub fn is_pre_assignment(&self) -> bool {
        matches!(self, TicketStatus::Open)
    }

    /// True while the ticket counts against its agent's concurrency limit.
    pub fn occupies_slot(&self) -> bool {
        matches!(
            self,
            TicketStatus::InProgress | TicketStatus::Pending | TicketStatus::Waiting
        )
    }
}

/// Live agent presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Away,
    Busy,
    Offline,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Online => "online",
            AgentStatus::Away => "away",
            AgentStatus::Busy => "busy",
            AgentStatus::Offline => "offline",
        }
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(AgentStatus::Online),
            "away" => Ok(AgentStatus::Away),
            "busy" => Ok(AgentStatus::Busy),
            "offline" => Ok(AgentStatus::Offline),
            _ => Err(()),
        }
    }
}

/// Who performed a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    User(UserId),
    Agent(AgentId),
    System,
}

// =============================================================================
// Records
// =============================================================================

/// A support ticket as tracked by the scheduling core.
///
/// Invariants: `IN_PROGRESS` or later implies `assigned_to` is set;
/// `queue_position > 0` implies the ticket is unassigned and still OPEN.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Human-readable number, unique and immutable once issued.
    pub ticket_number: String,
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub requester: UserId,
    pub order_id: Option<OrderId>,
    pub assigned_to: Option<AgentId>,
    /// 1-indexed rank among queued tickets; 0 when assigned or terminal.
    pub queue_position: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub first_response_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub resolved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub closed_at: Option<OffsetDateTime>,
    /// Satisfaction rating (1-5), optionally left when closing.
    pub rating: Option<u8>,
    pub feedback: Option<String>,
}

/// Per-agent availability record, created lazily on the first scheduling
/// interaction and never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct AgentAvailability {
    pub agent_id: AgentId,
    pub status: AgentStatus,
    pub max_tickets: u32,
    pub current_tickets: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
}

impl AgentAvailability {
    /// True when the agent can accept another ticket.
    pub fn can_accept(&self) -> bool {
        self.status == AgentStatus::Online && self.current_tickets < self.max_tickets
    }
}

/// Append-only audit record written on every assignment or transfer.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentEvent {
    pub ticket_id: TicketId,
    pub from_agent: Option<AgentId>,
    pub to_agent: Option<AgentId>,
    /// None for system auto-assignment.
    pub performed_by: Option<AgentId>,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

/// Append-only audit record written on status transitions.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub ticket_id: TicketId,
    pub from_status: TicketStatus,
    pub to_status: TicketStatus,
    pub changed_by: Actor,
    pub reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}
