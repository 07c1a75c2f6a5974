//! Assignment scheduler
//!
//! Owns the ticket lifecycle state machine, the auto-assignment path, and
//! the queue drain loop. All in-memory state (queue, agent registry, live
//! ticket table) lives behind one core lock; every transition, reservation,
//! and the entire drain run under that lock so concurrent operations
//! linearize. Effects (storage writes, notifications) are handed to
//! background tasks over non-blocking channels before the lock is released,
//! so per-ticket delivery order matches commit order; the actual I/O runs
//! off-lock in those tasks.

use std::collections::HashMap;
use std::sync::Arc;

use helpdesk_shared::{
    Actor, AgentAvailability, AgentId, AgentStatus, AssignmentEvent, OrderId, StatusChange,
    Ticket, TicketCategory, TicketId, TicketPriority, TicketStatus, UserId,
};
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::hub::{EventKind, NotificationHub};
use crate::persist::{PersistHandle, PersistOp};
use crate::queue::PriorityQueue;
use crate::registry::AgentRegistry;
use crate::stats::{QueueStats, AVERAGE_WAIT_WINDOW, DEFAULT_AVERAGE_WAIT_MINUTES};
use crate::store::{AgentDirectory, TicketStore, Transport};

const MAX_SUBJECT_LENGTH: usize = 500;
const MAX_MESSAGE_LENGTH: usize = 50_000;

/// Estimated wait surfaced to queued users, minutes per position ahead.
const ESTIMATED_WAIT_PER_POSITION_MINUTES: u32 = 5;

/// Fields supplied by the requester-facing entry point when opening a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub requester: UserId,
    pub subject: String,
    pub message: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub order_id: Option<OrderId>,
}

/// Mutable state guarded by the core lock.
struct Core {
    queue: PriorityQueue,
    registry: AgentRegistry,
    tickets: HashMap<TicketId, Ticket>,
}

impl Core {
    /// Re-stamp stored queue positions from the live queue order.
    fn refresh_positions(&mut self) {
        let ordered: Vec<TicketId> = self.queue.iter().collect();
        for (rank, ticket_id) in ordered.iter().enumerate() {
            if let Some(ticket) = self.tickets.get_mut(ticket_id) {
                ticket.queue_position = (rank + 1) as u32;
            }
        }
    }
}

/// The scheduling core: admission, auto-assignment, manual take/transfer,
/// reply and close flows, and the capacity-release drain loop.
pub struct AssignmentScheduler {
    core: Mutex<Core>,
    hub: NotificationHub,
    persist: PersistHandle,
    directory: Arc<dyn AgentDirectory>,
    clock: Arc<dyn Clock>,
}

impl AssignmentScheduler {
    /// Wire the scheduler to its collaborators. Spawns the notification
    /// dispatcher and persistence worker, so this must run inside a Tokio
    /// runtime.
    pub fn new(
        store: Arc<dyn TicketStore>,
        directory: Arc<dyn AgentDirectory>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            core: Mutex::new(Core {
                queue: PriorityQueue::new(),
                registry: AgentRegistry::new(),
                tickets: HashMap::new(),
            }),
            hub: NotificationHub::new(transport),
            persist: PersistHandle::spawn(store),
            directory,
            clock,
        }
    }

    // =========================================================================
    // Ticket admission
    // =========================================================================

    /// Create a ticket: validate, try immediate auto-assignment, otherwise
    /// enqueue at the priority-derived position.
    pub async fn create_ticket(&self, req: NewTicket) -> EngineResult<Ticket> {
        let subject = req.subject.trim();
        if subject.is_empty() {
            return Err(EngineError::Validation("subject cannot be empty".into()));
        }
        if subject.len() > MAX_SUBJECT_LENGTH {
            return Err(EngineError::Validation(format!(
                "subject too long (max {MAX_SUBJECT_LENGTH} characters)"
            )));
        }
        if req.message.trim().is_empty() {
            return Err(EngineError::Validation("message cannot be empty".into()));
        }
        if req.message.len() > MAX_MESSAGE_LENGTH {
            return Err(EngineError::Validation(format!(
                "message too long (max {MAX_MESSAGE_LENGTH} characters)"
            )));
        }

        let now = self.clock.now();
        let mut ticket = Ticket {
            id: TicketId::new(),
            ticket_number: generate_ticket_number(now),
            subject: subject.to_string(),
            category: req.category,
            priority: req.priority,
            status: TicketStatus::Open,
            requester: req.requester,
            order_id: req.order_id,
            assigned_to: None,
            queue_position: 0,
            created_at: now,
            updated_at: now,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            rating: None,
            feedback: None,
        };

        let mut core = self.core.lock().await;

        let assignee = core.registry.find_available();
        match assignee {
            Some(agent_id) if core.registry.try_reserve(agent_id, now) => {
                ticket.assigned_to = Some(agent_id);
                ticket.status = TicketStatus::InProgress;
            }
            _ => {
                ticket.queue_position = core.queue.insert(ticket.id, ticket.priority, now) as u32;
            }
        }
        core.tickets.insert(ticket.id, ticket.clone());
        core.refresh_positions();
        let queue_len = core.queue.len();

        // Effect hand-offs are synchronous channel sends; making them before
        // the lock drops keeps delivery order aligned with commit order when
        // operations race on the same ticket.
        self.persist.enqueue(PersistOp::SaveTicket(ticket.clone()));

        if let Some(agent_id) = ticket.assigned_to {
            self.persist
                .enqueue(PersistOp::AssignmentEvent(AssignmentEvent {
                    ticket_id: ticket.id,
                    from_agent: None,
                    to_agent: Some(agent_id),
                    performed_by: None,
                    reason: "auto-assigned".to_string(),
                    at: now,
                }));
            self.hub.notify_user(
                ticket.requester,
                EventKind::TicketAssigned,
                json!({
                    "ticket_id": ticket.id,
                    "ticket_number": ticket.ticket_number,
                    "agent_id": agent_id,
                }),
            );
            tracing::info!(
                ticket_id = %ticket.id,
                ticket_number = %ticket.ticket_number,
                agent_id = %agent_id,
                "Ticket auto-assigned on creation"
            );
        } else {
            self.hub.notify_user(
                ticket.requester,
                EventKind::TicketQueued,
                json!({
                    "ticket_id": ticket.id,
                    "ticket_number": ticket.ticket_number,
                    "queue_position": ticket.queue_position,
                    "estimated_wait_minutes":
                        ticket.queue_position * ESTIMATED_WAIT_PER_POSITION_MINUTES,
                }),
            );
            self.hub.broadcast_queue_length(queue_len);
            tracing::info!(
                ticket_id = %ticket.id,
                ticket_number = %ticket.ticket_number,
                queue_position = ticket.queue_position,
                "Ticket queued (no agent capacity)"
            );
        }

        self.hub.broadcast_to_agents(
            EventKind::NewTicket,
            json!({
                "ticket_id": ticket.id,
                "ticket_number": ticket.ticket_number,
                "priority": ticket.priority,
                "category": ticket.category,
            }),
        );

        Ok(ticket)
    }

    // =========================================================================
    // Manual assignment
    // =========================================================================

    /// An agent takes an unassigned ticket from the queue. Exactly one of
    /// two concurrent takes succeeds; the loser sees `AlreadyAssigned`.
    pub async fn take_ticket(&self, agent_id: AgentId, ticket_id: TicketId) -> EngineResult<Ticket> {
        self.ensure_admin(agent_id).await?;
        let now = self.clock.now();
        let default_cap = self.directory.default_capacity();

        let mut core = self.core.lock().await;

        let ticket = core
            .tickets
            .get(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if ticket.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "ticket is {}",
                ticket.status.as_str()
            )));
        }
        if ticket.assigned_to.is_some() {
            return Err(EngineError::AlreadyAssigned);
        }

        core.registry.get_or_create(agent_id, default_cap, now);
        if !core.registry.try_reserve(agent_id, now) {
            return Err(EngineError::CapacityExceeded);
        }

        core.queue.remove(ticket_id);
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        ticket.assigned_to = Some(agent_id);
        ticket.status = TicketStatus::InProgress;
        ticket.queue_position = 0;
        ticket.updated_at = now;
        let snapshot = ticket.clone();

        core.refresh_positions();
        let queue_len = core.queue.len();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        self.persist
            .enqueue(PersistOp::AssignmentEvent(AssignmentEvent {
                ticket_id,
                from_agent: None,
                to_agent: Some(agent_id),
                performed_by: Some(agent_id),
                reason: "self-assigned from queue".to_string(),
                at: now,
            }));
        self.hub.notify_user(
            snapshot.requester,
            EventKind::TicketAssigned,
            json!({
                "ticket_id": snapshot.id,
                "ticket_number": snapshot.ticket_number,
                "agent_id": agent_id,
            }),
        );
        self.hub.broadcast_queue_length(queue_len);

        tracing::info!(
            ticket_id = %ticket_id,
            agent_id = %agent_id,
            "Ticket taken from queue"
        );
        Ok(snapshot)
    }

    /// Transfer a ticket to another agent. The target is reserved before
    /// anything mutates, so a full target aborts with no partial state.
    /// Releasing the previous holder triggers a drain.
    pub async fn transfer_ticket(
        &self,
        ticket_id: TicketId,
        to_agent: AgentId,
        by_agent: AgentId,
    ) -> EngineResult<Ticket> {
        self.ensure_admin(by_agent).await?;
        self.ensure_admin(to_agent).await?;
        let now = self.clock.now();
        let default_cap = self.directory.default_capacity();

        let mut core = self.core.lock().await;

        let ticket = core
            .tickets
            .get(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if ticket.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "ticket is {}",
                ticket.status.as_str()
            )));
        }
        if ticket.assigned_to == Some(to_agent) {
            return Err(EngineError::AlreadyAssigned);
        }
        let from_agent = ticket.assigned_to;

        core.registry.get_or_create(to_agent, default_cap, now);
        if !core.registry.try_reserve(to_agent, now) {
            return Err(EngineError::CapacityExceeded);
        }
        if let Some(prev) = from_agent {
            core.registry.release(prev, now);
        }

        core.queue.remove(ticket_id);
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        ticket.assigned_to = Some(to_agent);
        if ticket.status.is_pre_assignment() {
            ticket.status = TicketStatus::InProgress;
        }
        ticket.queue_position = 0;
        ticket.updated_at = now;
        let snapshot = ticket.clone();

        let drained = self.drain_locked(&mut core, now);
        core.refresh_positions();
        let queue_len = core.queue.len();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        self.persist
            .enqueue(PersistOp::AssignmentEvent(AssignmentEvent {
                ticket_id,
                from_agent,
                to_agent: Some(to_agent),
                performed_by: Some(by_agent),
                reason: "transferred".to_string(),
                at: now,
            }));
        self.hub.notify_agent(
            to_agent,
            EventKind::TicketAssigned,
            json!({
                "ticket_id": snapshot.id,
                "ticket_number": snapshot.ticket_number,
                "assigned_by": by_agent,
            }),
        );
        self.dispatch_assignments(drained, now);
        self.hub.broadcast_queue_length(queue_len);

        tracing::info!(
            ticket_id = %ticket_id,
            from_agent = ?from_agent,
            to_agent = %to_agent,
            by_agent = %by_agent,
            "Ticket transferred"
        );
        Ok(snapshot)
    }

    // =========================================================================
    // Conversation flows
    // =========================================================================

    /// Agent reply. The first non-internal reply stamps `first_response_at`
    /// (once, never overwritten) and moves the ticket to PENDING.
    pub async fn agent_reply(
        &self,
        agent_id: AgentId,
        ticket_id: TicketId,
        message: &str,
        internal: bool,
    ) -> EngineResult<Ticket> {
        self.ensure_admin(agent_id).await?;
        if message.trim().is_empty() {
            return Err(EngineError::Validation("message cannot be empty".into()));
        }
        let now = self.clock.now();

        let mut core = self.core.lock().await;
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if ticket.status.is_terminal() {
            return Err(EngineError::InvalidTransition(
                "cannot reply to a closed ticket".into(),
            ));
        }
        if ticket.assigned_to.is_none() {
            return Err(EngineError::InvalidTransition(
                "ticket is not assigned".into(),
            ));
        }

        if !internal {
            if ticket.first_response_at.is_none() {
                ticket.first_response_at = Some(now);
            }
            // A reply on a resolved ticket is allowed but does not
            // reactivate it.
            if ticket.status.occupies_slot() {
                ticket.status = TicketStatus::Pending;
            }
        }
        ticket.updated_at = now;
        let snapshot = ticket.clone();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        if !internal {
            self.hub.notify_user(
                snapshot.requester,
                EventKind::AdminReply,
                json!({
                    "ticket_id": snapshot.id,
                    "ticket_number": snapshot.ticket_number,
                    "message": message,
                    "agent_id": agent_id,
                }),
            );
        }
        Ok(snapshot)
    }

    /// Customer reply: PENDING moves back to WAITING (awaiting admin).
    pub async fn customer_reply(
        &self,
        user_id: UserId,
        ticket_id: TicketId,
        message: &str,
    ) -> EngineResult<Ticket> {
        if message.trim().is_empty() {
            return Err(EngineError::Validation("message cannot be empty".into()));
        }
        let now = self.clock.now();

        let mut core = self.core.lock().await;
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if ticket.requester != user_id {
            return Err(EngineError::TicketNotFound(ticket_id));
        }
        if ticket.status.is_terminal() {
            return Err(EngineError::InvalidTransition(
                "cannot reply to a closed ticket".into(),
            ));
        }

        if ticket.status == TicketStatus::Pending {
            ticket.status = TicketStatus::Waiting;
        }
        ticket.updated_at = now;
        let snapshot = ticket.clone();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        if let Some(agent_id) = snapshot.assigned_to {
            self.hub.notify_agent(
                agent_id,
                EventKind::NewMessage,
                json!({
                    "ticket_id": snapshot.id,
                    "ticket_number": snapshot.ticket_number,
                    "message": message,
                }),
            );
        }
        Ok(snapshot)
    }

    // =========================================================================
    // Resolution and teardown
    // =========================================================================

    /// Resolve an active ticket. Releases the agent slot and drains.
    pub async fn resolve_ticket(
        &self,
        agent_id: AgentId,
        ticket_id: TicketId,
        reason: Option<String>,
    ) -> EngineResult<Ticket> {
        self.ensure_admin(agent_id).await?;
        let now = self.clock.now();

        let mut core = self.core.lock().await;
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if !ticket.status.occupies_slot() {
            return Err(EngineError::InvalidTransition(format!(
                "cannot resolve a ticket that is {}",
                ticket.status.as_str()
            )));
        }
        let from_status = ticket.status;
        ticket.status = TicketStatus::Resolved;
        ticket.resolved_at = Some(now);
        ticket.updated_at = now;
        let snapshot = ticket.clone();

        let drained = match snapshot.assigned_to {
            Some(holder) => {
                core.registry.release(holder, now);
                self.drain_locked(&mut core, now)
            }
            None => Vec::new(),
        };
        core.refresh_positions();
        let queue_len = core.queue.len();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        self.persist.enqueue(PersistOp::StatusChange(StatusChange {
            ticket_id,
            from_status,
            to_status: TicketStatus::Resolved,
            changed_by: Actor::Agent(agent_id),
            reason,
            at: now,
        }));
        self.hub.notify_user(
            snapshot.requester,
            EventKind::StatusChanged,
            json!({
                "ticket_id": snapshot.id,
                "ticket_number": snapshot.ticket_number,
                "old_status": from_status,
                "new_status": TicketStatus::Resolved,
            }),
        );
        self.dispatch_assignments(drained, now);
        self.hub.broadcast_queue_length(queue_len);

        tracing::info!(ticket_id = %ticket_id, agent_id = %agent_id, "Ticket resolved");
        Ok(snapshot)
    }

    /// Close a ticket (user or agent action). Terminal: releases any held
    /// agent slot, removes the ticket from the queue if still waiting, and
    /// drains freed capacity.
    pub async fn close_ticket(
        &self,
        actor: Actor,
        ticket_id: TicketId,
        rating: Option<u8>,
        feedback: Option<String>,
    ) -> EngineResult<Ticket> {
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(EngineError::Validation(
                    "rating must be between 1 and 5".into(),
                ));
            }
        }
        if let Actor::Agent(agent_id) = actor {
            self.ensure_admin(agent_id).await?;
        }
        let now = self.clock.now();

        let mut core = self.core.lock().await;
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if let Actor::User(user_id) = actor {
            if ticket.requester != user_id {
                return Err(EngineError::TicketNotFound(ticket_id));
            }
        }
        if ticket.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "ticket is already {}",
                ticket.status.as_str()
            )));
        }

        let from_status = ticket.status;
        ticket.status = TicketStatus::Closed;
        ticket.closed_at = Some(now);
        ticket.queue_position = 0;
        ticket.updated_at = now;
        if rating.is_some() {
            ticket.rating = rating;
        }
        if feedback.is_some() {
            ticket.feedback = feedback.clone();
        }
        let snapshot = ticket.clone();

        core.queue.remove(ticket_id);
        let drained = match snapshot.assigned_to {
            Some(holder) if from_status.occupies_slot() => {
                core.registry.release(holder, now);
                self.drain_locked(&mut core, now)
            }
            _ => Vec::new(),
        };
        core.refresh_positions();
        let queue_len = core.queue.len();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        self.persist.enqueue(PersistOp::StatusChange(StatusChange {
            ticket_id,
            from_status,
            to_status: TicketStatus::Closed,
            changed_by: actor,
            reason: None,
            at: now,
        }));
        if let Some(agent_id) = snapshot.assigned_to {
            self.hub.notify_agent(
                agent_id,
                EventKind::TicketClosed,
                json!({
                    "ticket_id": snapshot.id,
                    "ticket_number": snapshot.ticket_number,
                    "rating": snapshot.rating,
                    "feedback": snapshot.feedback,
                }),
            );
        }
        self.dispatch_assignments(drained, now);
        self.hub.broadcast_queue_length(queue_len);

        tracing::info!(ticket_id = %ticket_id, "Ticket closed");
        Ok(snapshot)
    }

    /// Cancel a ticket that is still waiting in the queue. Terminal state
    /// distinct from CLOSED. Safe to race a concurrent drain: queue removal
    /// is idempotent, and a drain never assigns a terminal ticket.
    pub async fn cancel_ticket(&self, user_id: UserId, ticket_id: TicketId) -> EngineResult<Ticket> {
        let now = self.clock.now();

        let mut core = self.core.lock().await;
        let ticket = core
            .tickets
            .get_mut(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        if ticket.requester != user_id {
            return Err(EngineError::TicketNotFound(ticket_id));
        }
        if ticket.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "ticket is already {}",
                ticket.status.as_str()
            )));
        }
        if ticket.assigned_to.is_some() || !ticket.status.is_pre_assignment() {
            return Err(EngineError::InvalidTransition(
                "only queued tickets can be cancelled".into(),
            ));
        }

        let from_status = ticket.status;
        ticket.status = TicketStatus::Cancelled;
        ticket.queue_position = 0;
        ticket.updated_at = now;
        let snapshot = ticket.clone();

        core.queue.remove(ticket_id);
        core.refresh_positions();
        let queue_len = core.queue.len();

        self.persist
            .enqueue(PersistOp::UpdateTicket(snapshot.clone()));
        self.persist.enqueue(PersistOp::StatusChange(StatusChange {
            ticket_id,
            from_status,
            to_status: TicketStatus::Cancelled,
            changed_by: Actor::User(user_id),
            reason: Some("cancelled while queued".to_string()),
            at: now,
        }));
        self.hub.broadcast_queue_length(queue_len);

        tracing::info!(ticket_id = %ticket_id, "Ticket cancelled while queued");
        Ok(snapshot)
    }

    // =========================================================================
    // Agent presence
    // =========================================================================

    /// Update an agent's live status. Coming ONLINE frees admission
    /// capacity, so it triggers a drain.
    pub async fn set_agent_status(&self, agent_id: AgentId, status: AgentStatus) {
        let now = self.clock.now();

        let mut core = self.core.lock().await;
        let default_cap = self.directory.default_capacity();
        core.registry.get_or_create(agent_id, default_cap, now);
        core.registry.set_status(agent_id, status, now);

        let drained = if status == AgentStatus::Online {
            self.drain_locked(&mut core, now)
        } else {
            Vec::new()
        };
        core.refresh_positions();
        let queue_len = core.queue.len();

        tracing::info!(agent_id = %agent_id, status = status.as_str(), "Agent status changed");
        if !drained.is_empty() {
            self.dispatch_assignments(drained, now);
            self.hub.broadcast_queue_length(queue_len);
        }
    }

    // =========================================================================
    // Read paths
    // =========================================================================

    /// Live 1-indexed queue position; 0 when assigned or terminal.
    pub async fn queue_position(&self, ticket_id: TicketId) -> EngineResult<u32> {
        let core = self.core.lock().await;
        if !core.tickets.contains_key(&ticket_id) {
            return Err(EngineError::TicketNotFound(ticket_id));
        }
        Ok(core.queue.position_of(ticket_id) as u32)
    }

    pub async fn get_ticket(&self, ticket_id: TicketId) -> Option<Ticket> {
        let core = self.core.lock().await;
        core.tickets.get(&ticket_id).cloned()
    }

    pub async fn agent_availability(&self, agent_id: AgentId) -> Option<AgentAvailability> {
        let core = self.core.lock().await;
        core.registry.get(agent_id).cloned()
    }

    /// Read-only aggregation backing [`crate::stats::QueueStatsService`].
    pub async fn stats_snapshot(&self) -> QueueStats {
        let now = self.clock.now();
        let core = self.core.lock().await;

        let cutoff = now - AVERAGE_WAIT_WINDOW;
        let waits: Vec<i64> = core
            .tickets
            .values()
            .filter(|t| t.created_at >= cutoff)
            .filter_map(|t| {
                t.first_response_at
                    .map(|fr| (fr - t.created_at).whole_minutes())
            })
            .collect();
        let average_wait_minutes = if waits.is_empty() {
            DEFAULT_AVERAGE_WAIT_MINUTES
        } else {
            waits.iter().sum::<i64>() / waits.len() as i64
        };

        QueueStats {
            queue_length: core.queue.len(),
            active_tickets: core
                .tickets
                .values()
                .filter(|t| t.assigned_to.is_some() && t.status.occupies_slot())
                .count(),
            available_agents: core.registry.available_count(),
            average_wait_minutes,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn ensure_admin(&self, agent_id: AgentId) -> EngineResult<()> {
        match self.directory.is_admin(agent_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EngineError::AgentNotFound(agent_id)),
            Err(err) => Err(EngineError::Internal(format!("agent directory: {err}"))),
        }
    }

    /// Drain the queue against free capacity. Runs to completion under the
    /// caller's core lock so two releases can never race over one freed
    /// slot. Stops cleanly when the queue is empty or no agent has room;
    /// that is the expected steady state, not an error. Tickets that turned
    /// terminal while queued are skipped without consuming capacity.
    fn drain_locked(&self, core: &mut Core, now: OffsetDateTime) -> Vec<Ticket> {
        let mut assigned = Vec::new();

        loop {
            let Some(agent_id) = core.registry.find_available() else {
                break;
            };
            if core.queue.is_empty() {
                break;
            }
            if !core.registry.try_reserve(agent_id, now) {
                break;
            }

            let mut placed = false;
            while let Some(ticket_id) = core.queue.pop_highest() {
                let Some(ticket) = core.tickets.get_mut(&ticket_id) else {
                    continue;
                };
                if ticket.status.is_terminal() || ticket.assigned_to.is_some() {
                    continue;
                }
                ticket.assigned_to = Some(agent_id);
                ticket.status = TicketStatus::InProgress;
                ticket.queue_position = 0;
                ticket.updated_at = now;
                assigned.push(ticket.clone());
                placed = true;
                break;
            }

            if !placed {
                core.registry.release(agent_id, now);
                break;
            }
        }

        assigned
    }

    /// Emit the persistence and notification effects for drain assignments.
    fn dispatch_assignments(&self, drained: Vec<Ticket>, now: OffsetDateTime) {
        for ticket in drained {
            tracing::info!(
                ticket_id = %ticket.id,
                agent_id = ?ticket.assigned_to,
                "Queued ticket assigned by drain"
            );
            self.persist
                .enqueue(PersistOp::UpdateTicket(ticket.clone()));
            self.persist
                .enqueue(PersistOp::AssignmentEvent(AssignmentEvent {
                    ticket_id: ticket.id,
                    from_agent: None,
                    to_agent: ticket.assigned_to,
                    performed_by: None,
                    reason: "auto-assigned".to_string(),
                    at: now,
                }));
            self.hub.notify_user(
                ticket.requester,
                EventKind::TicketAssigned,
                json!({
                    "ticket_id": ticket.id,
                    "ticket_number": ticket.ticket_number,
                    "agent_id": ticket.assigned_to,
                }),
            );
        }
    }

}

/// Unique human-readable ticket number: `TKT-<UTC timestamp>-<hex>`.
fn generate_ticket_number(now: OffsetDateTime) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!(
        "TKT-{:04}{:02}{:02}{:02}{:02}{:02}-{}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        suffix
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_number_format() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let number = generate_ticket_number(now);
        assert!(number.starts_with("TKT-19700101000000-"));
        assert_eq!(number.len(), "TKT-19700101000000-".len() + 6);
    }
}
