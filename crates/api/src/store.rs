//! Postgres adapters for the engine's persistence and identity traits
//!
//! Writes arrive from the engine's persistence worker after the in-memory
//! transition has already committed, so every statement here is written to
//! be retry-safe: ticket saves upsert on id, audit rows are append-only.

use async_trait::async_trait;
use helpdesk_engine::{AgentDirectory, TicketStore};
use helpdesk_shared::{AgentId, AssignmentEvent, StatusChange, Ticket};
use sqlx::PgPool;

/// Ticket persistence backed by the `support_tickets` family of tables.
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn save_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO support_tickets (
                id, ticket_number, subject, category, priority, status,
                requester, order_id, assigned_to, queue_position,
                created_at, updated_at, first_response_at, resolved_at,
                closed_at, rating, feedback
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO UPDATE SET
                priority = EXCLUDED.priority,
                status = EXCLUDED.status,
                assigned_to = EXCLUDED.assigned_to,
                queue_position = EXCLUDED.queue_position,
                updated_at = EXCLUDED.updated_at,
                first_response_at = EXCLUDED.first_response_at,
                resolved_at = EXCLUDED.resolved_at,
                closed_at = EXCLUDED.closed_at,
                rating = EXCLUDED.rating,
                feedback = EXCLUDED.feedback
            "#,
        )
        .bind(ticket.id.0)
        .bind(&ticket.ticket_number)
        .bind(&ticket.subject)
        .bind(ticket.category.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.requester.0)
        .bind(ticket.order_id.map(|o| o.0))
        .bind(ticket.assigned_to.map(|a| a.0))
        .bind(ticket.queue_position as i32)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .bind(ticket.first_response_at)
        .bind(ticket.resolved_at)
        .bind(ticket.closed_at)
        .bind(ticket.rating.map(i16::from))
        .bind(&ticket.feedback)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE support_tickets SET
                priority = $2,
                status = $3,
                assigned_to = $4,
                queue_position = $5,
                updated_at = $6,
                first_response_at = $7,
                resolved_at = $8,
                closed_at = $9,
                rating = $10,
                feedback = $11
            WHERE id = $1
            "#,
        )
        .bind(ticket.id.0)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.assigned_to.map(|a| a.0))
        .bind(ticket.queue_position as i32)
        .bind(ticket.updated_at)
        .bind(ticket.first_response_at)
        .bind(ticket.resolved_at)
        .bind(ticket.closed_at)
        .bind(ticket.rating.map(i16::from))
        .bind(&ticket.feedback)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_assignment_event(&self, event: &AssignmentEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ticket_assignments (ticket_id, from_agent, to_agent, performed_by, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.ticket_id.0)
        .bind(event.from_agent.map(|a| a.0))
        .bind(event.to_agent.map(|a| a.0))
        .bind(event.performed_by.map(|a| a.0))
        .bind(&event.reason)
        .bind(event.at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_status_change(&self, change: &StatusChange) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ticket_status_history (ticket_id, from_status, to_status, changed_by, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(change.ticket_id.0)
        .bind(change.from_status.as_str())
        .bind(change.to_status.as_str())
        .bind(serde_json::to_value(change.changed_by)?)
        .bind(&change.reason)
        .bind(change.at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Agent identity checks backed by the `users` table.
pub struct PgAgentDirectory {
    pool: PgPool,
    default_capacity: u32,
}

impl PgAgentDirectory {
    pub fn new(pool: PgPool, default_capacity: u32) -> Self {
        Self {
            pool,
            default_capacity,
        }
    }
}

#[async_trait]
impl AgentDirectory for PgAgentDirectory {
    async fn is_admin(&self, agent_id: AgentId) -> anyhow::Result<bool> {
        let is_admin = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role IN ('agent', 'admin'))",
        )
        .bind(agent_id.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(is_admin)
    }

    fn default_capacity(&self) -> u32 {
        self.default_capacity
    }
}
