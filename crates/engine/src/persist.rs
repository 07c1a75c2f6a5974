//! Persistence hand-off
//!
//! Storage writes are queued here after the in-memory state transition has
//! committed, so the scheduler never blocks on the database while holding
//! its core lock. A worker task applies each operation with exponential
//! backoff; an operation that still fails after the retry budget is logged
//! and dropped (the in-memory state remains authoritative).

use std::sync::Arc;

use helpdesk_shared::{AssignmentEvent, StatusChange, Ticket};
use tokio::sync::mpsc;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::store::TicketStore;

/// A single durable write handed off by the scheduler.
#[derive(Debug, Clone)]
pub enum PersistOp {
    SaveTicket(Ticket),
    UpdateTicket(Ticket),
    AssignmentEvent(AssignmentEvent),
    StatusChange(StatusChange),
}

/// Handle for enqueueing writes to the persistence worker.
#[derive(Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistOp>,
}

impl PersistHandle {
    /// Spawn the worker task. Must be called within a Tokio runtime.
    pub fn spawn(store: Arc<dyn TicketStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistOp>();

        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                let strategy = ExponentialBackoff::from_millis(50).map(jitter).take(4);
                let result = Retry::spawn(strategy, || apply(store.as_ref(), &op)).await;
                if let Err(err) = result {
                    tracing::error!(error = %err, op = ?op_name(&op), "Persistence failed after retries; dropping write");
                }
            }
        });

        Self { tx }
    }

    pub fn enqueue(&self, op: PersistOp) {
        if self.tx.send(op).is_err() {
            tracing::error!("Persistence worker stopped; dropping write");
        }
    }
}

async fn apply(store: &dyn TicketStore, op: &PersistOp) -> anyhow::Result<()> {
    match op {
        PersistOp::SaveTicket(ticket) => store.save_ticket(ticket).await,
        PersistOp::UpdateTicket(ticket) => store.update_ticket(ticket).await,
        PersistOp::AssignmentEvent(event) => store.record_assignment_event(event).await,
        PersistOp::StatusChange(change) => store.record_status_change(change).await,
    }
}

fn op_name(op: &PersistOp) -> &'static str {
    match op {
        PersistOp::SaveTicket(_) => "save_ticket",
        PersistOp::UpdateTicket(_) => "update_ticket",
        PersistOp::AssignmentEvent(_) => "assignment_event",
        PersistOp::StatusChange(_) => "status_change",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use helpdesk_shared::{TicketCategory, TicketId, TicketPriority, TicketStatus, UserId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use time::OffsetDateTime;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: TicketId::new(),
            ticket_number: "TKT-19700101000000-ABCDEF".to_string(),
            subject: "subject".to_string(),
            category: TicketCategory::General,
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            requester: UserId::new(),
            order_id: None,
            assigned_to: None,
            queue_position: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            rating: None,
            feedback: None,
        }
    }

    #[derive(Default)]
    struct FlakyStore {
        failures_left: AtomicUsize,
        saved: Mutex<Vec<TicketId>>,
    }

    #[async_trait]
    impl TicketStore for FlakyStore {
        async fn save_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                anyhow::bail!("transient failure");
            }
            self.saved.lock().unwrap().push(ticket.id);
            Ok(())
        }

        async fn update_ticket(&self, _ticket: &Ticket) -> anyhow::Result<()> {
            Ok(())
        }

        async fn record_assignment_event(&self, _event: &AssignmentEvent) -> anyhow::Result<()> {
            Ok(())
        }

        async fn record_status_change(&self, _change: &StatusChange) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let store = Arc::new(FlakyStore {
            failures_left: AtomicUsize::new(2),
            saved: Mutex::new(Vec::new()),
        });
        let handle = PersistHandle::spawn(Arc::clone(&store) as Arc<dyn TicketStore>);

        let ticket = sample_ticket();
        handle.enqueue(PersistOp::SaveTicket(ticket.clone()));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.saved.lock().unwrap().as_slice(), &[ticket.id]);
    }
}
