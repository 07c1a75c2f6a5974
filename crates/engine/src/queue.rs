//! Priority queue of waiting tickets
//!
//! Ordering is strict (priority DESC, enqueue time ASC): a higher-priority
//! ticket always ranks ahead of a lower-priority one regardless of arrival
//! order, and within a tier tickets are served FIFO. An admission sequence
//! number breaks same-second ties so the order is total and stable.

use std::collections::{BTreeMap, HashMap};

use helpdesk_shared::{TicketId, TicketPriority};
use time::OffsetDateTime;

/// Scale factor that makes any priority tier dominate all possible time
/// deltas within a tier (epoch seconds fit well under 10^9).
pub const PRIORITY_SCALE: i64 = 1_000_000_000;

/// Combined sortable score for observability: `weight * SCALE + epoch_secs`.
pub fn score(priority: TicketPriority, enqueued_at: OffsetDateTime) -> i64 {
    i64::from(priority.weight()) * PRIORITY_SCALE + enqueued_at.unix_timestamp()
}

/// Composite ordering key. Iterating the map in ascending key order yields
/// the queue head first: lower `tier` means higher priority (the weight is
/// inverted on insert), then earlier enqueue time, then admission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    tier: u8,
    enqueued_at: i64,
    seq: u64,
}

/// In-memory ordered queue with live rank lookup.
///
/// Entries are never mutated in place; re-prioritization is a remove plus
/// reinsert. `position_of` is a linear scan over the ordered map: O(n) per
/// call instead of the O(log n) an order-statistics tree would give, which
/// is a deliberate tradeoff at realistic support-queue sizes.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    entries: BTreeMap<QueueKey, TicketId>,
    index: HashMap<TicketId, QueueKey>,
    next_seq: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ticket and return its 1-indexed position.
    ///
    /// Inserting an id that is already queued reinserts it under the new
    /// priority and time.
    pub fn insert(
        &mut self,
        ticket_id: TicketId,
        priority: TicketPriority,
        enqueued_at: OffsetDateTime,
    ) -> usize {
        self.remove(ticket_id);

        let key = QueueKey {
            tier: u8::MAX - priority.weight(),
            enqueued_at: enqueued_at.unix_timestamp(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.entries.insert(key, ticket_id);
        self.index.insert(ticket_id, key);
        self.position_of(ticket_id)
    }

    /// Remove a ticket from the queue. A no-op (not an error) when the id is
    /// absent: removal races with assignment are expected.
    pub fn remove(&mut self, ticket_id: TicketId) -> bool {
        match self.index.remove(&ticket_id) {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }

    /// 1-indexed rank among currently queued tickets, 0 if absent.
    pub fn position_of(&self, ticket_id: TicketId) -> usize {
        let Some(key) = self.index.get(&ticket_id) else {
            return 0;
        };
        self.entries.range(..=*key).count()
    }

    /// Pop the highest-priority, earliest-enqueued ticket.
    pub fn pop_highest(&mut self) -> Option<TicketId> {
        let (key, ticket_id) = self.entries.pop_first()?;
        debug_assert_eq!(self.index.get(&ticket_id), Some(&key));
        self.index.remove(&ticket_id);
        Some(ticket_id)
    }

    /// Ticket ids in queue order, head first.
    pub fn iter(&self) -> impl Iterator<Item = TicketId> + '_ {
        self.entries.values().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
