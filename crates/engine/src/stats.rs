//! Queue statistics
//!
//! A thin read-only facade over the scheduler. The aggregation itself runs
//! under the core lock (see [`AssignmentScheduler::stats_snapshot`]) so the
//! numbers in one snapshot are mutually consistent.

use std::sync::Arc;

use serde::Serialize;
use time::Duration;

use crate::scheduler::AssignmentScheduler;

/// Rolling window for the average first-response time.
pub const AVERAGE_WAIT_WINDOW: Duration = Duration::hours(24);

/// Reported when no ticket in the window has a first response yet.
pub const DEFAULT_AVERAGE_WAIT_MINUTES: i64 = 5;

/// Point-in-time view of queue load, serialized as the stats API response.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// Tickets currently waiting for an agent.
    pub queue_length: usize,
    /// Assigned tickets still counting against agent capacity.
    pub active_tickets: usize,
    /// Agents able to accept another ticket right now.
    pub available_agents: usize,
    /// Mean minutes from creation to first agent response over the last
    /// 24 hours, or the default when no sample exists.
    pub average_wait_minutes: i64,
}

/// Read-only statistics service for dashboards and the stats endpoint.
#[derive(Clone)]
pub struct QueueStatsService {
    scheduler: Arc<AssignmentScheduler>,
}

impl QueueStatsService {
    pub fn new(scheduler: Arc<AssignmentScheduler>) -> Self {
        Self { scheduler }
    }

    pub async fn snapshot(&self) -> QueueStats {
        self.scheduler.stats_snapshot().await
    }
}
