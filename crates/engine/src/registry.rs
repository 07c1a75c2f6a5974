//! Agent presence and capacity accounting
//!
//! All mutation happens under the scheduler's core lock, which makes
//! reserve/release atomic with respect to concurrent scheduling operations:
//! two reservation attempts against one remaining slot can never both
//! succeed.

use std::collections::HashMap;

use helpdesk_shared::{AgentAvailability, AgentId, AgentStatus};
use time::OffsetDateTime;

/// Tracks each agent's live status and current load vs. capacity.
///
/// Records are created lazily on the first scheduling interaction and never
/// deleted; only their status and counters change.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, AgentAvailability>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or lazily create an availability record. New agents start
    /// ONLINE: the interaction that creates them implies presence.
    pub fn get_or_create(
        &mut self,
        agent_id: AgentId,
        default_max: u32,
        now: OffsetDateTime,
    ) -> &mut AgentAvailability {
        self.agents
            .entry(agent_id)
            .or_insert_with(|| AgentAvailability {
                agent_id,
                status: AgentStatus::Online,
                max_tickets: default_max,
                current_tickets: 0,
                last_activity_at: now,
            })
    }

    /// Atomically check capacity and increment load. Returns false without
    /// side effect when the agent is unknown, not ONLINE, or at capacity.
    pub fn try_reserve(&mut self, agent_id: AgentId, now: OffsetDateTime) -> bool {
        let Some(agent) = self.agents.get_mut(&agent_id) else {
            return false;
        };
        if !agent.can_accept() {
            return false;
        }
        agent.current_tickets += 1;
        agent.last_activity_at = now;
        true
    }

    /// Decrement load, floored at 0.
    pub fn release(&mut self, agent_id: AgentId, now: OffsetDateTime) {
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.current_tickets = agent.current_tickets.saturating_sub(1);
            agent.last_activity_at = now;
        }
    }

    /// Pick the ONLINE agent with the lowest current load, tie-broken by
    /// agent id so the choice is deterministic. Least-loaded-first keeps
    /// per-agent queues balanced.
    pub fn find_available(&self) -> Option<AgentId> {
        self.agents
            .values()
            .filter(|a| a.can_accept())
            .min_by_key(|a| (a.current_tickets, a.agent_id))
            .map(|a| a.agent_id)
    }

    pub fn set_status(&mut self, agent_id: AgentId, status: AgentStatus, now: OffsetDateTime) {
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.status = status;
            agent.last_activity_at = now;
        }
    }

    pub fn get(&self, agent_id: AgentId) -> Option<&AgentAvailability> {
        self.agents.get(&agent_id)
    }

    /// Number of agents currently able to accept a ticket.
    pub fn available_count(&self) -> usize {
        self.agents.values().filter(|a| a.can_accept()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }

    #[test]
    fn test_reserve_respects_capacity() {
        let mut reg = AgentRegistry::new();
        let a = AgentId::new();
        reg.get_or_create(a, 2, now());

        assert!(reg.try_reserve(a, now()));
        assert!(reg.try_reserve(a, now()));
        assert!(!reg.try_reserve(a, now()));
        assert_eq!(reg.get(a).unwrap().current_tickets, 2);
    }

    #[test]
    fn test_reserve_requires_online() {
        let mut reg = AgentRegistry::new();
        let a = AgentId::new();
        reg.get_or_create(a, 5, now());
        reg.set_status(a, AgentStatus::Away, now());

        assert!(!reg.try_reserve(a, now()));
        assert_eq!(reg.get(a).unwrap().current_tickets, 0);
    }

    #[test]
    fn test_release_floors_at_zero() {
        let mut reg = AgentRegistry::new();
        let a = AgentId::new();
        reg.get_or_create(a, 1, now());

        reg.release(a, now());
        assert_eq!(reg.get(a).unwrap().current_tickets, 0);
    }

    #[test]
    fn test_find_available_prefers_least_loaded() {
        let mut reg = AgentRegistry::new();
        let a = AgentId(uuid::Uuid::from_u128(1));
        let b = AgentId(uuid::Uuid::from_u128(2));
        reg.get_or_create(a, 5, now());
        reg.get_or_create(b, 5, now());

        assert!(reg.try_reserve(a, now()));
        assert_eq!(reg.find_available(), Some(b));
    }

    #[test]
    fn test_find_available_tie_breaks_by_id() {
        let mut reg = AgentRegistry::new();
        let lo = AgentId(uuid::Uuid::from_u128(1));
        let hi = AgentId(uuid::Uuid::from_u128(2));
        reg.get_or_create(hi, 5, now());
        reg.get_or_create(lo, 5, now());

        assert_eq!(reg.find_available(), Some(lo));
    }

    #[test]
    fn test_find_available_skips_full_and_offline() {
        let mut reg = AgentRegistry::new();
        let full = AgentId::new();
        let offline = AgentId::new();
        reg.get_or_create(full, 1, now());
        reg.get_or_create(offline, 1, now());
        assert!(reg.try_reserve(full, now()));
        reg.set_status(offline, AgentStatus::Offline, now());

        assert_eq!(reg.find_available(), None);
        assert_eq!(reg.available_count(), 0);
    }
}
