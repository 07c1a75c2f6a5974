//! Helpdesk scheduling engine
//!
//! The ticket assignment and queueing core: admits incoming support tickets,
//! ranks them by priority and arrival order, assigns them to available agents
//! subject to per-agent concurrency limits, tracks live queue position, and
//! fans out state changes to subscribers.
//!
//! # Architecture
//!
//! - **PriorityQueue**: ordered queue of waiting tickets with live rank lookup
//! - **AgentRegistry**: per-agent presence and capacity accounting
//! - **AssignmentScheduler**: the lifecycle state machine and drain loop
//! - **NotificationHub**: best-effort, order-preserving event fan-out
//! - **QueueStatsService**: read-only queue/wait-time aggregation
//!
//! Persistence, identity, notification transport, and the clock are supplied
//! by the host application through the traits in [`store`] and [`clock`].
//! All in-memory transitions happen under a single core lock with no I/O;
//! storage writes and notifications are handed off to background tasks after
//! the transition commits.

pub mod clock;
pub mod error;
pub mod hub;
pub mod persist;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::{EngineError, EngineResult};
pub use hub::{Channel, EventKind, NotificationHub, QueueEvent};
pub use persist::{PersistHandle, PersistOp};
pub use queue::PriorityQueue;
pub use registry::AgentRegistry;
pub use scheduler::{AssignmentScheduler, NewTicket};
pub use stats::{QueueStats, QueueStatsService};
pub use store::{AgentDirectory, TicketStore, Transport};
