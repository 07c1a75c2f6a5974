//! Engine error types

use helpdesk_shared::{AgentId, TicketId};

/// Errors surfaced by scheduling operations.
///
/// All variants are local and synchronous; a failed auto-assignment is not an
/// error (the scheduler falls back to enqueueing), and notification delivery
/// failures never surface here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("ticket is already assigned")]
    AlreadyAssigned,

    #[error("agent is at maximum ticket capacity")]
    CapacityExceeded,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
