//! HTTP route handlers

pub mod health;
pub mod queue;

use axum::{routing::get, Router};

use crate::state::AppState;
use crate::websocket::ws_handler;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api/queue/stats", get(queue::queue_stats))
        .route("/api/tickets/:id/queue", get(queue::ticket_queue_position))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
