//! Shared application state

use std::sync::Arc;

use helpdesk_engine::{AssignmentScheduler, QueueStatsService};
use sqlx::PgPool;

use crate::config::Config;
use crate::websocket::WebSocketState;

/// State shared across all HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub scheduler: Arc<AssignmentScheduler>,
    pub stats: QueueStatsService,
    pub ws: WebSocketState,
}
