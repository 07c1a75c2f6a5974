//! Queue observability endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use helpdesk_engine::QueueStats;
use helpdesk_shared::TicketId;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/queue/stats
pub async fn queue_stats(State(state): State<AppState>) -> Json<QueueStats> {
    Json(state.stats.snapshot().await)
}

#[derive(Serialize)]
pub struct QueuePositionResponse {
    pub ticket_id: TicketId,
    /// 1-indexed rank among queued tickets; 0 when assigned or terminal.
    pub queue_position: u32,
    pub estimated_wait_minutes: u32,
}

/// GET /api/tickets/:id/queue
pub async fn ticket_queue_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QueuePositionResponse>> {
    let ticket_id = TicketId::from(id);
    let position = state.scheduler.queue_position(ticket_id).await?;

    Ok(Json(QueuePositionResponse {
        ticket_id,
        queue_position: position,
        estimated_wait_minutes: position * 5,
    }))
}
