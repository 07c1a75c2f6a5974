//! Helpdesk API server
//!
//! Wires the scheduling engine to Postgres and the WebSocket transport, then
//! serves the HTTP/WebSocket surface.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use helpdesk_api::state::AppState;
use helpdesk_api::store::{PgAgentDirectory, PgTicketStore};
use helpdesk_api::websocket::{WebSocketState, WsTransport};
use helpdesk_api::{routes, Config};
use helpdesk_engine::{
    AgentDirectory, AssignmentScheduler, Clock, QueueStatsService, SystemClock, TicketStore,
    Transport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(bind_address = %config.bind_address, "Starting helpdesk API");

    let pool = helpdesk_shared::db::create_pool(
        &config.database_url,
        config.database_max_connections,
    )
    .await?;
    helpdesk_shared::db::run_migrations(&pool).await?;

    let ws = WebSocketState::new();
    let store: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool.clone()));
    let directory: Arc<dyn AgentDirectory> = Arc::new(PgAgentDirectory::new(
        pool.clone(),
        config.default_agent_capacity,
    ));
    let transport: Arc<dyn Transport> = Arc::new(WsTransport::new(ws.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let scheduler = Arc::new(AssignmentScheduler::new(store, directory, transport, clock));
    let stats = QueueStatsService::new(Arc::clone(&scheduler));

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        scheduler,
        stats,
        ws,
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
