//! Helpdesk API Library
//!
//! This crate hosts the scheduling engine: environment configuration,
//! Postgres-backed persistence adapters, the WebSocket fan-out layer, and
//! the HTTP surface for queue observability.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod websocket;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
