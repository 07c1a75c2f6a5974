//! WebSocket layer
//!
//! Connections join rooms keyed by the engine's notification channels; the
//! [`transport::WsTransport`] adapter routes engine events onto those rooms.

pub mod connection;
pub mod events;
pub mod handler;
pub mod room;
pub mod state;
pub mod transport;

pub use connection::Connection;
pub use events::{ClientEvent, ServerEvent};
pub use handler::ws_handler;
pub use room::RoomManager;
pub use state::WebSocketState;
pub use transport::WsTransport;
