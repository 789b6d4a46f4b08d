//! WebSocket connection to the game server
//!
//! - `manager`: runtime-agnostic connection state machine (buffer, reconnect)
//! - `core`: reconnect backoff math
//! - `shared`: constants and connect-URI helpers
//! - `desktop`: tokio-tungstenite transport adapter
//! - `bridge`: the tokio task wiring buses, transport and timer to the manager

mod bridge;
mod core;
mod desktop;
mod manager;
mod shared;

pub use bridge::{create_connection, create_connection_with, Connection};
pub use self::core::{BackoffState, ReconnectPolicy};
pub use desktop::DesktopTransport;
pub use manager::{ConnectionManager, SendOutcome};
pub use shared::build_connect_url;
