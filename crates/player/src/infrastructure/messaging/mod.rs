//! Command Bus and Event Bus messaging infrastructure.
//!
//! This module provides the messaging layer between the application and the
//! connection task:
//! - `CommandBus`: connect, send commands, close (fire-and-forget)
//! - `EventBus`: receive decoded server events (push-based subscription)
//! - `ConnectionHandle` / `ConnectionStateObserver`: lifecycle control and
//!   the connectivity indicator
//!
//! The WebSocket bridge (in the websocket module) connects these buses to the
//! connection manager.

pub mod command_bus;
pub mod connection;
pub mod event_bus;

pub use command_bus::{BusMessage, CommandBus};
pub use connection::{
    set_connection_state, ConnectionHandle, ConnectionState, ConnectionStateObserver,
};
pub use event_bus::EventBus;
