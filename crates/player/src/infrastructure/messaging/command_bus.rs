//! Command Bus for driving the connection task.
//!
//! Every outbound intent (connect with a token, send a command, close) goes
//! through this bus to the single task that owns the connection manager, so
//! nothing else ever touches the socket or the outbound buffer.

use anyhow::Result;
use argonvale_shared::ClientCommand;
use tokio::sync::mpsc;

/// Message types sent through the command bus to the connection task.
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    /// Connect (or re-authenticate) with a bearer token
    Connect(String),
    /// Fire-and-forget command; buffered while the socket is down
    Send(ClientCommand),
    /// Log out: close the socket and drop buffered commands
    Close,
}

/// Command bus for the connection task.
///
/// This is a concrete struct (not a trait) that can be cloned and shared.
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<BusMessage>,
}

impl CommandBus {
    pub fn new(tx: mpsc::Sender<BusMessage>) -> Self {
        Self { tx }
    }

    /// Send a fire-and-forget command.
    ///
    /// Returns immediately after queueing the message. The result of the
    /// command arrives later as an event, never through this call.
    pub fn send(&self, command: ClientCommand) -> Result<()> {
        self.push(BusMessage::Send(command))
    }

    pub fn connect(&self, token: impl Into<String>) -> Result<()> {
        self.push(BusMessage::Connect(token.into()))
    }

    pub fn close(&self) -> Result<()> {
        self.push(BusMessage::Close)
    }

    fn push(&self, message: BusMessage) -> Result<()> {
        self.tx
            .try_send(message)
            .map_err(|e| anyhow::anyhow!("CommandBus send failed: {}", e))
    }
}
