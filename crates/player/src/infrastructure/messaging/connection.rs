//! Connection lifecycle management.
//!
//! This module provides types for observing the game socket lifecycle and
//! for shutting the connection task down.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

/// Lifecycle state of the game socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No token yet; nothing has been attempted
    #[default]
    Idle,
    /// A socket attempt is in flight
    Connecting,
    /// The socket is open and commands go straight out
    Open,
    /// The socket is down (a reconnect may be scheduled)
    Closed,
}

impl ConnectionState {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Idle => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Open => 2,
            ConnectionState::Closed => 3,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Idle,
        }
    }

    /// `Connecting` or `Open`: a live socket attempt exists.
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Handle to shut the connection task down.
///
/// When this handle is dropped, it does NOT automatically disconnect.
/// Call `shutdown()` explicitly to stop the task and close the socket.
pub struct ConnectionHandle {
    state: Arc<AtomicU8>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ConnectionHandle {
    /// Called by the bridge when spawning the connection task.
    pub fn new(state: Arc<AtomicU8>, shutdown_tx: oneshot::Sender<()>) -> Self {
        Self {
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Stop the connection task. The socket is closed and buffered commands
    /// are discarded.
    ///
    /// This method consumes the handle since a stopped task cannot be
    /// restarted. Create a new connection instead.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn state_arc(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.state)
    }
}

/// Observable connection state for the connectivity indicator.
///
/// Multiple observers can share the same underlying state.
#[derive(Clone)]
pub struct ConnectionStateObserver {
    state: Arc<AtomicU8>,
}

impl ConnectionStateObserver {
    pub fn from_handle(handle: &ConnectionHandle) -> Self {
        Self {
            state: handle.state_arc(),
        }
    }

    pub fn new(state: Arc<AtomicU8>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

/// Internal helper to update connection state (used by bridge).
pub fn set_connection_state(state_ref: &AtomicU8, new_state: ConnectionState) {
    state_ref.store(new_state.to_u8(), Ordering::SeqCst);
}
