//! Transport Port - the raw message socket under the connection manager
//!
//! The port is deliberately synchronous and fire-and-forget: `open` starts a
//! connection attempt and returns immediately, and the adapter later reports
//! what happened as [`TransportEvent`]s tagged with the attempt they belong to.
//! This keeps the connection manager free of any async runtime.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Identity of one socket attempt. Strictly increasing per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no open socket for attempt {0}")]
    NotOpen(AttemptId),
    #[error("failed to start connection: {0}")]
    Open(String),
    #[error("failed to send frame: {0}")]
    Send(String),
}

/// Notification from a transport adapter back to the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub attempt: AttemptId,
    pub kind: TransportEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// The socket finished its handshake
    Opened,
    /// One UTF-8 text frame
    Text(String),
    /// The socket closed or failed (including failure to connect)
    Closed { reason: String },
}

impl TransportEvent {
    pub fn opened(attempt: AttemptId) -> Self {
        Self {
            attempt,
            kind: TransportEventKind::Opened,
        }
    }

    pub fn text(attempt: AttemptId, text: impl Into<String>) -> Self {
        Self {
            attempt,
            kind: TransportEventKind::Text(text.into()),
        }
    }

    pub fn closed(attempt: AttemptId, reason: impl Into<String>) -> Self {
        Self {
            attempt,
            kind: TransportEventKind::Closed {
                reason: reason.into(),
            },
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TransportPort: Send {
    /// Start connecting to `url`. Completion is reported asynchronously.
    fn open(&mut self, url: &Url, attempt: AttemptId) -> Result<(), TransportError>;

    /// Queue one text frame on the socket of `attempt`.
    fn send(&mut self, attempt: AttemptId, text: &str) -> Result<(), TransportError>;

    /// Close the socket of `attempt`, if it is still the live one.
    fn close(&mut self, attempt: AttemptId);
}
