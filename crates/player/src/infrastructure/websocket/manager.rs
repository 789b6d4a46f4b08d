//! Connection manager: the single owner of the game socket.
//!
//! The manager is a plain state machine. It owns the transport port, the
//! outbound FIFO buffer, the bearer token and the reconnect schedule, and it
//! never blocks or spawns: time arrives as `Instant` arguments and transport
//! outcomes arrive through the `on_*` methods. The tokio bridge drives it.
//!
//! Lifecycle:
//!
//! ```text
//! Idle --connect--> Connecting --opened--> Open
//!                       ^   |                |
//!                       |   +--closed/error--+--> Closed (reconnect scheduled)
//!                       +--------reconnect due-------+
//! ```
//!
//! `close()` from any state cancels the schedule and drops the buffer.

use std::collections::VecDeque;
use std::time::Instant;

use argonvale_shared::{decode_frame, ClientCommand, ServerEvent};
use url::Url;

use super::core::{BackoffState, ReconnectPolicy};
use super::shared::build_connect_url;
use crate::infrastructure::messaging::ConnectionState;
use crate::ports::outbound::{AttemptId, TransportEvent, TransportEventKind, TransportPort};

/// What happened to a command handed to [`ConnectionManager::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the open socket
    Sent,
    /// Held in the outbound buffer until the socket opens
    Buffered,
    /// Could not be serialized; discarded
    Dropped,
}

pub struct ConnectionManager<T: TransportPort> {
    transport: T,
    base_url: Url,
    token: Option<String>,
    state: ConnectionState,
    live_attempt: Option<AttemptId>,
    last_attempt: AttemptId,
    outbound: VecDeque<ClientCommand>,
    backoff: BackoffState,
    reconnect_at: Option<Instant>,
}

impl<T: TransportPort> ConnectionManager<T> {
    pub fn new(transport: T, base_url: Url, policy: ReconnectPolicy) -> Self {
        Self {
            transport,
            base_url,
            token: None,
            state: ConnectionState::Idle,
            live_attempt: None,
            last_attempt: AttemptId::new(0),
            outbound: VecDeque::new(),
            backoff: BackoffState::new(policy),
            reconnect_at: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Number of commands waiting for the socket to open.
    pub fn buffered(&self) -> usize {
        self.outbound.len()
    }

    pub fn live_attempt(&self) -> Option<AttemptId> {
        self.live_attempt
    }

    /// When the pending reconnection attempt is due, if one is scheduled.
    pub fn next_reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Open the socket with `token`.
    ///
    /// A second call with the same token while an attempt is `Connecting` or
    /// `Open` is a no-op. A different token tears the current socket down and
    /// starts over; buffered commands are kept.
    pub fn connect(&mut self, token: impl Into<String>, now: Instant) {
        let token = token.into();
        if self.token.as_deref() == Some(token.as_str()) && self.state.is_live() {
            tracing::debug!(state = %self.state, "connect ignored, socket attempt already live");
            return;
        }
        if self.live_attempt.is_some() {
            tracing::info!("token changed, replacing game socket");
            self.drop_socket();
        }

        self.token = Some(token);
        self.reconnect_at = None;
        self.backoff.reset();
        self.open_attempt(now);
    }

    /// Follow the auth token: `Some` connects (or re-authenticates), `None`
    /// behaves like [`close`](Self::close).
    pub fn set_token(&mut self, token: Option<String>, now: Instant) {
        match token {
            Some(token) => self.connect(token, now),
            None => self.close(),
        }
    }

    /// Transmit `command` now if the socket is open, otherwise buffer it.
    pub fn send(&mut self, command: ClientCommand, now: Instant) -> SendOutcome {
        let attempt = match (self.state, self.live_attempt) {
            (ConnectionState::Open, Some(attempt)) => attempt,
            _ => {
                tracing::debug!(
                    command = command.kind(),
                    state = %self.state,
                    buffered = self.outbound.len() + 1,
                    "socket not open, buffering command"
                );
                self.outbound.push_back(command);
                return SendOutcome::Buffered;
            }
        };

        let text = match serde_json::to_string(&command) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(command = command.kind(), error = %e, "failed to encode command");
                return SendOutcome::Dropped;
            }
        };

        match self.transport.send(attempt, &text) {
            Ok(()) => {
                tracing::debug!(command = command.kind(), %attempt, "command sent");
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(command = command.kind(), error = %e, "send failed, buffering command");
                self.outbound.push_back(command);
                self.fault(now, &e.to_string());
                SendOutcome::Buffered
            }
        }
    }

    /// The transport finished the handshake for `attempt`. Flushes the
    /// buffer in FIFO order and returns how many commands went out.
    pub fn on_open(&mut self, attempt: AttemptId, now: Instant) -> usize {
        if !self.is_current(attempt) || self.state != ConnectionState::Connecting {
            tracing::debug!(%attempt, "ignoring open from stale attempt");
            return 0;
        }

        self.state = ConnectionState::Open;
        self.backoff.reset();
        tracing::info!(%attempt, buffered = self.outbound.len(), "game socket open");
        self.flush(attempt, now)
    }

    /// One text frame arrived. Returns the decoded events in frame order;
    /// malformed elements are logged and dropped.
    pub fn on_text(&mut self, attempt: AttemptId, text: &str) -> Vec<ServerEvent> {
        if !self.is_current(attempt) {
            tracing::debug!(%attempt, "dropping frame from stale attempt");
            return Vec::new();
        }

        match decode_frame(text) {
            Ok(frame) => {
                for error in &frame.rejected {
                    tracing::warn!(%error, "dropping malformed event");
                }
                frame.events
            }
            Err(error) => {
                tracing::warn!(%error, len = text.len(), "dropping unparseable frame");
                Vec::new()
            }
        }
    }

    /// The socket of `attempt` closed or failed.
    pub fn on_closed(&mut self, attempt: AttemptId, reason: &str, now: Instant) {
        if !self.is_current(attempt) {
            tracing::debug!(%attempt, reason, "ignoring close from stale attempt");
            return;
        }
        self.fault(now, reason);
    }

    /// Route one adapter notification to the matching `on_*` method.
    pub fn handle_transport_event(&mut self, event: TransportEvent, now: Instant) -> Vec<ServerEvent> {
        match event.kind {
            TransportEventKind::Opened => {
                self.on_open(event.attempt, now);
                Vec::new()
            }
            TransportEventKind::Text(text) => self.on_text(event.attempt, &text),
            TransportEventKind::Closed { reason } => {
                self.on_closed(event.attempt, &reason, now);
                Vec::new()
            }
        }
    }

    /// Start the scheduled reconnection attempt if it is due.
    pub fn poll_reconnect(&mut self, now: Instant) -> bool {
        match self.reconnect_at {
            Some(at) if at <= now => {
                self.reconnect_at = None;
                if self.token.is_none() {
                    return false;
                }
                tracing::info!(attempt = self.backoff.attempts(), "reconnecting game socket");
                self.open_attempt(now);
                true
            }
            _ => false,
        }
    }

    /// Log out: cancel reconnection, close the socket, forget the token and
    /// discard buffered commands.
    pub fn close(&mut self) {
        self.reconnect_at = None;
        self.drop_socket();
        let discarded = self.outbound.len();
        self.outbound.clear();
        self.token = None;
        self.backoff.reset();
        self.state = ConnectionState::Closed;
        tracing::info!(discarded, "game socket closed");
    }

    fn open_attempt(&mut self, now: Instant) {
        let Some(token) = self.token.as_deref() else {
            return;
        };
        let url = build_connect_url(&self.base_url, token);
        let attempt = self.last_attempt.next();
        self.last_attempt = attempt;
        self.live_attempt = Some(attempt);
        self.state = ConnectionState::Connecting;
        tracing::info!(%attempt, base = %self.base_url, "opening game socket");

        if let Err(e) = self.transport.open(&url, attempt) {
            tracing::warn!(%attempt, error = %e, "failed to start socket attempt");
            self.fault(now, &e.to_string());
        }
    }

    fn flush(&mut self, attempt: AttemptId, now: Instant) -> usize {
        let mut flushed = 0;
        while let Some(command) = self.outbound.pop_front() {
            let text = match serde_json::to_string(&command) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(command = command.kind(), error = %e, "dropping unencodable command");
                    continue;
                }
            };
            if let Err(e) = self.transport.send(attempt, &text) {
                tracing::warn!(error = %e, remaining = self.outbound.len() + 1, "flush interrupted");
                self.outbound.push_front(command);
                self.fault(now, &e.to_string());
                break;
            }
            flushed += 1;
        }
        if flushed > 0 {
            tracing::debug!(flushed, "flushed buffered commands");
        }
        flushed
    }

    fn drop_socket(&mut self) {
        if let Some(attempt) = self.live_attempt.take() {
            self.transport.close(attempt);
        }
    }

    /// Transport fault: mark closed and schedule exactly one reconnection.
    fn fault(&mut self, now: Instant, reason: &str) {
        self.drop_socket();
        self.state = ConnectionState::Closed;
        if self.token.is_none() || self.reconnect_at.is_some() {
            return;
        }
        let delay = self.backoff.next_delay_and_advance();
        self.reconnect_at = Some(now + delay);
        tracing::warn!(
            reason,
            attempt = self.backoff.attempts(),
            delay_ms = delay.as_millis() as u64,
            "game socket lost, reconnect scheduled"
        );
    }

    fn is_current(&self, attempt: AttemptId) -> bool {
        self.live_attempt == Some(attempt)
    }
}
