//! Unread-message badge and server notices.
//!
//! The unread count is never derived locally: read state lives on the
//! server, so a `MessageReceived` only marks the count stale and the next
//! refresh asks the message service.

use std::collections::VecDeque;

use argonvale_shared::{EventPayload, ServerEvent};

use crate::ports::outbound::MessageCountPort;

/// Oldest notices are dropped past this many.
pub const MAX_NOTICES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    /// The server refused a command (join, combat action).
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug)]
pub struct NotificationAggregator {
    unread: u32,
    stale: bool,
    notices: VecDeque<Notice>,
}

impl Default for NotificationAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationAggregator {
    /// Starts stale so the first refresh loads the badge.
    pub fn new() -> Self {
        Self {
            unread: 0,
            stale: true,
            notices: VecDeque::new(),
        }
    }

    pub fn unread_count(&self) -> u32 {
        self.unread
    }

    pub fn needs_refresh(&self) -> bool {
        self.stale
    }

    pub fn apply(&mut self, event: &ServerEvent) {
        match &event.payload {
            EventPayload::MessageReceived(_) => self.stale = true,
            EventPayload::Info(notice) => self.push(NoticeKind::Info, &notice.message),
            EventPayload::CommandRejected(notice) => {
                tracing::warn!(message = %notice.message, "server rejected command");
                self.push(NoticeKind::Rejected, &notice.message);
            }
            _ => {}
        }
    }

    fn push(&mut self, kind: NoticeKind, message: &str) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            kind,
            message: message.to_string(),
        });
    }

    /// Re-fetch the unread count if stale. On failure the last known count
    /// stays and the next `MessageReceived` triggers another attempt.
    pub async fn refresh(&mut self, port: &dyn MessageCountPort) -> u32 {
        if !self.stale {
            return self.unread;
        }
        self.stale = false;
        match port.unread_count().await {
            Ok(count) => {
                tracing::debug!(count, "unread count refreshed");
                self.unread = count;
            }
            Err(e) => tracing::warn!(error = %e, "failed to refresh unread count"),
        }
        self.unread
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}
