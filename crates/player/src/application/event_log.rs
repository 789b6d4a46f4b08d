//! Append-only, deduplicated log of accepted server events.
//!
//! The log is the single source of truth for every reconciler. It has one
//! writer (the session's ingest) and any number of readers, each holding a
//! [`LogCursor`] that remembers how far it has read.
//!
//! Identity for dedup is the server `event_id`. Events without one fall back
//! to a composite key where the payload carries natural identity; the rest
//! (moves, teleports, notices) are always accepted.

use std::collections::HashSet;

use argonvale_shared::{CombatId, EventId, EventPayload, PlayerId, ServerEvent};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Id(EventId),
    CombatStarted(CombatId),
    CombatEnded(CombatId),
    Turn {
        combat_id: CombatId,
        turn_number: u32,
        actor_id: PlayerId,
    },
}

impl DedupKey {
    /// The key `event` is deduplicated under, if any.
    pub fn of(event: &ServerEvent) -> Option<DedupKey> {
        if let Some(id) = &event.event_id {
            return Some(DedupKey::Id(id.clone()));
        }
        match &event.payload {
            EventPayload::CombatStarted(started) => {
                Some(DedupKey::CombatStarted(started.combat_id.clone()))
            }
            EventPayload::CombatEnded(ended) => Some(DedupKey::CombatEnded(ended.combat_id.clone())),
            EventPayload::TurnProcessed(turn) => Some(DedupKey::Turn {
                combat_id: turn.combat_id.clone(),
                turn_number: turn.turn_number,
                actor_id: turn.actor_id,
            }),
            // Teleports are corrections and must never be suppressed by
            // anything but their own server id.
            EventPayload::TeleportPlayer(_)
            | EventPayload::PlayerMoved(_)
            | EventPayload::PlayerDisconnected(_)
            | EventPayload::MessageReceived(_)
            | EventPayload::LootFound(_)
            | EventPayload::Info(_)
            | EventPayload::CommandRejected(_) => None,
        }
    }
}

/// A reader's position in the log (absolute sequence number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogCursor(u64);

impl LogCursor {
    pub fn position(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct EventLog {
    seen: HashSet<DedupKey>,
    entries: Vec<ServerEvent>,
    /// Sequence number of `entries[0]`.
    base: u64,
    duplicates: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` unless its identity was seen before.
    ///
    /// Returns `true` if the event was accepted.
    pub fn append(&mut self, event: ServerEvent) -> bool {
        if let Some(key) = DedupKey::of(&event) {
            if !self.seen.insert(key) {
                self.duplicates += 1;
                tracing::debug!(
                    kind = event.kind(),
                    event_id = event.event_id.as_ref().map(|id| id.as_str()),
                    "dropping duplicate event"
                );
                return false;
            }
        }
        self.entries.push(event);
        true
    }

    pub fn has_seen(&self, event: &ServerEvent) -> bool {
        DedupKey::of(event).is_some_and(|key| self.seen.contains(&key))
    }

    /// Cursor positioned after the last appended event. A reader created here
    /// only sees events appended from now on.
    pub fn tail(&self) -> LogCursor {
        LogCursor(self.base + self.entries.len() as u64)
    }

    /// Cursor at the oldest retained event.
    pub fn head(&self) -> LogCursor {
        LogCursor(self.base)
    }

    /// Events appended since `cursor`, advancing it to the tail.
    pub fn read(&self, cursor: &mut LogCursor) -> &[ServerEvent] {
        let start = cursor.0.saturating_sub(self.base).min(self.entries.len() as u64) as usize;
        *cursor = self.tail();
        &self.entries[start..]
    }

    /// Release events every reader has already passed. Dedup keys are kept,
    /// so compacted events are still recognised as duplicates.
    pub fn compact(&mut self, min_cursor: LogCursor) {
        let drop_count = min_cursor
            .0
            .saturating_sub(self.base)
            .min(self.entries.len() as u64) as usize;
        if drop_count == 0 {
            return;
        }
        self.entries.drain(..drop_count);
        self.base += drop_count as u64;
        tracing::trace!(dropped = drop_count, retained = self.entries.len(), "event log compacted");
    }

    /// Events currently retained.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events accepted over the log's lifetime.
    pub fn accepted(&self) -> u64 {
        self.base + self.entries.len() as u64
    }

    /// Duplicates rejected over the log's lifetime.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }
}
