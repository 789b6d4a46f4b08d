//! Game session: one event log feeding the mounted views.
//!
//! Views (combat screen, exploration map) mount with a cursor at the log
//! tail and only see events accepted after they mounted. Unmounting simply
//! drops the reader; later events for that view are not reconciled.

use std::time::Duration;

use argonvale_shared::{ClientCommand, PlayerId, ServerEvent};

use super::combat::{CombatEffect, CombatEntry, CombatReconciler};
use super::event_log::{EventLog, LogCursor};
use super::movement::{ExplorationEffect, MovementReconciler};
use super::notifications::NotificationAggregator;
use crate::ports::outbound::StoredPosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Combat(CombatEffect),
    Exploration(ExplorationEffect),
}

#[derive(Debug)]
struct Mounted<R> {
    view: R,
    cursor: LogCursor,
}

#[derive(Debug)]
pub struct GameSession {
    local_id: PlayerId,
    log: EventLog,
    combat: Option<Mounted<CombatReconciler>>,
    exploration: Option<Mounted<MovementReconciler>>,
    notifications: NotificationAggregator,
    notifications_cursor: LogCursor,
}

impl GameSession {
    pub fn new(local_id: PlayerId) -> Self {
        let log = EventLog::new();
        let notifications_cursor = log.head();
        Self {
            local_id,
            log,
            combat: None,
            exploration: None,
            notifications: NotificationAggregator::new(),
            notifications_cursor,
        }
    }

    pub fn local_id(&self) -> PlayerId {
        self.local_id
    }

    /// Append an inbound event. Returns `false` for duplicates.
    pub fn ingest(&mut self, event: ServerEvent) -> bool {
        self.log.append(event)
    }

    /// Let every mounted view read the events accepted since the last pump.
    pub fn pump(&mut self) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        for event in self.log.read(&mut self.notifications_cursor) {
            self.notifications.apply(event);
        }

        if let Some(mounted) = &mut self.exploration {
            for event in self.log.read(&mut mounted.cursor) {
                if let Some(effect) = mounted.view.apply(event) {
                    effects.push(SessionEffect::Exploration(effect));
                }
            }
        }

        if let Some(mounted) = &mut self.combat {
            for event in self.log.read(&mut mounted.cursor) {
                if let Some(effect) = mounted.view.apply(event) {
                    effects.push(SessionEffect::Combat(effect));
                }
            }
        }

        // Every reader is now at the tail.
        self.log.compact(self.log.tail());
        effects
    }

    /// Mount a combat view and return the command that joins the battle.
    /// Send it only after mounting so the `CombatStarted` reply is seen.
    pub fn mount_combat(&mut self, entry: CombatEntry) -> ClientCommand {
        let view = CombatReconciler::new(self.local_id, entry);
        let join = view.join_command();
        tracing::debug!(command = join.kind(), "combat view mounted");
        self.combat = Some(Mounted {
            view,
            cursor: self.log.tail(),
        });
        join
    }

    pub fn unmount_combat(&mut self) -> Option<CombatReconciler> {
        self.combat.take().map(|mounted| mounted.view)
    }

    pub fn combat(&self) -> Option<&CombatReconciler> {
        self.combat.as_ref().map(|mounted| &mounted.view)
    }

    pub fn combat_mut(&mut self) -> Option<&mut CombatReconciler> {
        self.combat.as_mut().map(|mounted| &mut mounted.view)
    }

    /// Mount the exploration view at `start`. Returns the zone load it needs.
    pub fn mount_exploration(
        &mut self,
        start: StoredPosition,
        move_interval: Duration,
    ) -> Option<ExplorationEffect> {
        let view = MovementReconciler::new(self.local_id, start, move_interval);
        let load = view.pending_load();
        self.exploration = Some(Mounted {
            view,
            cursor: self.log.tail(),
        });
        load
    }

    pub fn unmount_exploration(&mut self) -> Option<MovementReconciler> {
        self.exploration.take().map(|mounted| mounted.view)
    }

    pub fn exploration(&self) -> Option<&MovementReconciler> {
        self.exploration.as_ref().map(|mounted| &mounted.view)
    }

    pub fn exploration_mut(&mut self) -> Option<&mut MovementReconciler> {
        self.exploration.as_mut().map(|mounted| &mut mounted.view)
    }

    pub fn notifications(&self) -> &NotificationAggregator {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationAggregator {
        &mut self.notifications
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}
