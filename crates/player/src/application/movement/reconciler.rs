//! Exploration state: optimistic local movement corrected by the server.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use argonvale_shared::{
    ClientCommand, Direction, EventPayload, ItemId, PlayerId, PlayerMoved, ServerEvent,
    TeleportPlayer, ZoneId,
};

use super::collision::CollisionGrid;
use crate::ports::outbound::StoredPosition;

/// Minimum gap between two accepted moves.
pub const DEFAULT_MOVE_INTERVAL: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherPlayer {
    pub x: i32,
    pub y: i32,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Position updated locally; send this command.
    Moved(ClientCommand),
    Throttled,
    Blocked,
    /// No collision grid yet for the current zone.
    ZoneLoading,
    /// Not a single orthogonal step.
    Idle,
}

/// Work the caller has to perform on behalf of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorationEffect {
    /// Fetch the collision grid for this zone, then call `install_grid`.
    LoadZone(ZoneId),
    PersistPosition(StoredPosition),
    Loot { coins: u32, items: Vec<ItemId> },
}

#[derive(Debug, Clone)]
pub struct MovementReconciler {
    local_id: PlayerId,
    zone: ZoneId,
    x: i32,
    y: i32,
    grid: Option<CollisionGrid>,
    others: HashMap<PlayerId, OtherPlayer>,
    min_interval: Duration,
    last_move_at: Option<Instant>,
}

impl MovementReconciler {
    /// Starts in `start.zone_id`, waiting for its grid.
    pub fn new(local_id: PlayerId, start: StoredPosition, min_interval: Duration) -> Self {
        Self {
            local_id,
            zone: start.zone_id,
            x: start.x,
            y: start.y,
            grid: None,
            others: HashMap::new(),
            min_interval,
            last_move_at: None,
        }
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn stored_position(&self) -> StoredPosition {
        StoredPosition {
            zone_id: self.zone.clone(),
            x: self.x,
            y: self.y,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.grid.is_none()
    }

    /// The load the caller still owes, if the grid is missing.
    pub fn pending_load(&self) -> Option<ExplorationEffect> {
        self.is_loading()
            .then(|| ExplorationEffect::LoadZone(self.zone.clone()))
    }

    pub fn others(&self) -> &HashMap<PlayerId, OtherPlayer> {
        &self.others
    }

    /// Predict a one-tile step.
    pub fn try_move(&mut self, direction: Direction, now: Instant) -> MoveOutcome {
        if !direction.is_unit_step() {
            return MoveOutcome::Idle;
        }
        let Some(grid) = &self.grid else {
            return MoveOutcome::ZoneLoading;
        };
        if let Some(last) = self.last_move_at {
            if now.saturating_duration_since(last) < self.min_interval {
                return MoveOutcome::Throttled;
            }
        }

        let (Some(nx), Some(ny)) = (
            self.x.checked_add(direction.dx),
            self.y.checked_add(direction.dy),
        ) else {
            return MoveOutcome::Blocked;
        };
        if !grid.is_passable(nx, ny) {
            tracing::trace!(x = nx, y = ny, zone = %self.zone, "move blocked");
            return MoveOutcome::Blocked;
        }

        self.x = nx;
        self.y = ny;
        self.last_move_at = Some(now);
        MoveOutcome::Moved(ClientCommand::Move {
            x: nx,
            y: ny,
            direction,
            zone_id: self.zone.clone(),
        })
    }

    /// Local zone change (portal, zone picker).
    pub fn travel_to(&mut self, zone: ZoneId) -> Option<ExplorationEffect> {
        if zone == self.zone && self.grid.is_some() {
            return None;
        }
        Some(self.change_zone(zone))
    }

    fn change_zone(&mut self, zone: ZoneId) -> ExplorationEffect {
        tracing::info!(from = %self.zone, to = %zone, "changing zone");
        self.zone = zone.clone();
        self.grid = None;
        self.others.clear();
        self.last_move_at = None;
        ExplorationEffect::LoadZone(zone)
    }

    /// Complete a zone load. Loads for a zone we already left are ignored.
    pub fn install_grid(&mut self, zone: &ZoneId, grid: CollisionGrid) -> Option<ExplorationEffect> {
        if *zone != self.zone {
            tracing::debug!(loaded = %zone, current = %self.zone, "discarding grid for a zone we left");
            return None;
        }

        let valid = grid.is_passable(self.x, self.y);
        let center = grid.center();
        self.grid = Some(grid);
        if valid {
            return None;
        }

        tracing::warn!(
            zone = %self.zone,
            x = self.x,
            y = self.y,
            "position invalid for zone, resetting to centre"
        );
        (self.x, self.y) = center;
        Some(ExplorationEffect::PersistPosition(self.stored_position()))
    }

    pub fn apply(&mut self, event: &ServerEvent) -> Option<ExplorationEffect> {
        match &event.payload {
            EventPayload::PlayerMoved(moved) => {
                self.apply_moved(moved);
                None
            }
            EventPayload::PlayerDisconnected(gone) => {
                self.others.remove(&gone.player_id);
                None
            }
            EventPayload::TeleportPlayer(teleport) => self.apply_teleport(teleport),
            EventPayload::LootFound(loot) if loot.player_id == self.local_id => {
                Some(ExplorationEffect::Loot {
                    coins: loot.coins_found,
                    items: loot.item_ids_found.clone(),
                })
            }
            _ => None,
        }
    }

    fn apply_moved(&mut self, moved: &PlayerMoved) {
        if moved.player_id == self.local_id {
            return;
        }
        if moved.zone_id.as_ref().is_some_and(|zone| *zone != self.zone) {
            return;
        }
        self.others.insert(
            moved.player_id,
            OtherPlayer {
                x: moved.x,
                y: moved.y,
                username: moved.username.clone(),
            },
        );
    }

    /// Server correction: overrides any prediction, including in-flight moves.
    fn apply_teleport(&mut self, teleport: &TeleportPlayer) -> Option<ExplorationEffect> {
        if teleport.player_id.is_some_and(|id| id != self.local_id) {
            return None;
        }
        self.x = teleport.x;
        self.y = teleport.y;
        tracing::debug!(x = teleport.x, y = teleport.y, "teleported");

        match &teleport.zone_id {
            Some(zone) if *zone != self.zone => Some(self.change_zone(zone.clone())),
            _ => None,
        }
    }
}
