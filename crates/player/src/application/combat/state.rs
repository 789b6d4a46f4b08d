//! Value types describing one battle from the local player's perspective.

use std::fmt;

use argonvale_shared::{CombatId, CombatMode, CompanionId, PlayerId};

/// Which battle the player is waiting to enter.
///
/// A reconciler only activates on a `CombatStarted` that matches its entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEntry {
    /// A wild encounter. `combat_id` is known when the encounter was joined
    /// from an exploration trigger, unknown when resuming.
    PvE {
        companion_id: CompanionId,
        combat_id: Option<CombatId>,
    },
    /// A matchmaking queue entry; the combat id is assigned by the server.
    PvP { companion_id: CompanionId },
}

impl CombatEntry {
    pub fn mode(&self) -> CombatMode {
        match self {
            CombatEntry::PvE { .. } => CombatMode::Pve,
            CombatEntry::PvP { .. } => CombatMode::Pvp,
        }
    }

    pub fn companion_id(&self) -> CompanionId {
        match self {
            CombatEntry::PvE { companion_id, .. } | CombatEntry::PvP { companion_id } => {
                *companion_id
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatOutcome {
    Win,
    Loss,
    Draw,
}

impl CombatOutcome {
    /// PvP: the local player must be the winner; winner `0` is a draw.
    pub fn for_pvp(winner: PlayerId, local: PlayerId) -> Self {
        if winner.is_none() {
            CombatOutcome::Draw
        } else if winner == local {
            CombatOutcome::Win
        } else {
            CombatOutcome::Loss
        }
    }

    /// PvE: the wild side is always `0`, so any non-zero winner is the player.
    pub fn for_pve(winner: PlayerId) -> Self {
        if winner.is_none() {
            CombatOutcome::Loss
        } else {
            CombatOutcome::Win
        }
    }
}

impl fmt::Display for CombatOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatOutcome::Win => write!(f, "win"),
            CombatOutcome::Loss => write!(f, "loss"),
            CombatOutcome::Draw => write!(f, "draw"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatPhase {
    #[default]
    NotStarted,
    Active,
    Resolved(CombatOutcome),
}

impl CombatPhase {
    pub fn is_active(self) -> bool {
        matches!(self, CombatPhase::Active)
    }

    pub fn outcome(self) -> Option<CombatOutcome> {
        match self {
            CombatPhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Perspective used to attribute effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Local,
    Opponent,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Local => Side::Opponent,
            Side::Opponent => Side::Local,
        }
    }
}

/// A turn-indexed status interval: active at turn `t` iff `t <= until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusWindow {
    until: u32,
}

impl StatusWindow {
    pub const fn until(until: u32) -> Self {
        Self { until }
    }

    pub const fn last_turn(self) -> u32 {
        self.until
    }

    pub const fn is_active(self, turn: u32) -> bool {
        turn <= self.until
    }

    /// Turns left including `turn` itself.
    pub const fn remaining(self, turn: u32) -> u32 {
        if turn <= self.until {
            self.until - turn + 1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SideState {
    pub player_id: Option<PlayerId>,
    pub companion_id: Option<CompanionId>,
    pub name: String,
    pub hp: i64,
    pub max_hp: i64,
    pub frozen: StatusWindow,
    pub stealth: StatusWindow,
}

impl SideState {
    pub(crate) fn set_hp(&mut self, hp: i64) {
        self.hp = hp.max(0);
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

/// Rewards reported by `CombatEnded`, kept as the server sent them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombatRewards {
    pub xp_gained: u32,
    pub loot: Option<serde_json::Value>,
    pub dropped_item: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_window_is_inclusive_of_its_last_turn() {
        let frozen = StatusWindow::until(4);
        assert!(frozen.is_active(3));
        assert!(frozen.is_active(4));
        assert!(!frozen.is_active(5));
        assert_eq!(frozen.remaining(3), 2);
        assert_eq!(frozen.remaining(5), 0);
    }

    #[test]
    fn default_window_is_inactive_from_the_first_turn() {
        assert!(!StatusWindow::default().is_active(1));
    }

    #[test]
    fn pvp_outcomes() {
        let me = PlayerId::new(7);
        assert_eq!(CombatOutcome::for_pvp(me, me), CombatOutcome::Win);
        assert_eq!(CombatOutcome::for_pvp(PlayerId::NONE, me), CombatOutcome::Draw);
        assert_eq!(CombatOutcome::for_pvp(PlayerId::new(8), me), CombatOutcome::Loss);
    }

    #[test]
    fn pve_outcomes() {
        assert_eq!(CombatOutcome::for_pve(PlayerId::new(3)), CombatOutcome::Win);
        assert_eq!(CombatOutcome::for_pve(PlayerId::NONE), CombatOutcome::Loss);
    }

    #[test]
    fn hp_never_goes_negative() {
        let mut side = SideState::default();
        side.set_hp(-12);
        assert_eq!(side.hp, 0);
        assert!(side.is_defeated());
    }
}
