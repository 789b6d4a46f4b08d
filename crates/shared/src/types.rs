//! Shared enums and value objects carried inside messages.

use serde::{Deserialize, Serialize};

use crate::ids::{CompanionId, ItemId};

/// Whether a combat is against the environment or another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatMode {
    #[default]
    Pve,
    Pvp,
}

impl std::fmt::Display for CombatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombatMode::Pve => write!(f, "pve"),
            CombatMode::Pvp => write!(f, "pvp"),
        }
    }
}

/// Combat stance chosen for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Normal,
    Berserk,
    Defensive,
}

/// Kind of combat action submitted by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Attack,
    UseItem,
}

/// A unit step on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Direction {
    pub dx: i32,
    pub dy: i32,
}

impl Direction {
    pub const UP: Direction = Direction { dx: 0, dy: -1 };
    pub const DOWN: Direction = Direction { dx: 0, dy: 1 };
    pub const LEFT: Direction = Direction { dx: -1, dy: 0 };
    pub const RIGHT: Direction = Direction { dx: 1, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub const fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Exactly one tile along one axis.
    pub const fn is_unit_step(self) -> bool {
        matches!((self.dx, self.dy), (0, 1) | (0, -1) | (1, 0) | (-1, 0))
    }
}

/// Item equipped by the player when a battle starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub stats: serde_json::Value,
}

impl EquippedItem {
    pub fn is_consumable(&self) -> bool {
        self.item_type == "potion"
    }
}

/// Initial battle context attached to `CombatStarted`.
///
/// The server fills this from the profile/companion/inventory services.
/// Every field defaults so older servers that omit parts still decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleContext {
    pub enemy_name: String,
    pub enemy_hp: i64,
    pub enemy_max_hp: i64,
    pub enemy_type: String,
    pub player_hp: i64,
    pub player_max_hp: i64,
    pub companion_id: Option<CompanionId>,
    pub companion_name: String,
    pub equipped_items: Vec<EquippedItem>,
}
