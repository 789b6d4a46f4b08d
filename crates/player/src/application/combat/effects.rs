//! Presentation effects emitted by combat transitions.
//!
//! A renderer turns these into floating damage numbers, shakes and sounds.
//! The reconciler never touches the rendering surface itself.

use argonvale_shared::{CombatId, CombatMode};

use super::state::{CombatOutcome, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEffect {
    BattleStarted { combat_id: CombatId, mode: CombatMode },
    /// `target` took `amount` damage.
    Hit {
        target: Side,
        amount: i64,
        critical: bool,
    },
    /// `by` blocked the incoming action.
    Blocked { by: Side },
    Healed { side: Side },
    /// A turn with no visible impact (missed, stance change, frozen skip).
    Acted { actor: Side },
    Resolved { outcome: CombatOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Hit,
    Block,
    LevelUp,
}

impl Sound {
    /// Asset key used by the sound manager.
    pub fn key(self) -> &'static str {
        match self {
            Sound::Hit => "hit",
            Sound::Block => "block",
            Sound::LevelUp => "levelUp",
        }
    }
}

impl CombatEffect {
    pub fn sound(&self) -> Option<Sound> {
        match self {
            CombatEffect::Hit { .. } => Some(Sound::Hit),
            CombatEffect::Blocked { .. } => Some(Sound::Block),
            CombatEffect::Resolved {
                outcome: CombatOutcome::Win,
            } => Some(Sound::LevelUp),
            _ => None,
        }
    }

    /// Classify a processed turn by its damage and narration.
    pub(crate) fn for_turn(actor: Side, damage: i64, description: &str) -> Self {
        if damage > 0 {
            return CombatEffect::Hit {
                target: actor.other(),
                amount: damage,
                critical: description.contains("CRITICAL"),
            };
        }
        if description.contains("block") || description.contains("defensive") {
            CombatEffect::Blocked { by: actor.other() }
        } else if description.contains("restore") || description.contains("heal") {
            CombatEffect::Healed { side: actor }
        } else {
            CombatEffect::Acted { actor }
        }
    }
}
