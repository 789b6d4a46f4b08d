//! The pending action the player is composing for the next turn.

use std::collections::HashSet;

use argonvale_shared::{EquippedItem, ItemId, Stance};
use thiserror::Error;

/// Most items that may be wielded in one attack.
pub const MAX_SELECTED_ITEMS: usize = 2;

/// A combat action refused before anything was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombatActionError {
    #[error("No battle is in progress")]
    NotActive,

    #[error("Frozen until turn {until}")]
    Frozen { until: u32 },

    #[error("Select at least one item to attack with")]
    NothingSelected,

    #[error("At most {max} items can be used in one attack")]
    TooManyItems { max: usize },

    #[error("Item {0} was already used this battle")]
    AlreadyUsed(ItemId),

    #[error("Item {0} is not equipped")]
    NotEquipped(ItemId),

    #[error("Item {0} is not a consumable")]
    NotConsumable(ItemId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionDraft {
    stance: Stance,
    selected: Vec<ItemId>,
}

impl ActionDraft {
    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn set_stance(&mut self, stance: Stance) {
        self.stance = stance;
    }

    /// Selected items in selection order.
    pub fn selected(&self) -> &[ItemId] {
        &self.selected
    }

    pub fn is_selected(&self, item: ItemId) -> bool {
        self.selected.contains(&item)
    }

    pub(crate) fn select(
        &mut self,
        item: ItemId,
        loadout: &[EquippedItem],
        used: &HashSet<ItemId>,
    ) -> Result<(), CombatActionError> {
        if self.is_selected(item) {
            return Ok(());
        }
        if used.contains(&item) {
            return Err(CombatActionError::AlreadyUsed(item));
        }
        if !loadout.iter().any(|equipped| equipped.id == item) {
            return Err(CombatActionError::NotEquipped(item));
        }
        if self.selected.len() >= MAX_SELECTED_ITEMS {
            return Err(CombatActionError::TooManyItems {
                max: MAX_SELECTED_ITEMS,
            });
        }
        self.selected.push(item);
        Ok(())
    }

    pub fn deselect(&mut self, item: ItemId) {
        self.selected.retain(|selected| *selected != item);
    }

    /// Drop selections the server has since reported as spent.
    pub(crate) fn prune(&mut self, used: &HashSet<ItemId>) -> usize {
        let before = self.selected.len();
        self.selected.retain(|item| !used.contains(item));
        before - self.selected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::equipped;

    fn loadout() -> Vec<EquippedItem> {
        vec![equipped(1, "weapon"), equipped(2, "weapon"), equipped(3, "weapon")]
    }

    #[test]
    fn selects_up_to_two_items() {
        let mut draft = ActionDraft::default();
        let used = HashSet::new();

        draft.select(ItemId::new(1), &loadout(), &used).unwrap();
        draft.select(ItemId::new(2), &loadout(), &used).unwrap();
        assert_eq!(
            draft.select(ItemId::new(3), &loadout(), &used),
            Err(CombatActionError::TooManyItems { max: 2 })
        );

        draft.deselect(ItemId::new(1));
        draft.select(ItemId::new(3), &loadout(), &used).unwrap();
        assert_eq!(draft.selected(), &[ItemId::new(2), ItemId::new(3)]);
    }

    #[test]
    fn reselecting_is_a_no_op() {
        let mut draft = ActionDraft::default();
        draft.select(ItemId::new(1), &loadout(), &HashSet::new()).unwrap();
        draft.select(ItemId::new(1), &loadout(), &HashSet::new()).unwrap();
        assert_eq!(draft.selected().len(), 1);
    }

    #[test]
    fn rejects_spent_and_foreign_items() {
        let mut draft = ActionDraft::default();
        let used: HashSet<_> = [ItemId::new(2)].into_iter().collect();

        assert_eq!(
            draft.select(ItemId::new(2), &loadout(), &used),
            Err(CombatActionError::AlreadyUsed(ItemId::new(2)))
        );
        assert_eq!(
            draft.select(ItemId::new(99), &loadout(), &used),
            Err(CombatActionError::NotEquipped(ItemId::new(99)))
        );
        assert!(draft.selected().is_empty());
    }

    #[test]
    fn prune_removes_spent_selections() {
        let mut draft = ActionDraft::default();
        draft.select(ItemId::new(1), &loadout(), &HashSet::new()).unwrap();
        draft.select(ItemId::new(2), &loadout(), &HashSet::new()).unwrap();

        let used: HashSet<_> = [ItemId::new(1)].into_iter().collect();
        assert_eq!(draft.prune(&used), 1);
        assert_eq!(draft.selected(), &[ItemId::new(2)]);
    }
}
