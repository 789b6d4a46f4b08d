//! Combat reconciliation: battle state derived from the event log, plus the
//! pending action the player is composing.

mod draft;
mod effects;
mod reconciler;
mod state;

pub use draft::{ActionDraft, CombatActionError, MAX_SELECTED_ITEMS};
pub use effects::{CombatEffect, Sound};
pub use reconciler::CombatReconciler;
pub use state::{
    CombatEntry, CombatOutcome, CombatPhase, CombatRewards, Side, SideState, StatusWindow,
};
