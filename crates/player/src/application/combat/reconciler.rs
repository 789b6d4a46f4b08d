//! Combat session state machine.
//!
//! `NotStarted -> Active -> Resolved`. Transitions are driven only by
//! events read from the event log; player actions produce commands but
//! never change state optimistically.

use std::collections::HashSet;

use argonvale_shared::{
    ActionType, ClientCommand, CombatEnded, CombatId, CombatMode, CombatStarted, CompanionId,
    EquippedItem, EventPayload, ItemId, PlayerId, ServerEvent, Stance, TurnProcessed,
};

use super::draft::{ActionDraft, CombatActionError};
use super::effects::CombatEffect;
use super::state::{
    CombatEntry, CombatOutcome, CombatPhase, CombatRewards, Side, SideState, StatusWindow,
};

#[derive(Debug, Clone)]
pub struct CombatReconciler {
    local_id: PlayerId,
    entry: CombatEntry,
    phase: CombatPhase,
    combat_id: Option<CombatId>,
    mode: CombatMode,
    local_is_attacker: bool,
    turn: u32,
    local: SideState,
    opponent: SideState,
    loadout: Vec<EquippedItem>,
    used_items: HashSet<ItemId>,
    log: Vec<String>,
    rewards: Option<CombatRewards>,
    draft: ActionDraft,
}

impl CombatReconciler {
    pub fn new(local_id: PlayerId, entry: CombatEntry) -> Self {
        let mode = entry.mode();
        Self {
            local_id,
            entry,
            phase: CombatPhase::NotStarted,
            combat_id: None,
            mode,
            local_is_attacker: true,
            turn: 1,
            local: SideState::default(),
            opponent: SideState::default(),
            loadout: Vec::new(),
            used_items: HashSet::new(),
            log: Vec::new(),
            rewards: None,
            draft: ActionDraft::default(),
        }
    }

    // =========================================================================
    // Read side
    // =========================================================================

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn entry(&self) -> &CombatEntry {
        &self.entry
    }

    pub fn combat_id(&self) -> Option<&CombatId> {
        self.combat_id.as_ref()
    }

    pub fn mode(&self) -> CombatMode {
        self.mode
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn local(&self) -> &SideState {
        &self.local
    }

    pub fn opponent(&self) -> &SideState {
        &self.opponent
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Local => &self.local,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn is_frozen(&self, side: Side) -> bool {
        self.side(side).frozen.is_active(self.turn)
    }

    pub fn is_stealthed(&self, side: Side) -> bool {
        self.side(side).stealth.is_active(self.turn)
    }

    pub fn loadout(&self) -> &[EquippedItem] {
        &self.loadout
    }

    pub fn used_items(&self) -> &HashSet<ItemId> {
        &self.used_items
    }

    /// Turn narration in arrival order.
    pub fn combat_log(&self) -> &[String] {
        &self.log
    }

    pub fn rewards(&self) -> Option<&CombatRewards> {
        self.rewards.as_ref()
    }

    pub fn draft(&self) -> &ActionDraft {
        &self.draft
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Apply one accepted event, returning the presentation effect it causes.
    ///
    /// Events that do not belong to this battle (or arrive in the wrong phase)
    /// leave the state untouched and return `None`.
    pub fn apply(&mut self, event: &ServerEvent) -> Option<CombatEffect> {
        match (&event.payload, self.phase) {
            (EventPayload::CombatStarted(started), CombatPhase::NotStarted) => self.start(started),
            (EventPayload::TurnProcessed(turn), CombatPhase::Active) => self.apply_turn(turn),
            (EventPayload::CombatEnded(ended), CombatPhase::Active) => self.resolve(ended),
            _ => None,
        }
    }

    fn start(&mut self, started: &CombatStarted) -> Option<CombatEffect> {
        let local_is_attacker = self.match_entry(started)?;
        let ctx = &started.context;

        self.combat_id = Some(started.combat_id.clone());
        self.mode = started.mode;
        self.local_is_attacker = local_is_attacker;
        self.turn = 1;

        let (local_id, local_companion, opponent_id, opponent_companion) = if local_is_attacker {
            (
                Some(started.attacker_id),
                started.attacker_companion_id,
                started.defender_id,
                started.defender_companion_id,
            )
        } else {
            (
                started.defender_id,
                started.defender_companion_id,
                Some(started.attacker_id),
                started.attacker_companion_id,
            )
        };

        self.local = SideState {
            player_id: local_id,
            companion_id: local_companion.or(ctx.companion_id),
            name: ctx.companion_name.clone(),
            hp: ctx.player_hp.max(0),
            max_hp: max_or_current(ctx.player_max_hp, ctx.player_hp),
            frozen: StatusWindow::default(),
            stealth: StatusWindow::default(),
        };
        self.opponent = SideState {
            player_id: opponent_id,
            companion_id: opponent_companion,
            name: ctx.enemy_name.clone(),
            hp: ctx.enemy_hp.max(0),
            max_hp: max_or_current(ctx.enemy_max_hp, ctx.enemy_hp),
            frozen: StatusWindow::default(),
            stealth: StatusWindow::default(),
        };
        self.loadout = ctx.equipped_items.clone();
        self.phase = CombatPhase::Active;

        tracing::info!(
            combat_id = %started.combat_id,
            mode = %started.mode,
            local_is_attacker,
            "combat started"
        );

        Some(CombatEffect::BattleStarted {
            combat_id: started.combat_id.clone(),
            mode: started.mode,
        })
    }

    /// `Some(local_is_attacker)` when `started` is the battle this entry waits for.
    fn match_entry(&self, started: &CombatStarted) -> Option<bool> {
        if started.mode != self.entry.mode() {
            return None;
        }
        let companion = self.entry.companion_id();
        match &self.entry {
            CombatEntry::PvE { combat_id, .. } => {
                if combat_id.as_ref().is_some_and(|expected| *expected != started.combat_id) {
                    return None;
                }
                (started.attacker_id == self.local_id
                    && companion_matches(started.attacker_companion_id, companion))
                .then_some(true)
            }
            CombatEntry::PvP { .. } => {
                if started.attacker_id == self.local_id
                    && companion_matches(started.attacker_companion_id, companion)
                {
                    Some(true)
                } else if started.defender_id == Some(self.local_id)
                    && companion_matches(started.defender_companion_id, companion)
                {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    fn apply_turn(&mut self, turn: &TurnProcessed) -> Option<CombatEffect> {
        if self.combat_id.as_ref() != Some(&turn.combat_id) {
            return None;
        }
        if turn.turn_number < self.turn {
            tracing::debug!(
                combat_id = %turn.combat_id,
                turn = turn.turn_number,
                current = self.turn,
                "discarding stale turn"
            );
            return None;
        }

        self.turn = turn.turn_number;
        self.check_roles(turn);

        let (attacker, defender) = if self.local_is_attacker {
            (&mut self.local, &mut self.opponent)
        } else {
            (&mut self.opponent, &mut self.local)
        };
        attacker.set_hp(turn.attacker_hp);
        defender.set_hp(turn.defender_hp);
        attacker.frozen = StatusWindow::until(turn.attacker_frozen_until);
        defender.frozen = StatusWindow::until(turn.defender_frozen_until);
        attacker.stealth = StatusWindow::until(turn.attacker_stealth_until);
        defender.stealth = StatusWindow::until(turn.defender_stealth_until);

        self.used_items.extend(turn.used_item_ids.iter().copied());
        let pruned = self.draft.prune(&self.used_items);
        if pruned > 0 {
            tracing::debug!(pruned, "spent items removed from pending action");
        }

        if !turn.description.is_empty() {
            self.log.push(turn.description.clone());
        }

        let actor = self.actor_side(turn.actor_id);
        Some(CombatEffect::for_turn(
            actor,
            turn.damage_dealt,
            &turn.description,
        ))
    }

    /// PvP turns may name the attacker. When that id is one of the two known
    /// players and disagrees with the roles taken from `CombatStarted`, the
    /// turn wins and later HP/status mapping follows it.
    fn check_roles(&mut self, turn: &TurnProcessed) {
        if self.mode != CombatMode::Pvp {
            return;
        }
        let Some(attacker) = turn.attacker_id else {
            return;
        };
        let reported = if attacker == self.local_id {
            true
        } else if self.opponent.player_id == Some(attacker) {
            false
        } else {
            return;
        };
        if reported != self.local_is_attacker {
            tracing::warn!(
                combat_id = %turn.combat_id,
                turn = turn.turn_number,
                local_is_attacker = reported,
                "turn disagrees with combat roles, following the turn"
            );
            self.local_is_attacker = reported;
        }
    }

    /// PvP attributes by identity. PvE is strictly two-sided: the wild
    /// side acts as `0`, every other actor is the player.
    fn actor_side(&self, actor: PlayerId) -> Side {
        let is_local = match self.mode {
            CombatMode::Pvp => actor == self.local_id,
            CombatMode::Pve => !actor.is_none(),
        };
        if is_local {
            Side::Local
        } else {
            Side::Opponent
        }
    }

    fn resolve(&mut self, ended: &CombatEnded) -> Option<CombatEffect> {
        if self.combat_id.as_ref() != Some(&ended.combat_id) {
            return None;
        }
        let outcome = match self.mode {
            CombatMode::Pvp => CombatOutcome::for_pvp(ended.winner_id, self.local_id),
            CombatMode::Pve => CombatOutcome::for_pve(ended.winner_id),
        };
        self.rewards = Some(CombatRewards {
            xp_gained: ended.xp_gained,
            loot: ended.loot.clone(),
            dropped_item: ended.dropped_item.clone(),
        });
        self.phase = CombatPhase::Resolved(outcome);

        tracing::info!(
            combat_id = %ended.combat_id,
            %outcome,
            xp = ended.xp_gained,
            "combat resolved"
        );

        Some(CombatEffect::Resolved { outcome })
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    /// Command that asks the server to put the player into this battle.
    pub fn join_command(&self) -> ClientCommand {
        match &self.entry {
            CombatEntry::PvE {
                companion_id,
                combat_id: Some(combat_id),
            } => ClientCommand::JoinPvEEncounter {
                combat_id: combat_id.clone(),
                companion_id: *companion_id,
                context: serde_json::Value::Null,
            },
            CombatEntry::PvE {
                companion_id,
                combat_id: None,
            } => ClientCommand::ResumeCombat {
                companion_id: *companion_id,
            },
            CombatEntry::PvP { companion_id } => ClientCommand::JoinPvPQueue {
                companion_id: *companion_id,
            },
        }
    }

    pub fn set_stance(&mut self, stance: Stance) {
        self.draft.set_stance(stance);
    }

    pub fn select_item(&mut self, item: ItemId) -> Result<(), CombatActionError> {
        self.draft.select(item, &self.loadout, &self.used_items)
    }

    pub fn deselect_item(&mut self, item: ItemId) {
        self.draft.deselect(item);
    }

    pub fn submit_attack(&self) -> Result<ClientCommand, CombatActionError> {
        let combat_id = self.acting_combat()?;
        let items = self.draft.selected();
        if items.is_empty() {
            return Err(CombatActionError::NothingSelected);
        }
        if let Some(spent) = items.iter().find(|item| self.used_items.contains(item)) {
            return Err(CombatActionError::AlreadyUsed(*spent));
        }
        Ok(ClientCommand::CombatAction {
            combat_id,
            action_type: ActionType::Attack,
            stance: self.draft.stance(),
            item_ids: items.to_vec(),
        })
    }

    pub fn use_item(&self, item: ItemId) -> Result<ClientCommand, CombatActionError> {
        let combat_id = self.acting_combat()?;
        if self.used_items.contains(&item) {
            return Err(CombatActionError::AlreadyUsed(item));
        }
        let equipped = self
            .loadout
            .iter()
            .find(|equipped| equipped.id == item)
            .ok_or(CombatActionError::NotEquipped(item))?;
        if !equipped.is_consumable() {
            return Err(CombatActionError::NotConsumable(item));
        }
        Ok(ClientCommand::CombatAction {
            combat_id,
            action_type: ActionType::UseItem,
            stance: self.draft.stance(),
            item_ids: vec![item],
        })
    }

    /// Forfeit is allowed while frozen; the phase only changes when the
    /// server confirms with `CombatEnded`.
    pub fn forfeit(&self) -> Result<ClientCommand, CombatActionError> {
        match (&self.combat_id, self.phase) {
            (Some(combat_id), CombatPhase::Active) => Ok(ClientCommand::ForfeitCombat {
                combat_id: combat_id.clone(),
            }),
            _ => Err(CombatActionError::NotActive),
        }
    }

    fn acting_combat(&self) -> Result<CombatId, CombatActionError> {
        let combat_id = match (&self.combat_id, self.phase) {
            (Some(combat_id), CombatPhase::Active) => combat_id.clone(),
            _ => return Err(CombatActionError::NotActive),
        };
        if self.is_frozen(Side::Local) {
            return Err(CombatActionError::Frozen {
                until: self.local.frozen.last_turn(),
            });
        }
        Ok(combat_id)
    }
}

fn max_or_current(max_hp: i64, hp: i64) -> i64 {
    if max_hp > 0 {
        max_hp
    } else {
        hp.max(0)
    }
}

fn companion_matches(reported: Option<CompanionId>, expected: CompanionId) -> bool {
    reported.map_or(true, |companion| companion == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::{
        battle_context, ended, equipped, pve_started, pvp_started, turn, turn_event,
    };

    const ME: i64 = 5;
    const COMPANION: i64 = 40;

    fn pve_entry() -> CombatEntry {
        CombatEntry::PvE {
            companion_id: CompanionId::new(COMPANION),
            combat_id: Some(CombatId::from("wild_1")),
        }
    }

    fn active_pve() -> CombatReconciler {
        let mut combat = CombatReconciler::new(PlayerId::new(ME), pve_entry());
        let ctx = battle_context(
            100,
            60,
            vec![equipped(1, "weapon"), equipped(2, "weapon"), equipped(9, "potion")],
        );
        combat.apply(&pve_started("wild_1", ME, COMPANION, ctx));
        combat
    }

    #[test]
    fn matching_start_activates_and_seeds_from_context() {
        let combat = active_pve();

        assert_eq!(combat.phase(), CombatPhase::Active);
        assert_eq!(combat.turn(), 1);
        assert_eq!(combat.local().hp, 100);
        assert_eq!(combat.opponent().hp, 60);
        assert_eq!(combat.opponent().name, "Marsh Wisp");
        assert_eq!(combat.loadout().len(), 3);
    }

    #[test]
    fn start_for_another_player_or_companion_is_ignored() {
        let mut combat = CombatReconciler::new(PlayerId::new(ME), pve_entry());
        let ctx = battle_context(100, 60, vec![]);

        assert_eq!(combat.apply(&pve_started("wild_1", 6, COMPANION, ctx.clone())), None);
        assert_eq!(combat.apply(&pve_started("wild_1", ME, 41, ctx.clone())), None);
        assert_eq!(combat.apply(&pve_started("wild_2", ME, COMPANION, ctx)), None);
        assert_eq!(combat.phase(), CombatPhase::NotStarted);
    }

    #[test]
    fn pvp_defender_sees_the_battle_from_its_own_side() {
        let entry = CombatEntry::PvP {
            companion_id: CompanionId::new(COMPANION),
        };
        let mut combat = CombatReconciler::new(PlayerId::new(ME), entry);
        let started = pvp_started("arena_1", (8, 80), (ME, COMPANION), battle_context(90, 70, vec![]));

        assert!(matches!(
            combat.apply(&started),
            Some(CombatEffect::BattleStarted { .. })
        ));

        let mut t = turn("arena_1", 1, 8, 70, 75);
        t.damage_dealt = 15;
        t.defender_frozen_until = 2;
        let effect = combat.apply(&turn_event(t));

        assert_eq!(combat.local().hp, 75);
        assert_eq!(combat.opponent().hp, 70);
        assert!(combat.is_frozen(Side::Local));
        assert_eq!(
            effect,
            Some(CombatEffect::Hit {
                target: Side::Local,
                amount: 15,
                critical: false
            })
        );
    }

    #[test]
    fn pvp_turn_attacker_id_overrides_start_roles() {
        let entry = CombatEntry::PvP {
            companion_id: CompanionId::new(COMPANION),
        };
        let mut combat = CombatReconciler::new(PlayerId::new(ME), entry);
        combat.apply(&pvp_started("arena_1", (8, 80), (ME, COMPANION), battle_context(90, 70, vec![])));

        // Consistent with the start: local stays the defender.
        let mut t1 = turn("arena_1", 1, 8, 70, 60);
        t1.attacker_id = Some(PlayerId::new(8));
        combat.apply(&turn_event(t1));
        assert_eq!(combat.local().hp, 60);
        assert_eq!(combat.opponent().hp, 70);

        // The server names us as attacker from here on.
        let mut t2 = turn("arena_1", 2, ME, 55, 65);
        t2.attacker_id = Some(PlayerId::new(ME));
        combat.apply(&turn_event(t2));
        assert_eq!(combat.local().hp, 55);
        assert_eq!(combat.opponent().hp, 65);

        // Unknown ids are not trusted.
        let mut t3 = turn("arena_1", 3, 8, 50, 40);
        t3.attacker_id = Some(PlayerId::new(99));
        combat.apply(&turn_event(t3));
        assert_eq!(combat.local().hp, 50);
        assert_eq!(combat.opponent().hp, 40);
    }

    #[test]
    fn turns_update_hp_and_discard_stale_numbers() {
        let mut combat = active_pve();

        let mut t3 = turn("wild_1", 3, ME, 90, 45);
        t3.damage_dealt = 15;
        t3.description = "CRITICAL hit for 15".to_string();
        let effect = combat.apply(&turn_event(t3));
        assert_eq!(
            effect,
            Some(CombatEffect::Hit {
                target: Side::Opponent,
                amount: 15,
                critical: true
            })
        );
        assert_eq!(combat.turn(), 3);

        let stale = turn("wild_1", 2, 0, 10, 10);
        assert_eq!(combat.apply(&turn_event(stale)), None);
        assert_eq!(combat.local().hp, 90);
        assert_eq!(combat.opponent().hp, 45);
        assert_eq!(combat.combat_log(), &["CRITICAL hit for 15".to_string()]);
    }

    #[test]
    fn negative_hp_is_clamped() {
        let mut combat = active_pve();
        combat.apply(&turn_event(turn("wild_1", 2, ME, 10, -30)));
        assert_eq!(combat.opponent().hp, 0);
        assert!(combat.opponent().is_defeated());
    }

    #[test]
    fn frozen_window_blocks_actions_until_it_passes() {
        let mut combat = active_pve();
        combat.select_item(ItemId::new(1)).unwrap();

        let mut t = turn("wild_1", 2, 0, 95, 60);
        t.attacker_frozen_until = 3;
        combat.apply(&turn_event(t));
        assert_eq!(
            combat.submit_attack(),
            Err(CombatActionError::Frozen { until: 3 })
        );

        let mut t = turn("wild_1", 3, 0, 95, 60);
        t.attacker_frozen_until = 3;
        combat.apply(&turn_event(t));
        assert!(combat.is_frozen(Side::Local));

        let mut t = turn("wild_1", 4, 0, 95, 60);
        t.attacker_frozen_until = 3;
        combat.apply(&turn_event(t));
        assert!(!combat.is_frozen(Side::Local));
        assert!(combat.submit_attack().is_ok());
    }

    #[test]
    fn attack_requires_a_selection_and_carries_stance() {
        let mut combat = active_pve();
        assert_eq!(combat.submit_attack(), Err(CombatActionError::NothingSelected));

        combat.set_stance(Stance::Berserk);
        combat.select_item(ItemId::new(2)).unwrap();
        let cmd = combat.submit_attack().unwrap();
        assert_eq!(
            cmd,
            ClientCommand::CombatAction {
                combat_id: CombatId::from("wild_1"),
                action_type: ActionType::Attack,
                stance: Stance::Berserk,
                item_ids: vec![ItemId::new(2)],
            }
        );
        assert_eq!(combat.phase(), CombatPhase::Active);
    }

    #[test]
    fn spent_items_leave_the_draft_and_cannot_be_reselected() {
        let mut combat = active_pve();
        combat.select_item(ItemId::new(1)).unwrap();
        combat.select_item(ItemId::new(2)).unwrap();

        let mut t = turn("wild_1", 2, ME, 100, 50);
        t.used_item_ids = vec![ItemId::new(1)];
        combat.apply(&turn_event(t));

        assert_eq!(combat.draft().selected(), &[ItemId::new(2)]);
        assert_eq!(
            combat.select_item(ItemId::new(1)),
            Err(CombatActionError::AlreadyUsed(ItemId::new(1)))
        );
        assert_eq!(
            combat.use_item(ItemId::new(1)),
            Err(CombatActionError::AlreadyUsed(ItemId::new(1)))
        );
    }

    #[test]
    fn use_item_only_accepts_equipped_consumables() {
        let combat = active_pve();
        assert!(matches!(
            combat.use_item(ItemId::new(9)),
            Ok(ClientCommand::CombatAction {
                action_type: ActionType::UseItem,
                ..
            })
        ));
        assert_eq!(
            combat.use_item(ItemId::new(1)),
            Err(CombatActionError::NotConsumable(ItemId::new(1)))
        );
        assert_eq!(
            combat.use_item(ItemId::new(77)),
            Err(CombatActionError::NotEquipped(ItemId::new(77)))
        );
    }

    #[test]
    fn forfeit_waits_for_the_server() {
        let mut combat = CombatReconciler::new(PlayerId::new(ME), pve_entry());
        assert_eq!(combat.forfeit(), Err(CombatActionError::NotActive));

        combat.apply(&pve_started("wild_1", ME, COMPANION, battle_context(10, 10, vec![])));
        assert!(matches!(
            combat.forfeit(),
            Ok(ClientCommand::ForfeitCombat { .. })
        ));
        assert_eq!(combat.phase(), CombatPhase::Active);

        combat.apply(&ended("wild_1", 0, 0));
        assert_eq!(combat.phase(), CombatPhase::Resolved(CombatOutcome::Loss));
        assert_eq!(combat.forfeit(), Err(CombatActionError::NotActive));
    }

    #[test]
    fn pve_end_captures_rewards() {
        let mut combat = active_pve();
        let effect = combat.apply(&ended("wild_1", ME, 35));

        assert_eq!(
            effect,
            Some(CombatEffect::Resolved {
                outcome: CombatOutcome::Win
            })
        );
        assert_eq!(combat.rewards().map(|r| r.xp_gained), Some(35));
        assert_eq!(combat.apply(&turn_event(turn("wild_1", 9, ME, 1, 1))), None);
    }

    #[test]
    fn pvp_end_distinguishes_win_loss_and_draw() {
        let entry = CombatEntry::PvP {
            companion_id: CompanionId::new(COMPANION),
        };
        let cases = [
            (ME, CombatOutcome::Win),
            (8, CombatOutcome::Loss),
            (0, CombatOutcome::Draw),
        ];
        for (winner, expected) in cases {
            let mut combat = CombatReconciler::new(PlayerId::new(ME), entry.clone());
            combat.apply(&pvp_started(
                "arena_2",
                (ME, COMPANION),
                (8, 80),
                battle_context(50, 50, vec![]),
            ));
            combat.apply(&ended("arena_2", winner, 0));
            assert_eq!(combat.phase().outcome(), Some(expected), "winner {winner}");
        }
    }

    #[test]
    fn join_command_follows_the_entry() {
        let combat = CombatReconciler::new(PlayerId::new(ME), pve_entry());
        assert_eq!(combat.join_command().kind(), "JoinPvEEncounter");

        let resume = CombatReconciler::new(
            PlayerId::new(ME),
            CombatEntry::PvE {
                companion_id: CompanionId::new(COMPANION),
                combat_id: None,
            },
        );
        assert_eq!(resume.join_command().kind(), "ResumeCombat");

        let queue = CombatReconciler::new(
            PlayerId::new(ME),
            CombatEntry::PvP {
                companion_id: CompanionId::new(COMPANION),
            },
        );
        assert_eq!(queue.join_command().kind(), "JoinPvPQueue");
    }
}
