//! Event and resource fixtures used across unit tests.
//!
//! Every event built here carries a fresh `event_id`, like events coming off
//! the real socket.

use argonvale_shared::{
    BattleContext, CombatEnded, CombatId, CombatMode, CombatStarted, CompanionId, EquippedItem,
    EventId, EventPayload, ItemId, MapLayer, MessageReceived, PlayerDisconnected, PlayerId,
    PlayerMoved, ServerEvent, TeleportPlayer, TurnProcessed, ZoneId, ZoneMapData,
};
use uuid::Uuid;

pub fn fresh_event_id() -> EventId {
    EventId::new(Uuid::new_v4().to_string())
}

pub fn identified(payload: EventPayload) -> ServerEvent {
    ServerEvent::new(fresh_event_id(), payload)
}

pub fn equipped(id: i64, item_type: &str) -> EquippedItem {
    EquippedItem {
        id: ItemId::new(id),
        name: format!("item-{id}"),
        item_type: item_type.to_string(),
        stats: serde_json::Value::Null,
    }
}

pub fn battle_context(player_hp: i64, enemy_hp: i64, items: Vec<EquippedItem>) -> BattleContext {
    BattleContext {
        enemy_name: "Marsh Wisp".to_string(),
        enemy_hp,
        enemy_max_hp: enemy_hp,
        enemy_type: "wisp".to_string(),
        player_hp,
        player_max_hp: player_hp,
        companion_id: None,
        companion_name: "Ember".to_string(),
        equipped_items: items,
    }
}

pub fn pve_started(combat_id: &str, local: i64, companion: i64, context: BattleContext) -> ServerEvent {
    identified(EventPayload::CombatStarted(CombatStarted {
        combat_id: CombatId::from(combat_id),
        attacker_id: PlayerId::new(local),
        attacker_companion_id: Some(CompanionId::new(companion)),
        defender_id: None,
        defender_companion_id: None,
        mode: CombatMode::Pve,
        context,
    }))
}

pub fn pvp_started(
    combat_id: &str,
    attacker: (i64, i64),
    defender: (i64, i64),
    context: BattleContext,
) -> ServerEvent {
    identified(EventPayload::CombatStarted(CombatStarted {
        combat_id: CombatId::from(combat_id),
        attacker_id: PlayerId::new(attacker.0),
        attacker_companion_id: Some(CompanionId::new(attacker.1)),
        defender_id: Some(PlayerId::new(defender.0)),
        defender_companion_id: Some(CompanionId::new(defender.1)),
        mode: CombatMode::Pvp,
        context,
    }))
}

/// A plain hit with no status changes; adjust fields as needed.
pub fn turn(combat_id: &str, turn_number: u32, actor: i64, attacker_hp: i64, defender_hp: i64) -> TurnProcessed {
    TurnProcessed {
        combat_id: CombatId::from(combat_id),
        turn_number,
        actor_id: PlayerId::new(actor),
        damage_dealt: 0,
        description: String::new(),
        attacker_hp,
        defender_hp,
        attacker_id: None,
        defender_id: None,
        mode: None,
        attacker_frozen_until: 0,
        defender_frozen_until: 0,
        attacker_stealth_until: 0,
        defender_stealth_until: 0,
        used_item_ids: Vec::new(),
    }
}

pub fn turn_event(turn: TurnProcessed) -> ServerEvent {
    identified(EventPayload::TurnProcessed(turn))
}

pub fn ended(combat_id: &str, winner: i64, xp_gained: u32) -> ServerEvent {
    identified(EventPayload::CombatEnded(CombatEnded {
        combat_id: CombatId::from(combat_id),
        winner_id: PlayerId::new(winner),
        attacker_id: None,
        defender_id: None,
        mode: None,
        xp_gained,
        loot: None,
        dropped_item: None,
    }))
}

pub fn player_moved(player: i64, x: i32, y: i32) -> ServerEvent {
    identified(EventPayload::PlayerMoved(PlayerMoved {
        player_id: PlayerId::new(player),
        x,
        y,
        username: Some(format!("player{player}")),
        zone_id: None,
    }))
}

pub fn player_disconnected(player: i64) -> ServerEvent {
    identified(EventPayload::PlayerDisconnected(PlayerDisconnected {
        player_id: PlayerId::new(player),
    }))
}

pub fn teleport(x: i32, y: i32, zone: Option<&str>) -> ServerEvent {
    identified(EventPayload::TeleportPlayer(TeleportPlayer {
        player_id: None,
        x,
        y,
        zone_id: zone.map(ZoneId::from),
    }))
}

pub fn message_received() -> ServerEvent {
    identified(EventPayload::MessageReceived(MessageReceived::default()))
}

/// A `width` x `height` map whose `collision` layer marks `solid` tiles.
pub fn zone_map(width: u32, height: u32, solid: &[(u32, u32)]) -> ZoneMapData {
    let mut data = vec![0; (width * height) as usize];
    for &(x, y) in solid {
        data[(y * width + x) as usize] = 1;
    }
    ZoneMapData {
        width,
        height,
        layers: vec![MapLayer {
            name: "collision".to_string(),
            layer_type: "tilelayer".to_string(),
            data,
            properties: Vec::new(),
        }],
    }
}
