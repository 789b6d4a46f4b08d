//! WebSocket message types for server-client communication
//!
//! This module contains all message types exchanged over the game socket.
//! Inbound traffic is a stream of [`ServerEvent`]s (an envelope carrying the
//! dedup identity plus a closed [`EventPayload`] union); outbound traffic is a
//! stream of [`ClientCommand`]s.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing variants requires major version bump
//! - Renaming variants is a breaking change
//! - Unknown `type` tags are rejected at the decoder, never coerced

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CombatId, CompanionId, EventId, ItemId, PlayerId, ZoneId};
use crate::types::{ActionType, BattleContext, CombatMode, Direction, Stance};

// =============================================================================
// Client Commands (Player → Server)
// =============================================================================

/// Intents sent from the player client to the game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Join a wild encounter that the server has already prepared
    JoinPvEEncounter {
        combat_id: CombatId,
        companion_id: CompanionId,
        #[serde(default)]
        context: serde_json::Value,
    },
    /// Enter the PvP matchmaking queue
    JoinPvPQueue { companion_id: CompanionId },
    /// Leave the PvP matchmaking queue
    LeavePvPQueue,
    /// Re-attach to a battle that survived a disconnect
    ResumeCombat { companion_id: CompanionId },
    /// Submit the local player's action for the current turn
    CombatAction {
        combat_id: CombatId,
        action_type: ActionType,
        stance: Stance,
        item_ids: Vec<ItemId>,
    },
    /// Give up the battle
    ForfeitCombat { combat_id: CombatId },
    /// Step one tile; `x`/`y` is the predicted destination
    Move {
        x: i32,
        y: i32,
        direction: Direction,
        zone_id: ZoneId,
    },
}

impl ClientCommand {
    /// Wire tag of this command, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::JoinPvEEncounter { .. } => "JoinPvEEncounter",
            ClientCommand::JoinPvPQueue { .. } => "JoinPvPQueue",
            ClientCommand::LeavePvPQueue => "LeavePvPQueue",
            ClientCommand::ResumeCombat { .. } => "ResumeCombat",
            ClientCommand::CombatAction { .. } => "CombatAction",
            ClientCommand::ForfeitCombat { .. } => "ForfeitCombat",
            ClientCommand::Move { .. } => "Move",
        }
    }
}

// =============================================================================
// Server Events (Server → Player)
// =============================================================================

/// One inbound event: dedup identity plus the typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl ServerEvent {
    pub fn new(event_id: impl Into<EventId>, payload: EventPayload) -> Self {
        Self {
            event_id: Some(event_id.into()),
            timestamp: None,
            payload,
        }
    }

    /// An event without server identity (notices, legacy payloads).
    pub fn anonymous(payload: EventPayload) -> Self {
        Self {
            event_id: None,
            timestamp: None,
            payload,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Closed set of inbound event payloads, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    CombatStarted(CombatStarted),
    TurnProcessed(TurnProcessed),
    CombatEnded(CombatEnded),
    PlayerMoved(PlayerMoved),
    PlayerDisconnected(PlayerDisconnected),
    TeleportPlayer(TeleportPlayer),
    MessageReceived(MessageReceived),
    LootFound(LootFound),
    /// Informational server notice (e.g. "Searching for a rival...")
    Info(ServerNotice),
    /// The server refused the last command
    CommandRejected(ServerNotice),
}

impl EventPayload {
    /// Every `type` tag the decoder accepts.
    pub const KNOWN_TYPES: &'static [&'static str] = &[
        "CombatStarted",
        "TurnProcessed",
        "CombatEnded",
        "PlayerMoved",
        "PlayerDisconnected",
        "TeleportPlayer",
        "MessageReceived",
        "LootFound",
        "Info",
        "CommandRejected",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::CombatStarted(_) => "CombatStarted",
            EventPayload::TurnProcessed(_) => "TurnProcessed",
            EventPayload::CombatEnded(_) => "CombatEnded",
            EventPayload::PlayerMoved(_) => "PlayerMoved",
            EventPayload::PlayerDisconnected(_) => "PlayerDisconnected",
            EventPayload::TeleportPlayer(_) => "TeleportPlayer",
            EventPayload::MessageReceived(_) => "MessageReceived",
            EventPayload::LootFound(_) => "LootFound",
            EventPayload::Info(_) => "Info",
            EventPayload::CommandRejected(_) => "CommandRejected",
        }
    }

    pub fn is_known_type(tag: &str) -> bool {
        Self::KNOWN_TYPES.contains(&tag)
    }
}

/// A battle was created and the client should enter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStarted {
    pub combat_id: CombatId,
    pub attacker_id: PlayerId,
    #[serde(default)]
    pub attacker_companion_id: Option<CompanionId>,
    #[serde(default)]
    pub defender_id: Option<PlayerId>,
    #[serde(default)]
    pub defender_companion_id: Option<CompanionId>,
    #[serde(default)]
    pub mode: CombatMode,
    #[serde(default)]
    pub context: BattleContext,
}

/// One resolved action within a battle.
///
/// The server names the attacker side "player" and the defender side "enemy"
/// in the status fields; the Rust names follow the side, not the wording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnProcessed {
    pub combat_id: CombatId,
    pub turn_number: u32,
    pub actor_id: PlayerId,
    #[serde(default)]
    pub damage_dealt: i64,
    #[serde(default)]
    pub description: String,
    pub attacker_hp: i64,
    pub defender_hp: i64,
    /// Role of the HP/status fields; PvP clients reconcile their side against it.
    #[serde(default)]
    pub attacker_id: Option<PlayerId>,
    #[serde(default)]
    pub defender_id: Option<PlayerId>,
    #[serde(default)]
    pub mode: Option<CombatMode>,
    #[serde(default, rename = "player_frozen_until", alias = "attacker_frozen_until")]
    pub attacker_frozen_until: u32,
    #[serde(default, rename = "enemy_frozen_until", alias = "defender_frozen_until")]
    pub defender_frozen_until: u32,
    #[serde(default, rename = "player_stealth_until", alias = "attacker_stealth_until")]
    pub attacker_stealth_until: u32,
    #[serde(default, rename = "enemy_stealth_until", alias = "defender_stealth_until")]
    pub defender_stealth_until: u32,
    #[serde(default)]
    pub used_item_ids: Vec<ItemId>,
}

/// The battle is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEnded {
    pub combat_id: CombatId,
    pub winner_id: PlayerId,
    /// Echoed by the server; the outcome only needs `winner_id`.
    #[serde(default)]
    pub attacker_id: Option<PlayerId>,
    #[serde(default)]
    pub defender_id: Option<PlayerId>,
    #[serde(default)]
    pub mode: Option<CombatMode>,
    #[serde(default)]
    pub xp_gained: u32,
    #[serde(default)]
    pub loot: Option<serde_json::Value>,
    #[serde(default)]
    pub dropped_item: Option<serde_json::Value>,
}

/// Another (or the local) player stepped to a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMoved {
    pub player_id: PlayerId,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDisconnected {
    pub player_id: PlayerId,
}

/// Server-authoritative position correction (warps, respawns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportPlayer {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
}

/// A private message arrived; only signals that the unread count changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageReceived {
    #[serde(default)]
    pub sender_id: Option<PlayerId>,
}

/// Loot picked up while exploring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootFound {
    pub player_id: PlayerId,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default)]
    pub coins_found: u32,
    #[serde(default)]
    pub item_ids_found: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerNotice {
    pub message: String,
}

/// Accept RFC 3339 and the server's naive UTC form; anything else becomes `None`
/// instead of failing the whole event.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}
