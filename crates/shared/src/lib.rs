//! Argonvale Shared - wire contract for the game socket
//!
//! This crate contains all types shared between the game server and the player client:
//! - Strongly-typed ids
//! - WebSocket message types (`ClientCommand`, `ServerEvent`)
//! - The inbound frame decoder (single object or array, per-element failures)
//! - The static zone-map resource used for collision
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, chrono and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Closed unions** - unknown event types are rejected, not coerced

pub mod ids;
pub mod inbound;
pub mod messages;
pub mod types;
pub mod zone_map;

pub use ids::{CombatId, CompanionId, EventId, ItemId, PlayerId, ZoneId};
pub use inbound::{decode_event, decode_frame, DecodedFrame, InboundError};
pub use messages::{
    ClientCommand, CombatEnded, CombatStarted, EventPayload, LootFound, MessageReceived,
    PlayerDisconnected, PlayerMoved, ServerEvent, ServerNotice, TeleportPlayer, TurnProcessed,
};
pub use types::{ActionType, BattleContext, CombatMode, Direction, EquippedItem, Stance};
pub use zone_map::{LayerProperty, MapLayer, ZoneMapData};
