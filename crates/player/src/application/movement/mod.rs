//! Exploration: collision grid and the movement reconciler.

mod collision;
mod reconciler;

pub use collision::{CollisionGrid, ZoneMapError};
pub use reconciler::{
    ExplorationEffect, MoveOutcome, MovementReconciler, OtherPlayer, DEFAULT_MOVE_INTERVAL,
};
