//! Headless player loop.
//!
//! Wires the connection, the game session and the REST collaborators
//! together, reads simple text commands from stdin and logs the derived
//! state. A graphical client would replace the stdin/log ends and keep
//! the rest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use argonvale_shared::{ClientCommand, CombatId, CompanionId, Direction, ItemId, Stance, ZoneId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::combat::{CombatEffect, CombatEntry};
use crate::application::movement::{CollisionGrid, ExplorationEffect, MoveOutcome};
use crate::application::{GameSession, NoticeKind, SessionEffect};
use crate::config::PlayerConfig;
use crate::infrastructure::messaging::{CommandBus, ConnectionState};
use crate::infrastructure::websocket::create_connection;
use crate::ports::outbound::{MessageCountPort, PositionStorePort, StoredPosition, ZoneMapPort};

/// Where a player without a saved position starts.
pub const DEFAULT_START_ZONE: &str = "town";
pub const DEFAULT_START_TILE: (i32, i32) = (8, 8);

const STATE_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct RunnerDeps {
    pub config: PlayerConfig,
    pub messages: Arc<dyn MessageCountPort>,
    pub maps: Arc<dyn ZoneMapPort>,
    pub positions: Arc<dyn PositionStorePort>,
}

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    Move(Direction),
    Travel(ZoneId),
    JoinPvE {
        combat_id: CombatId,
        companion_id: CompanionId,
    },
    JoinPvP(CompanionId),
    Resume(CompanionId),
    LeaveQueue,
    Stance(Stance),
    Select(ItemId),
    Deselect(ItemId),
    Attack,
    UseItem(ItemId),
    Forfeit,
    CloseCombat,
    Status,
}

/// Parse a command line such as `d`, `travel wild` or `pve wild_3 12`.
pub fn parse_input(line: &str) -> Option<PlayerInput> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let mut arg = || words.next();

    let input = match verb.as_str() {
        "w" | "up" => PlayerInput::Move(Direction::UP),
        "s" | "down" => PlayerInput::Move(Direction::DOWN),
        "a" | "left" => PlayerInput::Move(Direction::LEFT),
        "d" | "right" => PlayerInput::Move(Direction::RIGHT),
        "travel" => PlayerInput::Travel(ZoneId::from(arg()?)),
        "pve" => {
            let combat_id = CombatId::from(arg()?);
            PlayerInput::JoinPvE {
                combat_id,
                companion_id: CompanionId::new(arg()?.parse().ok()?),
            }
        }
        "pvp" => PlayerInput::JoinPvP(CompanionId::new(arg()?.parse().ok()?)),
        "resume" => PlayerInput::Resume(CompanionId::new(arg()?.parse().ok()?)),
        "leave" => PlayerInput::LeaveQueue,
        "stance" => PlayerInput::Stance(match arg()?.to_ascii_lowercase().as_str() {
            "normal" => Stance::Normal,
            "berserk" => Stance::Berserk,
            "defensive" => Stance::Defensive,
            _ => return None,
        }),
        "select" => PlayerInput::Select(ItemId::new(arg()?.parse().ok()?)),
        "deselect" => PlayerInput::Deselect(ItemId::new(arg()?.parse().ok()?)),
        "attack" => PlayerInput::Attack,
        "use" => PlayerInput::UseItem(ItemId::new(arg()?.parse().ok()?)),
        "forfeit" => PlayerInput::Forfeit,
        "close" => PlayerInput::CloseCombat,
        "status" => PlayerInput::Status,
        _ => return None,
    };
    Some(input)
}

pub async fn run(deps: RunnerDeps) -> anyhow::Result<()> {
    let RunnerDeps {
        config,
        messages,
        maps,
        positions,
    } = deps;

    let token = config
        .token
        .clone()
        .context("ARGONVALE_TOKEN must be set to connect")?;
    let player_id = config
        .player_id
        .context("ARGONVALE_PLAYER_ID must be set")?;

    let connection = create_connection(config.ws_url.clone(), config.reconnect.clone());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    connection
        .event_bus
        .subscribe(move |event| {
            // The receiver only goes away on shutdown.
            let _ = event_tx.send(event);
        })
        .await;
    connection.command_bus.connect(token)?;

    let mut session = GameSession::new(player_id);
    let start = positions.load_position().unwrap_or_else(|| StoredPosition {
        zone_id: ZoneId::from(DEFAULT_START_ZONE),
        x: DEFAULT_START_TILE.0,
        y: DEFAULT_START_TILE.1,
    });
    tracing::info!(player = %player_id, zone = %start.zone_id, x = start.x, y = start.y, "entering world");
    if let Some(load) = session.mount_exploration(start, config.move_interval) {
        apply_exploration_effect(&mut session, load, maps.as_ref(), positions.as_ref()).await;
    }
    session.notifications_mut().refresh(messages.as_ref()).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut poll = tokio::time::interval(STATE_POLL_INTERVAL);
    let mut last_state = ConnectionState::Idle;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            Some(event) = event_rx.recv() => {
                session.ingest(event);
                while let Ok(event) = event_rx.try_recv() {
                    session.ingest(event);
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Some(input) => handle_input(&mut session, input, &connection.command_bus, maps.as_ref(), positions.as_ref()).await,
                    None if line.trim().is_empty() => {}
                    None => tracing::warn!(input = %line.trim(), "unrecognised command"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = poll.tick() => {}
        }

        let state = connection.state_observer.state();
        if state != last_state {
            tracing::info!(from = %last_state, to = %state, "connection state changed");
            last_state = state;
        }

        for effect in session.pump() {
            match effect {
                SessionEffect::Combat(effect) => log_combat_effect(&effect),
                SessionEffect::Exploration(effect) => {
                    apply_exploration_effect(&mut session, effect, maps.as_ref(), positions.as_ref()).await;
                }
            }
        }

        if session.notifications().needs_refresh() {
            let count = session.notifications_mut().refresh(messages.as_ref()).await;
            tracing::info!(unread = count, "inbox");
        }
        for notice in session.notifications_mut().drain_notices() {
            match notice.kind {
                NoticeKind::Info => tracing::info!(message = %notice.message, "server notice"),
                NoticeKind::Rejected => tracing::warn!(message = %notice.message, "command rejected"),
            }
        }
    }

    if let Some(exploration) = session.exploration() {
        positions.save_position(&exploration.stored_position());
    }
    if let Err(e) = connection.command_bus.close() {
        tracing::debug!(error = %e, "connection task already gone");
    }
    connection.handle.shutdown();
    Ok(())
}

async fn handle_input(
    session: &mut GameSession,
    input: PlayerInput,
    commands: &CommandBus,
    maps: &dyn ZoneMapPort,
    positions: &dyn PositionStorePort,
) {
    let command = match input {
        PlayerInput::Move(direction) => {
            let Some(exploration) = session.exploration_mut() else {
                return;
            };
            match exploration.try_move(direction, Instant::now()) {
                MoveOutcome::Moved(command) => Some(command),
                outcome => {
                    tracing::debug!(?outcome, "move not sent");
                    None
                }
            }
        }
        PlayerInput::Travel(zone) => {
            let effect = session
                .exploration_mut()
                .and_then(|exploration| exploration.travel_to(zone));
            if let Some(effect) = effect {
                apply_exploration_effect(session, effect, maps, positions).await;
            }
            None
        }
        PlayerInput::JoinPvE {
            combat_id,
            companion_id,
        } => Some(session.mount_combat(CombatEntry::PvE {
            companion_id,
            combat_id: Some(combat_id),
        })),
        PlayerInput::JoinPvP(companion_id) => {
            Some(session.mount_combat(CombatEntry::PvP { companion_id }))
        }
        PlayerInput::Resume(companion_id) => Some(session.mount_combat(CombatEntry::PvE {
            companion_id,
            combat_id: None,
        })),
        PlayerInput::LeaveQueue => {
            session.unmount_combat();
            Some(ClientCommand::LeavePvPQueue)
        }
        PlayerInput::CloseCombat => {
            session.unmount_combat();
            None
        }
        PlayerInput::Status => {
            log_status(session);
            None
        }
        combat_input => {
            let Some(combat) = session.combat_mut() else {
                tracing::warn!("no battle mounted");
                return;
            };
            let result = match combat_input {
                PlayerInput::Stance(stance) => {
                    combat.set_stance(stance);
                    Ok(None)
                }
                PlayerInput::Select(item) => combat.select_item(item).map(|()| None),
                PlayerInput::Deselect(item) => {
                    combat.deselect_item(item);
                    Ok(None)
                }
                PlayerInput::Attack => combat.submit_attack().map(Some),
                PlayerInput::UseItem(item) => combat.use_item(item).map(Some),
                PlayerInput::Forfeit => combat.forfeit().map(Some),
                _ => Ok(None),
            };
            match result {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!(error = %e, "action refused");
                    None
                }
            }
        }
    };

    if let Some(command) = command {
        let kind = command.kind();
        if let Err(e) = commands.send(command) {
            tracing::error!(error = %e, command = kind, "failed to queue command");
        }
    }
}

async fn apply_exploration_effect(
    session: &mut GameSession,
    effect: ExplorationEffect,
    maps: &dyn ZoneMapPort,
    positions: &dyn PositionStorePort,
) {
    match effect {
        ExplorationEffect::LoadZone(zone) => {
            let grid = match maps.fetch_zone_map(&zone).await {
                Ok(map) => match CollisionGrid::from_map(&map) {
                    Ok(grid) => grid,
                    Err(e) => {
                        tracing::error!(zone = %zone, error = %e, "invalid zone map");
                        return;
                    }
                },
                Err(e) => {
                    tracing::error!(zone = %zone, error = %e, "failed to load zone map");
                    return;
                }
            };
            tracing::info!(zone = %zone, width = grid.width(), height = grid.height(), "zone loaded");
            let correction = session
                .exploration_mut()
                .and_then(|exploration| exploration.install_grid(&zone, grid));
            if let Some(ExplorationEffect::PersistPosition(position)) = correction {
                positions.save_position(&position);
            }
        }
        ExplorationEffect::PersistPosition(position) => positions.save_position(&position),
        ExplorationEffect::Loot { coins, items } => {
            tracing::info!(coins, items = ?items, "loot found");
        }
    }
}

fn log_combat_effect(effect: &CombatEffect) {
    let sound = effect.sound().map(|sound| sound.key());
    match effect {
        CombatEffect::Resolved { outcome } => tracing::info!(%outcome, sound, "battle over"),
        other => tracing::info!(effect = ?other, sound, "combat"),
    }
}

fn log_status(session: &GameSession) {
    if let Some(exploration) = session.exploration() {
        let (x, y) = exploration.position();
        tracing::info!(
            zone = %exploration.zone(),
            x,
            y,
            loading = exploration.is_loading(),
            others = exploration.others().len(),
            "exploration"
        );
    }
    if let Some(combat) = session.combat() {
        tracing::info!(
            phase = ?combat.phase(),
            turn = combat.turn(),
            hp = combat.local().hp,
            opponent_hp = combat.opponent().hp,
            selected = ?combat.draft().selected(),
            "combat"
        );
    }
    tracing::info!(unread = session.notifications().unread_count(), "inbox");
}
