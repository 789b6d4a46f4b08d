//! End-to-end scenarios: raw frames through the connection manager into the
//! session and out as derived state.

use std::time::{Duration, Instant};

use argonvale_shared::{ClientCommand, CombatId, CompanionId, Direction, PlayerId, ZoneId};
use serde_json::json;
use url::Url;

use crate::application::combat::{CombatEffect, CombatEntry, CombatOutcome, CombatPhase, Side};
use crate::application::movement::{CollisionGrid, MoveOutcome};
use crate::application::{GameSession, SessionEffect};
use crate::infrastructure::messaging::ConnectionState;
use crate::infrastructure::testing::{
    battle_context, ended, pve_started, pvp_started, teleport, turn, turn_event, zone_map,
    RecordingTransport,
};
use crate::infrastructure::websocket::{ConnectionManager, ReconnectPolicy, SendOutcome};
use crate::ports::outbound::StoredPosition;

const ME: i64 = 5;
const COMPANION: i64 = 40;

fn manager() -> ConnectionManager<RecordingTransport> {
    ConnectionManager::new(
        RecordingTransport::default(),
        Url::parse("ws://localhost:8000/ws").unwrap(),
        ReconnectPolicy::default(),
    )
}

/// Feed a raw server frame through the manager into the session.
fn deliver(
    manager: &mut ConnectionManager<RecordingTransport>,
    session: &mut GameSession,
    frame: &str,
) -> Vec<SessionEffect> {
    let attempt = manager.live_attempt().unwrap();
    for event in manager.on_text(attempt, frame) {
        session.ingest(event);
    }
    session.pump()
}

fn pve_session() -> GameSession {
    let mut session = GameSession::new(PlayerId::new(ME));
    session.mount_combat(CombatEntry::PvE {
        companion_id: CompanionId::new(COMPANION),
        combat_id: Some(CombatId::from("wild_1")),
    });
    session.ingest(pve_started("wild_1", ME, COMPANION, battle_context(100, 60, vec![])));
    session.pump();
    session
}

fn combat_effects(effects: &[SessionEffect]) -> Vec<&CombatEffect> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            SessionEffect::Combat(effect) => Some(effect),
            SessionEffect::Exploration(_) => None,
        })
        .collect()
}

#[test]
fn moves_issued_offline_go_out_in_order_on_open() {
    let mut manager = manager();
    let now = Instant::now();
    let step = |dx, dy| ClientCommand::Move {
        x: dx,
        y: dy,
        direction: Direction::new(dx, dy),
        zone_id: ZoneId::from("town"),
    };

    assert_eq!(manager.send(step(1, 0), now), SendOutcome::Buffered);
    assert_eq!(manager.send(step(0, 1), now), SendOutcome::Buffered);

    manager.connect("tok", now);
    let attempt = manager.live_attempt().unwrap();
    assert_eq!(manager.on_open(attempt, now), 2);

    assert_eq!(manager.state(), ConnectionState::Open);
    assert_eq!(manager.buffered(), 0);
    let sent = manager.transport().sent_json();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["direction"], json!({"dx": 1, "dy": 0}));
    assert_eq!(sent[1]["direction"], json!({"dx": 0, "dy": 1}));
}

#[test]
fn final_turn_then_victory_resolves_pve_as_win() {
    let mut manager = manager();
    let now = Instant::now();
    manager.connect("tok", now);
    manager.on_open(manager.live_attempt().unwrap(), now);

    let mut session = pve_session();
    let frame = json!([
        {
            "type": "TurnProcessed",
            "event_id": "t-3",
            "combat_id": "wild_1",
            "turn_number": 3,
            "actor_id": ME,
            "damage_dealt": 20,
            "description": "You strike for 20",
            "attacker_hp": 40,
            "defender_hp": 0
        },
        {
            "type": "CombatEnded",
            "event_id": "end-1",
            "combat_id": "wild_1",
            "winner_id": ME,
            "xp_gained": 25
        }
    ]);
    let effects = deliver(&mut manager, &mut session, &frame.to_string());

    let combat = session.combat().unwrap();
    assert_eq!(combat.local().hp, 40);
    assert_eq!(combat.opponent().hp, 0);
    assert_eq!(combat.phase(), CombatPhase::Resolved(CombatOutcome::Win));
    assert_eq!(combat.rewards().map(|r| r.xp_gained), Some(25));
    assert_eq!(combat_effects(&effects).len(), 2);
}

#[test]
fn redelivered_turn_applies_once() {
    let mut manager = manager();
    let now = Instant::now();
    manager.connect("tok", now);
    manager.on_open(manager.live_attempt().unwrap(), now);

    let mut session = pve_session();
    let frame = json!({
        "type": "TurnProcessed",
        "event_id": "t-2",
        "combat_id": "wild_1",
        "turn_number": 2,
        "actor_id": 0,
        "damage_dealt": 7,
        "description": "Wisp bites",
        "attacker_hp": 93,
        "defender_hp": 60
    })
    .to_string();

    let first = deliver(&mut manager, &mut session, &frame);

    // The socket drops and the server replays the same event after reconnect.
    let attempt = manager.live_attempt().unwrap();
    manager.on_closed(attempt, "reset", now);
    assert!(manager.poll_reconnect(now + Duration::from_secs(3)));
    manager.on_open(manager.live_attempt().unwrap(), now + Duration::from_secs(3));
    let replay = deliver(&mut manager, &mut session, &frame);

    assert_eq!(combat_effects(&first).len(), 1);
    assert!(replay.is_empty());
    let combat = session.combat().unwrap();
    assert_eq!(combat.local().hp, 93);
    assert_eq!(combat.turn(), 2);
    assert_eq!(combat.combat_log().len(), 1);
    assert_eq!(session.log().duplicates(), 1);
}

#[test]
fn applying_every_event_twice_changes_nothing() {
    let events = vec![
        turn_event(turn("wild_1", 2, ME, 90, 50)),
        turn_event(turn("wild_1", 3, 0, 80, 50)),
        ended("wild_1", ME, 10),
    ];

    let mut once = pve_session();
    for event in events.clone() {
        once.ingest(event);
    }
    once.pump();

    let mut twice = pve_session();
    for event in events.iter().chain(events.iter()).cloned() {
        twice.ingest(event);
    }
    twice.pump();

    let (a, b) = (once.combat().unwrap(), twice.combat().unwrap());
    assert_eq!(a.phase(), b.phase());
    assert_eq!(a.turn(), b.turn());
    assert_eq!(a.local(), b.local());
    assert_eq!(a.opponent(), b.opponent());
    assert_eq!(a.combat_log(), b.combat_log());
}

#[test]
fn frozen_flag_clears_the_turn_after_the_window() {
    let mut session = pve_session();
    let mut t = turn("wild_1", 4, 0, 90, 60);
    t.attacker_frozen_until = 4;
    session.ingest(turn_event(t.clone()));
    session.pump();
    assert!(session.combat().unwrap().is_frozen(Side::Local));

    t.turn_number = 5;
    session.ingest(turn_event(t));
    session.pump();
    assert!(!session.combat().unwrap().is_frozen(Side::Local));
}

#[test]
fn pvp_outcomes_follow_the_winner_id() {
    for (winner, expected) in [
        (ME, CombatOutcome::Win),
        (0, CombatOutcome::Draw),
        (9, CombatOutcome::Loss),
    ] {
        let mut session = GameSession::new(PlayerId::new(ME));
        session.mount_combat(CombatEntry::PvP {
            companion_id: CompanionId::new(COMPANION),
        });
        session.ingest(pvp_started(
            "arena_1",
            (9, 90),
            (ME, COMPANION),
            battle_context(80, 80, vec![]),
        ));
        session.ingest(ended("arena_1", winner, 0));
        session.pump();
        assert_eq!(
            session.combat().unwrap().phase().outcome(),
            Some(expected),
            "winner {winner}"
        );
    }
}

#[test]
fn pve_outcome_is_loss_only_for_winner_zero() {
    for (winner, expected) in [(ME, CombatOutcome::Win), (0, CombatOutcome::Loss)] {
        let mut session = pve_session();
        session.ingest(ended("wild_1", winner, 0));
        session.pump();
        assert_eq!(session.combat().unwrap().phase().outcome(), Some(expected));
    }
}

fn exploring(solid: &[(u32, u32)], x: i32, y: i32) -> GameSession {
    let mut session = GameSession::new(PlayerId::new(ME));
    session.mount_exploration(
        StoredPosition {
            zone_id: ZoneId::from("town"),
            x,
            y,
        },
        Duration::from_millis(150),
    );
    let grid = CollisionGrid::from_map(&zone_map(6, 6, solid)).unwrap();
    session
        .exploration_mut()
        .unwrap()
        .install_grid(&ZoneId::from("town"), grid);
    session
}

#[test]
fn solid_tiles_produce_no_move_and_no_command() {
    let solid = [(3, 2), (2, 3), (1, 2), (2, 1)];
    let mut session = exploring(&solid, 2, 2);
    let mut manager = manager();
    let start = Instant::now();

    for (i, direction) in [Direction::RIGHT, Direction::DOWN, Direction::LEFT, Direction::UP]
        .into_iter()
        .enumerate()
    {
        let now = start + Duration::from_secs(i as u64);
        let outcome = session.exploration_mut().unwrap().try_move(direction, now);
        if let MoveOutcome::Moved(command) = outcome {
            manager.send(command, now);
        }
    }

    assert_eq!(session.exploration().unwrap().position(), (2, 2));
    assert_eq!(manager.buffered(), 0);
    assert!(manager.transport().sent.is_empty());
}

#[test]
fn teleport_wins_over_an_in_flight_move() {
    let mut session = exploring(&[], 2, 2);
    let mut manager = manager();
    let now = Instant::now();
    manager.connect("tok", now);
    manager.on_open(manager.live_attempt().unwrap(), now);

    let MoveOutcome::Moved(command) = session.exploration_mut().unwrap().try_move(Direction::RIGHT, now)
    else {
        panic!("expected a move");
    };
    assert_eq!(manager.send(command, now), SendOutcome::Sent);

    session.ingest(teleport(0, 5, None));
    session.pump();
    assert_eq!(session.exploration().unwrap().position(), (0, 5));
}
