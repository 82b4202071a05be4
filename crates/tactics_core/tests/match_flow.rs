//! End-to-end match flow through the public request surface.

use tactics_core::prelude::*;
use tactics_test_utils::fixtures::{
    corner_skirmish, give_turn_to, open_config, pos, scripted_match, skirmish,
};

#[test]
fn test_setup_transitions_to_playing_after_four_placements() {
    let mut game = scripted_match(open_config(1));
    let first = game.active_side();
    let second = first.opponent();

    game.request_place_unit(first, pos(0, 0), Archetype::Sniper).unwrap();
    assert_eq!(game.active_side(), second);
    game.request_place_unit(second, pos(10, 10), Archetype::Sniper).unwrap();
    game.request_place_unit(first, pos(1, 0), Archetype::Brawler).unwrap();
    assert_eq!(game.phase(), Phase::Setup);
    game.request_place_unit(second, pos(11, 10), Archetype::Brawler).unwrap();

    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(game.active_side(), first);
    let events = game.drain_events();
    assert!(events.contains(&MatchEvent::PhaseChanged {
        from: Phase::Setup,
        to: Phase::Playing,
    }));
}

#[test]
fn test_placement_quota_and_duplicate_archetype() {
    let mut game = scripted_match(open_config(2));
    let side = game.active_side();

    game.request_place_unit(side, pos(0, 0), Archetype::Sniper).unwrap();
    game.request_end_turn(side.opponent()).unwrap();

    assert_eq!(
        game.request_place_unit(side, pos(1, 0), Archetype::Sniper),
        Err(RejectReason::ArchetypeAlreadyPlaced {
            side,
            archetype: Archetype::Sniper
        })
    );
    game.request_place_unit(side, pos(1, 0), Archetype::Brawler).unwrap();
    game.request_end_turn(side.opponent()).unwrap();

    assert_eq!(
        game.request_place_unit(side, pos(2, 0), Archetype::Brawler),
        Err(RejectReason::PlacementQuotaExceeded { side, placed: 2 })
    );
    assert_eq!(game.phase(), Phase::Setup);
}

#[test]
fn test_placement_on_bad_cells_rejected() {
    let mut game = scripted_match(open_config(3));
    let side = game.active_side();
    game.request_place_unit(side, pos(4, 4), Archetype::Sniper).unwrap();
    let other = side.opponent();

    assert_eq!(
        game.request_place_unit(other, pos(4, 4), Archetype::Sniper),
        Err(RejectReason::CellOccupied(pos(4, 4)))
    );
    assert_eq!(
        game.request_place_unit(other, pos(25, 0), Archetype::Sniper),
        Err(RejectReason::OutOfBounds(pos(25, 0)))
    );
    assert_eq!(
        game.request_place_unit(side, pos(5, 5), Archetype::Brawler),
        Err(RejectReason::NotYourTurn { side })
    );
}

#[test]
fn test_turn_number_increments_when_human_regains_turn() {
    let mut game = scripted_match(open_config(4));
    let mut seen = vec![(game.active_side(), game.turn_number())];
    for _ in 0..4 {
        let active = game.active_side();
        game.request_end_turn(active).unwrap();
        seen.push((game.active_side(), game.turn_number()));
    }

    let expected = if seen[0].0 == SideId::Human {
        vec![
            (SideId::Human, 1),
            (SideId::Ai, 1),
            (SideId::Human, 2),
            (SideId::Ai, 2),
            (SideId::Human, 3),
        ]
    } else {
        vec![
            (SideId::Ai, 1),
            (SideId::Human, 2),
            (SideId::Ai, 2),
            (SideId::Human, 3),
            (SideId::Ai, 3),
        ]
    };
    assert_eq!(seen, expected);
}

#[test]
fn test_skip_is_logged_when_nothing_happened() {
    let mut game = scripted_match(open_config(5));
    let side = game.active_side();
    game.request_end_turn(side).unwrap();
    let last = game.log().last().copied().unwrap();
    assert_eq!(last.action, ActionKind::Skip);
    assert_eq!(last.side, side);
}

#[test]
fn test_rejected_request_changes_nothing() {
    let (mut game, units) = corner_skirmish(6);
    let before = game.state_hash();
    let idle = game.active_side().opponent();
    let idle_unit = if idle == SideId::Human {
        units.human_brawler
    } else {
        units.ai_brawler
    };

    assert!(matches!(
        game.request_move(idle_unit, pos(12, 12)),
        Err(RejectReason::NotYourTurn { .. })
    ));
    assert_eq!(
        game.request_end_turn(idle),
        Err(RejectReason::NotYourTurn { side: idle })
    );
    assert_eq!(game.state_hash(), before);
}

#[test]
fn test_brawler_move_then_second_move_fails() {
    let (mut game, units) = skirmish(
        open_config(7),
        [pos(0, 0), pos(5, 5)],
        [pos(24, 24), pos(20, 20)],
    );
    give_turn_to(&mut game, SideId::Human);

    game.request_move(units.human_brawler, pos(7, 5)).unwrap();
    let brawler = game.unit(units.human_brawler).unwrap();
    assert_eq!(brawler.position, pos(7, 5));
    assert!(brawler.has_moved);
    assert!(game.grid().is_occupied(pos(7, 5)));
    assert!(!game.grid().is_occupied(pos(5, 5)));

    assert_eq!(
        game.request_move(units.human_brawler, pos(8, 5)),
        Err(RejectReason::AlreadyMoved(units.human_brawler))
    );
}

#[test]
fn test_move_validation() {
    let (mut game, units) = skirmish(
        open_config(8),
        [pos(0, 0), pos(5, 5)],
        [pos(24, 24), pos(6, 5)],
    );
    give_turn_to(&mut game, SideId::Human);

    assert_eq!(
        game.request_move(units.human_brawler, pos(6, 5)),
        Err(RejectReason::CellOccupied(pos(6, 5)))
    );
    assert_eq!(
        game.request_move(units.human_sniper, pos(4, 0)),
        Err(RejectReason::Unreachable(pos(4, 0)))
    );
    assert_eq!(
        game.request_move(units.human_sniper, pos(-1, 0)),
        Err(RejectReason::OutOfBounds(pos(-1, 0)))
    );
    assert!(game.request_move(units.human_sniper, pos(3, 0)).is_ok());
}

#[test]
fn test_sniper_attack_on_distant_brawler() {
    let (mut game, units) = skirmish(
        open_config(9),
        [pos(0, 0), pos(10, 10)],
        [pos(20, 20), pos(3, 4)],
    );
    give_turn_to(&mut game, SideId::Human);

    let report = game
        .request_attack(units.human_sniper, units.ai_brawler)
        .unwrap();
    assert!((4..=8).contains(&report.damage));
    assert_eq!(report.counter_damage, None);
    assert_eq!(game.unit(units.ai_brawler).unwrap().hp, 40 - report.damage);
    assert!(game.unit(units.human_sniper).unwrap().has_attacked);

    assert_eq!(
        game.request_attack(units.human_sniper, units.ai_brawler),
        Err(RejectReason::AlreadyAttacked(units.human_sniper))
    );
    assert_eq!(
        game.request_attack(units.human_brawler, units.human_sniper),
        Err(RejectReason::FriendlyTarget(units.human_sniper))
    );
    assert!(matches!(
        game.request_attack(units.human_brawler, units.ai_sniper),
        Err(RejectReason::TargetOutOfRange { range: 1, .. })
    ));

    let log: Vec<_> = game.log().entries().map(|e| e.action).collect();
    assert_eq!(log.last(), Some(&ActionKind::Attack));
}

#[test]
fn test_attack_allowed_before_and_after_move() {
    let (mut game, units) = skirmish(
        open_config(10),
        [pos(0, 0), pos(10, 10)],
        [pos(20, 20), pos(3, 4)],
    );
    give_turn_to(&mut game, SideId::Human);
    game.request_attack(units.human_sniper, units.ai_brawler).unwrap();
    game.request_move(units.human_sniper, pos(1, 0)).unwrap();
    game.request_move(units.human_brawler, pos(10, 13)).unwrap();
}

#[test]
fn test_flags_reset_for_new_active_side() {
    let (mut game, units) = skirmish(
        open_config(11),
        [pos(0, 0), pos(10, 10)],
        [pos(20, 20), pos(3, 4)],
    );
    give_turn_to(&mut game, SideId::Human);
    game.request_attack(units.human_sniper, units.ai_brawler).unwrap();
    game.request_end_turn(SideId::Human).unwrap();
    game.request_end_turn(SideId::Ai).unwrap();
    assert!(!game.unit(units.human_sniper).unwrap().has_attacked);
}

#[test]
fn test_elimination_ends_match() {
    let (mut game, units) = skirmish(
        open_config(12),
        [pos(0, 0), pos(24, 0)],
        [pos(0, 8), pos(5, 0)],
    );
    give_turn_to(&mut game, SideId::Human);

    for target in [units.ai_brawler, units.ai_sniper] {
        while game.unit(target).is_some_and(Unit::is_alive) {
            game.request_attack(units.human_sniper, target).unwrap();
            if game.phase() == Phase::GameOver {
                break;
            }
            game.request_end_turn(SideId::Human).unwrap();
            game.request_end_turn(SideId::Ai).unwrap();
        }
    }

    assert_eq!(game.phase(), Phase::GameOver);
    assert_eq!(game.outcome(), Some(MatchOutcome::Winner(SideId::Human)));
    assert!(game.unit(units.human_sniper).unwrap().is_alive());
    assert!(!game.grid().is_occupied(pos(0, 8)));
    assert!(!game.grid().is_occupied(pos(5, 0)));

    let events = game.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, MatchEvent::UnitDied { unit, .. } if *unit == units.ai_sniper)));
    assert!(events.contains(&MatchEvent::GameOver {
        outcome: MatchOutcome::Winner(SideId::Human)
    }));

    assert_eq!(
        game.request_end_turn(SideId::Human),
        Err(RejectReason::MatchOver)
    );
    assert_eq!(
        game.request_move(units.human_brawler, pos(23, 0)),
        Err(RejectReason::MatchOver)
    );
}

#[test]
fn test_human_vs_ai_setup_completes_with_automated_placements() {
    let mut game = Match::human_vs_ai(MatchConfig::default().with_seed(13)).unwrap();
    let mut cells = [pos(0, 0), pos(0, 1)].into_iter();

    while game.phase() == Phase::Setup {
        game.tick();
        if game.phase() != Phase::Setup {
            break;
        }
        let archetype = if game.state().placed_by(SideId::Human) == 0 {
            Archetype::Sniper
        } else {
            Archetype::Brawler
        };
        let mut cell = cells.next().unwrap();
        while game.grid().is_occupied(cell) {
            cell = GridPos::new(cell.x + 1, cell.y);
        }
        game.request_place_unit(SideId::Human, cell, archetype).unwrap();
    }

    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(game.units().len(), 4);
    assert_eq!(game.battlefield().living_count(SideId::Ai), 2);
}

#[test]
fn test_automated_matches_finish_on_open_board() {
    let mut finished = 0;
    for seed in 0..8 {
        let mut game = Match::ai_vs_ai(open_config(seed)).unwrap();
        if let Some(outcome) = game.play_automated(400) {
            finished += 1;
            assert_eq!(game.phase(), Phase::GameOver);
            if let MatchOutcome::Winner(winner) = outcome {
                assert_eq!(game.battlefield().living_count(winner.opponent()), 0);
            }
        }
    }
    assert!(finished > 0);
}

#[test]
fn test_set_difficulty_restarts_match() {
    let (mut game, _) = corner_skirmish(14);
    game.set_difficulty(Difficulty::Easy).unwrap();
    assert_eq!(game.phase(), Phase::Setup);
    assert!(game.units().is_empty());
    assert!(game.log().is_empty());
    assert_eq!(game.turn_number(), 1);
    assert_eq!(game.config().difficulty, Difficulty::Easy);
}
