//! Test fixtures and helpers.
//!
//! Pre-built matches with both sides driven externally, so tests control
//! every placement and action.

use tactics_core::config::MatchConfig;
use tactics_core::grid::GridPos;
use tactics_core::side::HumanSide;
use tactics_core::turn::{Match, Phase};
use tactics_core::unit::{Archetype, SideId, UnitId};

/// Shorthand for [`GridPos::new`].
#[must_use]
pub const fn pos(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

/// Default-sized board without obstacles.
#[must_use]
pub fn open_config(seed: u64) -> MatchConfig {
    MatchConfig::default()
        .with_seed(seed)
        .with_obstacle_percentage(0.0)
}

/// Match in setup where both sides wait for external requests.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn scripted_match(config: MatchConfig) -> Match {
    Match::new(
        config,
        Box::new(HumanSide::new(SideId::Human)),
        Box::new(HumanSide::new(SideId::Ai)),
    )
    .expect("fixture config must be valid")
}

/// Unit ids assigned by [`skirmish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkirmishUnits {
    /// Human Sniper.
    pub human_sniper: UnitId,
    /// Human Brawler.
    pub human_brawler: UnitId,
    /// AI Sniper.
    pub ai_sniper: UnitId,
    /// AI Brawler.
    pub ai_brawler: UnitId,
}

/// Scripted match already in play.
///
/// Each side places its Sniper on the first position and its Brawler on the
/// second, alternating from the coin-flip winner.
///
/// # Panics
///
/// Panics if a placement is rejected (e.g. overlapping positions).
pub fn skirmish(
    config: MatchConfig,
    human: [GridPos; 2],
    ai: [GridPos; 2],
) -> (Match, SkirmishUnits) {
    let mut game = scripted_match(config);
    let mut ids = [[UnitId::default(); 2]; 2];
    let mut next = [0usize; 2];

    while game.phase() == Phase::Setup {
        let side = game.active_side();
        let slot = next[side.index()];
        let cells = match side {
            SideId::Human => human,
            SideId::Ai => ai,
        };
        let archetype = Archetype::ALL[slot];
        let id = game
            .request_place_unit(side, cells[slot], archetype)
            .expect("fixture placement must succeed");
        ids[side.index()][slot] = id;
        next[side.index()] += 1;
    }
    game.drain_events();

    let units = SkirmishUnits {
        human_sniper: ids[0][0],
        human_brawler: ids[0][1],
        ai_sniper: ids[1][0],
        ai_brawler: ids[1][1],
    };
    (game, units)
}

/// Skirmish on an open board with the sides in opposite corners.
#[must_use]
pub fn corner_skirmish(seed: u64) -> (Match, SkirmishUnits) {
    skirmish(
        open_config(seed),
        [pos(0, 0), pos(1, 0)],
        [pos(24, 24), pos(23, 24)],
    )
}

/// Make `side` the active side by ending turns.
///
/// # Panics
///
/// Panics if the match is over.
pub fn give_turn_to(game: &mut Match, side: SideId) {
    if game.active_side() != side {
        let active = game.active_side();
        game.request_end_turn(active).expect("match must be in progress");
    }
}
