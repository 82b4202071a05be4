//! Proptest strategies for board and match inputs.

use proptest::prelude::*;
use tactics_core::config::{Difficulty, MatchConfig};
use tactics_core::grid::GridPos;
use tactics_core::unit::Archetype;

/// Board sizes small enough for fast property runs.
pub fn arb_grid_size() -> impl Strategy<Value = u32> {
    2u32..=30
}

/// Obstacle percentage across the whole valid range.
pub fn arb_obstacle_percentage() -> impl Strategy<Value = f32> {
    (0u32..=100).prop_map(|p| p as f32 / 100.0)
}

/// Position inside a `size × size` board.
pub fn arb_grid_pos(size: u32) -> impl Strategy<Value = GridPos> {
    let max = size.max(1) as i32;
    (0..max, 0..max).prop_map(|(x, y)| GridPos::new(x, y))
}

/// Position that may fall outside a `size × size` board.
pub fn arb_any_pos(size: u32) -> impl Strategy<Value = GridPos> {
    let span = size as i32 + 5;
    (-5..span, -5..span).prop_map(|(x, y)| GridPos::new(x, y))
}

/// Either archetype.
pub fn arb_archetype() -> impl Strategy<Value = Archetype> {
    prop_oneof![Just(Archetype::Sniper), Just(Archetype::Brawler)]
}

/// Either difficulty.
pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![Just(Difficulty::Easy), Just(Difficulty::Hard)]
}

/// Match seed.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Valid match configuration.
pub fn arb_match_config() -> impl Strategy<Value = MatchConfig> {
    (
        arb_grid_size(),
        arb_obstacle_percentage(),
        arb_difficulty(),
        arb_seed(),
    )
        .prop_map(|(size, pct, difficulty, seed)| {
            MatchConfig::default()
                .with_grid_size(size)
                .with_obstacle_percentage(pct)
                .with_difficulty(difficulty)
                .with_seed(seed)
        })
}
