//! Decision rules for the automated opponent.
//!
//! These functions only read the battlefield. The resulting actions go through
//! the same request path as human input, so every AI choice is re-validated.
//!
//! | | Hard | Easy |
//! |---|---|---|
//! | Target | lowest HP in range, first on ties | uniform among targets in range |
//! | Move | step towards the nearest enemy | uniform over reachable cells |

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::battlefield::Battlefield;
use crate::config::Difficulty;
use crate::error::{GameError, Result};
use crate::grid::{Grid, GridPos};
use crate::pathfinding::reachable_cells;
use crate::unit::{Archetype, SideId, Unit, UnitId};

/// Pick a uniformly random empty cell, giving up after `attempts` draws.
pub fn random_empty_cell<R: Rng + ?Sized>(
    grid: &Grid,
    attempts: u32,
    rng: &mut R,
) -> Result<GridPos> {
    let size = grid.size() as i32;
    if size > 0 {
        for _ in 0..attempts {
            let pos = GridPos::new(rng.gen_range(0..size), rng.gen_range(0..size));
            if !grid.is_occupied(pos) {
                return Ok(pos);
            }
        }
    }
    Err(GameError::NoEmptyCell { attempts })
}

/// Next archetype `side` should place: Sniper, then Brawler, then nothing.
#[must_use]
pub fn next_placement(battlefield: &Battlefield, side: SideId) -> Option<Archetype> {
    Archetype::ALL
        .into_iter()
        .find(|&archetype| !battlefield.has_placed(side, archetype))
}

/// Living opponents within `unit`'s attack range, in id order.
pub fn targets_in_range<'a>(
    battlefield: &'a Battlefield,
    unit: &'a Unit,
) -> impl Iterator<Item = &'a Unit> + 'a {
    battlefield
        .living_units(unit.side.opponent())
        .filter(move |enemy| unit.in_attack_range(enemy))
}

/// Choose an attack target for `unit`, if any is in range.
pub fn select_target<R: Rng + ?Sized>(
    battlefield: &Battlefield,
    unit: &Unit,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<UnitId> {
    let targets = targets_in_range(battlefield, unit);
    let chosen = match difficulty {
        Difficulty::Hard => targets.min_by_key(|t| t.hp),
        Difficulty::Easy => targets.choose(rng),
    };
    chosen.map(|t| t.id)
}

/// Nearest living opponent by Manhattan distance, first on ties.
#[must_use]
pub fn nearest_enemy<'a>(battlefield: &'a Battlefield, unit: &Unit) -> Option<&'a Unit> {
    battlefield
        .living_units(unit.side.opponent())
        .min_by_key(|enemy| unit.distance_to(enemy.position))
}

/// Cells tried, in order, when stepping towards `target`.
///
/// Primary steps along X and Y first, then the diagonal towards the target,
/// then side-steps perpendicular to the line of approach.
#[must_use]
pub fn approach_candidates(from: GridPos, target: GridPos) -> Vec<GridPos> {
    let dx = (target.x - from.x).signum();
    let dy = (target.y - from.y).signum();

    let mut offsets = Vec::with_capacity(6);
    if dx != 0 {
        offsets.push((dx, 0));
    }
    if dy != 0 {
        offsets.push((0, dy));
    }
    match (dx, dy) {
        (0, 0) => {}
        (dx, 0) => offsets.extend([(dx, 1), (dx, -1), (0, 1), (0, -1)]),
        (0, dy) => offsets.extend([(1, dy), (-1, dy), (1, 0), (-1, 0)]),
        (dx, dy) => offsets.push((dx, dy)),
    }

    offsets
        .into_iter()
        .map(|(ox, oy)| from.offset(ox, oy))
        .collect()
}

/// Choose a destination for `unit`, if it should move.
pub fn select_move<R: Rng + ?Sized>(
    battlefield: &Battlefield,
    unit: &Unit,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<GridPos> {
    let reachable = reachable_for(battlefield, unit);
    match difficulty {
        Difficulty::Easy => reachable.iter().copied().choose(rng),
        Difficulty::Hard => {
            let enemy = nearest_enemy(battlefield, unit)?;
            approach_candidates(unit.position, enemy.position)
                .into_iter()
                .find(|&pos| {
                    battlefield.grid.is_valid_position(pos)
                        && !battlefield.grid.is_occupied(pos)
                        && unit.distance_to(pos) <= unit.movement
                        && reachable.contains(&pos)
                })
        }
    }
}

/// Every cell `unit` can move to this turn, in coordinate order.
#[must_use]
pub fn reachable_for(battlefield: &Battlefield, unit: &Unit) -> Vec<GridPos> {
    reachable_cells(&battlefield.grid, unit.position, unit.movement)
        .into_iter()
        .collect()
}
