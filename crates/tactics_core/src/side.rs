//! Controllers for the two sides of a match.
//!
//! Both human and automated controllers implement [`Side`]. The match owns
//! one of each and routes turn notifications and outcomes through the trait.
//! Automated sides are polled with [`Side::next_action`]; human sides return
//! `None` and wait for external requests.

use std::collections::VecDeque;
use std::fmt;

use rand::RngCore;

use crate::ai;
use crate::battlefield::Battlefield;
use crate::config::{Difficulty, DEFAULT_PLACEMENT_ATTEMPTS};
use crate::turn::{Action, MatchState, Phase};
use crate::unit::{SideId, UnitId};

/// A participant in the match.
pub trait Side: fmt::Debug + Send {
    /// Which side this controller plays.
    fn id(&self) -> SideId;

    /// True if the match should poll [`Side::next_action`] during `tick`.
    fn is_automated(&self) -> bool;

    /// Called when this side becomes active.
    fn on_turn_start(&mut self, _battlefield: &Battlefield, _state: &MatchState) {}

    /// Next action to apply, or `None` to wait for external input.
    fn next_action(
        &mut self,
        battlefield: &Battlefield,
        state: &MatchState,
        rng: &mut dyn RngCore,
    ) -> Option<Action>;

    /// Difficulty changed. Only meaningful for automated sides.
    fn set_difficulty(&mut self, _difficulty: Difficulty) {}

    /// This side won.
    fn on_win(&mut self) {}

    /// This side lost.
    fn on_lose(&mut self) {}

    /// The match ended in a draw.
    fn on_draw(&mut self) {}
}

/// Externally driven side. Actions arrive as match requests.
#[derive(Debug, Clone)]
pub struct HumanSide {
    id: SideId,
}

impl HumanSide {
    /// Controller for `id`.
    #[must_use]
    pub const fn new(id: SideId) -> Self {
        Self { id }
    }
}

impl Side for HumanSide {
    fn id(&self) -> SideId {
        self.id
    }

    fn is_automated(&self) -> bool {
        false
    }

    fn on_turn_start(&mut self, _battlefield: &Battlefield, state: &MatchState) {
        tracing::debug!(side = ?self.id, turn = state.turn_number, "Awaiting input");
    }

    fn next_action(
        &mut self,
        _battlefield: &Battlefield,
        _state: &MatchState,
        _rng: &mut dyn RngCore,
    ) -> Option<Action> {
        None
    }

    fn on_win(&mut self) {
        tracing::info!(side = ?self.id, "Victory");
    }

    fn on_lose(&mut self) {
        tracing::info!(side = ?self.id, "Defeat");
    }

    fn on_draw(&mut self) {
        tracing::info!(side = ?self.id, "Draw");
    }
}

/// Computer-controlled side.
///
/// At turn start the living units are queued in id order. Each unit attacks
/// if it can and is then done. A unit without a target moves only while no
/// unit of the side has moved this turn, and is then re-evaluated once for an
/// attack from its new cell. An empty queue ends the turn.
#[derive(Debug, Clone)]
pub struct AutomatedSide {
    id: SideId,
    difficulty: Difficulty,
    placement_attempts: u32,
    queue: VecDeque<UnitId>,
    moved_this_turn: bool,
    results: Vec<MatchResult>,
}

/// Outcome reported to a side at match end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Side won.
    Won,
    /// Side lost.
    Lost,
    /// Draw.
    Draw,
}

impl AutomatedSide {
    /// Automated controller for `id`.
    #[must_use]
    pub fn new(id: SideId, difficulty: Difficulty) -> Self {
        Self {
            id,
            difficulty,
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            queue: VecDeque::new(),
            moved_this_turn: false,
            results: Vec::new(),
        }
    }

    /// Attempts used when searching a random cell during setup.
    #[must_use]
    pub const fn with_placement_attempts(mut self, attempts: u32) -> Self {
        self.placement_attempts = attempts;
        self
    }

    /// Current behaviour.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Outcomes received so far, oldest first.
    #[must_use]
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    fn setup_action(&self, battlefield: &Battlefield, rng: &mut dyn RngCore) -> Action {
        let Some(archetype) = ai::next_placement(battlefield, self.id) else {
            return Action::EndTurn;
        };
        match ai::random_empty_cell(&battlefield.grid, self.placement_attempts, rng) {
            Ok(pos) => Action::PlaceUnit { archetype, pos },
            Err(err) => {
                tracing::warn!(side = ?self.id, %archetype, %err, "Skipping placement");
                Action::EndTurn
            }
        }
    }

    fn battle_action(&mut self, battlefield: &Battlefield, rng: &mut dyn RngCore) -> Action {
        while let Some(&id) = self.queue.front() {
            let Some(unit) = battlefield.unit(id).filter(|u| u.is_alive()) else {
                self.queue.pop_front();
                continue;
            };

            if !unit.has_attacked {
                if let Some(target) = ai::select_target(battlefield, unit, self.difficulty, rng) {
                    self.queue.pop_front();
                    return Action::Attack { unit: id, target };
                }
            }

            // One move per side per turn.
            if !self.moved_this_turn && !unit.has_moved {
                if let Some(to) = ai::select_move(battlefield, unit, self.difficulty, rng) {
                    // Stays queued to look for a target from the new cell.
                    self.moved_this_turn = true;
                    return Action::Move { unit: id, to };
                }
            }

            self.queue.pop_front();
        }
        Action::EndTurn
    }
}

impl Side for AutomatedSide {
    fn id(&self) -> SideId {
        self.id
    }

    fn is_automated(&self) -> bool {
        true
    }

    fn on_turn_start(&mut self, battlefield: &Battlefield, state: &MatchState) {
        self.queue = battlefield.living_units(self.id).map(|u| u.id).collect();
        self.moved_this_turn = false;
        tracing::debug!(
            side = ?self.id,
            turn = state.turn_number,
            units = self.queue.len(),
            "Automated turn started"
        );
    }

    fn next_action(
        &mut self,
        battlefield: &Battlefield,
        state: &MatchState,
        rng: &mut dyn RngCore,
    ) -> Option<Action> {
        let action = match state.phase {
            Phase::Setup => self.setup_action(battlefield, rng),
            Phase::Playing => self.battle_action(battlefield, rng),
            Phase::GameOver => return None,
        };
        Some(action)
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    fn on_win(&mut self) {
        self.results.push(MatchResult::Won);
    }

    fn on_lose(&mut self) {
        self.results.push(MatchResult::Lost);
    }

    fn on_draw(&mut self) {
        self.results.push(MatchResult::Draw);
    }
}
