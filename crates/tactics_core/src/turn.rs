//! Match controller: phases, turn order, action validation and outcome.
//!
//! [`Match`] owns every piece of mutable state (board, units, log, RNG, the two
//! side controllers). Presentation and agents interact through the
//! `request_*` methods, each of which either applies completely or returns a
//! [`RejectReason`] without touching state.
//!
//! # Phases
//!
//! ```text
//! Setup ──(both sides placed 2 units)──▶ Playing ──(a side eliminated)──▶ GameOver
//! ```
//!
//! During Setup each side places one unit per turn. A placement ends that
//! side's turn. During Playing each living unit of the active side may move
//! once and attack once per turn, in either order.
//!
//! # Example
//!
//! ```
//! use tactics_core::prelude::*;
//!
//! let config = MatchConfig::default().with_seed(7);
//! let mut game = Match::human_vs_ai(config).unwrap();
//!
//! // Let the automated side act if it won the coin flip.
//! game.tick();
//! assert_eq!(game.active_side(), SideId::Human);
//! assert_eq!(game.phase(), Phase::Setup);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::combat::{check_mutual_destruction, AttackReport};
use crate::config::{Difficulty, MatchConfig};
use crate::error::{RejectReason, Result};
use crate::events::{DamageSource, MatchEvent, MatchOutcome};
use crate::grid::{Grid, GridPos};
use crate::initiative::coin_flip;
use crate::map_generation::generate_grid;
use crate::move_log::{ActionKind, MoveLog, MoveLogEntry};
use crate::pathfinding::{axis_path, is_reachable, reachable_cells};
use crate::side::{AutomatedSide, HumanSide, Side};
use crate::unit::{Archetype, SideId, Unit, UnitId};

/// Units each side places during setup.
pub const UNITS_PER_SIDE: u8 = 2;

/// Upper bound on automated actions in one turn before the turn is forced
/// to end.
pub const MAX_AUTOMATED_ACTIONS_PER_TURN: usize = 32;

/// Match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Units are being placed.
    #[default]
    Setup,
    /// Units move and fight.
    Playing,
    /// Terminal.
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Playing => "playing",
            Self::GameOver => "game over",
        })
    }
}

/// Turn and phase bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MatchState {
    /// Current phase.
    pub phase: Phase,
    /// Side allowed to act.
    pub active_side: SideId,
    /// Winner of the coin flip.
    pub first_side: SideId,
    /// Increments each time the turn passes back to the human side.
    pub turn_number: u32,
    /// Units placed, indexed by [`SideId::index`].
    pub placed: [u8; 2],
    /// Set when the special two-Sniper draw condition was met.
    pub mutual_destruction: bool,
    /// Final result once the phase is [`Phase::GameOver`].
    pub outcome: Option<MatchOutcome>,
    /// The active side has committed an action this turn.
    pub acted_this_turn: bool,
}

impl MatchState {
    /// Units placed by `side`.
    #[must_use]
    pub const fn placed_by(&self, side: SideId) -> u8 {
        self.placed[side.index()]
    }

    /// Terminal state reached.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

/// Something a side wants to do. Automated sides produce these; the match
/// applies them through the same validation as external requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Place a unit during setup.
    PlaceUnit {
        /// Kind to place.
        archetype: Archetype,
        /// Target cell.
        pos: GridPos,
    },
    /// Move a unit.
    Move {
        /// Mover.
        unit: UnitId,
        /// Destination.
        to: GridPos,
    },
    /// Attack with a unit.
    Attack {
        /// Attacker.
        unit: UnitId,
        /// Target.
        target: UnitId,
    },
    /// Hand over the turn.
    EndTurn,
}

/// A complete match between two sides.
#[derive(Debug)]
pub struct Match {
    config: MatchConfig,
    battlefield: Battlefield,
    state: MatchState,
    log: MoveLog,
    sides: [Box<dyn Side>; 2],
    rng: ChaCha8Rng,
    events: Vec<MatchEvent>,
}

impl Match {
    /// Create and start a match with the given controllers.
    ///
    /// `human` must control [`SideId::Human`] and `ai` [`SideId::Ai`].
    pub fn new(config: MatchConfig, human: Box<dyn Side>, ai: Box<dyn Side>) -> Result<Self> {
        config.validate()?;
        debug_assert_eq!(human.id(), SideId::Human);
        debug_assert_eq!(ai.id(), SideId::Ai);

        let mut game = Self {
            battlefield: Battlefield::new(Grid::new(config.grid_size)),
            state: MatchState::default(),
            log: MoveLog::new(config.log_capacity),
            sides: [human, ai],
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: Vec::new(),
            config,
        };
        game.start_match()?;
        Ok(game)
    }

    /// Externally driven human side against the automated opponent.
    pub fn human_vs_ai(config: MatchConfig) -> Result<Self> {
        let ai = AutomatedSide::new(SideId::Ai, config.difficulty)
            .with_placement_attempts(config.placement_attempts);
        Self::new(config, Box::new(HumanSide::new(SideId::Human)), Box::new(ai))
    }

    /// Both sides automated. Useful for simulation and batch runs.
    pub fn ai_vs_ai(config: MatchConfig) -> Result<Self> {
        let side = |id| {
            Box::new(
                AutomatedSide::new(id, config.difficulty)
                    .with_placement_attempts(config.placement_attempts),
            ) as Box<dyn Side>
        };
        let (human, ai) = (side(SideId::Human), side(SideId::Ai));
        Self::new(config, human, ai)
    }

    /// Generate a fresh board, flip for initiative and enter setup.
    ///
    /// Any previous units, log entries and outcome are discarded.
    pub fn start_match(&mut self) -> Result<()> {
        let (grid, _report) = generate_grid(&self.config.map_config(), &mut self.rng)?;
        let previous_phase = self.state.phase;

        self.battlefield = Battlefield::new(grid);
        self.log.clear();

        let first = coin_flip(&mut self.rng);
        self.state = MatchState {
            phase: Phase::Setup,
            active_side: first,
            first_side: first,
            turn_number: 1,
            ..MatchState::default()
        };

        tracing::info!(first = ?first, seed = self.config.seed, "Match started");

        if previous_phase != Phase::Setup {
            self.events.push(MatchEvent::PhaseChanged {
                from: previous_phase,
                to: Phase::Setup,
            });
        }
        self.events.push(MatchEvent::CoinFlipped { first });
        self.events.push(MatchEvent::TurnChanged {
            side: first,
            turn_number: self.state.turn_number,
        });
        self.notify_turn_start();
        Ok(())
    }

    /// Change the automated behaviour and restart with a regenerated board.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<()> {
        tracing::info!(?difficulty, "Difficulty changed, restarting match");
        self.config.difficulty = difficulty;
        for side in &mut self.sides {
            side.set_difficulty(difficulty);
        }
        self.start_match()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Board and units.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Board.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.battlefield.grid
    }

    /// Every unit, in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        self.battlefield.units()
    }

    /// Unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.battlefield.unit(id)
    }

    /// Turn and phase bookkeeping.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Side allowed to act.
    #[must_use]
    pub const fn active_side(&self) -> SideId {
        self.state.active_side
    }

    /// Current turn number.
    #[must_use]
    pub const fn turn_number(&self) -> u32 {
        self.state.turn_number
    }

    /// Final result, once over.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.state.outcome
    }

    /// Action history.
    #[must_use]
    pub const fn log(&self) -> &MoveLog {
        &self.log
    }

    /// True if `side` is driven by [`Match::tick`].
    #[must_use]
    pub fn is_automated(&self, side: SideId) -> bool {
        self.sides[side.index()].is_automated()
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Cells `unit` could move to right now.
    pub fn reachable_cells(&self, unit: UnitId) -> std::result::Result<BTreeSet<GridPos>, RejectReason> {
        let unit = self.unit(unit).ok_or(RejectReason::UnknownUnit(unit))?;
        if !unit.is_alive() {
            return Err(RejectReason::UnitDead(unit.id));
        }
        Ok(reachable_cells(&self.battlefield.grid, unit.position, unit.movement))
    }

    /// Hash of the full match state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.state.hash(&mut hasher);
        for cell in self.battlefield.grid.cells() {
            cell.occupant.hash(&mut hasher);
        }
        self.battlefield.units().hash(&mut hasher);
        for entry in self.log.entries() {
            entry.hash(&mut hasher);
        }
        hasher.finish()
    }

    // ------------------------------------------------------------------
    // Highlighting
    // ------------------------------------------------------------------

    /// Replace the movement-range preview with `unit`'s reachable cells.
    pub fn show_movement_range(
        &mut self,
        unit: UnitId,
    ) -> std::result::Result<BTreeSet<GridPos>, RejectReason> {
        let cells = self.reachable_cells(unit)?;
        let grid = &mut self.battlefield.grid;
        grid.clear_all_highlights();
        for &pos in &cells {
            grid.highlight_cell(pos, true);
        }
        Ok(cells)
    }

    /// Replace the path preview with the straight path from `unit` to `to`.
    pub fn preview_path(
        &mut self,
        unit: UnitId,
        to: GridPos,
    ) -> std::result::Result<Vec<GridPos>, RejectReason> {
        let from = self
            .unit(unit)
            .map(|u| u.position)
            .ok_or(RejectReason::UnknownUnit(unit))?;
        let path = axis_path(&self.battlefield.grid, from, to);
        self.battlefield.grid.highlight_path(&path, true);
        Ok(path)
    }

    /// Drop both previews.
    pub fn clear_highlights(&mut self) {
        self.battlefield.grid.clear_all_highlights();
        self.battlefield.grid.clear_path_highlights();
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    fn check_turn(&self, side: SideId, phase: Phase) -> std::result::Result<(), RejectReason> {
        if self.state.is_game_over() {
            return Err(RejectReason::MatchOver);
        }
        if self.state.phase != phase {
            return Err(RejectReason::WrongPhase {
                phase: self.state.phase,
            });
        }
        if self.state.active_side != side {
            return Err(RejectReason::NotYourTurn { side });
        }
        Ok(())
    }

    /// Place a unit for `side` during setup. Ends that side's turn.
    pub fn request_place_unit(
        &mut self,
        side: SideId,
        pos: GridPos,
        archetype: Archetype,
    ) -> std::result::Result<UnitId, RejectReason> {
        self.check_turn(side, Phase::Setup)?;

        let placed = self.state.placed_by(side);
        if placed >= UNITS_PER_SIDE {
            return Err(RejectReason::PlacementQuotaExceeded { side, placed });
        }
        if self.battlefield.has_placed(side, archetype) {
            return Err(RejectReason::ArchetypeAlreadyPlaced { side, archetype });
        }
        let grid = &self.battlefield.grid;
        if !grid.is_valid_position(pos) {
            return Err(RejectReason::OutOfBounds(pos));
        }
        if grid.is_occupied(pos) {
            return Err(RejectReason::CellOccupied(pos));
        }

        let id = self.battlefield.next_unit_id();
        self.battlefield.insert(Unit::new(id, side, archetype, pos));
        self.state.placed[side.index()] += 1;
        self.state.acted_this_turn = true;

        tracing::debug!(side = ?side, unit = %id, %archetype, %pos, "Unit placed");
        self.events.push(MatchEvent::UnitPlaced {
            unit: id,
            side,
            archetype,
            pos,
        });
        self.record(MoveLogEntry {
            turn: self.state.turn_number,
            side,
            archetype: Some(archetype),
            action: ActionKind::Place,
            from: None,
            to: Some(pos),
            damage: None,
        });

        self.switch_turn()?;
        self.validate_invariants();
        Ok(id)
    }

    /// Move `unit` to `to`. The cell must be in its BFS movement range.
    pub fn request_move(
        &mut self,
        unit: UnitId,
        to: GridPos,
    ) -> std::result::Result<(), RejectReason> {
        let mover = self.unit(unit).ok_or(RejectReason::UnknownUnit(unit))?;
        self.check_turn(mover.side, Phase::Playing)?;
        if !mover.is_alive() {
            return Err(RejectReason::UnitDead(unit));
        }
        if mover.has_moved {
            return Err(RejectReason::AlreadyMoved(unit));
        }

        let grid = &self.battlefield.grid;
        if !grid.is_valid_position(to) {
            return Err(RejectReason::OutOfBounds(to));
        }
        if grid.is_occupied(to) {
            return Err(RejectReason::CellOccupied(to));
        }
        if !is_reachable(grid, mover.position, mover.movement, to) {
            return Err(RejectReason::Unreachable(to));
        }

        let from = mover.position;
        let (side, archetype) = (mover.side, mover.archetype);
        let Some(mover) = self.battlefield.unit_mut(unit) else {
            return Err(RejectReason::UnknownUnit(unit));
        };
        mover.move_to(to)?;

        let grid = &mut self.battlefield.grid;
        grid.occupy(from, None);
        grid.occupy(to, Some(unit));
        grid.clear_all_highlights();
        grid.clear_path_highlights();
        self.state.acted_this_turn = true;

        tracing::debug!(unit = %unit, %from, %to, "Unit moved");
        self.events.push(MatchEvent::UnitMoved { unit, from, to });
        self.record(MoveLogEntry {
            turn: self.state.turn_number,
            side,
            archetype: Some(archetype),
            action: ActionKind::Move,
            from: Some(from),
            to: Some(to),
            damage: None,
        });
        self.validate_invariants();
        Ok(())
    }

    /// Attack `target` with `unit`. Resolves counterattack, deaths and game over.
    pub fn request_attack(
        &mut self,
        unit: UnitId,
        target: UnitId,
    ) -> std::result::Result<AttackReport, RejectReason> {
        let attacker = self.unit(unit).ok_or(RejectReason::UnknownUnit(unit))?;
        self.check_turn(attacker.side, Phase::Playing)?;
        if !attacker.is_alive() {
            return Err(RejectReason::UnitDead(unit));
        }
        if attacker.has_attacked {
            return Err(RejectReason::AlreadyAttacked(unit));
        }
        let defender = self.unit(target).ok_or(RejectReason::UnknownUnit(target))?;
        if defender.side == attacker.side {
            return Err(RejectReason::FriendlyTarget(target));
        }
        if !defender.is_alive() {
            return Err(RejectReason::TargetDead(target));
        }

        let Some((attacker, defender)) = self.battlefield.pair_mut(unit, target) else {
            return Err(RejectReason::UnknownUnit(target));
        };
        let report = attacker.attack(defender, &mut self.rng)?;

        let (attacker_side, attacker_kind, attacker_pos) =
            (attacker.side, attacker.archetype, attacker.position);
        let (defender_side, defender_kind, defender_pos) =
            (defender.side, defender.archetype, defender.position);
        self.state.acted_this_turn = true;

        self.events.push(MatchEvent::UnitDamaged {
            unit: target,
            by: unit,
            amount: report.damage,
            remaining_hp: report.target_hp_after,
            source: DamageSource::Attack,
        });
        self.record(MoveLogEntry {
            turn: self.state.turn_number,
            side: attacker_side,
            archetype: Some(attacker_kind),
            action: ActionKind::Attack,
            from: Some(attacker_pos),
            to: Some(defender_pos),
            damage: Some(report.damage),
        });

        if let Some(counter) = report.counter_damage {
            self.events.push(MatchEvent::UnitDamaged {
                unit,
                by: target,
                amount: counter,
                remaining_hp: report.attacker_hp_after,
                source: DamageSource::Counterattack,
            });
            self.record(MoveLogEntry {
                turn: self.state.turn_number,
                side: defender_side,
                archetype: Some(defender_kind),
                action: ActionKind::Counterattack,
                from: Some(defender_pos),
                to: Some(attacker_pos),
                damage: Some(counter),
            });
        }

        if report.target_died() {
            self.remove_dead(target, defender_side, defender_pos);
        }
        if report.attacker_died() {
            self.remove_dead(unit, attacker_side, attacker_pos);
        }
        if report.target_died() || report.attacker_died() {
            if check_mutual_destruction(&report, self.battlefield.units()) {
                tracing::info!("Mutual destruction of the last two Snipers");
                self.state.mutual_destruction = true;
            }
            self.check_game_over();
        }

        self.validate_invariants();
        Ok(report)
    }

    /// End `side`'s turn. Logs a skip if the side did nothing.
    pub fn request_end_turn(&mut self, side: SideId) -> std::result::Result<(), RejectReason> {
        if self.state.is_game_over() {
            return Err(RejectReason::MatchOver);
        }
        if self.state.active_side != side {
            return Err(RejectReason::NotYourTurn { side });
        }
        if !self.state.acted_this_turn {
            self.record(MoveLogEntry::skip(self.state.turn_number, side));
        }
        self.switch_turn()
    }

    /// Hand the turn to the other side.
    ///
    /// Increments the turn number when the human side becomes active, leaves
    /// setup once both sides placed all units, and resets the per-turn flags
    /// of the newly active side's living units.
    pub fn switch_turn(&mut self) -> std::result::Result<(), RejectReason> {
        if self.state.is_game_over() {
            return Err(RejectReason::MatchOver);
        }

        let next = self.state.active_side.opponent();
        self.state.active_side = next;
        if next == SideId::Human {
            self.state.turn_number += 1;
        }
        self.state.acted_this_turn = false;

        if self.state.phase == Phase::Setup
            && SideId::ALL
                .iter()
                .all(|&s| self.state.placed_by(s) == UNITS_PER_SIDE)
        {
            self.state.phase = Phase::Playing;
            tracing::info!(turn = self.state.turn_number, "Setup complete");
            self.events.push(MatchEvent::PhaseChanged {
                from: Phase::Setup,
                to: Phase::Playing,
            });
        }

        self.battlefield.reset_turn_flags(next);
        self.clear_highlights();

        tracing::debug!(side = ?next, turn = self.state.turn_number, "Turn changed");
        self.events.push(MatchEvent::TurnChanged {
            side: next,
            turn_number: self.state.turn_number,
        });
        self.notify_turn_start();
        Ok(())
    }

    /// Decide the match if a side has been eliminated.
    ///
    /// Only evaluated during play. Once decided, the outcome never changes.
    pub fn check_game_over(&mut self) -> Option<MatchOutcome> {
        if self.state.phase != Phase::Playing {
            return self.state.outcome;
        }

        let human = self.battlefield.living_count(SideId::Human);
        let ai = self.battlefield.living_count(SideId::Ai);
        let outcome = match (human, ai) {
            (0, 0) if self.state.mutual_destruction => MatchOutcome::Draw,
            // Both wiped out without the special condition: the attacker's side takes it.
            (0, 0) => MatchOutcome::Winner(self.state.active_side),
            (0, _) => MatchOutcome::Winner(SideId::Ai),
            (_, 0) => MatchOutcome::Winner(SideId::Human),
            _ => return None,
        };

        self.state.phase = Phase::GameOver;
        self.state.outcome = Some(outcome);
        self.clear_highlights();
        tracing::info!(?outcome, turn = self.state.turn_number, "Game over");

        self.events.push(MatchEvent::PhaseChanged {
            from: Phase::Playing,
            to: Phase::GameOver,
        });
        self.events.push(MatchEvent::GameOver { outcome });

        match outcome {
            MatchOutcome::Winner(winner) => {
                self.sides[winner.index()].on_win();
                self.sides[winner.opponent().index()].on_lose();
            }
            MatchOutcome::Draw => {
                for side in &mut self.sides {
                    side.on_draw();
                }
            }
        }
        Some(outcome)
    }

    /// Let the active side act while it is automated.
    ///
    /// Runs until that side hands over the turn or the match ends. A rejected
    /// automated action is logged and ends the turn. Does nothing when the
    /// active side waits for external input. Returns the number of actions
    /// applied.
    pub fn tick(&mut self) -> usize {
        let side = self.state.active_side;
        let mut applied = 0;

        while !self.state.is_game_over()
            && self.state.active_side == side
            && self.sides[side.index()].is_automated()
        {
            if applied >= MAX_AUTOMATED_ACTIONS_PER_TURN {
                tracing::warn!(side = ?side, applied, "Automated turn exceeded action limit");
                self.force_end_turn(side);
                break;
            }

            let Some(action) =
                self.sides[side.index()].next_action(&self.battlefield, &self.state, &mut self.rng)
            else {
                break;
            };

            match self.apply_action(side, action) {
                Ok(()) => applied += 1,
                Err(reason) => {
                    tracing::warn!(side = ?side, ?action, %reason, "Automated action rejected");
                    self.force_end_turn(side);
                    break;
                }
            }
        }
        applied
    }

    /// Keep ticking while automated sides hold the turn.
    ///
    /// Stops at game over, when a side waits for external input, or once the
    /// turn number passes `max_turns`. Returns the outcome, if decided.
    pub fn play_automated(&mut self, max_turns: u32) -> Option<MatchOutcome> {
        while !self.state.is_game_over() && self.state.turn_number <= max_turns {
            if self.tick() == 0 {
                break;
            }
        }
        self.state.outcome
    }

    /// Apply `action` on behalf of `side` through the request methods.
    pub fn apply_action(
        &mut self,
        side: SideId,
        action: Action,
    ) -> std::result::Result<(), RejectReason> {
        if let Some(unit) = match action {
            Action::Move { unit, .. } | Action::Attack { unit, .. } => Some(unit),
            _ => None,
        } {
            let owner = self.unit(unit).ok_or(RejectReason::UnknownUnit(unit))?.side;
            if owner != side {
                return Err(RejectReason::NotYourUnit(unit));
            }
        }

        match action {
            Action::PlaceUnit { archetype, pos } => {
                self.request_place_unit(side, pos, archetype).map(|_| ())
            }
            Action::Move { unit, to } => self.request_move(unit, to),
            Action::Attack { unit, target } => self.request_attack(unit, target).map(|_| ()),
            Action::EndTurn => self.request_end_turn(side),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn force_end_turn(&mut self, side: SideId) {
        if self.state.active_side == side && !self.state.is_game_over() {
            if let Err(reason) = self.request_end_turn(side) {
                tracing::error!(side = ?side, %reason, "Could not end automated turn");
            }
        }
    }

    fn remove_dead(&mut self, unit: UnitId, side: SideId, pos: GridPos) {
        self.battlefield.grid.occupy(pos, None);
        tracing::info!(unit = %unit, side = ?side, %pos, "Unit destroyed");
        self.events.push(MatchEvent::UnitDied { unit, side, pos });
    }

    fn record(&mut self, entry: MoveLogEntry) {
        if self.log.push(entry) {
            self.events.push(MatchEvent::LogEntryAdded { entry });
        }
    }

    fn notify_turn_start(&mut self) {
        let side = self.state.active_side;
        self.sides[side.index()].on_turn_start(&self.battlefield, &self.state);
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        let grid = &self.battlefield.grid;
        for unit in self.battlefield.units() {
            if unit.is_alive() {
                assert_eq!(
                    grid.unit_at(unit.position),
                    Some(unit.id),
                    "living unit {} not on its cell",
                    unit.id
                );
            }
        }
        for cell in grid.cells() {
            if let Some(id) = grid.unit_at(cell.pos) {
                assert!(
                    self.unit(id).is_some_and(|u| u.is_alive() && u.position == cell.pos),
                    "cell {} references stale unit {id}",
                    cell.pos
                );
            }
        }
        assert!(grid.is_connected(), "walkable cells split");
        for side in SideId::ALL {
            assert!(self.state.placed_by(side) <= UNITS_PER_SIDE);
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[inline]
    fn validate_invariants(&self) {}
}

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::*;

    fn scripted(seed: u64) -> Match {
        let config = MatchConfig::default()
            .with_seed(seed)
            .with_obstacle_percentage(0.0);
        Match::new(
            config,
            Box::new(HumanSide::new(SideId::Human)),
            Box::new(HumanSide::new(SideId::Ai)),
        )
        .unwrap()
    }

    /// Place Sniper then Brawler for each side. Returns ids as
    /// `[human sniper, human brawler, ai sniper, ai brawler]`.
    fn deploy(game: &mut Match, human: [GridPos; 2], ai: [GridPos; 2]) -> [UnitId; 4] {
        let mut ids = [UnitId::default(); 4];
        let mut next = [0usize; 2];
        while game.phase() == Phase::Setup {
            let side = game.active_side();
            let slot = next[side.index()];
            let cell = if side == SideId::Human { human[slot] } else { ai[slot] };
            ids[side.index() * 2 + slot] = game
                .request_place_unit(side, cell, Archetype::ALL[slot])
                .unwrap();
            next[side.index()] += 1;
        }
        ids
    }

    fn kill(game: &mut Match, id: UnitId) {
        let pos = game.unit(id).unwrap().position;
        game.battlefield.unit_mut(id).unwrap().hp = 0;
        game.battlefield.grid.occupy(pos, None);
    }

    fn set_hp(game: &mut Match, id: UnitId, hp: u32) {
        game.battlefield.unit_mut(id).unwrap().hp = hp;
    }

    #[test]
    fn test_start_match_enters_setup() {
        let mut game = scripted(1);
        assert_eq!(game.phase(), Phase::Setup);
        assert_eq!(game.turn_number(), 1);
        assert_eq!(game.state().first_side, game.active_side());
        assert!(game.grid().is_connected());

        let events = game.drain_events();
        assert!(matches!(events[0], MatchEvent::CoinFlipped { .. }));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_two_one_hp_snipers_destroy_each_other_is_draw() {
        let mut game = scripted(2);
        let [hs, hb, ais, aib] = deploy(
            &mut game,
            [GridPos::new(0, 0), GridPos::new(10, 10)],
            [GridPos::new(0, 5), GridPos::new(20, 20)],
        );
        kill(&mut game, hb);
        kill(&mut game, aib);
        set_hp(&mut game, hs, 1);
        set_hp(&mut game, ais, 1);

        let (attacker, target) = if game.active_side() == SideId::Human {
            (hs, ais)
        } else {
            (ais, hs)
        };
        let report = game.request_attack(attacker, target).unwrap();
        assert!(report.target_died());
        assert!(report.attacker_died());
        assert!(game.state().mutual_destruction);
        assert_eq!(game.outcome(), Some(MatchOutcome::Draw));
        assert_eq!(game.phase(), Phase::GameOver);
    }

    #[test]
    fn test_double_knockout_without_special_condition_goes_to_attacker() {
        let mut game = scripted(3);
        let [hs, hb, ais, aib] = deploy(
            &mut game,
            [GridPos::new(0, 0), GridPos::new(10, 10)],
            [GridPos::new(20, 20), GridPos::new(10, 11)],
        );
        kill(&mut game, hs);
        kill(&mut game, ais);
        set_hp(&mut game, hb, 1);
        set_hp(&mut game, aib, 1);

        let active = game.active_side();
        let (attacker, target) = if active == SideId::Human {
            (hb, aib)
        } else {
            (aib, hb)
        };
        game.request_attack(attacker, target).unwrap();
        assert!(!game.state().mutual_destruction);
        assert_eq!(game.outcome(), Some(MatchOutcome::Winner(active)));
    }

    #[test]
    fn test_game_over_not_checked_during_setup() {
        let mut game = scripted(4);
        assert_eq!(game.check_game_over(), None);
        assert_eq!(game.phase(), Phase::Setup);
    }

    #[test]
    fn test_outcome_is_sticky() {
        let mut game = scripted(5);
        let [_, hb, ais, aib] = deploy(
            &mut game,
            [GridPos::new(0, 0), GridPos::new(10, 10)],
            [GridPos::new(0, 5), GridPos::new(20, 20)],
        );
        kill(&mut game, hb);
        kill(&mut game, ais);
        kill(&mut game, aib);
        assert_eq!(
            game.check_game_over(),
            Some(MatchOutcome::Winner(SideId::Human))
        );
        assert_eq!(game.switch_turn(), Err(RejectReason::MatchOver));
        assert_eq!(
            game.check_game_over(),
            Some(MatchOutcome::Winner(SideId::Human))
        );
    }

    #[test]
    fn test_state_hash_deterministic() {
        let run = || {
            let mut game = scripted(6);
            let ids = deploy(
                &mut game,
                [GridPos::new(0, 0), GridPos::new(1, 0)],
                [GridPos::new(0, 7), GridPos::new(1, 7)],
            );
            let active = game.active_side();
            let (attacker, target) = if active == SideId::Human {
                (ids[0], ids[2])
            } else {
                (ids[2], ids[0])
            };
            game.request_attack(attacker, target).unwrap();
            game.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_highlight_helpers() {
        let mut game = scripted(7);
        let [hs, ..] = deploy(
            &mut game,
            [GridPos::new(5, 5), GridPos::new(10, 10)],
            [GridPos::new(20, 20), GridPos::new(21, 20)],
        );
        let cells = game.show_movement_range(hs).unwrap();
        assert_eq!(cells.len(), 24);
        assert_eq!(game.grid().highlighted_cells(), &cells);

        let path = game.preview_path(hs, GridPos::new(7, 6)).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(game.grid().path_cells().len(), 3);

        game.clear_highlights();
        assert!(game.grid().highlighted_cells().is_empty());
        assert!(game.grid().path_cells().is_empty());
    }

    /// Side that always asks for something illegal.
    #[derive(Debug)]
    struct StubbornSide;

    impl Side for StubbornSide {
        fn id(&self) -> SideId {
            SideId::Ai
        }

        fn is_automated(&self) -> bool {
            true
        }

        fn next_action(
            &mut self,
            _battlefield: &Battlefield,
            _state: &MatchState,
            _rng: &mut dyn RngCore,
        ) -> Option<Action> {
            Some(Action::Move {
                unit: UnitId(99),
                to: GridPos::new(0, 0),
            })
        }
    }

    #[test]
    fn test_rejected_automated_action_ends_turn() {
        let config = MatchConfig::default().with_seed(8);
        let mut game = Match::new(
            config,
            Box::new(HumanSide::new(SideId::Human)),
            Box::new(StubbornSide),
        )
        .unwrap();
        if game.active_side() == SideId::Human {
            game.request_end_turn(SideId::Human).unwrap();
        }
        assert_eq!(game.active_side(), SideId::Ai);

        assert_eq!(game.tick(), 0);
        assert_eq!(game.active_side(), SideId::Human);
        assert_eq!(game.log().last().map(|e| e.action), Some(ActionKind::Skip));
    }

    #[test]
    fn test_tick_waits_for_human() {
        let mut game = Match::human_vs_ai(MatchConfig::default().with_seed(9)).unwrap();
        if game.active_side() == SideId::Ai {
            game.tick();
        }
        assert_eq!(game.active_side(), SideId::Human);
        assert_eq!(game.tick(), 0);
        assert_eq!(game.active_side(), SideId::Human);
    }

    #[test]
    fn test_apply_action_checks_ownership() {
        let mut game = scripted(10);
        let ids = deploy(
            &mut game,
            [GridPos::new(0, 0), GridPos::new(1, 0)],
            [GridPos::new(0, 7), GridPos::new(1, 7)],
        );
        let active = game.active_side();
        let foreign = if active == SideId::Human { ids[2] } else { ids[0] };
        assert_eq!(
            game.apply_action(
                active,
                Action::Move {
                    unit: foreign,
                    to: GridPos::new(5, 5)
                }
            ),
            Err(RejectReason::NotYourUnit(foreign))
        );
    }

    #[test]
    fn test_move_within_distance_but_walled_in_is_unreachable() {
        let mut game = scripted(11);
        let ids = deploy(
            &mut game,
            [GridPos::new(0, 0), GridPos::new(1, 0)],
            [GridPos::new(0, 1), GridPos::new(10, 10)],
        );
        if game.active_side() != SideId::Human {
            game.request_end_turn(SideId::Ai).unwrap();
        }

        assert_eq!(
            game.request_move(ids[0], GridPos::new(2, 0)),
            Err(RejectReason::Unreachable(GridPos::new(2, 0)))
        );
        assert_eq!(game.unit(ids[0]).unwrap().position, GridPos::new(0, 0));
    }
}
