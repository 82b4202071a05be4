//! Error types for the rules core.
//!
//! Two families exist:
//! - [`RejectReason`]: a requested action was refused. Always recoverable and
//!   never accompanied by a state change.
//! - [`GameError`]: configuration problems (bad map parameters, a layout that
//!   could not be made connected, no free cell found for a random placement).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridPos;
use crate::unit::{Archetype, SideId, UnitId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for configuration and setup failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Grid size must be positive.
    #[error("Grid size must be positive, got {0}")]
    InvalidGridSize(u32),

    /// Obstacle percentage outside `0.0..=1.0`.
    #[error("Obstacle percentage must be within 0.0..=1.0, got {0}")]
    InvalidObstaclePercentage(f32),

    /// Move log must retain at least one entry.
    #[error("Move log capacity must be positive")]
    InvalidLogCapacity,

    /// Generation finished but walkable cells are still split into regions.
    #[error("Generated layout has {regions} disconnected walkable regions")]
    DisconnectedLayout {
        /// Number of regions left after repair.
        regions: usize,
    },

    /// Random placement search exhausted its attempts.
    #[error("No empty cell found after {attempts} attempts")]
    NoEmptyCell {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Failed to parse a configuration document.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}

/// Why a requested action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    /// The acting side does not hold the turn.
    #[error("It is not {side:?}'s turn")]
    NotYourTurn {
        /// Side that attempted to act.
        side: SideId,
    },

    /// The action is not allowed in the current phase.
    #[error("Action not allowed during the {phase} phase")]
    WrongPhase {
        /// Phase the match was in.
        phase: crate::turn::Phase,
    },

    /// The match is over; no further actions or turn switches.
    #[error("The match is over")]
    MatchOver,

    /// Coordinates outside the board.
    #[error("Cell {0} is outside the grid")]
    OutOfBounds(GridPos),

    /// Cell holds a unit or obstacle.
    #[error("Cell {0} is occupied")]
    CellOccupied(GridPos),

    /// Cell is not in the unit's movement range.
    #[error("Cell {0} is not reachable this turn")]
    Unreachable(GridPos),

    /// Manhattan distance exceeds the unit's movement allowance.
    #[error("Destination is {distance} cells away, movement is {movement}")]
    OutOfMovementRange {
        /// Distance to the requested cell.
        distance: u32,
        /// Unit movement allowance.
        movement: u32,
    },

    /// Unit already moved this turn.
    #[error("Unit {0} already moved this turn")]
    AlreadyMoved(UnitId),

    /// Unit already attacked this turn.
    #[error("Unit {0} already attacked this turn")]
    AlreadyAttacked(UnitId),

    /// Side has placed all of its units.
    #[error("{side:?} has already placed {placed} units")]
    PlacementQuotaExceeded {
        /// Side attempting the placement.
        side: SideId,
        /// Units already placed.
        placed: u8,
    },

    /// Side already fielded a unit of this archetype.
    #[error("{side:?} already placed a {archetype}")]
    ArchetypeAlreadyPlaced {
        /// Side attempting the placement.
        side: SideId,
        /// Duplicate archetype.
        archetype: Archetype,
    },

    /// No unit with this id.
    #[error("Unknown unit {0}")]
    UnknownUnit(UnitId),

    /// The unit is dead and out of play.
    #[error("Unit {0} is dead")]
    UnitDead(UnitId),

    /// Attack target is dead.
    #[error("Target {0} is dead")]
    TargetDead(UnitId),

    /// The unit belongs to the other side.
    #[error("Unit {0} is not controlled by the acting side")]
    NotYourUnit(UnitId),

    /// Attack aimed at a unit on the same side.
    #[error("Unit {0} is friendly")]
    FriendlyTarget(UnitId),

    /// Attack target beyond attack range.
    #[error("Target is {distance} cells away, attack range is {range}")]
    TargetOutOfRange {
        /// Distance to the target.
        distance: u32,
        /// Attacker's range.
        range: u32,
    },
}
