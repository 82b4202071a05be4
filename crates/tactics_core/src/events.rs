//! Notifications emitted by the match controller.
//!
//! Events accumulate during each request and are drained by the caller with
//! [`Match::drain_events`](crate::turn::Match::drain_events).

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::move_log::MoveLogEntry;
use crate::turn::Phase;
use crate::unit::{Archetype, SideId, UnitId};

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "result", content = "side", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// One side won.
    Winner(SideId),
    /// Both sides were destroyed in the same exchange.
    Draw,
}

impl MatchOutcome {
    /// Winning side, if any.
    #[must_use]
    pub const fn winner(self) -> Option<SideId> {
        match self {
            Self::Winner(side) => Some(side),
            Self::Draw => None,
        }
    }
}

/// What inflicted damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    /// The attacker's strike.
    Attack,
    /// The target striking back.
    Counterattack,
}

/// A state change visible to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// Phase transition.
    PhaseChanged {
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// Coin flip decided the first side.
    CoinFlipped {
        /// Side that acts first.
        first: SideId,
    },
    /// Active side changed.
    TurnChanged {
        /// Newly active side.
        side: SideId,
        /// Current turn number.
        turn_number: u32,
    },
    /// Unit placed during setup.
    UnitPlaced {
        /// New unit.
        unit: UnitId,
        /// Owner.
        side: SideId,
        /// Kind.
        archetype: Archetype,
        /// Cell.
        pos: GridPos,
    },
    /// Unit moved.
    UnitMoved {
        /// Mover.
        unit: UnitId,
        /// Previous cell.
        from: GridPos,
        /// New cell.
        to: GridPos,
    },
    /// Unit lost HP.
    UnitDamaged {
        /// Damaged unit.
        unit: UnitId,
        /// Unit dealing the damage.
        by: UnitId,
        /// Amount rolled.
        amount: u32,
        /// HP left.
        remaining_hp: u32,
        /// Attack or counterattack.
        source: DamageSource,
    },
    /// Unit reached zero HP and left the board.
    UnitDied {
        /// Dead unit.
        unit: UnitId,
        /// Owner.
        side: SideId,
        /// Cell vacated.
        pos: GridPos,
    },
    /// Match ended.
    GameOver {
        /// Result.
        outcome: MatchOutcome,
    },
    /// An entry was appended to the move log.
    LogEntryAdded {
        /// New entry.
        entry: MoveLogEntry,
    },
}
