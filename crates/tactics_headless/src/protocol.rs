//! JSON protocol for headless match control.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller of the human side
//! **Output (stdout):** Responses, events and state snapshots
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}` and plays the automated
//!    side if it won the coin flip
//! 2. Controller sends commands as JSON lines
//! 3. Each accepted command is acknowledged, followed by the events it and
//!    the automated reply produced
//! 4. On match end, outputs `{"type":"game_over","outcome":{...}}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","seed":7,"grid_size":25,"first":"human"}
//! -> {"cmd":"place","archetype":"sniper","x":0,"y":0}
//! <- {"type":"ack","cmd":"place"}
//! <- {"type":"events","events":[{"event":"unit_placed",...},...]}
//! -> {"cmd":"move","unit":1,"x":9,"y":9}
//! <- {"type":"rejected","cmd":"move","reason":{"reason":"wrong_phase",...},"message":"..."}
//! -> {"cmd":"query"}
//! <- {"type":"state","phase":"setup",...}
//! ```

use serde::{Deserialize, Serialize};
use tactics_core::error::RejectReason;
use tactics_core::events::{MatchEvent, MatchOutcome};
use tactics_core::grid::GridPos;
use tactics_core::move_log::MoveLogEntry;
use tactics_core::turn::{Match, Phase};
use tactics_core::unit::{Archetype, SideId, Unit, UnitId};

/// Protocol revision reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Place a unit during setup.
    Place {
        archetype: Archetype,
        x: i32,
        y: i32,
    },

    /// Move a unit.
    Move { unit: UnitId, x: i32, y: i32 },

    /// Attack an enemy unit.
    Attack { unit: UnitId, target: UnitId },

    /// Hand the turn to the opponent.
    EndTurn,

    /// Cells a unit could move to right now.
    Reachable { unit: UnitId },

    /// Current match state.
    Query,

    /// Move log contents, oldest first.
    Log,

    /// Quit the session.
    Quit,
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        seed: u64,
        grid_size: u32,
        first: SideId,
    },

    /// Command accepted.
    Ack { cmd: String },

    /// Command refused by the rules; nothing changed.
    Rejected {
        cmd: String,
        reason: RejectReason,
        message: String,
    },

    /// Events emitted since the last response.
    Events { events: Vec<MatchEvent> },

    /// Snapshot of the match.
    State(StateSnapshot),

    /// Reachable cells for a unit.
    Reachable { unit: UnitId, cells: Vec<GridPos> },

    /// Move log contents.
    Log { entries: Vec<MoveLogEntry> },

    /// Match has ended.
    GameOver {
        outcome: MatchOutcome,
        turn_number: u32,
    },

    /// Goodbye message before shutdown.
    Bye,

    /// Malformed input.
    Error {
        message: String,
        cmd: Option<String>,
    },
}

// ============================================================================
// State Types
// ============================================================================

/// Full match snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub phase: Phase,
    pub active_side: SideId,
    pub turn_number: u32,
    pub grid_size: u32,
    pub obstacles: Vec<GridPos>,
    pub units: Vec<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MatchOutcome>,
    pub hash: u64,
}

impl StateSnapshot {
    /// Capture the current state of `game`.
    #[must_use]
    pub fn capture(game: &Match) -> Self {
        let grid = game.grid();
        Self {
            phase: game.phase(),
            active_side: game.active_side(),
            turn_number: game.turn_number(),
            grid_size: grid.size(),
            obstacles: grid
                .cells()
                .filter(|cell| cell.is_obstacle())
                .map(|cell| cell.pos)
                .collect(),
            units: game.units().to_vec(),
            outcome: game.outcome(),
            hash: game.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response for `game`.
    #[must_use]
    pub fn ready(game: &Match) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            seed: game.config().seed,
            grid_size: game.grid().size(),
            first: game.state().first_side,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create a rejection.
    #[must_use]
    pub fn rejected(cmd: &str, reason: RejectReason) -> Self {
        Self::Rejected {
            cmd: cmd.to_string(),
            message: reason.to_string(),
            reason,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Place { .. } => "place",
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::EndTurn => "end_turn",
            Self::Reachable { .. } => "reachable",
            Self::Query => "query",
            Self::Log => "log",
            Self::Quit => "quit",
        }
    }
}
