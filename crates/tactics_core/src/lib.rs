//! # Tactics Core
//!
//! Deterministic rules engine for a two-sided, turn-based grid tactics game.
//!
//! This crate contains **only** game rules:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded ChaCha RNG per match)
//!
//! Presentation layers and agents drive a [`turn::Match`] through its
//! `request_*` methods and read back [`events::MatchEvent`]s.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Board topology, occupancy and highlighting
//! - [`map_generation`] - Obstacle scattering and connectivity repair
//! - [`pathfinding`] - Movement range, preview paths, attack range
//! - [`unit`] / [`combat`] - Archetypes, movement and attack resolution
//! - [`ai`] / [`side`] - Automated opponent and side controllers
//! - [`turn`] - Match controller and phase state machine
//! - [`move_log`] - Capped history of committed actions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod battlefield;
pub mod combat;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod initiative;
pub mod map_generation;
pub mod move_log;
pub mod pathfinding;
pub mod side;
pub mod turn;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battlefield::Battlefield;
    pub use crate::combat::AttackReport;
    pub use crate::config::{Difficulty, MatchConfig};
    pub use crate::error::{GameError, RejectReason, Result};
    pub use crate::events::{DamageSource, MatchEvent, MatchOutcome};
    pub use crate::grid::{Grid, GridPos, Occupant};
    pub use crate::move_log::{ActionKind, MoveLog, MoveLogEntry};
    pub use crate::side::{AutomatedSide, HumanSide, Side};
    pub use crate::turn::{Action, Match, MatchState, Phase};
    pub use crate::unit::{Archetype, SideId, Unit, UnitId};
}
