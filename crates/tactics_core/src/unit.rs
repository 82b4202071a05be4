//! Units, archetype stats and side identity.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{self, AttackReport};
use crate::error::RejectReason;
use crate::grid::GridPos;

/// Which side of the match a unit or controller belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SideId {
    /// Externally controlled side.
    #[default]
    Human,
    /// Automated opponent.
    Ai,
}

impl SideId {
    /// Both sides, in index order.
    pub const ALL: [SideId; 2] = [SideId::Human, SideId::Ai];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Human => Self::Ai,
            Self::Ai => Self::Human,
        }
    }

    /// Stable array index (Human = 0, Ai = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Human => 0,
            Self::Ai => 1,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Human => "HP",
            Self::Ai => "AI",
        })
    }
}

/// Unit identifier, assigned sequentially at placement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fixed stat block for an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchetypeStats {
    /// Starting and maximum hit points.
    pub max_hp: u32,
    /// Manhattan movement allowance per turn.
    pub movement: u32,
    /// Manhattan attack range.
    pub attack_range: u32,
    /// Inclusive lower damage bound.
    pub damage_min: u32,
    /// Inclusive upper damage bound.
    pub damage_max: u32,
}

/// The two unit kinds. Each side fields exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Long range, fragile.
    Sniper,
    /// Melee, durable, fast.
    Brawler,
}

impl Archetype {
    /// Both archetypes in placement order.
    pub const ALL: [Archetype; 2] = [Archetype::Sniper, Archetype::Brawler];

    /// Stat block for this archetype.
    #[must_use]
    pub const fn stats(self) -> ArchetypeStats {
        match self {
            Self::Sniper => ArchetypeStats {
                max_hp: 20,
                movement: 3,
                attack_range: 10,
                damage_min: 4,
                damage_max: 8,
            },
            Self::Brawler => ArchetypeStats {
                max_hp: 40,
                movement: 6,
                attack_range: 1,
                damage_min: 1,
                damage_max: 6,
            },
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sniper => "Sniper",
            Self::Brawler => "Brawler",
        }
    }

    /// Single-letter code used in compact log lines and board dumps.
    #[must_use]
    pub const fn short_code(self) -> char {
        match self {
            Self::Sniper => 'S',
            Self::Brawler => 'B',
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Owning side.
    pub side: SideId,
    /// Kind of unit.
    pub archetype: Archetype,
    /// Current cell.
    pub position: GridPos,
    /// Current hit points. Zero is permanent death.
    pub hp: u32,
    /// Hit points at placement.
    pub max_hp: u32,
    /// Manhattan movement allowance.
    pub movement: u32,
    /// Manhattan attack range.
    pub attack_range: u32,
    /// Inclusive lower damage bound.
    pub damage_min: u32,
    /// Inclusive upper damage bound.
    pub damage_max: u32,
    /// Unit moved this turn.
    pub has_moved: bool,
    /// Unit attacked this turn.
    pub has_attacked: bool,
}

impl Unit {
    /// Create a fresh unit with the archetype's stats.
    #[must_use]
    pub fn new(id: UnitId, side: SideId, archetype: Archetype, position: GridPos) -> Self {
        let stats = archetype.stats();
        Self {
            id,
            side,
            archetype,
            position,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            movement: stats.movement,
            attack_range: stats.attack_range,
            damage_min: stats.damage_min,
            damage_max: stats.damage_max,
            has_moved: false,
            has_attacked: false,
        }
    }

    /// HP above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Manhattan distance from this unit to `pos`.
    #[must_use]
    pub const fn distance_to(&self, pos: GridPos) -> u32 {
        self.position.manhattan_distance(pos)
    }

    /// True if `other` stands within this unit's attack range.
    #[must_use]
    pub const fn in_attack_range(&self, other: &Unit) -> bool {
        self.distance_to(other.position) <= self.attack_range
    }

    /// Move to `target`.
    ///
    /// Only the per-turn flag and Manhattan distance are checked here.
    /// Occupancy and reachability are the caller's responsibility.
    pub fn move_to(&mut self, target: GridPos) -> Result<(), RejectReason> {
        if self.has_moved {
            return Err(RejectReason::AlreadyMoved(self.id));
        }
        let distance = self.distance_to(target);
        if distance > self.movement {
            return Err(RejectReason::OutOfMovementRange {
                distance,
                movement: self.movement,
            });
        }
        self.position = target;
        self.has_moved = true;
        Ok(())
    }

    /// Attack `target`, resolving damage and any counterattack.
    pub fn attack<R: Rng + ?Sized>(
        &mut self,
        target: &mut Unit,
        rng: &mut R,
    ) -> Result<AttackReport, RejectReason> {
        combat::resolve_attack(self, target, rng)
    }

    /// Apply damage, clamping HP at zero. Returns the damage actually absorbed.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let absorbed = amount.min(self.hp);
        self.hp -= absorbed;
        absorbed
    }

    /// Clear `has_moved` and `has_attacked` for a new turn.
    pub fn reset_turn_flags(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
    }
}
