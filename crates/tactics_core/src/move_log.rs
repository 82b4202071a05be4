//! Capped, deduplicated history of committed actions.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::unit::{Archetype, SideId};

/// Default number of retained entries.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Kind of committed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Unit placed during setup.
    Place,
    /// Unit moved.
    Move,
    /// Unit attacked.
    Attack,
    /// Target struck back.
    Counterattack,
    /// Side ended its turn without acting.
    Skip,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Place => "place",
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Counterattack => "counter",
            Self::Skip => "skip",
        })
    }
}

/// One log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveLogEntry {
    /// Turn number when the action was committed.
    pub turn: u32,
    /// Acting side.
    pub side: SideId,
    /// Acting unit's archetype. `None` for skips.
    pub archetype: Option<Archetype>,
    /// Kind of action.
    pub action: ActionKind,
    /// Origin cell (mover or attacker position).
    pub from: Option<GridPos>,
    /// Destination cell (move target or attacked unit position).
    pub to: Option<GridPos>,
    /// Damage dealt, for attacks and counters.
    pub damage: Option<u32>,
}

impl MoveLogEntry {
    /// A skip entry for `side`.
    #[must_use]
    pub const fn skip(turn: u32, side: SideId) -> Self {
        Self {
            turn,
            side,
            archetype: None,
            action: ActionKind::Skip,
            from: None,
            to: None,
            damage: None,
        }
    }
}

impl fmt::Display for MoveLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} {}", self.turn, self.side)?;
        if let Some(archetype) = self.archetype {
            write!(f, " {archetype}")?;
        }
        write!(f, " {}", self.action)?;
        match (self.from, self.to) {
            (Some(from), Some(to)) => write!(f, " {from} -> {to}")?,
            (None, Some(to)) => write!(f, " {to}")?,
            (Some(from), None) => write!(f, " {from}")?,
            (None, None) => {}
        }
        if let Some(damage) = self.damage {
            write!(f, " dmg {damage}")?;
        }
        Ok(())
    }
}

/// FIFO of entries with a capacity and exact-content deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLog {
    entries: VecDeque<MoveLogEntry>,
    capacity: usize,
}

impl MoveLog {
    /// Create a log retaining at most `capacity` entries (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `entry`.
    ///
    /// An entry equal to one already retained is dropped. When full, the
    /// oldest entry is evicted. Returns whether the entry was added.
    pub fn push(&mut self, entry: MoveLogEntry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        true
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &MoveLogEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&MoveLogEntry> {
        self.entries.back()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum retained entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for MoveLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
