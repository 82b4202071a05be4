//! Shared board state: the grid plus every unit ever placed.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::unit::{Archetype, SideId, Unit, UnitId};

/// Grid and units, owned by the match and lent to sides for decisions.
///
/// Units are stored by id order; `UnitId(n)` lives at index `n`. Dead units
/// stay in the list with zero HP but no longer occupy a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battlefield {
    /// Board.
    pub grid: Grid,
    units: Vec<Unit>,
}

impl Battlefield {
    /// Wrap a board with no units.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            units: Vec::new(),
        }
    }

    /// Id the next placed unit will receive.
    #[must_use]
    pub fn next_unit_id(&self) -> UnitId {
        UnitId(self.units.len() as u32)
    }

    /// Add a unit and mark its cell. The unit's id must be [`Self::next_unit_id`].
    pub(crate) fn insert(&mut self, unit: Unit) {
        debug_assert_eq!(unit.id, self.next_unit_id());
        self.grid.occupy(unit.position, Some(unit.id));
        self.units.push(unit);
    }

    /// Every unit, alive or dead, in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0 as usize)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.0 as usize)
    }

    /// Two distinct units mutably. `None` if either is missing or `a == b`.
    pub(crate) fn pair_mut(&mut self, a: UnitId, b: UnitId) -> Option<(&mut Unit, &mut Unit)> {
        let (ia, ib) = (a.0 as usize, b.0 as usize);
        if ia == ib || ia >= self.units.len() || ib >= self.units.len() {
            return None;
        }
        if ia < ib {
            let (left, right) = self.units.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.units.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Units placed by `side`, alive or dead.
    pub fn units_of(&self, side: SideId) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.side == side)
    }

    /// Living units of `side`.
    pub fn living_units(&self, side: SideId) -> impl Iterator<Item = &Unit> {
        self.units_of(side).filter(|u| u.is_alive())
    }

    /// Number of living units of `side`.
    #[must_use]
    pub fn living_count(&self, side: SideId) -> usize {
        self.living_units(side).count()
    }

    /// True if `side` has placed a unit of `archetype`.
    #[must_use]
    pub fn has_placed(&self, side: SideId, archetype: Archetype) -> bool {
        self.units_of(side).any(|u| u.archetype == archetype)
    }

    /// Clear the turn flags of every living unit of `side`.
    pub(crate) fn reset_turn_flags(&mut self, side: SideId) {
        for unit in self.units.iter_mut().filter(|u| u.side == side && u.is_alive()) {
            unit.reset_turn_flags();
        }
    }
}
