//! Board topology: cell validity, occupancy, obstacles and highlight state.
//!
//! Highlighting here is logical only. Two independent sets are tracked so a
//! path preview never erases the movement-range preview and vice versa.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unit::UnitId;

/// Default board edge length in cells.
pub const DEFAULT_GRID_SIZE: u32 = 25;

/// Cardinal offsets used for every 4-connected walk on the board.
pub const CARDINAL_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A cell coordinate. Signed so that off-board positions can be expressed
/// and rejected instead of wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, |dx| + |dy|.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Position shifted by the given offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The four cardinal neighbours, in [`CARDINAL_DIRECTIONS`] order.
    pub fn neighbors(self) -> impl Iterator<Item = GridPos> {
        CARDINAL_DIRECTIONS
            .into_iter()
            .map(move |(dx, dy)| self.offset(dx, dy))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// What a cell holds. Obstacles and units are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Occupant {
    /// Nothing; a unit may enter.
    #[default]
    Empty,
    /// Impassable terrain.
    Obstacle,
    /// A living unit.
    Unit(UnitId),
}

/// A single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    /// Cell coordinate.
    pub pos: GridPos,
    /// Current occupant.
    pub occupant: Occupant,
    /// Part of the movement-range preview.
    pub range_highlight: bool,
    /// Part of the path preview.
    pub path_highlight: bool,
}

impl GridCell {
    const fn empty(pos: GridPos) -> Self {
        Self {
            pos,
            occupant: Occupant::Empty,
            range_highlight: false,
            path_highlight: false,
        }
    }

    /// Returns true if the cell is an obstacle.
    #[must_use]
    pub const fn is_obstacle(&self) -> bool {
        matches!(self.occupant, Occupant::Obstacle)
    }
}

/// Square board of `size × size` cells stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    size: u32,
    cells: Vec<GridCell>,
    range_highlights: BTreeSet<GridPos>,
    path_highlights: BTreeSet<GridPos>,
}

impl Grid {
    /// Create an empty board with no obstacles.
    ///
    /// A zero size yields a board on which every position is invalid.
    #[must_use]
    pub fn new(size: u32) -> Self {
        let mut cells = Vec::with_capacity((size as usize) * (size as usize));
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                cells.push(GridCell::empty(GridPos::new(x, y)));
            }
        }
        Self {
            size,
            cells,
            range_highlights: BTreeSet::new(),
            path_highlights: BTreeSet::new(),
        }
    }

    /// Board edge length.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        self.is_valid_position(pos)
            .then(|| (pos.y as usize) * (self.size as usize) + (pos.x as usize))
    }

    /// Bounds check, `0 <= x, y < size`.
    #[must_use]
    pub fn is_valid_position(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.size && (pos.y as u32) < self.size
    }

    /// Cell at `pos`, or `None` off the board.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&GridCell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    /// Occupant at `pos`; off-board positions read as obstacles.
    #[must_use]
    pub fn occupant(&self, pos: GridPos) -> Occupant {
        self.cell(pos).map_or(Occupant::Obstacle, |c| c.occupant)
    }

    /// Unit standing on `pos`, if any.
    #[must_use]
    pub fn unit_at(&self, pos: GridPos) -> Option<UnitId> {
        match self.occupant(pos) {
            Occupant::Unit(id) => Some(id),
            _ => None,
        }
    }

    /// True for off-board positions and for cells holding a unit or obstacle.
    #[must_use]
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        !matches!(self.occupant(pos), Occupant::Empty)
    }

    /// True if `pos` is on the board and not an obstacle.
    #[must_use]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(|c| !c.is_obstacle())
    }

    /// Set or clear the unit reference on a cell.
    ///
    /// Invalid coordinates and obstacle cells are left untouched. Returns
    /// whether the cell was updated.
    pub fn occupy(&mut self, pos: GridPos, unit: Option<UnitId>) -> bool {
        let Some(i) = self.index(pos) else {
            return false;
        };
        let cell = &mut self.cells[i];
        if cell.is_obstacle() {
            return false;
        }
        cell.occupant = unit.map_or(Occupant::Empty, Occupant::Unit);
        true
    }

    /// Place or remove an obstacle. Refused on cells holding a unit.
    pub fn set_obstacle(&mut self, pos: GridPos, obstacle: bool) -> bool {
        let Some(i) = self.index(pos) else {
            return false;
        };
        let cell = &mut self.cells[i];
        match (cell.occupant, obstacle) {
            (Occupant::Unit(_), _) => false,
            (_, true) => {
                cell.occupant = Occupant::Obstacle;
                true
            }
            (Occupant::Obstacle, false) => {
                cell.occupant = Occupant::Empty;
                true
            }
            (Occupant::Empty, false) => true,
        }
    }

    /// Number of obstacle cells.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_obstacle()).count()
    }

    /// Positions of every non-obstacle cell in row-major order.
    pub fn walkable_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.cells
            .iter()
            .filter(|c| !c.is_obstacle())
            .map(|c| c.pos)
    }

    /// Positions of every empty cell in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.cells
            .iter()
            .filter(|c| c.occupant == Occupant::Empty)
            .map(|c| c.pos)
    }

    /// 4-connected regions of non-obstacle cells, largest first.
    ///
    /// Ties keep discovery order (row-major by first cell).
    #[must_use]
    pub fn regions(&self) -> Vec<Vec<GridPos>> {
        let mut labels: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut regions: Vec<Vec<GridPos>> = Vec::new();

        for start in self.walkable_cells() {
            let Some(start_idx) = self.index(start) else {
                continue;
            };
            if labels[start_idx].is_some() {
                continue;
            }

            let label = regions.len();
            let mut region = Vec::new();
            let mut stack = vec![start];
            labels[start_idx] = Some(label);

            while let Some(pos) = stack.pop() {
                region.push(pos);
                for next in pos.neighbors() {
                    if !self.is_walkable(next) {
                        continue;
                    }
                    if let Some(idx) = self.index(next) {
                        if labels[idx].is_none() {
                            labels[idx] = Some(label);
                            stack.push(next);
                        }
                    }
                }
            }

            region.sort_unstable();
            regions.push(region);
        }

        // Stable sort keeps discovery order among equal sizes.
        regions.sort_by(|a, b| b.len().cmp(&a.len()));
        regions
    }

    /// True when all non-obstacle cells form one region (or there are none).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.regions().len() <= 1
    }

    // ------------------------------------------------------------------
    // Highlighting
    // ------------------------------------------------------------------

    /// Add or remove a cell from the movement-range preview.
    pub fn highlight_cell(&mut self, pos: GridPos, highlight: bool) {
        let Some(i) = self.index(pos) else {
            return;
        };
        self.cells[i].range_highlight = highlight;
        if highlight {
            self.range_highlights.insert(pos);
        } else {
            self.range_highlights.remove(&pos);
        }
    }

    /// Clear the movement-range preview. Path highlights are untouched.
    pub fn clear_all_highlights(&mut self) {
        for pos in std::mem::take(&mut self.range_highlights) {
            if let Some(i) = self.index(pos) {
                self.cells[i].range_highlight = false;
            }
        }
    }

    /// Highlight a path.
    ///
    /// The first point is the unit's own cell and is skipped unless it is the
    /// only point. Invalid points are skipped.
    pub fn highlight_path(&mut self, points: &[GridPos], clear_previous: bool) {
        if clear_previous {
            self.clear_path_highlights();
        }

        let skip_first = points.len() > 1;
        for (i, &pos) in points.iter().enumerate() {
            if i == 0 && skip_first {
                continue;
            }
            let Some(idx) = self.index(pos) else {
                tracing::trace!(%pos, "skipping off-board path point");
                continue;
            };
            self.cells[idx].path_highlight = true;
            self.path_highlights.insert(pos);
        }
    }

    /// Clear the path preview. Range highlights are untouched.
    pub fn clear_path_highlights(&mut self) {
        for pos in std::mem::take(&mut self.path_highlights) {
            if let Some(i) = self.index(pos) {
                self.cells[i].path_highlight = false;
            }
        }
    }

    /// Cells currently in the movement-range preview.
    #[must_use]
    pub fn highlighted_cells(&self) -> &BTreeSet<GridPos> {
        &self.range_highlights
    }

    /// Cells currently in the path preview.
    #[must_use]
    pub fn path_cells(&self) -> &BTreeSet<GridPos> {
        &self.path_highlights
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}
