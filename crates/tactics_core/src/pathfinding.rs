//! Movement range, preview paths and attack range on the tactical grid.
//!
//! Movement is 4-directional with unit cost per step. Units and obstacles
//! block movement; nothing blocks targeting.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::grid::{Grid, GridPos};

/// Cells reachable from `origin` within `movement` steps.
///
/// Breadth-first search over in-bounds, unoccupied cells. The origin itself
/// is exempt from the occupancy check (the moving unit stands there) and is
/// never part of the result.
#[must_use]
pub fn reachable_cells(grid: &Grid, origin: GridPos, movement: u32) -> BTreeSet<GridPos> {
    let mut result = BTreeSet::new();
    if !grid.is_valid_position(origin) {
        return result;
    }

    // First arrival wins; with unit step cost it also has the largest budget.
    let mut visited: HashSet<GridPos> = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(origin);
    queue.push_back((origin, movement));

    while let Some((pos, remaining)) = queue.pop_front() {
        if remaining == 0 {
            continue;
        }
        for next in pos.neighbors() {
            if grid.is_occupied(next) || !visited.insert(next) {
                continue;
            }
            result.insert(next);
            queue.push_back((next, remaining - 1));
        }
    }

    result.remove(&origin);
    result
}

/// Whether `target` is in `origin`'s movement range.
#[must_use]
pub fn is_reachable(grid: &Grid, origin: GridPos, movement: u32, target: GridPos) -> bool {
    origin.manhattan_distance(target) <= movement
        && reachable_cells(grid, origin, movement).contains(&target)
}

/// Straight preview path: close the X gap, then the Y gap.
///
/// The result starts with `from`. Occupied intermediate cells are skipped
/// rather than routed around; `to` is always the last point. Only meant for
/// highlighting.
#[must_use]
pub fn axis_path(grid: &Grid, from: GridPos, to: GridPos) -> Vec<GridPos> {
    let mut path = vec![from];
    let mut current = from;

    let step = |current: GridPos, path: &mut Vec<GridPos>| {
        if current == to || !grid.is_occupied(current) {
            path.push(current);
        }
    };

    while current.x != to.x {
        current.x += (to.x - current.x).signum();
        step(current, &mut path);
    }
    while current.y != to.y {
        current.y += (to.y - current.y).signum();
        step(current, &mut path);
    }
    path
}

/// Every valid cell with `0 < distance <= range` from `origin`.
///
/// Obstacles and units do not block targeting.
#[must_use]
pub fn attack_range_cells(grid: &Grid, origin: GridPos, range: u32) -> Vec<GridPos> {
    let r = range as i32;
    let mut cells = Vec::new();
    for dy in -r..=r {
        let span = r - dy.abs();
        for dx in -span..=span {
            let pos = origin.offset(dx, dy);
            if pos != origin && grid.is_valid_position(pos) {
                cells.push(pos);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitId;

    fn pos(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    #[test]
    fn test_reachable_open_board() {
        let grid = Grid::new(25);
        let cells = reachable_cells(&grid, pos(12, 12), 3);
        // Diamond of radius 3 has 25 cells, minus the origin.
        assert_eq!(cells.len(), 24);
        assert!(!cells.contains(&pos(12, 12)));
        assert!(cells.iter().all(|c| c.manhattan_distance(pos(12, 12)) <= 3));
    }

    #[test]
    fn test_reachable_clipped_at_corner() {
        let grid = Grid::new(25);
        let cells = reachable_cells(&grid, pos(0, 0), 1);
        assert_eq!(cells, [pos(1, 0), pos(0, 1)].into_iter().collect());
    }

    #[test]
    fn test_reachable_blocked_by_units_and_obstacles() {
        let mut grid = Grid::new(5);
        grid.occupy(pos(1, 0), Some(UnitId(9)));
        grid.set_obstacle(pos(0, 1), true);
        let cells = reachable_cells(&grid, pos(0, 0), 4);
        assert!(cells.is_empty());
    }

    #[test]
    fn test_reachable_detour_costs_budget() {
        let mut grid = Grid::new(5);
        // Wall at x=1 except at y=4.
        for y in 0..4 {
            grid.set_obstacle(pos(1, y), true);
        }
        let cells = reachable_cells(&grid, pos(0, 0), 6);
        assert!(cells.contains(&pos(2, 4)));
        assert!(!cells.contains(&pos(2, 0)));
        assert!(!cells.contains(&pos(2, 3)));
    }

    #[test]
    fn test_reachable_with_zero_movement() {
        let grid = Grid::new(5);
        assert!(reachable_cells(&grid, pos(2, 2), 0).is_empty());
    }

    #[test]
    fn test_axis_path_x_then_y() {
        let grid = Grid::new(10);
        let path = axis_path(&grid, pos(1, 1), pos(3, 2));
        assert_eq!(path, vec![pos(1, 1), pos(2, 1), pos(3, 1), pos(3, 2)]);
    }

    #[test]
    fn test_axis_path_skips_occupied_but_keeps_destination() {
        let mut grid = Grid::new(10);
        grid.set_obstacle(pos(2, 1), true);
        grid.occupy(pos(3, 2), Some(UnitId(1)));
        let path = axis_path(&grid, pos(1, 1), pos(3, 2));
        assert_eq!(path, vec![pos(1, 1), pos(3, 1), pos(3, 2)]);
    }

    #[test]
    fn test_axis_path_same_cell() {
        let grid = Grid::new(10);
        assert_eq!(axis_path(&grid, pos(4, 4), pos(4, 4)), vec![pos(4, 4)]);
    }

    #[test]
    fn test_attack_range_ignores_obstacles() {
        let mut grid = Grid::new(25);
        grid.set_obstacle(pos(5, 6), true);
        let cells = attack_range_cells(&grid, pos(5, 5), 1);
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&pos(5, 6)));
        assert!(!cells.contains(&pos(5, 5)));
    }

    #[test]
    fn test_attack_range_clipped_to_board() {
        let grid = Grid::new(25);
        let cells = attack_range_cells(&grid, pos(0, 0), 10);
        assert!(cells.iter().all(|c| grid.is_valid_position(*c)));
        // Quarter diamond including axes: sum_{d=1..10} (d + 1) = 65.
        assert_eq!(cells.len(), 65);
    }

    #[test]
    fn test_is_reachable() {
        let grid = Grid::new(10);
        assert!(is_reachable(&grid, pos(5, 5), 2, pos(7, 5)));
        assert!(!is_reachable(&grid, pos(5, 5), 2, pos(8, 5)));
        assert!(!is_reachable(&grid, pos(5, 5), 2, pos(5, 5)));
    }
}
