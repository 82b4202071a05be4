//! Obstacle scattering and connectivity repair.
//!
//! Generation runs in two passes:
//! - Scatter `round(size² × pct)` obstacles over candidate cells. The last
//!   row, the last column and any reserved cells are never candidates.
//! - Repair: while the walkable cells form more than one 4-connected region,
//!   carve an axis-aligned corridor (X first, then Y) from the closest cell of
//!   the largest region into each smaller region, clearing obstacles on it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Grid, GridPos, DEFAULT_GRID_SIZE};

/// Default fraction of cells turned into obstacles.
pub const DEFAULT_OBSTACLE_PERCENTAGE: f32 = 0.1;

/// Board parameters for generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Board edge length in cells.
    pub size: u32,
    /// Fraction of cells to turn into obstacles, `0.0..=1.0`.
    pub obstacle_percentage: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            obstacle_percentage: DEFAULT_OBSTACLE_PERCENTAGE,
        }
    }
}

impl MapConfig {
    /// Set the board edge length.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Set the obstacle percentage.
    #[must_use]
    pub const fn with_obstacle_percentage(mut self, pct: f32) -> Self {
        self.obstacle_percentage = pct;
        self
    }

    /// Reject a zero size or a percentage outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(GameError::InvalidGridSize(self.size));
        }
        if !(0.0..=1.0).contains(&self.obstacle_percentage) {
            return Err(GameError::InvalidObstaclePercentage(self.obstacle_percentage));
        }
        Ok(())
    }

    /// Number of obstacles requested before clamping to the candidate count.
    #[must_use]
    pub fn target_obstacle_count(&self) -> usize {
        let cells = f64::from(self.size) * f64::from(self.size);
        (cells * f64::from(self.obstacle_percentage)).round() as usize
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Obstacles scattered in the first pass.
    pub obstacles_placed: usize,
    /// Obstacles cleared by connectivity repair.
    pub obstacles_removed: usize,
    /// Regions joined to the main region.
    pub regions_merged: usize,
}

/// Generate a board whose walkable cells form a single region.
pub fn generate_grid<R: Rng + ?Sized>(
    config: &MapConfig,
    rng: &mut R,
) -> Result<(Grid, GenerationReport)> {
    generate_grid_reserving(config, &[], rng)
}

/// Like [`generate_grid`], but never scatters obstacles on `reserved` cells.
pub fn generate_grid_reserving<R: Rng + ?Sized>(
    config: &MapConfig,
    reserved: &[GridPos],
    rng: &mut R,
) -> Result<(Grid, GenerationReport)> {
    config.validate()?;

    let mut grid = Grid::new(config.size);
    let mut report = GenerationReport {
        obstacles_placed: scatter_obstacles(&mut grid, config, reserved, rng),
        ..GenerationReport::default()
    };

    let (removed, merged) = repair_connectivity(&mut grid);
    report.obstacles_removed = removed;
    report.regions_merged = merged;

    let regions = grid.regions().len();
    if regions > 1 {
        tracing::error!(regions, "Connectivity repair left the board split");
        return Err(GameError::DisconnectedLayout { regions });
    }

    tracing::info!(
        size = config.size,
        placed = report.obstacles_placed,
        removed = report.obstacles_removed,
        merged = report.regions_merged,
        "Generated grid"
    );
    Ok((grid, report))
}

fn scatter_obstacles<R: Rng + ?Sized>(
    grid: &mut Grid,
    config: &MapConfig,
    reserved: &[GridPos],
    rng: &mut R,
) -> usize {
    let last = config.size as i32 - 1;
    let mut candidates: Vec<GridPos> = grid
        .walkable_cells()
        .filter(|p| p.x != last && p.y != last && !reserved.contains(p))
        .collect();

    let count = config.target_obstacle_count().min(candidates.len());
    let (chosen, _) = candidates.partial_shuffle(rng, count);
    for &pos in chosen.iter() {
        grid.set_obstacle(pos, true);
    }
    count
}

/// Join every walkable region to the largest one.
///
/// Returns `(obstacles_removed, regions_merged)`.
pub fn repair_connectivity(grid: &mut Grid) -> (usize, usize) {
    let mut removed = 0;
    let mut merged = 0;

    loop {
        let regions = grid.regions();
        if regions.len() <= 1 {
            break;
        }
        let main = &regions[0];

        for region in &regions[1..] {
            let Some((from, to)) = closest_pair(main, region) else {
                continue;
            };
            removed += carve_corridor(grid, from, to);
            merged += 1;
            tracing::debug!(%from, %to, size = region.len(), "Joined isolated region");
        }
    }

    (removed, merged)
}

fn closest_pair(a: &[GridPos], b: &[GridPos]) -> Option<(GridPos, GridPos)> {
    let mut best: Option<(u32, GridPos, GridPos)> = None;
    for &p in a {
        for &q in b {
            let d = p.manhattan_distance(q);
            if best.map_or(true, |(bd, _, _)| d < bd) {
                best = Some((d, p, q));
            }
        }
    }
    best.map(|(_, p, q)| (p, q))
}

/// Clear obstacles on the X-then-Y line from `from` to `to`.
fn carve_corridor(grid: &mut Grid, from: GridPos, to: GridPos) -> usize {
    let mut removed = 0;
    let mut current = from;
    let mut clear = |grid: &mut Grid, pos: GridPos| {
        if grid.cell(pos).is_some_and(|c| c.is_obstacle()) && grid.set_obstacle(pos, false) {
            removed += 1;
        }
    };

    while current.x != to.x {
        current.x += (to.x - current.x).signum();
        clear(grid, current);
    }
    while current.y != to.y {
        current.y += (to.y - current.y).signum();
        clear(grid, current);
    }
    removed
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();
        assert_eq!(config.size, 25);
        assert!((config.obstacle_percentage - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.target_obstacle_count(), 63);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            MapConfig::default().with_size(0).validate(),
            Err(GameError::InvalidGridSize(0))
        ));
        assert!(matches!(
            MapConfig::default().with_obstacle_percentage(1.5).validate(),
            Err(GameError::InvalidObstaclePercentage(_))
        ));
        assert!(MapConfig::default().with_obstacle_percentage(1.0).validate().is_ok());
    }

    #[test]
    fn test_generated_grid_is_connected() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (grid, report) = generate_grid(&MapConfig::default(), &mut rng).unwrap();
            assert!(grid.is_connected(), "seed {seed} produced a split board");
            assert_eq!(
                grid.obstacle_count(),
                report.obstacles_placed - report.obstacles_removed
            );
        }
    }

    #[test]
    fn test_last_row_and_column_stay_clear() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = MapConfig::default().with_obstacle_percentage(0.5);
        let (grid, _) = generate_grid(&config, &mut rng).unwrap();
        for i in 0..25 {
            assert!(grid.is_walkable(GridPos::new(24, i)));
            assert!(grid.is_walkable(GridPos::new(i, 24)));
        }
    }

    #[test]
    fn test_zero_percentage_has_no_obstacles() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = MapConfig::default().with_obstacle_percentage(0.0);
        let (grid, report) = generate_grid(&config, &mut rng).unwrap();
        assert_eq!(grid.obstacle_count(), 0);
        assert_eq!(report, GenerationReport::default());
    }

    #[test]
    fn test_full_percentage_still_connected() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let config = MapConfig::default().with_size(10).with_obstacle_percentage(1.0);
        let (grid, report) = generate_grid(&config, &mut rng).unwrap();
        assert_eq!(report.obstacles_placed, 81);
        assert!(grid.is_connected());
    }

    #[test]
    fn test_reserved_cells_stay_clear() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = MapConfig::default().with_size(10).with_obstacle_percentage(1.0);
        let reserved = [GridPos::new(0, 0), GridPos::new(4, 4)];
        let (grid, report) = generate_grid_reserving(&config, &reserved, &mut rng).unwrap();
        assert_eq!(report.obstacles_placed, 79);
        assert!(reserved.iter().all(|&p| grid.is_walkable(p)));
    }

    #[test]
    fn test_same_seed_same_grid() {
        let config = MapConfig::default().with_obstacle_percentage(0.3);
        let (a, _) = generate_grid(&config, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let (b, _) = generate_grid(&config, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_repair_joins_walled_halves() {
        let mut grid = Grid::new(6);
        for y in 0..6 {
            grid.set_obstacle(GridPos::new(3, y), true);
        }
        let (removed, merged) = repair_connectivity(&mut grid);
        assert_eq!((removed, merged), (1, 1));
        assert!(grid.is_connected());
    }

    #[test]
    fn test_single_cell_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = MapConfig::default().with_size(1);
        let (grid, report) = generate_grid(&config, &mut rng).unwrap();
        assert_eq!(report.obstacles_placed, 0);
        assert!(grid.is_walkable(GridPos::new(0, 0)));
    }
}
