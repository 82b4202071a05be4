//! Match configuration.
//!
//! Loaded from RON in tooling; every field has a default so partial
//! documents are accepted:
//!
//! ```
//! use tactics_core::config::{Difficulty, MatchConfig};
//!
//! let config = MatchConfig::from_ron_str("(grid_size: 12, difficulty: Easy)").unwrap();
//! assert_eq!(config.grid_size, 12);
//! assert_eq!(config.difficulty, Difficulty::Easy);
//! assert_eq!(config.placement_attempts, 100);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::DEFAULT_GRID_SIZE;
use crate::map_generation::{MapConfig, DEFAULT_OBSTACLE_PERCENTAGE};
use crate::move_log::DEFAULT_LOG_CAPACITY;

/// Default attempts when searching a random empty cell.
pub const DEFAULT_PLACEMENT_ATTEMPTS: u32 = 100;

/// Automated opponent behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Random in-range target, random reachable move.
    Easy,
    /// Weakest in-range target, closing move towards the nearest enemy.
    #[default]
    Hard,
}

/// Parameters for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Board edge length.
    pub grid_size: u32,
    /// Fraction of cells turned into obstacles.
    pub obstacle_percentage: f32,
    /// Retained move-log entries.
    pub log_capacity: usize,
    /// Attempts for random placement.
    pub placement_attempts: u32,
    /// Automated opponent behaviour.
    pub difficulty: Difficulty,
    /// Seed for every random draw in the match.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            obstacle_percentage: DEFAULT_OBSTACLE_PERCENTAGE,
            log_capacity: DEFAULT_LOG_CAPACITY,
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            difficulty: Difficulty::default(),
            seed: 0,
        }
    }
}

impl MatchConfig {
    /// Parse from a RON document and validate.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(source).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<()> {
        self.map_config().validate()?;
        if self.log_capacity == 0 {
            return Err(GameError::InvalidLogCapacity);
        }
        Ok(())
    }

    /// Board parameters.
    #[must_use]
    pub const fn map_config(&self) -> MapConfig {
        MapConfig {
            size: self.grid_size,
            obstacle_percentage: self.obstacle_percentage,
        }
    }

    /// Set the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the difficulty.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the board size.
    #[must_use]
    pub const fn with_grid_size(mut self, size: u32) -> Self {
        self.grid_size = size;
        self
    }

    /// Set the obstacle percentage.
    #[must_use]
    pub const fn with_obstacle_percentage(mut self, pct: f32) -> Self {
        self.obstacle_percentage = pct;
        self
    }
}
