//! Automated match simulation and batch runs.
//!
//! Runs many AI-vs-AI matches in parallel using rayon to compare sides,
//! initiative and difficulty settings across seeds.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tactics_core::config::MatchConfig;
use tactics_core::error::GameError;
use tactics_core::events::MatchOutcome;
use tactics_core::move_log::MoveLogEntry;
use tactics_core::turn::Match;
use tactics_core::unit::SideId;
use tracing::{debug, info, warn};

/// Default turn limit for automated matches.
pub const DEFAULT_MAX_TURNS: u32 = 200;

/// Result of one automated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Seed the match ran with.
    pub seed: u64,
    /// Coin flip winner.
    pub first_side: SideId,
    /// Final result, `None` if the turn limit was hit.
    pub outcome: Option<MatchOutcome>,
    /// Turn number when play stopped.
    pub turns: u32,
    /// Living units per side, indexed by [`SideId::index`].
    pub survivors: [usize; 2],
    /// Hash of the final state.
    pub final_state_hash: u64,
    /// Retained move log.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<MoveLogEntry>,
}

/// Play one AI-vs-AI match to completion or `max_turns`.
pub fn simulate_match(config: MatchConfig, max_turns: u32) -> Result<MatchSummary, GameError> {
    let seed = config.seed;
    let mut game = Match::ai_vs_ai(config)?;
    let outcome = game.play_automated(max_turns);

    debug!(seed, ?outcome, turns = game.turn_number(), "Simulated match");

    Ok(MatchSummary {
        seed,
        first_side: game.state().first_side,
        outcome,
        turns: game.turn_number(),
        survivors: SideId::ALL.map(|side| game.battlefield().living_count(side)),
        final_state_hash: game.state_hash(),
        log: game.log().entries().copied().collect(),
    })
}

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Base match parameters; the seed is replaced per game
    pub base: MatchConfig,
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Turn limit per game
    pub max_turns: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base: MatchConfig::default(),
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl BatchConfig {
    /// Create config for `game_count` games of `base`
    #[must_use]
    pub fn new(base: MatchConfig, game_count: u32) -> Self {
        Self {
            base,
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set turn limit
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games that produced a summary.
    pub games: u32,
    /// Wins per side, indexed by [`SideId::index`].
    pub wins: [u32; 2],
    /// Mutual destruction results.
    pub draws: u32,
    /// Games stopped by the turn limit.
    pub unfinished: u32,
    /// Decided games won by the side that moved first.
    pub first_side_wins: u32,
    /// Mean turn count over finished games.
    pub average_turns: f64,
}

impl BatchSummary {
    /// Aggregate individual results.
    #[must_use]
    pub fn from_games(games: &[MatchSummary]) -> Self {
        let mut summary = Self {
            games: u32::try_from(games.len()).unwrap_or(u32::MAX),
            ..Self::default()
        };
        let mut finished_turns = 0u64;
        let mut finished = 0u32;

        for game in games {
            match game.outcome {
                Some(MatchOutcome::Winner(side)) => {
                    summary.wins[side.index()] += 1;
                    if side == game.first_side {
                        summary.first_side_wins += 1;
                    }
                }
                Some(MatchOutcome::Draw) => summary.draws += 1,
                None => summary.unfinished += 1,
            }
            if game.outcome.is_some() {
                finished += 1;
                finished_turns += u64::from(game.turns);
            }
        }

        if finished > 0 {
            summary.average_turns = finished_turns as f64 / f64::from(finished);
        }
        summary
    }

    /// Fraction of decided games won by `side`.
    #[must_use]
    pub fn win_rate(&self, side: SideId) -> f64 {
        let decided = self.wins[0] + self.wins[1] + self.draws;
        if decided == 0 {
            return 0.0;
        }
        f64::from(self.wins[side.index()]) / f64::from(decided)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game results
    pub games: Vec<MatchSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        difficulty = ?config.base.difficulty,
        "Starting batch run"
    );

    let play = |config: &BatchConfig| -> Vec<Result<MatchSummary, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let match_config = config.base.clone().with_seed(seed);
                simulate_match(match_config, config.max_turns).map_err(|e| {
                    warn!(game = i, seed, error = %e, "Game failed");
                    BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    }
                })
            })
            .collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(|| play(&config)),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using global pool");
                play(&config)
            }
        }
    } else {
        play(&config)
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<MatchSummary> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        errors = errors.len(),
        duration_secs = format!("{duration_seconds:.2}"),
        "Batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed multiple times.
///
/// Returns false if any run diverges or fails to start.
pub fn verify_determinism(config: &MatchConfig, runs: u32, max_turns: u32) -> bool {
    let results: Vec<Result<MatchSummary, GameError>> = (0..runs)
        .map(|_| simulate_match(config.clone(), max_turns))
        .collect();

    let mut hashes = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(summary) => hashes.push((summary.final_state_hash, summary.outcome, summary.turns)),
            Err(e) => {
                warn!(error = %e, "Verification run failed");
                return false;
            }
        }
    }

    hashes.windows(2).all(|w| w[0] == w[1])
}
