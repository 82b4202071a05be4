//! Determinism testing utilities.
//!
//! Every random draw in a match comes from one seeded ChaCha RNG, so the same
//! configuration and the same requests must always produce the same state.
//! Sources of non-determinism this harness guards against:
//!
//! - **Unseeded randomness**: any `thread_rng` or OS entropy in rules code.
//! - **HashMap iteration order**: decisions must iterate in unit-id or
//!   coordinate order, never hash order.
//! - **Hidden state**: controller state that survives a restart.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tactics_core::config::MatchConfig;
use tactics_core::turn::Match;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// All unique hashes (one for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert every run matched, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario several times and compare final hashes.
///
/// # Arguments
///
/// * `runs` - Number of independent runs
/// * `steps` - Number of `step` calls per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Hashes the final state
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..steps {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play AI-vs-AI matches from `config` and compare their final hashes.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn verify_match_determinism(config: &MatchConfig, runs: usize, max_turns: u32) -> DeterminismResult {
    verify_determinism(
        runs,
        u64::from(max_turns),
        || Match::ai_vs_ai(config.clone()).expect("config must be valid"),
        |game| {
            game.tick();
        },
        Match::state_hash,
    )
}

/// Hash any hashable value.
#[must_use]
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_determinism_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            3,
            2,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |s| *s += 1,
            |s| *s,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1, "a")), compute_hash(&(1, "a")));
    }
}
