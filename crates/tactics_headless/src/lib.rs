//! Headless match runner for agents and CI verification.
//!
//! This crate drives `tactics_core` matches without any presentation layer:
//!
//! - **Agent play**: an external controller plays the human side over JSON
//!   lines on stdin/stdout while the automated side replies in-process
//! - **Simulation**: AI-vs-AI matches, singly or in parallel batches
//! - **Determinism verification**: the same seed must reproduce the same
//!   final state hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (place, move, attack, ...)
//! - **stdout**: Responses, events and state snapshots (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Play interactively
//! echo '{"cmd":"query"}' | cargo run -p tactics_headless -- play --seed 7
//!
//! # Simulate a batch of AI-vs-AI matches
//! cargo run -p tactics_headless -- batch --count 200 --output results/batch.json
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod settings;

pub use batch::{run_batch, simulate_match, BatchConfig, BatchResults, BatchSummary, MatchSummary};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use settings::{load_config, ConfigError};
