//! Headless tactics match runner.
//!
//! This binary runs matches without graphics, controlled via JSON on
//! stdin/stdout. Designed for agents, balance runs, and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - play the human side from stdin
//! cargo run -p tactics_headless -- play --seed 42
//!
//! # Watch one AI-vs-AI match
//! cargo run -p tactics_headless -- simulate --seed 42 --show-log
//!
//! # Batch of AI-vs-AI matches
//! cargo run -p tactics_headless -- batch --count 1000 --output results/batch.json
//!
//! # Determinism check
//! cargo run -p tactics_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Every subcommand accepts `--config match.ron`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_core::config::{Difficulty, MatchConfig};
use tactics_headless::{
    batch::{run_batch, simulate_match, verify_determinism, BatchConfig, DEFAULT_MAX_TURNS},
    runner::{HeadlessConfig, HeadlessRunner},
    settings::resolve_config,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless grid tactics runner for agents and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Match config file (RON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the automated difficulty
    #[arg(long, global = true, value_enum)]
    difficulty: Option<DifficultyArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Hard => Self::Hard,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play the human side over JSON lines
    Play {
        /// Match seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every accepted command
        #[arg(long)]
        auto_state: bool,
    },

    /// Run one AI-vs-AI match and print its summary
    Simulate {
        /// Match seed
        #[arg(long)]
        seed: Option<u64>,

        /// Turn limit
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,

        /// Print the move log to stderr
        #[arg(long)]
        show_log: bool,
    },

    /// Run a batch of AI-vs-AI matches
    Batch {
        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Turn limit per game
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,

        /// Write full results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Turn limit per run
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let command = cli.command.unwrap_or(Commands::Play {
        seed: None,
        auto_state: false,
    });
    let seed = match &command {
        Commands::Play { seed, .. } | Commands::Simulate { seed, .. } => *seed,
        Commands::Batch { seed, .. } | Commands::Verify { seed, .. } => Some(*seed),
    };

    let mut config = match resolve_config(cli.config.as_deref(), seed) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty.into();
    }

    match command {
        Commands::Play { auto_state, .. } => cmd_play(config, auto_state),
        Commands::Simulate {
            max_turns,
            show_log,
            ..
        } => cmd_simulate(config, max_turns, show_log),
        Commands::Batch {
            count,
            seed,
            parallel,
            max_turns,
            output,
        } => cmd_batch(config, count, seed, parallel, max_turns, output),
        Commands::Verify {
            runs, max_turns, ..
        } => cmd_verify(&config, runs, max_turns),
    }
}

/// Run an interactive session
fn cmd_play(config: MatchConfig, auto_state: bool) {
    tracing::info!(seed = config.seed, "Starting interactive session");

    let mut runner = match HeadlessRunner::new(HeadlessConfig {
        match_config: config,
        auto_state_output: auto_state,
    }) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("FATAL: Cannot start match: {e}");
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = runner.run(stdin.lock(), stdout.lock()) {
        tracing::error!(error = %e, "Session IO failed");
        std::process::exit(1);
    }
}

/// Run one automated match
fn cmd_simulate(config: MatchConfig, max_turns: u32, show_log: bool) {
    let summary = match simulate_match(config, max_turns) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("FATAL: Cannot start match: {e}");
            std::process::exit(1);
        }
    };

    if show_log {
        for entry in &summary.log {
            eprintln!("{entry}");
        }
    }

    match summary.outcome {
        Some(outcome) => tracing::info!(?outcome, turns = summary.turns, "Match finished"),
        None => tracing::warn!(turns = summary.turns, "Turn limit reached"),
    }

    match serde_json::to_string(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("FATAL: Failed to serialize summary: {e}");
            std::process::exit(1);
        }
    }
}

/// Run batch of games
fn cmd_batch(
    base: MatchConfig,
    count: u32,
    seed: u64,
    parallel: u32,
    max_turns: u32,
    output: Option<PathBuf>,
) {
    let config = BatchConfig {
        base,
        game_count: count,
        parallel_games: parallel,
        seed_start: seed,
        max_turns,
    };

    let results = run_batch(config);

    if let Some(path) = output {
        if let Err(e) = results.save(&path) {
            tracing::error!(error = %e, path = %path.display(), "Failed to save results");
            eprintln!("FATAL: Failed to save results: {e}");
            std::process::exit(1);
        }
        tracing::info!(path = %path.display(), "Results saved");
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", summary.games);
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    eprintln!(
        "Human slot wins: {} ({:.1}%)",
        summary.wins[0],
        summary.win_rate(tactics_core::unit::SideId::Human) * 100.0
    );
    eprintln!(
        "AI slot wins:    {} ({:.1}%)",
        summary.wins[1],
        summary.win_rate(tactics_core::unit::SideId::Ai) * 100.0
    );
    eprintln!("Draws:           {}", summary.draws);
    eprintln!("Unfinished:      {}", summary.unfinished);
    eprintln!("First-mover wins: {}", summary.first_side_wins);
    eprintln!("Average turns:   {:.1}", summary.average_turns);
    eprintln!("Duration:        {:.2}s", results.duration_seconds);
}

/// Verify determinism
fn cmd_verify(config: &MatchConfig, runs: u32, max_turns: u32) {
    tracing::info!(
        "Verifying determinism: seed {} ({} runs)",
        config.seed,
        runs
    );

    if verify_determinism(config, runs, max_turns) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}
