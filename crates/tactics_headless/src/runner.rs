//! Headless match runner implementation.
//!
//! The controller drives [`SideId::Human`]; the automated opponent replies
//! synchronously after every accepted command.

use std::io::{self, BufRead, Write};

use tactics_core::config::MatchConfig;
use tactics_core::error::GameError;
use tactics_core::grid::GridPos;
use tactics_core::turn::{Action, Match};
use tactics_core::unit::SideId;

use crate::protocol::{Command, Response, StateSnapshot};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Match parameters.
    pub match_config: MatchConfig,
    /// Output a state snapshot after every accepted command.
    pub auto_state_output: bool,
}

/// Headless runner for externally controlled play against the automated side.
#[derive(Debug)]
pub struct HeadlessRunner {
    game: Match,
    auto_state_output: bool,
    reported_game_over: bool,
    should_quit: bool,
}

impl HeadlessRunner {
    /// Create a runner with a freshly started human-vs-AI match.
    pub fn new(config: HeadlessConfig) -> Result<Self, GameError> {
        let game = Match::human_vs_ai(config.match_config)?;
        Ok(Self {
            game,
            auto_state_output: config.auto_state_output,
            reported_game_over: false,
            should_quit: false,
        })
    }

    /// The match being played.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// True once a `quit` command was handled.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Greeting plus whatever the automated side did if it moves first.
    pub fn start(&mut self) -> Vec<Response> {
        let mut responses = vec![Response::ready(&self.game)];
        self.advance(&mut responses);
        responses
    }

    /// Run the session loop until `quit` or end of input.
    ///
    /// Reads JSON commands from `input`, writes responses to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_responses(&mut output, &self.start())?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let responses = self.handle_line(line);
            write_responses(&mut output, &responses)?;
            if self.should_quit {
                break;
            }
        }

        tracing::info!(
            turn = self.game.turn_number(),
            outcome = ?self.game.outcome(),
            "Session ended"
        );
        Ok(())
    }

    /// Parse and handle one input line.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        match Command::from_json(line) {
            Ok(command) => self.handle(command),
            Err(e) => {
                tracing::warn!(error = %e, line, "Malformed command");
                vec![Response::error(format!("Invalid command: {e}"), None)]
            }
        }
    }

    /// Handle one command.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        let name = command.name();
        tracing::debug!(cmd = name, "Handling command");

        let action = match command {
            Command::Quit => {
                self.should_quit = true;
                return vec![Response::Bye];
            }
            Command::Query => return vec![self.state()],
            Command::Log => {
                return vec![Response::Log {
                    entries: self.game.log().entries().copied().collect(),
                }];
            }
            Command::Reachable { unit } => {
                return match self.game.reachable_cells(unit) {
                    Ok(cells) => vec![Response::Reachable {
                        unit,
                        cells: cells.into_iter().collect(),
                    }],
                    Err(reason) => vec![Response::rejected(name, reason)],
                };
            }
            Command::Place { archetype, x, y } => Action::PlaceUnit {
                archetype,
                pos: GridPos::new(x, y),
            },
            Command::Move { unit, x, y } => Action::Move {
                unit,
                to: GridPos::new(x, y),
            },
            Command::Attack { unit, target } => Action::Attack { unit, target },
            Command::EndTurn => Action::EndTurn,
        };

        match self.game.apply_action(SideId::Human, action) {
            Ok(()) => {
                let mut responses = vec![Response::ack(name)];
                self.advance(&mut responses);
                responses
            }
            Err(reason) => {
                tracing::debug!(cmd = name, %reason, "Command rejected");
                vec![Response::rejected(name, reason)]
            }
        }
    }

    fn state(&self) -> Response {
        Response::State(StateSnapshot::capture(&self.game))
    }

    /// Let the automated side reply, then report what happened.
    fn advance(&mut self, responses: &mut Vec<Response>) {
        let applied = self.game.tick();
        if applied > 0 {
            tracing::debug!(applied, "Automated side acted");
        }

        let events = self.game.drain_events();
        if !events.is_empty() {
            responses.push(Response::Events { events });
        }
        if self.auto_state_output {
            responses.push(self.state());
        }
        if let Some(outcome) = self.game.outcome() {
            if !self.reported_game_over {
                self.reported_game_over = true;
                tracing::info!(?outcome, turn = self.game.turn_number(), "Match over");
                responses.push(Response::GameOver {
                    outcome,
                    turn_number: self.game.turn_number(),
                });
            }
        }
    }
}

fn write_responses<W: Write>(output: &mut W, responses: &[Response]) -> io::Result<()> {
    for response in responses {
        output.write_all(response.to_json_line().as_bytes())?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::error::RejectReason;
    use tactics_core::unit::UnitId;

    fn runner(seed: u64) -> HeadlessRunner {
        let config = HeadlessConfig {
            match_config: MatchConfig::default().with_seed(seed),
            auto_state_output: false,
        };
        let mut runner = HeadlessRunner::new(config).unwrap();
        runner.start();
        runner
    }

    #[test]
    fn test_start_hands_turn_to_human() {
        let runner = runner(3);
        assert_eq!(runner.game().active_side(), SideId::Human);
    }

    #[test]
    fn test_quit_says_bye() {
        let mut runner = runner(1);
        assert_eq!(runner.handle(Command::Quit), vec![Response::Bye]);
        assert!(runner.should_quit());
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let mut runner = runner(2);
        let responses = runner.handle(Command::Move {
            unit: UnitId(99),
            x: 0,
            y: 0,
        });
        assert_eq!(
            responses,
            vec![Response::rejected("move", RejectReason::UnknownUnit(UnitId(99)))]
        );
    }

    #[test]
    fn test_malformed_line() {
        let mut runner = runner(4);
        let responses = runner.handle_line("{not json");
        assert!(matches!(responses.as_slice(), [Response::Error { .. }]));
    }
}
