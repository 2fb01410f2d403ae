//! Game runner - executes single games under referee rules
//!
//! Level 3 - Step-level implementation

use std::time::{Duration, Instant};

use infexion_core::error::Result;
use infexion_core::{apply_action, Action, Agent, AgentKind, Board, GameResult, Player, TurnBudget};
use serde::Serialize;

use crate::config::MatchConfig;

/// How a game came to an end
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Ended by the game rules
    Finished,
    /// The player returned an action the rules reject
    IllegalAction(Player),
    /// The player failed to produce an action
    AgentError(Player),
    /// The player used up its thinking time
    TimeExceeded(Player),
}

impl Termination {
    /// Player that forfeited the game, if any
    pub fn forfeited_by(self) -> Option<Player> {
        match self {
            Termination::Finished => None,
            Termination::IllegalAction(p) | Termination::AgentError(p) | Termination::TimeExceeded(p) => Some(p),
        }
    }
}

/// Outcome of a single game
#[derive(Clone, Debug, Serialize)]
pub struct GameOutcome {
    /// Final game result
    pub result: GameResult,
    pub termination: Termination,
    /// Number of actions played
    pub turns: u16,
    /// Action history
    pub actions: Vec<Action>,
    /// Total power per player at the end, indexed by `Player::index`
    pub final_power: [u32; 2],
    /// Thinking time used per player
    pub time_used: [Duration; 2],
}

impl GameOutcome {
    pub fn red_wins(&self) -> bool {
        self.result == GameResult::RedWins
    }

    pub fn blue_wins(&self) -> bool {
        self.result == GameResult::BlueWins
    }

    pub fn is_draw(&self) -> bool {
        self.result == GameResult::Draw
    }

    /// Get winner (None for draw)
    pub fn winner(&self) -> Option<Player> {
        self.result.winner()
    }
}

/// Game runner that plays agents against each other
pub struct GameRunner {
    config: MatchConfig,
    /// Random seed counter
    seed_counter: u64,
}

impl GameRunner {
    pub fn new(config: MatchConfig) -> Self {
        let seed_counter = config.base_seed();
        Self {
            config,
            seed_counter,
        }
    }

    /// Build both agents and play a game from an empty board
    pub fn play_game(&mut self, red: AgentKind, blue: AgentKind) -> Result<GameOutcome> {
        let red_seed = self.next_seed();
        let mut red_agent = red.build(&self.config.engine, red_seed)?;
        let blue_seed = self.next_seed();
        let mut blue_agent = blue.build(&self.config.engine, blue_seed)?;
        Ok(self.play_agents(red_agent.as_mut(), blue_agent.as_mut()))
    }

    /// Alternate the agents until the game ends or one of them forfeits
    pub fn play_agents(&self, red: &mut dyn Agent, blue: &mut dyn Agent) -> GameOutcome {
        let mut board = Board::new(self.config.engine.rules());
        let mut actions = Vec::new();
        let mut time_used = [Duration::ZERO; 2];

        let termination = loop {
            if board.is_terminal() {
                break Termination::Finished;
            }

            let side = board.side_to_move();
            let agent: &mut dyn Agent = match side {
                Player::Red => &mut *red,
                Player::Blue => &mut *blue,
            };
            let remaining = self.config.time_limit.saturating_sub(time_used[side.index()]);
            let budget = TurnBudget::new(remaining, self.config.space_limit);

            let start = Instant::now();
            let chosen = agent.choose_action(&board, budget);
            time_used[side.index()] += start.elapsed();

            if time_used[side.index()] > self.config.time_limit {
                tracing::warn!(%side, agent = agent.name(), "time limit exceeded");
                break Termination::TimeExceeded(side);
            }
            let action = match chosen {
                Ok(action) => action,
                Err(err) => {
                    tracing::warn!(%side, agent = agent.name(), %err, "agent failed to move");
                    break Termination::AgentError(side);
                }
            };
            board = match apply_action(&board, action) {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(%side, agent = agent.name(), %err, "illegal action");
                    break Termination::IllegalAction(side);
                }
            };
            tracing::trace!(%side, %action, turn = board.turn_count(), "action played");
            actions.push(action);
        };

        let result = match termination.forfeited_by() {
            Some(loser) => GameResult::won_by(loser.opponent()),
            None => board.result(),
        };
        let (final_power, _) = board.power_and_count();
        tracing::info!(
            red = red.name(),
            blue = blue.name(),
            ?result,
            ?termination,
            turns = board.turn_count(),
            "game finished"
        );

        GameOutcome {
            result,
            termination,
            turns: board.turn_count(),
            actions,
            final_power,
            time_used,
        }
    }

    /// Get next seed and increment counter
    fn next_seed(&mut self) -> u64 {
        let seed = self.seed_counter;
        self.seed_counter = self.seed_counter.wrapping_add(1);
        seed
    }

    /// Reset seed counter
    pub fn reset_seed(&mut self, seed: u64) {
        self.seed_counter = seed;
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infexion_core::{EngineError, Hex, HexDir};

    /// Always plays the same spread, which is illegal on an empty board
    struct BadAgent;

    impl Agent for BadAgent {
        fn name(&self) -> &str {
            "bad"
        }

        fn choose_action(&mut self, _board: &Board, _budget: TurnBudget) -> Result<Action> {
            Ok(Action::Spread { cell: Hex::new(0, 0), dir: HexDir::Up })
        }
    }

    /// Never produces an action
    struct StuckAgent;

    impl Agent for StuckAgent {
        fn name(&self) -> &str {
            "stuck"
        }

        fn choose_action(&mut self, board: &Board, _budget: TurnBudget) -> Result<Action> {
            Err(EngineError::NoLegalMove(board.side_to_move()))
        }
    }

    #[test]
    fn test_random_game_terminates() {
        let mut runner = GameRunner::new(MatchConfig::default().with_seed(7));
        let outcome = runner.play_game(AgentKind::Random, AgentKind::Random).unwrap();

        assert_eq!(outcome.termination, Termination::Finished);
        assert!(outcome.result.is_over());
        assert_eq!(outcome.actions.len(), outcome.turns as usize);
        assert!(outcome.turns <= 343);
    }

    #[test]
    fn test_result_matches_final_power() {
        let mut runner = GameRunner::new(MatchConfig::default().with_seed(11));
        let outcome = runner.play_game(AgentKind::Greedy, AgentKind::Random).unwrap();

        let [red, blue] = outcome.final_power;
        match outcome.result {
            GameResult::RedWins => assert!(red >= blue + 2),
            GameResult::BlueWins => assert!(blue >= red + 2),
            GameResult::Draw => assert!(red.abs_diff(blue) < 2),
            GameResult::Ongoing => panic!("finished game reported as ongoing"),
        }
    }

    #[test]
    fn test_illegal_action_loses() {
        let runner = GameRunner::new(MatchConfig::default());
        let outcome = runner.play_agents(&mut BadAgent, &mut StuckAgent);
        assert_eq!(outcome.termination, Termination::IllegalAction(Player::Red));
        assert_eq!(outcome.result, GameResult::BlueWins);
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn test_agent_error_loses() {
        let mut random = infexion_core::agent::RandomAgent::new(1);
        let runner = GameRunner::new(MatchConfig::default());
        let outcome = runner.play_agents(&mut random, &mut StuckAgent);
        assert_eq!(outcome.termination, Termination::AgentError(Player::Blue));
        assert_eq!(outcome.winner(), Some(Player::Red));
        assert_eq!(outcome.turns, 1);
    }

    #[test]
    fn test_game_outcome_winner() {
        let outcome = GameOutcome {
            result: GameResult::RedWins,
            termination: Termination::Finished,
            turns: 10,
            actions: vec![],
            final_power: [5, 1],
            time_used: [Duration::ZERO; 2],
        };
        assert_eq!(outcome.winner(), Some(Player::Red));
        assert!(outcome.red_wins());
        assert!(!outcome.blue_wins());
        assert!(!outcome.is_draw());
    }
}
