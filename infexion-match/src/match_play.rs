//! Match play - multiple games between two agents
//!
//! Level 2 - Phase-level implementation

use infexion_core::error::Result;
use infexion_core::{AgentKind, GameResult};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::MatchConfig;
use crate::game_runner::{GameOutcome, GameRunner};

/// Result of a match (multiple games)
#[derive(Clone, Debug, Serialize)]
pub struct MatchResult {
    pub first: AgentKind,
    pub second: AgentKind,
    /// Wins for the first agent, either color
    pub first_wins: u32,
    /// Wins for the second agent, either color
    pub second_wins: u32,
    pub draws: u32,
    /// Games won by whoever played red
    pub red_wins: u32,
    /// Average game length in actions
    pub avg_turns: f32,
    pub games_played: u32,
    /// Individual game outcomes
    pub game_outcomes: Vec<GameOutcome>,
}

impl MatchResult {
    /// Create empty result
    pub fn empty(first: AgentKind, second: AgentKind) -> Self {
        Self {
            first,
            second,
            first_wins: 0,
            second_wins: 0,
            draws: 0,
            red_wins: 0,
            avg_turns: 0.0,
            games_played: 0,
            game_outcomes: Vec::new(),
        }
    }

    /// Get win rate for the first agent
    pub fn first_win_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.first_wins as f32 / self.games_played as f32
        }
    }

    /// Get win rate for the second agent
    pub fn second_win_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.second_wins as f32 / self.games_played as f32
        }
    }

    /// Get draw rate
    pub fn draw_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.draws as f32 / self.games_played as f32
        }
    }

    /// Wins = 1.0, Draws = 0.5, Losses = 0.0
    pub fn score_for_first(&self) -> f32 {
        self.first_wins as f32 + 0.5 * self.draws as f32
    }

    pub fn score_for_second(&self) -> f32 {
        self.second_wins as f32 + 0.5 * self.draws as f32
    }
}

/// Play a match between two agents (Level 2 phase)
///
/// Plays `config.games` games alternating colors, the first agent starting as red.
pub fn play_match(first: AgentKind, second: AgentKind, config: &MatchConfig) -> Result<MatchResult> {
    let games = prepare_games(config.games);
    let outcomes = games
        .iter()
        .map(|game| play_single_game(first, second, config, game))
        .collect::<Result<Vec<_>>>()?;
    Ok(aggregate_results(first, second, outcomes))
}

/// Play a match with parallel execution (Level 2 phase)
pub fn play_match_parallel(first: AgentKind, second: AgentKind, config: &MatchConfig) -> Result<MatchResult> {
    let games = prepare_games(config.games);
    let outcomes = games
        .par_iter()
        .map(|game| play_single_game(first, second, config, game))
        .collect::<Result<Vec<_>>>()?;
    Ok(aggregate_results(first, second, outcomes))
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Configuration for a single game in a match
#[derive(Clone, Copy)]
struct GameSlot {
    /// Whether the first agent plays red this game
    first_is_red: bool,
    /// Game index (for seeding)
    game_index: usize,
}

fn prepare_games(games: usize) -> Vec<GameSlot> {
    (0..games)
        .map(|i| GameSlot {
            first_is_red: i % 2 == 0, // Alternate colors
            game_index: i,
        })
        .collect()
}

/// Outcome with context about which agent played which color
struct OutcomeWithContext {
    outcome: GameOutcome,
    first_is_red: bool,
}

fn play_single_game(
    first: AgentKind,
    second: AgentKind,
    config: &MatchConfig,
    game: &GameSlot,
) -> Result<OutcomeWithContext> {
    let mut runner = GameRunner::new(config.clone());
    // Two seeds per game, one for each agent
    runner.reset_seed(config.base_seed().wrapping_add(2 * game.game_index as u64));

    let (red, blue) = if game.first_is_red { (first, second) } else { (second, first) };
    let outcome = runner.play_game(red, blue)?;

    Ok(OutcomeWithContext {
        outcome,
        first_is_red: game.first_is_red,
    })
}

/// Aggregate game outcomes into a match result
fn aggregate_results(first: AgentKind, second: AgentKind, outcomes: Vec<OutcomeWithContext>) -> MatchResult {
    let mut result = MatchResult::empty(first, second);
    let mut total_turns = 0u32;

    for owc in outcomes {
        total_turns += owc.outcome.turns as u32;

        // Attribute wins based on who was playing which color
        match owc.outcome.result {
            GameResult::RedWins => {
                result.red_wins += 1;
                if owc.first_is_red {
                    result.first_wins += 1;
                } else {
                    result.second_wins += 1;
                }
            }
            GameResult::BlueWins => {
                if owc.first_is_red {
                    result.second_wins += 1;
                } else {
                    result.first_wins += 1;
                }
            }
            GameResult::Draw | GameResult::Ongoing => result.draws += 1,
        }
        result.game_outcomes.push(owc.outcome);
    }

    result.games_played = result.game_outcomes.len() as u32;
    if result.games_played > 0 {
        result.avg_turns = total_turns as f32 / result.games_played as f32;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_runner::Termination;
    use infexion_core::{Action, Hex};
    use std::time::Duration;

    fn outcome(result: GameResult, turns: u16) -> GameOutcome {
        GameOutcome {
            result,
            termination: Termination::Finished,
            turns,
            actions: vec![Action::Spawn { cell: Hex::new(3, 3) }],
            final_power: [0, 0],
            time_used: [Duration::ZERO; 2],
        }
    }

    #[test]
    fn test_aggregate_attributes_colors() {
        let outcomes = vec![
            OutcomeWithContext { outcome: outcome(GameResult::RedWins, 10), first_is_red: true },
            OutcomeWithContext { outcome: outcome(GameResult::RedWins, 20), first_is_red: false },
            OutcomeWithContext { outcome: outcome(GameResult::BlueWins, 30), first_is_red: false },
            OutcomeWithContext { outcome: outcome(GameResult::Draw, 40), first_is_red: true },
        ];
        let result = aggregate_results(AgentKind::NegaScout, AgentKind::Random, outcomes);

        assert_eq!(result.first_wins, 2);
        assert_eq!(result.second_wins, 1);
        assert_eq!(result.draws, 1);
        assert_eq!(result.red_wins, 2);
        assert_eq!(result.games_played, 4);
        assert!((result.avg_turns - 25.0).abs() < 1e-6);
        assert!((result.score_for_first() - 2.5).abs() < 1e-6);
        assert!((result.first_win_rate() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_match() {
        let result = play_match(AgentKind::Random, AgentKind::Greedy, &MatchConfig::games(0)).unwrap();
        assert_eq!(result.games_played, 0);
        assert_eq!(result.draw_rate(), 0.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = MatchConfig::games(4).with_seed(5);
        let seq = play_match(AgentKind::Random, AgentKind::Greedy, &config).unwrap();
        let par = play_match_parallel(AgentKind::Random, AgentKind::Greedy, &config).unwrap();

        assert_eq!(seq.games_played, 4);
        assert_eq!(seq.first_wins, par.first_wins);
        assert_eq!(seq.second_wins, par.second_wins);
        assert_eq!(seq.draws, par.draws);
        for (a, b) in seq.game_outcomes.iter().zip(&par.game_outcomes) {
            assert_eq!(a.actions, b.actions);
        }
        assert_eq!(seq.first_wins + seq.second_wins + seq.draws, 4);
    }
}
