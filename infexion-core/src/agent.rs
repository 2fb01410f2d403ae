//! Agents: the playing side of the engine boundary

use std::str::FromStr;
use std::time::Duration;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Action, Board};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::movegen::all_moves;
use crate::search::{Algorithm, SearchEngine};

/// Budgets handed to an agent for one turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnBudget {
    /// Thinking time left for the rest of the game
    pub time_remaining: Duration,
    /// Memory left, if the referee limits it
    pub space_remaining: Option<u64>,
}

impl TurnBudget {
    pub fn new(time_remaining: Duration, space_remaining: Option<u64>) -> Self {
        Self {
            time_remaining,
            space_remaining,
        }
    }
}

/// A player that picks one action per turn
pub trait Agent: Send {
    fn name(&self) -> &str;

    fn choose_action(&mut self, board: &Board, budget: TurnBudget) -> Result<Action>;
}

/// Apply an action chosen by either side
pub fn apply_action(board: &Board, action: Action) -> Result<Board> {
    board.apply(action)
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Available agent implementations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Random,
    Greedy,
    Negamax,
    NegaScout,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Random,
        AgentKind::Greedy,
        AgentKind::Negamax,
        AgentKind::NegaScout,
    ];

    pub fn id(self) -> &'static str {
        match self {
            AgentKind::Random => "random",
            AgentKind::Greedy => "greedy",
            AgentKind::Negamax => "negamax",
            AgentKind::NegaScout => "negascout",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            AgentKind::Random => "r",
            AgentKind::Greedy => "g",
            AgentKind::Negamax => "nm",
            AgentKind::NegaScout => "ns",
        }
    }

    /// Construct the agent. Search agents validate `config`.
    pub fn build(self, config: &EngineConfig, seed: u64) -> Result<Box<dyn Agent>> {
        Ok(match self {
            AgentKind::Random => Box::new(RandomAgent::new(seed)),
            AgentKind::Greedy => Box::new(GreedyAgent::new(seed)),
            AgentKind::Negamax => Box::new(SearchAgent::new(config.clone(), Algorithm::AlphaBeta)?),
            AgentKind::NegaScout => Box::new(SearchAgent::new(config.clone(), Algorithm::NegaScout)?),
        })
    }
}

impl FromStr for AgentKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s || kind.abbreviation() == s)
            .ok_or_else(|| EngineError::config(format!("unknown agent '{}'", s)))
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ============================================================================
// AGENTS
// ============================================================================

fn playable_moves(board: &Board) -> Result<Vec<Action>> {
    let side = board.side_to_move();
    if board.is_terminal() {
        return Err(EngineError::NoLegalMove(side));
    }
    let moves = all_moves(board, side);
    if moves.is_empty() {
        return Err(EngineError::NoLegalMove(side));
    }
    Ok(moves)
}

/// Uniform choice over every legal action
pub struct RandomAgent {
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        AgentKind::Random.id()
    }

    fn choose_action(&mut self, board: &Board, _budget: TurnBudget) -> Result<Action> {
        let moves = playable_moves(board)?;
        Ok(moves[self.rng.gen_range(0..moves.len())])
    }
}

/// Takes the spread that costs the opponent the most power; otherwise spawns
/// at random, otherwise plays any random action
pub struct GreedyAgent {
    rng: ChaCha8Rng,
}

impl GreedyAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Agent for GreedyAgent {
    fn name(&self) -> &str {
        AgentKind::Greedy.id()
    }

    fn choose_action(&mut self, board: &Board, _budget: TurnBudget) -> Result<Action> {
        let moves = playable_moves(board)?;
        let opponent = board.side_to_move().opponent();

        let mut lowest = board.power_of(opponent);
        let mut greedy = None;
        for &action in moves.iter().filter(|m| !m.is_spawn()) {
            let power = board.apply(action)?.power_of(opponent);
            if power < lowest {
                lowest = power;
                greedy = Some(action);
            }
        }
        if let Some(action) = greedy {
            return Ok(action);
        }

        let spawns: Vec<Action> = moves.iter().copied().filter(Action::is_spawn).collect();
        let pool = if spawns.is_empty() { &moves } else { &spawns };
        Ok(pool[self.rng.gen_range(0..pool.len())])
    }
}

/// Tree search agent
pub struct SearchAgent {
    engine: SearchEngine,
}

impl SearchAgent {
    pub fn new(config: EngineConfig, algorithm: Algorithm) -> Result<Self> {
        Ok(Self {
            engine: SearchEngine::new(config, algorithm)?,
        })
    }
}

impl Agent for SearchAgent {
    fn name(&self) -> &str {
        match self.engine.algorithm() {
            Algorithm::AlphaBeta => AgentKind::Negamax.id(),
            Algorithm::NegaScout => AgentKind::NegaScout.id(),
        }
    }

    fn choose_action(&mut self, board: &Board, budget: TurnBudget) -> Result<Action> {
        self.engine
            .choose_action(board, budget.time_remaining, budget.space_remaining)
    }
}
