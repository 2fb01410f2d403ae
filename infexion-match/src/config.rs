//! Configuration types for match play
//!
//! Level 4 - Utilities and configuration

use std::time::Duration;

use infexion_core::EngineConfig;

/// Referee-style limits and the engine settings shared by both agents
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Number of games (should be even for color alternation)
    pub games: usize,
    /// Total thinking time per agent per game
    pub time_limit: Duration,
    /// Memory each agent may use, passed through to the agents
    pub space_limit: Option<u64>,
    /// Settings for search agents, including the rules of the game
    pub engine: EngineConfig,
    /// Random seed for reproducibility (None = 42)
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: 2,
            time_limit: Duration::from_secs(180),
            space_limit: Some(250 * 1024 * 1024),
            engine: EngineConfig::default(),
            seed: None,
        }
    }
}

impl MatchConfig {
    /// Create config for a number of games
    pub fn games(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    /// Set engine configuration
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Set per-agent time limit
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Set per-agent space limit
    pub fn with_space_limit(mut self, space_limit: Option<u64>) -> Self {
        self.space_limit = space_limit;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn base_seed(&self) -> u64 {
        self.seed.unwrap_or(42)
    }
}
