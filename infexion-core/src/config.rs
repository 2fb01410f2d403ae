//! Engine configuration: rules, search limits and evaluation weights

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::Rules;
use crate::error::{EngineError, Result};
use crate::eval::Heuristics;
use crate::hex::BOARD_N;
use crate::movegen::MovePolicy;

/// Deepest search the engine accepts
pub const MAX_SEARCH_DEPTH: u8 = 12;

/// Everything an engine needs to play, loadable from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Rules
    pub grid_size: u8,
    pub max_cell_power: u8,
    pub max_total_power: u16,
    pub max_turns: u16,
    pub win_power_diff: u16,

    // Search
    /// Iterative deepening stops at this depth
    pub max_depth: u8,
    /// Share of the remaining time spent on one move
    pub move_time_fraction: f64,
    /// Hard cap on the time spent on one move
    pub max_move_time_ms: u64,
    /// Below this much remaining time the search is limited to depth 2
    pub low_time_ms: u64,
    /// Below this much remaining time the search is limited to depth 1
    pub critical_time_ms: u64,
    /// Below this much remaining space the search is limited to depth 2
    pub low_space_bytes: u64,

    // Move generation
    pub prune_spawns: bool,
    pub prune_quiet_spreads: bool,
    /// Open with a spawn on the centre cell of an empty board
    pub centre_opening: bool,

    pub heuristics: Heuristics,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_rules(Rules::standard(BOARD_N))
    }
}

impl EngineConfig {
    /// Default search settings on top of the given rules
    pub fn for_rules(rules: Rules) -> Self {
        Self {
            grid_size: rules.grid_size,
            max_cell_power: rules.max_cell_power,
            max_total_power: rules.max_total_power,
            max_turns: rules.max_turns,
            win_power_diff: rules.win_power_diff,
            max_depth: 4,
            move_time_fraction: 0.05,
            max_move_time_ms: 18_000,
            low_time_ms: 10_000,
            critical_time_ms: 2_000,
            low_space_bytes: 16 * 1024 * 1024,
            prune_spawns: true,
            prune_quiet_spreads: true,
            centre_opening: true,
            heuristics: Heuristics::default(),
        }
    }

    /// Set search depth
    pub fn with_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set custom heuristics
    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn rules(&self) -> Rules {
        Rules {
            grid_size: self.grid_size,
            max_cell_power: self.max_cell_power,
            max_total_power: self.max_total_power,
            max_turns: self.max_turns,
            win_power_diff: self.win_power_diff,
        }
    }

    pub fn move_policy(&self) -> MovePolicy {
        MovePolicy {
            prune_spawns: self.prune_spawns,
            prune_quiet_spreads: self.prune_quiet_spreads,
        }
    }

    pub fn max_move_time(&self) -> Duration {
        Duration::from_millis(self.max_move_time_ms)
    }

    /// Reject out-of-range limits and weights
    pub fn validate(&self) -> Result<()> {
        if !(3..=15).contains(&self.grid_size) {
            return Err(EngineError::config(format!(
                "grid_size {} outside 3..=15",
                self.grid_size
            )));
        }
        if self.max_cell_power == 0 || self.max_cell_power >= self.grid_size {
            return Err(EngineError::config(format!(
                "max_cell_power {} must be in 1..{}",
                self.max_cell_power, self.grid_size
            )));
        }
        let cap = self.grid_size as u32 * self.grid_size as u32 * self.max_cell_power as u32;
        if self.max_total_power == 0 || self.max_total_power as u32 > cap {
            return Err(EngineError::config(format!(
                "max_total_power {} must be in 1..={}",
                self.max_total_power, cap
            )));
        }
        if self.max_turns < 2 {
            return Err(EngineError::config(format!("max_turns {} is below 2", self.max_turns)));
        }
        if self.max_depth == 0 || self.max_depth > MAX_SEARCH_DEPTH {
            return Err(EngineError::config(format!(
                "max_depth {} must be in 1..={}",
                self.max_depth, MAX_SEARCH_DEPTH
            )));
        }
        if self.heuristics.endgame_cluster_size == 0 {
            return Err(EngineError::config("endgame_cluster_size must be at least 1"));
        }
        if !(self.move_time_fraction > 0.0 && self.move_time_fraction <= 1.0) {
            return Err(EngineError::config(format!(
                "move_time_fraction {} must be in (0, 1]",
                self.move_time_fraction
            )));
        }
        if let Some((name, weight)) = self.heuristics.weights().into_iter().find(|&(_, w)| w < 0) {
            return Err(EngineError::config(format!("{} is negative ({})", name, weight)));
        }
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejects(edit: impl FnOnce(&mut EngineConfig)) -> bool {
        let mut config = EngineConfig::default();
        edit(&mut config);
        matches!(config.validate(), Err(EngineError::InvalidConfiguration(_)))
    }

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.rules(), Rules::standard(7));
    }

    #[test]
    fn test_validate_rejects_each_field() {
        assert!(rejects(|c| c.grid_size = 2));
        assert!(rejects(|c| c.grid_size = 16));
        assert!(rejects(|c| c.max_cell_power = 0));
        assert!(rejects(|c| c.max_cell_power = 7));
        assert!(rejects(|c| c.max_total_power = 0));
        assert!(rejects(|c| c.max_total_power = 7 * 7 * 6 + 1));
        assert!(rejects(|c| c.max_turns = 1));
        assert!(rejects(|c| c.max_depth = 0));
        assert!(rejects(|c| c.max_depth = 13));
        assert!(rejects(|c| c.heuristics.endgame_cluster_size = 0));
        assert!(rejects(|c| c.move_time_fraction = 0.0));
        assert!(rejects(|c| c.move_time_fraction = 1.5));
        assert!(rejects(|c| c.move_time_fraction = f64::NAN));
        assert!(rejects(|c| c.heuristics.dominance_weight = -1));
        assert!(!rejects(|c| c.move_time_fraction = 1.0));
    }

    #[test]
    fn test_builders_feed_validation() {
        let tuned = Heuristics {
            power_weight: 250,
            ..Heuristics::default()
        };
        let config = EngineConfig::default().with_depth(6).with_heuristics(tuned.clone());
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.heuristics, tuned);
        config.validate().unwrap();

        let negative = Heuristics {
            cluster_count_weight: -5,
            ..Heuristics::default()
        };
        let err = EngineConfig::default().with_heuristics(negative).validate().unwrap_err();
        assert!(err.to_string().contains("cluster_count_weight"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_depth": 3, "heuristics": {"power_weight": 200}}"#).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.heuristics.power_weight, 200);
        assert_eq!(config.heuristics.piece_weight, Heuristics::default().piece_weight);
        assert_eq!(config.grid_size, 7);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("infexion-config-{}.json", std::process::id()));
        let config = EngineConfig::default().with_depth(3);
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let path = std::env::temp_dir().join(format!("infexion-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_depth": 40}"#).unwrap();
        let err = EngineConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("max_depth"));
    }
}
