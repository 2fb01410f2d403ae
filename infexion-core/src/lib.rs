//! Infexion Core - Game rules and search engine
//!
//! This crate provides the core of an Infexion playing agent:
//! - Board geometry (wrapping hex rhombus with axial coordinates)
//! - Board state and the spawn/spread rules
//! - Cluster analysis and position evaluation
//! - Legal move generation with redundant-move pruning
//! - NegaScout and alpha-beta search under time and space budgets

pub mod hex;
pub mod board;
pub mod error;
pub mod cluster;
pub mod movegen;
pub mod eval;
pub mod config;
pub mod search;
pub mod agent;

// Re-exports for convenient access
pub use hex::{Hex, HexDir, BOARD_N};
pub use board::{Action, Board, Cell, GameResult, Player, Rules};
pub use error::EngineError;
pub use cluster::{clusters_of, dominance, Cluster, ClusterMap};
pub use movegen::{all_moves, legal_moves, MovePolicy};
pub use eval::{evaluate, Heuristics, WIN_SCORE};
pub use config::EngineConfig;
pub use search::{Algorithm, SearchEngine, SearchStats};
pub use agent::{apply_action, Agent, AgentKind, TurnBudget};
