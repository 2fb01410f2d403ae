//! Infexion Match - local referee and match play
//!
//! This crate plays agents against each other:
//! - Single games with referee-style time accounting
//! - Matches with alternating colors, sequential or parallel
//!
//! ## Architecture
//!
//! - Level 2: play_match, play_match_parallel (phases)
//! - Level 3: play_game (steps)
//! - Level 4: configuration

mod config;
mod game_runner;
mod match_play;

pub use config::MatchConfig;
pub use game_runner::{GameOutcome, GameRunner, Termination};
pub use match_play::{play_match, play_match_parallel, MatchResult};
