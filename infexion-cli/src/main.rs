//! Infexion CLI - Command-line interface
//!
//! Commands:
//! - play: Play a single game and print each action
//! - match: Play a series of games between two agents

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use infexion_core::EngineConfig;
use infexion_match::MatchConfig;

mod match_cmd;
mod play_cmd;

#[derive(Parser)]
#[command(name = "infexion")]
#[command(about = "Infexion game-playing agent")]
struct Cli {
    /// Engine configuration JSON file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Thinking time per agent per game, in seconds
    #[arg(long, global = true, default_value = "180")]
    time: f64,

    /// Memory per agent, in megabytes (0 = unlimited)
    #[arg(long, global = true, default_value = "250")]
    space: u64,

    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(play_cmd::PlayArgs),
    /// Play a match between two agents
    Match(match_cmd::MatchArgs),
}

fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match_config(&cli)?;

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, config),
        Commands::Match(args) => match_cmd::run(args, config),
    }
}

/// Build the shared match configuration from global options
fn match_config(cli: &Cli) -> Result<MatchConfig> {
    let engine = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load engine config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let time_limit = Duration::try_from_secs_f64(cli.time)
        .with_context(|| format!("Invalid time limit: {}", cli.time))?;
    let space_limit = match cli.space {
        0 => None,
        mb => Some(space_bytes(mb).with_context(|| format!("Invalid space limit: {} MB", mb))?),
    };
    let seed = cli
        .seed
        .unwrap_or_else(|| ChaCha8Rng::from_entropy().gen());
    tracing::debug!(seed, "match seed");

    Ok(MatchConfig::default()
        .with_engine(engine)
        .with_time_limit(time_limit)
        .with_space_limit(space_limit)
        .with_seed(seed))
}

/// Megabytes to bytes, `None` on overflow
fn space_bytes(mb: u64) -> Option<u64> {
    mb.checked_mul(1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_space_limit_in_megabytes() {
        let config = match_config(&parse(&["infexion", "--space", "2", "--seed", "1", "play"])).unwrap();
        assert_eq!(config.space_limit, Some(2 * 1024 * 1024));

        let unlimited = match_config(&parse(&["infexion", "--space", "0", "--seed", "1", "play"])).unwrap();
        assert_eq!(unlimited.space_limit, None);
    }

    #[test]
    fn test_huge_space_limit_rejected() {
        let cli = parse(&["infexion", "--space", &u64::MAX.to_string(), "--seed", "1", "play"]);
        let err = match_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Invalid space limit"));
        assert_eq!(space_bytes(u64::MAX / 2), None);
    }
}
