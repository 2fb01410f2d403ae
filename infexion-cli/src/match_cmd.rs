//! Match command - play games between two agents
//!
//! ## Architecture
//!
//! - Level 1: run() - orchestration
//! - Level 2: infexion_match::play_match(), report_results()
//! - Level 4: formatting utilities

use anyhow::Result;
use clap::Args;

use infexion_core::AgentKind;
use infexion_match::{play_match, play_match_parallel, MatchConfig, MatchResult};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// First agent (random/r, greedy/g, negamax/nm, negascout/ns)
    #[arg(long, default_value = "negascout")]
    pub first: AgentKind,

    /// Second agent
    #[arg(long, default_value = "greedy")]
    pub second: AgentKind,

    /// Number of games to play (will alternate colors)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Run games in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
pub fn run(args: MatchArgs, mut config: MatchConfig) -> Result<()> {
    config.games = args.games;

    tracing::info!(
        "Starting match: {} vs {} ({} games, depth={})",
        args.first,
        args.second,
        args.games,
        config.engine.max_depth
    );

    let result = if args.parallel {
        play_match_parallel(args.first, args.second, &config)?
    } else {
        play_match(args.first, args.second, &config)?
    };

    report_results(&result, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn report_results(result: &MatchResult, args: &MatchArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print_text_results(result);
    }
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Print results as text
fn print_text_results(result: &MatchResult) {
    println!("\n=== Match Results ===");
    println!("Total games: {}", result.games_played);
    println!(
        "{:<11}  {} ({:.1}%)",
        format!("{} wins:", result.first),
        result.first_wins,
        100.0 * result.first_win_rate()
    );
    println!(
        "{:<11}  {} ({:.1}%)",
        format!("{} wins:", result.second),
        result.second_wins,
        100.0 * result.second_win_rate()
    );
    println!("Draws:       {} ({:.1}%)", result.draws, 100.0 * result.draw_rate());
    println!("Red wins:    {}", result.red_wins);
    println!("Avg length:  {:.1} turns", result.avg_turns);

    println!("\n=== Game Details ===");
    for (i, game) in result.game_outcomes.iter().enumerate() {
        let (red, blue) = if i % 2 == 0 {
            (result.first, result.second)
        } else {
            (result.second, result.first)
        };
        println!(
            "Game {:>3}: {} (red) vs {} (blue) -> {:?} in {} turns",
            i + 1,
            red,
            blue,
            game.result,
            game.turns
        );
    }
}
