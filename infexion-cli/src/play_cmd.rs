//! Play command - one game between two agents

use anyhow::Result;
use clap::Args;

use infexion_core::{AgentKind, Board, Hex, Player};
use infexion_match::{GameOutcome, GameRunner, MatchConfig};

#[derive(Args)]
pub struct PlayArgs {
    /// Agent playing red (random/r, greedy/g, negamax/nm, negascout/ns)
    #[arg(long, default_value = "negascout")]
    pub red: AgentKind,

    /// Agent playing blue
    #[arg(long, default_value = "greedy")]
    pub blue: AgentKind,

    /// Output the game record as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlayArgs, config: MatchConfig) -> Result<()> {
    tracing::info!("Starting game: {} (red) vs {} (blue)", args.red, args.blue);

    let mut runner = GameRunner::new(config);
    let outcome = runner.play_game(args.red, args.blue)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_game(&outcome, runner.config())?;
    }
    Ok(())
}

/// Print each action, the final board and the result
fn print_game(outcome: &GameOutcome, config: &MatchConfig) -> Result<()> {
    let mut board = Board::new(config.engine.rules());
    for (turn, &action) in outcome.actions.iter().enumerate() {
        println!("{:>3} {:<4} {}", turn + 1, board.side_to_move(), action);
        board = board.apply(action)?;
    }

    println!();
    print_board(&board);
    println!();
    println!("Result:      {:?} ({:?})", outcome.result, outcome.termination);
    println!("Turns:       {}", outcome.turns);
    println!(
        "Power:       RED {} / BLUE {}",
        outcome.final_power[Player::Red.index()],
        outcome.final_power[Player::Blue.index()]
    );
    println!(
        "Time used:   RED {:.2}s / BLUE {:.2}s",
        outcome.time_used[Player::Red.index()].as_secs_f64(),
        outcome.time_used[Player::Blue.index()].as_secs_f64()
    );
    Ok(())
}

/// Plain grid dump: `r3` is a red stack of power 3, `.` is empty
fn print_board(board: &Board) {
    let n = board.grid_size() as i8;
    for r in (0..n).rev() {
        let row: Vec<String> = (0..n)
            .map(|q| {
                let cell = board.get(Hex::new(r, q));
                match cell.owner {
                    Some(Player::Red) => format!("r{}", cell.power),
                    Some(Player::Blue) => format!("b{}", cell.power),
                    None => " .".to_string(),
                }
            })
            .collect();
        println!("{:>2} {}", r, row.join(" "));
    }
}
