//! Legal move generation with redundant-spawn pruning

use crate::board::{Action, Board, Player};
use crate::hex::{Hex, HexDir};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Up to this much total power the board is still in its opening: quiet
/// spreads are kept, and the overwhelmed fallback needs at least this much.
pub const MIN_TOTAL_POWER: u32 = 10;

/// Which reductions `legal_moves` applies on top of the full move list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePolicy {
    /// Keep one spawn per equivalence class of isolated empty cells
    pub prune_spawns: bool,
    /// Past the opening, drop power-1 spreads that do not land on an enemy cell
    pub prune_quiet_spreads: bool,
}

impl MovePolicy {
    /// No pruning at all
    pub const FULL: MovePolicy = MovePolicy {
        prune_spawns: false,
        prune_quiet_spreads: false,
    };
}

impl Default for MovePolicy {
    fn default() -> Self {
        Self {
            prune_spawns: true,
            prune_quiet_spreads: true,
        }
    }
}

// ============================================================================
// GENERATION
// ============================================================================

/// Every legal action of `side`: spawns first (row-major), then spreads
/// (row-major source, `HexDir::ALL` order).
///
/// Terminal positions are not special-cased; callers check `Board::is_terminal`.
pub fn all_moves(board: &Board, side: Player) -> Vec<Action> {
    let mut moves = spawn_moves(board);
    moves.extend(spread_moves(board, side));
    moves
}

fn spawn_moves(board: &Board) -> Vec<Action> {
    if !board.can_spawn() {
        return Vec::new();
    }
    Hex::all(board.grid_size())
        .filter(|&hex| !board.is_occupied(hex))
        .map(|cell| Action::Spawn { cell })
        .collect()
}

fn spread_moves(board: &Board, side: Player) -> impl Iterator<Item = Action> + '_ {
    board
        .cells_of(side)
        .flat_map(|(cell, _)| HexDir::ALL.into_iter().map(move |dir| Action::Spread { cell, dir }))
}

/// Candidate actions of `side` after the reductions enabled in `policy`.
///
/// Empty only when `side` owns no stack and cannot spawn anywhere.
pub fn legal_moves(board: &Board, side: Player, policy: MovePolicy) -> Vec<Action> {
    let mut spawns = spawn_moves(board);
    if policy.prune_spawns {
        spawns = prune_spawns(board, side, spawns);
    }

    let spreads: Vec<Action> = spread_moves(board, side).collect();
    let reduce = policy.prune_quiet_spreads
        && board.total_power() > MIN_TOTAL_POWER
        && !is_overwhelmed(board, side);
    let spreads = if reduce {
        let loud: Vec<Action> = spreads
            .iter()
            .copied()
            .filter(|&action| !is_quiet_spread(board, side, action))
            .collect();
        if loud.is_empty() && spawns.is_empty() {
            spreads
        } else {
            loud
        }
    } else {
        spreads
    };

    spawns.extend(spreads);
    spawns
}

// ============================================================================
// REDUCTIONS
// ============================================================================

/// Keep spawns that touch a friendly cell or sit in enemy spread range; of the
/// remaining isolated spawns keep the first per (own distance, enemy distance).
fn prune_spawns(board: &Board, side: Player, spawns: Vec<Action>) -> Vec<Action> {
    let n = board.grid_size();
    let own: Vec<Hex> = board.cells_of(side).map(|(hex, _)| hex).collect();
    let enemy: Vec<Hex> = board.cells_of(side.opponent()).map(|(hex, _)| hex).collect();
    let nearest = |cells: &[Hex], hex: Hex| cells.iter().map(|&c| hex.distance_to(c, n)).min();

    let mut seen = FxHashSet::default();
    spawns
        .into_iter()
        .filter(|action| {
            let cell = action.cell();
            let touches_own = cell.neighbors(n).any(|adj| board.get(adj).is_owned_by(side));
            if touches_own || board.threatened_by(cell, side.opponent()) {
                return true;
            }
            seen.insert((nearest(&own, cell), nearest(&enemy, cell)))
        })
        .collect()
}

/// A power-1 spread onto a cell the enemy does not hold
fn is_quiet_spread(board: &Board, side: Player, action: Action) -> bool {
    match action {
        Action::Spread { cell, dir } => {
            let source = board.get(cell);
            let target = board.get(cell.neighbor(dir, board.grid_size()));
            source.power == 1 && !target.is_owned_by(side.opponent())
        }
        Action::Spawn { .. } => false,
    }
}

/// The mover is far behind on a board past its opening and needs every option
pub fn is_overwhelmed(board: &Board, side: Player) -> bool {
    let own = board.power_of(side);
    let opp = board.power_of(side.opponent());
    own <= opp / 3 && board.total_power() >= MIN_TOTAL_POWER
}

// ============================================================================
// TESTS
// ============================================================================
