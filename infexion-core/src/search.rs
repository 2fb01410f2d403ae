//! NegaScout (principal variation search) with a time and space budget

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::board::{Action, Board, GameResult};
use crate::cluster::ClusterMap;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::eval::{evaluate, evaluate_with_depth, is_endgame, Heuristics, WIN_SCORE};
use crate::hex::Hex;
use crate::movegen::{all_moves, legal_moves};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Window bound, beyond any reachable score
const INF: i32 = WIN_SCORE * 2;

/// Depth the search falls back to when budgets run low
const LOW_BUDGET_DEPTH: u8 = 2;

// ============================================================================
// TYPES
// ============================================================================

/// Tree search flavour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Fail-soft negamax with alpha-beta pruning
    AlphaBeta,
    /// Alpha-beta with null-window scouting of non-PV moves
    NegaScout,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::AlphaBeta => write!(f, "alpha-beta"),
            Algorithm::NegaScout => write!(f, "negascout"),
        }
    }
}

/// Counters for the last `choose_action` call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub nodes: u64,
    /// Null-window probes that had to be searched again with the full window
    pub researches: u64,
    /// Deepest iteration that finished
    pub completed_depth: u8,
    /// Largest number of bytes held along one search path
    pub peak_bytes: usize,
    pub elapsed: Duration,
}

/// Limits checked before each node expansion
#[derive(Debug)]
struct Budget {
    deadline: Option<Instant>,
    space_limit: Option<usize>,
    node_limit: Option<u64>,
    nodes: u64,
    live_bytes: usize,
    peak_bytes: usize,
}

impl Budget {
    fn unlimited() -> Self {
        Self {
            deadline: None,
            space_limit: None,
            node_limit: None,
            nodes: 0,
            live_bytes: 0,
            peak_bytes: 0,
        }
    }

    /// Account for a node holding `bytes` on the current path
    fn enter(&mut self, bytes: usize) -> Result<()> {
        self.nodes += 1;
        self.live_bytes += bytes;
        self.peak_bytes = self.peak_bytes.max(self.live_bytes);

        let out_of_time = self.deadline.is_some_and(|d| Instant::now() >= d);
        let out_of_space = self.space_limit.is_some_and(|s| self.live_bytes > s);
        let out_of_nodes = self.node_limit.is_some_and(|n| self.nodes > n);
        if out_of_time || out_of_space || out_of_nodes {
            return Err(EngineError::BudgetExceeded);
        }
        Ok(())
    }

    fn leave(&mut self, bytes: usize) {
        self.live_bytes -= bytes;
    }
}

/// Outcome of one root iteration
enum RootSearch {
    Complete { action: Action, score: i32 },
    /// Budget ran out; carries the best move found if the first move finished
    Interrupted(Option<Action>),
}

// ============================================================================
// MOVE ORDERING
// ============================================================================

/// Ordering key: (enemy power captured, fewer enemy cells captured, stack power)
///
/// Spawns and non-capturing power-1 spreads share a key, so between them the
/// stable sort keeps generation order (spawns first).
fn order_key(board: &Board, action: &Action) -> (u32, Reverse<u32>, u8) {
    match *action {
        Action::Spawn { .. } => (0, Reverse(0), 1),
        Action::Spread { cell, dir } => {
            let mover = board.side_to_move();
            let power = board.get(cell).power;
            let mut captured_power = 0;
            let mut captured_cells = 0;
            for target in board.spread_targets(cell, dir, power) {
                let victim = board.get(target);
                if victim.is_owned_by(mover.opponent()) {
                    captured_power += victim.power as u32;
                    captured_cells += 1;
                }
            }
            (captured_power, Reverse(captured_cells), power)
        }
    }
}

/// Stable sort, best first
pub fn order_moves(board: &Board, moves: &mut [Action]) {
    moves.sort_by_cached_key(|action| Reverse(order_key(board, action)));
}

// ============================================================================
// ENDGAME GATING
// ============================================================================

/// In endgame mode a spread may only hit small clusters it outpowers
fn attack_allowed(board: &Board, clusters: &ClusterMap, action: Action, heuristics: &Heuristics) -> bool {
    let Action::Spread { cell, dir } = action else {
        return true;
    };
    let mover = board.side_to_move();
    let power = board.get(cell).power as usize;

    board.spread_targets(cell, dir, power as u8).all(|target| {
        if !board.get(target).is_owned_by(mover.opponent()) {
            return true;
        }
        clusters.cluster_at(target).map_or(true, |victim| {
            victim.size() <= heuristics.endgame_cluster_size && power > victim.size()
        })
    })
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

/// Game tree searcher behind the engine's `choose_action` contract
#[derive(Clone, Debug)]
pub struct SearchEngine {
    config: EngineConfig,
    algorithm: Algorithm,
    node_limit: Option<u64>,
    stats: SearchStats,
}

impl SearchEngine {
    /// Engine with a validated configuration
    pub fn new(config: EngineConfig, algorithm: Algorithm) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            algorithm,
            node_limit: None,
            stats: SearchStats::default(),
        })
    }

    /// Stop each search after this many nodes
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Statistics of the most recent search
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Depth limit for the remaining budgets
    pub fn depth_limit(&self, time_remaining: Duration, space_remaining: Option<u64>) -> u8 {
        let mut depth = self.config.max_depth;
        if time_remaining < Duration::from_millis(self.config.critical_time_ms) {
            depth = 1;
        } else if time_remaining < Duration::from_millis(self.config.low_time_ms) {
            depth = depth.min(LOW_BUDGET_DEPTH);
        }
        if space_remaining.is_some_and(|s| s < self.config.low_space_bytes) {
            depth = depth.min(LOW_BUDGET_DEPTH);
        }
        depth
    }

    /// Time allotted to one move
    pub fn move_time(&self, time_remaining: Duration) -> Duration {
        time_remaining
            .mul_f64(self.config.move_time_fraction)
            .min(self.config.max_move_time())
    }

    /// Pick an action for the side to move within the given budgets
    pub fn choose_action(
        &mut self,
        board: &Board,
        time_remaining: Duration,
        space_remaining: Option<u64>,
    ) -> Result<Action> {
        let start = Instant::now();
        let side = board.side_to_move();
        self.stats = SearchStats::default();

        if board.is_terminal() {
            return Err(EngineError::NoLegalMove(side));
        }
        let mut moves = self.candidates(board);
        if moves.is_empty() {
            return Err(EngineError::NoLegalMove(side));
        }

        if let Some(action) = self.opening(board) {
            tracing::debug!(%action, "centre opening");
            return Ok(action);
        }
        if let Some(action) = self.instant_win(board) {
            tracing::debug!(%action, "instant win");
            return Ok(action);
        }

        let depth_limit = self.depth_limit(time_remaining, space_remaining);
        let mut budget = Budget {
            deadline: Some(start + self.move_time(time_remaining)),
            space_limit: space_remaining.map(|s| s as usize),
            node_limit: self.node_limit,
            ..Budget::unlimited()
        };

        let mut best = moves[0];
        for depth in 1..=depth_limit {
            match self.search_root(board, &moves, depth, &mut budget) {
                RootSearch::Complete { action, score } => {
                    best = action;
                    self.stats.completed_depth = depth;
                    tracing::trace!(depth, %action, score, "iteration complete");
                    if score.abs() >= WIN_SCORE {
                        break;
                    }
                    // Principal move first in the next iteration
                    if let Some(pos) = moves.iter().position(|&m| m == action) {
                        moves[..=pos].rotate_right(1);
                    }
                }
                RootSearch::Interrupted(partial) => {
                    if let Some(action) = partial {
                        best = action;
                    }
                    tracing::warn!(
                        depth,
                        completed = self.stats.completed_depth,
                        %best,
                        "search budget exhausted, using fallback move"
                    );
                    break;
                }
            }
        }

        self.stats.nodes = budget.nodes;
        self.stats.peak_bytes = budget.peak_bytes;
        self.stats.elapsed = start.elapsed();
        tracing::debug!(
            algorithm = %self.algorithm,
            %side,
            action = %best,
            nodes = self.stats.nodes,
            researches = self.stats.researches,
            depth = self.stats.completed_depth,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "search finished"
        );
        Ok(best)
    }

    /// Fixed-depth search without time or space limits, returning the best
    /// action and its score
    pub fn search_depth(&mut self, board: &Board, depth: u8) -> Result<(Action, i32)> {
        let side = board.side_to_move();
        if board.is_terminal() {
            return Err(EngineError::NoLegalMove(side));
        }
        let moves = self.candidates(board);
        if moves.is_empty() {
            return Err(EngineError::NoLegalMove(side));
        }

        self.stats = SearchStats::default();
        let mut budget = Budget::unlimited();
        match self.search_root(board, &moves, depth.max(1), &mut budget) {
            RootSearch::Complete { action, score } => {
                self.stats.nodes = budget.nodes;
                self.stats.completed_depth = depth;
                Ok((action, score))
            }
            RootSearch::Interrupted(_) => Err(EngineError::BudgetExceeded),
        }
    }

    /// Centre spawn on an empty board
    fn opening(&self, board: &Board) -> Option<Action> {
        if !self.config.centre_opening || board.occupied_count() > 0 || !board.can_spawn() {
            return None;
        }
        let mid = (board.grid_size() / 2) as i8;
        Some(Action::Spawn {
            cell: Hex::new(mid, mid),
        })
    }

    /// Any action that ends the game in the mover's favour
    fn instant_win(&self, board: &Board) -> Option<Action> {
        let side = board.side_to_move();
        all_moves(board, side).into_iter().find(|&action| {
            board
                .apply(action)
                .is_ok_and(|child| child.result() == GameResult::won_by(side))
        })
    }

    /// Generated, gated and ordered moves of the side to move
    fn candidates(&self, board: &Board) -> Vec<Action> {
        let side = board.side_to_move();
        let heuristics = &self.config.heuristics;
        let mut moves = legal_moves(board, side, self.config.move_policy());

        let clusters = ClusterMap::analyze(board);
        if is_endgame(&clusters, side, heuristics) {
            let gated: Vec<Action> = moves
                .iter()
                .copied()
                .filter(|&action| attack_allowed(board, &clusters, action, heuristics))
                .collect();
            if !gated.is_empty() {
                moves = gated;
            }
        }

        order_moves(board, &mut moves);
        moves
    }

    fn child(board: &Board, action: Action) -> Option<Board> {
        match board.apply(action) {
            Ok(child) => Some(child),
            Err(err) => {
                debug_assert!(false, "generated action rejected: {}", err);
                tracing::error!(%err, "generated action rejected, skipping");
                None
            }
        }
    }

    fn search_root(&mut self, board: &Board, moves: &[Action], depth: u8, budget: &mut Budget) -> RootSearch {
        let depth = depth as i32;
        let mut alpha = -INF;
        let mut best: Option<(Action, i32)> = None;

        for &action in moves {
            let Some(child) = Self::child(board, action) else {
                continue;
            };

            let result = match (self.algorithm, best.is_some()) {
                (Algorithm::NegaScout, true) => self.scout(&child, depth - 1, alpha, INF, budget),
                (Algorithm::NegaScout, false) => self.negascout(&child, depth - 1, -INF, -alpha, budget).map(|s| -s),
                (Algorithm::AlphaBeta, _) => self.alpha_beta(&child, depth - 1, -INF, -alpha, budget).map(|s| -s),
            };
            let score = match result {
                Ok(score) => score,
                Err(_) => return RootSearch::Interrupted(best.map(|(action, _)| action)),
            };

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((action, score));
            }
            alpha = alpha.max(score);
        }

        match best {
            Some((action, score)) => RootSearch::Complete { action, score },
            None => RootSearch::Interrupted(None),
        }
    }

    /// Null-window probe of a non-PV child, re-searched when it lands inside
    /// `(alpha, beta)`. Returns the score from the parent's perspective.
    fn scout(&mut self, child: &Board, depth: i32, alpha: i32, beta: i32, budget: &mut Budget) -> Result<i32> {
        let probe = -self.negascout(child, depth, -alpha - 1, -alpha, budget)?;
        if probe > alpha && probe < beta {
            self.stats.researches += 1;
            return Ok(-self.negascout(child, depth, -beta, -alpha, budget)?);
        }
        Ok(probe)
    }

    /// Leaf score, or `None` when the node must be expanded
    fn leaf(&self, board: &Board, depth: i32) -> Option<i32> {
        if board.is_terminal() {
            return Some(evaluate_with_depth(board, &self.config.heuristics, depth));
        }
        if depth <= 0 {
            return Some(evaluate(board, &self.config.heuristics));
        }
        None
    }

    fn node_bytes(board: &Board, moves: &[Action]) -> usize {
        board.approx_bytes() + std::mem::size_of_val(moves)
    }

    fn negascout(&mut self, board: &Board, depth: i32, mut alpha: i32, beta: i32, budget: &mut Budget) -> Result<i32> {
        if let Some(score) = self.leaf(board, depth) {
            return Ok(score);
        }
        let moves = self.candidates(board);
        if moves.is_empty() {
            return Ok(evaluate(board, &self.config.heuristics));
        }

        let bytes = Self::node_bytes(board, &moves);
        budget.enter(bytes)?;

        let mut best = -INF;
        let mut first = true;
        for action in moves {
            let Some(child) = Self::child(board, action) else {
                continue;
            };

            let score = if first {
                first = false;
                -self.negascout(&child, depth - 1, -beta, -alpha, budget)?
            } else {
                self.scout(&child, depth - 1, alpha, beta, budget)?
            };

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        budget.leave(bytes);
        Ok(best)
    }

    fn alpha_beta(&mut self, board: &Board, depth: i32, mut alpha: i32, beta: i32, budget: &mut Budget) -> Result<i32> {
        if let Some(score) = self.leaf(board, depth) {
            return Ok(score);
        }
        let moves = self.candidates(board);
        if moves.is_empty() {
            return Ok(evaluate(board, &self.config.heuristics));
        }

        let bytes = Self::node_bytes(board, &moves);
        budget.enter(bytes)?;

        let mut best = -INF;
        for action in moves {
            let Some(child) = Self::child(board, action) else {
                continue;
            };

            let score = -self.alpha_beta(&child, depth - 1, -beta, -alpha, budget)?;
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        budget.leave(bytes);
        Ok(best)
    }
}

// ============================================================================
// TESTS
// ============================================================================
