//! Position evaluation

use std::cmp::Ordering;

use crate::board::{Board, GameResult, Player};
use crate::cluster::{dominance, ClusterMap};
use serde::{Deserialize, Serialize};

/// Score of a won position (effectively infinite, fixed-point)
pub const WIN_SCORE: i32 = 1_000_000;

/// Heuristic weights for position evaluation, in hundredths
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Per unit of total power difference
    pub power_weight: i32,
    /// Per occupied cell difference
    pub piece_weight: i32,
    /// Per cluster of difference in cluster count
    pub cluster_count_weight: i32,
    /// Per cell of size difference between adjacent opposing clusters
    pub cluster_size_weight: i32,
    /// Per unit of power difference between adjacent opposing clusters
    pub cluster_power_weight: i32,
    /// Bonus for dominating an adjacent opposing cluster
    pub dominance_weight: i32,
    /// Endgame mode starts once every opposing cluster is at most this large
    pub endgame_cluster_size: usize,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            power_weight: 170,
            piece_weight: 180,
            cluster_count_weight: 120,
            cluster_size_weight: 140,
            cluster_power_weight: 45,
            dominance_weight: 155,
            endgame_cluster_size: 2,
        }
    }
}

impl Heuristics {
    /// Weights by name, for validation and logging
    pub fn weights(&self) -> [(&'static str, i32); 6] {
        [
            ("power_weight", self.power_weight),
            ("piece_weight", self.piece_weight),
            ("cluster_count_weight", self.cluster_count_weight),
            ("cluster_size_weight", self.cluster_size_weight),
            ("cluster_power_weight", self.cluster_power_weight),
            ("dominance_weight", self.dominance_weight),
        ]
    }
}

/// Whether `side` faces only small opposing clusters
pub fn is_endgame(clusters: &ClusterMap, side: Player, heuristics: &Heuristics) -> bool {
    clusters.all_within(side.opponent(), heuristics.endgame_cluster_size)
}

/// Terminal score from the side to move's perspective, `None` while ongoing
fn terminal_score(board: &Board) -> Option<i32> {
    match board.result() {
        GameResult::Ongoing => None,
        GameResult::Draw => Some(0),
        result => {
            if result.winner() == Some(board.side_to_move()) {
                Some(WIN_SCORE)
            } else {
                Some(-WIN_SCORE)
            }
        }
    }
}

/// Evaluate position from the side to move's perspective
pub fn evaluate(board: &Board, heuristics: &Heuristics) -> i32 {
    if let Some(score) = terminal_score(board) {
        return score;
    }
    let clusters = ClusterMap::analyze(board);
    evaluate_with_clusters(board, &clusters, heuristics)
}

/// Evaluate an ongoing position whose clusters are already labelled
pub fn evaluate_with_clusters(board: &Board, clusters: &ClusterMap, heuristics: &Heuristics) -> i32 {
    let current = board.side_to_move();
    let score = material(board, current, heuristics);

    if is_endgame(clusters, current, heuristics) {
        return score;
    }
    score + cluster_count(clusters, current, heuristics) + cluster_balance(clusters, current, heuristics)
}

fn cluster_count(clusters: &ClusterMap, current: Player, heuristics: &Heuristics) -> i32 {
    let own = clusters.of(current).count() as i32;
    let opp = clusters.of(current.opponent()).count() as i32;
    heuristics.cluster_count_weight * (own - opp)
}

fn material(board: &Board, current: Player, heuristics: &Heuristics) -> i32 {
    let (power, count) = board.power_and_count();
    let (me, them) = (current.index(), current.opponent().index());

    let power_diff = power[me] as i32 - power[them] as i32;
    let count_diff = count[me] as i32 - count[them] as i32;
    heuristics.power_weight * power_diff + heuristics.piece_weight * count_diff
}

fn cluster_balance(clusters: &ClusterMap, current: Player, heuristics: &Heuristics) -> i32 {
    let mut score = 0;
    for (own, opp) in clusters.opposing_pairs(current) {
        let size_diff = own.size() as i32 - opp.size() as i32;
        let power_diff = own.total_power as i32 - opp.total_power as i32;
        let sign = match dominance(own, opp) {
            Ordering::Greater => 1,
            Ordering::Equal => 0,
            Ordering::Less => -1,
        };
        score += heuristics.cluster_size_weight * size_diff
            + heuristics.cluster_power_weight * power_diff
            + heuristics.dominance_weight * sign;
    }
    score
}

/// Evaluate with depth bonus for preferring faster wins
pub fn evaluate_with_depth(board: &Board, heuristics: &Heuristics, depth: i32) -> i32 {
    match terminal_score(board) {
        Some(0) => 0,
        Some(score) if score > 0 => score + depth,
        Some(score) => score - depth,
        None => evaluate(board, heuristics),
    }
}
