//! Cluster analysis: connected regions of same-owner cells
//!
//! A cluster is a maximal set of cells of one owner connected through hex
//! adjacency (wrapping at the edges). Clusters are recomputed from the board
//! on demand and listed in discovery order: a row-major scan starts each
//! cluster at its first cell, and a breadth-first flood fill collects the rest.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::board::{Board, Player};
use crate::hex::Hex;
use rustc_hash::{FxHashMap, FxHashSet};

/// A connected region of cells owned by one player
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub owner: Player,
    /// Member cells in discovery order
    pub cells: Vec<Hex>,
    /// Sum of member powers
    pub total_power: u32,
}

impl Cluster {
    /// Number of cells
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.cells.contains(&hex)
    }
}

/// Dominance between two clusters: larger size wins, total power breaks ties
pub fn dominance(a: &Cluster, b: &Cluster) -> Ordering {
    a.size()
        .cmp(&b.size())
        .then_with(|| a.total_power.cmp(&b.total_power))
}

/// Clusters of one side in discovery order
pub fn clusters_of(board: &Board, side: Player) -> Vec<Cluster> {
    let mut labels = FxHashMap::default();
    let mut clusters = Vec::new();

    for (hex, cell) in board.occupied() {
        if cell.is_owned_by(side) && !labels.contains_key(&hex) {
            let id = clusters.len();
            clusters.push(flood_fill(board, hex, side, id, &mut labels));
        }
    }

    clusters
}

/// Collect the cluster containing `start` and label its cells with `id`
fn flood_fill(
    board: &Board,
    start: Hex,
    owner: Player,
    id: usize,
    labels: &mut FxHashMap<Hex, usize>,
) -> Cluster {
    let n = board.grid_size();
    let mut cells = Vec::new();
    let mut total_power = 0;
    let mut queue = VecDeque::from([start]);
    labels.insert(start, id);

    while let Some(hex) = queue.pop_front() {
        cells.push(hex);
        total_power += board.get(hex).power as u32;

        for next in hex.neighbors(n) {
            if board.get(next).is_owned_by(owner) && !labels.contains_key(&next) {
                labels.insert(next, id);
                queue.push_back(next);
            }
        }
    }

    Cluster {
        owner,
        cells,
        total_power,
    }
}

/// Clusters of both sides with cell labels and opposing adjacency
#[derive(Clone, Debug)]
pub struct ClusterMap {
    clusters: Vec<Cluster>,
    labels: FxHashMap<Hex, usize>,
    /// Adjacent opposing cluster pairs `(a, b)` with `a < b`, each listed once
    adjacent: Vec<(usize, usize)>,
}

impl ClusterMap {
    /// Label every occupied cell of the board
    pub fn analyze(board: &Board) -> Self {
        let n = board.grid_size();
        let mut labels = FxHashMap::default();
        let mut clusters = Vec::new();

        for (hex, cell) in board.occupied() {
            if let Some(owner) = cell.owner {
                if !labels.contains_key(&hex) {
                    let id = clusters.len();
                    clusters.push(flood_fill(board, hex, owner, id, &mut labels));
                }
            }
        }

        let mut pairs = FxHashSet::default();
        for (hex, &a) in &labels {
            for next in hex.neighbors(n) {
                if let Some(&b) = labels.get(&next) {
                    if a != b {
                        pairs.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
        let mut adjacent: Vec<_> = pairs.into_iter().collect();
        adjacent.sort_unstable();

        Self {
            clusters,
            labels,
            adjacent,
        }
    }

    /// All clusters in discovery order
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Clusters owned by `side`
    pub fn of(&self, side: Player) -> impl Iterator<Item = &Cluster> + '_ {
        self.clusters.iter().filter(move |c| c.owner == side)
    }

    /// Cluster containing `hex`, if occupied
    pub fn cluster_at(&self, hex: Hex) -> Option<&Cluster> {
        self.labels.get(&hex).map(|&id| &self.clusters[id])
    }

    /// Cluster id of `hex`, if occupied
    pub fn label_at(&self, hex: Hex) -> Option<usize> {
        self.labels.get(&hex).copied()
    }

    /// Adjacent opposing pairs as `(side's cluster, opposing cluster)`
    pub fn opposing_pairs(&self, side: Player) -> impl Iterator<Item = (&Cluster, &Cluster)> + '_ {
        self.adjacent.iter().map(move |&(a, b)| {
            let (a, b) = (&self.clusters[a], &self.clusters[b]);
            if a.owner == side {
                (a, b)
            } else {
                (b, a)
            }
        })
    }

    /// Whether every cluster of `side` has at most `max_size` cells
    pub fn all_within(&self, side: Player, max_size: usize) -> bool {
        self.of(side).all(|c| c.size() <= max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Rules;

    fn board(cells: &[(Hex, Player, u8)]) -> Board {
        Board::from_cells(Rules::standard(7), cells, Player::Red).unwrap()
    }

    #[test]
    fn test_single_cluster() {
        let b = board(&[
            (Hex::new(2, 2), Player::Red, 1),
            (Hex::new(2, 3), Player::Red, 2),
            (Hex::new(3, 2), Player::Red, 3),
            (Hex::new(5, 5), Player::Blue, 1),
        ]);
        let red = clusters_of(&b, Player::Red);
        assert_eq!(red.len(), 1);
        assert_eq!(red[0].size(), 3);
        assert_eq!(red[0].total_power, 6);
        assert_eq!(red[0].cells[0], Hex::new(2, 2));
    }

    #[test]
    fn test_separate_clusters_in_discovery_order() {
        let b = board(&[
            (Hex::new(4, 4), Player::Red, 1),
            (Hex::new(1, 1), Player::Red, 2),
            (Hex::new(1, 2), Player::Red, 1),
        ]);
        let red = clusters_of(&b, Player::Red);
        assert_eq!(red.len(), 2);
        assert_eq!(red[0].cells[0], Hex::new(1, 1));
        assert_eq!(red[0].size(), 2);
        assert_eq!(red[1].cells, vec![Hex::new(4, 4)]);
    }

    #[test]
    fn test_cluster_connects_across_wrap() {
        let b = board(&[(Hex::new(3, 0), Player::Blue, 1), (Hex::new(3, 6), Player::Blue, 1)]);
        let blue = clusters_of(&b, Player::Blue);
        assert_eq!(blue.len(), 1);
        assert_eq!(blue[0].size(), 2);
    }

    #[test]
    fn test_opposing_pairs() {
        let b = board(&[
            (Hex::new(2, 2), Player::Red, 1),
            (Hex::new(2, 3), Player::Red, 1),
            (Hex::new(2, 4), Player::Blue, 4),
            (Hex::new(5, 0), Player::Blue, 1),
        ]);
        let map = ClusterMap::analyze(&b);
        assert_eq!(map.clusters().len(), 3);

        let pairs: Vec<_> = map.opposing_pairs(Player::Red).collect();
        assert_eq!(pairs.len(), 1);
        let (own, opp) = pairs[0];
        assert_eq!(own.owner, Player::Red);
        assert_eq!(opp.owner, Player::Blue);
        assert_eq!(own.size(), 2);
        assert_eq!(opp.total_power, 4);

        // Same pair seen from Blue's side
        let (own, opp) = map.opposing_pairs(Player::Blue).next().unwrap();
        assert_eq!(own.owner, Player::Blue);
        assert_eq!(opp.owner, Player::Red);
    }

    #[test]
    fn test_dominance() {
        let big = Cluster {
            owner: Player::Red,
            cells: vec![Hex::new(0, 0), Hex::new(0, 1)],
            total_power: 2,
        };
        let strong = Cluster {
            owner: Player::Blue,
            cells: vec![Hex::new(1, 1)],
            total_power: 5,
        };
        let twin = Cluster {
            owner: Player::Blue,
            cells: vec![Hex::new(3, 3), Hex::new(3, 4)],
            total_power: 3,
        };
        assert_eq!(dominance(&big, &strong), Ordering::Greater);
        assert_eq!(dominance(&big, &twin), Ordering::Less);
        assert_eq!(dominance(&twin, &twin), Ordering::Equal);
    }

    #[test]
    fn test_partition_covers_occupied_cells() {
        let b = board(&[
            (Hex::new(0, 0), Player::Red, 1),
            (Hex::new(0, 1), Player::Blue, 2),
            (Hex::new(1, 0), Player::Red, 3),
            (Hex::new(4, 4), Player::Blue, 1),
            (Hex::new(4, 5), Player::Blue, 1),
            (Hex::new(0, 6), Player::Red, 2),
        ]);
        let map = ClusterMap::analyze(&b);
        let total: usize = map.clusters().iter().map(|c| c.size()).sum();
        assert_eq!(total, b.occupied_count());
        for (hex, cell) in b.occupied() {
            assert_eq!(map.cluster_at(hex).unwrap().owner, cell.owner.unwrap());
        }
        assert!(map.all_within(Player::Blue, 2));
        // (0,6) wraps onto (0,0): Red has one cluster of 3
        assert!(!map.all_within(Player::Red, 2));
    }
}
