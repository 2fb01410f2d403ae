//! Hex geometry on a wrapping rhombus with axial coordinates

use serde::{Deserialize, Serialize};

/// Standard board dimension (the board is `BOARD_N x BOARD_N`)
pub const BOARD_N: u8 = 7;

/// Axial hex coordinates, always normalised into `0..n`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub r: i8,
    pub q: i8,
}

impl Hex {
    pub const fn new(r: i8, q: i8) -> Self {
        Self { r, q }
    }

    /// Check if this hex lies on an `n x n` board
    pub fn is_valid(&self, n: u8) -> bool {
        let n = n as i8;
        (0..n).contains(&self.r) && (0..n).contains(&self.q)
    }

    /// Hex `steps` cells away along `dir`, wrapping around the board edges
    pub fn offset(&self, dir: HexDir, steps: u8, n: u8) -> Hex {
        let (dr, dq) = dir.vector();
        let n = n as i16;
        let k = steps as i16;
        let r = (self.r as i16 + dr as i16 * k).rem_euclid(n);
        let q = (self.q as i16 + dq as i16 * k).rem_euclid(n);
        Hex::new(r as i8, q as i8)
    }

    /// Neighbor in direction, wrapping
    pub fn neighbor(&self, dir: HexDir, n: u8) -> Hex {
        self.offset(dir, 1, n)
    }

    /// All six neighbors in `HexDir::ALL` order
    pub fn neighbors(&self, n: u8) -> impl Iterator<Item = Hex> {
        let origin = *self;
        HexDir::ALL.into_iter().map(move |dir| origin.neighbor(dir, n))
    }

    /// Hex distance on the torus: the shortest distance between any two wrapped images
    pub fn distance_to(&self, other: Hex, n: u8) -> u8 {
        let n = n as i16;
        let dr = (other.r as i16 - self.r as i16).rem_euclid(n);
        let dq = (other.q as i16 - self.q as i16).rem_euclid(n);

        let mut best = i16::MAX;
        for wr in [-n, 0, n] {
            for wq in [-n, 0, n] {
                let r = dr + wr;
                let q = dq + wq;
                let d = (r.abs() + q.abs() + (r + q).abs()) / 2;
                best = best.min(d);
            }
        }
        best as u8
    }

    /// Every coordinate of an `n x n` board in row-major `(r, q)` order
    pub fn all(n: u8) -> impl Iterator<Item = Hex> {
        let n = n as i8;
        (0..n).flat_map(move |r| (0..n).map(move |q| Hex::new(r, q)))
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.r, self.q)
    }
}

/// The six hex directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDir {
    DownRight,
    Down,
    DownLeft,
    UpLeft,
    Up,
    UpRight,
}

impl HexDir {
    pub const ALL: [HexDir; 6] = [
        HexDir::DownRight,
        HexDir::Down,
        HexDir::DownLeft,
        HexDir::UpLeft,
        HexDir::Up,
        HexDir::UpRight,
    ];

    /// Direction vector in axial coordinates (dr, dq)
    pub const fn vector(self) -> (i8, i8) {
        match self {
            HexDir::DownRight => (0, 1),
            HexDir::Down => (-1, 1),
            HexDir::DownLeft => (-1, 0),
            HexDir::UpLeft => (0, -1),
            HexDir::Up => (1, -1),
            HexDir::UpRight => (1, 0),
        }
    }

    pub const fn opposite(self) -> HexDir {
        match self {
            HexDir::DownRight => HexDir::UpLeft,
            HexDir::Down => HexDir::Up,
            HexDir::DownLeft => HexDir::UpRight,
            HexDir::UpLeft => HexDir::DownRight,
            HexDir::Up => HexDir::Down,
            HexDir::UpRight => HexDir::DownLeft,
        }
    }

    pub fn from_vector(dr: i8, dq: i8) -> Option<HexDir> {
        HexDir::ALL.into_iter().find(|d| d.vector() == (dr, dq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_validity() {
        assert!(Hex::new(0, 0).is_valid(7));
        assert!(Hex::new(6, 6).is_valid(7));
        assert!(!Hex::new(7, 0).is_valid(7));
        assert!(!Hex::new(0, -1).is_valid(7));
    }

    #[test]
    fn test_offset_wraps() {
        assert_eq!(Hex::new(0, 6).neighbor(HexDir::DownRight, 7), Hex::new(0, 0));
        assert_eq!(Hex::new(0, 0).neighbor(HexDir::Down, 7), Hex::new(6, 1));
        assert_eq!(Hex::new(5, 3).offset(HexDir::UpRight, 3, 7), Hex::new(1, 3));
    }

    #[test]
    fn test_opposite_cancels() {
        for dir in HexDir::ALL {
            let (dr, dq) = dir.vector();
            let (or, oq) = dir.opposite().vector();
            assert_eq!((dr + or, dq + oq), (0, 0));
            assert_eq!(HexDir::from_vector(dr, dq), Some(dir));
        }
    }

    #[test]
    fn test_distance() {
        assert_eq!(Hex::new(3, 3).distance_to(Hex::new(3, 3), 7), 0);
        assert_eq!(Hex::new(3, 3).distance_to(Hex::new(3, 4), 7), 1);
        assert_eq!(Hex::new(3, 3).distance_to(Hex::new(4, 2), 7), 1);
        // Across the wrap: (0,0) and (0,6) are neighbours
        assert_eq!(Hex::new(0, 0).distance_to(Hex::new(0, 6), 7), 1);
        for a in Hex::all(7) {
            for dir in HexDir::ALL {
                assert_eq!(a.distance_to(a.neighbor(dir, 7), 7), 1);
            }
        }
    }

    #[test]
    fn test_all_row_major() {
        let hexes: Vec<_> = Hex::all(3).collect();
        assert_eq!(hexes.len(), 9);
        assert_eq!(hexes[0], Hex::new(0, 0));
        assert_eq!(hexes[1], Hex::new(0, 1));
        assert_eq!(hexes[3], Hex::new(1, 0));
        assert!(hexes.windows(2).all(|w| w[0] < w[1]));
    }
}
