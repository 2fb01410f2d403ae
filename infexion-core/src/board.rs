//! Board state, actions and the Infexion rules

use crate::error::{EngineError, Result};
use crate::hex::{Hex, HexDir, BOARD_N};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of actions that must be played before a result can be declared
const MIN_TURNS_FOR_RESULT: u16 = 2;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Red = 0,
    Blue = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Player::Red => "RED",
            Player::Blue => "BLUE",
        })
    }
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    RedWins,
    BlueWins,
    Draw,
}

impl GameResult {
    pub fn is_over(self) -> bool {
        self != GameResult::Ongoing
    }

    /// Winning player, if any
    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::RedWins => Some(Player::Red),
            GameResult::BlueWins => Some(Player::Blue),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }

    pub fn won_by(player: Player) -> Self {
        match player {
            Player::Red => GameResult::RedWins,
            Player::Blue => GameResult::BlueWins,
        }
    }
}

/// State of a single cell. `power == 0` exactly when `owner` is `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub owner: Option<Player>,
    pub power: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell { owner: None, power: 0 };

    pub fn new(owner: Player, power: u8) -> Self {
        Self {
            owner: Some(owner),
            power,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, player: Player) -> bool {
        self.owner == Some(player)
    }
}

/// A player action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Spawn { cell: Hex },
    Spread { cell: Hex, dir: HexDir },
}

impl Action {
    /// The cell the action is anchored on
    pub fn cell(&self) -> Hex {
        match *self {
            Action::Spawn { cell } | Action::Spread { cell, .. } => cell,
        }
    }

    pub fn is_spawn(&self) -> bool {
        matches!(self, Action::Spawn { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Action::Spawn { cell } => write!(f, "SPAWN({}, {})", cell.r, cell.q),
            Action::Spread { cell, dir } => {
                let (dr, dq) = dir.vector();
                write!(f, "SPREAD({}, {}, {}, {})", cell.r, cell.q, dr, dq)
            }
        }
    }
}

/// Game rules, derived from the board size by default
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Board is `grid_size x grid_size`, wrapping at the edges
    pub grid_size: u8,
    /// Stacks that would grow beyond this power are removed
    pub max_cell_power: u8,
    /// Spawning is illegal once the board holds this much power
    pub max_total_power: u16,
    /// The game ends after this many actions
    pub max_turns: u16,
    /// Minimum power lead needed to win a finished game
    pub win_power_diff: u16,
}

impl Rules {
    /// Standard rules for an `n x n` board
    pub fn standard(n: u8) -> Self {
        let n16 = n as u16;
        Self {
            grid_size: n,
            max_cell_power: n.saturating_sub(1),
            max_total_power: n16 * n16,
            max_turns: n16 * n16 * n16,
            win_power_diff: 2,
        }
    }

    /// Number of cells on the board
    pub fn capacity(&self) -> usize {
        self.grid_size as usize * self.grid_size as usize
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::standard(BOARD_N)
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Board state (immutable per ply: `apply` returns a new board)
#[derive(Clone, Debug)]
pub struct Board {
    /// Occupied cells only (sparse representation)
    cells: FxHashMap<Hex, Cell>,

    /// Player to move
    side_to_move: Player,

    /// Number of actions played so far
    turn_count: u16,

    rules: Rules,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
            && self.side_to_move == other.side_to_move
            && self.turn_count == other.turn_count
            && self.rules == other.rules
    }
}

impl Eq for Board {}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board, Red to move
    pub fn new(rules: Rules) -> Self {
        Self {
            cells: FxHashMap::default(),
            side_to_move: Player::Red,
            turn_count: 0,
            rules,
        }
    }

    /// Board from explicit placements, treated as a mid-game position
    pub fn from_cells(
        rules: Rules,
        placements: &[(Hex, Player, u8)],
        side_to_move: Player,
    ) -> Result<Self> {
        let mut cells = FxHashMap::default();

        for &(hex, owner, power) in placements {
            if !hex.is_valid(rules.grid_size) {
                return Err(EngineError::config(format!("cell {} is off the board", hex)));
            }
            if power == 0 || power > rules.max_cell_power {
                return Err(EngineError::config(format!(
                    "cell {} has power {} outside 1..={}",
                    hex, power, rules.max_cell_power
                )));
            }
            if cells.insert(hex, Cell::new(owner, power)).is_some() {
                return Err(EngineError::config(format!("cell {} placed twice", hex)));
            }
        }

        Ok(Self {
            cells,
            side_to_move,
            turn_count: MIN_TURNS_FOR_RESULT,
            rules,
        })
    }

    /// Override the number of actions played
    pub fn with_turn_count(mut self, turn_count: u16) -> Self {
        self.turn_count = turn_count;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    pub fn turn_count(&self) -> u16 {
        self.turn_count
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn grid_size(&self) -> u8 {
        self.rules.grid_size
    }

    /// Cell state at hex (`Cell::EMPTY` when unoccupied)
    pub fn get(&self, hex: Hex) -> Cell {
        self.cells.get(&hex).copied().unwrap_or(Cell::EMPTY)
    }

    pub fn is_occupied(&self, hex: Hex) -> bool {
        self.cells.contains_key(&hex)
    }

    /// Occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (Hex, Cell)> + '_ {
        Hex::all(self.rules.grid_size).filter_map(move |hex| self.cells.get(&hex).map(|&c| (hex, c)))
    }

    /// Cells owned by `player` with their power, row-major
    pub fn cells_of(&self, player: Player) -> impl Iterator<Item = (Hex, u8)> + '_ {
        self.occupied()
            .filter(move |(_, c)| c.is_owned_by(player))
            .map(|(hex, c)| (hex, c.power))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// Total power and cell count per player, indexed by `Player::index`
    pub fn power_and_count(&self) -> ([u32; 2], [u32; 2]) {
        let mut power = [0u32; 2];
        let mut count = [0u32; 2];
        for cell in self.cells.values() {
            if let Some(owner) = cell.owner {
                power[owner.index()] += cell.power as u32;
                count[owner.index()] += 1;
            }
        }
        (power, count)
    }

    pub fn power_of(&self, player: Player) -> u32 {
        self.power_and_count().0[player.index()]
    }

    pub fn count_of(&self, player: Player) -> u32 {
        self.power_and_count().1[player.index()]
    }

    pub fn total_power(&self) -> u32 {
        self.cells.values().map(|c| c.power as u32).sum()
    }

    /// Whether total power still allows spawning
    pub fn can_spawn(&self) -> bool {
        self.total_power() < self.rules.max_total_power as u32
    }

    /// Whether some stack of `player` reaches `hex` with a single spread
    pub fn threatened_by(&self, hex: Hex, player: Player) -> bool {
        let n = self.rules.grid_size;
        for dir in HexDir::ALL {
            for k in 1..=self.rules.max_cell_power {
                let source = hex.offset(dir.opposite(), k, n);
                let cell = self.get(source);
                if cell.is_owned_by(player) && cell.power >= k {
                    return true;
                }
            }
        }
        false
    }

    /// Cells a spread of `power` from `cell` along `dir` lands on, nearest first
    pub fn spread_targets(&self, cell: Hex, dir: HexDir, power: u8) -> impl Iterator<Item = Hex> {
        let n = self.rules.grid_size;
        (1..=power).map(move |k| cell.offset(dir, k, n))
    }

    /// Whether `player` has any action available
    pub fn legal_actions_exist(&self, player: Player) -> bool {
        let has_stack = self.cells.values().any(|c| c.is_owned_by(player));
        let has_spawn = self.cells.len() < self.rules.capacity() && self.can_spawn();
        has_stack || has_spawn
    }

    // ========================================================================
    // GAME RESULT
    // ========================================================================

    /// Result under the board's rules
    pub fn result(&self) -> GameResult {
        if self.turn_count < MIN_TURNS_FOR_RESULT {
            return GameResult::Ongoing;
        }

        let (power, _) = self.power_and_count();
        let red = power[Player::Red.index()];
        let blue = power[Player::Blue.index()];

        let finished = self.turn_count >= self.rules.max_turns || red == 0 || blue == 0;
        if !finished {
            return GameResult::Ongoing;
        }

        if red.abs_diff(blue) < self.rules.win_power_diff as u32 {
            GameResult::Draw
        } else if red > blue {
            GameResult::RedWins
        } else {
            GameResult::BlueWins
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.result().is_over()
    }

    // ========================================================================
    // APPLY ACTION
    // ========================================================================

    /// Check an action against the board constraints
    pub fn validate(&self, action: Action) -> Result<()> {
        let n = self.rules.grid_size;
        if !action.cell().is_valid(n) {
            return Err(EngineError::illegal(action, "cell is off the board"));
        }
        if self.is_terminal() {
            return Err(EngineError::illegal(action, "game is already over"));
        }

        match action {
            Action::Spawn { cell } => {
                if self.is_occupied(cell) {
                    return Err(EngineError::illegal(action, "cell is occupied"));
                }
                if !self.can_spawn() {
                    return Err(EngineError::illegal(
                        action,
                        format!("total board power reached {}", self.rules.max_total_power),
                    ));
                }
            }
            Action::Spread { cell, .. } => {
                if !self.get(cell).is_owned_by(self.side_to_move) {
                    return Err(EngineError::illegal(
                        action,
                        format!("cell is not occupied by {}", self.side_to_move),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply action, return new board
    pub fn apply(&self, action: Action) -> Result<Board> {
        self.validate(action)?;
        let mut next = self.clone();
        next.apply_internal(action);
        Ok(next)
    }

    fn apply_internal(&mut self, action: Action) {
        let mover = self.side_to_move;

        match action {
            Action::Spawn { cell } => {
                self.cells.insert(cell, Cell::new(mover, 1));
            }
            Action::Spread { cell, dir } => {
                let power = self.cells.remove(&cell).map_or(0, |c| c.power);
                let n = self.rules.grid_size;
                for k in 1..=power {
                    let target = cell.offset(dir, k, n);
                    let next_power = self.get(target).power + 1;
                    if next_power > self.rules.max_cell_power {
                        self.cells.remove(&target);
                    } else {
                        self.cells.insert(target, Cell::new(mover, next_power));
                    }
                }
            }
        }

        self.side_to_move = mover.opponent();
        self.turn_count += 1;
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    /// Verify the cell invariants
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.cells.len() > self.rules.capacity() {
            return Err(format!("{} occupied cells exceed capacity", self.cells.len()));
        }
        for (hex, cell) in &self.cells {
            if !hex.is_valid(self.rules.grid_size) {
                return Err(format!("cell {} is off the board", hex));
            }
            if cell.owner.is_none() {
                return Err(format!("cell {} stored without owner", hex));
            }
            if cell.power == 0 || cell.power > self.rules.max_cell_power {
                return Err(format!("cell {} has power {}", hex, cell.power));
            }
        }
        Ok(())
    }

    /// Rough heap + inline footprint, used by the search space budget
    pub fn approx_bytes(&self) -> usize {
        let entry = std::mem::size_of::<Hex>() + std::mem::size_of::<Cell>() + 1;
        std::mem::size_of::<Board>() + self.cells.capacity() * entry
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Rules {
        Rules::standard(7)
    }

    fn board(cells: &[(Hex, Player, u8)], side: Player) -> Board {
        Board::from_cells(rules(), cells, side).unwrap()
    }

    #[test]
    fn test_standard_rules() {
        let r = rules();
        assert_eq!(r.max_cell_power, 6);
        assert_eq!(r.max_total_power, 49);
        assert_eq!(r.max_turns, 343);
        assert_eq!(r.capacity(), 49);
    }

    #[test]
    fn test_new_board() {
        let b = Board::new(rules());
        assert_eq!(b.side_to_move(), Player::Red);
        assert_eq!(b.turn_count(), 0);
        assert_eq!(b.result(), GameResult::Ongoing);
        assert!(b.legal_actions_exist(Player::Red));
    }

    #[test]
    fn test_spawn() {
        let b = Board::new(rules());
        let next = b.apply(Action::Spawn { cell: Hex::new(3, 3) }).unwrap();
        assert_eq!(next.get(Hex::new(3, 3)), Cell::new(Player::Red, 1));
        assert_eq!(next.side_to_move(), Player::Blue);
        assert_eq!(next.turn_count(), 1);
        // Receiver untouched
        assert!(b.get(Hex::new(3, 3)).is_empty());
    }

    #[test]
    fn test_spawn_on_occupied_is_illegal() {
        let b = board(&[(Hex::new(1, 1), Player::Blue, 1)], Player::Red);
        let err = b.apply(Action::Spawn { cell: Hex::new(1, 1) }).unwrap_err();
        assert!(matches!(err, EngineError::IllegalAction { .. }));
    }

    #[test]
    fn test_spawn_blocked_at_total_power_limit() {
        // 9 stacks of power 6 = 54 >= 49
        let cells: Vec<_> = (0..9)
            .map(|i| (Hex::new(i / 7, i % 7), if i % 2 == 0 { Player::Red } else { Player::Blue }, 6))
            .collect();
        let b = board(&cells, Player::Red);
        assert!(!b.can_spawn());
        assert!(b.apply(Action::Spawn { cell: Hex::new(5, 5) }).is_err());
    }

    #[test]
    fn test_spread_from_foreign_cell_is_illegal() {
        let b = board(
            &[(Hex::new(1, 1), Player::Blue, 2), (Hex::new(4, 4), Player::Red, 1)],
            Player::Red,
        );
        assert!(b
            .apply(Action::Spread { cell: Hex::new(1, 1), dir: HexDir::Up })
            .is_err());
        assert!(b
            .apply(Action::Spread { cell: Hex::new(2, 2), dir: HexDir::Up })
            .is_err());
    }

    #[test]
    fn test_spread_captures_and_stacks() {
        let b = board(
            &[
                (Hex::new(3, 1), Player::Red, 3),
                (Hex::new(3, 2), Player::Blue, 2),
                (Hex::new(3, 4), Player::Red, 1),
                (Hex::new(0, 0), Player::Blue, 1),
            ],
            Player::Red,
        );
        let next = b
            .apply(Action::Spread { cell: Hex::new(3, 1), dir: HexDir::DownRight })
            .unwrap();
        assert!(next.get(Hex::new(3, 1)).is_empty());
        assert_eq!(next.get(Hex::new(3, 2)), Cell::new(Player::Red, 3));
        assert_eq!(next.get(Hex::new(3, 3)), Cell::new(Player::Red, 1));
        assert_eq!(next.get(Hex::new(3, 4)), Cell::new(Player::Red, 2));
        assert_eq!(next.get(Hex::new(3, 5)), Cell::EMPTY);
        assert_eq!(next.power_of(Player::Red), 6);
        assert_eq!(next.power_of(Player::Blue), 1);
    }

    #[test]
    fn test_spread_overflow_removes_stack() {
        let b = board(
            &[
                (Hex::new(2, 2), Player::Red, 1),
                (Hex::new(2, 3), Player::Blue, 6),
                (Hex::new(5, 5), Player::Blue, 1),
            ],
            Player::Red,
        );
        let next = b
            .apply(Action::Spread { cell: Hex::new(2, 2), dir: HexDir::DownRight })
            .unwrap();
        assert!(next.get(Hex::new(2, 3)).is_empty());
        assert!(next.get(Hex::new(2, 2)).is_empty());
        assert_eq!(next.occupied_count(), 1);
        next.check_invariants().unwrap();
    }

    #[test]
    fn test_spread_wraps_around_edges() {
        let b = board(
            &[(Hex::new(0, 5), Player::Red, 3), (Hex::new(4, 4), Player::Blue, 1)],
            Player::Red,
        );
        let next = b
            .apply(Action::Spread { cell: Hex::new(0, 5), dir: HexDir::DownRight })
            .unwrap();
        assert_eq!(next.get(Hex::new(0, 6)), Cell::new(Player::Red, 1));
        assert_eq!(next.get(Hex::new(0, 0)), Cell::new(Player::Red, 1));
        assert_eq!(next.get(Hex::new(0, 1)), Cell::new(Player::Red, 1));
    }

    #[test]
    fn test_capturing_last_cell_wins() {
        let b = board(
            &[(Hex::new(3, 3), Player::Red, 2), (Hex::new(3, 4), Player::Blue, 1)],
            Player::Red,
        );
        assert_eq!(b.result(), GameResult::Ongoing);
        let next = b
            .apply(Action::Spread { cell: Hex::new(3, 3), dir: HexDir::DownRight })
            .unwrap();
        assert_eq!(next.result(), GameResult::RedWins);
        assert_eq!(next.result().winner(), Some(Player::Red));
        // No further actions on a finished game
        assert!(next.apply(Action::Spawn { cell: Hex::new(0, 0) }).is_err());
    }

    #[test]
    fn test_turn_limit_draw_and_win() {
        let close = board(
            &[(Hex::new(0, 0), Player::Red, 3), (Hex::new(4, 4), Player::Blue, 2)],
            Player::Red,
        )
        .with_turn_count(343);
        assert_eq!(close.result(), GameResult::Draw);

        let clear = board(
            &[(Hex::new(0, 0), Player::Red, 2), (Hex::new(4, 4), Player::Blue, 4)],
            Player::Red,
        )
        .with_turn_count(343);
        assert_eq!(clear.result(), GameResult::BlueWins);
    }

    #[test]
    fn test_no_result_before_two_turns() {
        let b = Board::new(rules());
        let after_one = b.apply(Action::Spawn { cell: Hex::new(3, 3) }).unwrap();
        // Blue has no cells yet, but the game cannot end on the first action
        assert_eq!(after_one.result(), GameResult::Ongoing);
    }

    #[test]
    fn test_threatened_by() {
        let b = board(
            &[(Hex::new(3, 0), Player::Blue, 3), (Hex::new(0, 0), Player::Red, 1)],
            Player::Red,
        );
        assert!(b.threatened_by(Hex::new(3, 3), Player::Blue));
        // Row 3 is covered in both directions thanks to wrapping
        assert!(b.threatened_by(Hex::new(3, 4), Player::Blue));
        assert!(!b.threatened_by(Hex::new(5, 2), Player::Blue));
        assert!(b.threatened_by(Hex::new(0, 1), Player::Red));
        assert!(!b.threatened_by(Hex::new(0, 2), Player::Red));
    }

    #[test]
    fn test_from_cells_rejects_bad_placements() {
        assert!(Board::from_cells(rules(), &[(Hex::new(7, 0), Player::Red, 1)], Player::Red).is_err());
        assert!(Board::from_cells(rules(), &[(Hex::new(0, 0), Player::Red, 0)], Player::Red).is_err());
        assert!(Board::from_cells(rules(), &[(Hex::new(0, 0), Player::Red, 7)], Player::Red).is_err());
        assert!(Board::from_cells(
            rules(),
            &[(Hex::new(0, 0), Player::Red, 1), (Hex::new(0, 0), Player::Blue, 1)],
            Player::Red
        )
        .is_err());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Spawn { cell: Hex::new(3, 4) }.to_string(), "SPAWN(3, 4)");
        assert_eq!(
            Action::Spread { cell: Hex::new(1, 2), dir: HexDir::Down }.to_string(),
            "SPREAD(1, 2, -1, 1)"
        );
    }
}
