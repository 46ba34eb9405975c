//! Bitboard representation of an Othello board.
//!
//! Each color owns one `u64` occupancy mask, bit `row * 8 + column` set when a
//! disc of that color sits on the cell. Move generation and flipping work on
//! whole masks at once by shifting them in the eight compass directions.

use std::fmt;

use crate::constants::{CELLS, N};
use crate::position::{CellState, Player, Position};

/// Cells in column A.
const COLUMN_A: u64 = 0x0101_0101_0101_0101;

/// Cells in column H.
const COLUMN_H: u64 = 0x8080_8080_8080_8080;

/// The eight shift directions over a mask.
#[derive(Debug, Clone, Copy)]
enum Shift {
    North,
    South,
    West,
    East,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

const SHIFTS: [Shift; 8] = [
    Shift::North,
    Shift::South,
    Shift::West,
    Shift::East,
    Shift::NorthWest,
    Shift::NorthEast,
    Shift::SouthWest,
    Shift::SouthEast,
];

impl Shift {
    /// Move every bit one step, dropping bits that would wrap across an edge.
    #[inline]
    fn apply(self, bb: u64) -> u64 {
        match self {
            Shift::North => bb >> N,
            Shift::South => bb << N,
            Shift::West => (bb >> 1) & !COLUMN_H,
            Shift::East => (bb << 1) & !COLUMN_A,
            Shift::NorthWest => (bb >> (N + 1)) & !COLUMN_H,
            Shift::NorthEast => (bb >> (N - 1)) & !COLUMN_A,
            Shift::SouthWest => (bb << (N - 1)) & !COLUMN_H,
            Shift::SouthEast => (bb << (N + 1)) & !COLUMN_A,
        }
    }
}

/// An 8x8 Othello board.
///
/// Invariant: no cell is set in both masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Board {
    white: u64,
    black: u64,
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from raw occupancy masks.
    ///
    /// Returns `None` when the masks overlap.
    pub fn from_masks(white: u64, black: u64) -> Option<Self> {
        (white & black == 0).then_some(Self { white, black })
    }

    #[inline]
    pub fn white_mask(&self) -> u64 {
        self.white
    }

    #[inline]
    pub fn black_mask(&self) -> u64 {
        self.black
    }

    #[inline]
    fn empty_mask(&self) -> u64 {
        !(self.white | self.black)
    }

    #[inline]
    fn masks(&self, player: Player) -> (u64, u64) {
        match player {
            Player::White => (self.white, self.black),
            Player::Black => (self.black, self.white),
        }
    }

    /// Contents of a cell.
    #[inline]
    pub fn get_cell_state(&self, position: Position) -> CellState {
        let bit = 1u64 << position.index();
        if self.white & bit != 0 {
            CellState::White
        } else if self.black & bit != 0 {
            CellState::Black
        } else {
            CellState::Empty
        }
    }

    /// Place a disc and flip every captured run.
    ///
    /// Fails without touching the board if the cell is occupied. The move is
    /// not checked for legality: a placement capturing nothing still lands.
    pub fn put_disc(&mut self, position: Position, player: Player) -> bool {
        if self.get_cell_state(position) != CellState::Empty {
            return false;
        }
        let placed = 1u64 << position.index();
        let flips = self.flips(placed, player);
        match player {
            Player::White => {
                self.white |= placed | flips;
                self.black &= !flips;
            }
            Player::Black => {
                self.black |= placed | flips;
                self.white &= !flips;
            }
        }
        debug_assert_eq!(self.white & self.black, 0);
        true
    }

    /// Opponent discs captured by placing `placed` (a single bit) for `player`.
    fn flips(&self, placed: u64, player: Player) -> u64 {
        let (own, opp) = self.masks(player);
        let mut flips = 0u64;
        for shift in SHIFTS {
            let mut run = 0u64;
            let mut cursor = shift.apply(placed);
            while cursor & opp != 0 {
                run |= cursor;
                cursor = shift.apply(cursor);
            }
            if cursor & own != 0 {
                flips |= run;
            }
        }
        flips
    }

    /// Mask of every cell where `player` may legally move.
    pub fn move_mask(&self, player: Player) -> u64 {
        let (own, opp) = self.masks(player);
        let empty = self.empty_mask();
        let mut moves = 0u64;
        for shift in SHIFTS {
            let mut run = shift.apply(own) & opp;
            // A run of opponent discs is at most six long.
            for _ in 0..5 {
                run |= shift.apply(run) & opp;
            }
            moves |= shift.apply(run) & empty;
        }
        moves
    }

    /// Legal moves for `player`, sorted by board index.
    pub fn get_moves(&self, player: Player) -> Vec<Position> {
        let mut mask = self.move_mask(player);
        let mut moves = Vec::with_capacity(mask.count_ones() as usize);
        while mask != 0 {
            moves.push(Position::from_index(mask.trailing_zeros() as usize));
            mask &= mask - 1;
        }
        moves
    }

    /// Whether `player` has at least one legal move.
    #[inline]
    pub fn has_moves(&self, player: Player) -> bool {
        self.move_mask(player) != 0
    }

    /// Number of discs of `player`.
    #[inline]
    pub fn count(&self, player: Player) -> i32 {
        match player {
            Player::White => self.white.count_ones() as i32,
            Player::Black => self.black.count_ones() as i32,
        }
    }

    /// Fold `reduce` over all cells in row-major order.
    pub fn get_metric<F>(&self, reduce: F) -> i32
    where
        F: Fn(i32, CellState, Position) -> i32,
    {
        (0..CELLS).fold(0, |sum, index| {
            let position = Position::from_index(index);
            reduce(sum, self.get_cell_state(position), position)
        })
    }

    /// Signed disc count: `+1` per White disc, `-1` per Black disc.
    #[inline]
    pub fn get_plain_metric(&self) -> i32 {
        self.count(Player::White) - self.count(Player::Black)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for column in 0..N {
            write!(f, " {}", (b'A' + column as u8) as char)?;
        }
        writeln!(f)?;
        for index in 0..CELLS {
            let position = Position::from_index(index);
            if position.column() == 0 {
                write!(f, "{}", position.row() + 1)?;
            }
            let ch = match self.get_cell_state(position) {
                CellState::White => 'O',
                CellState::Black => 'X',
                CellState::Empty => '.',
            };
            write!(f, " {ch}")?;
            if position.column() == N - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::parse_coord;

    fn pos(s: &str) -> Position {
        parse_coord(s).unwrap()
    }

    fn initial() -> Board {
        let mut board = Board::new();
        board.put_disc(pos("D4"), Player::White);
        board.put_disc(pos("E5"), Player::White);
        board.put_disc(pos("D5"), Player::Black);
        board.put_disc(pos("E4"), Player::Black);
        board
    }

    /// Legal moves by walking every direction cell by cell.
    fn slow_moves(board: &Board, player: Player) -> Vec<Position> {
        let own = player.cell();
        let opp = player.opponent().cell();
        (0..CELLS)
            .map(Position::from_index)
            .filter(|&p| board.get_cell_state(p) == CellState::Empty)
            .filter(|&p| {
                crate::constants::DIRECTIONS.iter().any(|&(dc, dr)| {
                    let mut seen = 0;
                    let mut cursor = p.offset(dc, dr);
                    while let Some(c) = cursor {
                        match board.get_cell_state(c) {
                            s if s == opp => seen += 1,
                            s if s == own => return seen > 0,
                            _ => return false,
                        }
                        cursor = c.offset(dc, dr);
                    }
                    false
                })
            })
            .collect()
    }

    #[test]
    fn test_empty_board() {
        let board = Board::new();
        assert_eq!(board.get_cell_state(pos("A1")), CellState::Empty);
        assert!(board.get_moves(Player::White).is_empty());
        assert_eq!(board.get_plain_metric(), 0);
    }

    #[test]
    fn test_put_disc_occupied() {
        let mut board = initial();
        let before = board;
        assert!(!board.put_disc(pos("D4"), Player::Black));
        assert_eq!(board, before);
    }

    #[test]
    fn test_initial_moves() {
        let board = initial();
        let moves: Vec<String> = board
            .get_moves(Player::Black)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(moves, vec!["D3", "C4", "F5", "E6"]);
        let moves: Vec<String> = board
            .get_moves(Player::White)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(moves, vec!["E3", "F4", "C5", "D6"]);
    }

    #[test]
    fn test_capture_horizontal() {
        let mut board = initial();
        assert!(board.put_disc(pos("C4"), Player::Black));
        assert_eq!(board.get_cell_state(pos("D4")), CellState::Black);
        assert_eq!(board.get_cell_state(pos("E5")), CellState::White);
        assert_eq!(board.count(Player::Black), 4);
        assert_eq!(board.count(Player::White), 1);
    }

    #[test]
    fn test_no_flip_without_terminator() {
        // White run reaching the edge is not captured.
        let mut board = Board::new();
        board.put_disc(pos("B1"), Player::White);
        board.put_disc(pos("C1"), Player::White);
        assert!(board.put_disc(pos("D1"), Player::Black));
        assert_eq!(board.get_cell_state(pos("B1")), CellState::White);
        assert_eq!(board.get_cell_state(pos("C1")), CellState::White);
    }

    #[test]
    fn test_no_wrap_across_edges() {
        // H1 and A2 are adjacent indices but not neighbors.
        let mut board = Board::new();
        board.put_disc(pos("G1"), Player::Black);
        board.put_disc(pos("H1"), Player::White);
        assert!(board.get_moves(Player::Black).is_empty());

        let mut board = Board::new();
        board.put_disc(pos("B2"), Player::Black);
        board.put_disc(pos("A2"), Player::White);
        assert!(!board.get_moves(Player::Black).contains(&pos("H1")));
    }

    #[test]
    fn test_moves_match_slow_scan() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..20 {
            let mut board = initial();
            let mut player = Player::Black;
            for _ in 0..40 {
                assert_eq!(board.get_moves(player), slow_moves(&board, player));
                let moves = board.get_moves(player);
                if moves.is_empty() {
                    player = player.opponent();
                    if !board.has_moves(player) {
                        break;
                    }
                    continue;
                }
                board.put_disc(moves[rng.usize(..moves.len())], player);
                player = player.opponent();
            }
        }
    }

    #[test]
    fn test_every_move_flips_and_rolls_back() {
        let board = initial();
        for player in [Player::White, Player::Black] {
            for mv in board.get_moves(player) {
                let mut next = board;
                assert!(next.put_disc(mv, player));
                let flipped = board.masks(player).1 & !next.masks(player).1;
                assert_ne!(flipped, 0, "{mv} must flip something");
                // Undo the flips by hand.
                let placed = 1u64 << mv.index();
                let (own, opp) = next.masks(player);
                let restored = match player {
                    Player::White => Board::from_masks(own & !flipped & !placed, opp | flipped),
                    Player::Black => Board::from_masks(opp | flipped, own & !flipped & !placed),
                };
                assert_eq!(restored, Some(board));
            }
        }
    }

    #[test]
    fn test_plain_metric_matches_cells() {
        let mut board = initial();
        board.put_disc(pos("C4"), Player::Black);
        let folded = board.get_metric(|sum, cell, _| sum + cell.sign());
        assert_eq!(folded, board.get_plain_metric());
        assert_eq!(folded, -3);
    }

    #[test]
    fn test_display() {
        let text = initial().to_string();
        assert!(text.starts_with("  A B C D E F G H"));
        assert!(text.contains("4 . . . O X . . ."));
    }
}
