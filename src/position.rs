//! Board coordinates, players and cell contents.
//!
//! Columns are lettered `A`..`H` and rows numbered `1`..`8` in text form.
//! Internally both are zero-based, so `"C4"` is column 2, row 3.

use std::fmt;
use std::str::FromStr;

use crate::constants::N;
use crate::error::ReversiError;

/// One of the two sides.
///
/// The discriminants double as signs: White counts positive, Black negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Player {
    White = 1,
    Black = -1,
}

impl Player {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// `+1` for White, `-1` for Black.
    #[inline]
    pub fn sign(self) -> i32 {
        self as i32
    }

    /// Cell contents produced by a disc of this player.
    #[inline]
    pub fn cell(self) -> CellState {
        match self {
            Player::White => CellState::White,
            Player::Black => CellState::Black,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "white"),
            Player::Black => write!(f, "black"),
        }
    }
}

impl FromStr for Player {
    type Err = ReversiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w" | "white" => Ok(Player::White),
            "b" | "black" => Ok(Player::Black),
            _ => Err(ReversiError::InvalidPlayer(s.to_string())),
        }
    }
}

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Empty = 0,
    White = 1,
    Black = -1,
}

impl CellState {
    /// `+1` for White, `-1` for Black, `0` for an empty cell.
    #[inline]
    pub fn sign(self) -> i32 {
        self as i32
    }
}

/// A cell on the board.
///
/// Field order makes the derived ordering match the row-major board index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    row: u8,
    column: u8,
}

impl Position {
    /// Create a position from zero-based column and row.
    ///
    /// # Errors
    /// `ReversiError::OutOfRange` if either coordinate is off the board.
    pub fn new(column: i32, row: i32) -> Result<Self, ReversiError> {
        if Self::is_possible(column, row) {
            Ok(Self {
                row: row as u8,
                column: column as u8,
            })
        } else {
            Err(ReversiError::OutOfRange { column, row })
        }
    }

    /// Whether the coordinates fall on the board.
    #[inline]
    pub fn is_possible(column: i32, row: i32) -> bool {
        (0..N as i32).contains(&column) && (0..N as i32).contains(&row)
    }

    /// Build a position from a board index in `0..64`.
    ///
    /// Callers guarantee the index is in range.
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < N * N);
        Self {
            row: (index / N) as u8,
            column: (index % N) as u8,
        }
    }

    /// Row-major bit index of this cell.
    #[inline]
    pub fn index(self) -> usize {
        self.row as usize * N + self.column as usize
    }

    #[inline]
    pub fn column(self) -> usize {
        self.column as usize
    }

    #[inline]
    pub fn row(self) -> usize {
        self.row as usize
    }

    /// Step by a `(column, row)` delta, or `None` past the edge.
    #[inline]
    pub fn offset(self, dc: i32, dr: i32) -> Option<Self> {
        let column = self.column as i32 + dc;
        let row = self.row as i32 + dr;
        Self::is_possible(column, row).then(|| Self {
            row: row as u8,
            column: column as u8,
        })
    }

    /// Point reflection through the board center (both axes flipped).
    #[inline]
    pub fn mirrored(self) -> Self {
        Self {
            row: (N - 1) as u8 - self.row,
            column: (N - 1) as u8 - self.column,
        }
    }

    /// Reflection across the main diagonal (column and row swapped).
    #[inline]
    pub fn transposed(self) -> Self {
        Self {
            row: self.column,
            column: self.row,
        }
    }
}

/// Parse a coordinate string such as `"C4"` (case-insensitive).
pub fn parse_coord(s: &str) -> Result<Position, ReversiError> {
    let bytes = s.trim().as_bytes();
    if bytes.len() != 2 {
        return Err(ReversiError::InvalidCoordinate(s.to_string()));
    }
    let column = bytes[0].to_ascii_uppercase();
    let row = bytes[1];
    if !column.is_ascii_uppercase() || !row.is_ascii_digit() {
        return Err(ReversiError::InvalidCoordinate(s.to_string()));
    }
    Position::new((column - b'A') as i32, (row - b'0') as i32 - 1)
}

impl FromStr for Position {
    type Err = ReversiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coord(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.column) as char, self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_out_of_range() {
        assert!(Position::new(0, 0).is_ok());
        assert!(Position::new(7, 7).is_ok());
        assert_eq!(
            Position::new(8, 0),
            Err(ReversiError::OutOfRange { column: 8, row: 0 })
        );
        assert!(Position::new(0, -1).is_err());
    }

    #[test]
    fn test_parse_str_coord_roundtrip() {
        for index in 0..N * N {
            let pos = Position::from_index(index);
            let parsed: Position = pos.to_string().parse().unwrap();
            assert_eq!(pos, parsed, "Failed roundtrip for {}", pos);
        }
    }

    #[test]
    fn test_parse_coord() {
        let pos = parse_coord("c4").unwrap();
        assert_eq!(pos.column(), 2);
        assert_eq!(pos.row(), 3);
        assert_eq!(pos.index(), 26);
        assert!(parse_coord("I1").is_err());
        assert!(parse_coord("A9").is_err());
        assert!(parse_coord("A0").is_err());
        assert!(parse_coord("pass").is_err());
    }

    #[test]
    fn test_ordering_matches_index() {
        let a = parse_coord("H1").unwrap();
        let b = parse_coord("A2").unwrap();
        assert!(a < b);
        assert!(a.index() < b.index());
    }

    #[test]
    fn test_symmetries() {
        let pos = parse_coord("C4").unwrap();
        assert_eq!(pos.mirrored().to_string(), "F5");
        assert_eq!(pos.transposed().to_string(), "D3");
        assert_eq!(pos.mirrored().mirrored(), pos);
    }

    #[test]
    fn test_player() {
        assert_eq!(Player::White.opponent(), Player::Black);
        assert_eq!(Player::Black.sign(), -1);
        assert_eq!("Black".parse::<Player>().unwrap(), Player::Black);
        assert!("red".parse::<Player>().is_err());
    }
}
