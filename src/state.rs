//! Game state: a board plus the side to move.

use std::fmt;

use crate::board::Board;
use crate::error::ReversiError;
use crate::position::{Player, Position, parse_coord};

/// A board together with the player to move.
///
/// Equality, ordering and hashing are structural so states can key the
/// opening library and the node cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct State {
    board: Board,
    player: Player,
}

impl Default for State {
    fn default() -> Self {
        Self::initial()
    }
}

impl State {
    pub fn new(board: Board, player: Player) -> Self {
        Self { board, player }
    }

    /// Standard start: White on D4 and E5, Black on D5 and E4, Black to move.
    pub fn initial() -> Self {
        let mut board = Board::new();
        for (column, row, player) in [
            (4, 4, Player::White),
            (3, 3, Player::White),
            (3, 4, Player::Black),
            (4, 3, Player::Black),
        ] {
            board.put_disc(Position::from_index(row * 8 + column), player);
        }
        Self::new(board, Player::Black)
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }

    /// Place a disc for the side to move and hand the turn over.
    ///
    /// Fails without mutation if the cell is occupied. Legality is the
    /// caller's concern.
    pub fn apply(&mut self, position: Position) -> bool {
        let placed = self.board.put_disc(position, self.player);
        if placed {
            self.player = self.player.opponent();
        }
        placed
    }

    /// Pass the turn without placing a disc.
    #[inline]
    pub fn next(&mut self) {
        self.player = self.player.opponent();
    }

    /// Copy of this state with `position` applied.
    #[inline]
    pub fn after(&self, position: Position) -> Self {
        let mut state = *self;
        state.apply(position);
        state
    }

    /// Copy of this state with the turn passed.
    #[inline]
    pub fn passed(&self) -> Self {
        let mut state = *self;
        state.next();
        state
    }

    /// Legal moves for the side to move.
    #[inline]
    pub fn moves(&self) -> Vec<Position> {
        self.board.get_moves(self.player)
    }

    /// Whether `player` has any legal move here.
    #[inline]
    pub fn has_moves(&self, player: Player) -> bool {
        self.board.has_moves(player)
    }

    /// Whether `position` is a legal move for `player`.
    #[inline]
    pub fn is_move_possible(&self, player: Player, position: Position) -> bool {
        self.board.move_mask(player) & (1u64 << position.index()) != 0
    }

    /// Neither side can move.
    #[inline]
    pub fn is_game_finished(&self) -> bool {
        !(self.has_moves(Player::White) || self.has_moves(Player::Black))
    }

    /// Total number of discs on the board.
    #[inline]
    pub fn disc_count(&self) -> i32 {
        self.board.count(Player::White) + self.board.count(Player::Black)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} to move", self.board, self.player)
    }
}

/// Fluent helper applying a chain of moves, starting from the initial state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateBuilder {
    state: State,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: State) -> Self {
        Self { state }
    }

    pub fn apply(mut self, position: Position) -> Self {
        self.state.apply(position);
        self
    }

    /// Apply a move given as text, e.g. `"C4"`.
    pub fn play(self, coord: &str) -> Result<Self, ReversiError> {
        Ok(self.apply(parse_coord(coord)?))
    }

    /// Apply a whitespace-separated list of moves.
    pub fn play_all(self, coords: &str) -> Result<Self, ReversiError> {
        coords
            .split_whitespace()
            .try_fold(self, |builder, coord| builder.play(coord))
    }

    pub fn build(self) -> State {
        self.state
    }
}

impl From<StateBuilder> for State {
    fn from(builder: StateBuilder) -> Self {
        builder.state
    }
}
