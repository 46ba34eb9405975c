//! Position evaluation heuristics.
//!
//! Scores are always from White's point of view: positive favors White,
//! negative favors Black. The search multiplies by the mover's sign to get a
//! negamax value.
//!
//! The standard heuristic changes with the game phase:
//! - endgame (59+ discs): raw disc differential
//! - near endgame (54+ discs): disc differential plus corner control
//! - opening and midgame: disc differential, positional weight table and a
//!   frontier term penalizing discs next to empty cells

use std::fmt;
use std::sync::Arc;

use crate::constants::{
    CORNER_WEIGHT, DIRECTIONS, END_OF_GAME_THRESHOLD, N, NEAR_END_OF_GAME, STABLE_DISC_BONUS,
    WEIGHTS,
};
use crate::position::{CellState, Player, Position};
use crate::state::State;

/// A scoring function over states.
pub type Evaluator = Arc<dyn Fn(&State) -> i32 + Send + Sync>;

/// A pair of evaluators, one used when White is to move and one for Black.
///
/// Both legs are the same function in normal play; the split allows
/// asymmetric or deliberately weak evaluation.
#[derive(Clone)]
pub struct Strategy {
    pub white: Evaluator,
    pub black: Evaluator,
}

impl Strategy {
    pub fn new(white: Evaluator, black: Evaluator) -> Self {
        Self { white, black }
    }

    /// Use the same evaluator for both sides.
    pub fn symmetric<F>(eval: F) -> Self
    where
        F: Fn(&State) -> i32 + Send + Sync + 'static,
    {
        let eval: Evaluator = Arc::new(eval);
        Self::new(eval.clone(), eval)
    }

    /// The phase-aware heuristic of [`assess_state`].
    pub fn standard() -> Self {
        Self::symmetric(assess_state)
    }

    /// The negated standard heuristic, which plays as badly as it can.
    pub fn reversed() -> Self {
        Self::symmetric(|state| -assess_state(state))
    }

    /// Signed disc count only.
    pub fn plain() -> Self {
        Self::symmetric(|state| state.board().get_plain_metric())
    }

    /// Evaluate `state` with the leg belonging to `player`.
    #[inline]
    pub fn evaluate(&self, player: Player, state: &State) -> i32 {
        match player {
            Player::White => (self.white)(state),
            Player::Black => (self.black)(state),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").finish_non_exhaustive()
    }
}

/// Phase-aware evaluation of a state.
pub fn assess_state(state: &State) -> i32 {
    let board = state.board();
    let white_discs = board.count(Player::White);
    let black_discs = board.count(Player::Black);
    let total = white_discs + black_discs;
    let disc_diff = white_discs - black_discs;

    if total >= END_OF_GAME_THRESHOLD {
        disc_diff
    } else if total >= NEAR_END_OF_GAME {
        disc_diff + corner_heuristic(state)
    } else {
        let weights = board.get_metric(|sum, cell, position| {
            sum + cell.sign() * WEIGHTS[position.row()][position.column()]
        });
        let frontier = board.get_metric(|sum, cell, position| match cell {
            CellState::Empty => sum,
            _ => sum + empty_discs_around(state, position),
        });
        disc_diff + weights + frontier
    }
}

/// Frontier score of the disc at `position`.
///
/// Each empty neighbor costs one point; a disc with no empty neighbor earns
/// a small bonus instead. The result is signed by the disc's color and is
/// zero for an empty cell.
pub fn empty_discs_around(state: &State, position: Position) -> i32 {
    let board = state.board();
    let empty = DIRECTIONS
        .iter()
        .filter_map(|&(dc, dr)| position.offset(dc, dr))
        .filter(|&neighbor| board.get_cell_state(neighbor) == CellState::Empty)
        .count() as i32;
    let score = if empty == 0 { STABLE_DISC_BONUS } else { -empty };
    score * board.get_cell_state(position).sign()
}

/// Corner control: each occupied corner is worth [`CORNER_WEIGHT`] to its owner.
pub fn corner_heuristic(state: &State) -> i32 {
    const LAST: usize = N - 1;
    [(0, 0), (0, LAST), (LAST, 0), (LAST, LAST)]
        .iter()
        .map(|&(row, column)| {
            state
                .board()
                .get_cell_state(Position::from_index(row * N + column))
                .sign()
        })
        .sum::<i32>()
        * CORNER_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::position::parse_coord;
    use crate::state::StateBuilder;

    /// Same position with colors swapped.
    fn swap_colors(state: &State) -> State {
        let board = state.board();
        let swapped = Board::from_masks(board.black_mask(), board.white_mask()).unwrap();
        State::new(swapped, state.player().opponent())
    }

    #[test]
    fn test_initial_is_balanced() {
        assert_eq!(assess_state(&State::initial()), 0);
    }

    #[test]
    fn test_color_swap_negates() {
        let state = StateBuilder::new().play_all("C4 C3 D3").unwrap().build();
        assert_eq!(assess_state(&swap_colors(&state)), -assess_state(&state));
    }

    #[test]
    fn test_corner_weights_dominate() {
        let mut board = Board::new();
        board.put_disc(parse_coord("A1").unwrap(), Player::White);
        board.put_disc(parse_coord("B2").unwrap(), Player::Black);
        let state = State::new(board, Player::White);
        // diff 0, weights 500 + 250, frontier: A1 has 2 empty neighbours, B2 has 7
        assert_eq!(assess_state(&state), 750 - 2 + 7);
    }

    #[test]
    fn test_frontier_term() {
        let state = State::initial();
        let d4 = parse_coord("D4").unwrap();
        let d5 = parse_coord("D5").unwrap();
        assert_eq!(empty_discs_around(&state, d4), -5);
        assert_eq!(empty_discs_around(&state, d5), 5);
        assert_eq!(empty_discs_around(&state, parse_coord("A1").unwrap()), 0);
    }

    #[test]
    fn test_surrounded_disc_bonus() {
        let mut board = Board::new();
        board.put_disc(parse_coord("A1").unwrap(), Player::Black);
        for coord in ["A2", "B1", "B2"] {
            board.put_disc(parse_coord(coord).unwrap(), Player::White);
        }
        let state = State::new(board, Player::White);
        assert_eq!(empty_discs_around(&state, parse_coord("A1").unwrap()), -STABLE_DISC_BONUS);
    }

    #[test]
    fn test_endgame_uses_disc_difference() {
        // 60 discs: 40 white, 20 black.
        let white = (1u64 << 40) - 1;
        let black = ((1u64 << 60) - 1) & !white;
        let state = State::new(Board::from_masks(white, black).unwrap(), Player::White);
        assert_eq!(assess_state(&state), 20);
    }

    #[test]
    fn test_near_endgame_adds_corners() {
        // 56 discs, white holds A1 and H1, black holds nothing in the corners.
        let occupied = (1u64 << 56) - 1;
        let white = occupied & 0x0000_0000_FFFF_FFFF;
        let black = occupied & !white;
        let state = State::new(Board::from_masks(white, black).unwrap(), Player::Black);
        assert_eq!(corner_heuristic(&state), 2 * CORNER_WEIGHT);
        assert_eq!(assess_state(&state), (32 - 24) + 2 * CORNER_WEIGHT);
    }

    #[test]
    fn test_strategy_legs() {
        let strategy = Strategy::new(Arc::new(|_| 1), Arc::new(|_| -1));
        let state = State::initial();
        assert_eq!(strategy.evaluate(Player::White, &state), 1);
        assert_eq!(strategy.evaluate(Player::Black, &state), -1);
        let state = StateBuilder::new().play("C4").unwrap().build();
        assert_eq!(Strategy::plain().evaluate(Player::White, &state), -3);
        assert_eq!(
            Strategy::reversed().evaluate(Player::White, &state),
            -assess_state(&state)
        );
    }
}
