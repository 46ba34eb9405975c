//! Constants for board geometry, search defaults and evaluation weights.
//!
//! The board is a fixed 8x8 grid. Cells are indexed row-major, so the cell at
//! column `c` and row `r` (both zero-based) lives at bit `r * 8 + c` of each
//! occupancy mask.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN). Othello is always played on 8x8.
pub const N: usize = 8;

/// Total number of cells on the board.
pub const CELLS: usize = N * N;

/// Offsets to neighboring cells as `(column, row)` deltas.
/// Order: North, South, West, East, NW, NE, SW, SE
pub const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

// =============================================================================
// Search Parameters
// =============================================================================

/// Default search depth (plies) used by the AI player.
pub const DEFAULT_DEPTH: usize = 5;

/// Lower bound of the root alpha-beta window.
pub const ALPHA_MIN: i32 = i16::MIN as i32;

/// Upper bound of the root alpha-beta window.
pub const BETA_MAX: i32 = i16::MAX as i32;

// =============================================================================
// Evaluation
// =============================================================================

/// Disc count at which only the raw disc differential matters.
pub const END_OF_GAME_THRESHOLD: i32 = 59;

/// Disc count at which corner control replaces the positional table.
pub const NEAR_END_OF_GAME: i32 = 54;

/// Weight of a single occupied corner near the end of the game.
pub const CORNER_WEIGHT: i32 = 20;

/// Score used for a disc with no empty neighbor in the frontier term.
pub const STABLE_DISC_BONUS: i32 = 2;

/// Positional weight table, indexed `[row][column]`.
///
/// Corners are worth a lot, the X-squares diagonally next to them are
/// heavily penalized.
pub const WEIGHTS: [[i32; N]; N] = [
    [500, -3, 6, 4, 4, 6, -3, 500],
    [-3, -250, 3, 1, 1, 3, -250, -3],
    [6, 3, 5, 3, 3, 5, 3, 6],
    [4, 1, 3, 1, 1, 3, 1, 4],
    [4, 1, 3, 1, 1, 3, 1, 4],
    [6, 3, 5, 3, 3, 5, 3, 6],
    [-3, -250, 3, 1, 1, 3, -250, -3],
    [500, -3, 6, 4, 4, 6, -3, 500],
];
