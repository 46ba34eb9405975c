//! Error types shared across the engine.

use thiserror::Error;

/// Errors raised while constructing engine values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReversiError {
    /// A coordinate lies outside the 8x8 board.
    #[error("position out of range: column {column}, row {row}")]
    OutOfRange { column: i32, row: i32 },
    /// A textual coordinate could not be parsed.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    /// A player name could not be parsed.
    #[error("invalid player: {0}")]
    InvalidPlayer(String),
}

/// Errors reported by the thread pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadPoolError {
    /// The pool was shut down before the task produced a result.
    #[error("thread pool is shut down")]
    ShutDown,
    /// The task panicked while running.
    #[error("task panicked")]
    TaskPanicked,
}

/// Errors reported by a search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The search was cancelled through its token.
    #[error("search cancelled")]
    Cancelled,
    /// The side to move has no legal move.
    #[error("no legal moves")]
    NoMoves,
    /// A subtree task failed inside the pool.
    #[error("pool failure: {0}")]
    Pool(#[from] ThreadPoolError),
}
