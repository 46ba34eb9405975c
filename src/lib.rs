//! Reversi-Engine: an Othello/Reversi decision engine.
//!
//! This crate provides a bitboard game model, a phase-aware evaluation
//! heuristic and a negamax alpha-beta search that can fan its root out over a
//! fixed thread pool and share results through a node cache. On top of the
//! search sit an event-driven game engine and a computer player.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, evaluation weights and search defaults
//! - [`position`] - Players, cells and coordinates
//! - [`board`] - Bitboard, move generation and captures
//! - [`state`] - Board plus side to move
//! - [`eval`] - Evaluation heuristics and strategies
//! - [`library`] - Opening library
//! - [`threads`] - Fixed-size thread pool
//! - [`cache`] - Concurrent node cache
//! - [`tree`] - Search tree and alpha-beta search
//! - [`engine`] - Shared game state and state-change listeners
//! - [`ai`] - Computer player
//! - [`protocol`] - Text protocol front end
//!
//! ## Example
//!
//! ```
//! use reversi_engine::eval::Strategy;
//! use reversi_engine::state::StateBuilder;
//! use reversi_engine::tree::{BuildOptions, best_move};
//!
//! // Black opens with C4
//! let state = StateBuilder::new().play("C4").unwrap().build();
//!
//! // Search three plies for White's reply
//! let reply = best_move(state, 3, &Strategy::standard(), BuildOptions::default()).unwrap();
//! println!("White plays {reply}");
//! ```

pub mod ai;
pub mod board;
pub mod cache;
pub mod constants;
pub mod engine;
pub mod error;
pub mod eval;
pub mod library;
pub mod position;
pub mod protocol;
pub mod state;
pub mod threads;
pub mod tree;

pub use error::{ReversiError, SearchError, ThreadPoolError};
