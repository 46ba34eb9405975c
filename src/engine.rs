//! Game engine: the shared game state and its event surface.
//!
//! The engine owns the current [`State`], the state the game started from and
//! the history of accepted moves. Moves come in through
//! [`GameEngine::receive_move`]; after every accepted move (and after an undo
//! or reset) each registered listener is called with the new state.
//!
//! Listeners are plain closures. They run on the thread that changed the
//! state, outside the engine's locks, so a listener may query the engine or
//! forward the state over a channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::position::{Player, Position};
use crate::state::State;

/// A move submitted by (or on behalf of) a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMove {
    pub player: Player,
    pub position: Position,
}

impl PlayerMove {
    pub fn new(player: Player, position: Position) -> Self {
        Self { player, position }
    }
}

/// An accepted move as recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMoveDiff {
    pub player: Player,
    pub position: Position,
    /// Disc-count swing for the mover, when metric tracking is enabled.
    pub metric: Option<i32>,
}

/// Runtime options for [`GameEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// Record the disc-count swing of every move in the history.
    pub track_metrics: bool,
}

/// Handle returned by [`GameEngine::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&State) + Send + Sync>;

#[derive(Debug)]
struct Game {
    base: State,
    state: State,
    moves: Vec<PlayerMoveDiff>,
}

/// Thread-safe game engine shared between players and the UI.
pub struct GameEngine {
    config: EngineConfig,
    game: Mutex<Game>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GameEngine {
    /// A new game from the standard start position.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_state(State::initial(), config)
    }

    /// A new game from an arbitrary position.
    pub fn with_state(state: State, config: EngineConfig) -> Self {
        Self {
            config,
            game: Mutex::new(Game {
                base: state,
                state,
                moves: Vec::new(),
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.game.lock().state
    }

    /// Accepted moves since the base state.
    pub fn moves(&self) -> Vec<PlayerMoveDiff> {
        self.game.lock().moves.clone()
    }

    pub fn is_game_finished(&self) -> bool {
        self.state().is_game_finished()
    }

    /// Apply `mv` if it belongs to the side to move and is legal.
    ///
    /// Anything else is ignored. Returns whether the move was accepted.
    pub fn receive_move(&self, mv: PlayerMove) -> bool {
        let state = {
            let mut game = self.game.lock();
            if game.state.player() != mv.player
                || !game.state.is_move_possible(mv.player, mv.position)
            {
                debug!(player = %mv.player, position = %mv.position, "move ignored");
                return false;
            }
            let before = game.state.board().get_plain_metric();
            advance(&mut game.state, mv.position);
            let metric = self
                .config
                .track_metrics
                .then(|| (game.state.board().get_plain_metric() - before) * mv.player.sign());
            game.moves.push(PlayerMoveDiff {
                player: mv.player,
                position: mv.position,
                metric,
            });
            game.state
        };
        info!(player = %mv.player, position = %mv.position, "move accepted");
        if state.is_game_finished() {
            info!(
                white = state.board().count(Player::White),
                black = state.board().count(Player::Black),
                "game over"
            );
        }
        self.notify(&state);
        true
    }

    /// Submit a move by player and position.
    pub fn submit(&self, player: Player, position: Position) -> bool {
        self.receive_move(PlayerMove::new(player, position))
    }

    /// Take back the last `count` moves by replaying the rest of the history.
    ///
    /// Returns the number of moves actually removed.
    pub fn undo_move(&self, count: usize) -> usize {
        let (state, removed) = {
            let mut game = self.game.lock();
            let removed = count.min(game.moves.len());
            let keep = game.moves.len() - removed;
            game.moves.truncate(keep);
            let mut state = game.base;
            for mv in &game.moves {
                advance(&mut state, mv.position);
            }
            game.state = state;
            (state, removed)
        };
        if removed > 0 {
            info!(removed, "moves undone");
            self.notify(&state);
        }
        removed
    }

    /// Start over from `state`, clearing the history.
    pub fn reset(&self, state: State) {
        {
            let mut game = self.game.lock();
            *game = Game {
                base: state,
                state,
                moves: Vec::new(),
            };
        }
        self.notify(&state);
    }

    /// Re-send the current state to every listener.
    pub fn trigger_event(&self) {
        let state = self.state();
        self.notify(&state);
    }

    /// Register a state-change listener.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(other, _)| *other != id);
        listeners.len() != before
    }

    fn notify(&self, state: &State) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

/// Play `position` and pass on behalf of the next player if it is stuck
/// while its opponent can still move.
fn advance(state: &mut State, position: Position) {
    state.apply(position);
    let mover = state.player();
    if !state.has_moves(mover) && state.has_moves(mover.opponent()) {
        debug!(player = %mover, "forced pass");
        state.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::position::parse_coord;
    use std::sync::mpsc;

    fn pos(s: &str) -> Position {
        parse_coord(s).unwrap()
    }

    #[test]
    fn test_accepts_legal_move() {
        let engine = GameEngine::default();
        assert!(engine.submit(Player::Black, pos("C4")));
        assert_eq!(engine.state().player(), Player::White);
        assert_eq!(engine.moves().len(), 1);
        assert_eq!(engine.moves()[0].metric, None);
    }

    #[test]
    fn test_ignores_wrong_player_and_illegal_move() {
        let engine = GameEngine::default();
        let before = engine.state();
        assert!(!engine.submit(Player::White, pos("C4")));
        assert!(!engine.submit(Player::Black, pos("A1")));
        assert!(!engine.submit(Player::Black, pos("D4")));
        assert_eq!(engine.state(), before);
        assert!(engine.moves().is_empty());
    }

    #[test]
    fn test_metric_tracking() {
        let engine = GameEngine::new(EngineConfig {
            track_metrics: true,
        });
        engine.submit(Player::Black, pos("C4"));
        // One placed disc plus one flip moves the count by three for black.
        assert_eq!(engine.moves()[0].metric, Some(3));
    }

    #[test]
    fn test_listeners_receive_states() {
        let engine = GameEngine::default();
        let (tx, rx) = mpsc::channel();
        let id = engine.add_listener(move |state| {
            let _ = tx.send(*state);
        });
        engine.submit(Player::Black, pos("C4"));
        assert_eq!(rx.try_recv().unwrap(), engine.state());
        // Ignored moves do not notify.
        engine.submit(Player::Black, pos("C4"));
        assert!(rx.try_recv().is_err());
        assert!(engine.remove_listener(id));
        assert!(!engine.remove_listener(id));
        engine.submit(Player::White, pos("C3"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_undo_replays_history() {
        let engine = GameEngine::default();
        let initial = engine.state();
        engine.submit(Player::Black, pos("C4"));
        let after_one = engine.state();
        engine.submit(Player::White, pos("C3"));
        assert_eq!(engine.undo_move(1), 1);
        assert_eq!(engine.state(), after_one);
        assert_eq!(engine.undo_move(5), 1);
        assert_eq!(engine.state(), initial);
        assert_eq!(engine.undo_move(1), 0);
    }

    #[test]
    fn test_forced_pass_after_move() {
        // Row 1: white B1, black C1..G1. Column H: white H2, black H3.
        let mut board = Board::new();
        board.put_disc(pos("B1"), Player::White);
        for coord in ["C1", "D1", "E1", "F1", "G1", "H3"] {
            board.put_disc(pos(coord), Player::Black);
        }
        board.put_disc(pos("H2"), Player::White);
        let engine =
            GameEngine::with_state(State::new(board, Player::Black), EngineConfig::default());
        // H1 takes H2; the black row then runs into the edge, so white is stuck
        // while black can still take B1 from A1.
        assert!(engine.submit(Player::Black, pos("H1")));
        let state = engine.state();
        assert!(!state.has_moves(Player::White));
        assert!(state.is_move_possible(Player::Black, pos("A1")));
        assert_eq!(state.player(), Player::Black);
        assert_eq!(engine.undo_move(1), 1);
        assert_eq!(engine.state().player(), Player::Black);
    }

    #[test]
    fn test_reset_and_trigger() {
        let engine = GameEngine::default();
        let (tx, rx) = mpsc::channel();
        engine.add_listener(move |state| {
            let _ = tx.send(*state);
        });
        engine.submit(Player::Black, pos("C4"));
        engine.reset(State::initial());
        assert!(engine.moves().is_empty());
        engine.trigger_event();
        let received: Vec<State> = rx.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[2], State::initial());
    }
}
