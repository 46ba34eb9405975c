//! Computer player.
//!
//! [`MoveChooser`] picks a move for a state: an opening-book reply when one
//! is known, a tree search otherwise. [`AiPlayer`] runs a chooser on its own
//! thread and plays for one colour of a [`GameEngine`], reacting to the
//! engine's state notifications.
//!
//! The player thread owns its thread pool and random source. Dropping the
//! [`AiPlayer`] unregisters it from the engine, cancels any running search
//! and joins the thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::constants::DEFAULT_DEPTH;
use crate::engine::{GameEngine, ListenerId, PlayerMove};
use crate::error::SearchError;
use crate::eval::Strategy;
use crate::library::openings;
use crate::position::{Player, Position};
use crate::state::State;
use crate::threads::{FixedThreadPool, default_thread_count};
use crate::tree::{BuildOptions, CancelToken, best_move};

/// Settings for a computer player.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Colour played.
    pub player: Player,
    /// Search depth in plies.
    pub depth: usize,
    /// Only move when asked through [`AiPlayer::make_move`].
    pub wait: bool,
    /// Pick at random among equally good moves.
    pub randomized: bool,
    /// Play the worst move instead of the best.
    pub reversed: bool,
    /// Consult the opening library first.
    pub use_openings: bool,
    /// Worker threads of the private search pool.
    pub threads: usize,
    /// Seed for the random source; random when unset.
    pub seed: Option<u64>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            player: Player::White,
            depth: DEFAULT_DEPTH,
            wait: false,
            randomized: true,
            reversed: false,
            use_openings: true,
            threads: default_thread_count(),
            seed: None,
        }
    }
}

impl AiConfig {
    pub fn for_player(player: Player) -> Self {
        Self {
            player,
            ..Self::default()
        }
    }
}

/// Synchronous move selection with a private pool and random source.
pub struct MoveChooser {
    depth: usize,
    randomized: bool,
    reversed: bool,
    use_openings: bool,
    pool: FixedThreadPool,
    rng: fastrand::Rng,
}

impl MoveChooser {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            depth: config.depth,
            randomized: config.randomized,
            reversed: config.reversed,
            use_openings: config.use_openings,
            pool: FixedThreadPool::new(config.threads),
            rng: config
                .seed
                .map(fastrand::Rng::with_seed)
                .unwrap_or_else(fastrand::Rng::new),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    pub fn set_randomized(&mut self, randomized: bool) {
        self.randomized = randomized;
    }

    /// Choose a move for the side to move in `state`.
    ///
    /// # Errors
    /// `NoMoves` when the side to move has to pass, `Cancelled` when `cancel`
    /// fires during the search.
    pub fn choose(&mut self, state: State, cancel: &CancelToken) -> Result<Position, SearchError> {
        if self.use_openings && !self.reversed {
            if let Some(position) = openings().get_move(&state, &mut self.rng) {
                debug!(player = %state.player(), %position, "opening book move");
                return Ok(position);
            }
        }
        let strategy = if self.reversed {
            Strategy::reversed()
        } else {
            Strategy::standard()
        };
        let started = Instant::now();
        let options = BuildOptions {
            pool: Some(&self.pool),
            rng: self.randomized.then_some(&mut self.rng),
            use_cache: true,
            cancel: Some(cancel.clone()),
        };
        let position = best_move(state, self.depth, &strategy, options)?;
        info!(
            player = %state.player(),
            %position,
            depth = self.depth,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search move"
        );
        Ok(position)
    }
}

enum Command {
    StateChanged(State),
    Trigger,
    Shutdown,
}

/// A computer player attached to a [`GameEngine`].
pub struct AiPlayer {
    player: Player,
    engine: Arc<GameEngine>,
    listener: ListenerId,
    tx: Sender<Command>,
    depth: Arc<AtomicUsize>,
    randomized: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
}

impl AiPlayer {
    /// Start the player thread and subscribe it to `engine`.
    ///
    /// The player does not look at the current state until the next
    /// notification; call [`GameEngine::trigger_event`] to start a game where
    /// the computer moves first.
    pub fn spawn(engine: Arc<GameEngine>, config: AiConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let listener = {
            let tx = tx.clone();
            engine.add_listener(move |state| {
                let _ = tx.send(Command::StateChanged(*state));
            })
        };
        let task = Task {
            player: config.player,
            wait: config.wait,
            engine: Arc::clone(&engine),
            depth: Arc::new(AtomicUsize::new(config.depth)),
            randomized: Arc::new(AtomicBool::new(config.randomized)),
            active: Arc::new(AtomicBool::new(false)),
            cancel: CancelToken::new(),
        };
        let depth = Arc::clone(&task.depth);
        let randomized = Arc::clone(&task.randomized);
        let active = Arc::clone(&task.active);
        let cancel = task.cancel.clone();
        let chooser = MoveChooser::new(&config);
        let worker = thread::spawn(move || task.run(rx, chooser));
        info!(player = %config.player, depth = config.depth, "computer player started");
        Self {
            player: config.player,
            engine,
            listener,
            tx,
            depth,
            randomized,
            active,
            cancel,
            worker: Some(worker),
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    /// Search depth, used from the next search on.
    pub fn difficulty(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    pub fn set_difficulty(&self, depth: usize) {
        self.depth.store(depth, Ordering::Relaxed);
    }

    pub fn is_randomized(&self) -> bool {
        self.randomized.load(Ordering::Relaxed)
    }

    pub fn set_randomized(&self, randomized: bool) {
        self.randomized.store(randomized, Ordering::Relaxed);
    }

    /// Whether a move is being computed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Ask for a move on the current state, whatever the `wait` setting.
    pub fn make_move(&self) {
        let _ = self.tx.send(Command::Trigger);
    }
}

impl Drop for AiPlayer {
    fn drop(&mut self) {
        self.engine.remove_listener(self.listener);
        self.cancel.cancel();
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(player = %self.player, "computer player thread panicked");
            }
        }
        debug!(player = %self.player, "computer player stopped");
    }
}

/// State owned by the player thread.
struct Task {
    player: Player,
    wait: bool,
    engine: Arc<GameEngine>,
    depth: Arc<AtomicUsize>,
    randomized: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    cancel: CancelToken,
}

impl Task {
    fn run(self, rx: Receiver<Command>, mut chooser: MoveChooser) {
        while let Ok(command) = rx.recv() {
            let state = match command {
                Command::StateChanged(state) if !self.wait => state,
                Command::StateChanged(_) => continue,
                Command::Trigger => self.engine.state(),
                Command::Shutdown => break,
            };
            // Skip notifications overtaken by later moves or undos.
            if state.player() != self.player || state != self.engine.state() {
                continue;
            }
            self.active.store(true, Ordering::Release);
            chooser.set_depth(self.depth.load(Ordering::Relaxed));
            chooser.set_randomized(self.randomized.load(Ordering::Relaxed));
            let result = chooser.choose(state, &self.cancel);
            self.active.store(false, Ordering::Release);
            match result {
                Ok(position) => {
                    self.engine.receive_move(PlayerMove::new(self.player, position));
                }
                Err(SearchError::Cancelled) => break,
                Err(SearchError::NoMoves) => debug!(player = %self.player, "no move to play"),
                Err(err) => warn!(player = %self.player, %err, "search failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::position::parse_coord;
    use std::time::Duration;

    fn config(player: Player) -> AiConfig {
        AiConfig {
            player,
            depth: 2,
            threads: 2,
            seed: Some(7),
            ..AiConfig::default()
        }
    }

    fn wait_for_move(rx: &Receiver<State>, player: Player) -> State {
        loop {
            let state = rx
                .recv_timeout(Duration::from_secs(30))
                .expect("no move from the computer player");
            if state.player() != player {
                return state;
            }
        }
    }

    #[test]
    fn test_chooser_uses_openings() {
        let mut chooser = MoveChooser::new(&config(Player::Black));
        let position = chooser.choose(State::initial(), &CancelToken::new()).unwrap();
        let replies = openings().moves(&State::initial());
        assert!(replies.contains(&position));
    }

    #[test]
    fn test_chooser_reports_no_moves() {
        let mut chooser = MoveChooser::new(&AiConfig {
            use_openings: false,
            ..config(Player::White)
        });
        let state = State::new(crate::board::Board::new(), Player::White);
        assert_eq!(
            chooser.choose(state, &CancelToken::new()),
            Err(SearchError::NoMoves)
        );
    }

    #[test]
    fn test_chooser_cancelled() {
        let mut chooser = MoveChooser::new(&AiConfig {
            use_openings: false,
            ..config(Player::Black)
        });
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            chooser.choose(State::initial(), &cancel),
            Err(SearchError::Cancelled)
        );
    }

    #[test]
    fn test_player_answers_move() {
        let engine = Arc::new(GameEngine::new(EngineConfig::default()));
        let (tx, rx) = mpsc::channel();
        engine.add_listener(move |state| {
            let _ = tx.send(*state);
        });
        let ai = AiPlayer::spawn(Arc::clone(&engine), config(Player::White));
        assert!(engine.submit(Player::Black, parse_coord("C4").unwrap()));
        let _ = wait_for_move(&rx, Player::Black);
        let state = wait_for_move(&rx, Player::White);
        assert_eq!(state.player(), Player::Black);
        assert_eq!(engine.moves().len(), 2);
        assert_eq!(engine.moves()[1].player, Player::White);
        drop(ai);
    }

    #[test]
    fn test_wait_mode_needs_trigger() {
        let engine = Arc::new(GameEngine::new(EngineConfig::default()));
        let (tx, rx) = mpsc::channel();
        engine.add_listener(move |state| {
            let _ = tx.send(*state);
        });
        let ai = AiPlayer::spawn(
            Arc::clone(&engine),
            AiConfig {
                wait: true,
                ..config(Player::Black)
            },
        );
        engine.trigger_event();
        let _ = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(engine.moves().is_empty());
        ai.make_move();
        let state = wait_for_move(&rx, Player::Black);
        assert_eq!(state.player(), Player::White);
    }

    #[test]
    fn test_settings() {
        let engine = Arc::new(GameEngine::default());
        let ai = AiPlayer::spawn(Arc::clone(&engine), config(Player::White));
        assert_eq!(ai.player(), Player::White);
        assert_eq!(ai.difficulty(), 2);
        ai.set_difficulty(4);
        assert_eq!(ai.difficulty(), 4);
        assert!(ai.is_randomized());
        ai.set_randomized(false);
        assert!(!ai.is_randomized());
        assert!(!ai.is_active());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let engine = Arc::new(GameEngine::default());
        let ai = AiPlayer::spawn(Arc::clone(&engine), config(Player::White));
        drop(ai);
        assert!(engine.submit(Player::Black, parse_coord("C4").unwrap()));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(engine.moves().len(), 1);
    }
}
