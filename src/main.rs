//! Reversi-Engine: an Othello/Reversi decision engine.
//!
//! ## Usage
//!
//! - `reversi-engine` - Show a demo
//! - `reversi-engine demo` - Search a few plies from the start position
//! - `reversi-engine selfplay` - Let two computer players finish a game
//! - `reversi-engine text` - Start the line protocol on stdin/stdout

use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reversi_engine::ai::{AiConfig, AiPlayer};
use reversi_engine::constants::DEFAULT_DEPTH;
use reversi_engine::engine::{EngineConfig, GameEngine};
use reversi_engine::eval::Strategy;
use reversi_engine::position::Player;
use reversi_engine::protocol::TextProtocol;
use reversi_engine::state::State;
use reversi_engine::threads::{FixedThreadPool, default_thread_count};
use reversi_engine::tree::{BuildOptions, Tree};

/// Reversi-Engine: alpha-beta Othello engine
#[derive(Parser)]
#[command(name = "reversi-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. `debug` or `reversi_engine=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a few plies from the start position and print the result
    Demo {
        /// Number of plies to play
        #[arg(long, default_value_t = 6)]
        plies: usize,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Play a full game between two computer players
    Selfplay {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Start the line-oriented text protocol on stdin/stdout
    Text {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args, Clone)]
struct SearchArgs {
    /// Search depth in plies
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    depth: usize,
    /// Seed for the random source
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads per search pool
    #[arg(long, default_value_t = default_thread_count())]
    threads: usize,
    /// Pick at random among equally good moves
    #[arg(long)]
    randomize: bool,
}

impl Default for SearchArgs {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            seed: None,
            threads: default_thread_count(),
            randomize: false,
        }
    }
}

impl SearchArgs {
    fn ai_config(&self, player: Player) -> AiConfig {
        AiConfig {
            depth: self.depth,
            randomized: self.randomize,
            threads: self.threads,
            seed: self.seed,
            ..AiConfig::for_player(player)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Some(Commands::Demo { plies, search }) => run_demo(plies, &search),
        Some(Commands::Selfplay { search }) => run_selfplay(&search),
        Some(Commands::Text { search }) => {
            let mut protocol = TextProtocol::new(&search.ai_config(Player::White));
            protocol
                .run(io::stdin().lock(), io::stdout().lock())
                .context("text protocol I/O failed")
        }
        None => run_demo(6, &SearchArgs::default()),
    }
}

/// Logs go to stderr so they never mix with protocol output.
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn run_demo(plies: usize, search: &SearchArgs) -> Result<()> {
    println!("Reversi-Engine: alpha-beta Othello engine\n");

    let pool = FixedThreadPool::new(search.threads);
    let mut rng = search
        .seed
        .map(fastrand::Rng::with_seed)
        .unwrap_or_else(fastrand::Rng::new);
    let strategy = Strategy::standard();
    let mut state = State::initial();
    println!("{state}");

    for _ in 0..plies {
        if state.is_game_finished() {
            break;
        }
        let started = Instant::now();
        let mut tree = Tree::new(state);
        let best = tree.build(
            search.depth.max(1),
            &strategy,
            BuildOptions {
                pool: Some(&pool),
                rng: search.randomize.then_some(&mut rng),
                use_cache: true,
                cancel: None,
            },
        )?;
        let metric = tree.root().map(|root| tree.node(root).metric());
        match best {
            Some((Some(position), _)) => {
                println!(
                    "{} plays {position} (metric {}, {} nodes, {:.1?})",
                    state.player(),
                    metric.unwrap_or_default(),
                    tree.node_count(),
                    started.elapsed()
                );
                state.apply(position);
            }
            _ => {
                println!("{} passes", state.player());
                state.next();
            }
        }
    }

    println!("\n{state}");
    Ok(())
}

fn run_selfplay(search: &SearchArgs) -> Result<()> {
    let engine = Arc::new(GameEngine::new(EngineConfig {
        track_metrics: true,
    }));
    let (tx, rx) = mpsc::channel();
    engine.add_listener(move |state| {
        let _ = tx.send(*state);
    });

    let mut white = search.ai_config(Player::White);
    // Distinct random streams for the two sides.
    white.seed = search.seed.map(|seed| seed.wrapping_add(1));
    let _black = AiPlayer::spawn(Arc::clone(&engine), search.ai_config(Player::Black));
    let _white = AiPlayer::spawn(Arc::clone(&engine), white);

    let started = Instant::now();
    engine.trigger_event();
    let state = loop {
        let state = rx
            .recv_timeout(Duration::from_secs(600))
            .context("computer players stopped responding")?;
        if state.is_game_finished() {
            break state;
        }
    };

    let white_discs = state.board().count(Player::White);
    let black_discs = state.board().count(Player::Black);
    info!(
        moves = engine.moves().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "self-play finished"
    );
    println!("{state}");
    println!("White {white_discs} - Black {black_discs}");
    match white_discs.cmp(&black_discs) {
        std::cmp::Ordering::Greater => println!("White wins"),
        std::cmp::Ordering::Less => println!("Black wins"),
        std::cmp::Ordering::Equal => println!("Draw"),
    }
    Ok(())
}
