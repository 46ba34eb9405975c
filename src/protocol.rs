//! Line-oriented text protocol.
//!
//! A GTP-style command loop for driving the engine from a script or a
//! front end. Each command is one line, optionally preceded by a numeric id;
//! each response is `=` (success) or `?` (failure), the echoed id, a space
//! and the response text, followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `list_commands`, `known_command <cmd>`
//! - `clear_board` - Start a new game from the standard position
//! - `play <color> <coord|pass>` - Play a move for a colour
//! - `genmove <color>` - Search, play and print a move for a colour
//! - `showboard` - Print the board and the side to move
//! - `undo` - Take back the last move
//! - `moves` - List the legal moves of the side to move
//! - `score` - Disc counts
//! - `quit` - Exit the loop

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::ai::{AiConfig, MoveChooser};
use crate::engine::{EngineConfig, GameEngine};
use crate::error::SearchError;
use crate::position::{Player, parse_coord};
use crate::state::State;
use crate::tree::CancelToken;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "genmove",
    "known_command",
    "list_commands",
    "moves",
    "name",
    "play",
    "quit",
    "score",
    "showboard",
    "undo",
    "version",
];

/// Protocol session: a game plus a move chooser for `genmove`.
pub struct TextProtocol {
    engine: GameEngine,
    chooser: MoveChooser,
    cancel: CancelToken,
}

impl Default for TextProtocol {
    fn default() -> Self {
        Self::new(&AiConfig::default())
    }
}

impl TextProtocol {
    /// A session whose `genmove` searches with `config`.
    pub fn new(config: &AiConfig) -> Self {
        Self {
            engine: GameEngine::new(EngineConfig::default()),
            chooser: MoveChooser::new(config),
            cancel: CancelToken::new(),
        }
    }

    pub fn state(&self) -> State {
        self.engine.state()
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric command id from the front of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute a command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        debug!(command, ?args, "protocol command");
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                Some(name) => {
                    let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                    (true, known.to_string())
                }
                None => (false, "missing argument".to_string()),
            },

            "quit" => (true, String::new()),

            "clear_board" => {
                self.engine.reset(State::initial());
                (true, String::new())
            }

            "play" => {
                let [color, vertex, ..] = args else {
                    return (false, "missing arguments".to_string());
                };
                let player = match color.parse::<Player>() {
                    Ok(player) => player,
                    Err(err) => return (false, err.to_string()),
                };
                if vertex.eq_ignore_ascii_case("pass") {
                    // Passes happen on their own; only a stuck side may claim one.
                    return if self.engine.state().has_moves(player) {
                        (false, "illegal move".to_string())
                    } else {
                        (true, String::new())
                    };
                }
                let position = match parse_coord(vertex) {
                    Ok(position) => position,
                    Err(err) => return (false, err.to_string()),
                };
                if self.engine.submit(player, position) {
                    (true, String::new())
                } else {
                    (false, "illegal move".to_string())
                }
            }

            "genmove" => {
                let player = match args.first().map(|color| color.parse::<Player>()) {
                    Some(Ok(player)) => player,
                    Some(Err(err)) => return (false, err.to_string()),
                    None => return (false, "missing argument".to_string()),
                };
                let state = self.engine.state();
                if !state.has_moves(player) {
                    return (true, "pass".to_string());
                }
                if state.player() != player {
                    return (false, format!("{player} is not to move"));
                }
                match self.chooser.choose(state, &self.cancel) {
                    Ok(position) => {
                        self.engine.submit(player, position);
                        (true, position.to_string())
                    }
                    Err(SearchError::NoMoves) => (true, "pass".to_string()),
                    Err(err) => (false, err.to_string()),
                }
            }

            "showboard" => {
                let state = self.engine.state();
                (true, format!("\n{state}"))
            }

            "undo" => {
                if self.engine.undo_move(1) == 1 {
                    (true, String::new())
                } else {
                    (false, "cannot undo".to_string())
                }
            }

            "moves" => {
                let moves: Vec<String> = self
                    .engine
                    .state()
                    .moves()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                (true, moves.join(" "))
            }

            "score" => {
                let state = self.engine.state();
                let board = state.board();
                (
                    true,
                    format!(
                        "white {} black {}",
                        board.count(Player::White),
                        board.count(Player::Black)
                    ),
                )
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}
