//! Opening library.
//!
//! A small table of known-good replies for early-game states. Each named
//! opening line is recorded as played and under the three other symmetries
//! of the standard start position:
//! - mirror: point reflection through the board center
//! - diagonal: reflection across the A1-H8 diagonal
//! - combined: diagonal reflection of the mirrored line
//!
//! The table is built once on first use and is read-only afterwards, so
//! concurrent lookups need no locking.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::trace;

use crate::position::Position;
use crate::state::{State, StateBuilder};

/// Opening lines from the standard start, as space-separated moves.
const OPENING_LINES: &[&str] = &["C4 C3 D3 C5 B4", "C4 C5", "C4 E3 F4 C5"];

/// Identity followed by the three symmetries of the start position.
const SYMMETRIES: [fn(Position) -> Position; 4] = [
    identity,
    Position::mirrored,
    Position::transposed,
    mirrored_transposed,
];

fn identity(position: Position) -> Position {
    position
}

fn mirrored_transposed(position: Position) -> Position {
    position.mirrored().transposed()
}

/// Static storage for the opening table.
static OPENINGS: OnceLock<MoveLibrary> = OnceLock::new();

/// The opening library, built on first use.
pub fn openings() -> &'static MoveLibrary {
    OPENINGS.get_or_init(build_openings)
}

fn build_openings() -> MoveLibrary {
    let mut library = MoveLibrary::default();
    let initial = State::initial();
    for line in OPENING_LINES {
        let chain: Vec<Position> = line
            .split_whitespace()
            .filter_map(|coord| coord.parse().ok())
            .collect();
        library.add_moves(initial, &chain, true);
    }
    trace!(states = library.len(), "opening library built");
    library
}

/// Table mapping states to candidate replies.
#[derive(Debug, Clone, Default)]
pub struct MoveLibrary {
    library: HashMap<State, Vec<Position>>,
}

impl MoveLibrary {
    /// Record every move of `chain` against the state it is played from.
    ///
    /// With `mirroring`, the three symmetric images of the line are recorded
    /// as well.
    pub fn add_moves(&mut self, state: State, chain: &[Position], mirroring: bool) {
        let transforms = if mirroring {
            &SYMMETRIES[..]
        } else {
            &SYMMETRIES[..1]
        };
        for transform in transforms {
            let mut builder = StateBuilder::from_state(state);
            for &mv in chain {
                let mv = transform(mv);
                self.add_move(builder.build(), mv);
                builder = builder.apply(mv);
            }
        }
    }

    /// Record a single reply, ignoring duplicates.
    pub fn add_move(&mut self, state: State, position: Position) {
        let replies = self.library.entry(state).or_default();
        if !replies.contains(&position) {
            replies.push(position);
        }
    }

    pub fn has_move(&self, state: &State) -> bool {
        self.library.contains_key(state)
    }

    /// All recorded replies for `state`.
    pub fn moves(&self, state: &State) -> &[Position] {
        self.library.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pick one recorded reply uniformly at random.
    pub fn get_move(&self, state: &State, rng: &mut fastrand::Rng) -> Option<Position> {
        let replies = self.moves(state);
        (!replies.is_empty()).then(|| replies[rng.usize(..replies.len())])
    }

    /// Number of states with at least one reply.
    pub fn len(&self) -> usize {
        self.library.len()
    }

    pub fn is_empty(&self) -> bool {
        self.library.is_empty()
    }
}
