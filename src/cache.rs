//! Depth-aware node cache shared by every branch of one search.
//!
//! Maps a [`State`] to the arena index of the deepest node searched for it so
//! far. Lookups take a shared lock; inserts take the exclusive lock. Inserts
//! commute (the deeper node always wins), so concurrent writers need no
//! further coordination.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::state::State;
use crate::tree::{Node, NodeId};

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: NodeId,
    depth: usize,
}

/// Concurrent memo table from states to searched nodes.
#[derive(Debug, Default)]
pub struct NodeCache {
    entries: RwLock<HashMap<State, Entry>>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a node for `state` searched to at least `min_depth` exists.
    pub fn has(&self, state: &State, min_depth: usize) -> bool {
        self.lookup(state, min_depth).is_some()
    }

    /// The cached node for `state`, whatever its depth.
    pub fn get(&self, state: &State) -> Option<NodeId> {
        self.entries.read().get(state).map(|entry| entry.id)
    }

    /// The cached node for `state` if it was searched to at least `min_depth`.
    pub fn lookup(&self, state: &State, min_depth: usize) -> Option<NodeId> {
        self.entries
            .read()
            .get(state)
            .filter(|entry| entry.depth >= min_depth)
            .map(|entry| entry.id)
    }

    /// Offer a node stored at `id`.
    ///
    /// Kept if no entry exists for its state, or if it was searched deeper
    /// than the current entry. Returns whether the node was stored.
    pub fn put(&self, id: NodeId, node: &Node) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(node.state()) {
            Some(entry) if entry.depth >= node.depth() => false,
            Some(entry) => {
                *entry = Entry {
                    id,
                    depth: node.depth(),
                };
                true
            }
            None => {
                entries.insert(
                    *node.state(),
                    Entry {
                        id,
                        depth: node.depth(),
                    },
                );
                true
            }
        }
    }

    /// Number of cached states.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateBuilder;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_put_and_get() {
        let cache = NodeCache::new();
        let state = State::initial();
        assert!(cache.get(&state).is_none());
        assert!(cache.put(NodeId::new(0), &Node::leaf(state, 0, 3)));
        assert_eq!(cache.get(&state), Some(NodeId::new(0)));
        assert!(cache.has(&state, 3));
        assert!(!cache.has(&state, 4));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shallower_put_is_ignored() {
        let cache = NodeCache::new();
        let state = State::initial();
        cache.put(NodeId::new(1), &Node::leaf(state, 10, 4));
        assert!(!cache.put(NodeId::new(2), &Node::leaf(state, 20, 2)));
        assert!(!cache.put(NodeId::new(3), &Node::leaf(state, 30, 4)));
        assert_eq!(cache.get(&state), Some(NodeId::new(1)));
        assert!(cache.put(NodeId::new(4), &Node::leaf(state, 40, 5)));
        assert_eq!(cache.get(&state), Some(NodeId::new(4)));
    }

    #[test]
    fn test_states_differ_by_player() {
        let cache = NodeCache::new();
        let state = State::initial();
        cache.put(NodeId::new(0), &Node::leaf(state, 0, 1));
        assert!(cache.get(&state.passed()).is_none());
    }

    #[test]
    fn test_concurrent_puts_keep_deepest() {
        let cache = Arc::new(NodeCache::new());
        let state = StateBuilder::new().play("C4").unwrap().build();
        let handles: Vec<_> = (0..8)
            .map(|depth| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.put(NodeId::new(depth), &Node::leaf(state, 0, depth));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.get(&state), Some(NodeId::new(7)));
    }
}
