//! Game tree search: negamax with alpha-beta pruning.
//!
//! Nodes live in an [`Arena`] and refer to their children by [`NodeId`]. A
//! node is allocated only once it is fully searched, so arena entries never
//! change after insertion and the same node may be shared by several parents
//! through the [`NodeCache`].
//!
//! Metrics are negamax values: positive is good for the side to move at that
//! node. A leaf scores `sign(mover) * strategy(state)`.
//!
//! The node being built (the root) can fan its children out to a
//! [`FixedThreadPool`]; everything below a pool task runs sequentially.
//! With a random source, the root searches every child with the full window
//! and picks uniformly among the tied best moves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use tracing::debug;

use crate::cache::NodeCache;
use crate::constants::{ALPHA_MIN, BETA_MAX};
use crate::error::SearchError;
use crate::eval::Strategy;
use crate::position::Position;
use crate::state::State;
use crate::threads::FixedThreadPool;

/// A move leading to a child; `None` marks a forced pass.
pub type Move = Option<Position>;

/// A child reference: the move played and the resulting node.
pub type ChildNode = (Move, NodeId);

/// Index of a node in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A searched position.
#[derive(Debug, Clone)]
pub struct Node {
    state: State,
    metric: i32,
    depth: usize,
    children: Vec<ChildNode>,
    optimal: Option<usize>,
}

impl Node {
    /// A node evaluated directly, without children.
    pub(crate) fn leaf(state: State, metric: i32, depth: usize) -> Self {
        Self {
            state,
            metric,
            depth,
            children: Vec::new(),
            optimal: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Negamax value from the point of view of this node's mover.
    #[inline]
    pub fn metric(&self) -> i32 {
        self.metric
    }

    /// Depth this node was searched to.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Children in the order they were searched.
    #[inline]
    pub fn children(&self) -> &[ChildNode] {
        &self.children
    }

    /// The child with the best metric, if any child exists.
    #[inline]
    pub fn optimal_child(&self) -> Option<ChildNode> {
        self.optimal.map(|index| self.children[index])
    }

    /// Whether the node was evaluated without expanding children.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

/// Append-only node storage shared by every branch of one search.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: RwLock<Vec<Node>>,
}

impl Arena {
    fn alloc(&self, node: Node) -> NodeId {
        let mut nodes = self.nodes.write();
        nodes.push(node);
        NodeId::new(nodes.len() - 1)
    }

    /// Borrow a node.
    ///
    /// # Panics
    /// If `id` was not allocated by this arena.
    pub fn get(&self, id: NodeId) -> MappedRwLockReadGuard<'_, Node> {
        RwLockReadGuard::map(self.nodes.read(), |nodes| &nodes[id.0])
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

/// Cooperative cancellation flag checked at every node.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    fn check(&self) -> Result<(), SearchError> {
        if self.is_cancelled() {
            Err(SearchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Optional knobs for [`Tree::build`].
#[derive(Default)]
pub struct BuildOptions<'a> {
    /// Search the root's children on this pool.
    pub pool: Option<&'a FixedThreadPool>,
    /// Pick uniformly among equally good root moves.
    pub rng: Option<&'a mut fastrand::Rng>,
    /// Share results between branches through a fresh [`NodeCache`].
    pub use_cache: bool,
    /// Abort the search when cancelled.
    pub cancel: Option<CancelToken>,
}

/// A search tree rooted at a state.
pub struct Tree {
    state: State,
    arena: Arc<Arena>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new(state: State) -> Self {
        Self {
            state,
            arena: Arc::new(Arena::default()),
            root: None,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Root node of the last build.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Borrow a node of the last build.
    pub fn node(&self, id: NodeId) -> MappedRwLockReadGuard<'_, Node> {
        self.arena.get(id)
    }

    /// Number of nodes allocated by the last build.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Search `depth` plies and return the root's optimal child.
    ///
    /// Returns `Ok(None)` when the root has no children (depth 0 or game
    /// over). A pass child carries a `None` move.
    pub fn build(
        &mut self,
        depth: usize,
        strategy: &Strategy,
        options: BuildOptions<'_>,
    ) -> Result<Option<ChildNode>, SearchError> {
        let started = Instant::now();
        self.arena = Arc::new(Arena::default());
        self.root = None;
        let searcher = Searcher {
            arena: Arc::clone(&self.arena),
            strategy: strategy.clone(),
            cache: options.use_cache.then(|| Arc::new(NodeCache::new())),
            cancel: options.cancel.unwrap_or_default(),
        };
        let root = searcher.build_root(self.state, depth, options.pool, options.rng)?;
        self.root = Some(root);
        let nodes = self.arena.len();
        let node = self.arena.get(root);
        debug!(
            depth,
            nodes,
            metric = node.metric(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "search finished"
        );
        Ok(node.optimal_child())
    }

    /// Text dump of the searched tree, one child per line, indented by depth.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            let node = self.arena.get(root);
            if let Some((mv, _)) = node.optimal_child() {
                out.push_str(&dump_line(mv, node.metric()));
            }
            drop(node);
            self.dump_children(&mut out, root, "\t");
        }
        out
    }

    fn dump_children(&self, out: &mut String, id: NodeId, prefix: &str) {
        let children = self.arena.get(id).children().to_vec();
        for (mv, child) in children {
            out.push_str(prefix);
            out.push_str(&dump_line(mv, self.arena.get(child).metric()));
            self.dump_children(out, child, &format!("{prefix}\t"));
        }
    }
}

/// `"C4 12\n"`, or just the metric for a pass.
fn dump_line(mv: Move, metric: i32) -> String {
    match mv {
        Some(position) => format!("{position} {metric}\n"),
        None => format!("{metric}\n"),
    }
}

/// Search `depth` plies from `state` and return the best move.
///
/// # Errors
/// `SearchError::NoMoves` when the side to move must pass or the game is over.
pub fn best_move(
    state: State,
    depth: usize,
    strategy: &Strategy,
    options: BuildOptions<'_>,
) -> Result<Position, SearchError> {
    if state.moves().is_empty() {
        return Err(SearchError::NoMoves);
    }
    let mut tree = Tree::new(state);
    // Depth 0 would leave the root unexpanded.
    match tree.build(depth.max(1), strategy, options)? {
        Some((Some(position), _)) => Ok(position),
        _ => Err(SearchError::NoMoves),
    }
}

/// Shared, cloneable search context handed to pool tasks.
#[derive(Clone)]
struct Searcher {
    arena: Arc<Arena>,
    strategy: Strategy,
    cache: Option<Arc<NodeCache>>,
    cancel: CancelToken,
}

impl Searcher {
    /// Expand the root, optionally on the pool and with a randomized pick.
    fn build_root(
        &self,
        state: State,
        depth: usize,
        pool: Option<&FixedThreadPool>,
        rng: Option<&mut fastrand::Rng>,
    ) -> Result<NodeId, SearchError> {
        self.cancel.check()?;
        let moves = state.moves();
        if depth == 0 || moves.is_empty() {
            return Ok(self.traverse(state, depth, ALPHA_MIN, BETA_MAX, false)?.1);
        }

        // Tie-breaking needs exact values for every root child.
        let full_width = rng.is_some();
        let beta = BETA_MAX;
        let mut alpha = ALPHA_MIN;
        let mut children = Vec::with_capacity(moves.len());
        let mut values = Vec::with_capacity(moves.len());

        match pool {
            Some(pool) => {
                let handles: Vec<_> = moves
                    .iter()
                    .map(|&position| {
                        let searcher = self.clone();
                        let child = state.after(position);
                        pool.submit(move || searcher.child(child, depth - 1, -beta, -alpha))
                    })
                    .collect();
                for (&position, handle) in moves.iter().zip(handles) {
                    let (child_metric, id) = handle.join()??;
                    values.push(-child_metric);
                    children.push((Some(position), id));
                    alpha = alpha.max(-child_metric);
                    if !full_width && alpha >= beta {
                        break;
                    }
                }
            }
            None => {
                for &position in &moves {
                    let window = if full_width { ALPHA_MIN } else { alpha };
                    let (child_metric, id) =
                        self.child(state.after(position), depth - 1, -beta, -window)?;
                    values.push(-child_metric);
                    children.push((Some(position), id));
                    alpha = alpha.max(-child_metric);
                    if !full_width && alpha >= beta {
                        break;
                    }
                }
            }
        }

        let metric = values.iter().copied().max().unwrap_or(i32::MIN);
        let optimal = match rng {
            Some(rng) => {
                let tied: Vec<usize> = (0..values.len()).filter(|&i| values[i] == metric).collect();
                (!tied.is_empty()).then(|| tied[rng.usize(..tied.len())])
            }
            None => values.iter().position(|&value| value == metric),
        };
        let node = Node {
            state,
            metric,
            depth,
            children,
            optimal,
        };
        Ok(self.finish(node, ALPHA_MIN, BETA_MAX).1)
    }

    /// Reuse a cached node deep enough for `depth`, or search a new one.
    fn child(
        &self,
        state: State,
        depth: usize,
        alpha: i32,
        beta: i32,
    ) -> Result<(i32, NodeId), SearchError> {
        if let Some(id) = self.cache.as_ref().and_then(|cache| cache.lookup(&state, depth)) {
            return Ok((self.arena.get(id).metric(), id));
        }
        self.traverse(state, depth, alpha, beta, false)
    }

    /// Sequential negamax over `state`.
    fn traverse(
        &self,
        state: State,
        depth: usize,
        mut alpha: i32,
        beta: i32,
        abort_on_no_moves: bool,
    ) -> Result<(i32, NodeId), SearchError> {
        self.cancel.check()?;
        if depth == 0 {
            return Ok(self.leaf(state, depth));
        }
        let moves = state.moves();
        if moves.is_empty() {
            return self.no_moves(state, depth, alpha, beta, abort_on_no_moves);
        }

        let alpha_orig = alpha;
        let mut metric = i32::MIN;
        let mut optimal = None;
        let mut children = Vec::with_capacity(moves.len());
        for position in moves {
            let (child_metric, id) = self.child(state.after(position), depth - 1, -beta, -alpha)?;
            if -child_metric > metric {
                metric = -child_metric;
                optimal = Some(children.len());
            }
            children.push((Some(position), id));
            alpha = alpha.max(metric);
            if alpha >= beta {
                break;
            }
        }
        let node = Node {
            state,
            metric,
            depth,
            children,
            optimal,
        };
        Ok(self.finish(node, alpha_orig, beta))
    }

    /// The mover has no legal move: pass, or evaluate if the game is over.
    fn no_moves(
        &self,
        state: State,
        depth: usize,
        alpha: i32,
        beta: i32,
        abort_on_no_moves: bool,
    ) -> Result<(i32, NodeId), SearchError> {
        if abort_on_no_moves || !state.has_moves(state.player().opponent()) {
            return Ok(self.leaf(state, depth));
        }
        // The pass child must not pass again.
        let (child_metric, id) = self.traverse(state.passed(), depth - 1, -beta, -alpha, true)?;
        let node = Node {
            state,
            metric: -child_metric,
            depth,
            children: vec![(None, id)],
            optimal: Some(0),
        };
        Ok(self.finish(node, alpha, beta))
    }

    /// Evaluate `state` from its mover's point of view.
    fn leaf(&self, state: State, depth: usize) -> (i32, NodeId) {
        let player = state.player();
        let metric = player.sign() * self.strategy.evaluate(player, &state);
        let node = Node::leaf(state, metric, depth);
        self.store(node, true)
    }

    /// Allocate an expanded node; only values strictly inside the window are
    /// exact and may be cached.
    fn finish(&self, node: Node, alpha: i32, beta: i32) -> (i32, NodeId) {
        let exact = node.metric > alpha && node.metric < beta;
        self.store(node, exact)
    }

    fn store(&self, node: Node, cacheable: bool) -> (i32, NodeId) {
        let metric = node.metric;
        let id = self.arena.alloc(node);
        if let Some(cache) = self.cache.as_ref().filter(|_| cacheable) {
            cache.put(id, &self.arena.get(id));
        }
        (metric, id)
    }
}
