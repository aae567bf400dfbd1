//! Many-to-many shortest path matrices over a contraction hierarchy.
//!
//! One backward search per distinct destination node deposits partial path
//! summaries ("buckets") along the way, then one forward search per distinct
//! origin node closes complete paths against those buckets. Both phases run
//! a Dijkstra restricted by the level filter, so each search only explores
//! the upward corridor of the hierarchy instead of the full graph.
//!
//! A `Server` computes exactly one matrix and is discarded afterwards. The
//! graph it runs on is only read, so any number of servers may run
//! concurrently on the same graph, each on its own thread.

use super::*;
use crate::datastr::{index_heap::*, timestamped_vector::TimestampedVector};
use crate::report;
use crate::report::*;
use crate::util::in_range_option::InRangeOption;
use std::collections::HashMap;
use std::{error::Error, fmt, fmt::Display};

mod backward;
mod forward;
mod matrix;
mod traversal;

pub use matrix::{BucketEntry, DistanceMatrix};
pub use traversal::{EdgeTraversal, NodeTraversal, Traversal, TraversalId};

use matrix::{MatrixLabel, State};

/// Failures of matrix computations. Everything here is either a
/// configuration error surfaced at construction or caller misuse;
/// running out of the visited node budget is deliberately not an error,
/// it just leaves matrix cells unreached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Edge based traversal requested on a graph built without turn cost support.
    EdgeBasedRequiresTurnCosts,
    /// Node based traversal requested on a graph carrying turn costs.
    NodeBasedOnTurnCostGraph,
    /// Unsupported algorithm name.
    UnknownAlgorithm(String),
    /// The computation was invoked a second time on the same server.
    AlreadyRun,
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatrixError::EdgeBasedRequiresTurnCosts => f.write_str("edge based traversal requires a graph with turn cost support"),
            MatrixError::NodeBasedOnTurnCostGraph => f.write_str("node based traversal cannot run on a graph with turn costs"),
            MatrixError::UnknownAlgorithm(name) => write!(f, "unsupported matrix algorithm: {}", name),
            MatrixError::AlreadyRun => f.write_str("a matrix server computes exactly one matrix, create a new instance per request"),
        }
    }
}

impl Error for MatrixError {}

/// Which traversal semantics to run the matrix computation with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    NodeBased,
    EdgeBased,
}

impl TraversalMode {
    pub fn from_name(name: &str) -> Result<TraversalMode, MatrixError> {
        match name {
            "many_to_many_node" => Ok(TraversalMode::NodeBased),
            "many_to_many_edge" => Ok(TraversalMode::EdgeBased),
            _ => Err(MatrixError::UnknownAlgorithm(name.to_string())),
        }
    }
}

/// Decides whether hierarchical search may relax an arc out of `base`.
/// Virtual nodes live outside the hierarchy and shortcuts pointing down
/// are disconnected anyway, so both are always accepted; everything else
/// must not descend in level.
pub fn level_edge_filter(graph: &ChGraph, base: NodeId, link: &ChLink) -> bool {
    if graph.is_virtual_node(base) || graph.is_virtual_node(link.adj) {
        return true;
    }
    if link.shortcut {
        return true;
    }
    graph.level(base) <= graph.level(link.adj)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    BackwardRunning,
    ForwardRunning,
    Done,
}

/// A single use many-to-many matrix computation, generic over the traversal
/// identity strategy. Use `MatrixServer` unless the mode is statically known.
pub struct Server<'a, T: Traversal> {
    graph: &'a ChGraph,
    ops: T,

    queue: IndexdMinHeap<State>,
    labels: TimestampedVector<MatrixLabel>,
    settled: TimestampedVector<bool>,
    buckets: Vec<Vec<BucketEntry>>,
    tentative_weights: TimestampedVector<Weight>,

    phase: Phase,
    max_visited_nodes: usize,
    visited_nodes: usize,
}

impl<'a> Server<'a, NodeTraversal> {
    /// Node based matrix server. Fails on graphs carrying turn costs,
    /// which node based traversal would silently ignore.
    pub fn node_based(graph: &'a ChGraph) -> Result<Server<'a, NodeTraversal>, MatrixError> {
        if graph.has_turn_costs() {
            return Err(MatrixError::NodeBasedOnTurnCostGraph);
        }
        Ok(Server::with_ops(graph))
    }
}

impl<'a> Server<'a, EdgeTraversal> {
    /// Edge based matrix server. Fails on graphs built without turn cost
    /// support, since their arcs carry no original edge information.
    pub fn edge_based(graph: &'a ChGraph) -> Result<Server<'a, EdgeTraversal>, MatrixError> {
        if !graph.has_turn_costs() {
            return Err(MatrixError::EdgeBasedRequiresTurnCosts);
        }
        Ok(Server::with_ops(graph))
    }
}

impl<'a, T: Traversal> Server<'a, T> {
    fn with_ops(graph: &'a ChGraph) -> Server<'a, T> {
        let num_ids = T::num_ids(graph);
        Server {
            graph,
            ops: Default::default(),
            queue: IndexdMinHeap::new(num_ids),
            labels: TimestampedVector::new(num_ids, MatrixLabel::unreached()),
            settled: TimestampedVector::new(num_ids, false),
            buckets: vec![Vec::new(); graph.num_nodes()],
            tentative_weights: TimestampedVector::new(graph.num_nodes(), INFINITY),
            phase: Phase::Fresh,
            max_visited_nodes: usize::MAX,
            visited_nodes: 0,
        }
    }

    /// Cap the total number of node settlings across the entire computation,
    /// backward and forward phases combined. Searches just stop expanding
    /// once the budget is exhausted, leaving unclosed pairs unreached.
    pub fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        self.max_visited_nodes = max_visited_nodes;
    }

    /// Number of nodes settled so far. Diagnostic.
    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    /// Compute the full matrix between the given snapped locations.
    /// Consumes the single computation this server is good for; any further
    /// invocation fails with `MatrixError::AlreadyRun`.
    pub fn calc_matrix(&mut self, sources: &[Snap], targets: &[Snap]) -> Result<DistanceMatrix, MatrixError> {
        if self.phase != Phase::Fresh {
            return Err(MatrixError::AlreadyRun);
        }

        let mut matrix = DistanceMatrix::new(sources.len(), targets.len());

        // several locations may snap to the same node but each node is
        // searched at most once per phase
        self.phase = Phase::BackwardRunning;
        let mut target_indices: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (idx, snap) in targets.iter().enumerate() {
            let indices = target_indices.entry(snap.node).or_default();
            indices.push(idx);
            if indices.len() == 1 {
                self.backward_search(snap.node);
            }
        }

        self.phase = Phase::ForwardRunning;
        let mut distinct_sources: Vec<NodeId> = Vec::new();
        let mut source_indices: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (idx, snap) in sources.iter().enumerate() {
            let indices = source_indices.entry(snap.node).or_default();
            indices.push(idx);
            if indices.len() == 1 {
                distinct_sources.push(snap.node);
            }
        }
        for &source in &distinct_sources {
            self.forward_search(source, &source_indices[&source], &target_indices, &mut matrix);
        }

        self.phase = Phase::Done;
        report!("visited_nodes", self.visited_nodes);

        Ok(matrix)
    }

    /// Reset all per run state and enqueue the zero cost seed.
    fn seed_search(&mut self, node: NodeId) {
        self.queue.clear();
        self.labels.reset();
        self.settled.reset();

        // seeds use the plain node id, reserved in both id spaces
        let id = node as TraversalId;
        self.labels.set(id, MatrixLabel::seed(node));
        self.queue.push(State { key: 0, id });
    }

    /// Record an improved label in queue and label array.
    /// Returns false if the state was settled already - its bucket or matrix
    /// bookkeeping still happens, but it is not expanded a second time.
    fn improve(&mut self, id: TraversalId, label: MatrixLabel) -> bool {
        self.labels.set(id, label);
        if self.settled[id] {
            return false;
        }
        let state = State { key: label.weight, id };
        if self.queue.contains_index(id) {
            self.queue.decrease_key(state);
        } else {
            self.queue.push(state);
        }
        true
    }
}

/// A matrix server with the traversal mode selected at runtime,
/// e.g. from a request parameter.
pub enum MatrixServer<'a> {
    NodeBased(Server<'a, NodeTraversal>),
    EdgeBased(Server<'a, EdgeTraversal>),
}

impl<'a> MatrixServer<'a> {
    pub fn new(graph: &'a ChGraph, mode: TraversalMode) -> Result<MatrixServer<'a>, MatrixError> {
        match mode {
            TraversalMode::NodeBased => Server::node_based(graph).map(MatrixServer::NodeBased),
            TraversalMode::EdgeBased => Server::edge_based(graph).map(MatrixServer::EdgeBased),
        }
    }

    pub fn by_name(graph: &'a ChGraph, name: &str) -> Result<MatrixServer<'a>, MatrixError> {
        MatrixServer::new(graph, TraversalMode::from_name(name)?)
    }

    pub fn calc_matrix(&mut self, sources: &[Snap], targets: &[Snap]) -> Result<DistanceMatrix, MatrixError> {
        match self {
            MatrixServer::NodeBased(server) => server.calc_matrix(sources, targets),
            MatrixServer::EdgeBased(server) => server.calc_matrix(sources, targets),
        }
    }

    pub fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        match self {
            MatrixServer::NodeBased(server) => server.set_max_visited_nodes(max_visited_nodes),
            MatrixServer::EdgeBased(server) => server.set_max_visited_nodes(max_visited_nodes),
        }
    }

    pub fn visited_nodes(&self) -> usize {
        match self {
            MatrixServer::NodeBased(server) => server.visited_nodes(),
            MatrixServer::EdgeBased(server) => server.visited_nodes(),
        }
    }
}
