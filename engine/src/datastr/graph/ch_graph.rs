//! Adjacency array representation of a weighted contraction hierarchy.
//!
//! Arcs are directed and grouped by their tail node, the classic
//! first_out/head layout plus one attribute array per arc property.
//! An additional index grouping arc ids by head node makes the reverse
//! direction explorable, which the backward phase of matrix queries needs.
//!
//! On top of the plain topology the graph carries everything the
//! hierarchical searches consume: the contraction level of each node,
//! shortcut middle nodes, per arc travel time and distance, the original
//! edges at both arc endpoints (for turn cost lookups at shortcuts) and an
//! optional turn cost table. Nodes appended beyond the base node count are
//! virtual query nodes which exist outside the hierarchy.
//!
//! Opposite directions of a physical road are modelled as two arcs with two
//! distinct original edge ids, so an original edge id always implies its
//! traversal direction.

use super::*;
use crate::util::in_range_option::InRangeOption;

/// State of one arc as seen from the node an explorer was asked about.
/// `adj` is the other endpoint, `orig_base`/`orig_adj` the original edges
/// at the near and far end of the arc.
#[derive(Debug, Clone, Copy)]
pub struct ChLink {
    pub edge: EdgeId,
    pub adj: NodeId,
    pub weight: Weight,
    pub time: Time,
    pub distance: Distance,
    pub orig_base: EdgeId,
    pub orig_adj: EdgeId,
    pub shortcut: bool,
}

/// One row of the turn cost table.
/// `from` and `to` are original edge ids, `via` the node at which they meet.
/// A weight of `INFINITY` forbids the turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnCost {
    pub from: EdgeId,
    pub via: NodeId,
    pub to: EdgeId,
    pub weight: Weight,
    pub time: Time,
}

#[derive(Debug)]
struct TurnCostTable {
    // sorted by (via, from, to)
    rows: Vec<TurnCost>,
}

impl TurnCostTable {
    fn new(mut rows: Vec<TurnCost>) -> TurnCostTable {
        rows.sort_unstable_by_key(|row| (row.via, row.from, row.to));
        TurnCostTable { rows }
    }

    fn get(&self, from: EdgeId, via: NodeId, to: EdgeId) -> Option<&TurnCost> {
        self.rows
            .binary_search_by_key(&(via, from, to), |row| (row.via, row.from, row.to))
            .ok()
            .map(|idx| &self.rows[idx])
    }
}

/// The routing graph all matrix searches run on. Read-only once built,
/// so one instance can be shared across any number of concurrent queries.
#[derive(Debug)]
pub struct ChGraph {
    // arcs grouped by tail node
    first_out: Vec<EdgeId>,
    head: Vec<NodeId>,
    tail: Vec<NodeId>,
    weight: Vec<Weight>,
    time: Vec<Time>,
    distance: Vec<Distance>,
    orig_first: Vec<EdgeId>,
    orig_last: Vec<EdgeId>,
    middle_node: Vec<InRangeOption<NodeId>>,
    // arc ids grouped by head node
    first_in: Vec<EdgeId>,
    in_arcs: Vec<EdgeId>,
    level: Vec<u32>,
    num_base_nodes: usize,
    num_orig_edges: usize,
    turn_costs: Option<TurnCostTable>,
}

impl Graph for ChGraph {
    fn num_nodes(&self) -> usize {
        self.level.len()
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }

    fn degree(&self, node: NodeId) -> usize {
        let node = node as usize;
        (self.first_out[node + 1] - self.first_out[node]) as usize
    }
}

impl ChGraph {
    /// Number of nodes of the base hierarchy. Ids beyond are virtual query nodes.
    pub fn num_base_nodes(&self) -> usize {
        self.num_base_nodes
    }

    /// Number of original (non shortcut) edges, including virtual ones.
    pub fn num_orig_edges(&self) -> usize {
        self.num_orig_edges
    }

    /// Contraction level of a node. Meaningless for virtual nodes.
    pub fn level(&self, node: NodeId) -> u32 {
        self.level[node as usize]
    }

    /// Whether a node was inserted by query time graph augmentation
    /// and therefore exists outside the hierarchy.
    pub fn is_virtual_node(&self, node: NodeId) -> bool {
        node as usize >= self.num_base_nodes
    }

    /// Whether the graph was built with turn cost support.
    /// An empty table still counts as edge based support.
    pub fn has_turn_costs(&self) -> bool {
        self.turn_costs.is_some()
    }

    /// Cost of turning at `via` from original edge `from` onto original edge `to`.
    /// Unlisted turns are free, `INFINITY` rows are forbidden turns.
    pub fn turn_weight(&self, from: EdgeId, via: NodeId, to: EdgeId) -> Weight {
        self.turn_costs
            .as_ref()
            .and_then(|table| table.get(from, via, to))
            .map_or(0, |row| row.weight)
    }

    /// Time domain counterpart of `turn_weight`.
    pub fn turn_time(&self, from: EdgeId, via: NodeId, to: EdgeId) -> Time {
        self.turn_costs
            .as_ref()
            .and_then(|table| table.get(from, via, to))
            .map_or(0, |row| row.time)
    }

    fn out_link(&self, arc: usize) -> ChLink {
        ChLink {
            edge: arc as EdgeId,
            adj: self.head[arc],
            weight: self.weight[arc],
            time: self.time[arc],
            distance: self.distance[arc],
            orig_base: self.orig_first[arc],
            orig_adj: self.orig_last[arc],
            shortcut: self.middle_node[arc].value().is_some(),
        }
    }

    fn in_link(&self, arc: usize) -> ChLink {
        ChLink {
            edge: arc as EdgeId,
            adj: self.tail[arc],
            weight: self.weight[arc],
            time: self.time[arc],
            distance: self.distance[arc],
            orig_base: self.orig_last[arc],
            orig_adj: self.orig_first[arc],
            shortcut: self.middle_node[arc].value().is_some(),
        }
    }

    /// Iterator over the outgoing arcs of `node`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = ChLink> + '_ {
        let node = node as usize;
        (self.first_out[node] as usize..self.first_out[node + 1] as usize).map(move |arc| self.out_link(arc))
    }

    /// Iterator over the incoming arcs of `node`, presented from the head side:
    /// `adj` is the arc's tail and `orig_base` the original edge at the head end.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = ChLink> + '_ {
        let node = node as usize;
        self.in_arcs[self.first_in[node] as usize..self.first_in[node + 1] as usize]
            .iter()
            .map(move |&arc| self.in_link(arc as usize))
    }
}

/// Build a first_out index by a prefix sum over a degree sequence.
fn degrees_to_first_out(degrees: &[EdgeId]) -> Vec<EdgeId> {
    let mut first_out = Vec::with_capacity(degrees.len() + 1);
    first_out.push(0);
    let mut prefix_sum = 0;
    for &node_degree in degrees {
        prefix_sum += node_degree;
        first_out.push(prefix_sum);
    }
    first_out
}

#[derive(Debug)]
struct ArcData {
    tail: NodeId,
    head: NodeId,
    weight: Weight,
    time: Time,
    distance: Distance,
    orig_first: EdgeId,
    orig_last: EdgeId,
    middle_node: InRangeOption<NodeId>,
}

/// Assembles a `ChGraph` from single arc insertions.
/// CH preprocessing itself happens elsewhere; this builder only lays out
/// whatever hierarchy it is given into the adjacency arrays.
#[derive(Debug)]
pub struct ChGraphBuilder {
    level: Vec<u32>,
    num_base_nodes: usize,
    arcs: Vec<ArcData>,
    num_orig_edges: usize,
    turn_costs: Option<Vec<TurnCost>>,
}

impl ChGraphBuilder {
    /// Start building a graph with one base hierarchy node per level entry.
    pub fn new(level: Vec<u32>) -> ChGraphBuilder {
        let num_base_nodes = level.len();
        ChGraphBuilder {
            level,
            num_base_nodes,
            arcs: Vec::new(),
            num_orig_edges: 0,
            turn_costs: None,
        }
    }

    /// Append a virtual query node outside the hierarchy.
    pub fn add_virtual_node(&mut self) -> NodeId {
        self.level.push(0);
        (self.level.len() - 1) as NodeId
    }

    /// Add a directed non shortcut arc and return its original edge id,
    /// which turn cost rows refer to.
    pub fn add_edge(&mut self, tail: NodeId, head: NodeId, weight: Weight, time: Time, distance: Distance) -> EdgeId {
        let orig = self.num_orig_edges as EdgeId;
        self.num_orig_edges += 1;
        self.arcs.push(ArcData {
            tail,
            head,
            weight,
            time,
            distance,
            orig_first: orig,
            orig_last: orig,
            middle_node: InRangeOption::NONE,
        });
        orig
    }

    /// Add a shortcut arc. `orig_first`/`orig_last` are the original edges
    /// at the tail and head end of the represented path, `middle` the
    /// contracted node the shortcut bypasses.
    pub fn add_shortcut(&mut self, tail: NodeId, head: NodeId, weight: Weight, time: Time, distance: Distance, middle: NodeId, orig_first: EdgeId, orig_last: EdgeId) {
        self.arcs.push(ArcData {
            tail,
            head,
            weight,
            time,
            distance,
            orig_first,
            orig_last,
            middle_node: InRangeOption::some(middle),
        });
    }

    /// Enable turn cost support with the given table.
    /// Passing an empty table builds an edge based graph with free turns.
    pub fn with_turn_costs(mut self, rows: Vec<TurnCost>) -> ChGraphBuilder {
        self.turn_costs = Some(rows);
        self
    }

    pub fn build(self) -> ChGraph {
        let n = self.level.len();
        let mut arcs = self.arcs;
        arcs.sort_by_key(|arc| arc.tail);

        // arc ids follow the sorted order, so both indexes are
        // prefix sums over the degree sequences
        let mut out_degrees = vec![0 as EdgeId; n];
        let mut in_degrees = vec![0 as EdgeId; n];
        for arc in &arcs {
            debug_assert!((arc.head as usize) < n);
            out_degrees[arc.tail as usize] += 1;
            in_degrees[arc.head as usize] += 1;
        }
        let first_out = degrees_to_first_out(&out_degrees);
        let first_in = degrees_to_first_out(&in_degrees);

        let mut in_arcs = vec![0 as EdgeId; arcs.len()];
        let mut next_slot = first_in.clone();
        for (arc_idx, arc) in arcs.iter().enumerate() {
            let slot = &mut next_slot[arc.head as usize];
            in_arcs[*slot as usize] = arc_idx as EdgeId;
            *slot += 1;
        }

        ChGraph {
            first_out,
            head: arcs.iter().map(|arc| arc.head).collect(),
            tail: arcs.iter().map(|arc| arc.tail).collect(),
            weight: arcs.iter().map(|arc| arc.weight).collect(),
            time: arcs.iter().map(|arc| arc.time).collect(),
            distance: arcs.iter().map(|arc| arc.distance).collect(),
            orig_first: arcs.iter().map(|arc| arc.orig_first).collect(),
            orig_last: arcs.iter().map(|arc| arc.orig_last).collect(),
            middle_node: arcs.iter().map(|arc| arc.middle_node).collect(),
            first_in,
            in_arcs,
            level: self.level,
            num_base_nodes: self.num_base_nodes,
            num_orig_edges: self.num_orig_edges,
            turn_costs: self.turn_costs.map(TurnCostTable::new),
        }
    }
}
