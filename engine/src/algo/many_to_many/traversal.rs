//! Traversal identity: what makes two search states at the same graph node
//! the same state.
//!
//! Node based weighting only ever keeps one state per node. With turn costs
//! the cost of continuing depends on the original edge the node was entered
//! by, so edge based traversal keeps one state per (node, entering original
//! edge) instead, encoded as `num_nodes + orig_edge`. Seeds use the plain
//! node id, which both variants reserve at the bottom of the id space.

use super::*;

/// Key distinguishing logically distinct search states, dense in
/// `[0, Traversal::num_ids(graph))`.
pub type TraversalId = usize;

/// The strategy seam between the two weighting semantics.
/// Chosen once at engine construction, implementors are zero sized.
pub trait Traversal: Default {
    /// Upper bound of the traversal id space on this graph, seed ids included.
    fn num_ids(graph: &ChGraph) -> usize;

    /// Traversal id for arriving at `link.adj` over `link`.
    fn id(&self, graph: &ChGraph, link: &ChLink) -> TraversalId;

    /// Whether relaxing `link` from the state `label` must be rejected as an
    /// immediate U-turn.
    fn rejects_uturn(&self, label: &MatrixLabel, link: &ChLink) -> bool;

    /// Weight and time of continuing from `label` over `link`, turn costs
    /// included. `reverse` tells which end of the link enters the turn.
    /// `None` if the step is impassable.
    fn link_cost(&self, graph: &ChGraph, label: &MatrixLabel, link: &ChLink, reverse: bool) -> Option<(Weight, Time)>;
}

/// Plain node visitation. Since node based weighting cannot express turn
/// restrictions, the one thing that is rejected is relaxing the exact arc
/// the search just arrived on.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeTraversal();

impl Traversal for NodeTraversal {
    fn num_ids(graph: &ChGraph) -> usize {
        graph.num_nodes()
    }

    #[inline(always)]
    fn id(&self, _graph: &ChGraph, link: &ChLink) -> TraversalId {
        link.adj as TraversalId
    }

    #[inline(always)]
    fn rejects_uturn(&self, label: &MatrixLabel, link: &ChLink) -> bool {
        label.edge.value() == Some(link.edge)
    }

    #[inline(always)]
    fn link_cost(&self, _graph: &ChGraph, label: &MatrixLabel, link: &ChLink, _reverse: bool) -> Option<(Weight, Time)> {
        if link.weight >= INFINITY {
            return None;
        }
        Some((label.weight + link.weight, label.time + link.time))
    }
}

/// Turn cost aware visitation. Several states may be alive at one node, one
/// per entering original edge; U-turns are not special cased but priced by
/// the turn cost table (an `INFINITY` row forbids the turn).
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeTraversal();

impl Traversal for EdgeTraversal {
    fn num_ids(graph: &ChGraph) -> usize {
        graph.num_nodes() + graph.num_orig_edges()
    }

    #[inline(always)]
    fn id(&self, graph: &ChGraph, link: &ChLink) -> TraversalId {
        graph.num_nodes() + link.orig_adj as TraversalId
    }

    #[inline(always)]
    fn rejects_uturn(&self, _label: &MatrixLabel, _link: &ChLink) -> bool {
        false
    }

    #[inline(always)]
    fn link_cost(&self, graph: &ChGraph, label: &MatrixLabel, link: &ChLink, reverse: bool) -> Option<(Weight, Time)> {
        if link.weight >= INFINITY {
            return None;
        }

        // the previous original edge and the link's original edge meet at the
        // node currently being expanded. In a backward search the link is
        // what enters the turn, in a forward search it is what leaves it.
        let (turn_weight, turn_time) = match label.orig_edge.value() {
            Some(prev) if reverse => (graph.turn_weight(link.orig_base, label.node, prev), graph.turn_time(link.orig_base, label.node, prev)),
            Some(prev) => (graph.turn_weight(prev, label.node, link.orig_base), graph.turn_time(prev, label.node, link.orig_base)),
            None => (0, 0),
        };
        if turn_weight >= INFINITY {
            return None;
        }

        Some((label.weight + link.weight + turn_weight, label.time + link.time + turn_time))
    }
}
