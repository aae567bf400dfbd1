//! Building blocks for fast routing algorithms.

use crate::datastr::graph::*;

pub mod dijkstra;
pub mod many_to_many;

/// An already resolved mapping of some location onto a graph node,
/// produced by the external location index.
/// Several locations may snap to the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snap {
    pub node: NodeId,
}

impl Snap {
    pub fn new(node: NodeId) -> Snap {
        Snap { node }
    }
}
