//! Plain one-to-one Dijkstra over the full graph, shortcuts included.
//!
//! Since shortcuts preserve shortest path weights this is exact on CH graphs
//! without ever looking at levels, which makes it the ground truth the matrix
//! engine is tested against. Far too slow for production queries.

use super::*;
use crate::datastr::{index_heap::*, timestamped_vector::TimestampedVector};

/// Priority queue entries
#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
pub struct State {
    pub key: Weight,
    pub node: NodeId,
}

impl Indexing for State {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

pub struct Server<'a> {
    graph: &'a ChGraph,
    distances: TimestampedVector<Weight>,
    queue: IndexdMinHeap<State>,
}

impl<'a> Server<'a> {
    pub fn new(graph: &'a ChGraph) -> Server<'a> {
        let n = graph.num_nodes();
        Server {
            graph,
            distances: TimestampedVector::new(n, INFINITY),
            queue: IndexdMinHeap::new(n),
        }
    }

    pub fn distance(&mut self, from: NodeId, to: NodeId) -> Option<Weight> {
        self.queue.clear();
        self.distances.reset();

        self.distances.set(from as usize, 0);
        self.queue.push(State { key: 0, node: from });

        while let Some(State { node, key }) = self.queue.pop() {
            if node == to {
                return Some(key);
            }

            for link in self.graph.outgoing(node) {
                if link.weight >= INFINITY {
                    continue;
                }
                let next_distance = key + link.weight;

                if next_distance < self.distances[link.adj as usize] {
                    self.distances.set(link.adj as usize, next_distance);
                    let next = State {
                        key: next_distance,
                        node: link.adj,
                    };
                    if self.queue.contains_index(next.as_index()) {
                        self.queue.decrease_key(next);
                    } else {
                        self.queue.push(next);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_distances() {
        // 0 --1--> 1 --2--> 2
        //  \               ^
        //   '------5------'
        let mut builder = ChGraphBuilder::new(vec![0, 1, 2]);
        builder.add_edge(0, 1, 1, 10, 100);
        builder.add_edge(1, 2, 2, 20, 200);
        builder.add_edge(0, 2, 5, 50, 500);
        let graph = builder.build();

        let mut server = Server::new(&graph);
        assert_eq!(server.distance(0, 2), Some(3));
        assert_eq!(server.distance(0, 0), Some(0));
        assert_eq!(server.distance(2, 0), None);
    }
}
