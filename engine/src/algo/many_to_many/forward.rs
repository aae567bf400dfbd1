//! The forward phase: one filtered Dijkstra over outgoing arcs per distinct
//! origin node. After every improved label the reached node's bucket is
//! consulted to close complete origin to destination paths, and improved
//! totals are written into the matrix.

use super::*;

impl<'a, T: Traversal> Server<'a, T> {
    pub(super) fn forward_search(
        &mut self,
        source: NodeId,
        source_indices: &[usize],
        target_indices: &HashMap<NodeId, Vec<usize>>,
        matrix: &mut DistanceMatrix,
    ) {
        debug_assert_eq!(self.phase, Phase::ForwardRunning);
        let graph = self.graph;
        self.seed_search(source);
        self.tentative_weights.reset();

        // self pairs bypass search entirely
        if let Some(indices) = target_indices.get(&source) {
            for &source_idx in source_indices {
                for &target_idx in indices {
                    matrix.set_cell(source_idx, target_idx, 0, 0, 0);
                }
            }
        }
        // other paths may already be complete at the origin, through
        // whatever its own bucket collected
        self.save_best_path(source, source_indices, target_indices, source, 0, 0, 0, matrix);

        let mut first = true;

        while let Some(State { id, .. }) = self.queue.pop() {
            self.visited_nodes += 1;
            self.settled.set(id, true);
            let label = self.labels[id];

            for link in graph.outgoing(label.node) {
                if self.ops.rejects_uturn(&label, &link) {
                    continue;
                }
                if !first && !level_edge_filter(graph, label.node, &link) {
                    continue;
                }
                let Some((weight, time)) = self.ops.link_cost(graph, &label, &link, false) else {
                    continue;
                };

                let next_id = self.ops.id(graph, &link);
                if weight < self.labels[next_id].weight {
                    let distance = label.distance + link.distance;
                    self.improve(
                        next_id,
                        MatrixLabel {
                            edge: InRangeOption::some(link.edge),
                            orig_edge: InRangeOption::some(link.orig_adj),
                            node: link.adj,
                            weight,
                            time,
                            distance,
                        },
                    );
                    self.save_best_path(source, source_indices, target_indices, link.adj, weight, time, distance, matrix);
                }
            }

            first = false;
            if self.visited_nodes > self.max_visited_nodes {
                break;
            }
        }
    }

    /// Close paths against the bucket of `node`: for every destination
    /// recorded there, check whether going through `node` improves the best
    /// known total and if so write the pair into the matrix, fanning out to
    /// all indices snapped to that destination.
    #[allow(clippy::too_many_arguments)]
    fn save_best_path(
        &mut self,
        source: NodeId,
        source_indices: &[usize],
        target_indices: &HashMap<NodeId, Vec<usize>>,
        node: NodeId,
        weight: Weight,
        time: Time,
        distance: Distance,
        matrix: &mut DistanceMatrix,
    ) {
        for entry in &self.buckets[node as usize] {
            // self pairs are seeded as zero and stay that way
            if entry.target == source {
                continue;
            }

            let total_weight = weight + entry.weight;
            if total_weight < self.tentative_weights[entry.target as usize] {
                self.tentative_weights.set(entry.target as usize, total_weight);

                let total_time = time + entry.time;
                let total_distance = distance + entry.distance;
                for &source_idx in source_indices {
                    for &target_idx in &target_indices[&entry.target] {
                        matrix.set_cell(source_idx, target_idx, total_weight, total_time, total_distance);
                    }
                }
            }
        }
    }
}
