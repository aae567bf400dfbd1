//! The backward phase: one filtered Dijkstra over incoming arcs per distinct
//! destination node. Every node reached gets a bucket entry summarizing the
//! best partial path from it to the destination, which the forward phase
//! later joins complete paths against.

use super::*;

impl<'a, T: Traversal> Server<'a, T> {
    pub(super) fn backward_search(&mut self, target: NodeId) {
        debug_assert_eq!(self.phase, Phase::BackwardRunning);
        let graph = self.graph;
        self.seed_search(target);

        // the seed may sit on a virtual node whose level relations are
        // arbitrary, so the first expansion must see all arcs
        let mut first = true;

        while let Some(State { id, .. }) = self.queue.pop() {
            self.visited_nodes += 1;
            self.settled.set(id, true);
            let label = self.labels[id];

            for link in graph.incoming(label.node) {
                if self.ops.rejects_uturn(&label, &link) {
                    continue;
                }
                if !first && !level_edge_filter(graph, label.node, &link) {
                    continue;
                }
                let Some((weight, time)) = self.ops.link_cost(graph, &label, &link, true) else {
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
                    // an entry at the destination itself would be redundant
                    // with the zero seed
                    if link.adj != target {
                        save_to_bucket(&mut self.buckets[link.adj as usize], target, weight, time, distance);
                    }
                }
            }

            first = false;
            if self.visited_nodes > self.max_visited_nodes {
                break;
            }
        }
    }
}

/// Deposit or improve the entry for `target`; a node keeps only the cheapest
/// entry per destination.
fn save_to_bucket(bucket: &mut Vec<BucketEntry>, target: NodeId, weight: Weight, time: Time, distance: Distance) {
    for entry in bucket.iter_mut() {
        if entry.target == target {
            if weight < entry.weight {
                *entry = BucketEntry { target, weight, time, distance };
            }
            return;
        }
    }
    bucket.push(BucketEntry { target, weight, time, distance });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_keeps_cheapest_entry_per_target() {
        let mut bucket = Vec::new();
        save_to_bucket(&mut bucket, 7, 10, 100, 1000);
        save_to_bucket(&mut bucket, 8, 5, 50, 500);
        save_to_bucket(&mut bucket, 7, 3, 30, 300);
        save_to_bucket(&mut bucket, 7, 4, 40, 400);

        assert_eq!(bucket.len(), 2);
        let entry = bucket.iter().find(|entry| entry.target == 7).unwrap();
        assert_eq!(entry.weight, 3);
        assert_eq!(entry.time, 30);
        assert_eq!(entry.distance, 300);
    }
}
