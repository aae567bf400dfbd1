use rand::prelude::*;
use rust_matrix_router::{
    algo::{dijkstra, many_to_many::*, Snap},
    datastr::graph::*,
};

fn snaps(nodes: &[NodeId]) -> Vec<Snap> {
    nodes.iter().copied().map(Snap::new).collect()
}

#[derive(Debug, Clone, Copy)]
struct TestArc {
    head: NodeId,
    weight: Weight,
    time: Time,
    distance: Distance,
    orig_first: EdgeId,
    orig_last: EdgeId,
}

// keep only the cheapest parallel connection, so contraction stays small
fn insert_or_decrease(list: &mut Vec<TestArc>, arc: TestArc) -> bool {
    for existing in list.iter_mut() {
        if existing.head == arc.head {
            if arc.weight < existing.weight {
                *existing = arc;
                return true;
            }
            return false;
        }
    }
    list.push(arc);
    true
}

/// Turn a plain weighted graph into a valid hierarchy for testing.
/// Nodes are contracted in id order (so the contraction level is just the
/// node id) and every in/out pair of a contracted node gets a shortcut.
/// No witness search - superfluous shortcuts represent real paths and are
/// harmless for correctness, they just make the graph a bit denser.
fn contract(num_nodes: usize, edges: &[(NodeId, NodeId, Weight)]) -> ChGraph {
    let mut builder = ChGraphBuilder::new((0..num_nodes as u32).collect());
    let mut out: Vec<Vec<TestArc>> = vec![Vec::new(); num_nodes];
    let mut inn: Vec<Vec<TestArc>> = vec![Vec::new(); num_nodes];

    for &(from, to, weight) in edges {
        let orig = builder.add_edge(from, to, weight, weight * 10, weight * 100);
        let arc = TestArc {
            head: to,
            weight,
            time: weight * 10,
            distance: weight * 100,
            orig_first: orig,
            orig_last: orig,
        };
        insert_or_decrease(&mut out[from as usize], arc);
        insert_or_decrease(&mut inn[to as usize], TestArc { head: from, ..arc });
    }

    for v in 0..num_nodes {
        let in_list = inn[v].clone();
        let out_list = out[v].clone();

        for ie in &in_list {
            let u = ie.head as usize;
            if u <= v {
                continue;
            }
            for oe in &out_list {
                let w = oe.head as usize;
                if w <= v || w == u {
                    continue;
                }

                let shortcut = TestArc {
                    head: oe.head,
                    weight: ie.weight + oe.weight,
                    time: ie.time + oe.time,
                    distance: ie.distance + oe.distance,
                    orig_first: ie.orig_first,
                    orig_last: oe.orig_last,
                };
                if insert_or_decrease(&mut out[u], shortcut) {
                    insert_or_decrease(&mut inn[w], TestArc { head: u as NodeId, ..shortcut });
                    builder.add_shortcut(
                        u as NodeId,
                        w as NodeId,
                        shortcut.weight,
                        shortcut.time,
                        shortcut.distance,
                        v as NodeId,
                        shortcut.orig_first,
                        shortcut.orig_last,
                    );
                }
            }
        }
    }

    builder.build()
}

fn random_edges(num_nodes: usize, num_edges: usize, rng: &mut StdRng) -> Vec<(NodeId, NodeId, Weight)> {
    let mut edges = Vec::with_capacity(num_edges);
    while edges.len() < num_edges {
        let from = rng.gen_range(0..num_nodes as NodeId);
        let to = rng.gen_range(0..num_nodes as NodeId);
        if from == to {
            continue;
        }
        edges.push((from, to, rng.gen_range(1..20)));
    }
    edges
}

#[test]
fn takes_the_cheaper_of_two_alternative_paths() {
    //          2        3
    //      0 -----> 1 -----> 3
    //      |                 |
    //      | 5               | 4
    //      v        1        v
    //      2 --------------> 4
    let mut builder = ChGraphBuilder::new(vec![0, 1, 1, 2, 3]);
    builder.add_edge(0, 1, 2, 20, 200);
    builder.add_edge(1, 3, 3, 30, 300);
    builder.add_edge(0, 2, 5, 50, 500);
    builder.add_edge(2, 4, 1, 10, 100);
    builder.add_edge(3, 4, 4, 40, 400);
    let graph = builder.build();

    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[0]), &snaps(&[3, 4])).unwrap();

    assert_eq!(matrix.weight(0, 0), Some(5));
    assert_eq!(matrix.time(0, 0), Some(50));
    assert_eq!(matrix.distance(0, 0), Some(500));
    // 0 -> 2 -> 4 beats 0 -> 1 -> 3 -> 4
    assert_eq!(matrix.weight(0, 1), Some(6));
    assert_eq!(matrix.time(0, 1), Some(60));
    assert_eq!(matrix.distance(0, 1), Some(600));
}

#[test]
fn self_pairs_are_zero() {
    let mut rng = StdRng::seed_from_u64(0xAFFE);
    let graph = contract(20, &random_edges(20, 50, &mut rng));

    let nodes: Vec<NodeId> = (0..20).collect();
    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&nodes), &snaps(&nodes)).unwrap();

    for node in 0..20 {
        assert_eq!(matrix.weight(node, node), Some(0));
        assert_eq!(matrix.time(node, node), Some(0));
        assert_eq!(matrix.distance(node, node), Some(0));
    }
}

#[test]
fn matches_one_to_one_oracle() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let num_nodes = 30;
        let graph = contract(num_nodes, &random_edges(num_nodes, 90, &mut rng));
        let nodes: Vec<NodeId> = (0..num_nodes as NodeId).collect();

        let mut server = Server::node_based(&graph).unwrap();
        let matrix = server.calc_matrix(&snaps(&nodes), &snaps(&nodes)).unwrap();

        let mut oracle = dijkstra::Server::new(&graph);
        for &source in &nodes {
            for &target in &nodes {
                assert_eq!(
                    matrix.weight(source as usize, target as usize),
                    oracle.distance(source, target),
                    "seed {} pair {} -> {}",
                    seed,
                    source,
                    target
                );
            }
        }
    }
}

#[test]
fn symmetric_costs_give_a_symmetric_matrix() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let num_nodes = 25;
    let mut edges = Vec::new();
    for &(from, to, weight) in &random_edges(num_nodes, 60, &mut rng) {
        edges.push((from, to, weight));
        edges.push((to, from, weight));
    }
    let graph = contract(num_nodes, &edges);

    let nodes: Vec<NodeId> = (0..num_nodes as NodeId).collect();
    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&nodes), &snaps(&nodes)).unwrap();

    for s in 0..num_nodes {
        for t in 0..num_nodes {
            assert_eq!(matrix.weight(s, t), matrix.weight(t, s), "{} vs {}", s, t);
        }
    }
}

#[test]
fn shrinking_the_budget_only_removes_entries() {
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let num_nodes = 30;
    let graph = contract(num_nodes, &random_edges(num_nodes, 90, &mut rng));
    let nodes: Vec<NodeId> = (0..num_nodes as NodeId).collect();

    let mut unbounded = Server::node_based(&graph).unwrap();
    let full = unbounded.calc_matrix(&snaps(&nodes), &snaps(&nodes)).unwrap();
    let visited = unbounded.visited_nodes();
    assert!(visited > 0);

    for budget in [visited / 7, visited / 3, visited / 2] {
        let mut bounded = Server::node_based(&graph).unwrap();
        bounded.set_max_visited_nodes(budget);
        let partial = bounded.calc_matrix(&snaps(&nodes), &snaps(&nodes)).unwrap();
        // every search still settles its seed before the budget can stop it
        assert!(bounded.visited_nodes() <= budget + 2 * num_nodes);

        let mut reached = 0;
        for s in 0..num_nodes {
            for t in 0..num_nodes {
                match (partial.weight(s, t), full.weight(s, t)) {
                    // a pair closed just before the cut may not have
                    // converged yet, but it can never beat the full run
                    (Some(partial_weight), Some(full_weight)) => {
                        assert!(partial_weight >= full_weight);
                        reached += 1;
                    }
                    (Some(_), None) => panic!("bounded run reached {} -> {} which the unbounded run did not", s, t),
                    _ => {}
                }
            }
        }
        // self pairs bypass the search and survive any budget
        assert!(reached >= num_nodes);
    }
}

#[test]
fn duplicate_snaps_fan_out_to_all_indices() {
    let mut builder = ChGraphBuilder::new(vec![0, 1, 2]);
    builder.add_edge(0, 1, 2, 20, 200);
    builder.add_edge(1, 2, 3, 30, 300);
    let graph = builder.build();

    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server
        .calc_matrix(&snaps(&[0, 0]), &snaps(&[2, 2, 0]))
        .unwrap();

    for source in 0..2 {
        assert_eq!(matrix.weight(source, 0), Some(5));
        assert_eq!(matrix.weight(source, 1), Some(5));
        // origin and destination snapped to the same node
        assert_eq!(matrix.weight(source, 2), Some(0));
    }
}

#[test]
fn unreachable_pairs_stay_unreached() {
    // node 2 has no incoming arcs at all
    let mut builder = ChGraphBuilder::new(vec![0, 1, 2]);
    builder.add_edge(0, 1, 1, 10, 100);
    let graph = builder.build();

    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[0]), &snaps(&[1, 2])).unwrap();

    assert_eq!(matrix.weight(0, 0), Some(1));
    assert_eq!(matrix.weight(0, 1), None);
    assert_eq!(matrix.time(0, 1), None);
    assert_eq!(matrix.distance(0, 1), None);
}

#[test]
fn impassable_arcs_are_skipped_not_errors() {
    let mut builder = ChGraphBuilder::new(vec![0, 1, 2]);
    builder.add_edge(0, 1, INFINITY, 0, 0);
    builder.add_edge(0, 2, 3, 30, 300);
    builder.add_edge(2, 1, 3, 30, 300);
    let graph = builder.build();

    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[0]), &snaps(&[1])).unwrap();
    assert_eq!(matrix.weight(0, 0), Some(6));
}

#[test]
fn virtual_nodes_are_searched_like_any_other() {
    // a virtual source and a virtual target spliced into a two node base
    // graph whose levels would otherwise not matter for the virtual arcs
    let mut builder = ChGraphBuilder::new(vec![1, 2]);
    builder.add_edge(0, 1, 2, 20, 200);
    let source = builder.add_virtual_node();
    let target = builder.add_virtual_node();
    builder.add_edge(source, 0, 1, 10, 100);
    builder.add_edge(1, target, 1, 10, 100);
    let graph = builder.build();

    let mut server = Server::node_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[source]), &snaps(&[target])).unwrap();
    assert_eq!(matrix.weight(0, 0), Some(4));
    assert_eq!(matrix.time(0, 0), Some(40));
    assert_eq!(matrix.distance(0, 0), Some(400));
}

#[test]
fn visited_nodes_are_counted_across_the_whole_computation() {
    let mut builder = ChGraphBuilder::new(vec![0, 1]);
    builder.add_edge(0, 1, 1, 10, 100);
    let graph = builder.build();

    let mut server = Server::node_based(&graph).unwrap();
    assert_eq!(server.visited_nodes(), 0);
    server.calc_matrix(&snaps(&[0]), &snaps(&[1])).unwrap();
    assert!(server.visited_nodes() > 0);
}

#[test]
fn edge_based_prices_turn_costs() {
    // levels descend along the only path, so the backward search covers it
    // completely and every turn is accounted for
    let mut builder = ChGraphBuilder::new(vec![3, 2, 1, 0]);
    builder.add_edge(0, 1, 1, 10, 100);
    let bc = builder.add_edge(1, 2, 1, 10, 100);
    let cd = builder.add_edge(2, 3, 1, 10, 100);
    let graph = builder
        .with_turn_costs(vec![TurnCost {
            from: bc,
            via: 2,
            to: cd,
            weight: 7,
            time: 70,
        }])
        .build();

    let mut server = Server::edge_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[0]), &snaps(&[3])).unwrap();
    assert_eq!(matrix.weight(0, 0), Some(1 + 1 + 1 + 7));
    assert_eq!(matrix.time(0, 0), Some(10 + 10 + 10 + 70));
    // distance is unaffected by turns
    assert_eq!(matrix.distance(0, 0), Some(300));
}

#[test]
fn edge_based_excludes_forbidden_turns() {
    let mut builder = ChGraphBuilder::new(vec![3, 2, 1, 0]);
    builder.add_edge(0, 1, 1, 10, 100);
    let bc = builder.add_edge(1, 2, 1, 10, 100);
    let cd = builder.add_edge(2, 3, 1, 10, 100);
    let graph = builder
        .with_turn_costs(vec![TurnCost {
            from: bc,
            via: 2,
            to: cd,
            weight: INFINITY,
            time: 0,
        }])
        .build();

    let mut server = Server::edge_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[0]), &snaps(&[3, 2])).unwrap();
    // the only path to 3 needs the forbidden turn
    assert_eq!(matrix.weight(0, 0), None);
    // up to node 2 everything is fine
    assert_eq!(matrix.weight(0, 1), Some(2));
}

#[test]
fn edge_based_forbidden_uturn_does_not_affect_other_paths() {
    // A - B - C with the parallel stub B - D; banning the A->B->A U-turn
    // must leave the A -> C path untouched
    let a = 0;
    let b = 1;
    let c = 2;
    let d = 3;
    let mut builder = ChGraphBuilder::new(vec![0, 3, 1, 2]);
    let ab = builder.add_edge(a, b, 1, 10, 100);
    let ba = builder.add_edge(b, a, 1, 10, 100);
    builder.add_edge(b, c, 2, 20, 200);
    builder.add_edge(b, d, 1, 10, 100);
    builder.add_edge(d, b, 1, 10, 100);
    let graph = builder
        .with_turn_costs(vec![TurnCost {
            from: ab,
            via: b,
            to: ba,
            weight: INFINITY,
            time: 0,
        }])
        .build();

    let mut server = Server::edge_based(&graph).unwrap();
    let matrix = server.calc_matrix(&snaps(&[a]), &snaps(&[c, a])).unwrap();
    assert_eq!(matrix.weight(0, 0), Some(3));
    // the self pair is seeded as zero, not routed through the U-turn
    assert_eq!(matrix.weight(0, 1), Some(0));
}

#[test]
fn shared_graph_across_threads_gives_identical_results() {
    let mut rng = StdRng::seed_from_u64(0xDEAD);
    let num_nodes = 25;
    let graph = contract(num_nodes, &random_edges(num_nodes, 75, &mut rng));
    let nodes: Vec<NodeId> = (0..num_nodes as NodeId).collect();

    let mut reference = Server::node_based(&graph).unwrap();
    let reference = reference.calc_matrix(&snaps(&nodes), &snaps(&nodes)).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let graph = &graph;
                let nodes = &nodes;
                scope.spawn(move || {
                    let mut server = Server::node_based(graph).unwrap();
                    server.calc_matrix(&snaps(nodes), &snaps(nodes)).unwrap()
                })
            })
            .collect();

        for handle in handles {
            let matrix = handle.join().unwrap();
            for s in 0..num_nodes {
                for t in 0..num_nodes {
                    assert_eq!(matrix.weight(s, t), reference.weight(s, t));
                }
            }
        }
    });
}
