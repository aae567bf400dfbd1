// Runs random many-to-many matrix requests on a preprocessed CH graph
// directory and reports timings as JSON.
//
// Expects flat binary arrays in the graph directory: level, tail, head,
// weight, time, distance, middle_node, orig_first, orig_last, where
// middle_node is u32::MAX for non shortcut arcs.
//
// One engine instance is created per request; requests run in parallel on a
// rayon pool, all sharing the same read-only graph.

#[macro_use]
extern crate rust_matrix_router;
use rand::prelude::*;
use rayon::prelude::*;
use rust_matrix_router::{
    algo::{many_to_many::*, Snap},
    cli::CliErr,
    datastr::graph::*,
    io::Load,
    report::*,
};
use std::{env, error::Error, path::Path};

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("matrix_queries");

    let mut args = env::args().skip(1);
    let arg = args.next().ok_or(CliErr("No graph directory arg given"))?;
    let path = Path::new(&arg);
    let algorithm = args.next().unwrap_or_else(|| "many_to_many_node".to_string());
    let mode = TraversalMode::from_name(&algorithm)?;
    report!("algorithm", algorithm);

    let level = Vec::<u32>::load_from(path.join("level"))?;
    let tail = Vec::<NodeId>::load_from(path.join("tail"))?;
    let head = Vec::<NodeId>::load_from(path.join("head"))?;
    let weight = Vec::<Weight>::load_from(path.join("weight"))?;
    let time = Vec::<Time>::load_from(path.join("time"))?;
    let distance = Vec::<Distance>::load_from(path.join("distance"))?;
    let middle_node = Vec::<NodeId>::load_from(path.join("middle_node"))?;
    let orig_first = Vec::<EdgeId>::load_from(path.join("orig_first"))?;
    let orig_last = Vec::<EdgeId>::load_from(path.join("orig_last"))?;

    let num_base_nodes = level.len();
    let mut builder = ChGraphBuilder::new(level);
    for arc in 0..tail.len() {
        if middle_node[arc] == u32::MAX {
            builder.add_edge(tail[arc], head[arc], weight[arc], time[arc], distance[arc]);
        } else {
            builder.add_shortcut(
                tail[arc],
                head[arc],
                weight[arc],
                time[arc],
                distance[arc],
                middle_node[arc],
                orig_first[arc],
                orig_last[arc],
            );
        }
    }
    let graph = report_time_with_key("building graph", "graph_build_running_time_ms", || builder.build());
    report!("num_nodes", graph.num_nodes());
    report!("num_arcs", graph.num_arcs());

    let num_queries: usize = env::var("NUM_MATRIX_QUERIES").map_or(100, |n| n.parse().unwrap());
    let num_sources: usize = env::var("NUM_MATRIX_SOURCES").map_or(10, |n| n.parse().unwrap());
    let num_targets: usize = env::var("NUM_MATRIX_TARGETS").map_or(10, |n| n.parse().unwrap());
    let seed: u64 = env::var("MATRIX_QUERY_SEED").map_or(42, |n| n.parse().unwrap());
    let mut rng = StdRng::seed_from_u64(seed);

    let queries: Vec<(Vec<Snap>, Vec<Snap>)> = (0..num_queries)
        .map(|_| {
            let random_snaps = |rng: &mut StdRng, count: usize| {
                (0..count)
                    .map(|_| Snap::new(rng.gen_range(0..num_base_nodes as NodeId)))
                    .collect::<Vec<Snap>>()
            };
            let sources = random_snaps(&mut rng, num_sources);
            let targets = random_snaps(&mut rng, num_targets);
            (sources, targets)
        })
        .collect();

    // one single use engine per request, the graph is shared read-only
    let results = queries
        .par_iter()
        .map(|(sources, targets)| {
            let mut server = MatrixServer::new(&graph, mode)?;
            let (matrix, duration) = measure(|| server.calc_matrix(sources, targets));
            let matrix = matrix?;

            let mut reached = 0;
            for source in 0..matrix.num_sources() {
                for target in 0..matrix.num_targets() {
                    if matrix.weight(source, target).is_some() {
                        reached += 1;
                    }
                }
            }
            Ok((duration.as_secs_f64() * 1000.0, server.visited_nodes(), reached))
        })
        .collect::<Result<Vec<_>, MatrixError>>()?;

    let mut queries_ctxt = push_collection_context("queries".to_string());
    for &(running_time_ms, visited_nodes, reached_pairs) in &results {
        let _query_ctxt = queries_ctxt.push_collection_item();
        report!("running_time_ms", running_time_ms);
        report!("visited_nodes", visited_nodes);
        report!("reached_pairs", reached_pairs);
    }
    drop(queries_ctxt);

    let total_ms: f64 = results.iter().map(|(ms, ..)| ms).sum();
    report!("num_queries", num_queries);
    report!("total_query_time_ms", total_ms);

    Ok(())
}
