//! Many-to-many distance matrix computation on top of Contraction Hierarchies.
//!
//! The core of this crate is `algo::many_to_many`: given origin and destination
//! locations snapped to nodes of a preprocessed CH graph, it computes the full
//! grid of shortest path weights, travel times and distances with one backward
//! search per destination and one forward search per origin, rather than one
//! full query per pair.

pub mod algo;
pub mod cli;
pub mod datastr;
pub mod io;
pub mod report;
pub mod util;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
