//! Input loading module

pub mod json;

pub use json::{load_graph, parse_graph, LoadedGraph};
