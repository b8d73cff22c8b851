//! Graph representation and algorithms module

pub mod weighted;
pub mod ids;
pub mod builder;
pub mod algorithms;

pub use builder::GraphBuilder;
pub use ids::IdTable;
pub use weighted::{EdgeView, Node, NodeId, Weight, WeightedGraph, DEFAULT_WEIGHT};
