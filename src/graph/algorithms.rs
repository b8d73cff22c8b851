//! Graph algorithms for analysis

use std::collections::HashMap;

use petgraph::algo::connected_components as petgraph_components;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::graph::{NodeId, Weight, WeightedGraph};

/// Convert to an undirected petgraph graph.
///
/// Node weights carry the graph keys. One-way records become undirected
/// edges, so a pair linked both ways by separate arcs yields two parallel edges.
pub fn to_petgraph(graph: &WeightedGraph) -> UnGraph<NodeId, Weight> {
    let ids = graph.sorted_ids();
    let mut pg = UnGraph::with_capacity(ids.len(), graph.edge_count());

    let index: HashMap<NodeId, NodeIndex> = ids
        .iter()
        .map(|&id| (id, pg.add_node(id)))
        .collect();

    for edge in graph.edges() {
        if let (Some(&a), Some(&b)) = (index.get(&edge.from), index.get(&edge.to)) {
            pg.add_edge(a, b, edge.weight);
        }
    }

    pg
}

/// Number of connected components, treating every record as undirected
pub fn connected_components(graph: &WeightedGraph) -> usize {
    if graph.is_empty() {
        return 0;
    }
    let count = petgraph_components(&to_petgraph(graph));
    log::debug!("Graph has {} connected components", count);
    count
}
