//! Graph construction module

use crate::graph::ids::IdTable;
use crate::graph::{NodeId, Weight, WeightedGraph};

/// Builder for incrementally constructing a WeightedGraph from named nodes
pub struct GraphBuilder {
    /// Mapping between string IDs and node keys
    ids: IdTable,

    /// Graph under construction
    graph: WeightedGraph,

    /// Number of add_edge calls that replaced an existing weight
    overwritten: usize,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new graph builder with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: IdTable::with_capacity(capacity),
            graph: WeightedGraph::with_capacity(capacity),
            overwritten: 0,
        }
    }

    /// Get or create a node key for the given string ID
    pub fn get_or_create_node(&mut self, id: &str) -> NodeId {
        let key = self.ids.key_of(id);
        self.graph.add_node(key);
        key
    }

    /// Add a bidirectional edge between two named nodes
    pub fn add_edge(&mut self, src_id: &str, dst_id: &str, weight: Weight) {
        self.connect(src_id, dst_id, weight, true);
    }

    /// Add an edge visible only from `src_id`
    pub fn add_arc(&mut self, src_id: &str, dst_id: &str, weight: Weight) {
        self.connect(src_id, dst_id, weight, false);
    }

    fn connect(&mut self, src_id: &str, dst_id: &str, weight: Weight, bidirectional: bool) {
        let src = self.get_or_create_node(src_id);
        let dst = self.get_or_create_node(dst_id);

        if let Some(previous) = self.graph.weight(src, dst) {
            if previous != weight {
                log::debug!(
                    "Edge {} -- {} redefined: weight {} replaced by {}",
                    src_id,
                    dst_id,
                    previous,
                    weight
                );
            }
            self.overwritten += 1;
        }

        self.graph.insert_edge(src, dst, weight, bidirectional);
    }

    /// Number of edges declared more than once so far
    pub fn overwritten_edges(&self) -> usize {
        self.overwritten
    }

    /// Finish building, returning the graph and the name table that goes with it
    pub fn build(self) -> (WeightedGraph, IdTable) {
        log::debug!(
            "Built graph with {} nodes, {} edges ({} redefinitions)",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.overwritten
        );
        (self.graph, self.ids)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
