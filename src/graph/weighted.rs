//! Weighted graph shared by both clustering engines

use std::collections::HashMap;

/// Opaque integer key identifying a node
pub type NodeId = i64;

/// Edge weight
pub type Weight = f64;

/// Weight used when a caller has no better value
pub const DEFAULT_WEIGHT: Weight = 1.0;

/// Identity of one weight record.
///
/// A bidirectional edge is stored once under its unordered endpoint pair and
/// both endpoints' adjacency entries point at that single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    Undirected(NodeId, NodeId),
    Directed(NodeId, NodeId),
}

impl EdgeKey {
    fn undirected(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            EdgeKey::Undirected(a, b)
        } else {
            EdgeKey::Undirected(b, a)
        }
    }
}

/// A graph node and the records reachable from it
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    adjacency: HashMap<NodeId, EdgeKey>,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            adjacency: HashMap::new(),
        }
    }

    /// Key of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Number of distinct neighbours
    pub fn degree(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether an adjacency entry towards `other` exists
    pub fn has_neighbor(&self, other: NodeId) -> bool {
        self.adjacency.contains_key(&other)
    }

    /// Keys of all neighbours, in no particular order
    pub fn neighbor_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }
}

/// A single weight record as seen by serializers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeView {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: Weight,
    pub bidirectional: bool,
}

/// Undirected (optionally directed) weighted graph keyed by `NodeId`
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    nodes: HashMap<NodeId, Node>,
    weights: HashMap<EdgeKey, Weight>,
}

impl WeightedGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with room for `node_count` nodes
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            nodes: HashMap::with_capacity(node_count),
            weights: HashMap::with_capacity(node_count * 2),
        }
    }

    /// Return the node for `id`, creating it if absent
    pub fn add_node(&mut self, id: NodeId) -> &Node {
        self.nodes.entry(id).or_insert_with(|| Node::new(id))
    }

    /// Add a bidirectional edge; an existing `from`/`to` pair is overwritten
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: Weight) {
        self.insert_edge(from, to, weight, true);
    }

    /// Add a one-way edge visible only from `from`
    pub fn add_arc(&mut self, from: NodeId, to: NodeId, weight: Weight) {
        self.insert_edge(from, to, weight, false);
    }

    /// Record `weight` for `from -> to` and, when `bidirectional`, for `to -> from`.
    ///
    /// Both endpoints are created if missing. The last write for a pair wins.
    /// A self loop only creates its node.
    pub fn insert_edge(&mut self, from: NodeId, to: NodeId, weight: Weight, bidirectional: bool) {
        self.add_node(from);
        self.add_node(to);
        if from == to {
            log::debug!("Ignoring self loop on node {}", from);
            return;
        }

        let key = if bidirectional {
            EdgeKey::undirected(from, to)
        } else {
            EdgeKey::Directed(from, to)
        };

        self.weights.insert(key, weight);
        self.point_entry(from, to, key);
        if bidirectional {
            self.point_entry(to, from, key);
        }
    }

    /// Change the weight behind an existing `from -> to` entry.
    ///
    /// For a bidirectional edge the change is visible from both endpoints.
    /// Returns `false` when no such entry exists.
    pub fn set_weight(&mut self, from: NodeId, to: NodeId, weight: Weight) -> bool {
        match self.entry_key(from, to) {
            Some(key) => {
                self.weights.insert(key, weight);
                true
            }
            None => false,
        }
    }

    /// Weight of the `from -> to` adjacency entry
    pub fn weight(&self, from: NodeId, to: NodeId) -> Option<Weight> {
        self.entry_key(from, to)
            .and_then(|key| self.weights.get(&key).copied())
    }

    /// Read-only view of every node
    pub fn nodes(&self) -> &HashMap<NodeId, Node> {
        &self.nodes
    }

    /// Look up one node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All node keys in ascending order
    pub fn sorted_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Neighbours of `id` with the weight of each adjacency entry
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(move |node| node.adjacency.iter())
            .map(move |(&other, key)| (other, self.weights.get(key).copied().unwrap_or(0.0)))
    }

    /// Sum of the weights of `id`'s adjacency entries
    pub fn weighted_degree(&self, id: NodeId) -> Weight {
        self.neighbors(id).map(|(_, w)| w).sum()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct weight records (a bidirectional edge counts once)
    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Half the sum of all weighted degrees, i.e. the total edge weight `m`
    pub fn total_weight(&self) -> Weight {
        let sum: Weight = self.nodes.keys().map(|&id| self.weighted_degree(id)).sum();
        sum * 0.5
    }

    /// Every weight record once, in no particular order
    pub fn edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        self.weights.iter().map(|(key, &weight)| match *key {
            EdgeKey::Undirected(from, to) => EdgeView {
                from,
                to,
                weight,
                bidirectional: true,
            },
            EdgeKey::Directed(from, to) => EdgeView {
                from,
                to,
                weight,
                bidirectional: false,
            },
        })
    }

    fn entry_key(&self, from: NodeId, to: NodeId) -> Option<EdgeKey> {
        self.nodes
            .get(&from)
            .and_then(|node| node.adjacency.get(&to).copied())
    }

    /// Point `owner`'s entry for `neighbor` at `key`, dropping a record nobody references any more
    fn point_entry(&mut self, owner: NodeId, neighbor: NodeId, key: EdgeKey) {
        let previous = self
            .nodes
            .get_mut(&owner)
            .and_then(|node| node.adjacency.insert(neighbor, key));

        if let Some(old) = previous {
            if old != key && !self.is_referenced(old) {
                self.weights.remove(&old);
            }
        }
    }

    fn is_referenced(&self, key: EdgeKey) -> bool {
        match key {
            EdgeKey::Undirected(a, b) => {
                self.entry_key(a, b) == Some(key) || self.entry_key(b, a) == Some(key)
            }
            EdgeKey::Directed(a, b) => self.entry_key(a, b) == Some(key),
        }
    }
}
