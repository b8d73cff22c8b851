//! Cluster analysis module

pub mod modularity;
pub mod annealing;
pub mod metrics;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ClusterError;
use crate::graph::{NodeId, Weight, WeightedGraph};

pub use annealing::{anneal_multi_start, AnnealingClustering, AnnealingConfig, AnnealingResult};
pub use modularity::{ModularityClustering, ModularityResult};

/// Group identifier inside a partition
pub type GroupId = i64;

/// Mapping from every node to its group
pub type Partition = HashMap<NodeId, GroupId>;

/// Which engine produces the partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Size-balanced K-way partitioning by simulated annealing
    Annealing,
    /// Agglomerative modularity maximization
    Modularity,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Annealing => write!(f, "annealing"),
            Strategy::Modularity => write!(f, "modularity"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "annealing" | "sa" => Ok(Strategy::Annealing),
            "modularity" | "gmo" => Ok(Strategy::Modularity),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Summary of one group of a partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Group identifier as produced by the engine
    pub id: GroupId,

    /// Members of this group, ascending
    pub members: Vec<NodeId>,

    /// Size of the group
    pub size: usize,

    /// Total weight of edges with both endpoints in the group
    pub internal_weight: Weight,

    /// Density: internal edges / possible pairs
    pub density: f32,

    /// Members with the highest weighted degree inside the group
    pub central_nodes: Vec<NodeId>,
}

/// Partition `graph` with the engine selected by `config`
pub fn partition_graph(graph: &WeightedGraph, config: &Config) -> Result<Partition, ClusterError> {
    match config.strategy {
        Strategy::Modularity => {
            let engine = ModularityClustering::new(graph)
                .with_target_communities(config.target_communities)?;
            Ok(engine.run())
        }
        Strategy::Annealing => {
            let annealing = config.annealing_config(graph.node_count())?;
            let result = anneal_multi_start(graph, &annealing, config.restarts)?;
            Ok(result.partition)
        }
    }
}

/// Invert a partition into group -> members, members ascending
pub fn group_members(partition: &Partition) -> HashMap<GroupId, Vec<NodeId>> {
    let mut groups: HashMap<GroupId, Vec<NodeId>> = HashMap::new();
    for (&node, &group) in partition {
        groups.entry(group).or_default().push(node);
    }
    for members in groups.values_mut() {
        members.sort_unstable();
    }
    groups
}
