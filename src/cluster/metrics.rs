//! Cluster statistics and metrics

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::cluster::{group_members, Cluster, GroupId, Partition};
use crate::graph::{NodeId, Weight, WeightedGraph};

/// Number of central members reported per cluster
const CENTRAL_NODE_COUNT: usize = 5;

/// Total weight of edges whose endpoints share a group.
///
/// Sums adjacency entries with both ends in the same group and halves the
/// result, so a bidirectional edge counts once. Nodes absent from the
/// partition are ignored.
pub fn intra_group_weight(graph: &WeightedGraph, partition: &Partition) -> f64 {
    let mut total = 0.0;
    for &id in graph.nodes().keys() {
        let Some(group) = partition.get(&id) else { continue };
        for (other, weight) in graph.neighbors(id) {
            if partition.get(&other) == Some(group) {
                total += weight;
            }
        }
    }
    total * 0.5
}

/// Newman–Girvan modularity of a partition; zero for a graph without edge weight
pub fn modularity(graph: &WeightedGraph, partition: &Partition) -> f64 {
    let m = graph.total_weight();
    if m <= 0.0 {
        return 0.0;
    }

    let mut internal: HashMap<GroupId, Weight> = HashMap::new();
    let mut degree: HashMap<GroupId, Weight> = HashMap::new();

    for &id in graph.nodes().keys() {
        let Some(&group) = partition.get(&id) else { continue };
        for (other, weight) in graph.neighbors(id) {
            *degree.entry(group).or_insert(0.0) += weight;
            if partition.get(&other) == Some(&group) {
                *internal.entry(group).or_insert(0.0) += weight * 0.5;
            }
        }
    }

    degree
        .iter()
        .map(|(group, &d)| {
            let l = internal.get(group).copied().unwrap_or(0.0);
            l / m - (d / (2.0 * m)).powi(2)
        })
        .sum()
}

/// Calculate density (linked pairs / possible pairs)
pub fn calculate_density(graph: &WeightedGraph, members: &[NodeId]) -> f32 {
    let n = members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton clusters have density 1
    }

    let potential_pairs = n * (n - 1) / 2;
    let member_set: HashSet<NodeId> = members.iter().copied().collect();

    let mut linked_pairs = 0;
    for &src in members {
        let Some(node) = graph.node(src) else { continue };
        for dst in node.neighbor_ids() {
            if dst == src || !member_set.contains(&dst) {
                continue;
            }
            // Count each pair once, whichever side stores it
            let reverse = graph.node(dst).map_or(false, |d| d.has_neighbor(src));
            if src < dst || !reverse {
                linked_pairs += 1;
            }
        }
    }

    linked_pairs as f32 / potential_pairs as f32
}

/// Members with the highest weighted degree towards the rest of the cluster
pub fn identify_central_nodes(graph: &WeightedGraph, members: &[NodeId]) -> Vec<NodeId> {
    let member_set: HashSet<NodeId> = members.iter().copied().collect();

    members
        .iter()
        .map(|&id| {
            let degree: Weight = graph
                .neighbors(id)
                .filter(|(other, _)| *other != id && member_set.contains(other))
                .map(|(_, w)| w)
                .sum();
            (id, degree)
        })
        .sorted_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)))
        .take(CENTRAL_NODE_COUNT)
        .map(|(id, _)| id)
        .collect()
}

/// Summaries of every group, largest first (ties by group id)
pub fn clusters(graph: &WeightedGraph, partition: &Partition) -> Vec<Cluster> {
    let groups: Vec<(GroupId, Vec<NodeId>)> = group_members(partition).into_iter().collect();

    let mut clusters: Vec<Cluster> = groups
        .into_par_iter()
        .map(|(id, members)| {
            let group_partition: Partition = members.iter().map(|&m| (m, id)).collect();
            Cluster {
                id,
                size: members.len(),
                internal_weight: intra_group_weight(graph, &group_partition),
                density: calculate_density(graph, &members),
                central_nodes: identify_central_nodes(graph, &members),
                members,
            }
        })
        .collect();

    clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
    clusters
}

/// Mean and population standard deviation of per-cluster internal weight
pub fn internal_weight_spread(clusters: &[Cluster]) -> (f64, f64) {
    if clusters.is_empty() {
        return (0.0, 0.0);
    }
    let weights: Vec<f64> = clusters.iter().map(|c| c.internal_weight).collect();
    let mean = weights.iter().mean();
    let std_dev = weights.iter().population_std_dev();
    (mean, std_dev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_and_pair() -> WeightedGraph {
        let mut graph = WeightedGraph::new();
        graph.add_edge(1, 2, 2.0);
        graph.add_edge(2, 3, 2.0);
        graph.add_edge(1, 3, 2.0);
        graph.add_edge(4, 5, 6.0);
        graph.add_edge(3, 4, 1.0);
        graph
    }

    #[test]
    fn test_intra_group_weight() {
        let graph = triangle_and_pair();
        let partition: Partition = [(1, 0), (2, 0), (3, 0), (4, 1), (5, 1)].into_iter().collect();
        assert_eq!(intra_group_weight(&graph, &partition), 12.0);

        let all_apart: Partition = (1..=5).map(|id| (id, id)).collect();
        assert_eq!(intra_group_weight(&graph, &all_apart), 0.0);
    }

    #[test]
    fn test_modularity_of_identity_triangle() {
        let mut graph = WeightedGraph::new();
        graph.add_edge(1, 2, 5.0);
        graph.add_edge(2, 3, 5.0);
        graph.add_edge(1, 3, 5.0);

        let identity: Partition = (1..=3).map(|id| (id, id)).collect();
        let whole: Partition = (1..=3).map(|id| (id, 0)).collect();

        assert_relative_eq!(modularity(&graph, &identity), -1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(modularity(&graph, &whole), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_modularity_without_edges() {
        let mut graph = WeightedGraph::new();
        graph.add_node(1);
        let partition: Partition = [(1, 1)].into_iter().collect();
        assert_eq!(modularity(&graph, &partition), 0.0);
    }

    #[test]
    fn test_density() {
        let graph = triangle_and_pair();
        assert_eq!(calculate_density(&graph, &[1, 2, 3]), 1.0);
        assert_eq!(calculate_density(&graph, &[1, 2, 4]), 1.0 / 3.0);
        assert_eq!(calculate_density(&graph, &[5]), 1.0);
    }

    #[test]
    fn test_clusters_sorted_by_size() {
        let graph = triangle_and_pair();
        let partition: Partition = [(1, 7), (2, 7), (3, 7), (4, 2), (5, 2)].into_iter().collect();

        let clusters = clusters(&graph, &partition);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, 7);
        assert_eq!(clusters[0].members, vec![1, 2, 3]);
        assert_eq!(clusters[0].internal_weight, 6.0);
        assert_eq!(clusters[0].central_nodes, vec![1, 2, 3]);
        assert_eq!(clusters[1].internal_weight, 6.0);

        let (mean, std_dev) = internal_weight_spread(&clusters);
        assert_relative_eq!(mean, 6.0);
        assert_relative_eq!(std_dev, 0.0);
    }
}
