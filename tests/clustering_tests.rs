//! End-to-end tests of both clustering engines

use std::collections::{HashMap, HashSet};

use approx::assert_relative_eq;
use graph_partitioner::cluster::metrics::{intra_group_weight, modularity};
use graph_partitioner::cluster::{
    group_members, AnnealingClustering, AnnealingConfig, ModularityClustering, Partition,
};
use graph_partitioner::graph::WeightedGraph;
use graph_partitioner::ClusterError;

/// Four cliques of five nodes, each clique linked to the next by one light edge
fn ring_of_cliques() -> WeightedGraph {
    let mut graph = WeightedGraph::new();
    for clique in 0..4i64 {
        let base = clique * 5;
        for a in 0..5 {
            for b in (a + 1)..5 {
                graph.add_edge(base + a, base + b, 3.0);
            }
        }
        graph.add_edge(base, (base + 5) % 20, 1.0);
    }
    graph
}

fn identity(graph: &WeightedGraph) -> Partition {
    graph.sorted_ids().into_iter().map(|id| (id, id)).collect()
}

#[test]
fn test_modularity_recovers_cliques() {
    let graph = ring_of_cliques();
    let result = ModularityClustering::new(&graph).run_with_stats();

    assert_eq!(result.communities, 4);
    for clique in 0..4i64 {
        let base = clique * 5;
        let group = result.partition[&base];
        assert!((base..base + 5).all(|id| result.partition[&id] == group));
    }
}

#[test]
fn test_modularity_gain_matches_partition_quality() {
    let graph = ring_of_cliques();
    let result = ModularityClustering::new(&graph).run_with_stats();

    let start = modularity(&graph, &identity(&graph));
    let end = modularity(&graph, &result.partition);

    assert!(end >= start);
    assert_relative_eq!(end - start, result.gain, epsilon = 1e-9);
}

#[test]
fn test_modularity_target_bounds_community_count() {
    let graph = ring_of_cliques();
    for target in 1..=20 {
        let result = ModularityClustering::new(&graph)
            .with_target_communities(Some(target))
            .unwrap()
            .run_with_stats();

        let distinct: HashSet<_> = result.partition.values().collect();
        assert_eq!(distinct.len(), result.communities);
        assert!(result.communities <= target.max(4), "target {}", target);
    }
}

#[test]
fn test_annealing_balances_cliques() {
    let graph = ring_of_cliques();
    let config = AnnealingConfig::new(4)
        .with_seed(11)
        .with_temperatures(5.0, 1e-4)
        .with_cooling_factor(0.9995);

    let result = AnnealingClustering::new(&graph, config).unwrap().run_with_stats();

    let groups = group_members(&result.partition);
    assert_eq!(groups.len(), 4);
    assert!(groups.values().all(|members| members.len() == 5));
    assert_relative_eq!(result.score, intra_group_weight(&graph, &result.partition));
    // Each clique holds 10 edges of weight 3
    assert_eq!(result.score, 120.0);
}

#[test]
fn test_annealing_uneven_sizes() {
    let mut graph = WeightedGraph::new();
    for id in 0..11i64 {
        graph.add_edge(id, (id + 1) % 11, 1.0);
    }

    let result = AnnealingClustering::new(&graph, AnnealingConfig::new(3).with_seed(5))
        .unwrap()
        .run_with_stats();

    let mut sizes: Vec<usize> = group_members(&result.partition)
        .values()
        .map(Vec::len)
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![3, 4, 4]);
}

#[test]
fn test_annealing_returns_best_not_last() {
    let graph = ring_of_cliques();
    let config = AnnealingConfig::new(4)
        .with_seed(3)
        .with_temperatures(50.0, 1.0)
        .with_cooling_factor(0.999);

    let mut engine = AnnealingClustering::new(&graph, config).unwrap();
    let result = engine.run_with_stats();
    // Final state at high temperature may be worse than the recorded best
    assert!(result.score >= engine.compute_score());
}

#[test]
fn test_engines_reject_bad_counts() {
    let graph = ring_of_cliques();

    assert_eq!(
        AnnealingClustering::new(&graph, AnnealingConfig::new(21)).err(),
        Some(ClusterError::InvalidGroupCount { requested: 21, nodes: 20 })
    );
    assert_eq!(
        ModularityClustering::new(&graph)
            .with_target_communities(Some(0))
            .err()
            .map(|e| e.to_string()),
        Some("target community count must be positive".to_string())
    );
}

#[test]
fn test_engines_share_a_graph_across_threads() {
    let graph = ring_of_cliques();

    let (modular, annealed): (Partition, Partition) = std::thread::scope(|s| {
        let a = s.spawn(|| ModularityClustering::new(&graph).run());
        let b = s.spawn(|| {
            AnnealingClustering::new(&graph, AnnealingConfig::new(4).with_seed(1))
                .unwrap()
                .run()
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    let count = |p: &Partition| p.values().collect::<HashSet<_>>().len();
    assert_eq!(modular.len(), 20);
    assert_eq!(annealed.len(), 20);
    assert_eq!(count(&modular), 4);
    assert_eq!(count(&annealed), 4);

    let by_size: HashMap<_, _> = group_members(&annealed)
        .into_iter()
        .map(|(g, m)| (g, m.len()))
        .collect();
    assert!(by_size.values().all(|&s| s == 5));
}
