//! Property-based tests using proptest

use std::collections::HashSet;

use graph_partitioner::cluster::metrics::{intra_group_weight, modularity};
use graph_partitioner::cluster::{group_members, AnnealingClustering, AnnealingConfig, ModularityClustering};
use graph_partitioner::graph::WeightedGraph;
use proptest::prelude::*;

/// Random simple graph: `nodes` nodes, each listed pair becomes an edge
fn build_graph(nodes: usize, edges: &[(usize, usize, u8)]) -> WeightedGraph {
    let mut graph = WeightedGraph::new();
    for id in 0..nodes {
        graph.add_node(id as i64);
    }
    for &(a, b, w) in edges {
        let (a, b) = (a % nodes, b % nodes);
        if a != b {
            graph.add_edge(a as i64, b as i64, f64::from(w) + 1.0);
        }
    }
    graph
}

/// Sum of weights over same-group node pairs, by explicit pair enumeration
fn brute_force_score(graph: &WeightedGraph, partition: &graph_partitioner::cluster::Partition) -> f64 {
    let ids = graph.sorted_ids();
    let mut total = 0.0;
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            if partition[&a] == partition[&b] {
                total += graph.weight(a, b).unwrap_or(0.0);
            }
        }
    }
    total
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn test_init_partition_balanced(nodes in 1usize..40, k_seed in 0usize..40, seed in any::<u64>()) {
        let k = k_seed % nodes + 1;
        let graph = build_graph(nodes, &[]);

        let mut sac = AnnealingClustering::new(&graph, AnnealingConfig::new(k).with_seed(seed)).unwrap();
        sac.init_partition();

        let sizes = sac.group_sizes();
        prop_assert_eq!(sizes.len(), k);
        prop_assert_eq!(sizes.iter().sum::<usize>(), nodes);
        let floor = nodes / k;
        prop_assert!(sizes.iter().all(|&s| s == floor || s == floor + 1));
        prop_assert!(sizes.iter().all(|&s| s > 0));
    }

    #[test]
    fn test_run_preserves_sizes(
        nodes in 2usize..30,
        edges in prop::collection::vec((0usize..30, 0usize..30, 0u8..10), 0..80),
        k_seed in 0usize..30,
        seed in any::<u64>(),
    ) {
        let k = k_seed % nodes + 1;
        let graph = build_graph(nodes, &edges);
        let config = AnnealingConfig::new(k).with_seed(seed).with_max_iterations(300);

        let result = AnnealingClustering::new(&graph, config).unwrap().run_with_stats();

        let mut sizes: Vec<usize> = group_members(&result.partition).values().map(Vec::len).collect();
        sizes.sort_unstable();
        let mut expected = vec![nodes / k; k];
        for size in expected.iter_mut().take(nodes % k) {
            *size += 1;
        }
        expected.sort_unstable();
        prop_assert_eq!(sizes, expected);
    }

    #[test]
    fn test_score_matches_brute_force(
        nodes in 1usize..25,
        edges in prop::collection::vec((0usize..25, 0usize..25, 0u8..10), 0..60),
        k_seed in 0usize..25,
        seed in any::<u64>(),
    ) {
        let k = k_seed % nodes + 1;
        let graph = build_graph(nodes, &edges);

        let mut sac = AnnealingClustering::new(&graph, AnnealingConfig::new(k).with_seed(seed)).unwrap();
        sac.init_partition();

        let partition = sac.assignment();
        let expected = brute_force_score(&graph, &partition);
        prop_assert!((sac.compute_score() - expected).abs() < 1e-9);
        prop_assert!((intra_group_weight(&graph, &partition) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_annealing_is_deterministic(
        nodes in 2usize..20,
        edges in prop::collection::vec((0usize..20, 0usize..20, 0u8..10), 0..40),
        seed in any::<u64>(),
    ) {
        let graph = build_graph(nodes, &edges);
        let config = AnnealingConfig::new(2).with_seed(seed).with_max_iterations(200);

        let first = AnnealingClustering::new(&graph, config).unwrap().run_with_stats();
        let second = AnnealingClustering::new(&graph, config).unwrap().run_with_stats();

        prop_assert_eq!(first.partition, second.partition);
        prop_assert_eq!(first.accepted, second.accepted);
        prop_assert_eq!(first.rejected, second.rejected);
    }

    #[test]
    fn test_modularity_never_worse_than_singletons(
        nodes in 1usize..25,
        edges in prop::collection::vec((0usize..25, 0usize..25, 0u8..10), 0..60),
    ) {
        let graph = build_graph(nodes, &edges);
        let result = ModularityClustering::new(&graph).run_with_stats();

        let identity = graph.sorted_ids().into_iter().map(|id| (id, id)).collect();
        prop_assert!(result.gain >= 0.0);
        prop_assert!(modularity(&graph, &result.partition) >= modularity(&graph, &identity) - 1e-9);
        prop_assert_eq!(result.partition.len(), nodes);
    }

    #[test]
    fn test_modularity_respects_target(
        nodes in 1usize..25,
        edges in prop::collection::vec((0usize..25, 0usize..25, 0u8..10), 0..60),
        target_seed in 0usize..25,
    ) {
        let target = target_seed % nodes + 1;
        let graph = build_graph(nodes, &edges);

        let natural = ModularityClustering::new(&graph).run_with_stats();
        let capped = ModularityClustering::new(&graph)
            .with_target_communities(Some(target))
            .unwrap()
            .run_with_stats();

        let distinct: HashSet<_> = capped.partition.values().collect();
        prop_assert_eq!(distinct.len(), capped.communities);
        prop_assert!(capped.communities <= target.max(natural.communities));
    }
}
