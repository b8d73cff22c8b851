//! Results persistence module

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use serde_json::{json, to_string_pretty, Value};

use crate::cluster::metrics::{intra_group_weight, internal_weight_spread, modularity};
use crate::cluster::{Cluster, Partition};
use crate::config::Config;
use crate::data::LoadedGraph;
use crate::graph::algorithms::connected_components;
use crate::graph::{IdTable, Weight, WeightedGraph};

/// Save a partition and its statistics to `output_dir`
pub fn save_results(
    clusters: &[Cluster],
    partition: &Partition,
    loaded: &LoadedGraph,
    config: &Config,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving {} groups to {}", clusters.len(), output_dir);

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    let ordered = ordered_clusters(clusters, &loaded.ids)?;

    save_partition(&ordered, loaded, config, output_dir)?;
    save_summary(&ordered, partition, &loaded.graph, &loaded.ids, config, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Clusters largest first, ties broken by smallest member name, with names resolved
fn ordered_clusters<'c>(
    clusters: &'c [Cluster],
    ids: &IdTable,
) -> Result<Vec<(&'c Cluster, Vec<String>)>> {
    let mut named = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        let mut names = cluster
            .members
            .iter()
            .map(|&id| ids.name_of(id).map(str::to_string))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        names.sort();
        named.push((cluster, names));
    }

    named.sort_by(|(a, a_names), (b, b_names)| {
        b.size.cmp(&a.size).then_with(|| a_names.first().cmp(&b_names.first()))
    });
    Ok(named)
}

/// Write result.json: settings, graph and groups, all by name
fn save_partition(
    ordered: &[(&Cluster, Vec<String>)],
    loaded: &LoadedGraph,
    config: &Config,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving partition");

    let path = Path::new(output_dir).join("result.json");
    let mut file = File::create(path)?;

    let graph = graph_by_name(&loaded.graph, &loaded.ids)?;

    let groups: serde_json::Map<String, Value> = ordered
        .iter()
        .enumerate()
        .map(|(index, (_, names))| (index.to_string(), json!(names)))
        .collect();

    let result = json!({
        "CLI": config.job_settings(),
        "Graph": graph,
        "Groups": groups,
    });

    file.write_all(to_string_pretty(&result)?.as_bytes())?;

    Ok(())
}

/// Adjacency keyed by name; undirected edges appear once under the smaller name
fn graph_by_name(
    graph: &WeightedGraph,
    ids: &IdTable,
) -> Result<BTreeMap<String, BTreeMap<String, Weight>>> {
    let mut by_name: BTreeMap<String, BTreeMap<String, Weight>> = BTreeMap::new();

    for &id in graph.nodes().keys() {
        by_name.entry(ids.name_of(id)?.to_string()).or_default();
    }

    for edge in graph.edges() {
        let from = ids.name_of(edge.from)?;
        let to = ids.name_of(edge.to)?;
        let (owner, other) = if edge.bidirectional && to < from {
            (to, from)
        } else {
            (from, to)
        };
        by_name
            .entry(owner.to_string())
            .or_default()
            .insert(other.to_string(), edge.weight);
    }

    Ok(by_name)
}

/// Write summary.json: graph and cluster statistics
fn save_summary(
    ordered: &[(&Cluster, Vec<String>)],
    partition: &Partition,
    graph: &WeightedGraph,
    ids: &IdTable,
    config: &Config,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let clusters: Vec<Cluster> = ordered.iter().map(|(c, _)| (*c).clone()).collect();
    let (mean_weight, std_weight) = internal_weight_spread(&clusters);

    let node_count = graph.node_count();
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        graph.nodes().values().map(|n| n.degree()).sum::<usize>() as f64 / node_count as f64
    };

    let groups = ordered
        .iter()
        .enumerate()
        .map(|(index, (cluster, names))| -> Result<Value> {
            let central = cluster
                .central_nodes
                .iter()
                .map(|&id| ids.name_of(id).map(str::to_string))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(json!({
                "id": index,
                "size": cluster.size,
                "internal_weight": cluster.internal_weight,
                "density": cluster.density,
                "central_nodes": central,
                "members": names,
            }))
        })
        .collect::<Result<Vec<Value>>>()?;

    let sizes = clusters.iter().map(|c| c.size).collect_vec();
    let summary = json!({
        "graph_stats": {
            "node_count": node_count,
            "edge_count": graph.edge_count(),
            "total_weight": graph.total_weight(),
            "avg_degree": avg_degree,
            "connected_components": connected_components(graph),
        },
        "cluster_stats": {
            "strategy": config.strategy.to_string(),
            "group_count": clusters.len(),
            "largest_group_size": sizes.iter().max().copied().unwrap_or(0),
            "smallest_group_size": sizes.iter().min().copied().unwrap_or(0),
            "avg_group_size": sizes.iter().sum::<usize>() as f64 /
                              if sizes.is_empty() { 1.0 } else { sizes.len() as f64 },
            "intra_group_weight": intra_group_weight(graph, partition),
            "modularity": modularity(graph, partition),
            "mean_internal_weight": mean_weight,
            "std_internal_weight": std_weight,
        },
        "groups": groups,
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}
