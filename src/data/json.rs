//! JSON graph document loading

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::JobSettings;
use crate::graph::{GraphBuilder, IdTable, Weight, WeightedGraph, DEFAULT_WEIGHT};

/// Input document: optional settings plus an adjacency description keyed by node name
#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(rename = "CLI", default)]
    cli: JobSettings,

    #[serde(rename = "Graph")]
    graph: BTreeMap<String, Links>,
}

/// Links of one node, either as entries or as a name -> weight map
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Links {
    Entries(Vec<LinkEntry>),
    Weights(BTreeMap<String, Weight>),
}

#[derive(Debug, Deserialize)]
struct LinkEntry {
    #[serde(rename = "secondNode")]
    second_node: String,

    #[serde(default = "default_weight")]
    weight: Weight,
}

fn default_weight() -> Weight {
    DEFAULT_WEIGHT
}

/// A graph ready for clustering, with the names needed to export it again
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: WeightedGraph,
    pub ids: IdTable,
    pub settings: JobSettings,
}

/// Load a graph document from disk
pub fn load_graph(path: impl AsRef<Path>) -> Result<LoadedGraph> {
    let path = path.as_ref();
    log::info!("Reading graph file: {}", path.display());

    if !path.exists() {
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read graph file {}", path.display()))?;
    parse_graph(&text).with_context(|| format!("Invalid graph document {}", path.display()))
}

/// Parse a graph document from a JSON string
pub fn parse_graph(text: &str) -> Result<LoadedGraph> {
    let document: GraphDocument = serde_json::from_str(text)?;
    Ok(build(document))
}

fn build(document: GraphDocument) -> LoadedGraph {
    let mut builder = GraphBuilder::with_capacity(document.graph.len());

    // Register every listed node first so isolated ones survive
    for name in document.graph.keys() {
        builder.get_or_create_node(name);
    }

    let mut self_links = 0;
    for (name, links) in &document.graph {
        let pairs: Vec<(&str, Weight)> = match links {
            Links::Entries(entries) => entries
                .iter()
                .map(|e| (e.second_node.as_str(), e.weight))
                .collect(),
            Links::Weights(weights) => weights.iter().map(|(n, &w)| (n.as_str(), w)).collect(),
        };

        for (other, weight) in pairs {
            if other == name {
                self_links += 1;
                continue;
            }
            builder.add_edge(name, other, weight);
        }
    }

    if self_links > 0 {
        log::warn!("Ignored {} self links", self_links);
    }

    let (graph, ids) = builder.build();
    log::info!(
        "Loaded graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    LoadedGraph {
        graph,
        ids,
        settings: document.cli,
    }
}
