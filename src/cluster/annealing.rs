//! Balanced K-way partitioning by simulated annealing.
//!
//! Nodes are dealt into K groups whose sizes differ by at most one, then
//! pairs of nodes from different groups are swapped at random. A swap that
//! does not lower the intra-group weight is always kept; a worse one is kept
//! with probability `exp(delta / T)`. The temperature `T` shrinks by a
//! constant factor after every attempted move. Swaps never change group
//! sizes, so the balance established at the start holds throughout.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{GroupId, Partition};
use crate::error::ClusterError;
use crate::graph::{NodeId, Weight, WeightedGraph};

pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_MIN_TEMPERATURE: f64 = 1e-3;
pub const DEFAULT_COOLING_FACTOR: f64 = 0.99;

/// Parameters of one annealing run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealingConfig {
    /// Number of groups K
    pub groups: usize,

    /// Upper bound on attempted moves
    pub max_iterations: usize,

    /// Starting temperature
    pub initial_temperature: f64,

    /// The search stops once the temperature falls to this value
    pub min_temperature: f64,

    /// Multiplier applied to the temperature after every move (0 < alpha < 1)
    pub cooling_factor: f64,

    /// RNG seed; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl AnnealingConfig {
    /// Default schedule for `groups` groups
    pub fn new(groups: usize) -> Self {
        Self {
            groups,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            min_temperature: DEFAULT_MIN_TEMPERATURE,
            cooling_factor: DEFAULT_COOLING_FACTOR,
            seed: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_temperatures(mut self, initial: f64, min: f64) -> Self {
        self.initial_temperature = initial;
        self.min_temperature = min;
        self
    }

    pub fn with_cooling_factor(mut self, cooling_factor: f64) -> Self {
        self.cooling_factor = cooling_factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the parameters against a graph of `node_count` nodes
    pub fn validate(&self, node_count: usize) -> Result<(), ClusterError> {
        if self.groups == 0 || (node_count > 0 && self.groups > node_count) {
            return Err(ClusterError::InvalidGroupCount {
                requested: self.groups,
                nodes: node_count,
            });
        }
        if !(self.cooling_factor > 0.0 && self.cooling_factor < 1.0) {
            return Err(ClusterError::InvalidParameter {
                name: "cooling_factor",
                message: "must lie strictly between 0 and 1",
            });
        }
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(ClusterError::InvalidParameter {
                name: "initial_temperature",
                message: "must be finite and positive",
            });
        }
        if !(self.min_temperature.is_finite() && self.min_temperature >= 0.0) {
            return Err(ClusterError::InvalidParameter {
                name: "min_temperature",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Outcome of an annealing run
#[derive(Debug, Clone)]
pub struct AnnealingResult {
    /// Best assignment seen during the run
    pub partition: Partition,
    /// Intra-group weight of `partition`
    pub score: f64,
    /// Moves attempted, including skipped ones
    pub iterations: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Temperature when the loop stopped
    pub final_temperature: f64,
    /// Seed the run was started from
    pub seed: u64,
}

/// Probability of keeping a move that changes the score by `delta` at `temperature`.
///
/// Non-finite intermediate values count as certain acceptance.
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta >= 0.0 {
        return 1.0;
    }
    let p = (delta / temperature).exp();
    if p.is_finite() {
        p.min(1.0)
    } else {
        1.0
    }
}

/// Simulated-annealing partitioner over a borrowed graph
pub struct AnnealingClustering<'g> {
    graph: &'g WeightedGraph,
    config: AnnealingConfig,
    seed: u64,
    rng: StdRng,

    /// Dense index -> node key, ascending
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,

    /// Symmetrized incident weights per dense index, self-loops dropped
    incident: Vec<Vec<(usize, Weight)>>,

    /// Dense index -> group
    group_of: Vec<usize>,
    /// Group -> dense indices of its members
    members: Vec<Vec<usize>>,
}

impl<'g> AnnealingClustering<'g> {
    /// Validate `config` and prepare an engine; the graph must not change while it lives
    pub fn new(graph: &'g WeightedGraph, config: AnnealingConfig) -> Result<Self, ClusterError> {
        config.validate(graph.node_count())?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let nodes = graph.sorted_ids();
        let index: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let incident = symmetrized_incidence(graph, &nodes, &index);

        Ok(Self {
            graph,
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
            group_of: vec![0; nodes.len()],
            members: vec![Vec::new(); config.groups],
            nodes,
            index,
            incident,
        })
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle the nodes and deal them into K groups: the first `N mod K`
    /// groups get `N / K + 1` members, the rest `N / K`
    pub fn init_partition(&mut self) {
        let n = self.nodes.len();
        let k = self.config.groups;

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut self.rng);

        let base = n / k;
        let extra = n % k;

        self.members = vec![Vec::new(); k];
        let mut order = order.into_iter();
        for group in 0..k {
            let size = if group < extra { base + 1 } else { base };
            for idx in order.by_ref().take(size) {
                self.group_of[idx] = group;
                self.members[group].push(idx);
            }
        }
    }

    /// Sum of weights of edges whose endpoints share a group, under the current assignment
    pub fn compute_score(&self) -> f64 {
        self.score_of(&self.group_of)
    }

    /// Current node -> group assignment
    pub fn assignment(&self) -> Partition {
        self.to_partition(&self.group_of)
    }

    /// Current size of every group
    pub fn group_sizes(&self) -> Vec<usize> {
        self.members.iter().map(Vec::len).collect()
    }

    /// Best partition found
    pub fn run(&mut self) -> Partition {
        self.run_with_stats().partition
    }

    pub fn run_with_stats(&mut self) -> AnnealingResult {
        let k = self.config.groups;
        log::info!(
            "Running simulated annealing on {} nodes into {} groups (seed {})",
            self.nodes.len(),
            k,
            self.seed
        );

        if self.nodes.is_empty() {
            return AnnealingResult {
                partition: Partition::new(),
                score: 0.0,
                iterations: 0,
                accepted: 0,
                rejected: 0,
                final_temperature: self.config.initial_temperature,
                seed: self.seed,
            };
        }

        self.init_partition();

        let mut current = self.compute_score();
        let mut best = self.group_of.clone();
        let mut best_score = current;

        let mut temperature = self.config.initial_temperature;
        let mut iterations = 0;
        let mut accepted = 0;
        let mut rejected = 0;

        if k < 2 {
            log::debug!("Single group requested; no swap is possible");
        } else {
            while iterations < self.config.max_iterations && temperature > self.config.min_temperature {
                iterations += 1;

                let g1 = self.rng.gen_range(0..k);
                let mut g2 = self.rng.gen_range(0..k - 1);
                if g2 >= g1 {
                    g2 += 1;
                }

                if self.members[g1].is_empty() || self.members[g2].is_empty() {
                    continue;
                }

                let i = self.rng.gen_range(0..self.members[g1].len());
                let j = self.rng.gen_range(0..self.members[g2].len());
                let u = self.members[g1][i];
                let v = self.members[g2][j];

                let delta = self.swap_delta(u, v);
                let keep = delta >= 0.0
                    || self.rng.gen::<f64>() < acceptance_probability(delta, temperature);

                if keep {
                    self.members[g1][i] = v;
                    self.members[g2][j] = u;
                    self.group_of[u] = g2;
                    self.group_of[v] = g1;
                    current += delta;
                    accepted += 1;

                    if current > best_score {
                        best_score = current;
                        best.clone_from(&self.group_of);
                    }
                } else {
                    rejected += 1;
                }

                temperature *= self.config.cooling_factor;

                if iterations % 10_000 == 0 {
                    log::debug!(
                        "Iteration {}: T = {:.6}, score = {:.3}, best = {:.3}",
                        iterations,
                        temperature,
                        current,
                        best_score
                    );
                }
            }
        }

        let score = self.score_of(&best);
        log::info!(
            "Annealing finished after {} iterations: best score {:.3} ({} accepted, {} rejected)",
            iterations,
            score,
            accepted,
            rejected
        );

        AnnealingResult {
            partition: self.to_partition(&best),
            score,
            iterations,
            accepted,
            rejected,
            final_temperature: temperature,
            seed: self.seed,
        }
    }

    /// Change in score if `u` and `v`, currently in different groups, traded places
    fn swap_delta(&self, u: usize, v: usize) -> f64 {
        let gu = self.group_of[u];
        let gv = self.group_of[v];

        let side = |node: usize, other: usize, from: usize, to: usize| -> f64 {
            self.incident[node]
                .iter()
                .filter(|&&(x, _)| x != other)
                .map(|&(x, w)| {
                    let g = self.group_of[x];
                    if g == to {
                        w
                    } else if g == from {
                        -w
                    } else {
                        0.0
                    }
                })
                .sum()
        };

        side(u, v, gu, gv) + side(v, u, gv, gu)
    }

    /// Half the sum of adjacency entries whose endpoints share a group
    fn score_of(&self, group_of: &[usize]) -> f64 {
        let mut total = 0.0;
        for (i, &id) in self.nodes.iter().enumerate() {
            for (other, weight) in self.graph.neighbors(id) {
                if let Some(&j) = self.index.get(&other) {
                    if group_of[i] == group_of[j] {
                        total += weight;
                    }
                }
            }
        }
        total * 0.5
    }

    fn to_partition(&self, group_of: &[usize]) -> Partition {
        self.nodes
            .iter()
            .zip(group_of)
            .map(|(&id, &group)| (id, group as GroupId))
            .collect()
    }
}

/// Per-node lists of `(neighbour, (w_ij + w_ji) / 2)`, sorted by neighbour
fn symmetrized_incidence(
    graph: &WeightedGraph,
    nodes: &[NodeId],
    index: &HashMap<NodeId, usize>,
) -> Vec<Vec<(usize, Weight)>> {
    let mut pair_weight: HashMap<(usize, usize), Weight> = HashMap::new();
    for (i, &id) in nodes.iter().enumerate() {
        for (other, weight) in graph.neighbors(id) {
            let Some(&j) = index.get(&other) else { continue };
            if i == j {
                continue;
            }
            let key = if i < j { (i, j) } else { (j, i) };
            *pair_weight.entry(key).or_insert(0.0) += weight * 0.5;
        }
    }

    let mut incident = vec![Vec::new(); nodes.len()];
    for (&(i, j), &w) in &pair_weight {
        incident[i].push((j, w));
        incident[j].push((i, w));
    }
    for list in &mut incident {
        list.sort_unstable_by_key(|&(j, _)| j);
    }
    incident
}

/// Run `restarts` independent engines in parallel and keep the best result.
///
/// Restart `i` is seeded `base + i`, where `base` is `config.seed` or a random
/// value. Ties go to the lowest restart index.
pub fn anneal_multi_start(
    graph: &WeightedGraph,
    config: &AnnealingConfig,
    restarts: usize,
) -> Result<AnnealingResult, ClusterError> {
    config.validate(graph.node_count())?;

    let restarts = restarts.max(1);
    let base = config.seed.unwrap_or_else(rand::random);
    log::info!("Starting {} annealing runs from seed {}", restarts, base);

    let results = (0..restarts)
        .into_par_iter()
        .map(|i| {
            let run_config = AnnealingConfig {
                seed: Some(base.wrapping_add(i as u64)),
                ..*config
            };
            AnnealingClustering::new(graph, run_config).map(|mut engine| engine.run_with_stats())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut best: Option<AnnealingResult> = None;
    for result in results {
        match &best {
            Some(current) if result.score <= current.score => {}
            _ => best = Some(result),
        }
    }

    best.ok_or(ClusterError::InvalidGroupCount {
        requested: config.groups,
        nodes: graph.node_count(),
    })
}
