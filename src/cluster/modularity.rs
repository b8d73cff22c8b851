//! Greedy agglomerative modularity optimization.
//!
//! Every node starts in its own community. The pair of communities whose
//! merge raises Newman–Girvan modularity the most is merged, repeatedly,
//! until no merge has a positive gain or the requested number of
//! communities is reached.
//!
//! For communities A and B with mutual weight `e_AB` and weighted degrees
//! `d_A`, `d_B`, the gain of merging them is
//!
//! ```text
//! dQ = e_AB / m - (d_A * d_B) / (2 m^2)
//! ```
//!
//! where `m` is the total edge weight of the graph.
//!
//! Candidates live in a max-heap. Entries that went out of date because one
//! side was merged away, or absorbed another community after the entry was
//! pushed, are skipped when popped rather than removed eagerly.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::cluster::Partition;
use crate::error::ClusterError;
use crate::graph::{NodeId, Weight, WeightedGraph};

/// Modularity gain of merging two communities
pub fn modularity_gain(shared: Weight, degree_a: Weight, degree_b: Weight, m: Weight) -> f64 {
    shared / m - (degree_a * degree_b) / (2.0 * m * m)
}

/// Community state during one optimization run
#[derive(Debug, Clone)]
struct Community {
    total_degree: Weight,
    neighbor_weight: HashMap<NodeId, Weight>,
    members: Vec<NodeId>,
    active: bool,
    /// Bumped every time this community absorbs another
    revision: u32,
}

/// Proposed merge of `absorbed` into `absorber`
#[derive(Debug, Clone, Copy)]
struct MergeCandidate {
    gain: f64,
    absorber: NodeId,
    absorbed: NodeId,
    absorber_revision: u32,
    absorbed_revision: u32,
}

impl PartialEq for MergeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCandidate {}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest gain first; among equal gains the smallest ids win
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.absorber.cmp(&self.absorber))
            .then_with(|| other.absorbed.cmp(&self.absorbed))
    }
}

/// Outcome of a modularity run
#[derive(Debug, Clone)]
pub struct ModularityResult {
    /// Best partition seen along the merge sequence
    pub partition: Partition,
    /// Cumulative modularity gain of `partition` over the all-singleton start
    pub gain: f64,
    /// Merges performed before stopping
    pub merges: usize,
    /// Distinct communities in `partition`
    pub communities: usize,
}

/// Hierarchical community detection by modularity maximization
#[derive(Debug, Clone)]
pub struct ModularityClustering<'g> {
    graph: &'g WeightedGraph,
    target_communities: Option<usize>,
}

impl<'g> ModularityClustering<'g> {
    /// Run to natural convergence
    pub fn new(graph: &'g WeightedGraph) -> Self {
        Self {
            graph,
            target_communities: None,
        }
    }

    /// Stop once the number of communities drops to `target`
    pub fn with_target_communities(mut self, target: Option<usize>) -> Result<Self, ClusterError> {
        if target == Some(0) {
            return Err(ClusterError::InvalidTargetCount);
        }
        self.target_communities = target;
        Ok(self)
    }

    pub fn target_communities(&self) -> Option<usize> {
        self.target_communities
    }

    /// Best node -> community assignment found
    pub fn run(&self) -> Partition {
        self.run_with_stats().partition
    }

    pub fn run_with_stats(&self) -> ModularityResult {
        log::info!(
            "Running modularity clustering on {} nodes (target: {})",
            self.graph.node_count(),
            self.target_communities
                .map_or_else(|| "none".to_string(), |t| t.to_string())
        );

        let mut state = MergeState::new(self.graph);
        let result = state.optimize(self.target_communities);

        log::info!(
            "Modularity clustering finished: {} merges, {} communities, gain {:.6}",
            result.merges,
            result.communities,
            result.gain
        );
        result
    }
}

/// Mutable state of one optimization run
struct MergeState {
    communities: HashMap<NodeId, Community>,
    queue: BinaryHeap<MergeCandidate>,
    m: Weight,
    active: usize,
}

impl MergeState {
    fn new(graph: &WeightedGraph) -> Self {
        let mut communities = HashMap::with_capacity(graph.node_count());
        let mut degree_sum = 0.0;

        for id in graph.sorted_ids() {
            let neighbor_weight: HashMap<NodeId, Weight> = graph.neighbors(id).collect();
            let total_degree: Weight = neighbor_weight.values().sum();
            degree_sum += total_degree;

            communities.insert(
                id,
                Community {
                    total_degree,
                    neighbor_weight,
                    members: vec![id],
                    active: true,
                    revision: 0,
                },
            );
        }

        let active = communities.len();
        Self {
            communities,
            queue: BinaryHeap::new(),
            m: degree_sum * 0.5,
            active,
        }
    }

    fn optimize(&mut self, target: Option<usize>) -> ModularityResult {
        let mut best = self.snapshot();
        let mut best_gain = 0.0;
        let mut current_gain = 0.0;
        let mut merges = 0;

        if self.m <= 0.0 {
            log::debug!("Graph has no edge weight; returning singleton communities");
            return ModularityResult {
                communities: self.active,
                partition: best,
                gain: 0.0,
                merges: 0,
            };
        }

        self.seed_queue();

        let mut skipped = 0usize;
        while let Some(candidate) = self.queue.pop() {
            if self.is_stale(&candidate) {
                skipped += 1;
                continue;
            }
            if candidate.gain <= 0.0 {
                break;
            }
            if target.map_or(false, |t| self.active <= t) {
                break;
            }

            self.merge(candidate.absorber, candidate.absorbed);
            merges += 1;
            current_gain += candidate.gain;

            log::debug!(
                "Merged {} into {} (dQ = {:.6}, Q = {:.6}, {} active)",
                candidate.absorbed,
                candidate.absorber,
                candidate.gain,
                current_gain,
                self.active
            );

            if current_gain > best_gain {
                best_gain = current_gain;
                best = self.snapshot();
            }

            self.push_candidates_for(candidate.absorber);
        }

        log::debug!("Skipped {} stale merge candidates", skipped);

        let communities = best.values().collect::<HashSet<_>>().len();
        ModularityResult {
            partition: best,
            gain: best_gain,
            merges,
            communities,
        }
    }

    /// Queue every connected pair once
    fn seed_queue(&mut self) {
        let mut ids: Vec<NodeId> = self.communities.keys().copied().collect();
        ids.sort_unstable();

        for &a in &ids {
            let community = &self.communities[&a];
            for (&b, &shared) in &community.neighbor_weight {
                if b == a || shared <= 0.0 {
                    continue;
                }
                // One-way records are only visible from one side
                let seen_from_b = self
                    .communities
                    .get(&b)
                    .map_or(false, |other| other.neighbor_weight.contains_key(&a));
                if b < a && seen_from_b {
                    continue;
                }

                let (absorber, absorbed) = if a < b { (a, b) } else { (b, a) };
                if let Some(candidate) = self.candidate(absorber, absorbed, shared) {
                    self.queue.push(candidate);
                }
            }
        }
    }

    fn candidate(&self, absorber: NodeId, absorbed: NodeId, shared: Weight) -> Option<MergeCandidate> {
        let a = self.communities.get(&absorber)?;
        let b = self.communities.get(&absorbed)?;
        Some(MergeCandidate {
            gain: modularity_gain(shared, a.total_degree, b.total_degree, self.m),
            absorber,
            absorbed,
            absorber_revision: a.revision,
            absorbed_revision: b.revision,
        })
    }

    fn is_stale(&self, candidate: &MergeCandidate) -> bool {
        let current = |id: NodeId, revision: u32| {
            self.communities
                .get(&id)
                .map_or(false, |c| c.active && c.revision == revision)
        };
        !(current(candidate.absorber, candidate.absorber_revision)
            && current(candidate.absorbed, candidate.absorbed_revision))
    }

    /// Fold `absorbed` into `absorber`
    fn merge(&mut self, absorber: NodeId, absorbed: NodeId) {
        let (degree, neighbors, mut members) = match self.communities.get_mut(&absorbed) {
            Some(b) => {
                b.active = false;
                (
                    b.total_degree,
                    std::mem::take(&mut b.neighbor_weight),
                    std::mem::take(&mut b.members),
                )
            }
            None => return,
        };

        for (&other, &weight) in &neighbors {
            if other == absorber || other == absorbed {
                continue;
            }
            if let Some(d) = self.communities.get_mut(&other) {
                d.neighbor_weight.remove(&absorbed);
                *d.neighbor_weight.entry(absorber).or_insert(0.0) += weight;
            }
        }

        if let Some(a) = self.communities.get_mut(&absorber) {
            a.total_degree += degree;
            a.neighbor_weight.remove(&absorbed);
            for (other, weight) in neighbors {
                if other == absorber || other == absorbed {
                    continue;
                }
                *a.neighbor_weight.entry(other).or_insert(0.0) += weight;
            }
            a.members.append(&mut members);
            a.revision += 1;
        }

        self.active -= 1;
    }

    fn push_candidates_for(&mut self, id: NodeId) {
        let neighbors: Vec<(NodeId, Weight)> = match self.communities.get(&id) {
            Some(c) => c
                .neighbor_weight
                .iter()
                .map(|(&other, &w)| (other, w))
                .collect(),
            None => return,
        };

        for (other, shared) in neighbors {
            if other == id || shared <= 0.0 {
                continue;
            }
            let active = self.communities.get(&other).map_or(false, |c| c.active);
            if !active {
                continue;
            }
            if let Some(candidate) = self.candidate(id, other, shared) {
                self.queue.push(candidate);
            }
        }
    }

    /// Current node -> community assignment
    fn snapshot(&self) -> Partition {
        let mut partition = Partition::with_capacity(self.communities.len());
        for (&id, community) in &self.communities {
            if community.active {
                for &member in &community.members {
                    partition.insert(member, id);
                }
            }
        }
        partition
    }
}
