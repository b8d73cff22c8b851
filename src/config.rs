//! Configuration management for the graph partitioner

use serde::{Deserialize, Serialize};

use crate::cluster::annealing::{
    AnnealingConfig, DEFAULT_COOLING_FACTOR, DEFAULT_INITIAL_TEMPERATURE, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MIN_TEMPERATURE,
};
use crate::cluster::Strategy;
use crate::error::ClusterError;

/// Settings embedded in the input document under `"CLI"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSettings {
    /// Desired number of members per group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_size: Option<usize>,

    /// Where results should be written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<String>,

    /// Explicit number of groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<usize>,

    /// Early stop for modularity clustering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_communities: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Complete configuration for one partitioning job
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Clustering engine to use
    pub strategy: Strategy,

    /// Desired group size; K = ceil(N / group_size)
    pub group_size: Option<usize>,

    /// Explicit group count, takes precedence over group_size
    pub groups: Option<usize>,

    /// Stop modularity merging at this many communities
    pub target_communities: Option<usize>,

    /// Annealing iteration cap
    pub max_iterations: usize,

    /// Annealing start temperature
    pub initial_temperature: f64,

    /// Annealing stop temperature
    pub min_temperature: f64,

    /// Geometric cooling factor
    pub cooling_factor: f64,

    /// RNG seed for reproducible runs
    pub seed: Option<u64>,

    /// Independent annealing runs; the best one wins
    pub restarts: usize,

    /// Output directory for results
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::Annealing,
            group_size: None,
            groups: None,
            target_communities: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            min_temperature: DEFAULT_MIN_TEMPERATURE,
            cooling_factor: DEFAULT_COOLING_FACTOR,
            seed: None,
            restarts: 1,
            output_dir: "cluster_results".to_string(),
        }
    }
}

impl Config {
    /// Layer the document's settings over the current values
    pub fn apply_job_settings(&mut self, settings: &JobSettings) {
        if let Some(size) = settings.group_size {
            self.group_size = Some(size);
        }
        if let Some(folder) = &settings.output_folder {
            self.output_dir = folder.clone();
        }
        if let Some(groups) = settings.groups {
            self.groups = Some(groups);
        }
        if let Some(target) = settings.target_communities {
            self.target_communities = Some(target);
        }
        if let Some(strategy) = settings.strategy {
            self.strategy = strategy;
        }
        if let Some(seed) = settings.seed {
            self.seed = Some(seed);
        }
    }

    /// Number of annealing groups for a graph of `node_count` nodes
    pub fn resolve_groups(&self, node_count: usize) -> Result<usize, ClusterError> {
        if let Some(groups) = self.groups {
            return Ok(groups);
        }
        match self.group_size {
            Some(0) => Err(ClusterError::InvalidParameter {
                name: "group_size",
                message: "must be positive",
            }),
            Some(size) => Ok(((node_count + size - 1) / size).max(1)),
            None => Err(ClusterError::EmptyGroupSize),
        }
    }

    /// Annealing parameters for a graph of `node_count` nodes
    pub fn annealing_config(&self, node_count: usize) -> Result<AnnealingConfig, ClusterError> {
        let config = AnnealingConfig {
            groups: self.resolve_groups(node_count)?,
            max_iterations: self.max_iterations,
            initial_temperature: self.initial_temperature,
            min_temperature: self.min_temperature,
            cooling_factor: self.cooling_factor,
            seed: self.seed,
        };
        config.validate(node_count)?;
        Ok(config)
    }

    /// Settings to echo back into the result document
    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            group_size: self.group_size,
            groups: self.groups,
            target_communities: self.target_communities,
            strategy: Some(self.strategy),
            seed: self.seed,
            output_folder: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_size_rounds_up() {
        let config = Config {
            group_size: Some(3),
            ..Config::default()
        };
        assert_eq!(config.resolve_groups(10), Ok(4));
        assert_eq!(config.resolve_groups(9), Ok(3));
        assert_eq!(config.resolve_groups(0), Ok(1));
    }

    #[test]
    fn test_explicit_groups_win() {
        let config = Config {
            group_size: Some(3),
            groups: Some(2),
            ..Config::default()
        };
        assert_eq!(config.resolve_groups(10), Ok(2));
    }

    #[test]
    fn test_missing_or_zero_group_size() {
        let config = Config::default();
        assert_eq!(config.resolve_groups(10), Err(ClusterError::EmptyGroupSize));

        let config = Config {
            group_size: Some(0),
            ..Config::default()
        };
        assert!(config.resolve_groups(10).is_err());
    }

    #[test]
    fn test_job_settings_layering() {
        let mut config = Config::default();
        let settings: JobSettings =
            serde_json::from_str(r#"{"groupSize": 4, "outputFolder": "out", "strategy": "modularity"}"#)
                .unwrap();

        config.apply_job_settings(&settings);
        assert_eq!(config.group_size, Some(4));
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.strategy, Strategy::Modularity);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_annealing_config_validates() {
        let config = Config {
            groups: Some(20),
            ..Config::default()
        };
        assert!(config.annealing_config(10).is_err());

        let config = Config {
            groups: Some(2),
            seed: Some(9),
            ..Config::default()
        };
        let annealing = config.annealing_config(10).unwrap();
        assert_eq!(annealing.groups, 2);
        assert_eq!(annealing.seed, Some(9));
    }
}
