//! Typed errors for graph construction and the clustering engines

use thiserror::Error;

use crate::graph::NodeId;

/// Errors returned by the clustering engines and their configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// Requested group count is zero or exceeds the number of nodes
    #[error("cannot split {nodes} nodes into {requested} groups")]
    InvalidGroupCount {
        /// Requested K
        requested: usize,
        /// Nodes available
        nodes: usize,
    },

    /// Target community count must be at least one
    #[error("target community count must be positive")]
    InvalidTargetCount,

    /// Neither a group count nor a usable group size was supplied
    #[error("a positive group size or an explicit group count is required")]
    EmptyGroupSize,

    /// A numeric parameter is out of its valid range
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        message: &'static str,
    },

    /// Key has no registered name
    #[error("unknown node key {0}")]
    UnknownKey(NodeId),
}
