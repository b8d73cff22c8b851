//! Mapping between external string identifiers and internal node keys

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::ClusterError;
use crate::graph::NodeId;

/// Bidirectional name/key lookup, created per load and handed to the exporter
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    name_to_key: HashMap<String, NodeId>,
    key_to_name: HashMap<NodeId, String>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name_to_key: HashMap::with_capacity(capacity),
            key_to_name: HashMap::with_capacity(capacity),
        }
    }

    /// Key for `name`, registering it on first use.
    ///
    /// Keys start from the name's hash and are bumped past collisions, so the
    /// result depends on registration order only when two names collide.
    pub fn key_of(&mut self, name: &str) -> NodeId {
        if let Some(&key) = self.name_to_key.get(name) {
            return key;
        }

        let mut key = hash_name(name);
        while self.key_to_name.contains_key(&key) {
            key = key.wrapping_add(1);
        }

        self.name_to_key.insert(name.to_string(), key);
        self.key_to_name.insert(key, name.to_string());
        key
    }

    /// Key for an already registered name
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.name_to_key.get(name).copied()
    }

    /// Name behind a key
    pub fn name_of(&self, key: NodeId) -> Result<&str, ClusterError> {
        self.key_to_name
            .get(&key)
            .map(String::as_str)
            .ok_or(ClusterError::UnknownKey(key))
    }

    pub fn len(&self) -> usize {
        self.name_to_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_key.is_empty()
    }

    /// Register a name under a fixed key; used to force collisions in tests
    #[cfg(test)]
    fn reserve(&mut self, key: NodeId, name: &str) {
        self.name_to_key.insert(name.to_string(), key);
        self.key_to_name.insert(key, name.to_string());
    }
}

fn hash_name(name: &str) -> NodeId {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish() as NodeId
}
