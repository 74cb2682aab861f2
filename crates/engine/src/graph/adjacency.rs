//! In-memory adjacency index for neighbor lookups.
//!
//! The adjacency index is a materialized view of the graph's edge set.
//! Edges are undirected, so every edge is indexed under both endpoints.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

/// Undirected adjacency index.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    /// user → sorted set of adjacent users
    neighbors: FxHashMap<String, BTreeSet<String>>,
}

impl AdjacencyIndex {
    /// Create a new empty adjacency index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an undirected edge. Returns true if the edge is new.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        let inserted = self
            .neighbors
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.neighbors
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        inserted
    }

    /// Adjacent users of `user`, sorted. Empty for unknown users.
    pub fn neighbors(&self, user: &str) -> BTreeSet<String> {
        self.neighbors.get(user).cloned().unwrap_or_default()
    }

    /// Number of adjacent users.
    pub fn degree(&self, user: &str) -> usize {
        self.neighbors.get(user).map_or(0, BTreeSet::len)
    }
}
