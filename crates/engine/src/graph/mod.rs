//! Attributed, undirected co-occurrence graph.
//!
//! Users are nodes keyed by username; a relationship between two users
//! carries the thread permalinks that evidence it, grouped by
//! [`EvidenceKind`]. The graph is simple: at most one relationship per pair
//! and never a self-loop.
//!
//! All mutation goes through [`GraphStore::ensure_node`] and
//! [`GraphStore::record_co_occurrence`], both idempotent.

pub mod adjacency;
mod snapshot;
pub mod types;

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use threadgraph_core::{EvidenceKind, GraphError};

use adjacency::AdjacencyIndex;
use types::*;

/// In-memory co-occurrence graph.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: FxHashMap<String, UserNode>,
    edges: FxHashMap<EdgeKey, Relationship>,
    adjacency: AdjacencyIndex,
}

impl GraphStore {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create `username` if absent and union `community` into its set.
    pub fn ensure_node(&mut self, username: &str, community: &str) -> &UserNode {
        let node = self
            .nodes
            .entry(username.to_string())
            .or_insert_with(|| UserNode::new(username));
        if !node.communities.contains(community) {
            node.communities.insert(community.to_string());
        }
        node
    }

    /// Add `permalink` as `kind` evidence on the edge `{a, b}`.
    ///
    /// Creates the edge if absent. Returns `Ok(true)` when the evidence was
    /// new and `Ok(false)` when it was already recorded. Both endpoints must
    /// already be nodes.
    pub fn record_co_occurrence(
        &mut self,
        a: &str,
        b: &str,
        permalink: &str,
        kind: EvidenceKind,
    ) -> Result<bool, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop {
                user: a.to_string(),
            });
        }
        for user in [a, b] {
            if !self.nodes.contains_key(user) {
                return Err(GraphError::UnknownUser {
                    user: user.to_string(),
                });
            }
        }

        let added = self
            .edges
            .entry(EdgeKey::new(a, b))
            .or_default()
            .add(kind, permalink);
        self.adjacency.add_edge(a, b);
        Ok(added)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Look up a user.
    pub fn node(&self, username: &str) -> Option<&UserNode> {
        self.nodes.get(username)
    }

    /// Whether `username` is a node.
    pub fn contains_node(&self, username: &str) -> bool {
        self.nodes.contains_key(username)
    }

    /// The relationship between `a` and `b`, in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&Relationship> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    /// Users adjacent to `username`, sorted. Empty for unknown users.
    pub fn neighbors(&self, username: &str) -> BTreeSet<String> {
        self.adjacency.neighbors(username)
    }

    /// Number of users adjacent to `username`.
    pub fn degree(&self, username: &str) -> usize {
        self.adjacency.degree(username)
    }

    /// Number of users.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of relationships.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All usernames, sorted.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterate over nodes in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &UserNode> {
        self.nodes.values()
    }

    /// Iterate over relationships in arbitrary order.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Relationship)> {
        self.edges.iter()
    }
}
