//! Core graph types for the co-occurrence graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use threadgraph_core::EvidenceKind;

/// A user observed as a thread author or commenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNode {
    /// Case-sensitive username, unique within a graph.
    pub username: String,
    /// Communities the user was observed in. Only ever grows.
    pub communities: BTreeSet<String>,
}

impl UserNode {
    pub(crate) fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            communities: BTreeSet::new(),
        }
    }
}

/// Unordered pair of distinct usernames, stored in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    low: String,
    high: String,
}

impl EdgeKey {
    /// Key for the pair `{a, b}`; argument order does not matter.
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// Lexicographically smaller endpoint.
    pub fn low(&self) -> &str {
        &self.low
    }

    /// Lexicographically larger endpoint.
    pub fn high(&self) -> &str {
        &self.high
    }
}

/// Provenance accumulated on an edge.
///
/// Every stored relationship holds at least one permalink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Permalinks supporting each evidence kind.
    pub evidence: BTreeMap<EvidenceKind, BTreeSet<String>>,
}

impl Relationship {
    /// Add a permalink; returns false when it was already recorded.
    pub fn add(&mut self, kind: EvidenceKind, permalink: &str) -> bool {
        let set = self.evidence.entry(kind).or_default();
        if set.contains(permalink) {
            false
        } else {
            set.insert(permalink.to_string())
        }
    }

    /// Permalinks recorded for `kind`.
    pub fn permalinks(&self, kind: EvidenceKind) -> impl Iterator<Item = &str> {
        self.evidence
            .get(&kind)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Whether any evidence of `kind` exists.
    pub fn has(&self, kind: EvidenceKind) -> bool {
        self.evidence.get(&kind).map_or(false, |s| !s.is_empty())
    }

    /// Total distinct evidence count. Reporting only.
    pub fn weight(&self) -> usize {
        self.evidence.values().map(BTreeSet::len).sum()
    }
}

/// Diagnostic counts over a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Number of users.
    pub node_count: usize,
    /// Number of relationships.
    pub edge_count: usize,
    /// Relationships backed by more than one piece of evidence.
    pub edges_with_weight_gt_1: usize,
    /// Relationships with in-group evidence.
    pub in_group_edges: usize,
    /// Relationships with out-group evidence.
    pub out_group_edges: usize,
    /// Users observed in more than one community.
    pub multi_community_users: usize,
}

/// User overlap between two communities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// First community.
    pub community_a: String,
    /// Second community.
    pub community_b: String,
    /// Users observed in the first community.
    pub users_a: usize,
    /// Users observed in the second community.
    pub users_b: usize,
    /// Users observed in both.
    pub common: usize,
    /// `common / min(users_a, users_b)`; `None` when either side is empty.
    pub overlap_ratio: Option<f64>,
}

/// Node entry of a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Username.
    pub username: String,
    /// Sorted community names.
    pub communities: Vec<String>,
}

/// Edge entry of a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Smaller endpoint.
    pub source: String,
    /// Larger endpoint.
    pub target: String,
    /// Sorted in-group permalinks.
    pub in_group: Vec<String>,
    /// Sorted out-group permalinks.
    pub out_group: Vec<String>,
    /// Total distinct evidence count.
    pub weight: usize,
}

/// Deterministic, sorted view of a graph for export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes sorted by username.
    pub nodes: Vec<NodeRecord>,
    /// Edges sorted by (source, target).
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Number of nodes in the snapshot.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the snapshot.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
