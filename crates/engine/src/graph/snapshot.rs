//! Graph snapshots, summaries and community overlap.

use threadgraph_core::EvidenceKind;

use super::types::*;
use super::GraphStore;

impl GraphStore {
    /// Diagnostic counts over the current graph.
    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphSummary::default()
        };
        for (_, rel) in self.edges() {
            if rel.weight() > 1 {
                summary.edges_with_weight_gt_1 += 1;
            }
            if rel.has(EvidenceKind::InGroup) {
                summary.in_group_edges += 1;
            }
            if rel.has(EvidenceKind::OutGroup) {
                summary.out_group_edges += 1;
            }
        }
        summary.multi_community_users = self.nodes().filter(|n| n.communities.len() > 1).count();
        summary
    }

    /// How many users were observed in both `a` and `b`.
    ///
    /// Community names compare case-insensitively.
    pub fn community_overlap(&self, a: &str, b: &str) -> OverlapReport {
        let in_community = |node: &UserNode, c: &str| {
            node.communities.iter().any(|x| x.eq_ignore_ascii_case(c))
        };

        let (mut users_a, mut users_b, mut common) = (0, 0, 0);
        for node in self.nodes() {
            let (ia, ib) = (in_community(node, a), in_community(node, b));
            users_a += usize::from(ia);
            users_b += usize::from(ib);
            common += usize::from(ia && ib);
        }

        let smaller = users_a.min(users_b);
        OverlapReport {
            community_a: a.to_string(),
            community_b: b.to_string(),
            users_a,
            users_b,
            common,
            overlap_ratio: (smaller > 0).then(|| common as f64 / smaller as f64),
        }
    }

    /// Deterministic sorted view of the whole graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<NodeRecord> = self
            .nodes()
            .map(|n| NodeRecord {
                username: n.username.clone(),
                communities: n.communities.iter().cloned().collect(),
            })
            .collect();
        nodes.sort_by(|x, y| x.username.cmp(&y.username));

        let mut edges: Vec<EdgeRecord> = self
            .edges()
            .map(|(key, rel)| EdgeRecord {
                source: key.low().to_string(),
                target: key.high().to_string(),
                in_group: rel.permalinks(EvidenceKind::InGroup).map(String::from).collect(),
                out_group: rel.permalinks(EvidenceKind::OutGroup).map(String::from).collect(),
                weight: rel.weight(),
            })
            .collect();
        edges.sort_by(|x, y| (&x.source, &x.target).cmp(&(&y.source, &y.target)));

        GraphSnapshot { nodes, edges }
    }
}
