//! Shared helpers for the end-to-end suite.

use threadgraph::{
    CommentEntry, FixtureData, FixtureSource, FixtureThread, GraphStore, Pipeline, RetryConfig,
    RunConfig, RunReport,
};

pub const PERMALINK_A: &str = "https://example.test/r/A/comments/a1/";
pub const PERMALINK_B: &str = "https://example.test/r/B/comments/b1/";

pub fn comments(authors: &[&str]) -> Vec<CommentEntry> {
    authors.iter().map(|a| CommentEntry::comment(Some(*a))).collect()
}

/// Community A: `op` posts, `op`, `u1`, `u2` comment.
/// Community B: `u1` posts, `u3` comments.
pub fn two_community_data() -> FixtureData {
    let mut data = FixtureData::default();
    data.add_thread(
        "A",
        FixtureThread::new(PERMALINK_A, "A", Some("op"), comments(&["op", "u1", "u2"])),
    );
    data.add_thread(
        "B",
        FixtureThread::new(PERMALINK_B, "B", Some("u1"), comments(&["u3"])),
    );
    data
}

/// Config with no sleeping between retries.
pub fn fast_config(communities: &[&str]) -> RunConfig {
    let mut config = RunConfig::for_communities(communities.iter().copied());
    config.retry = RetryConfig::immediate(2);
    config
}

pub fn run(source: &FixtureSource, config: &RunConfig) -> (GraphStore, RunReport) {
    let mut graph = GraphStore::new();
    let report = Pipeline::new(source, config)
        .expect("valid config")
        .run(&mut graph);
    (graph, report)
}

pub fn edge_pairs(graph: &GraphStore) -> Vec<(String, String)> {
    graph
        .snapshot()
        .edges
        .into_iter()
        .map(|e| (e.source, e.target))
        .collect()
}

pub fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}
