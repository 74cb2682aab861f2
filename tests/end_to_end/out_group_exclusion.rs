//! Out-group evidence only comes from untracked communities.

use threadgraph::{EvidenceKind, FixtureSource, FixtureThread};

use crate::test_utils::*;

#[test]
fn untracked_thread_adds_out_group_evidence() {
    let mut data = two_community_data();
    data.add_unlisted_thread(FixtureThread::new("x1", "Elsewhere", Some("nobody"), comments(&["u2", "u3"])));
    data.user("u2").comments.push("x1".to_string());
    let source = FixtureSource::new(data);
    let (graph, report) = run(&source, &fast_config(&["A", "B"]));

    let rel = graph.edge("u2", "u3").unwrap();
    assert_eq!(rel.permalinks(EvidenceKind::OutGroup).collect::<Vec<_>>(), vec!["x1"]);
    assert!(!rel.has(EvidenceKind::InGroup));
    assert!(!graph.contains_node("nobody"));
    assert_eq!(report.summary.out_group_edges, 1);
}

#[test]
fn tracked_thread_never_out_group() {
    let mut data = two_community_data();
    // Same community as a tracked one, different case.
    data.add_unlisted_thread(FixtureThread::new("a2", "a", Some("nobody"), comments(&["u2", "u3"])));
    data.user("u2").submissions.push("a2".to_string());
    data.user("u1").comments.push(PERMALINK_A.to_string());
    let source = FixtureSource::new(data);
    let (graph, report) = run(&source, &fast_config(&["A", "B"]));

    assert!(graph.edge("u2", "u3").is_none());
    for (_, rel) in graph.edges() {
        assert!(!rel.has(EvidenceKind::OutGroup));
    }
    assert_eq!(report.link.unwrap().threads_excluded_tracked, 2);
}

#[test]
fn parallel_linking_matches_sequential() {
    let mut data = two_community_data();
    data.add_unlisted_thread(FixtureThread::new("x1", "X", None, comments(&["op", "u3", "u2"])));
    for u in ["op", "u2", "u3"] {
        data.user(u).comments.push("x1".to_string());
    }
    let source = FixtureSource::new(data);

    let (sequential, _) = run(&source, &fast_config(&["A", "B"]));
    let mut config = fast_config(&["A", "B"]);
    config.workers = 3;
    let (parallel, _) = run(&source, &config);

    assert_eq!(sequential.snapshot(), parallel.snapshot());
}
