//! Two tracked communities sharing one user.

use threadgraph::{EvidenceKind, FixtureSource};

use crate::test_utils::*;

#[test]
fn builds_expected_graph() {
    let source = FixtureSource::new(two_community_data());
    let mut config = fast_config(&["A", "B"]);
    config.link_out_group = false;
    let (graph, report) = run(&source, &config);

    assert_eq!(graph.usernames(), vec!["op", "u1", "u2", "u3"]);
    assert_eq!(
        edge_pairs(&graph),
        vec![pair("op", "u1"), pair("op", "u2"), pair("u1", "u2"), pair("u1", "u3")]
    );

    for (a, b) in [("op", "u1"), ("op", "u2"), ("u1", "u2")] {
        let rel = graph.edge(a, b).unwrap();
        assert_eq!(
            rel.permalinks(EvidenceKind::InGroup).collect::<Vec<_>>(),
            vec![PERMALINK_A]
        );
        assert!(!rel.has(EvidenceKind::OutGroup));
    }
    let rel = graph.edge("u3", "u1").unwrap();
    assert_eq!(
        rel.permalinks(EvidenceKind::InGroup).collect::<Vec<_>>(),
        vec![PERMALINK_B]
    );

    let communities: Vec<_> = graph.node("u1").unwrap().communities.iter().cloned().collect();
    assert_eq!(communities, vec!["A", "B"]);

    assert_eq!(report.build.threads_processed, 2);
    assert_eq!(report.summary.multi_community_users, 1);
    assert!(report.link.is_none());
}

#[test]
fn overlap_between_communities() {
    let source = FixtureSource::new(two_community_data());
    let mut config = fast_config(&["A", "B"]);
    config.link_out_group = false;
    let (graph, _) = run(&source, &config);

    let overlap = graph.community_overlap("A", "B");
    assert_eq!(overlap.users_a, 3);
    assert_eq!(overlap.users_b, 2);
    assert_eq!(overlap.common, 1);
    assert_eq!(overlap.overlap_ratio, Some(0.5));
}

#[test]
fn rerunning_converges() {
    let source = FixtureSource::new(two_community_data());
    let config = fast_config(&["A", "B"]);
    let (mut graph, _) = run(&source, &config);
    let first = graph.snapshot();

    threadgraph::Pipeline::new(&source, &config)
        .unwrap()
        .run(&mut graph);
    assert_eq!(graph.snapshot(), first);
}
