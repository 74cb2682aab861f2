//! Failed units are skipped without aborting the run.

use threadgraph::{FixtureData, FixtureSource, FixtureThread};

use crate::test_utils::*;

fn three_threads() -> FixtureData {
    let mut data = FixtureData::default();
    data.add_thread("A", FixtureThread::new("t1", "A", Some("a1"), comments(&["a2"])));
    data.add_thread("A", FixtureThread::new("t2", "A", Some("b1"), comments(&["b2"])));
    data.add_thread("A", FixtureThread::new("t3", "A", Some("c1"), comments(&["c2"])));
    data
}

#[test]
fn second_of_three_threads_failing() {
    let source = FixtureSource::new(three_threads()).fail_comments("t2");
    let (graph, report) = run(&source, &fast_config(&["A"]));

    assert_eq!(edge_pairs(&graph), vec![pair("a1", "a2"), pair("c1", "c2")]);
    assert_eq!(report.build.threads_failed, 1);
    assert_eq!(report.build.threads_processed, 2);
}

#[test]
fn transient_failure_retried_within_budget() {
    let source = FixtureSource::new(three_threads()).flaky_comments("t2", 1);
    let (graph, report) = run(&source, &fast_config(&["A"]));
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(report.build.threads_failed, 0);
}

#[test]
fn failing_community_does_not_stop_the_other() {
    let source = FixtureSource::new(two_community_data()).fail_listing("A");
    let (graph, report) = run(&source, &fast_config(&["A", "B"]));
    assert_eq!(edge_pairs(&graph), vec![pair("u1", "u3")]);
    assert_eq!(report.build.communities_failed, 1);
}

#[test]
fn unknown_community_is_skipped() {
    let source = FixtureSource::new(two_community_data());
    let (graph, report) = run(&source, &fast_config(&["A", "nope"]));
    assert_eq!(graph.node_count(), 3);
    assert_eq!(report.build.communities_failed, 1);
}

#[test]
fn failed_user_keeps_node() {
    let mut data = two_community_data();
    data.add_unlisted_thread(FixtureThread::new("x1", "X", None, comments(&["op", "u3"])));
    data.user("op").comments.push("x1".to_string());
    let source = FixtureSource::new(data).fail_user("op");
    let (graph, report) = run(&source, &fast_config(&["A", "B"]));

    assert!(graph.contains_node("op"));
    let link = report.link.unwrap();
    assert_eq!(link.users_failed, 1);
    assert_eq!(link.out_group_evidence_added, 0);
}
