//! The built-in dataset used by debug mode.

use threadgraph::{EvidenceKind, FixtureSource};

use crate::test_utils::*;

#[test]
fn canned_debug_run() {
    let source = FixtureSource::canned().unwrap();
    let mut config = fast_config(&["100pushups", "MakeupAddiction"]);
    config.debug = true;
    let (graph, report) = run(&source, &config);

    assert_eq!(report.build.threads_processed, 2);
    assert_eq!(report.build.expansions_degraded, 0);
    assert!(graph.contains_node("late_arrival"));

    // liner_lover commented in 100pushups and posted in MakeupAddiction.
    let communities: Vec<_> = graph
        .node("liner_lover")
        .unwrap()
        .communities
        .iter()
        .cloned()
        .collect();
    assert_eq!(communities, vec!["100pushups", "MakeupAddiction"]);

    // rep_counter and swatch_queen met in Fitness.
    let rel = graph.edge("rep_counter", "swatch_queen").unwrap();
    assert!(rel.has(EvidenceKind::OutGroup));
    assert!(!rel.has(EvidenceKind::InGroup));
    assert!(!graph.contains_node("strangers_only"));

    // wing_tips met week_six in AskReddit.
    assert!(graph.edge("wing_tips", "week_six").unwrap().has(EvidenceKind::OutGroup));
}
