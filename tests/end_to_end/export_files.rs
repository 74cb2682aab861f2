//! Exported files land where the run's file name says.

use chrono::{TimeZone, Utc};
use threadgraph::{export_file_name, export_graph, ExportFormat, FixtureSource, GraphSnapshot};

use crate::test_utils::*;

#[test]
fn json_export_matches_snapshot() {
    let source = FixtureSource::new(two_community_data());
    let config = fast_config(&["A", "B"]);
    let (graph, _) = run(&source, &config);

    let dir = tempfile::tempdir().unwrap();
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    let name = export_file_name(
        &config.communities,
        config.effective_thread_limit(),
        ts,
        ExportFormat::Json,
    );
    assert_eq!(name, "A.B.co_occurrence.limit_5.20240501T083000Z.json");

    let path = dir.path().join(&name);
    export_graph(&graph, &path, ExportFormat::Json).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let back: GraphSnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(back, graph.snapshot());
}

#[test]
fn gexf_export_lists_every_node() {
    let source = FixtureSource::new(two_community_data());
    let (graph, _) = run(&source, &fast_config(&["A", "B"]));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gexf");
    export_graph(&graph, &path, ExportFormat::Gexf).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    for user in ["op", "u1", "u2", "u3"] {
        assert!(text.contains(&format!(r#"<node id="{user}""#)));
    }
    assert!(text.contains(r#"value="A,B""#));
}
