//! Graph export: GEXF 1.2, JSON and CSV edge lists.
//!
//! Exports are rendered from a [`GraphSnapshot`], so output is sorted and
//! byte-stable for a given graph.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use threadgraph_core::{Error, ExportFormat, FetchLimit, Result};

use crate::graph::types::GraphSnapshot;
use crate::graph::GraphStore;

const GEXF_NS: &str = "http://www.gexf.net/1.2draft";

/// File name for an export:
/// `<c1>[.<c2>...].co_occurrence.limit_<N|none>.<timestamp>.<ext>`.
///
/// The timestamp uses the ISO-8601 basic format (`20240131T235959Z`), which
/// is safe on every filesystem.
pub fn export_file_name(
    communities: &[String],
    limit: FetchLimit,
    timestamp: DateTime<Utc>,
    format: ExportFormat,
) -> String {
    format!(
        "{}.co_occurrence.limit_{}.{}.{}",
        communities.join("."),
        limit,
        timestamp.format("%Y%m%dT%H%M%SZ"),
        format.extension()
    )
}

/// Write `graph` to `path` in `format`, creating parent directories.
pub fn export_graph(graph: &GraphStore, path: &Path, format: ExportFormat) -> Result<()> {
    let snapshot = graph.snapshot();
    let body = render(&snapshot, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    tracing::info!(
        target: "threadgraph::export",
        path = %path.display(),
        format = format.extension(),
        nodes = snapshot.node_count(),
        edges = snapshot.edge_count(),
        "Graph exported"
    );
    Ok(())
}

/// Render a snapshot in `format`.
pub fn render(snapshot: &GraphSnapshot, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Gexf => Ok(to_gexf(snapshot)),
        ExportFormat::Json => {
            serde_json::to_string_pretty(snapshot).map_err(|e| Error::serialization(e.to_string()))
        }
        ExportFormat::Csv => Ok(to_csv(snapshot)),
    }
}

// =============================================================================
// GEXF
// =============================================================================

/// Render as GEXF 1.2 with an undirected edge set.
///
/// Node attribute `communities` and edge attributes `in_group` and
/// `out_group` are comma-joined sorted strings.
pub fn to_gexf(snapshot: &GraphSnapshot) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_gexf(snapshot, &mut out);
    out
}

fn write_gexf(snapshot: &GraphSnapshot, out: &mut String) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<gexf xmlns="{}" version="1.2">"#, GEXF_NS)?;
    writeln!(out, r#"  <meta><creator>threadgraph</creator></meta>"#)?;
    writeln!(out, r#"  <graph mode="static" defaultedgetype="undirected">"#)?;
    writeln!(out, r#"    <attributes class="node">"#)?;
    writeln!(out, r#"      <attribute id="communities" title="communities" type="string"/>"#)?;
    writeln!(out, r#"    </attributes>"#)?;
    writeln!(out, r#"    <attributes class="edge">"#)?;
    writeln!(out, r#"      <attribute id="in_group" title="in_group" type="string"/>"#)?;
    writeln!(out, r#"      <attribute id="out_group" title="out_group" type="string"/>"#)?;
    writeln!(out, r#"    </attributes>"#)?;

    writeln!(out, "    <nodes>")?;
    for node in &snapshot.nodes {
        let id = escape_xml(&node.username);
        writeln!(out, r#"      <node id="{id}" label="{id}">"#)?;
        writeln!(
            out,
            r#"        <attvalues><attvalue for="communities" value="{}"/></attvalues>"#,
            escape_xml(&node.communities.join(","))
        )?;
        writeln!(out, "      </node>")?;
    }
    writeln!(out, "    </nodes>")?;

    writeln!(out, "    <edges>")?;
    for (i, edge) in snapshot.edges.iter().enumerate() {
        writeln!(
            out,
            r#"      <edge id="{}" source="{}" target="{}" weight="{}">"#,
            i,
            escape_xml(&edge.source),
            escape_xml(&edge.target),
            edge.weight
        )?;
        writeln!(out, "        <attvalues>")?;
        writeln!(
            out,
            r#"          <attvalue for="in_group" value="{}"/>"#,
            escape_xml(&edge.in_group.join(","))
        )?;
        writeln!(
            out,
            r#"          <attvalue for="out_group" value="{}"/>"#,
            escape_xml(&edge.out_group.join(","))
        )?;
        writeln!(out, "        </attvalues>")?;
        writeln!(out, "      </edge>")?;
    }
    writeln!(out, "    </edges>")?;
    writeln!(out, "  </graph>")?;
    writeln!(out, "</gexf>")
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

// =============================================================================
// CSV
// =============================================================================

/// Render the edge list as CSV: `source,target,weight,in_group,out_group`.
///
/// Permalinks within a field are separated by spaces.
pub fn to_csv(snapshot: &GraphSnapshot) -> String {
    let mut out = String::from("source,target,weight,in_group,out_group\n");
    for edge in &snapshot.edges {
        let row = [
            csv_field(&edge.source),
            csv_field(&edge.target),
            edge.weight.to_string(),
            csv_field(&edge.in_group.join(" ")),
            csv_field(&edge.out_group.join(" ")),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
