//! Co-occurrence graph engine.
//!
//! This crate defines:
//! - `graph`: the in-memory attributed graph, snapshots and summaries
//! - `retry`: the retry and cool-down discipline around source calls
//! - `builder`: the in-group clique-per-thread phase
//! - `linker`: the out-group phase over users' own activity
//! - `pipeline`: a full run over both phases
//! - `export`: GEXF, JSON and CSV output

pub mod builder;
pub mod export;
pub mod graph;
pub mod linker;
pub mod pipeline;
pub mod retry;

pub use builder::{record_thread, BuildReport, CoOccurrenceBuilder, CommentLoader, ThreadComments};
pub use export::{export_file_name, export_graph, render};
pub use graph::types::{
    EdgeKey, EdgeRecord, GraphSnapshot, GraphSummary, NodeRecord, OverlapReport, Relationship,
    UserNode,
};
pub use graph::GraphStore;
pub use linker::{CrossCommunityLinker, LinkReport};
pub use pipeline::{Pipeline, RunReport};
pub use retry::RetryPolicy;
