//! Public types for the threadgraph API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Records and configuration
// ============================================================================

pub use threadgraph_core::{
    Comment, CommentEntry, EvidenceKind, ExportFormat, FetchLimit, MoreComments, OutputConfig,
    RetryConfig, RunConfig, SourceConfig, Thread, UserComment, UserProfile,
};

// Errors
pub use threadgraph_core::{Error, FetchError, FetchResult, GraphError, Result};

// ============================================================================
// Sources
// ============================================================================

pub use threadgraph_source::{
    ensure_active, FixtureData, FixtureFailures, FixtureSource, FixtureThread, FixtureUser,
    ParticipantSource,
};

#[cfg(feature = "reddit")]
pub use threadgraph_source::RedditSource;

// ============================================================================
// Graph engine
// ============================================================================

pub use threadgraph_engine::{
    export_file_name, export_graph, record_thread, BuildReport, CoOccurrenceBuilder,
    CrossCommunityLinker, EdgeKey, EdgeRecord, GraphSnapshot, GraphStore, GraphSummary,
    LinkReport, NodeRecord, OverlapReport, Pipeline, Relationship, RetryPolicy, RunReport,
    UserNode,
};
