//! Core types shared across the threadgraph crates.
//!
//! This crate defines:
//! - `types`: threads, comment trees, user activity records, evidence kinds
//! - `error`: the fetch-boundary error taxonomy and the crate-level `Error`
//! - `config`: run configuration loaded from TOML and CLI overrides

pub mod config;
pub mod error;
pub mod types;

pub use config::{ExportFormat, FetchLimit, OutputConfig, RetryConfig, RunConfig, SourceConfig};
pub use error::{Error, FetchError, FetchResult, GraphError, Result};
pub use types::{
    Comment, CommentEntry, EvidenceKind, MoreComments, Thread, UserComment, UserProfile,
};
