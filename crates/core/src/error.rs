//! Error types for threadgraph.
//!
//! Fetch-boundary failures ([`FetchError`]) are caught at the smallest unit
//! of work (one thread, one user) and never abort a run. [`Error`] covers
//! everything else: configuration, client construction, export I/O.

use std::time::Duration;
use thiserror::Error;

/// Result alias for source calls.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result alias for crate-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by a participant source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network hiccup or upstream 5xx.
    #[error("transient failure during {op}: {reason}")]
    Transient {
        /// Operation that failed.
        op: String,
        /// Upstream description.
        reason: String,
    },
    /// Upstream throttling.
    #[error("rate limited during {op}")]
    ResourceExhausted {
        /// Operation that failed.
        op: String,
        /// Wait requested by upstream, if any.
        retry_after: Option<Duration>,
    },
    /// Deleted user, suspended account or removed thread.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },
    /// Upstream payload could not be decoded.
    #[error("malformed response during {op}: {reason}")]
    Malformed {
        /// Operation that failed.
        op: String,
        /// Decoder message.
        reason: String,
    },
}

impl FetchError {
    /// Build a transient error.
    pub fn transient(op: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Transient {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Build a rate-limit error.
    pub fn exhausted(op: impl Into<String>, retry_after: Option<Duration>) -> Self {
        FetchError::ResourceExhausted {
            op: op.into(),
            retry_after,
        }
    }

    /// Build a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        FetchError::NotFound { what: what.into() }
    }

    /// Build a decode error.
    pub fn malformed(op: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Malformed {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Whether repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transient { .. } | FetchError::ResourceExhausted { .. }
        )
    }
}

/// Rejected graph mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A user cannot be linked to themselves.
    #[error("refusing self-loop on user '{user}'")]
    SelfLoop {
        /// The user named on both ends.
        user: String,
    },
    /// Edge endpoints must already be nodes.
    #[error("user '{user}' is not a node in the graph")]
    UnknownUser {
        /// The missing user.
        user: String,
    },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// The fetch client could not be constructed.
    #[error("failed to construct fetch client: {0}")]
    Client(String),
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Rejected graph mutation.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Fetch failure that reached a caller which does not skip it.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl Error {
    /// Build a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config(reason.into())
    }

    /// Build a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Error::Serialization(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_exhausted_are_retryable() {
        assert!(FetchError::transient("listing", "reset").is_retryable());
        assert!(FetchError::exhausted("listing", None).is_retryable());
    }

    #[test]
    fn not_found_and_malformed_are_not_retryable() {
        assert!(!FetchError::not_found("user ghost").is_retryable());
        assert!(!FetchError::malformed("listing", "eof").is_retryable());
    }

    #[test]
    fn display_includes_operation() {
        let e = FetchError::transient("comments /r/a/1", "timed out");
        assert_eq!(e.to_string(), "transient failure during comments /r/a/1: timed out");
    }

    #[test]
    fn graph_error_converts_into_error() {
        let e: Error = GraphError::SelfLoop {
            user: "a".to_string(),
        }
        .into();
        assert!(matches!(e, Error::Graph(GraphError::SelfLoop { .. })));
        assert_eq!(e.to_string(), "refusing self-loop on user 'a'");
    }
}
