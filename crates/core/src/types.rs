//! Records exchanged between participant sources and the graph engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A top-level post in a community, identified by its permalink.
///
/// The comment tree is not part of the record; sources fetch it lazily
/// through `ParticipantSource::fetch_comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Stable provenance identifier (absolute URL for HTTP sources).
    pub permalink: String,
    /// Display name of the community the thread was posted in.
    pub community: String,
    /// Thread author, `None` when the account or post was deleted.
    #[serde(default)]
    pub author: Option<String>,
}

impl Thread {
    /// Create a thread record.
    pub fn new(
        permalink: impl Into<String>,
        community: impl Into<String>,
        author: Option<&str>,
    ) -> Self {
        Self {
            permalink: permalink.into(),
            community: community.into(),
            author: author.map(str::to_string),
        }
    }
}

/// One entry of a comment tree: either a real comment or a placeholder
/// standing in for comments that were not loaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentEntry {
    /// A loaded comment.
    Comment(Comment),
    /// A "more comments" placeholder.
    More(MoreComments),
}

impl CommentEntry {
    /// Shorthand for a comment without replies.
    pub fn comment(author: Option<&str>) -> Self {
        CommentEntry::Comment(Comment {
            author: author.map(str::to_string),
            replies: Vec::new(),
        })
    }

    /// Shorthand for a comment with nested replies.
    pub fn with_replies(author: Option<&str>, replies: Vec<CommentEntry>) -> Self {
        CommentEntry::Comment(Comment {
            author: author.map(str::to_string),
            replies,
        })
    }
}

/// A loaded comment and its direct replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment author, `None` when deleted.
    #[serde(default)]
    pub author: Option<String>,
    /// Direct replies in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentEntry>,
}

/// Placeholder for a batch of unloaded comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoreComments {
    /// Placeholder identifier.
    pub id: String,
    /// Identifiers of the comments this placeholder hides.
    #[serde(default)]
    pub children: Vec<String>,
    /// Number of hidden comments as reported by the source.
    #[serde(default)]
    pub count: usize,
}

/// A comment from a user's own activity listing, carrying the thread it
/// was posted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserComment {
    /// The thread containing the comment.
    pub thread: Thread,
}

/// Result of a user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Canonical username.
    pub name: String,
    /// Suspended accounts expose no activity.
    #[serde(default)]
    pub suspended: bool,
}

/// Classification of co-occurrence evidence on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Both users took part in the same tracked-community thread.
    InGroup,
    /// Both users were found together in a thread outside the tracked
    /// communities.
    OutGroup,
}

impl EvidenceKind {
    /// Attribute name used by exporters.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::InGroup => "in_group",
            EvidenceKind::OutGroup => "out_group",
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
