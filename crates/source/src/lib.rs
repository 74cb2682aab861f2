//! Participant sources for threadgraph.
//!
//! A [`ParticipantSource`] yields threads, their comment trees and per-user
//! activity. Every call may fail with a [`FetchError`]; callers treat those
//! as retryable or skippable, never fatal.
//!
//! Implementations:
//! - [`FixtureSource`]: offline data loaded from JSON, with failure injection
//! - `RedditSource` (feature `reddit`): blocking HTTP client over the public
//!   JSON endpoints

pub mod fixture;
#[cfg(feature = "reddit")]
pub mod reddit;

pub use fixture::{FixtureData, FixtureFailures, FixtureSource, FixtureThread, FixtureUser};
#[cfg(feature = "reddit")]
pub use reddit::RedditSource;

use threadgraph_core::{
    CommentEntry, FetchError, FetchLimit, FetchResult, MoreComments, Thread, UserComment,
    UserProfile,
};

/// Supplier of interaction records.
///
/// Implementations must be shareable across the linker's worker threads.
pub trait ParticipantSource: Send + Sync {
    /// Top threads of a community, at most `limit` of them, in rank order.
    fn list_top_threads(&self, community: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>>;

    /// The comment tree of a thread as currently loaded, which may contain
    /// placeholders.
    fn fetch_comments(&self, thread: &Thread) -> FetchResult<Vec<CommentEntry>>;

    /// Load the comments hidden behind a placeholder.
    fn expand_more(&self, thread: &Thread, more: &MoreComments) -> FetchResult<Vec<CommentEntry>>;

    /// Look up a user.
    fn get_user(&self, username: &str) -> FetchResult<UserProfile>;

    /// Threads submitted by a user, newest first.
    fn list_user_submissions(&self, username: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>>;

    /// Comments written by a user, newest first.
    fn list_user_comments(&self, username: &str, limit: FetchLimit)
        -> FetchResult<Vec<UserComment>>;
}

impl<S: ParticipantSource + ?Sized> ParticipantSource for Box<S> {
    fn list_top_threads(&self, community: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>> {
        (**self).list_top_threads(community, limit)
    }

    fn fetch_comments(&self, thread: &Thread) -> FetchResult<Vec<CommentEntry>> {
        (**self).fetch_comments(thread)
    }

    fn expand_more(&self, thread: &Thread, more: &MoreComments) -> FetchResult<Vec<CommentEntry>> {
        (**self).expand_more(thread, more)
    }

    fn get_user(&self, username: &str) -> FetchResult<UserProfile> {
        (**self).get_user(username)
    }

    fn list_user_submissions(&self, username: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>> {
        (**self).list_user_submissions(username, limit)
    }

    fn list_user_comments(
        &self,
        username: &str,
        limit: FetchLimit,
    ) -> FetchResult<Vec<UserComment>> {
        (**self).list_user_comments(username, limit)
    }
}

/// Suspended users expose no activity; report them as missing.
pub fn ensure_active(profile: UserProfile) -> FetchResult<UserProfile> {
    if profile.suspended {
        Err(FetchError::not_found(format!("suspended user {}", profile.name)))
    } else {
        Ok(profile)
    }
}
