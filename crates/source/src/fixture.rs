//! Offline participant source backed by an in-memory dataset.
//!
//! Used by debug mode (the canned dataset under `fixtures/`) and by tests.
//! Failures can be injected per operation and key, either permanently or
//! for the first N calls ("flaky"), to exercise the engine's skip and retry
//! paths deterministically.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use threadgraph_core::{
    CommentEntry, Error, FetchError, FetchLimit, FetchResult, MoreComments, Result, Thread,
    UserComment, UserProfile,
};

use crate::ParticipantSource;

const CANNED_DATASET: &str = include_str!("../fixtures/debug.json");

/// A thread together with its comment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureThread {
    /// Thread permalink.
    pub permalink: String,
    /// Community the thread belongs to.
    pub community: String,
    /// Thread author, `None` when deleted.
    #[serde(default)]
    pub author: Option<String>,
    /// Comment tree as initially loaded.
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
}

impl FixtureThread {
    /// Build a thread record.
    pub fn new(
        permalink: &str,
        community: &str,
        author: Option<&str>,
        comments: Vec<CommentEntry>,
    ) -> Self {
        Self {
            permalink: permalink.to_string(),
            community: community.to_string(),
            author: author.map(str::to_string),
            comments,
        }
    }

    fn as_thread(&self) -> Thread {
        Thread {
            permalink: self.permalink.clone(),
            community: self.community.clone(),
            author: self.author.clone(),
        }
    }
}

/// A user's own activity, as permalinks into [`FixtureData::threads`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureUser {
    /// Threads the user submitted.
    pub submissions: Vec<String>,
    /// Threads the user commented in, one entry per comment.
    pub comments: Vec<String>,
    /// Suspended accounts.
    pub suspended: bool,
}

/// Keys for which an operation fails.
///
/// Permanent failures return a transient error on every call. Flaky
/// entries fail the first N calls and then succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureFailures {
    /// Communities whose listing fails.
    pub listings: BTreeSet<String>,
    /// Thread permalinks whose comment fetch fails.
    pub comments: BTreeSet<String>,
    /// Placeholder ids whose expansion fails.
    pub expansions: BTreeSet<String>,
    /// Users whose lookup fails.
    pub users: BTreeSet<String>,
    /// Users whose submission listing fails.
    pub submissions: BTreeSet<String>,
    /// Users whose comment listing fails.
    pub user_comments: BTreeSet<String>,
    /// Thread permalinks whose comment fetch fails the first N calls.
    pub flaky_comments: BTreeMap<String, u32>,
    /// Thread permalinks whose comment fetch is rate limited the first N calls.
    pub throttled_comments: BTreeMap<String, u32>,
}

/// Dataset served by a [`FixtureSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureData {
    /// Community name to thread permalinks in rank order.
    pub communities: BTreeMap<String, Vec<String>>,
    /// Threads by permalink.
    pub threads: BTreeMap<String, FixtureThread>,
    /// Placeholder id to the entries it hides.
    pub more: BTreeMap<String, Vec<CommentEntry>>,
    /// Users by name.
    pub users: BTreeMap<String, FixtureUser>,
    /// Injected failures.
    pub failures: FixtureFailures,
}

impl FixtureData {
    /// Parse a JSON dataset.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Read a JSON dataset from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Append a thread to a community's ranking.
    pub fn add_thread(&mut self, community: &str, thread: FixtureThread) -> &mut Self {
        self.communities
            .entry(community.to_string())
            .or_default()
            .push(thread.permalink.clone());
        self.threads.insert(thread.permalink.clone(), thread);
        self
    }

    /// Register a thread reachable only through user activity.
    pub fn add_unlisted_thread(&mut self, thread: FixtureThread) -> &mut Self {
        self.threads.insert(thread.permalink.clone(), thread);
        self
    }

    /// Register the entries hidden behind a placeholder.
    pub fn add_more(&mut self, id: &str, entries: Vec<CommentEntry>) -> &mut Self {
        self.more.insert(id.to_string(), entries);
        self
    }

    /// Mutable access to a user's activity, creating it if absent.
    pub fn user(&mut self, name: &str) -> &mut FixtureUser {
        self.users.entry(name.to_string()).or_default()
    }
}

/// Participant source serving a [`FixtureData`] set.
#[derive(Debug)]
pub struct FixtureSource {
    data: FixtureData,
    flaky: Mutex<BTreeMap<String, u32>>,
    throttled: Mutex<BTreeMap<String, u32>>,
}

impl FixtureSource {
    /// Serve the given dataset.
    pub fn new(data: FixtureData) -> Self {
        let flaky = Mutex::new(data.failures.flaky_comments.clone());
        let throttled = Mutex::new(data.failures.throttled_comments.clone());
        Self {
            data,
            flaky,
            throttled,
        }
    }

    /// Serve the canned dataset used by debug mode.
    pub fn canned() -> Result<Self> {
        Ok(Self::new(FixtureData::from_json_str(CANNED_DATASET)?))
    }

    /// Serve a dataset read from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(FixtureData::load(path)?))
    }

    /// The served dataset.
    pub fn data(&self) -> &FixtureData {
        &self.data
    }

    /// Whether the dataset lists `community`, ignoring ASCII case.
    pub fn has_community(&self, community: &str) -> bool {
        self.community_threads(community).is_some()
    }

    fn community_threads(&self, community: &str) -> Option<&Vec<String>> {
        self.data
            .communities
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(community))
            .map(|(_, links)| links)
    }

    /// Fail every listing of `community`.
    pub fn fail_listing(mut self, community: &str) -> Self {
        self.data.failures.listings.insert(community.to_string());
        self
    }

    /// Fail every comment fetch for `permalink`.
    pub fn fail_comments(mut self, permalink: &str) -> Self {
        self.data.failures.comments.insert(permalink.to_string());
        self
    }

    /// Fail the first `times` comment fetches for `permalink`.
    pub fn flaky_comments(self, permalink: &str, times: u32) -> Self {
        self.flaky.lock().insert(permalink.to_string(), times);
        self
    }

    /// Rate limit the first `times` comment fetches for `permalink`.
    pub fn throttle_comments(self, permalink: &str, times: u32) -> Self {
        self.throttled.lock().insert(permalink.to_string(), times);
        self
    }

    /// Fail every expansion of placeholder `id`.
    pub fn fail_expansion(mut self, id: &str) -> Self {
        self.data.failures.expansions.insert(id.to_string());
        self
    }

    /// Fail every lookup of `user`.
    pub fn fail_user(mut self, user: &str) -> Self {
        self.data.failures.users.insert(user.to_string());
        self
    }

    /// Fail every submission listing of `user`.
    pub fn fail_submissions(mut self, user: &str) -> Self {
        self.data.failures.submissions.insert(user.to_string());
        self
    }

    /// Fail every comment listing of `user`.
    pub fn fail_user_comments(mut self, user: &str) -> Self {
        self.data.failures.user_comments.insert(user.to_string());
        self
    }

    fn thread(&self, permalink: &str, op: &str) -> FetchResult<&FixtureThread> {
        self.data
            .threads
            .get(permalink)
            .ok_or_else(|| FetchError::malformed(op, format!("unknown thread {}", permalink)))
    }

    fn consume(counter: &Mutex<BTreeMap<String, u32>>, key: &str) -> bool {
        let mut guard = counter.lock();
        match guard.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn injected(set: &BTreeSet<String>, key: &str, op: &str) -> FetchResult<()> {
        if set.contains(key) {
            Err(FetchError::transient(op, format!("injected failure for {}", key)))
        } else {
            Ok(())
        }
    }
}

impl ParticipantSource for FixtureSource {
    fn list_top_threads(&self, community: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>> {
        let op = format!("listing {}", community);
        Self::injected(&self.data.failures.listings, community, &op)?;
        let permalinks = self
            .community_threads(community)
            .ok_or_else(|| FetchError::not_found(format!("community {}", community)))?;

        let mut threads = permalinks
            .iter()
            .map(|p| self.thread(p, &op).map(FixtureThread::as_thread))
            .collect::<FetchResult<Vec<_>>>()?;
        limit.truncate(&mut threads);
        Ok(threads)
    }

    fn fetch_comments(&self, thread: &Thread) -> FetchResult<Vec<CommentEntry>> {
        let op = format!("comments {}", thread.permalink);
        Self::injected(&self.data.failures.comments, &thread.permalink, &op)?;
        if Self::consume(&self.throttled, &thread.permalink) {
            return Err(FetchError::exhausted(op, None));
        }
        if Self::consume(&self.flaky, &thread.permalink) {
            return Err(FetchError::transient(op, "flaky fixture"));
        }
        Ok(self.thread(&thread.permalink, &op)?.comments.clone())
    }

    fn expand_more(&self, thread: &Thread, more: &MoreComments) -> FetchResult<Vec<CommentEntry>> {
        let op = format!("expand {} in {}", more.id, thread.permalink);
        Self::injected(&self.data.failures.expansions, &more.id, &op)?;
        self.data
            .more
            .get(&more.id)
            .cloned()
            .ok_or_else(|| FetchError::not_found(format!("placeholder {}", more.id)))
    }

    fn get_user(&self, username: &str) -> FetchResult<UserProfile> {
        Self::injected(&self.data.failures.users, username, &format!("user {}", username))?;
        let suspended = self
            .data
            .users
            .get(username)
            .map_or(false, |u| u.suspended);
        Ok(UserProfile {
            name: username.to_string(),
            suspended,
        })
    }

    fn list_user_submissions(&self, username: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>> {
        let op = format!("submissions of {}", username);
        Self::injected(&self.data.failures.submissions, username, &op)?;
        let Some(user) = self.data.users.get(username) else {
            return Ok(Vec::new());
        };
        let mut threads = user
            .submissions
            .iter()
            .map(|p| self.thread(p, &op).map(FixtureThread::as_thread))
            .collect::<FetchResult<Vec<_>>>()?;
        limit.truncate(&mut threads);
        Ok(threads)
    }

    fn list_user_comments(
        &self,
        username: &str,
        limit: FetchLimit,
    ) -> FetchResult<Vec<UserComment>> {
        let op = format!("comments of {}", username);
        Self::injected(&self.data.failures.user_comments, username, &op)?;
        let Some(user) = self.data.users.get(username) else {
            return Ok(Vec::new());
        };
        let mut comments = user
            .comments
            .iter()
            .map(|p| {
                self.thread(p, &op).map(|t| UserComment {
                    thread: t.as_thread(),
                })
            })
            .collect::<FetchResult<Vec<_>>>()?;
        limit.truncate(&mut comments);
        Ok(comments)
    }
}
