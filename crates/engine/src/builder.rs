//! In-group phase: turn tracked-community threads into graph mutations.
//!
//! Each thread becomes a clique over its participants. The thread author
//! joins first; every later commenter is linked to everyone who appeared
//! before them in the same thread, with the thread permalink recorded as
//! `in_group` evidence.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use threadgraph_core::{CommentEntry, EvidenceKind, FetchLimit, MoreComments, RunConfig, Thread};
use threadgraph_source::ParticipantSource;

use crate::graph::GraphStore;
use crate::retry::RetryPolicy;

/// Counters from one in-group phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Communities whose listing was fetched.
    pub communities_listed: usize,
    /// Communities whose listing failed.
    pub communities_failed: usize,
    /// Threads returned by listings.
    pub threads_seen: usize,
    /// Threads whose participants were recorded.
    pub threads_processed: usize,
    /// Threads skipped because the author was deleted.
    pub threads_skipped_deleted: usize,
    /// Threads skipped because their comments could not be fetched.
    pub threads_failed: usize,
    /// Threads whose placeholder expansion stopped early.
    pub expansions_degraded: usize,
    /// New in-group evidence entries.
    pub in_group_evidence_added: usize,
}

impl BuildReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: &BuildReport) {
        self.communities_listed += other.communities_listed;
        self.communities_failed += other.communities_failed;
        self.threads_seen += other.threads_seen;
        self.threads_processed += other.threads_processed;
        self.threads_skipped_deleted += other.threads_skipped_deleted;
        self.threads_failed += other.threads_failed;
        self.expansions_degraded += other.expansions_degraded;
        self.in_group_evidence_added += other.in_group_evidence_added;
    }
}

// =============================================================================
// Comment loading
// =============================================================================

/// Commenters of one thread, flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadComments {
    /// Comment authors in breadth-first order; `None` for deleted authors.
    pub authors: Vec<Option<String>>,
    /// True when a placeholder expansion failed and loading stopped early.
    pub degraded: bool,
}

/// Fetches a thread's comment tree, expands placeholders and flattens it.
#[derive(Debug, Clone)]
pub struct CommentLoader {
    expand_more: bool,
    more_expansion_limit: FetchLimit,
    max_comments: FetchLimit,
}

impl CommentLoader {
    /// Loader using the limits in `config`.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            expand_more: config.expand_more,
            more_expansion_limit: config.more_expansion_limit,
            max_comments: config.effective_max_comments(),
        }
    }

    /// Load the commenters of `thread`.
    ///
    /// A failure fetching the tree itself is returned. A failure expanding a
    /// placeholder stops expansion and keeps what was already loaded.
    pub fn load<S>(
        &self,
        source: &S,
        retry: &RetryPolicy,
        thread: &Thread,
    ) -> threadgraph_core::FetchResult<ThreadComments>
    where
        S: ParticipantSource + ?Sized,
    {
        let op = format!("comments of {}", thread.permalink);
        let tree = retry.run(&op, || source.fetch_comments(thread))?;

        let mut out = ThreadComments::default();
        let mut pending = VecDeque::new();
        flatten(&tree, &mut out.authors, &mut pending);

        let mut expanded = 0;
        while let Some(more) = pending.pop_front() {
            if !self.expand_more || self.more_expansion_limit.is_reached(expanded) {
                tracing::trace!(
                    target: "threadgraph::builder",
                    permalink = %thread.permalink,
                    placeholder = %more.id,
                    "Leaving placeholder unexpanded"
                );
                continue;
            }
            let op = format!("expand {} in {}", more.id, thread.permalink);
            match retry.run(&op, || source.expand_more(thread, &more)) {
                Ok(entries) => {
                    expanded += 1;
                    flatten(&entries, &mut out.authors, &mut pending);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "threadgraph::builder",
                        permalink = %thread.permalink,
                        placeholder = %more.id,
                        error = %e,
                        "Placeholder expansion failed, using comments loaded so far"
                    );
                    out.degraded = true;
                    break;
                }
            }
        }

        self.max_comments.truncate(&mut out.authors);
        Ok(out)
    }
}

/// Breadth-first flattening: top-level entries in order, then their
/// replies level by level. Placeholders are queued for expansion.
fn flatten(
    entries: &[CommentEntry],
    authors: &mut Vec<Option<String>>,
    pending: &mut VecDeque<MoreComments>,
) {
    let mut queue: VecDeque<&CommentEntry> = entries.iter().collect();
    while let Some(entry) = queue.pop_front() {
        match entry {
            CommentEntry::Comment(comment) => {
                authors.push(comment.author.clone());
                queue.extend(comment.replies.iter());
            }
            CommentEntry::More(more) => pending.push_back(more.clone()),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds in-group evidence from the top threads of tracked communities.
pub struct CoOccurrenceBuilder<'a, S: ?Sized> {
    source: &'a S,
    retry: RetryPolicy,
    thread_limit: FetchLimit,
    loader: CommentLoader,
}

impl<'a, S> CoOccurrenceBuilder<'a, S>
where
    S: ParticipantSource + ?Sized,
{
    /// Builder reading from `source` with the limits in `config`.
    pub fn new(source: &'a S, config: &RunConfig) -> Self {
        Self {
            source,
            retry: RetryPolicy::from_config(&config.retry),
            thread_limit: config.effective_thread_limit(),
            loader: CommentLoader::from_config(config),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Process every community in order.
    pub fn build(&self, graph: &mut GraphStore, communities: &[String]) -> BuildReport {
        let mut report = BuildReport::default();
        for community in communities {
            report.merge(&self.build_community(graph, community));
        }
        report
    }

    /// Process the top threads of one community.
    ///
    /// A failed listing skips the community.
    pub fn build_community(&self, graph: &mut GraphStore, community: &str) -> BuildReport {
        let mut report = BuildReport::default();
        let op = format!("top threads of {}", community);
        let threads = match self
            .retry
            .run(&op, || self.source.list_top_threads(community, self.thread_limit))
        {
            Ok(threads) => threads,
            Err(e) => {
                tracing::warn!(
                    target: "threadgraph::builder",
                    community,
                    error = %e,
                    "Skipping community, listing failed"
                );
                report.communities_failed += 1;
                return report;
            }
        };
        report.communities_listed += 1;
        report.threads_seen += threads.len();

        for thread in &threads {
            self.process_thread(graph, thread, &mut report);
        }

        tracing::info!(
            target: "threadgraph::builder",
            community,
            threads = report.threads_seen,
            processed = report.threads_processed,
            failed = report.threads_failed,
            evidence = report.in_group_evidence_added,
            "Community processed"
        );
        report
    }

    fn process_thread(&self, graph: &mut GraphStore, thread: &Thread, report: &mut BuildReport) {
        let Some(author) = thread.author.as_deref() else {
            tracing::trace!(
                target: "threadgraph::builder",
                permalink = %thread.permalink,
                "Skipping thread with deleted author"
            );
            report.threads_skipped_deleted += 1;
            return;
        };

        let comments = match self.loader.load(self.source, &self.retry, thread) {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!(
                    target: "threadgraph::builder",
                    permalink = %thread.permalink,
                    error = %e,
                    "Skipping thread, comments unavailable"
                );
                report.threads_failed += 1;
                return;
            }
        };
        if comments.degraded {
            report.expansions_degraded += 1;
        }

        let added = record_thread(
            graph,
            thread,
            author,
            comments.authors.iter().map(Option::as_deref),
        );
        report.threads_processed += 1;
        report.in_group_evidence_added += added;

        tracing::debug!(
            target: "threadgraph::builder",
            permalink = %thread.permalink,
            comments = comments.authors.len(),
            evidence = added,
            "Thread processed"
        );
    }
}

/// Record one thread as a clique of its participants.
///
/// `commenters` are visited in order; `None` entries are deleted authors and
/// are skipped. Returns the number of new evidence entries.
pub fn record_thread<'c, I>(
    graph: &mut GraphStore,
    thread: &Thread,
    author: &str,
    commenters: I,
) -> usize
where
    I: IntoIterator<Item = Option<&'c str>>,
{
    graph.ensure_node(author, &thread.community);
    let mut participants = vec![author.to_string()];
    let mut seen: FxHashSet<String> = participants.iter().cloned().collect();
    let mut added = 0;

    for commenter in commenters {
        let Some(commenter) = commenter else {
            tracing::trace!(
                target: "threadgraph::builder",
                permalink = %thread.permalink,
                "Skipping comment with deleted author"
            );
            continue;
        };
        graph.ensure_node(commenter, &thread.community);
        if seen.contains(commenter) {
            continue;
        }
        for prior in &participants {
            match graph.record_co_occurrence(
                prior,
                commenter,
                &thread.permalink,
                EvidenceKind::InGroup,
            ) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(
                    target: "threadgraph::builder",
                    permalink = %thread.permalink,
                    error = %e,
                    "Co-occurrence rejected"
                ),
            }
        }
        seen.insert(commenter.to_string());
        participants.push(commenter.to_string());
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadgraph_source::{FixtureData, FixtureSource, FixtureThread};

    fn c(author: &str) -> CommentEntry {
        CommentEntry::comment(Some(author))
    }

    fn more(id: &str) -> CommentEntry {
        CommentEntry::More(MoreComments {
            id: id.to_string(),
            children: Vec::new(),
            count: 1,
        })
    }

    fn config(communities: &[&str]) -> RunConfig {
        let mut config = RunConfig::for_communities(communities.iter().copied());
        config.retry = threadgraph_core::RetryConfig::immediate(2);
        config
    }

    fn run(source: &FixtureSource, config: &RunConfig) -> (GraphStore, BuildReport) {
        let mut graph = GraphStore::new();
        let report = CoOccurrenceBuilder::new(source, config).build(&mut graph, &config.communities);
        (graph, report)
    }

    fn edges(graph: &GraphStore) -> Vec<(String, String)> {
        graph
            .snapshot()
            .edges
            .into_iter()
            .map(|e| (e.source, e.target))
            .collect()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    // =========================================================================
    // Clique construction
    // =========================================================================

    #[test]
    fn thread_becomes_clique() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("pa", "A", Some("A1"), vec![c("B1"), c("C1")]));
        let (graph, report) = run(&FixtureSource::new(data), &config(&["A"]));

        assert_eq!(
            edges(&graph),
            vec![pair("A1", "B1"), pair("A1", "C1"), pair("B1", "C1")]
        );
        for (a, b) in [("A1", "B1"), ("A1", "C1"), ("B1", "C1")] {
            let rel = graph.edge(a, b).unwrap();
            assert_eq!(rel.permalinks(EvidenceKind::InGroup).collect::<Vec<_>>(), vec!["pa"]);
        }
        assert_eq!(report.threads_processed, 1);
        assert_eq!(report.in_group_evidence_added, 3);
    }

    #[test]
    fn author_commenting_adds_no_self_loop() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("pa", "A", Some("op"), vec![c("op"), c("u1")]));
        let (graph, _) = run(&FixtureSource::new(data), &config(&["A"]));
        assert_eq!(edges(&graph), vec![pair("op", "u1")]);
    }

    #[test]
    fn repeat_commenter_linked_once() {
        let mut data = FixtureData::default();
        data.add_thread(
            "A",
            FixtureThread::new("pa", "A", Some("op"), vec![c("u1"), c("u2"), c("u1")]),
        );
        let (graph, report) = run(&FixtureSource::new(data), &config(&["A"]));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(report.in_group_evidence_added, 3);
        assert_eq!(graph.edge("op", "u1").unwrap().weight(), 1);
    }

    #[test]
    fn nested_replies_are_participants() {
        let mut data = FixtureData::default();
        data.add_thread(
            "A",
            FixtureThread::new(
                "pa",
                "A",
                Some("op"),
                vec![CommentEntry::with_replies(Some("u1"), vec![c("u2")])],
            ),
        );
        let (graph, _) = run(&FixtureSource::new(data), &config(&["A"]));
        assert!(graph.edge("op", "u2").is_some());
        assert!(graph.edge("u1", "u2").is_some());
    }

    #[test]
    fn deleted_thread_author_skips_thread() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("pa", "A", None, vec![c("u1"), c("u2")]));
        let (graph, report) = run(&FixtureSource::new(data), &config(&["A"]));
        assert_eq!(graph.node_count(), 0);
        assert_eq!(report.threads_skipped_deleted, 1);
        assert_eq!(report.threads_processed, 0);
    }

    #[test]
    fn deleted_commenters_and_placeholders_skipped() {
        let mut data = FixtureData::default();
        data.add_thread(
            "A",
            FixtureThread::new("pa", "A", Some("op"), vec![CommentEntry::comment(None), more("m"), c("u1")]),
        );
        let mut config = config(&["A"]);
        config.expand_more = false;
        let (graph, _) = run(&FixtureSource::new(data), &config);
        assert_eq!(graph.usernames(), vec!["op", "u1"]);
        assert_eq!(edges(&graph), vec![pair("op", "u1")]);
    }

    #[test]
    fn node_communities_follow_thread() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("pa", "A", Some("op"), vec![c("u1")]));
        data.add_thread("B", FixtureThread::new("pb", "B", Some("u1"), vec![c("u3")]));
        let (graph, _) = run(&FixtureSource::new(data), &config(&["A", "B"]));
        let communities: Vec<_> = graph.node("u1").unwrap().communities.iter().cloned().collect();
        assert_eq!(communities, vec!["A", "B"]);
    }

    // =========================================================================
    // Failure handling
    // =========================================================================

    #[test]
    fn failed_thread_does_not_stop_others() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("p1", "A", Some("a"), vec![c("b")]));
        data.add_thread("A", FixtureThread::new("p2", "A", Some("c"), vec![c("d")]));
        data.add_thread("A", FixtureThread::new("p3", "A", Some("e"), vec![c("f")]));
        let source = FixtureSource::new(data).fail_comments("p2");
        let (graph, report) = run(&source, &config(&["A"]));

        assert_eq!(edges(&graph), vec![pair("a", "b"), pair("e", "f")]);
        assert!(!graph.contains_node("c"));
        assert_eq!(report.threads_failed, 1);
        assert_eq!(report.threads_processed, 2);
    }

    #[test]
    fn flaky_comments_recovered_by_retry() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("p1", "A", Some("a"), vec![c("b")]));
        let source = FixtureSource::new(data).flaky_comments("p1", 1);
        let (graph, report) = run(&source, &config(&["A"]));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(report.threads_failed, 0);
    }

    #[test]
    fn throttled_comments_recovered_by_retry() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("p1", "A", Some("a"), vec![c("b")]));
        let source = FixtureSource::new(data).throttle_comments("p1", 1);
        let (graph, _) = run(&source, &config(&["A"]));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn failed_listing_skips_community() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("p1", "A", Some("a"), vec![c("b")]));
        data.add_thread("B", FixtureThread::new("p2", "B", Some("x"), vec![c("y")]));
        let source = FixtureSource::new(data).fail_listing("A");
        let (graph, report) = run(&source, &config(&["A", "B"]));
        assert_eq!(report.communities_failed, 1);
        assert_eq!(report.communities_listed, 1);
        assert_eq!(edges(&graph), vec![pair("x", "y")]);
    }

    #[test]
    fn thread_limit_bounds_listing() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("p1", "A", Some("a"), vec![c("b")]));
        data.add_thread("A", FixtureThread::new("p2", "A", Some("c"), vec![c("d")]));
        let mut config = config(&["A"]);
        config.thread_limit = Some(FetchLimit::max(1));
        let (graph, report) = run(&FixtureSource::new(data), &config);
        assert_eq!(report.threads_seen, 1);
        assert_eq!(edges(&graph), vec![pair("a", "b")]);
    }

    // =========================================================================
    // Placeholder expansion
    // =========================================================================

    #[test]
    fn placeholders_expand_into_participants() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("pa", "A", Some("op"), vec![c("u1"), more("m1")]));
        data.add_more("m1", vec![c("u2"), more("m2")]);
        data.add_more("m2", vec![c("u3")]);
        let (graph, report) = run(&FixtureSource::new(data), &config(&["A"]));
        assert_eq!(graph.usernames(), vec!["op", "u1", "u2", "u3"]);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(report.expansions_degraded, 0);
    }

    #[test]
    fn expansion_failure_keeps_loaded_comments() {
        let mut data = FixtureData::default();
        data.add_thread(
            "A",
            FixtureThread::new("pa", "A", Some("op"), vec![c("u1"), more("m1"), more("m2")]),
        );
        data.add_more("m1", vec![c("u2")]);
        data.add_more("m2", vec![c("u3")]);
        let source = FixtureSource::new(data).fail_expansion("m1");
        let (graph, report) = run(&source, &config(&["A"]));
        assert_eq!(graph.usernames(), vec!["op", "u1"]);
        assert_eq!(report.threads_processed, 1);
        assert_eq!(report.expansions_degraded, 1);
    }

    #[test]
    fn expansion_limit_respected() {
        let mut data = FixtureData::default();
        data.add_thread("A", FixtureThread::new("pa", "A", Some("op"), vec![more("m1"), more("m2")]));
        data.add_more("m1", vec![c("u1")]);
        data.add_more("m2", vec![c("u2")]);
        let mut config = config(&["A"]);
        config.more_expansion_limit = FetchLimit::max(1);
        let (graph, _) = run(&FixtureSource::new(data), &config);
        assert_eq!(graph.usernames(), vec!["op", "u1"]);
    }

    #[test]
    fn max_comments_truncates_flattened_sequence() {
        let mut data = FixtureData::default();
        data.add_thread(
            "A",
            FixtureThread::new(
                "pa",
                "A",
                Some("op"),
                vec![CommentEntry::with_replies(Some("u1"), vec![c("u3")]), c("u2")],
            ),
        );
        let mut config = config(&["A"]);
        config.max_comments_per_thread = Some(FetchLimit::max(2));
        let (graph, _) = run(&FixtureSource::new(data), &config);
        // breadth-first: u1, u2, then u3
        assert_eq!(graph.usernames(), vec!["op", "u1", "u2"]);
    }

    #[test]
    fn record_thread_is_idempotent() {
        let thread = Thread::new("pa", "A", Some("op"));
        let mut graph = GraphStore::new();
        let commenters = [Some("u1"), None, Some("u2")];
        assert_eq!(record_thread(&mut graph, &thread, "op", commenters), 3);
        let before = graph.snapshot();
        assert_eq!(record_thread(&mut graph, &thread, "op", commenters), 0);
        assert_eq!(graph.snapshot(), before);
    }
}
