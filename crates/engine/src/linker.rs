//! Out-group phase: find tracked users together outside the tracked
//! communities.
//!
//! For each user already in the graph, the linker reads the user's own
//! submissions and comments, collects the threads they point at, drops those
//! posted in a tracked community, and links the user to every other graph
//! member commenting in the remaining threads. Evidence is recorded as
//! `out_group`. This phase never adds nodes.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use threadgraph_core::{EvidenceKind, FetchError, FetchLimit, RunConfig, Thread};
use threadgraph_source::{ensure_active, ParticipantSource};

use crate::builder::CommentLoader;
use crate::graph::GraphStore;
use crate::retry::RetryPolicy;

/// Counters from one out-group phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Users whose activity was read.
    pub users_scanned: usize,
    /// Users skipped after a lookup or listing failure.
    pub users_failed: usize,
    /// Distinct threads found in user activity.
    pub candidate_threads: usize,
    /// Candidates dropped because they belong to a tracked community.
    pub threads_excluded_tracked: usize,
    /// Candidates whose comments could not be fetched.
    pub threads_failed: usize,
    /// New out-group evidence entries.
    pub out_group_evidence_added: usize,
}

impl LinkReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: &LinkReport) {
        self.users_scanned += other.users_scanned;
        self.users_failed += other.users_failed;
        self.candidate_threads += other.candidate_threads;
        self.threads_excluded_tracked += other.threads_excluded_tracked;
        self.threads_failed += other.threads_failed;
        self.out_group_evidence_added += other.out_group_evidence_added;
    }
}

/// Co-occurrences found for one user, not yet applied.
#[derive(Debug, Default)]
struct Discovery {
    /// (other user, permalink) pairs to link.
    links: Vec<(String, String)>,
    report: LinkReport,
}

/// Adds out-group evidence between users already in the graph.
pub struct CrossCommunityLinker<'a, S: ?Sized> {
    source: &'a S,
    retry: RetryPolicy,
    activity_limit: FetchLimit,
    loader: CommentLoader,
    tracked: Vec<String>,
    workers: usize,
}

impl<'a, S> CrossCommunityLinker<'a, S>
where
    S: ParticipantSource + ?Sized,
{
    /// Linker reading from `source`, excluding `config.communities`.
    pub fn new(source: &'a S, config: &RunConfig) -> Self {
        Self {
            source,
            retry: RetryPolicy::from_config(&config.retry),
            activity_limit: config.effective_user_activity_limit(),
            loader: CommentLoader::from_config(config),
            tracked: config.communities.clone(),
            workers: config.workers.max(1),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether `community` is one of the tracked communities, ignoring case.
    pub fn is_tracked(&self, community: &str) -> bool {
        self.tracked.iter().any(|t| t.eq_ignore_ascii_case(community))
    }

    /// Scan every user currently in `graph`.
    pub fn link(&self, graph: &mut GraphStore) -> LinkReport {
        let users = graph.usernames();
        let members: FxHashSet<String> = users.iter().cloned().collect();

        let report = if self.workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
            {
                Ok(pool) => {
                    let shared = Mutex::new(&mut *graph);
                    pool.install(|| {
                        users
                            .par_iter()
                            .map(|user| {
                                let mut found = self.discover(user, &members);
                                let mut guard = shared.lock();
                                found.report.out_group_evidence_added +=
                                    apply(&mut **guard, user, &found.links);
                                found.report
                            })
                            .reduce(LinkReport::default, |mut acc, r| {
                                acc.merge(&r);
                                acc
                            })
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        target: "threadgraph::linker",
                        workers = self.workers,
                        error = %e,
                        "Worker pool unavailable, linking sequentially"
                    );
                    self.link_sequential(graph, &users, &members)
                }
            }
        } else {
            self.link_sequential(graph, &users, &members)
        };

        tracing::info!(
            target: "threadgraph::linker",
            users = report.users_scanned,
            failed = report.users_failed,
            candidates = report.candidate_threads,
            excluded = report.threads_excluded_tracked,
            evidence = report.out_group_evidence_added,
            "Out-group linking finished"
        );
        report
    }

    fn link_sequential(
        &self,
        graph: &mut GraphStore,
        users: &[String],
        members: &FxHashSet<String>,
    ) -> LinkReport {
        let mut report = LinkReport::default();
        for user in users {
            let mut found = self.discover(user, members);
            found.report.out_group_evidence_added += apply(graph, user, &found.links);
            report.merge(&found.report);
        }
        report
    }

    /// Read one user's activity and collect the links it supports.
    fn discover(&self, user: &str, members: &FxHashSet<String>) -> Discovery {
        let mut found = Discovery::default();
        let candidates = match self.candidate_threads(user) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    target: "threadgraph::linker",
                    user,
                    error = %e,
                    "Skipping user, activity unavailable"
                );
                found.report.users_failed += 1;
                self.retry.cool_down();
                return found;
            }
        };
        found.report.users_scanned += 1;
        found.report.candidate_threads += candidates.len();

        for thread in candidates {
            if self.is_tracked(&thread.community) {
                found.report.threads_excluded_tracked += 1;
                continue;
            }
            let comments = match self.loader.load(self.source, &self.retry, &thread) {
                Ok(comments) => comments,
                Err(e) => {
                    tracing::warn!(
                        target: "threadgraph::linker",
                        user,
                        permalink = %thread.permalink,
                        error = %e,
                        "Skipping candidate thread, comments unavailable"
                    );
                    found.report.threads_failed += 1;
                    continue;
                }
            };

            let others: BTreeSet<&str> = comments
                .authors
                .iter()
                .flatten()
                .map(String::as_str)
                .filter(|author| *author != user && members.contains(*author))
                .collect();
            for other in others {
                found.links.push((other.to_string(), thread.permalink.clone()));
            }
        }

        tracing::debug!(
            target: "threadgraph::linker",
            user,
            candidates = found.report.candidate_threads,
            links = found.links.len(),
            "User scanned"
        );
        found
    }

    /// The user's submissions plus the threads of their comments, deduplicated
    /// by permalink in first-seen order.
    fn candidate_threads(&self, user: &str) -> Result<Vec<Thread>, FetchError> {
        let profile = self
            .retry
            .run(&format!("user {}", user), || self.source.get_user(user))?;
        let profile = ensure_active(profile)?;

        let submissions = self.retry.run(&format!("submissions of {}", user), || {
            self.source
                .list_user_submissions(&profile.name, self.activity_limit)
        })?;
        let comments = self.retry.run(&format!("comments of {}", user), || {
            self.source.list_user_comments(&profile.name, self.activity_limit)
        })?;

        let mut seen = FxHashSet::default();
        let candidates = submissions
            .into_iter()
            .chain(comments.into_iter().map(|c| c.thread))
            .filter(|t| seen.insert(t.permalink.clone()))
            .collect();
        Ok(candidates)
    }
}

fn apply(graph: &mut GraphStore, user: &str, links: &[(String, String)]) -> usize {
    let mut added = 0;
    for (other, permalink) in links {
        match graph.record_co_occurrence(user, other, permalink, EvidenceKind::OutGroup) {
            Ok(true) => added += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(
                target: "threadgraph::linker",
                user,
                permalink = %permalink,
                error = %e,
                "Co-occurrence rejected"
            ),
        }
    }
    added
}
