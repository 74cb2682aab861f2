//! One graph-building run: in-group phase, then out-group phase.

use serde::{Deserialize, Serialize};
use threadgraph_core::{Result, RunConfig};
use threadgraph_source::ParticipantSource;

use crate::builder::{BuildReport, CoOccurrenceBuilder};
use crate::graph::types::GraphSummary;
use crate::graph::GraphStore;
use crate::linker::{CrossCommunityLinker, LinkReport};
use crate::retry::RetryPolicy;

/// Outcome of [`Pipeline::run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// In-group phase counters.
    pub build: BuildReport,
    /// Out-group phase counters, `None` when linking was disabled.
    pub link: Option<LinkReport>,
    /// Graph counts at the end of the run.
    pub summary: GraphSummary,
}

/// Runs the builder and the linker over a configured source.
pub struct Pipeline<'a, S: ?Sized> {
    source: &'a S,
    config: &'a RunConfig,
    retry: RetryPolicy,
}

impl<'a, S> Pipeline<'a, S>
where
    S: ParticipantSource + ?Sized,
{
    /// Validate `config` and prepare a run.
    pub fn new(source: &'a S, config: &'a RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            retry: RetryPolicy::from_config(&config.retry),
        })
    }

    /// Replace the retry policy used by both phases.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Populate `graph`. Never fails: unreachable units are skipped and the
    /// graph stays consistent with whatever evidence was gathered.
    pub fn run(&self, graph: &mut GraphStore) -> RunReport {
        tracing::info!(
            target: "threadgraph::builder",
            communities = ?self.config.communities,
            thread_limit = %self.config.effective_thread_limit(),
            debug = self.config.debug,
            max_attempts = self.retry.max_attempts(),
            "Building in-group graph"
        );
        let build = CoOccurrenceBuilder::new(self.source, self.config)
            .with_retry(self.retry.clone())
            .build(graph, &self.config.communities);

        let link = if self.config.link_out_group {
            tracing::info!(
                target: "threadgraph::linker",
                users = graph.node_count(),
                workers = self.config.workers,
                activity_limit = %self.config.effective_user_activity_limit(),
                "Linking out-group activity"
            );
            Some(
                CrossCommunityLinker::new(self.source, self.config)
                    .with_retry(self.retry.clone())
                    .link(graph),
            )
        } else {
            None
        };

        RunReport {
            build,
            link,
            summary: graph.summary(),
        }
    }
}
