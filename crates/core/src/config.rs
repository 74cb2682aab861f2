//! Run configuration.
//!
//! A [`RunConfig`] is read from TOML (every field optional) and then
//! overridden by command-line flags. Debug and verbose modes are plain
//! fields threaded through the engine, not process-wide flags.
//!
//! Fetch limits left unset resolve to defaults; debug mode swaps in smaller
//! defaults but never overrides a limit that was set explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default number of threads fetched per community.
pub const DEFAULT_THREAD_LIMIT: usize = 5;
/// Default number of submissions and comments fetched per user.
pub const DEFAULT_USER_ACTIVITY_LIMIT: usize = 25;
/// Default number of placeholder expansions per thread.
pub const DEFAULT_MORE_EXPANSION_LIMIT: usize = 32;

/// Thread limit used in debug mode when none is configured.
pub const DEBUG_THREAD_LIMIT: usize = 1;
/// Per-thread comment cap used in debug mode when none is configured.
pub const DEBUG_MAX_COMMENTS: usize = 40;
/// User activity limit used in debug mode when none is configured.
pub const DEBUG_USER_ACTIVITY_LIMIT: usize = 5;

/// Upper bound on items fetched by a listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLimit", into = "RawLimit")]
pub enum FetchLimit {
    /// Fetch as many items as the source will return.
    Unbounded,
    /// Fetch at most this many items.
    Max(NonZeroUsize),
}

impl FetchLimit {
    /// A bounded limit; zero is treated as unbounded.
    pub fn max(n: usize) -> Self {
        NonZeroUsize::new(n).map_or(FetchLimit::Unbounded, FetchLimit::Max)
    }

    /// The bound, or `None` when unbounded.
    pub fn as_option(&self) -> Option<usize> {
        match self {
            FetchLimit::Unbounded => None,
            FetchLimit::Max(n) => Some(n.get()),
        }
    }

    /// Whether `count` items already reach the limit.
    pub fn is_reached(&self, count: usize) -> bool {
        self.as_option().map_or(false, |n| count >= n)
    }

    /// Truncate `items` to the limit.
    pub fn truncate<T>(&self, items: &mut Vec<T>) {
        if let Some(n) = self.as_option() {
            items.truncate(n);
        }
    }
}

impl fmt::Display for FetchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchLimit::Unbounded => f.write_str("none"),
            FetchLimit::Max(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for FetchLimit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("unbounded") {
            return Ok(FetchLimit::Unbounded);
        }
        let n: usize = trimmed.parse().map_err(|_| {
            Error::config(format!(
                "invalid fetch limit '{}': expected a positive integer or 'none'",
                s
            ))
        })?;
        NonZeroUsize::new(n)
            .map(FetchLimit::Max)
            .ok_or_else(|| Error::config("fetch limit must be positive; use 'none' for unbounded"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Count(usize),
    Text(String),
}

impl TryFrom<RawLimit> for FetchLimit {
    type Error = Error;

    fn try_from(raw: RawLimit) -> Result<Self> {
        match raw {
            RawLimit::Count(n) => NonZeroUsize::new(n)
                .map(FetchLimit::Max)
                .ok_or_else(|| Error::config("fetch limit must be positive; use 'none' for unbounded")),
            RawLimit::Text(s) => s.parse(),
        }
    }
}

impl From<FetchLimit> for RawLimit {
    fn from(limit: FetchLimit) -> Self {
        match limit {
            FetchLimit::Unbounded => RawLimit::Text("none".to_string()),
            FetchLimit::Max(n) => RawLimit::Count(n.get()),
        }
    }
}

/// Graph file format written at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// GEXF 1.2 XML.
    #[default]
    Gexf,
    /// JSON snapshot.
    Json,
    /// CSV edge list.
    Csv,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Gexf => "gexf",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gexf" => Ok(ExportFormat::Gexf),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::config(format!(
                "invalid export format '{}': expected gexf, json or csv",
                other
            ))),
        }
    }
}

/// Retry and cool-down timings for source calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub initial_backoff_ms: u64,
    /// Backoff ceiling.
    pub max_backoff_ms: u64,
    /// Pause after a rate limit or a failed unit of work.
    pub cooldown_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            cooldown_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Immediate retries with no sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            cooldown_ms: 0,
        }
    }

    /// Backoff before the second attempt.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Backoff ceiling.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Cool-down pause.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// HTTP source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site root, without trailing slash.
    pub base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: concat!("threadgraph/", env!("CARGO_PKG_VERSION"), " (co-occurrence graph builder)")
                .to_string(),
            timeout_secs: 30,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the graph file.
    pub dir: PathBuf,
    /// File format.
    pub format: ExportFormat,
}

/// Configuration for one graph-building run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Tracked communities.
    pub communities: Vec<String>,
    /// Threads fetched per community.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_limit: Option<FetchLimit>,
    /// Submissions and comments fetched per user by the linker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_activity_limit: Option<FetchLimit>,
    /// Cap on the flattened comment sequence of a thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_comments_per_thread: Option<FetchLimit>,
    /// Expand "more comments" placeholders.
    pub expand_more: bool,
    /// Placeholder expansions per thread.
    pub more_expansion_limit: FetchLimit,
    /// Run the cross-community linker after the in-group phase.
    pub link_out_group: bool,
    /// Linker worker threads; 1 runs single-threaded.
    pub workers: usize,
    /// Debug mode: small default limits and canned inputs.
    pub debug: bool,
    /// Verbose diagnostics.
    pub verbose: bool,
    /// Retry timings.
    pub retry: RetryConfig,
    /// HTTP source settings.
    pub source: SourceConfig,
    /// Export settings.
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            communities: Vec::new(),
            thread_limit: None,
            user_activity_limit: None,
            max_comments_per_thread: None,
            expand_more: true,
            more_expansion_limit: FetchLimit::max(DEFAULT_MORE_EXPANSION_LIMIT),
            link_out_group: true,
            workers: 1,
            debug: false,
            verbose: false,
            retry: RetryConfig::default(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Config tracking the given communities, everything else default.
    pub fn for_communities<I, S>(communities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            communities: communities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations no run can use.
    pub fn validate(&self) -> Result<()> {
        if self.communities.is_empty() {
            return Err(Error::config("at least one community is required"));
        }
        if let Some(blank) = self.communities.iter().find(|c| c.trim().is_empty()) {
            return Err(Error::config(format!("invalid community name '{}'", blank)));
        }
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Threads fetched per community.
    pub fn effective_thread_limit(&self) -> FetchLimit {
        self.resolve(self.thread_limit, DEBUG_THREAD_LIMIT, Some(DEFAULT_THREAD_LIMIT))
    }

    /// Activity items fetched per user.
    pub fn effective_user_activity_limit(&self) -> FetchLimit {
        self.resolve(
            self.user_activity_limit,
            DEBUG_USER_ACTIVITY_LIMIT,
            Some(DEFAULT_USER_ACTIVITY_LIMIT),
        )
    }

    /// Comments kept per thread.
    pub fn effective_max_comments(&self) -> FetchLimit {
        self.resolve(self.max_comments_per_thread, DEBUG_MAX_COMMENTS, None)
    }

    fn resolve(&self, explicit: Option<FetchLimit>, debug: usize, normal: Option<usize>) -> FetchLimit {
        match explicit {
            Some(limit) => limit,
            None if self.debug => FetchLimit::max(debug),
            None => normal.map_or(FetchLimit::Unbounded, FetchLimit::max),
        }
    }
}
