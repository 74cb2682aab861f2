//! threadgraph CLI
//!
//! Builds a co-occurrence graph for one or two communities and writes it to
//! a file named after the run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use threadgraph::{
    export_file_name, export_graph, ExportFormat, FetchLimit, FixtureSource, GraphStore,
    ParticipantSource, Pipeline, RunConfig, RunReport,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "threadgraph")]
#[command(about = "Build a graph of users who interact in the same threads", long_about = None)]
struct Cli {
    /// Communities to track (one or two)
    #[arg(required = true, num_args = 1..=2)]
    communities: Vec<String>,

    /// Debug mode: small default limits and the built-in dataset, which only
    /// holds the communities 100pushups and MakeupAddiction
    #[arg(short, long)]
    debug: bool,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Threads per community (a number or "none")
    #[arg(short, long)]
    limit: Option<FetchLimit>,

    /// Submissions and comments read per user (a number or "none")
    #[arg(long)]
    user_limit: Option<FetchLimit>,

    /// Comments kept per thread (a number or "none")
    #[arg(long)]
    max_comments: Option<FetchLimit>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read from a JSON fixture instead of the network
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Export format: gexf, json or csv
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Worker threads for the out-group phase
    #[arg(long)]
    workers: Option<usize>,

    /// Skip the out-group phase
    #[arg(long)]
    no_link: bool,
}

impl Cli {
    /// Configuration file (if any) overridden by flags.
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RunConfig::default(),
        };

        config.communities = self.communities.clone();
        config.debug |= self.debug;
        config.verbose |= self.verbose;
        if let Some(limit) = self.limit {
            config.thread_limit = Some(limit);
        }
        if let Some(limit) = self.user_limit {
            config.user_activity_limit = Some(limit);
        }
        if let Some(limit) = self.max_comments {
            config.max_comments_per_thread = Some(limit);
        }
        if let Some(dir) = &self.out_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.no_link {
            config.link_out_group = false;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.run_config()?;

    // Setup logging
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = open_source(&cli, &config)?;

    let mut graph = GraphStore::new();
    let report = Pipeline::new(source.as_ref(), &config)
        .context("Failed to prepare run")?
        .run(&mut graph);

    print_report(&report);
    if config.verbose {
        print_neighbors(&graph);
        if let [a, b] = config.communities.as_slice() {
            print_overlap(&graph, a, b);
        }
    }

    let name = export_file_name(
        &config.communities,
        config.effective_thread_limit(),
        Utc::now(),
        config.output.format,
    );
    let path = config.output.dir.join(name);
    export_graph(&graph, &path, config.output.format)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Export complete");
    println!("{}", path.display());

    Ok(())
}

/// Pick the participant source. Failing to build the HTTP client is fatal.
fn open_source(cli: &Cli, config: &RunConfig) -> Result<Box<dyn ParticipantSource>> {
    if let Some(path) = &cli.fixture {
        let source = FixtureSource::load(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        warn_unknown_communities(&source, config);
        return Ok(Box::new(source));
    }
    if config.debug {
        info!("Debug mode: using the built-in dataset");
        let source = FixtureSource::canned().context("Failed to load built-in dataset")?;
        warn_unknown_communities(&source, config);
        return Ok(Box::new(source));
    }
    network_source(config)
}

/// Offline datasets only hold a fixed set of communities; say so before the
/// run comes back empty.
fn warn_unknown_communities(source: &FixtureSource, config: &RunConfig) {
    for community in &config.communities {
        if !source.has_community(community) {
            let available: Vec<&String> = source.data().communities.keys().collect();
            warn!(
                community = %community,
                available = ?available,
                "Dataset has no such community, it will contribute no threads"
            );
        }
    }
}

#[cfg(feature = "reddit")]
fn network_source(config: &RunConfig) -> Result<Box<dyn ParticipantSource>> {
    let source = threadgraph::RedditSource::new(&config.source)
        .context("Failed to construct fetch client")?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "reddit"))]
fn network_source(_config: &RunConfig) -> Result<Box<dyn ParticipantSource>> {
    anyhow::bail!("built without network support; pass --fixture or --debug")
}

fn print_report(report: &RunReport) {
    let s = &report.summary;
    println!("users:                 {}", s.node_count);
    println!("edges:                 {}", s.edge_count);
    println!("edges with weight > 1: {}", s.edges_with_weight_gt_1);
    println!("in-group edges:        {}", s.in_group_edges);
    println!("out-group edges:       {}", s.out_group_edges);
    println!("multi-community users: {}", s.multi_community_users);
    println!(
        "threads:               {} processed, {} failed, {} deleted",
        report.build.threads_processed, report.build.threads_failed, report.build.threads_skipped_deleted
    );
    if let Some(link) = &report.link {
        println!(
            "users scanned:         {} ({} failed)",
            link.users_scanned, link.users_failed
        );
    }
}

fn print_neighbors(graph: &GraphStore) {
    for user in graph.usernames() {
        let neighbors = graph.neighbors(&user);
        println!("{} has {} neighbors", user, neighbors.len());
        for neighbor in neighbors {
            let communities = graph
                .node(&neighbor)
                .map(|n| n.communities.iter().cloned().collect::<Vec<_>>().join(","))
                .unwrap_or_default();
            println!("\t{}\t{}", neighbor, communities);
        }
    }
}

fn print_overlap(graph: &GraphStore, a: &str, b: &str) {
    let overlap = graph.community_overlap(a, b);
    println!("users of {}: {}", a, overlap.users_a);
    println!("users of {}: {}", b, overlap.users_b);
    println!("users of both: {}", overlap.common);
    match overlap.overlap_ratio {
        Some(ratio) => println!("overlap: {:.1}%", ratio * 100.0),
        None => println!("overlap: n/a"),
    }
}
