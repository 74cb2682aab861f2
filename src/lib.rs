//! threadgraph: build a graph of users who interact in discussion threads.
//!
//! Users drawn from one or more tracked communities become nodes. Two users
//! are linked when they take part in the same thread, with the thread's
//! permalink kept as evidence: `in_group` for tracked-community threads,
//! `out_group` for threads found through the users' own activity elsewhere.
//!
//! ```no_run
//! use threadgraph::{FixtureSource, GraphStore, Pipeline, RunConfig};
//!
//! let source = FixtureSource::canned()?;
//! let config = RunConfig::for_communities(["100pushups", "MakeupAddiction"]);
//! let mut graph = GraphStore::new();
//! let report = Pipeline::new(&source, &config)?.run(&mut graph);
//! println!("{} users, {} edges", report.summary.node_count, report.summary.edge_count);
//! # Ok::<(), threadgraph::Error>(())
//! ```

mod types;

pub use types::*;
